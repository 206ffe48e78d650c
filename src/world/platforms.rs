//! Platforms that react to the player: path riders and crumbling ledges.
//!
//! Both are kinematic bodies. Their logic is plain state stepped by
//! fixed-clock systems, with the player detected by a box volume that
//! travels with the platform.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::player::Player;

/// Coasting stops once this close to its target distance.
const ARRIVE_EPSILON: f32 = 0.0005;

/// A polyline measured by arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformPath {
    points: Vec<Vec3>,
    /// Arc length at each point; starts at 0.
    cumulative: Vec<f32>,
}

impl PlatformPath {
    /// `None` for fewer than two points or a path with no length.
    pub fn new(points: Vec<Vec3>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }
        (total > f32::EPSILON).then_some(Self { points, cumulative })
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position `distance` along the path, clamped to its ends.
    pub fn point_at(&self, distance: f32) -> Vec3 {
        let distance = distance.clamp(0.0, self.length());
        let segment = self
            .cumulative
            .windows(2)
            .position(|w| distance <= w[1])
            .unwrap_or(self.points.len() - 2);

        let (from, to) = (self.cumulative[segment], self.cumulative[segment + 1]);
        let t = (distance - from) / (to - from).max(f32::EPSILON);
        self.points[segment].lerp(self.points[segment + 1], t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MoverMode {
    Idle,
    /// Someone is on board; keep going.
    Riding,
    /// Rider left; run on to `target` and stop.
    Coasting { target: f32 },
}

/// Carries a platform along a path while the player stands on it, then
/// coasts `extra_distance` further after they step off.
#[derive(Component, Debug, Clone)]
pub struct PathMover {
    path: PlatformPath,
    /// Units per second along the path
    pub speed: f32,
    pub extra_distance: f32,
    /// Wrap around from the last point to the first
    pub looped: bool,
    distance: f32,
    mode: MoverMode,
}

impl PathMover {
    pub fn new(path: PlatformPath, speed: f32, extra_distance: f32, looped: bool) -> Self {
        Self {
            path,
            speed,
            extra_distance,
            looped,
            distance: 0.0,
            mode: MoverMode::Idle,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        self.path.point_at(self.distance)
    }

    pub fn is_moving(&self) -> bool {
        self.mode != MoverMode::Idle
    }

    /// Rider stepped on.
    pub fn start(&mut self) {
        self.mode = MoverMode::Riding;
    }

    /// Rider stepped off.
    pub fn release(&mut self) {
        let length = self.path.length();
        if !self.looped && self.distance >= length - ARRIVE_EPSILON {
            self.mode = MoverMode::Idle;
            return;
        }
        let desired = self.distance + self.extra_distance.max(0.0);
        let target = if self.looped {
            desired.rem_euclid(length)
        } else {
            desired.min(length)
        };
        self.mode = MoverMode::Coasting { target };
    }

    /// Advance one fixed step. Returns the new position if the platform moved.
    pub fn step(&mut self, dt: f32) -> Option<Vec3> {
        let length = self.path.length();
        let step = self.speed * dt;
        match self.mode {
            MoverMode::Idle => return None,
            MoverMode::Riding => {
                self.distance = if self.looped {
                    (self.distance + step).rem_euclid(length)
                } else {
                    (self.distance + step).min(length)
                };
            }
            MoverMode::Coasting { target } => {
                // Coasting only ever runs forward.
                let remaining = if self.looped {
                    (target - self.distance).rem_euclid(length)
                } else {
                    (target - self.distance).max(0.0)
                };
                let advance = step.min(remaining);
                self.distance += advance;
                if self.looped {
                    self.distance = self.distance.rem_euclid(length);
                }
                if remaining - advance <= ARRIVE_EPSILON {
                    self.mode = MoverMode::Idle;
                }
            }
        }
        Some(self.position())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BreakState {
    Intact,
    Cracking { remaining: f32 },
    Falling { remaining: f32 },
}

/// What a crumbling platform's body should do this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStep {
    None,
    /// Hand the platform to gravity.
    Fall,
    Despawn,
}

/// Gives way a moment after the player first lands on it.
#[derive(Component, Debug, Clone)]
pub struct BreakingPlatform {
    pub break_delay: f32,
    /// Seconds between starting to fall and being removed
    pub despawn_after: f32,
    state: BreakState,
}

impl BreakingPlatform {
    pub fn new(break_delay: f32, despawn_after: f32) -> Self {
        Self {
            break_delay,
            despawn_after,
            state: BreakState::Intact,
        }
    }

    /// Start the countdown. Returns `true` only the first time.
    pub fn trigger(&mut self) -> bool {
        if self.state != BreakState::Intact {
            return false;
        }
        self.state = BreakState::Cracking { remaining: self.break_delay };
        true
    }

    pub fn is_falling(&self) -> bool {
        matches!(self.state, BreakState::Falling { .. })
    }

    pub fn step(&mut self, dt: f32) -> BreakStep {
        match self.state {
            BreakState::Intact => BreakStep::None,
            BreakState::Cracking { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.state = BreakState::Falling { remaining: self.despawn_after };
                    BreakStep::Fall
                } else {
                    self.state = BreakState::Cracking { remaining };
                    BreakStep::None
                }
            }
            BreakState::Falling { remaining } => {
                let remaining = remaining - dt;
                self.state = BreakState::Falling { remaining };
                if remaining <= 0.0 {
                    BreakStep::Despawn
                } else {
                    BreakStep::None
                }
            }
        }
    }
}

/// Edge reported by a [`RiderZone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEdge {
    None,
    Entered,
    Exited,
}

/// Box volume above a platform that notices the player standing on it.
#[derive(Component, Debug, Clone)]
pub struct RiderZone {
    /// Box center relative to the platform origin
    pub offset: Vec3,
    pub half_extents: Vec3,
    occupied: bool,
}

impl RiderZone {
    /// A zone `height` tall sitting on top of a platform of `size`.
    pub fn on_top_of(size: Vec3, height: f32) -> Self {
        Self {
            offset: Vec3::Y * (size.y + height) * 0.5,
            half_extents: Vec3::new(size.x * 0.5, height * 0.5, size.z * 0.5),
            occupied: false,
        }
    }

    pub fn contains(&self, platform: Vec3, point: Vec3) -> bool {
        let local = point - (platform + self.offset);
        local.abs().cmple(self.half_extents).all()
    }

    /// Update occupancy for the player at `point`.
    pub fn update(&mut self, platform: Vec3, point: Option<Vec3>) -> ZoneEdge {
        let inside = point.is_some_and(|p| self.contains(platform, p));
        let edge = match (self.occupied, inside) {
            (false, true) => ZoneEdge::Entered,
            (true, false) => ZoneEdge::Exited,
            _ => ZoneEdge::None,
        };
        self.occupied = inside;
        edge
    }
}

/// Start and stop movers, and set off crumbling platforms, as the player
/// steps on and off them.
pub fn detect_platform_riders(
    players: Query<&Transform, With<Player>>,
    mut platforms: Query<
        (
            &Transform,
            &mut RiderZone,
            Option<&mut PathMover>,
            Option<&mut BreakingPlatform>,
        ),
        Without<Player>,
    >,
) {
    let player = players.get_single().ok().map(|t| t.translation);

    for (transform, mut zone, mover, breaking) in platforms.iter_mut() {
        match zone.update(transform.translation, player) {
            ZoneEdge::Entered => {
                if let Some(mut mover) = mover {
                    mover.start();
                }
                if let Some(mut breaking) = breaking {
                    if breaking.trigger() {
                        debug!("Platform at {:?} is giving way", transform.translation);
                    }
                }
            }
            ZoneEdge::Exited => {
                if let Some(mut mover) = mover {
                    mover.release();
                }
            }
            ZoneEdge::None => {}
        }
    }
}

/// Write path positions; Rapier reads them as next kinematic positions.
pub fn move_platforms(time: Res<Time>, mut movers: Query<(&mut Transform, &mut PathMover)>) {
    let dt = time.delta_secs();
    for (mut transform, mut mover) in movers.iter_mut() {
        if let Some(position) = mover.step(dt) {
            transform.translation = position;
        }
    }
}

/// Drop crumbling platforms and clear them away once they have fallen.
pub fn crumble_platforms(
    mut commands: Commands,
    time: Res<Time>,
    mut platforms: Query<(Entity, &mut BreakingPlatform, &mut RigidBody)>,
) {
    let dt = time.delta_secs();
    for (entity, mut platform, mut body) in platforms.iter_mut() {
        match platform.step(dt) {
            BreakStep::Fall => *body = RigidBody::Dynamic,
            BreakStep::Despawn => commands.entity(entity).despawn_recursive(),
            BreakStep::None => {}
        }
    }
}
