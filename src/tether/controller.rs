//! Tether motion state machine.
//!
//! While active, the controller owns a lease on the held body and rewrites its
//! position once per physics tick along an eased path from the captured start
//! to the anchor. Every exit path (arrival, cancel, lost target, disable)
//! goes through [`TetherController::stop`], which gives the lease back and
//! restores the body's original properties.

use bevy::prelude::*;

use super::body::TetherBody;
use super::config::{AbilityConfig, ExitDirection};
use super::error::LeaseError;
use super::lease::{BodyLease, LeaseRegistry};
use crate::core::{lerp_unclamped, StopReason};

/// Planar vectors shorter than this (squared) have no usable direction.
const MIN_PLANAR_LENGTH_SQUARED: f32 = 0.0001;

/// Bookkeeping for a tether in flight.
#[derive(Debug)]
pub struct ActiveTether {
    /// Grapple point or item that was selected.
    pub target: Entity,
    /// Body being moved (the actor for grapples, the item for pulls).
    pub body: Entity,
    /// Body position when the tether began.
    pub start: Vec3,
    /// Target anchor captured when the tether began.
    pub anchor: Vec3,
    /// Seconds since the tether began.
    pub elapsed: f32,
    lease: BodyLease,
}

#[derive(Debug, Default)]
pub enum TetherState {
    #[default]
    Idle,
    Active(ActiveTether),
}

/// Per-tick context for the held body's destination and hand-off direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherFrame {
    /// Where the body is headed this tick.
    pub anchor: Vec3,
    /// Fixed timestep in seconds.
    pub dt: f32,
    /// Viewing camera forward, if a camera exists.
    pub camera_forward: Option<Vec3>,
    /// The actor's forward.
    pub actor_forward: Vec3,
}

impl TetherFrame {
    /// Forward component of the exit impulse.
    pub fn exit_forward(&self, direction: ExitDirection) -> Vec3 {
        match direction {
            ExitDirection::ActorForward => self.actor_forward,
            ExitDirection::CameraPlanar => self
                .camera_forward
                .map(|f| Vec3::new(f.x, 0.0, f.z))
                .filter(|f| f.length_squared() > MIN_PLANAR_LENGTH_SQUARED)
                .map(Vec3::normalize)
                .unwrap_or(self.actor_forward),
        }
    }
}

/// Outcome reported when a tether returns to idle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetherStop {
    pub target: Entity,
    pub body: Entity,
    pub reason: StopReason,
}

#[derive(Debug, Default)]
pub struct TetherController {
    state: TetherState,
}

impl TetherController {
    pub fn active(&self) -> Option<&ActiveTether> {
        match &self.state {
            TetherState::Active(active) => Some(active),
            TetherState::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TetherState::Active(_))
    }

    /// Idle → Active: lease `body`, take over its physics and capture its start.
    #[allow(clippy::too_many_arguments)]
    pub fn begin<B: TetherBody + ?Sized>(
        &mut self,
        holder: Entity,
        target: Entity,
        anchor: Vec3,
        body_entity: Entity,
        body: &mut B,
        config: &AbilityConfig,
        leases: &mut LeaseRegistry,
    ) -> Result<(), LeaseError> {
        if let TetherState::Active(active) = &self.state {
            return Err(LeaseError::HolderBusy { holder, body: active.body });
        }

        let original = body.properties();
        let lease = leases.acquire(holder, body_entity, original)?;

        body.set_linear_velocity(Vec3::ZERO);
        body.set_angular_velocity(Vec3::ZERO);
        body.set_properties(original.with_overrides(&config.held_body));

        self.state = TetherState::Active(ActiveTether {
            target,
            body: body_entity,
            start: body.position(),
            anchor,
            elapsed: 0.0,
            lease,
        });
        Ok(())
    }

    /// Advance one physics tick. Returns the stop report if the tether arrived.
    pub fn advance<B: TetherBody>(
        &mut self,
        body: &mut B,
        frame: &TetherFrame,
        config: &AbilityConfig,
        leases: &mut LeaseRegistry,
    ) -> Option<TetherStop> {
        let TetherState::Active(active) = &mut self.state else {
            return None;
        };

        active.elapsed += frame.dt;
        let u = config.normalized_time(active.elapsed);
        let next = lerp_unclamped(active.start, frame.anchor, config.progress(u));

        let close_enough =
            config.stop_when_close && next.distance(frame.anchor) <= config.stop_distance;
        if close_enough || u >= 1.0 {
            // The last step has to land before the body is handed back.
            body.place(next);
            return self.stop(StopReason::Arrived, Some(body), frame, config, leases);
        }

        body.move_position(next, frame.dt);
        None
    }

    /// Active → Idle on any path. A missing body (despawned) only frees the lease.
    pub fn stop(
        &mut self,
        reason: StopReason,
        body: Option<&mut dyn TetherBody>,
        frame: &TetherFrame,
        config: &AbilityConfig,
        leases: &mut LeaseRegistry,
    ) -> Option<TetherStop> {
        let TetherState::Active(active) = std::mem::take(&mut self.state) else {
            return None;
        };
        let report = TetherStop {
            target: active.target,
            body: active.body,
            reason,
        };

        let snapshot = leases.release(active.lease);
        let Some(body) = body else {
            return Some(report);
        };

        body.settle();
        if reason.arrived() && config.snap_on_arrival {
            body.place(frame.anchor);
            body.set_angular_velocity(Vec3::ZERO);
        }

        if let Some(snapshot) = snapshot {
            body.set_properties(snapshot);
        }

        if reason.arrived() {
            if let Some(exit) = config.exit_impulse {
                let mut velocity = body.linear_velocity();
                velocity.y = velocity.y.max(0.0);
                body.set_linear_velocity(velocity);

                let forward = frame.exit_forward(exit.direction);
                body.apply_impulse(Vec3::Y * exit.up + forward * exit.forward);
            }
        }

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_forward_flattens_camera() {
        let frame = TetherFrame {
            anchor: Vec3::ZERO,
            dt: 1.0 / 60.0,
            camera_forward: Some(Vec3::new(0.0, -0.6, -0.8)),
            actor_forward: Vec3::X,
        };
        let forward = frame.exit_forward(ExitDirection::CameraPlanar);
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
        assert_eq!(frame.exit_forward(ExitDirection::ActorForward), Vec3::X);
    }

    #[test]
    fn test_exit_forward_falls_back_when_camera_looks_straight_down() {
        let frame = TetherFrame {
            anchor: Vec3::ZERO,
            dt: 1.0 / 60.0,
            camera_forward: Some(Vec3::NEG_Y),
            actor_forward: Vec3::Z,
        };
        assert_eq!(frame.exit_forward(ExitDirection::CameraPlanar), Vec3::Z);

        let no_camera = TetherFrame { camera_forward: None, ..frame };
        assert_eq!(no_camera.exit_forward(ExitDirection::CameraPlanar), Vec3::Z);
    }
}
