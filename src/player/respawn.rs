//! Last safe ground and respawning after a fall.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use super::components::{ControlLock, Player};
use super::jump::JumpState;

/// Respawn tuning.
#[derive(Resource, Debug, Clone, Copy)]
pub struct RespawnSettings {
    /// Seconds between safe-ground samples; 0 samples every step
    pub save_interval: f32,
    /// Lift above the saved spot so the body doesn't start inside the ground
    pub up_offset: f32,
    /// Falling below this height respawns the player
    pub fall_limit: f32,
}

impl Default for RespawnSettings {
    fn default() -> Self {
        Self {
            save_interval: 0.05,
            up_offset: 0.2,
            fall_limit: -20.0,
        }
    }
}

/// Where the player last stood on solid ground.
#[derive(Component, Debug, Clone)]
pub struct RespawnPoint {
    last_safe: Vec3,
    rotation: Quat,
    timer: f32,
}

impl RespawnPoint {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            last_safe: position,
            rotation,
            timer: 0.0,
        }
    }

    pub fn last_safe(&self) -> Vec3 {
        self.last_safe
    }

    /// Remember the pose while grounded, at most once per sample interval.
    pub fn track(
        &mut self,
        settings: &RespawnSettings,
        grounded: bool,
        position: Vec3,
        rotation: Quat,
        dt: f32,
    ) {
        if settings.save_interval > 0.0 {
            self.timer += dt;
            if self.timer < settings.save_interval {
                return;
            }
            self.timer = 0.0;
        }
        if grounded {
            self.last_safe = position;
            self.rotation = rotation;
        }
    }

    pub fn respawn_pose(&self, settings: &RespawnSettings) -> (Vec3, Quat) {
        (self.last_safe + Vec3::Y * settings.up_offset, self.rotation)
    }
}

/// Sample safe ground. Tethered flight never counts as grounded.
pub fn track_safe_ground(
    time: Res<Time>,
    settings: Res<RespawnSettings>,
    mut players: Query<(&Transform, &JumpState, &ControlLock, &mut RespawnPoint), With<Player>>,
) {
    let dt = time.delta_secs();
    for (transform, jump, lock, mut point) in players.iter_mut() {
        let grounded = jump.grounded && !lock.is_locked();
        point.track(&settings, grounded, transform.translation, transform.rotation, dt);
    }
}

/// Put a player who fell out of the arena back on safe ground.
pub fn respawn_fallen_player(
    settings: Res<RespawnSettings>,
    mut players: Query<
        (&mut Transform, &mut Velocity, &mut JumpState, &RespawnPoint),
        With<Player>,
    >,
) {
    for (mut transform, mut velocity, mut jump, point) in players.iter_mut() {
        if transform.translation.y >= settings.fall_limit {
            continue;
        }
        let (position, rotation) = point.respawn_pose(&settings);
        transform.translation = position;
        transform.rotation = rotation;
        *velocity = Velocity::zero();
        jump.reset();
        info!("Player fell below {:.1}, respawned at {:?}", settings.fall_limit, position);
    }
}
