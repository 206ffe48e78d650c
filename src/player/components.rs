//! Player-related components.

use bevy::prelude::*;
use smallvec::SmallVec;

/// Marker component for the player entity.
#[derive(Component)]
pub struct Player;

/// Third-person orbit camera following the player.
#[derive(Component)]
pub struct PlayerCamera {
    /// Yaw in radians around world up
    pub yaw: f32,
    /// Pitch in radians, positive looking down onto the player
    pub pitch: f32,
}

impl Default for PlayerCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 15_f32.to_radians(),
        }
    }
}

impl PlayerCamera {
    /// Forward direction on the ground plane.
    pub fn planar_forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z
    }

    pub fn planar_right(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::X
    }
}

/// Disables movement and jump while any holder is present.
///
/// Holders are ability entities; a tether that takes over the player's body
/// adds itself on start and removes itself on stop.
#[derive(Component, Default, Debug)]
pub struct ControlLock {
    holders: SmallVec<[Entity; 2]>,
}

impl ControlLock {
    /// Returns `true` if this holder engaged the lock.
    pub fn lock(&mut self, holder: Entity) -> bool {
        if self.holders.contains(&holder) {
            return false;
        }
        self.holders.push(holder);
        self.holders.len() == 1
    }

    /// Returns `true` if this holder was the last one.
    pub fn unlock(&mut self, holder: Entity) -> bool {
        let before = self.holders.len();
        self.holders.retain(|h| *h != holder);
        before > 0 && self.holders.is_empty()
    }

    pub fn is_locked(&self) -> bool {
        !self.holders.is_empty()
    }
}

/// Tuning for the player controller and camera rig.
#[derive(Resource)]
pub struct PlayerConfig {
    /// Mouse sensitivity multiplier
    pub mouse_sensitivity: f32,
    /// Invert Y-axis for mouse look
    pub invert_y: bool,
    /// Camera pitch limits in degrees
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Camera distance behind the pivot
    pub camera_distance: f32,
    /// Camera pivot height above the player origin
    pub camera_height: f32,
    /// Top planar speed in units per second
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    /// Fraction of acceleration available while airborne
    pub air_control: f32,
    pub rotate_to_move: bool,
    /// Seconds for the facing to catch up with the move direction
    pub turn_smooth_time: f32,
    /// Ground check ray length below the capsule bottom
    pub ground_ray: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 1.5,
            invert_y: false,
            min_pitch: -30.0,
            max_pitch: 70.0,
            camera_distance: 6.0,
            camera_height: 1.6,
            max_speed: 6.0,
            acceleration: 22.0,
            deceleration: 26.0,
            air_control: 0.35,
            rotate_to_move: true,
            turn_smooth_time: 0.08,
            ground_ray: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_lock_counts_holders() {
        let grapple = Entity::from_raw(1);
        let other = Entity::from_raw(2);
        let mut lock = ControlLock::default();

        assert!(lock.lock(grapple), "first holder engages the lock");
        assert!(!lock.lock(grapple), "same holder twice is ignored");
        assert!(!lock.lock(other));
        assert!(!lock.unlock(grapple), "still held by the other holder");
        assert!(lock.is_locked());
        assert!(lock.unlock(other));
        assert!(!lock.is_locked());
        assert!(!lock.unlock(other), "unlocking an open lock is a no-op");
    }

    #[test]
    fn test_camera_planar_axes() {
        let camera = PlayerCamera { yaw: 0.0, pitch: 0.5 };
        assert!((camera.planar_forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.planar_right() - Vec3::X).length() < 1e-6);
    }
}
