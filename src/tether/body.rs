//! The physical body a tether takes control of.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{LockedAxes, RigidBody};

use super::config::HeldBodyOverrides;

/// Physics properties a tether overrides and later restores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProperties {
    pub rigid_body: RigidBody,
    pub linear_damping: f32,
    pub gravity_scale: f32,
    pub locked_axes: LockedAxes,
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            linear_damping: 0.0,
            gravity_scale: 1.0,
            locked_axes: LockedAxes::empty(),
        }
    }
}

impl BodyProperties {
    /// Properties to hold while tethered, starting from the body's current ones.
    pub fn with_overrides(self, overrides: &HeldBodyOverrides) -> Self {
        let mut held = self;
        held.linear_damping = overrides.linear_damping;
        if overrides.disable_gravity {
            held.gravity_scale = 0.0;
        }
        if overrides.make_kinematic {
            held.rigid_body = RigidBody::KinematicPositionBased;
        }
        if overrides.freeze_rotation {
            held.locked_axes |= LockedAxes::ROTATION_LOCKED;
        }
        held
    }

    pub fn is_kinematic(&self) -> bool {
        matches!(
            self.rigid_body,
            RigidBody::KinematicPositionBased | RigidBody::KinematicVelocityBased
        )
    }
}

/// Accessors and mutators for a rigid body under tether control.
pub trait TetherBody {
    /// Current physical position.
    fn position(&self) -> Vec3;

    fn linear_velocity(&self) -> Vec3;

    fn set_linear_velocity(&mut self, velocity: Vec3);

    fn set_angular_velocity(&mut self, velocity: Vec3);

    fn properties(&self) -> BodyProperties;

    fn set_properties(&mut self, properties: BodyProperties);

    /// Move toward `target` within one fixed step of `dt` seconds, respecting
    /// the physics engine's interpolation and continuous collision.
    fn move_position(&mut self, target: Vec3, dt: f32);

    /// Put the body exactly at `position` with no velocity left over. Used
    /// where the tether must land on a point this step, since a velocity drive
    /// would be cancelled by the hand-off that follows.
    fn place(&mut self, position: Vec3);

    /// Cancel whatever motion the last `move_position` left behind, so the
    /// body is handed back at rest.
    fn settle(&mut self);

    fn apply_impulse(&mut self, impulse: Vec3);
}
