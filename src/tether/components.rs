//! Components that mark tether targets and wire abilities to actors.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::query::{layers, CollisionMask};

/// A fixed point the grapple can pull its actor to.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GrapplePoint {
    /// Offset of the anchor from the entity origin, in its local space.
    pub local_anchor: Vec3,
}

/// A loose physics body the item pull can bring to its actor.
#[derive(Component, Debug, Clone, Copy)]
pub struct PullableItem {
    /// Cleared while the item is picked up, locked in place, etc.
    pub can_be_pulled: bool,
    /// Anchor offset in local space. `None` aims at the body's own position.
    pub local_anchor: Option<Vec3>,
}

impl Default for PullableItem {
    fn default() -> Self {
        Self {
            can_be_pulled: true,
            local_anchor: None,
        }
    }
}

/// Actor entity an ability belongs to. Lives on the ability entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityOwner(pub Entity);

/// Keyboard control for an ability.
#[derive(Component, Debug, Clone, Copy)]
pub struct AbilityBinding {
    pub key: KeyCode,
}

impl AbilityBinding {
    pub const GRAPPLE: Self = Self { key: KeyCode::KeyE };
    pub const ITEM_PULL: Self = Self { key: KeyCode::KeyF };
}

/// Physics components every tetherable body needs, so the tether can read
/// and restore its damping, gravity, body type and locks.
#[derive(Bundle)]
pub struct TetherBodyBundle {
    pub rigid_body: RigidBody,
    pub velocity: Velocity,
    pub damping: Damping,
    pub gravity_scale: GravityScale,
    pub locked_axes: LockedAxes,
    pub impulse: ExternalImpulse,
    pub ccd: Ccd,
}

impl TetherBodyBundle {
    pub fn dynamic() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            damping: Damping::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::empty(),
            impulse: ExternalImpulse::default(),
            ccd: Ccd::enabled(),
        }
    }

    pub fn with_locked_axes(mut self, locked_axes: LockedAxes) -> Self {
        self.locked_axes = locked_axes;
        self
    }
}

/// Rapier collision groups for a collider on `membership`, colliding with
/// everything in `filter`.
pub fn collision_groups(membership: CollisionMask, filter: CollisionMask) -> CollisionGroups {
    CollisionGroups::new(
        Group::from_bits_truncate(membership.0),
        Group::from_bits_truncate(filter.0),
    )
}

/// Groups for solid level geometry.
pub fn world_groups() -> CollisionGroups {
    collision_groups(layers::WORLD, CollisionMask::ALL)
}
