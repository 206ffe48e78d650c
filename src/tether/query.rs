//! Spatial queries against the physics world.
//!
//! The physics backend only has to answer two primitive questions (sphere
//! overlap and sphere cast). Broad-phase collection and the line-of-sight
//! sweep are built on top of them here so every backend nudges and filters
//! the same way.

use bevy::prelude::*;
use serde::Deserialize;

/// Distance the sweep origin is pushed along the cast direction so the cast
/// does not start inside the caster's own surface.
pub const SWEEP_NUDGE: f32 = 0.05;

/// Capacity reserved for broad-phase results.
pub const OVERLAP_CAPACITY: usize = 64;

/// Bitset of collision layers a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub fn contains(self, other: CollisionMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: CollisionMask) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Named collision layers used by the arena and the ability defaults.
pub mod layers {
    use super::CollisionMask;

    pub const WORLD: CollisionMask = CollisionMask(1 << 0);
    pub const GRAPPLE_POINT: CollisionMask = CollisionMask(1 << 1);
    pub const PULLABLE: CollisionMask = CollisionMask(1 << 2);
    pub const PLAYER: CollisionMask = CollisionMask(1 << 3);
}

/// First blocking hit reported by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub collider: Entity,
    /// Distance travelled along the cast direction before contact.
    pub distance: f32,
}

/// Physics-world primitives consumed by target selection.
pub trait SpatialQueries {
    /// Append every collider on `mask` overlapping the sphere to `out`.
    ///
    /// Triggers are included. Order is backend-defined but stable within one call.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask, out: &mut Vec<Entity>);

    /// Cast a sphere and return the nearest solid hit for which `skip` is false.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        mask: CollisionMask,
        skip: &dyn Fn(Entity) -> bool,
    ) -> Option<SweepHit>;
}

/// Collect colliders within `radius` of `origin` into a caller-owned buffer.
///
/// The buffer is cleared first, so it can be reused across activations.
pub fn find_in_radius<'b, Q: SpatialQueries + ?Sized>(
    queries: &Q,
    origin: Vec3,
    radius: f32,
    mask: CollisionMask,
    buffer: &'b mut Vec<Entity>,
) -> &'b [Entity] {
    buffer.clear();
    if radius > 0.0 {
        queries.overlap_sphere(origin, radius, mask, buffer);
    }
    buffer
}

/// Sweep a sphere for the first blocking hit, ignoring `exclude`.
///
/// The origin is nudged forward by [`SWEEP_NUDGE`] and the distance shortened
/// by the same amount.
pub fn sweep<Q: SpatialQueries + ?Sized>(
    queries: &Q,
    origin: Vec3,
    radius: f32,
    direction: Dir3,
    max_distance: f32,
    mask: CollisionMask,
    exclude: &[Entity],
) -> Option<SweepHit> {
    let start = origin + direction * SWEEP_NUDGE;
    let distance = (max_distance - SWEEP_NUDGE).max(0.0);
    queries.sphere_cast(start, radius, direction, distance, mask, &|entity| {
        exclude.contains(&entity)
    })
}

/// Whether nothing outside `exclude` blocks the path from `origin` to `point`.
///
/// A degenerate direction counts as blocked.
pub fn has_line_of_sight<Q: SpatialQueries + ?Sized>(
    queries: &Q,
    origin: Vec3,
    point: Vec3,
    radius: f32,
    mask: CollisionMask,
    exclude: &[Entity],
) -> bool {
    let Ok(direction) = Dir3::new(point - origin) else {
        return false;
    };
    let distance = origin.distance(point);
    sweep(queries, origin, radius, direction, distance, mask, exclude).is_none()
}
