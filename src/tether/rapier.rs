//! Bevy and Rapier backends for the tether traits.

use bevy::ecs::query::QueryData;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;
use smallvec::SmallVec;

use super::body::{BodyProperties, TetherBody};
use super::components::{GrapplePoint, PullableItem};
use super::query::{CollisionMask, SpatialQueries, SweepHit};
use super::selector::{CandidateResolver, Capability, TargetCandidate};
use super::visibility::ViewportProjector;

fn query_filter<'a>(mask: CollisionMask) -> QueryFilter<'a> {
    QueryFilter::default().groups(CollisionGroups::new(
        Group::ALL,
        Group::from_bits_truncate(mask.0),
    ))
}

/// Spatial queries answered by the Rapier context.
pub struct RapierSpatialQueries<'a> {
    pub context: &'a RapierContext,
}

impl SpatialQueries for RapierSpatialQueries<'_> {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: CollisionMask, out: &mut Vec<Entity>) {
        let shape = Collider::ball(radius);
        self.context.intersections_with_shape(
            center,
            Quat::IDENTITY,
            &shape,
            query_filter(mask),
            |entity| {
                out.push(entity);
                true
            },
        );
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Dir3,
        max_distance: f32,
        mask: CollisionMask,
        skip: &dyn Fn(Entity) -> bool,
    ) -> Option<SweepHit> {
        let shape = Collider::ball(radius);
        let keep = |entity: Entity| !skip(entity);
        let filter = query_filter(mask).exclude_sensors().predicate(&keep);

        // Unit cast velocity, so time of impact is a distance.
        self.context
            .cast_shape(
                origin,
                Quat::IDENTITY,
                direction.as_vec3(),
                &shape,
                ShapeCastOptions::with_max_time_of_impact(max_distance),
                filter,
            )
            .map(|(collider, hit)| SweepHit {
                collider,
                distance: hit.time_of_impact,
            })
    }
}

/// Viewport projection through a Bevy camera.
pub struct CameraProjector<'a> {
    pub camera: &'a Camera,
    pub transform: &'a GlobalTransform,
}

impl CameraProjector<'_> {
    /// World-space look direction.
    pub fn forward(&self) -> Vec3 {
        self.transform.forward().as_vec3()
    }
}

impl ViewportProjector for CameraProjector<'_> {
    fn world_to_viewport(&self, point: Vec3) -> Option<Vec3> {
        let ndc = self.camera.world_to_ndc(self.transform, point)?;
        let view = self.transform.compute_matrix().inverse().transform_point3(point);
        Some(Vec3::new((ndc.x + 1.0) * 0.5, (ndc.y + 1.0) * 0.5, -view.z))
    }
}

/// Every component a tether reads or writes on a held body.
#[derive(QueryData)]
#[query_data(mutable, derive(Debug))]
pub struct RapierBody {
    pub transform: &'static mut Transform,
    pub rigid_body: &'static mut RigidBody,
    pub velocity: &'static mut Velocity,
    pub damping: &'static mut Damping,
    pub gravity_scale: &'static mut GravityScale,
    pub locked_axes: &'static mut LockedAxes,
    pub impulse: &'static mut ExternalImpulse,
}

impl TetherBody for RapierBodyItem<'_> {
    fn position(&self) -> Vec3 {
        self.transform.translation
    }

    fn linear_velocity(&self) -> Vec3 {
        self.velocity.linvel
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.velocity.linvel = velocity;
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.velocity.angvel = velocity;
    }

    fn properties(&self) -> BodyProperties {
        BodyProperties {
            rigid_body: *self.rigid_body,
            linear_damping: self.damping.linear_damping,
            gravity_scale: self.gravity_scale.0,
            locked_axes: *self.locked_axes,
        }
    }

    fn set_properties(&mut self, properties: BodyProperties) {
        *self.rigid_body = properties.rigid_body;
        self.damping.linear_damping = properties.linear_damping;
        self.gravity_scale.0 = properties.gravity_scale;
        *self.locked_axes = properties.locked_axes;
    }

    fn move_position(&mut self, target: Vec3, dt: f32) {
        if matches!(*self.rigid_body, RigidBody::KinematicPositionBased) {
            // Picked up by rapier as the next kinematic position.
            self.transform.translation = target;
        } else if dt > 0.0 {
            self.velocity.linvel = (target - self.transform.translation) / dt;
        }
    }

    fn place(&mut self, position: Vec3) {
        // Rapier teleports bodies whose transform was changed from outside.
        self.transform.translation = position;
        self.velocity.linvel = Vec3::ZERO;
    }

    fn settle(&mut self) {
        if matches!(*self.rigid_body, RigidBody::Dynamic) {
            self.velocity.linvel = Vec3::ZERO;
        }
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.impulse.impulse += impulse;
    }
}

/// Resolves overlapping colliders to grapple points and pullable items in
/// the scene hierarchy.
#[derive(SystemParam)]
pub struct SceneTargets<'w, 's> {
    parents: Query<'w, 's, &'static Parent>,
    children: Query<'w, 's, &'static Children>,
    transforms: Query<'w, 's, &'static GlobalTransform>,
    grapple_points: Query<'w, 's, &'static GrapplePoint>,
    items: Query<'w, 's, &'static PullableItem>,
    colliders: Query<'w, 's, (), With<Collider>>,
    bodies: Query<'w, 's, (), With<RigidBody>>,
}

impl SceneTargets<'_, '_> {
    /// `root` and every descendant that carries a collider.
    fn own_colliders(&self, root: Entity) -> SmallVec<[Entity; 4]> {
        std::iter::once(root)
            .chain(self.children.iter_descendants(root))
            .filter(|&entity| self.colliders.contains(entity))
            .collect()
    }

    fn grapple_candidate(&self, entity: Entity, point: &GrapplePoint) -> Option<TargetCandidate> {
        let transform = self.transforms.get(entity).ok()?;
        Some(TargetCandidate {
            target: entity,
            body: None,
            anchor: transform.transform_point(point.local_anchor),
            capability: Capability::Grappleable,
            colliders: self.own_colliders(entity),
        })
    }

    fn item_candidate(&self, entity: Entity, item: &PullableItem) -> Option<TargetCandidate> {
        if !item.can_be_pulled || !self.bodies.contains(entity) {
            return None;
        }
        let transform = self.transforms.get(entity).ok()?;
        let anchor = match item.local_anchor {
            Some(local) => transform.transform_point(local),
            None => transform.translation(),
        };
        Some(TargetCandidate {
            target: entity,
            body: Some(entity),
            anchor,
            capability: Capability::Pullable,
            colliders: self.own_colliders(entity),
        })
    }
}

impl CandidateResolver for SceneTargets<'_, '_> {
    fn resolve(&self, collider: Entity) -> Option<TargetCandidate> {
        let mut entity = collider;
        loop {
            if let Ok(point) = self.grapple_points.get(entity) {
                return self.grapple_candidate(entity, point);
            }
            if let Ok(item) = self.items.get(entity) {
                return self.item_candidate(entity, item);
            }
            entity = self.parents.get(entity).ok()?.get();
        }
    }
}
