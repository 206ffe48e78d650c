//! Entity spawning functions for arena construction.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::data::{
    ArenaLayout, BoxDef, BreakingPlatformDef, GrapplePointDef, ItemDef, MovingPlatformDef,
};
use super::platforms::{BreakingPlatform, PathMover, PlatformPath, RiderZone};
use crate::tether::{
    collision_groups, layers, world_groups, CollisionMask, GrapplePoint, PullableItem,
    TetherBodyBundle,
};

/// Marker component for arena entities, for cleanup.
#[derive(Component)]
pub struct ArenaGeometry;

/// Shared meshes and materials for arena pieces.
pub struct ArenaAssets {
    pub unit_cube: Handle<Mesh>,
    pub grapple_mesh: Handle<Mesh>,
    pub ground: Handle<StandardMaterial>,
    pub wall: Handle<StandardMaterial>,
    pub platform: Handle<StandardMaterial>,
    pub grapple: Handle<StandardMaterial>,
    pub item: Handle<StandardMaterial>,
    pub moving: Handle<StandardMaterial>,
    pub breaking: Handle<StandardMaterial>,
}

impl ArenaAssets {
    pub fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        Self {
            unit_cube: meshes.add(Cuboid::new(1.0, 1.0, 1.0)),
            grapple_mesh: meshes.add(Sphere::new(1.0)),
            ground: materials.add(Color::srgb(0.3, 0.35, 0.3)),
            wall: materials.add(Color::srgb(0.5, 0.5, 0.55)),
            platform: materials.add(Color::srgb(0.45, 0.4, 0.35)),
            grapple: materials.add(StandardMaterial {
                base_color: Color::srgb(0.2, 0.8, 1.0),
                emissive: LinearRgba::rgb(0.2, 0.8, 1.0),
                ..default()
            }),
            item: materials.add(Color::srgb(0.9, 0.75, 0.2)),
            moving: materials.add(Color::srgb(0.35, 0.5, 0.7)),
            breaking: materials.add(Color::srgb(0.6, 0.35, 0.3)),
        }
    }
}

/// Spawn a static box on the world layer.
pub fn spawn_static_box(
    commands: &mut Commands,
    assets: &ArenaAssets,
    def: &BoxDef,
    material: Handle<StandardMaterial>,
) -> Entity {
    let size = def.size();
    commands
        .spawn((
            Mesh3d(assets.unit_cube.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(def.center()).with_scale(size),
            RigidBody::Fixed,
            // Collider is scaled along with the transform.
            Collider::cuboid(0.5, 0.5, 0.5),
            world_groups(),
            ArenaGeometry,
        ))
        .id()
}

/// Spawn a grapple point: a trigger ball on the grapple layer.
pub fn spawn_grapple_point(
    commands: &mut Commands,
    assets: &ArenaAssets,
    def: &GrapplePointDef,
) -> Entity {
    let position = Vec3::new(def.position.0, def.position.1, def.position.2);
    commands
        .spawn((
            GrapplePoint::default(),
            Transform::from_translation(position),
            Visibility::default(),
            ArenaGeometry,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(assets.grapple_mesh.clone()),
                MeshMaterial3d(assets.grapple.clone()),
                Transform::from_scale(Vec3::splat(def.radius)),
                Collider::ball(1.0),
                Sensor,
                collision_groups(layers::GRAPPLE_POINT, CollisionMask::ALL),
            ));
        })
        .id()
}

/// Spawn a pullable cube with the full set of tetherable body components.
pub fn spawn_item(commands: &mut Commands, assets: &ArenaAssets, def: &ItemDef) -> Entity {
    let position = Vec3::new(def.position.0, def.position.1, def.position.2);
    let half = def.size * 0.5;
    commands
        .spawn((
            PullableItem::default(),
            Transform::from_translation(position),
            Visibility::default(),
            TetherBodyBundle::dynamic(),
            Collider::cuboid(half, half, half),
            collision_groups(layers::PULLABLE, CollisionMask::ALL),
            ArenaGeometry,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(assets.unit_cube.clone()),
                MeshMaterial3d(assets.item.clone()),
                Transform::from_scale(Vec3::splat(def.size)),
            ));
        })
        .id()
}

/// Height of the volume above a platform that counts as standing on it.
const RIDER_ZONE_HEIGHT: f32 = 1.5;

/// Spawn a kinematic platform that follows its path while ridden.
pub fn spawn_moving_platform(
    commands: &mut Commands,
    assets: &ArenaAssets,
    def: &MovingPlatformDef,
) -> Option<Entity> {
    let path = PlatformPath::new(def.waypoints())?;
    let size = def.size();
    let mover = PathMover::new(path, def.speed, def.extra_distance, def.looped);
    let entity = commands
        .spawn((
            Mesh3d(assets.unit_cube.clone()),
            MeshMaterial3d(assets.moving.clone()),
            Transform::from_translation(mover.position()).with_scale(size),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(0.5, 0.5, 0.5),
            world_groups(),
            RiderZone::on_top_of(size, RIDER_ZONE_HEIGHT),
            mover,
            ArenaGeometry,
        ))
        .id();
    Some(entity)
}

/// Spawn a ledge that falls away after the player lands on it.
pub fn spawn_breaking_platform(
    commands: &mut Commands,
    assets: &ArenaAssets,
    def: &BreakingPlatformDef,
) -> Entity {
    let size = def.size();
    commands
        .spawn((
            Mesh3d(assets.unit_cube.clone()),
            MeshMaterial3d(assets.breaking.clone()),
            Transform::from_translation(def.center()).with_scale(size),
            RigidBody::KinematicPositionBased,
            Collider::cuboid(0.5, 0.5, 0.5),
            world_groups(),
            RiderZone::on_top_of(size, RIDER_ZONE_HEIGHT),
            BreakingPlatform::new(def.break_delay, def.despawn_after),
            ArenaGeometry,
        ))
        .id()
}

/// Build the whole arena. Returns the player start position.
pub fn build_arena(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    layout: &ArenaLayout,
) -> Vec3 {
    let assets = ArenaAssets::new(meshes, materials);

    let ground = BoxDef {
        center: (0.0, -0.25, 0.0),
        size: (layout.ground_size.0, 0.5, layout.ground_size.1),
    };
    spawn_static_box(commands, &assets, &ground, assets.ground.clone());

    for wall in &layout.walls {
        spawn_static_box(commands, &assets, wall, assets.wall.clone());
    }
    for platform in &layout.platforms {
        spawn_static_box(commands, &assets, platform, assets.platform.clone());
    }
    for point in &layout.grapple_points {
        spawn_grapple_point(commands, &assets, point);
    }
    for item in &layout.items {
        spawn_item(commands, &assets, item);
    }
    for platform in &layout.moving_platforms {
        if spawn_moving_platform(commands, &assets, platform).is_none() {
            warn!("Skipping moving platform with a degenerate path");
        }
    }
    for platform in &layout.breaking_platforms {
        spawn_breaking_platform(commands, &assets, platform);
    }

    commands.spawn((
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(10.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
        ArenaGeometry,
    ));

    info!(
        "Arena built: {} walls, {} platforms ({} moving, {} breaking), {} grapple points, {} items",
        layout.walls.len(),
        layout.platforms.len(),
        layout.moving_platforms.len(),
        layout.breaking_platforms.len(),
        layout.grapple_points.len(),
        layout.items.len()
    );

    layout.player_start()
}
