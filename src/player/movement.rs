//! Third-person player movement, jumping and camera rig.

use std::f32::consts::{PI, TAU};

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};
use bevy_rapier3d::prelude::*;

use super::components::*;
use super::jump::{JumpCommand, JumpInput, JumpSettings, JumpState};
use super::respawn::{respawn_fallen_player, track_safe_ground, RespawnPoint, RespawnSettings};
use crate::core::{GameState, TetherStarted, TetherStopped};
use crate::tether::{
    collision_groups, layers, AbilitiesConfig, AbilityBinding, AbilityKind, AbilityOwner,
    CollisionMask, TetherAbility, TetherBodyBundle, TetherSet,
};

/// Capsule half height and radius; the bottom sits 0.8 below the origin.
const CAPSULE_HALF_HEIGHT: f32 = 0.5;
const CAPSULE_RADIUS: f32 = 0.3;

/// Wish directions shorter than this (squared) are treated as no input.
const MIN_WISH_LENGTH_SQUARED: f32 = 0.0001;

/// Set up player movement systems.
pub fn setup_movement_systems(app: &mut App) {
    app
        .init_resource::<PlayerConfig>()
        .init_resource::<JumpSettings>()
        .init_resource::<RespawnSettings>()
        .add_systems(OnEnter(GameState::InGame), grab_cursor)
        .add_systems(OnExit(GameState::InGame), release_cursor)
        .add_systems(
            Update,
            (
                apply_control_locks.after(TetherSet::Input),
                player_jump.after(apply_control_locks),
                mouse_look,
                follow_camera.after(mouse_look),
            )
            .run_if(in_state(GameState::InGame))
        )
        .add_systems(
            FixedUpdate,
            (
                player_locomotion.before(TetherSet::Motion),
                (track_safe_ground, respawn_fallen_player).after(player_locomotion),
            )
                .run_if(in_state(GameState::InGame))
        );
}

/// Grab and hide cursor when entering gameplay.
fn grab_cursor(mut window_query: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = window_query.get_single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

/// Release cursor when leaving gameplay.
fn release_cursor(mut window_query: Query<&mut Window, With<PrimaryWindow>>) {
    if let Ok(mut window) = window_query.get_single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + offset / distance * max_delta
    }
}

/// Next planar velocity for a wish direction and input magnitude in [0, 1].
pub fn planar_step(
    planar: Vec3,
    wish: Vec3,
    input: f32,
    grounded: bool,
    config: &PlayerConfig,
    dt: f32,
) -> Vec3 {
    let control = if grounded { 1.0 } else { config.air_control };
    let desired = wish * config.max_speed * input;
    let rate = if input > 0.0 { config.acceleration } else { config.deceleration };
    move_towards(planar, desired, rate * control * dt)
}

/// Wrap an angle into (-PI, PI].
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Exponentially approach `target` yaw along the shorter arc.
pub fn smooth_yaw(current: f32, target: f32, smooth_time: f32, dt: f32) -> f32 {
    let blend = 1.0 - (-dt / smooth_time.max(0.0001)).exp();
    current + wrap_angle(target - current) * blend
}

/// Camera-relative move direction from WASD.
fn wish_direction(keyboard: &ButtonInput<KeyCode>, camera: Option<&PlayerCamera>) -> Vec3 {
    let mut input = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        input.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        input.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        input.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        input.x += 1.0;
    }

    let direction = match camera {
        Some(camera) => camera.planar_forward() * input.y + camera.planar_right() * input.x,
        None => Vec3::new(input.x, 0.0, -input.y),
    };
    if direction.length_squared() > MIN_WISH_LENGTH_SQUARED {
        direction.normalize()
    } else {
        Vec3::ZERO
    }
}

/// Engage or release the control lock when tethers that move the player
/// start and stop. While locked, the player's other tethers are switched off.
fn apply_control_locks(
    mut started: EventReader<TetherStarted>,
    mut stopped: EventReader<TetherStopped>,
    mut abilities: Query<(Entity, &mut TetherAbility, &AbilityOwner)>,
    mut players: Query<(Entity, &mut ControlLock, &mut JumpState)>,
) {
    for event in started.read() {
        let Ok((_, ability, _)) = abilities.get(event.ability) else {
            continue;
        };
        if !ability.config.lock_actor_controls {
            continue;
        }
        let name = ability.kind.name();
        let Ok((_, mut lock, mut jump)) = players.get_mut(event.actor) else {
            continue;
        };
        if lock.lock(event.ability) {
            jump.reset();
            set_other_tethers(&mut abilities, event.actor, event.ability, false);
            debug!("Player controls locked by {}", name);
        }
    }

    for event in stopped.read() {
        // The holder may already be gone, so check every lock.
        for (player, mut lock, _) in players.iter_mut() {
            if lock.unlock(event.ability) {
                set_other_tethers(&mut abilities, player, event.ability, true);
                debug!("Player controls released ({:?})", event.reason);
            }
        }
    }
}

/// Switch every tether on `actor` except `holder` on or off.
fn set_other_tethers(
    abilities: &mut Query<(Entity, &mut TetherAbility, &AbilityOwner)>,
    actor: Entity,
    holder: Entity,
    enabled: bool,
) {
    for (entity, mut ability, owner) in abilities.iter_mut() {
        if owner.0 == actor && entity != holder {
            ability.set_enabled(enabled);
        }
    }
}

/// Rotate the camera rig from mouse motion.
fn mouse_look(
    mut mouse_motion: EventReader<MouseMotion>,
    config: Res<PlayerConfig>,
    mut camera_query: Query<&mut PlayerCamera>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }

    let Ok(mut camera) = camera_query.get_single_mut() else {
        return;
    };

    let sensitivity = config.mouse_sensitivity * 0.001;
    let y_invert = if config.invert_y { -1.0 } else { 1.0 };

    camera.yaw -= delta.x * sensitivity;
    camera.pitch += delta.y * sensitivity * y_invert;
    camera.pitch = camera
        .pitch
        .clamp(config.min_pitch.to_radians(), config.max_pitch.to_radians());
}

/// Place the camera on its orbit around the player.
fn follow_camera(
    config: Res<PlayerConfig>,
    player_query: Query<&Transform, With<Player>>,
    mut camera_query: Query<(&mut Transform, &PlayerCamera), Without<Player>>,
) {
    let Ok(player) = player_query.get_single() else {
        return;
    };
    let Ok((mut transform, camera)) = camera_query.get_single_mut() else {
        return;
    };

    let pivot = player.translation + Vec3::Y * config.camera_height;
    let orbit = Quat::from_euler(EulerRot::YXZ, camera.yaw, -camera.pitch, 0.0);
    let position = pivot + orbit * Vec3::Z * config.camera_distance;
    *transform = Transform::from_translation(position).looking_at(pivot, Vec3::Y);
}

/// Ray cast just below the capsule for solid ground.
fn check_ground(context: &RapierContext, player: Entity, position: Vec3, length: f32) -> bool {
    let ray_origin = position - Vec3::Y * (CAPSULE_HALF_HEIGHT + CAPSULE_RADIUS - 0.05);
    context
        .cast_ray(
            ray_origin,
            Vec3::NEG_Y,
            length,
            true,
            QueryFilter::default()
                .exclude_collider(player)
                .exclude_sensors(),
        )
        .is_some()
}

/// Buffered, coyote-timed jumping with a jump cut on early release.
fn player_jump(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    config: Res<PlayerConfig>,
    settings: Res<JumpSettings>,
    rapier_context: Query<&RapierContext>,
    mut player_query: Query<
        (Entity, &Transform, &mut Velocity, &mut JumpState, &ControlLock),
        With<Player>,
    >,
) {
    let Ok((player, transform, mut velocity, mut jump, lock)) = player_query.get_single_mut()
    else {
        return;
    };
    if lock.is_locked() {
        return;
    }

    let on_ground = rapier_context
        .get_single()
        .map(|context| check_ground(context, player, transform.translation, config.ground_ray))
        .unwrap_or(true);

    let command = jump.update(
        &settings,
        JumpInput {
            pressed: keyboard.just_pressed(KeyCode::Space),
            released: keyboard.just_released(KeyCode::Space),
            on_ground,
            vertical_velocity: velocity.linvel.y,
            delta: time.delta_secs(),
        },
    );

    match command {
        JumpCommand::Launch(speed) => velocity.linvel.y = speed,
        JumpCommand::Cut(factor) => velocity.linvel.y *= factor,
        JumpCommand::None => {}
    }
}

/// Accelerate toward the camera-relative wish velocity and turn to face it.
fn player_locomotion(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    config: Res<PlayerConfig>,
    camera_query: Query<&PlayerCamera>,
    mut player_query: Query<(&mut Transform, &mut Velocity, &JumpState, &ControlLock), With<Player>>,
) {
    let Ok((mut transform, mut velocity, jump, lock)) = player_query.get_single_mut() else {
        return;
    };
    if lock.is_locked() {
        return;
    }

    let dt = time.delta_secs();
    let wish = wish_direction(&keyboard, camera_query.get_single().ok());
    let input = if wish == Vec3::ZERO { 0.0 } else { 1.0 };

    let planar = Vec3::new(velocity.linvel.x, 0.0, velocity.linvel.z);
    let planar = planar_step(planar, wish, input, jump.grounded, &config, dt);
    velocity.linvel = Vec3::new(planar.x, velocity.linvel.y, planar.z);

    if config.rotate_to_move && wish.length_squared() > MIN_WISH_LENGTH_SQUARED {
        // Forward is -Z, so a wish of -Z means yaw 0.
        let target = f32::atan2(-wish.x, -wish.z);
        let current = transform.rotation.to_euler(EulerRot::YXZ).0;
        let yaw = smooth_yaw(current, target, config.turn_smooth_time, dt);
        transform.rotation = Quat::from_rotation_y(yaw);
    }
}

/// Spawn the player body, its camera rig and its tether abilities.
pub fn spawn_player(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    position: Vec3,
    abilities: &AbilitiesConfig,
) -> Entity {
    let player = commands
        .spawn((
            Player,
            ControlLock::default(),
            JumpState::default(),
            RespawnPoint::new(position, Quat::IDENTITY),
            Mesh3d(meshes.add(Capsule3d::new(CAPSULE_RADIUS, CAPSULE_HALF_HEIGHT * 2.0))),
            MeshMaterial3d(materials.add(Color::srgb(0.85, 0.55, 0.25))),
            Transform::from_translation(position),
            Visibility::default(),
            // Rapier physics components
            TetherBodyBundle::dynamic().with_locked_axes(LockedAxes::ROTATION_LOCKED),
            Collider::capsule_y(CAPSULE_HALF_HEIGHT, CAPSULE_RADIUS),
            collision_groups(layers::PLAYER, CollisionMask::ALL),
            Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
        ))
        .id();

    commands.entity(player).with_children(|parent| {
        parent.spawn((
            Name::new("Grapple"),
            TetherAbility::new(AbilityKind::Grapple, abilities.grapple.clone()),
            AbilityOwner(player),
            AbilityBinding::GRAPPLE,
        ));
        parent.spawn((
            Name::new("Item Pull"),
            TetherAbility::new(AbilityKind::ItemPull, abilities.item_pull.clone()),
            AbilityOwner(player),
            AbilityBinding::ITEM_PULL,
        ));
    });

    commands.spawn((
        Camera3d::default(),
        PlayerCamera::default(),
        Transform::from_translation(position + Vec3::new(0.0, 2.0, 6.0))
            .looking_at(position, Vec3::Y),
    ));

    player
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_clamps_step() {
        let next = move_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_eq!(next, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(move_towards(Vec3::ZERO, Vec3::X, 5.0), Vec3::X, "should land on target");
    }

    #[test]
    fn test_air_control_slows_acceleration() {
        let config = PlayerConfig::default();
        let dt = 0.1;
        let ground = planar_step(Vec3::ZERO, Vec3::NEG_Z, 1.0, true, &config, dt);
        let air = planar_step(Vec3::ZERO, Vec3::NEG_Z, 1.0, false, &config, dt);

        assert!((ground.length() - 2.2).abs() < 1e-4);
        assert!((air.length() - 2.2 * 0.35).abs() < 1e-4);
    }

    #[test]
    fn test_no_input_decelerates_to_rest() {
        let config = PlayerConfig::default();
        let mut planar = Vec3::new(6.0, 0.0, 0.0);
        for _ in 0..30 {
            planar = planar_step(planar, Vec3::ZERO, 0.0, true, &config, 1.0 / 60.0);
        }
        assert_eq!(planar, Vec3::ZERO);
    }

    #[test]
    fn test_smooth_yaw_takes_short_arc() {
        let current = 170_f32.to_radians();
        let target = -170_f32.to_radians();
        let next = smooth_yaw(current, target, 0.08, 1.0 / 60.0);
        assert!(next > current, "should turn through 180 degrees, not back through 0");
    }
}
