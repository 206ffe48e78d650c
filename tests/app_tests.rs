//! Tether systems running inside a headless Bevy app, without a window or
//! a Rapier pipeline. Each `app.update()` advances exactly one physics step.

use std::time::Duration;

use bevy::ecs::system::RunSystemOnce;
use bevy::input::InputPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::{Collider, LockedAxes, RapierConfiguration, RigidBody};
use smallvec::smallvec;

use tether_platformer::core::{CorePlugin, GameState, StopReason, TetherStarted, TetherStopped};
use tether_platformer::player::{ControlLock, JumpState, Player, PlayerPlugin, RespawnPoint};
use tether_platformer::tether::rapier::{RapierBody, SceneTargets};
use tether_platformer::tether::{
    AbilityBinding, AbilityConfig, AbilityKind, AbilityOwner, BodyProperties, CandidateResolver,
    Capability, GrapplePoint, LeaseRegistry, PullableItem, TargetCandidate, TetherAbility,
    TetherBody, TetherBodyBundle, TetherFrame, TetherPlugin,
};

const STEP: Duration = Duration::from_micros(15_625);

// === Harness ===

#[derive(Resource, Default)]
struct StopLog(Vec<(Entity, StopReason)>);

impl StopLog {
    fn reason_for(&self, ability: Entity) -> Option<StopReason> {
        self.0.iter().find(|(e, _)| *e == ability).map(|(_, r)| *r)
    }
}

fn record_stops(mut events: EventReader<TetherStopped>, mut log: ResMut<StopLog>) {
    log.0.extend(events.read().map(|e| (e.ability, e.reason)));
}

fn headless_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, InputPlugin))
        .add_plugins((CorePlugin, TetherPlugin, PlayerPlugin))
        .insert_resource(TimeUpdateStrategy::ManualDuration(STEP))
        .init_resource::<StopLog>()
        .add_systems(Last, record_stops);

    for _ in 0..3 {
        app.update();
        if *app.world().resource::<State<GameState>>().get() == GameState::InGame {
            return app;
        }
    }
    panic!("headless app never reached InGame");
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Player,
            ControlLock::default(),
            JumpState::default(),
            RespawnPoint::new(position, Quat::IDENTITY),
            Transform::from_translation(position),
            TetherBodyBundle::dynamic().with_locked_axes(LockedAxes::ROTATION_LOCKED),
        ))
        .id()
}

fn spawn_item(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            PullableItem::default(),
            Transform::from_translation(position),
            TetherBodyBundle::dynamic(),
        ))
        .id()
}

fn spawn_ability(app: &mut App, actor: Entity, kind: AbilityKind, config: AbilityConfig) -> Entity {
    let binding = match kind {
        AbilityKind::Grapple => AbilityBinding::GRAPPLE,
        AbilityKind::ItemPull => AbilityBinding::ITEM_PULL,
    };
    app.world_mut()
        .spawn((TetherAbility::new(kind, config), AbilityOwner(actor), binding))
        .id()
}

/// An item pull that stays in flight for the length of a test.
fn slow_pull() -> AbilityConfig {
    let mut config = AbilityConfig::item_pull();
    config.pull_duration = 10.0;
    config.ease = None;
    config.stop_when_close = false;
    config
}

/// Take `body` toward `anchor` the way a selected target would.
fn begin_tether(app: &mut App, ability: Entity, target: Entity, body: Entity, anchor: Vec3) {
    let started = app.world_mut().run_system_once(
        move |mut abilities: Query<(&mut TetherAbility, &AbilityOwner)>,
              mut bodies: Query<RapierBody>,
              mut leases: ResMut<LeaseRegistry>,
              mut events: EventWriter<TetherStarted>| {
            let Ok((mut tether, owner)) = abilities.get_mut(ability) else {
                return false;
            };
            let Ok(mut held) = bodies.get_mut(body) else {
                return false;
            };
            let candidate = TargetCandidate {
                target,
                body: (tether.kind == AbilityKind::ItemPull).then_some(body),
                anchor,
                capability: tether.kind.capability(),
                colliders: smallvec![],
            };
            if tether.begin(ability, &candidate, body, &mut held, &mut leases).is_err() {
                return false;
            }
            events.send(TetherStarted {
                ability,
                actor: owner.0,
                target,
                body,
                score: 1.0,
            });
            true
        },
    );
    assert!(matches!(started, Ok(true)), "tether on {:?} should start", body);
}

fn properties(app: &mut App, entity: Entity) -> BodyProperties {
    let world = app.world_mut();
    let mut bodies = world.query::<RapierBody>();
    bodies
        .get_mut(world, entity)
        .expect("entity should carry a tether body")
        .properties()
}

fn translation(app: &App, entity: Entity) -> Vec3 {
    app.world()
        .get::<Transform>(entity)
        .expect("entity should have a transform")
        .translation
}

fn ability(app: &App, entity: Entity) -> &TetherAbility {
    app.world()
        .get::<TetherAbility>(entity)
        .expect("ability should exist")
}

// === RapierBody in a bare world ===

#[test]
fn test_rapier_body_grapple_lands_on_anchor() {
    let mut world = World::new();
    let holder = world.spawn_empty().id();
    let target = world.spawn_empty().id();
    let actor = world
        .spawn((
            Transform::from_xyz(0.0, 1.0, 0.0),
            TetherBodyBundle::dynamic().with_locked_axes(LockedAxes::ROTATION_LOCKED),
        ))
        .id();
    let anchor = Vec3::new(0.0, 5.0, -8.0);

    let mut config = AbilityConfig::grapple();
    config.stop_when_close = false;
    config.pull_duration = 0.25;
    config.exit_impulse = None;
    let mut grapple = TetherAbility::new(AbilityKind::Grapple, config);
    let mut leases = LeaseRegistry::default();
    let mut bodies = world.query::<RapierBody>();

    let candidate = TargetCandidate {
        target,
        body: None,
        anchor,
        capability: Capability::Grappleable,
        colliders: smallvec![],
    };
    {
        let mut body = bodies.get_mut(&mut world, actor).expect("actor body");
        grapple
            .begin(holder, &candidate, actor, &mut body, &mut leases)
            .expect("grapple should start");
    }

    let dt = 0.0625;
    let frame = TetherFrame {
        anchor,
        dt,
        camera_forward: None,
        actor_forward: Vec3::NEG_Z,
    };
    let mut stopped_at = None;
    for tick in 1..=8 {
        let mut body = bodies.get_mut(&mut world, actor).expect("actor body");
        let stop = grapple.tick_physics(Some(&mut body), &frame, &mut leases);
        // Linear part of the physics step.
        let linvel = body.velocity.linvel;
        body.transform.translation += linvel * dt;
        if let Some(stop) = stop {
            assert_eq!(stop.reason, StopReason::Arrived);
            stopped_at = Some(tick);
            break;
        }
    }

    assert_eq!(stopped_at, Some(4), "0.25s at 1/16s steps arrives on the 4th tick");
    let body = bodies.get_mut(&mut world, actor).expect("actor body");
    assert!(
        (body.transform.translation - anchor).length() < 1e-4,
        "landed at {:?}, expected {:?}",
        body.transform.translation,
        anchor
    );
    assert_eq!(body.velocity.linvel, Vec3::ZERO, "no drive velocity left over");
    assert_eq!(*body.rigid_body, RigidBody::Dynamic);
    assert_eq!(*body.locked_axes, LockedAxes::ROTATION_LOCKED, "locks restored");
    assert!(leases.is_empty(), "lease released on arrival");
}

#[test]
fn test_rapier_body_item_pull_moves_kinematically() {
    let mut world = World::new();
    let holder = world.spawn_empty().id();
    let item = world
        .spawn((Transform::from_xyz(0.0, 0.5, -6.0), TetherBodyBundle::dynamic()))
        .id();
    let catch = Vec3::new(0.0, 1.2, 0.0);

    let mut pull = TetherAbility::new(AbilityKind::ItemPull, slow_pull());
    let mut leases = LeaseRegistry::default();
    let mut bodies = world.query::<RapierBody>();

    let candidate = TargetCandidate {
        target: item,
        body: Some(item),
        anchor: Vec3::new(0.0, 0.5, -6.0),
        capability: Capability::Pullable,
        colliders: smallvec![],
    };
    let mut body = bodies.get_mut(&mut world, item).expect("item body");
    pull.begin(holder, &candidate, item, &mut body, &mut leases)
        .expect("pull should start");
    assert_eq!(*body.rigid_body, RigidBody::KinematicPositionBased);
    assert_eq!(body.gravity_scale.0, 0.0, "gravity off while held");

    let frame = TetherFrame {
        anchor: catch,
        dt: 1.0 / 64.0,
        camera_forward: None,
        actor_forward: Vec3::NEG_Z,
    };
    let before = body.transform.translation;
    assert!(pull.tick_physics(Some(&mut body), &frame, &mut leases).is_none());
    assert!(
        body.transform.translation.distance(catch) < before.distance(catch),
        "kinematic bodies move by transform"
    );
    assert_eq!(body.velocity.linvel, Vec3::ZERO);
}

// === Scene hierarchy ===

#[test]
fn test_scene_targets_walk_up_to_tagged_parent() {
    let mut world = World::new();
    let point = world
        .spawn((
            GrapplePoint { local_anchor: Vec3::Y },
            GlobalTransform::from_translation(Vec3::new(2.0, 3.0, 4.0)),
        ))
        .id();
    let point_collider = world.spawn(Collider::ball(0.5)).id();
    world.entity_mut(point).add_child(point_collider);

    let item = world
        .spawn((
            PullableItem::default(),
            RigidBody::Dynamic,
            GlobalTransform::from_translation(Vec3::new(-1.0, 0.5, 0.0)),
        ))
        .id();
    let item_collider = world.spawn(Collider::cuboid(0.2, 0.2, 0.2)).id();
    world.entity_mut(item).add_child(item_collider);

    let stray = world.spawn(Collider::ball(1.0)).id();

    let resolved = world
        .run_system_once(move |targets: SceneTargets| {
            (
                targets.resolve(point_collider),
                targets.resolve(item_collider),
                targets.resolve(stray),
            )
        })
        .expect("resolver system should run");

    let grapple = resolved.0.expect("child collider resolves to its grapple point");
    assert_eq!(grapple.target, point);
    assert_eq!(grapple.body, None);
    assert_eq!(grapple.capability, Capability::Grappleable);
    assert!((grapple.anchor - Vec3::new(2.0, 4.0, 4.0)).length() < 1e-6);
    assert!(grapple.colliders.contains(&point_collider), "own colliders collected");

    let pull = resolved.1.expect("child collider resolves to its item");
    assert_eq!(pull.target, item);
    assert_eq!(pull.body, Some(item));
    assert_eq!(pull.capability, Capability::Pullable);

    assert!(resolved.2.is_none(), "untagged collider resolves to nothing");
}

// === Exit paths through the app ===

#[test]
fn test_disabling_stops_pull_and_restores_item() {
    let mut app = headless_app();
    let player = spawn_player(&mut app, Vec3::new(0.0, 1.0, 0.0));
    let item = spawn_item(&mut app, Vec3::new(0.0, 0.5, -6.0));
    let pull = spawn_ability(&mut app, player, AbilityKind::ItemPull, slow_pull());

    begin_tether(&mut app, pull, item, item, Vec3::new(0.0, 0.5, -6.0));
    app.update();
    assert!(ability(&app, pull).is_tethering());

    app.world_mut()
        .get_mut::<TetherAbility>(pull)
        .expect("ability should exist")
        .set_enabled(false);
    app.update();

    assert_eq!(app.world().resource::<StopLog>().reason_for(pull), Some(StopReason::Disabled));
    assert!(!ability(&app, pull).is_tethering());
    assert_eq!(properties(&mut app, item), BodyProperties::default(), "item handed back as it was");
    assert!(app.world().resource::<LeaseRegistry>().is_empty());
}

#[test]
fn test_removed_holder_gives_item_back() {
    let mut app = headless_app();
    let player = spawn_player(&mut app, Vec3::new(0.0, 1.0, 0.0));
    let item = spawn_item(&mut app, Vec3::new(0.0, 0.5, -6.0));
    let pull = spawn_ability(&mut app, player, AbilityKind::ItemPull, slow_pull());

    begin_tether(&mut app, pull, item, item, Vec3::new(0.0, 0.5, -6.0));
    app.update();
    assert_eq!(properties(&mut app, item).rigid_body, RigidBody::KinematicPositionBased);

    app.world_mut().entity_mut(pull).despawn();
    app.update();

    assert_eq!(
        app.world().resource::<StopLog>().reason_for(pull),
        Some(StopReason::HolderRemoved)
    );
    assert_eq!(properties(&mut app, item), BodyProperties::default());
    assert!(app.world().resource::<LeaseRegistry>().is_empty());
}

#[test]
fn test_despawned_item_ends_pull() {
    let mut app = headless_app();
    let player = spawn_player(&mut app, Vec3::new(0.0, 1.0, 0.0));
    let item = spawn_item(&mut app, Vec3::new(0.0, 0.5, -6.0));
    let pull = spawn_ability(&mut app, player, AbilityKind::ItemPull, slow_pull());

    begin_tether(&mut app, pull, item, item, Vec3::new(0.0, 0.5, -6.0));
    app.update();

    app.world_mut().entity_mut(item).despawn();
    app.update();

    assert_eq!(
        app.world().resource::<StopLog>().reason_for(pull),
        Some(StopReason::TargetLost)
    );
    assert!(!ability(&app, pull).is_tethering());
    assert!(app.world().resource::<LeaseRegistry>().is_empty(), "lease freed without a body");
}

#[test]
fn test_grapple_lock_switches_off_item_pull() {
    let mut app = headless_app();
    let player = spawn_player(&mut app, Vec3::new(0.0, 1.0, 0.0));
    let item = spawn_item(&mut app, Vec3::new(3.0, 0.5, -6.0));
    let point = app.world_mut().spawn_empty().id();
    let anchor = Vec3::new(0.0, 5.0, -8.0);

    let mut grapple_config = AbilityConfig::grapple();
    grapple_config.pull_duration = 4.0 / 64.0;
    grapple_config.stop_when_close = false;
    grapple_config.exit_impulse = None;
    let grapple = spawn_ability(&mut app, player, AbilityKind::Grapple, grapple_config);
    let pull = spawn_ability(&mut app, player, AbilityKind::ItemPull, slow_pull());

    begin_tether(&mut app, pull, item, item, Vec3::new(3.0, 0.5, -6.0));
    app.update();
    begin_tether(&mut app, grapple, point, player, anchor);

    // Lock engages on the first frame, the pull lets go by the next.
    app.update();
    app.update();
    {
        let lock = app.world().get::<ControlLock>(player).expect("player lock");
        assert!(lock.is_locked(), "grapple locks player controls");
    }
    assert!(!ability(&app, pull).is_enabled(), "other tethers switched off");
    assert!(!ability(&app, pull).is_tethering());
    assert_eq!(app.world().resource::<StopLog>().reason_for(pull), Some(StopReason::Disabled));
    assert_eq!(properties(&mut app, item).rigid_body, RigidBody::Dynamic);
    assert!(ability(&app, grapple).is_tethering(), "grapple keeps going");

    for _ in 0..8 {
        if app.world().resource::<StopLog>().reason_for(grapple).is_some() {
            break;
        }
        app.update();
    }

    assert_eq!(app.world().resource::<StopLog>().reason_for(grapple), Some(StopReason::Arrived));
    let lock = app.world().get::<ControlLock>(player).expect("player lock");
    assert!(!lock.is_locked(), "lock released on arrival");
    assert!(ability(&app, pull).is_enabled(), "item pull switched back on");
    assert!(
        (translation(&app, player) - anchor).length() < 1e-4,
        "player landed on the grapple anchor"
    );
}

#[test]
fn test_pause_freezes_physics_and_held_item() {
    let mut app = headless_app();
    let config = app.world_mut().spawn(RapierConfiguration::new(1.0)).id();
    let player = spawn_player(&mut app, Vec3::new(0.0, 1.0, 0.0));
    let item = spawn_item(&mut app, Vec3::new(0.0, 0.5, -6.0));
    let pull = spawn_ability(&mut app, player, AbilityKind::ItemPull, slow_pull());

    begin_tether(&mut app, pull, item, item, Vec3::new(0.0, 0.5, -6.0));
    app.update();

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Paused);
    app.update();
    let held_at = translation(&app, item);
    let pipeline_active = |app: &App| {
        app.world()
            .get::<RapierConfiguration>(config)
            .expect("rapier configuration")
            .physics_pipeline_active
    };
    assert!(!pipeline_active(&app), "physics stepping stops while paused");

    app.update();
    app.update();
    assert_eq!(translation(&app, item), held_at, "held item doesn't drift while paused");
    assert!(ability(&app, pull).is_tethering(), "pause doesn't end the tether");

    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::InGame);
    app.update();
    assert!(pipeline_active(&app), "physics resumes with the game");
}
