//! Bevy systems driving the tether abilities.
//!
//! Cooldowns, activation input and forced stops run on the frame clock
//! (`Update`). Motion runs on the fixed physics clock (`FixedUpdate`), before
//! Rapier steps in `FixedPostUpdate`.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use super::ability::{AbilityKind, Activation, ActivationQuery, TetherAbility};
use super::body::TetherBody;
use super::components::{AbilityBinding, AbilityOwner};
use super::controller::{TetherFrame, TetherStop};
use super::lease::LeaseRegistry;
use super::rapier::{CameraProjector, RapierBody, RapierSpatialQueries, SceneTargets};
use super::visibility::ViewportProjector;
use crate::core::{StopReason, TetherStarted, TetherStopped};

fn fixed_dt(fixed: &Time<Fixed>) -> f32 {
    fixed.timestep().as_secs_f32()
}

/// Actor body position and forward, read from its rigid body.
fn actor_pose(bodies: &Query<RapierBody>, actor: Entity) -> Option<(Vec3, Vec3)> {
    let body = bodies.get(actor).ok()?;
    Some((body.transform.translation, body.transform.forward().as_vec3()))
}

fn tether_frame(
    ability: &TetherAbility,
    actor_position: Vec3,
    actor_forward: Vec3,
    camera_forward: Option<Vec3>,
    dt: f32,
) -> TetherFrame {
    TetherFrame {
        anchor: ability.anchor(actor_position).unwrap_or(actor_position),
        dt,
        camera_forward,
        actor_forward,
    }
}

fn stopped_event(ability: Entity, actor: Entity, stop: TetherStop) -> TetherStopped {
    TetherStopped {
        ability,
        actor,
        target: stop.target,
        body: stop.body,
        reason: stop.reason,
    }
}

/// Stop `ability` immediately, restoring its held body if it still exists.
fn force_stop(
    ability: &mut TetherAbility,
    reason: StopReason,
    frame: &TetherFrame,
    bodies: &mut Query<RapierBody>,
    leases: &mut LeaseRegistry,
) -> Option<TetherStop> {
    let held = ability.controller().active()?.body;
    let mut body = bodies.get_mut(held).ok();
    let body = body.as_mut().map(|b| b as &mut dyn TetherBody);
    ability.stop(reason, body, frame, leases)
}

/// Decay every ability's cooldown by real frame time.
pub fn tick_cooldowns(time: Res<Time>, mut abilities: Query<&mut TetherAbility>) {
    let delta = time.delta_secs();
    for mut ability in abilities.iter_mut() {
        ability.tick_frame(delta);
    }
}

/// Handle activation presses: cancel, or select a target and begin.
#[allow(clippy::too_many_arguments)]
pub fn handle_activation(
    keyboard: Res<ButtonInput<KeyCode>>,
    fixed: Res<Time<Fixed>>,
    rapier_context: Query<&RapierContext>,
    targets: SceneTargets,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut abilities: Query<(Entity, &mut TetherAbility, &AbilityOwner, &AbilityBinding)>,
    mut bodies: Query<RapierBody>,
    mut leases: ResMut<LeaseRegistry>,
    mut started: EventWriter<TetherStarted>,
    mut stopped: EventWriter<TetherStopped>,
) {
    let Ok(context) = rapier_context.get_single() else {
        return;
    };
    let queries = RapierSpatialQueries { context };
    let projector = cameras
        .get_single()
        .ok()
        .map(|(camera, transform)| CameraProjector { camera, transform });
    let camera_forward = projector.as_ref().map(CameraProjector::forward);
    let dt = fixed_dt(&fixed);

    for (entity, mut ability, owner, binding) in abilities.iter_mut() {
        if !keyboard.just_pressed(binding.key) {
            continue;
        }
        let actor = owner.0;
        let Some((actor_position, actor_forward)) = actor_pose(&bodies, actor) else {
            continue;
        };

        let query = ActivationQuery {
            queries: &queries,
            resolver: &targets,
            camera: projector.as_ref().map(|p| p as &dyn ViewportProjector),
            actor_position,
            actor_collider: Some(actor),
        };

        match ability.on_activation_edge(&query, &leases) {
            Activation::Cancel => {
                let frame =
                    tether_frame(&ability, actor_position, actor_forward, camera_forward, dt);
                if let Some(stop) = force_stop(
                    &mut ability,
                    StopReason::Cancelled,
                    &frame,
                    &mut bodies,
                    &mut leases,
                ) {
                    debug!("{} cancelled on {:?}", ability.kind.name(), stop.target);
                    stopped.send(stopped_event(entity, actor, stop));
                }
            }
            Activation::Selected(best) => {
                let body_entity = match ability.kind {
                    AbilityKind::Grapple => actor,
                    AbilityKind::ItemPull => match best.candidate.body {
                        Some(body) => body,
                        None => continue,
                    },
                };
                let Ok(mut body) = bodies.get_mut(body_entity) else {
                    warn!(
                        "{} target {:?} has no tetherable body",
                        ability.kind.name(),
                        best.candidate.target
                    );
                    continue;
                };

                match ability.begin(entity, &best.candidate, body_entity, &mut body, &mut leases) {
                    Ok(()) => {
                        debug!(
                            "{} started on {:?} (score {:.3}, distance {:.2})",
                            ability.kind.name(),
                            best.candidate.target,
                            best.score,
                            best.distance
                        );
                        started.send(TetherStarted {
                            ability: entity,
                            actor,
                            target: best.candidate.target,
                            body: body_entity,
                            score: best.score,
                        });
                    }
                    Err(e) => debug!("{} not started: {}", ability.kind.name(), e),
                }
            }
            Activation::NoTarget => debug!("{}: no valid target", ability.kind.name()),
            Activation::CoolingDown | Activation::Disabled => {}
        }
    }
}

/// Abilities switched off mid-tether let go of their body at once.
pub fn stop_disabled_abilities(
    fixed: Res<Time<Fixed>>,
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    mut abilities: Query<(Entity, &mut TetherAbility, &AbilityOwner)>,
    mut bodies: Query<RapierBody>,
    mut leases: ResMut<LeaseRegistry>,
    mut stopped: EventWriter<TetherStopped>,
) {
    let camera_forward = cameras.get_single().ok().map(|t| t.forward().as_vec3());
    let dt = fixed_dt(&fixed);

    for (entity, mut ability, owner) in abilities.iter_mut() {
        if ability.is_enabled() || !ability.is_tethering() {
            continue;
        }
        let (actor_position, actor_forward) =
            actor_pose(&bodies, owner.0).unwrap_or((Vec3::ZERO, Vec3::NEG_Z));
        let frame = tether_frame(&ability, actor_position, actor_forward, camera_forward, dt);
        if let Some(stop) =
            force_stop(&mut ability, StopReason::Disabled, &frame, &mut bodies, &mut leases)
        {
            debug!("{} disabled while tethered", ability.kind.name());
            stopped.send(stopped_event(entity, owner.0, stop));
        }
    }
}

/// Freeze the physics world while paused, so tethered bodies don't coast on
/// their last drive velocity.
pub fn pause_physics(mut configs: Query<&mut RapierConfiguration>) {
    for mut config in configs.iter_mut() {
        config.physics_pipeline_active = false;
    }
    debug!("Physics paused");
}

pub fn resume_physics(mut configs: Query<&mut RapierConfiguration>) {
    for mut config in configs.iter_mut() {
        config.physics_pipeline_active = true;
    }
}

/// Give bodies back when the ability holding them is removed.
pub fn release_removed_holders(
    mut removed: RemovedComponents<TetherAbility>,
    mut bodies: Query<RapierBody>,
    mut leases: ResMut<LeaseRegistry>,
    mut stopped: EventWriter<TetherStopped>,
) {
    for holder in removed.read() {
        let Some((body_entity, snapshot)) = leases.revoke_holder(holder) else {
            continue;
        };
        if let Ok(mut body) = bodies.get_mut(body_entity) {
            body.settle();
            body.set_properties(snapshot);
        }
        warn!("Tether holder {:?} removed while holding {:?}", holder, body_entity);
        stopped.send(TetherStopped {
            ability: holder,
            actor: Entity::PLACEHOLDER,
            target: Entity::PLACEHOLDER,
            body: body_entity,
            reason: StopReason::HolderRemoved,
        });
    }
}

/// Advance every active tether by one physics step.
pub fn advance_tethers(
    time: Res<Time>,
    cameras: Query<&GlobalTransform, With<Camera3d>>,
    mut abilities: Query<(Entity, &mut TetherAbility, &AbilityOwner)>,
    mut bodies: Query<RapierBody>,
    mut leases: ResMut<LeaseRegistry>,
    mut stopped: EventWriter<TetherStopped>,
) {
    let dt = time.delta_secs();
    let camera_forward = cameras.get_single().ok().map(|t| t.forward().as_vec3());

    for (entity, mut ability, owner) in abilities.iter_mut() {
        let Some(held) = ability.controller().active().map(|active| active.body) else {
            continue;
        };
        let actor = owner.0;

        // A missing actor makes the anchor meaningless; treat it as a lost target.
        let Some((actor_position, actor_forward)) = actor_pose(&bodies, actor) else {
            let frame = tether_frame(&ability, Vec3::ZERO, Vec3::NEG_Z, camera_forward, dt);
            if let Some(stop) =
                force_stop(&mut ability, StopReason::TargetLost, &frame, &mut bodies, &mut leases)
            {
                stopped.send(stopped_event(entity, actor, stop));
            }
            continue;
        };

        let frame = tether_frame(&ability, actor_position, actor_forward, camera_forward, dt);
        let mut body = bodies.get_mut(held).ok();
        let Some(stop) = ability.tick_physics(body.as_mut(), &frame, &mut leases) else {
            continue;
        };

        match stop.reason {
            StopReason::Arrived => debug!("{} arrived at {:?}", ability.kind.name(), stop.target),
            reason => info!("{} stopped: {:?}", ability.kind.name(), reason),
        }
        stopped.send(stopped_event(entity, actor, stop));
    }
}
