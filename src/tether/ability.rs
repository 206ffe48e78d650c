//! One ability instance: activation gate, target selector and tether controller.
//!
//! The ability is driven explicitly by two clocks: [`TetherAbility::tick_frame`]
//! and the activation edge run on the frame clock, [`TetherAbility::tick_physics`]
//! runs on the fixed physics clock.

use bevy::prelude::*;

use super::body::TetherBody;
use super::config::AbilityConfig;
use super::controller::{TetherController, TetherFrame, TetherStop};
use super::error::LeaseError;
use super::gate::{ActivationGate, GateAction};
use super::lease::LeaseRegistry;
use super::query::SpatialQueries;
use super::selector::{
    CandidateResolver, Capability, ScoredCandidate, SelectionRequest, TargetCandidate,
    TargetSelector,
};
use super::visibility::ViewportProjector;
use crate::core::StopReason;

/// Which way the tether moves things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    /// The actor flies to a fixed grapple point.
    Grapple,
    /// A loose item flies to the actor.
    ItemPull,
}

impl AbilityKind {
    pub fn capability(self) -> Capability {
        match self {
            AbilityKind::Grapple => Capability::Grappleable,
            AbilityKind::ItemPull => Capability::Pullable,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AbilityKind::Grapple => "grapple",
            AbilityKind::ItemPull => "item_pull",
        }
    }
}

/// Result of an activation edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    /// Gate was open but nothing qualified.
    NoTarget,
    CoolingDown,
    Disabled,
    /// Gate was open and this target should be tethered.
    Selected(ScoredCandidate),
    /// The press cancelled the running tether.
    Cancel,
}

/// The spatial side of an activation: where to look and what can see.
pub struct ActivationQuery<'a, Q: ?Sized, R: ?Sized> {
    pub queries: &'a Q,
    pub resolver: &'a R,
    pub camera: Option<&'a dyn ViewportProjector>,
    /// Actor body position; the query origin sits `origin_height` above it.
    pub actor_position: Vec3,
    pub actor_collider: Option<Entity>,
}

/// A grapple hook or item pull attached to an actor.
#[derive(Component, Debug)]
pub struct TetherAbility {
    pub kind: AbilityKind,
    pub config: AbilityConfig,
    gate: ActivationGate,
    selector: TargetSelector,
    controller: TetherController,
}

impl TetherAbility {
    pub fn new(kind: AbilityKind, config: AbilityConfig) -> Self {
        Self {
            kind,
            config,
            gate: ActivationGate::default(),
            selector: TargetSelector::default(),
            controller: TetherController::default(),
        }
    }

    /// `IsGrappling` / `IsPulling`.
    pub fn is_tethering(&self) -> bool {
        self.controller.is_active()
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.gate.cooldown().is_on_cooldown()
    }

    pub fn cooldown_remaining(&self) -> f32 {
        self.gate.cooldown().remaining()
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.enabled
    }

    /// Switch the ability on or off. A running tether is stopped with
    /// [`StopReason::Disabled`] on the next frame or physics tick, whichever
    /// comes first. The player's control lock switches off the other tethers
    /// on an actor while one of them carries it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.gate.enabled = enabled;
    }

    pub fn controller(&self) -> &TetherController {
        &self.controller
    }

    /// Query origin for an actor whose body sits at `actor_position`.
    pub fn query_origin(&self, actor_position: Vec3) -> Vec3 {
        actor_position + Vec3::Y * self.config.origin_height
    }

    /// Catch point for items pulled to an actor at `actor_position`.
    pub fn catch_point(&self, actor_position: Vec3) -> Vec3 {
        actor_position + Vec3::Y * self.config.catch_height
    }

    /// Where the held body is headed: the captured grapple point, or the
    /// actor's catch point sampled now for item pulls.
    pub fn anchor(&self, actor_position: Vec3) -> Option<Vec3> {
        let active = self.controller.active()?;
        Some(match self.kind {
            AbilityKind::Grapple => active.anchor,
            AbilityKind::ItemPull => self.catch_point(actor_position),
        })
    }

    /// Frame clock: decay the cooldown.
    pub fn tick_frame(&mut self, delta: f32) {
        self.gate.tick(delta);
    }

    /// Frame clock: the activation control was pressed this frame.
    pub fn on_activation_edge<Q, R>(
        &mut self,
        query: &ActivationQuery<Q, R>,
        leases: &LeaseRegistry,
    ) -> Activation
    where
        Q: SpatialQueries + ?Sized,
        R: CandidateResolver + ?Sized,
    {
        match self.gate.on_activation_edge(self.controller.is_active()) {
            GateAction::Cancel => Activation::Cancel,
            GateAction::CoolingDown => Activation::CoolingDown,
            GateAction::Disabled => Activation::Disabled,
            GateAction::Acquire => {
                let request = SelectionRequest {
                    origin: self.query_origin(query.actor_position),
                    capability: self.kind.capability(),
                    targeting: &self.config.targeting,
                    camera: query.camera,
                    actor_collider: query.actor_collider,
                    leases: Some(leases),
                };
                match self.selector.find_best(query.queries, query.resolver, &request) {
                    Some(best) => Activation::Selected(best),
                    None => Activation::NoTarget,
                }
            }
        }
    }

    /// Start tethering `body_entity` toward `target`. Starts the cooldown.
    pub fn begin<B: TetherBody + ?Sized>(
        &mut self,
        holder: Entity,
        target: &TargetCandidate,
        body_entity: Entity,
        body: &mut B,
        leases: &mut LeaseRegistry,
    ) -> Result<(), LeaseError> {
        self.controller.begin(
            holder,
            target.target,
            target.anchor,
            body_entity,
            body,
            &self.config,
            leases,
        )?;
        self.gate.start_cooldown(self.config.cooldown_duration());
        Ok(())
    }

    /// Physics clock: move the held body. `body` is `None` if it no longer exists.
    pub fn tick_physics<B: TetherBody>(
        &mut self,
        body: Option<&mut B>,
        frame: &TetherFrame,
        leases: &mut LeaseRegistry,
    ) -> Option<TetherStop> {
        if !self.controller.is_active() {
            return None;
        }
        if !self.gate.enabled {
            let body = body.map(|b| b as &mut dyn TetherBody);
            return self
                .controller
                .stop(StopReason::Disabled, body, frame, &self.config, leases);
        }
        match body {
            Some(body) => self.controller.advance(body, frame, &self.config, leases),
            None => self
                .controller
                .stop(StopReason::TargetLost, None, frame, &self.config, leases),
        }
    }

    /// Force the tether back to idle without arrival behaviour.
    pub fn stop(
        &mut self,
        reason: StopReason,
        body: Option<&mut dyn TetherBody>,
        frame: &TetherFrame,
        leases: &mut LeaseRegistry,
    ) -> Option<TetherStop> {
        self.controller.stop(reason, body, frame, &self.config, leases)
    }
}
