//! Tether plugin - grapple hook and item pull.

use bevy::prelude::*;

use super::config::load_abilities_config;
use super::lease::LeaseRegistry;
use super::systems::*;
use crate::core::GameState;

/// Ordering handles for systems that react to tether events.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetherSet {
    /// Cooldowns, activation input and forced stops (`Update`).
    Input,
    /// Tethered motion (`FixedUpdate`).
    Motion,
}

/// Tether plugin - target selection, activation and tethered motion.
///
/// Activation runs on the frame clock, motion on the fixed physics clock.
/// Holder cleanup runs in every state so a despawn while paused still
/// restores the held body. Pausing also stops the physics pipeline, since
/// tethered motion is halted with it.
pub struct TetherPlugin;

impl Plugin for TetherPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<LeaseRegistry>()
            .add_systems(Startup, load_abilities_config)

            .add_systems(
                Update,
                (
                    tick_cooldowns,
                    handle_activation,
                    stop_disabled_abilities,
                )
                    .chain()
                    .in_set(TetherSet::Input)
                    .run_if(in_state(GameState::InGame))
            )
            .add_systems(Update, release_removed_holders.in_set(TetherSet::Input))

            .add_systems(OnEnter(GameState::Paused), pause_physics)
            .add_systems(OnExit(GameState::Paused), resume_physics)

            .add_systems(
                FixedUpdate,
                advance_tethers
                    .in_set(TetherSet::Motion)
                    .run_if(in_state(GameState::InGame))
            );
    }
}
