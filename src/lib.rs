//! Tether Platformer - a third-person physics platformer with a grapple hook
//! and an item pull, built on Bevy and Rapier.
//!
//! # Architecture
//!
//! The game is organized into plugins, each handling a specific aspect:
//!
//! - **Core**: Game states, tether events, easing helpers
//! - **Player**: Third-person locomotion, jumping, camera rig, control lock
//! - **Tether**: Target selection, activation gating, tethered motion
//! - **World**: The demo arena

pub mod core;
pub mod player;
pub mod tether;
pub mod world;

use bevy::prelude::*;

/// Main game plugin that adds all sub-plugins.
pub struct PlatformerPlugin;

impl Plugin for PlatformerPlugin {
    fn build(&self, app: &mut App) {
        app
            // Core systems (must be first)
            .add_plugins(core::CorePlugin)

            // Grapple hook and item pull
            .add_plugins(tether::TetherPlugin)

            // Player systems
            .add_plugins(player::PlayerPlugin)

            // World systems
            .add_plugins(world::WorldPlugin);
    }
}
