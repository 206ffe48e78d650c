//! Tether Platformer - Entry Point
//!
//! Controls:
//! - WASD: Move
//! - Mouse: Orbit camera
//! - Space: Jump (release early for a short hop)
//! - E: Grapple to the point nearest the screen center (press again to let go)
//! - F: Pull an item to you
//! - Escape: Pause/Unpause

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

fn main() {
    App::new()
        // Bevy default plugins
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Tether Platformer".to_string(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))

        // Physics steps on the fixed clock, after tethered motion is written.
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())

        // Our game plugin
        .add_plugins(tether_platformer::PlatformerPlugin)

        .run();
}
