//! Player plugin - movement, jumping and the camera rig.

use bevy::prelude::*;

use super::movement;

/// Player plugin - handles player movement, jumping and camera.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        movement::setup_movement_systems(app);
    }
}
