//! World plugin - arena loading, setup and reactive platforms.

use bevy::prelude::*;

use crate::core::GameState;
use crate::player::{spawn_player, Player, PlayerCamera, RespawnSettings};
use crate::tether::AbilitiesConfig;

use super::data::{load_arena_layout, ArenaLayout};
use super::platforms::{crumble_platforms, detect_platform_riders, move_platforms};
use super::spawning::{build_arena, ArenaGeometry};

/// World plugin - handles arena loading and world setup.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_arena_layout)
            .add_systems(OnEnter(GameState::InGame), setup_arena)
            .add_systems(OnEnter(GameState::Loading), cleanup_arena)
            .add_systems(
                FixedUpdate,
                (detect_platform_riders, move_platforms, crumble_platforms)
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            );
    }
}

/// Build the arena and spawn the player, once per session.
pub fn setup_arena(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    layout: Res<ArenaLayout>,
    abilities: Res<AbilitiesConfig>,
    mut respawn: ResMut<RespawnSettings>,
    existing: Query<(), With<Player>>,
) {
    // Coming back from pause re-enters InGame.
    if !existing.is_empty() {
        return;
    }

    respawn.fall_limit = layout.fall_limit;

    info!("Building arena");
    let player_pos = build_arena(&mut commands, &mut meshes, &mut materials, &layout);
    spawn_player(&mut commands, &mut meshes, &mut materials, player_pos, &abilities);
}

/// Clean up arena entities when returning to Loading.
fn cleanup_arena(
    mut commands: Commands,
    arena_query: Query<Entity, With<ArenaGeometry>>,
    player_query: Query<Entity, Or<(With<Player>, With<PlayerCamera>)>>,
) {
    for entity in arena_query.iter().chain(player_query.iter()) {
        commands.entity(entity).despawn_recursive();
    }
}
