//! Game state definitions that control the overall flow of the game.
//!
//! Abilities, locomotion and the camera rig only run in `InGame`; pausing
//! freezes them while keeping the world visible.

use bevy::prelude::*;

/// Main game states.
///
/// - Start in `Loading` while data files are read
/// - Enter `InGame` once config and arena data are in place
/// - `Paused` freezes gameplay but keeps the world visible
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    /// Initial state - loading data files
    #[default]
    Loading,
    /// Active gameplay
    InGame,
    /// Game is paused (overlay on gameplay)
    Paused,
}
