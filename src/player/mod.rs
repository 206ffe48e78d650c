//! Player module - player body, locomotion, jumping, respawning and the camera rig.

mod components;
mod jump;
mod movement;
mod plugin;
mod respawn;

pub use components::*;
pub use jump::{JumpCommand, JumpInput, JumpSettings, JumpState};
pub use movement::{move_towards, planar_step, smooth_yaw, spawn_player};
pub use plugin::PlayerPlugin;
pub use respawn::{RespawnPoint, RespawnSettings};
