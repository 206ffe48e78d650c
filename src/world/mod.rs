//! World module - the demo arena and its moving and breaking platforms.

mod data;
mod error;
mod platforms;
mod plugin;
mod spawning;

pub use data::{
    ArenaLayout, BoxDef, BreakingPlatformDef, GrapplePointDef, ItemDef, MovingPlatformDef,
};
pub use error::DataLoadError;
pub use platforms::{
    BreakStep, BreakingPlatform, PathMover, PlatformPath, RiderZone, ZoneEdge,
};
pub use plugin::{setup_arena, WorldPlugin};
pub use spawning::{build_arena, ArenaGeometry};
