//! Tether module - grapple-to-point and pull-item-to-actor abilities.
//!
//! The pure pieces (selection, gating, motion, leases) are written against
//! small traits so they run without an `App`. [`rapier`] binds those traits
//! to Bevy and Rapier.

mod ability;
mod body;
mod components;
mod config;
mod controller;
mod error;
mod gate;
mod lease;
mod plugin;
mod query;
pub mod rapier;
mod selector;
mod systems;
mod visibility;

pub use ability::*;
pub use body::*;
pub use components::*;
pub use config::*;
pub use controller::*;
pub use error::*;
pub use gate::*;
pub use lease::*;
pub use plugin::{TetherPlugin, TetherSet};
pub use query::*;
pub use selector::*;
pub use visibility::*;
