//! Global events used for cross-system communication.
//!
//! Tether abilities announce when they take and release control of a body.
//! Control locks, animation and debug overlays listen for these instead of
//! polling the abilities every frame.

use bevy::prelude::*;

/// Why a tether returned to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// The held body reached the anchor (or the pull ran its full duration).
    Arrived,
    /// The activation control was pressed again while tethered.
    Cancelled,
    /// The held body was despawned or lost its physics components.
    TargetLost,
    /// The ability was disabled mid-tether.
    Disabled,
    /// The ability entity itself was removed while holding a body.
    HolderRemoved,
}

impl StopReason {
    /// Only arrival hands the body back with exit behaviour (impulse, snap).
    pub fn arrived(self) -> bool {
        matches!(self, StopReason::Arrived)
    }
}

/// Sent when an ability takes control of a body.
#[derive(Event, Debug, Clone)]
pub struct TetherStarted {
    /// Ability entity holding the tether
    pub ability: Entity,
    /// Actor that owns the ability
    pub actor: Entity,
    /// Grapple point or pullable item that was selected
    pub target: Entity,
    /// Body under tether control
    pub body: Entity,
    /// Selection score of the chosen target
    pub score: f32,
}

/// Sent when an ability releases a body, on every exit path.
///
/// With [`StopReason::HolderRemoved`] the ability is already gone, so `actor`
/// and `target` are `Entity::PLACEHOLDER`.
#[derive(Event, Debug, Clone)]
pub struct TetherStopped {
    pub ability: Entity,
    pub actor: Entity,
    pub target: Entity,
    pub body: Entity,
    pub reason: StopReason,
}
