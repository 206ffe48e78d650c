//! Camera-viewport visibility tests and centeredness scoring.

use bevy::prelude::*;
use serde::Deserialize;

pub const DEFAULT_VIEWPORT_PADDING: f32 = 0.06;
pub const MAX_VIEWPORT_PADDING: f32 = 0.45;

/// Distance from the viewport center to a corner of the unit square.
const VIEWPORT_HALF_DIAGONAL: f32 = 0.7071;

/// Anything that can project world points into normalized viewport space.
///
/// `x` and `y` are in [0, 1] when on screen, `z` is the signed depth along
/// the view axis (positive in front of the camera). `None` means the point
/// could not be projected.
pub trait ViewportProjector {
    fn world_to_viewport(&self, point: Vec3) -> Option<Vec3>;
}

/// On-screen rules applied to candidate anchors.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisibilityFilter {
    /// Margin trimmed from every viewport edge.
    pub padding: f32,
    pub require_on_screen: bool,
    pub require_in_front: bool,
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self {
            padding: DEFAULT_VIEWPORT_PADDING,
            require_on_screen: true,
            require_in_front: true,
        }
    }
}

impl VisibilityFilter {
    /// Whether `point` passes the viewport test. No camera always passes.
    pub fn is_visible(&self, point: Vec3, camera: Option<&dyn ViewportProjector>) -> bool {
        let Some(camera) = camera else {
            return true;
        };
        let Some(vp) = camera.world_to_viewport(point) else {
            return false;
        };

        if self.require_in_front && vp.z <= 0.0 {
            return false;
        }

        let padding = self.padding.clamp(0.0, MAX_VIEWPORT_PADDING);
        let min = padding;
        let max = 1.0 - padding;
        vp.x >= min && vp.x <= max && vp.y >= min && vp.y <= max
    }
}

/// 1.0 at the viewport center, falling to 0.0 at the corners.
///
/// Without a camera every point scores 0.
pub fn center_score(point: Vec3, camera: Option<&dyn ViewportProjector>) -> f32 {
    let Some(vp) = camera.and_then(|c| c.world_to_viewport(point)) else {
        return 0.0;
    };
    let offset = Vec2::new(vp.x - 0.5, vp.y - 0.5);
    (1.0 - offset.length() / VIEWPORT_HALF_DIAGONAL).clamp(0.0, 1.0)
}
