//! Ability tuning loaded from `assets/data/abilities.ron`.
//!
//! Allows tweaking ranges, timings and body overrides without recompilation.
//! Every value has a compiled-in default so a missing or broken file never
//! stops the game.

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::error::ConfigError;
use super::query::{layers, CollisionMask};
use super::visibility::{VisibilityFilter, MAX_VIEWPORT_PADDING};
use crate::core::EaseCurve;

/// Smallest cooldown ever applied once a tether starts.
pub const MIN_COOLDOWN: f32 = 0.01;

/// Floor for the pull duration when normalizing elapsed time.
pub const MIN_PULL_DURATION: f32 = 0.01;

/// How long an ability stays unavailable after a tether begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum CooldownMode {
    /// Cooldown equals the pull duration.
    #[default]
    SameAsDuration,
    /// Cooldown is `cooldown_seconds`.
    Fixed,
}

/// Where the forward component of the exit impulse points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum ExitDirection {
    /// Camera forward flattened onto the ground plane.
    #[default]
    CameraPlanar,
    /// The actor's own forward.
    ActorForward,
}

/// Impulse applied to the held body when a tether arrives.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExitImpulse {
    pub up: f32,
    pub forward: f32,
    #[serde(default)]
    pub direction: ExitDirection,
}

/// Physics overrides written onto the held body for the tether's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeldBodyOverrides {
    pub linear_damping: f32,
    pub disable_gravity: bool,
    pub make_kinematic: bool,
    pub freeze_rotation: bool,
}

impl Default for HeldBodyOverrides {
    fn default() -> Self {
        Self {
            linear_damping: 0.0,
            disable_gravity: true,
            make_kinematic: false,
            freeze_rotation: false,
        }
    }
}

/// Broad-phase, line-of-sight and viewport rules for finding a target.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Radius of the broad-phase overlap around the query origin.
    pub query_radius: f32,
    /// Candidates beyond this distance are rejected.
    pub max_distance: f32,
    /// Layers holding target colliders.
    pub target_mask: CollisionMask,
    /// Layers that block line of sight.
    pub obstruction_mask: CollisionMask,
    /// Radius of the line-of-sight sweep.
    pub line_of_sight_radius: f32,
    pub visibility: VisibilityFilter,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            query_radius: 18.0,
            max_distance: 18.0,
            target_mask: CollisionMask::ALL,
            obstruction_mask: CollisionMask::ALL,
            line_of_sight_radius: 0.08,
            visibility: VisibilityFilter::default(),
        }
    }
}

/// Immutable parameters for one ability instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AbilityConfig {
    #[serde(default)]
    pub targeting: TargetingConfig,
    /// Seconds from tether start to arrival.
    pub pull_duration: f32,
    /// `None` moves linearly.
    #[serde(default)]
    pub ease: Option<EaseCurve>,
    pub stop_when_close: bool,
    pub stop_distance: f32,
    #[serde(default)]
    pub cooldown_mode: CooldownMode,
    /// Used only with [`CooldownMode::Fixed`].
    pub cooldown_seconds: f32,
    #[serde(default)]
    pub held_body: HeldBodyOverrides,
    /// Applied on arrival only.
    #[serde(default)]
    pub exit_impulse: Option<ExitImpulse>,
    /// Move the held body onto the anchor and stop it dead on arrival.
    #[serde(default)]
    pub snap_on_arrival: bool,
    /// Disable the actor's movement and jump controllers while tethered.
    #[serde(default)]
    pub lock_actor_controls: bool,
    /// Query origin height above the actor's body position.
    pub origin_height: f32,
    /// Catch point height above the actor's body position (pull-to-actor only).
    #[serde(default)]
    pub catch_height: f32,
}

impl AbilityConfig {
    /// Grapple-to-point defaults.
    pub fn grapple() -> Self {
        Self {
            targeting: TargetingConfig {
                query_radius: 18.0,
                max_distance: 18.0,
                target_mask: layers::GRAPPLE_POINT,
                obstruction_mask: layers::WORLD.union(layers::PULLABLE),
                ..default()
            },
            pull_duration: 0.35,
            ease: Some(EaseCurve::EaseInOut),
            stop_when_close: true,
            stop_distance: 1.1,
            cooldown_mode: CooldownMode::SameAsDuration,
            cooldown_seconds: 0.35,
            held_body: HeldBodyOverrides::default(),
            exit_impulse: Some(ExitImpulse {
                up: 4.5,
                forward: 6.0,
                direction: ExitDirection::CameraPlanar,
            }),
            snap_on_arrival: false,
            lock_actor_controls: true,
            origin_height: 1.2,
            catch_height: 0.0,
        }
    }

    /// Pull-item-to-actor defaults.
    pub fn item_pull() -> Self {
        Self {
            targeting: TargetingConfig {
                query_radius: 8.0,
                max_distance: 12.0,
                target_mask: layers::PULLABLE,
                obstruction_mask: layers::WORLD.union(layers::PULLABLE),
                ..default()
            },
            pull_duration: 0.25,
            ease: Some(EaseCurve::EaseInOut),
            stop_when_close: true,
            stop_distance: 0.35,
            cooldown_mode: CooldownMode::SameAsDuration,
            cooldown_seconds: 0.25,
            held_body: HeldBodyOverrides {
                linear_damping: 0.0,
                disable_gravity: true,
                make_kinematic: true,
                freeze_rotation: true,
            },
            exit_impulse: None,
            snap_on_arrival: true,
            lock_actor_controls: false,
            origin_height: 1.2,
            catch_height: 1.2,
        }
    }

    /// Cooldown started when a tether begins.
    pub fn cooldown_duration(&self) -> f32 {
        let seconds = match self.cooldown_mode {
            CooldownMode::SameAsDuration => self.pull_duration,
            CooldownMode::Fixed => self.cooldown_seconds,
        };
        seconds.max(MIN_COOLDOWN)
    }

    /// Normalized tether time after `elapsed` seconds, in [0, 1].
    pub fn normalized_time(&self, elapsed: f32) -> f32 {
        (elapsed / self.pull_duration.max(MIN_PULL_DURATION)).clamp(0.0, 1.0)
    }

    /// Progress along the path at normalized time `u`.
    pub fn progress(&self, u: f32) -> f32 {
        match &self.ease {
            Some(curve) => curve.evaluate(u),
            None => u,
        }
    }

    /// Check value ranges. `ability` names the offender in the error.
    pub fn validate(&self, ability: &'static str) -> Result<(), ConfigError> {
        let positive = [
            ("pull_duration", self.pull_duration),
            ("max_distance", self.targeting.max_distance),
            ("query_radius", self.targeting.query_radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { ability, field, value });
            }
        }

        let padding = self.targeting.visibility.padding;
        if !(0.0..=MAX_VIEWPORT_PADDING).contains(&padding) {
            return Err(ConfigError::PaddingOutOfRange {
                ability,
                value: padding,
                max: MAX_VIEWPORT_PADDING,
            });
        }

        if let Some(curve) = &self.ease {
            if !curve.is_well_formed() {
                return Err(ConfigError::MalformedCurve { ability });
            }
        }

        Ok(())
    }
}

/// Configuration for every ability the player carries.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
pub struct AbilitiesConfig {
    pub grapple: AbilityConfig,
    pub item_pull: AbilityConfig,
}

impl Default for AbilitiesConfig {
    fn default() -> Self {
        Self {
            grapple: AbilityConfig::grapple(),
            item_pull: AbilityConfig::item_pull(),
        }
    }
}

impl AbilitiesConfig {
    pub const PATH: &'static str = "assets/data/abilities.ron";

    /// Parse and validate a RON document.
    pub fn from_ron(contents: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: path.to_string(),
            details: e.to_string(),
        })?;
        config.grapple.validate("grapple")?;
        config.item_pull.validate("item_pull")?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: display.clone(),
            details: e.to_string(),
        })?;
        Self::from_ron(&contents, &display)
    }

    /// Load from [`Self::PATH`], falling back to defaults.
    pub fn load() -> Self {
        let path = Path::new(Self::PATH);
        if !path.exists() {
            warn!("Ability config {} not found. Using defaults.", Self::PATH);
            return Self::default();
        }
        match Self::read(path) {
            Ok(config) => {
                info!("Loaded ability config from {}", Self::PATH);
                config
            }
            Err(e) => {
                error!("{}. Using defaults.", e);
                Self::default()
            }
        }
    }
}

/// System to load ability config at startup.
pub fn load_abilities_config(mut commands: Commands) {
    commands.insert_resource(AbilitiesConfig::load());
}
