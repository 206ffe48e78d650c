//! Arena layout data and RON loading.

use bevy::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use super::error::DataLoadError;
use super::platforms::PlatformPath;

/// An axis-aligned box of static geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxDef {
    pub center: (f32, f32, f32),
    pub size: (f32, f32, f32),
}

impl BoxDef {
    fn new(center: (f32, f32, f32), size: (f32, f32, f32)) -> Self {
        Self { center, size }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.center.0, self.center.1, self.center.2)
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(self.size.0, self.size.1, self.size.2)
    }
}

/// A grapple anchor floating in the arena.
#[derive(Debug, Clone, Deserialize)]
pub struct GrapplePointDef {
    pub position: (f32, f32, f32),
    /// Trigger radius picked up by the broad phase
    #[serde(default = "default_grapple_radius")]
    pub radius: f32,
}

fn default_grapple_radius() -> f32 {
    0.4
}

/// A loose cube the item pull can grab.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDef {
    pub position: (f32, f32, f32),
    /// Edge length of the cube
    #[serde(default = "default_item_size")]
    pub size: f32,
}

fn default_item_size() -> f32 {
    0.5
}

fn tuple_to_vec3(t: (f32, f32, f32)) -> Vec3 {
    Vec3::new(t.0, t.1, t.2)
}

/// A platform that rides its path while the player stands on it.
#[derive(Debug, Clone, Deserialize)]
pub struct MovingPlatformDef {
    pub size: (f32, f32, f32),
    /// Waypoints for the platform center; it starts at the first one.
    pub path: Vec<(f32, f32, f32)>,
    #[serde(default = "default_platform_speed")]
    pub speed: f32,
    /// How far it keeps going after the player steps off
    #[serde(default = "default_extra_distance")]
    pub extra_distance: f32,
    #[serde(default)]
    pub looped: bool,
}

fn default_platform_speed() -> f32 {
    2.0
}

fn default_extra_distance() -> f32 {
    3.0
}

impl MovingPlatformDef {
    pub fn size(&self) -> Vec3 {
        tuple_to_vec3(self.size)
    }

    pub fn waypoints(&self) -> Vec<Vec3> {
        self.path.iter().copied().map(tuple_to_vec3).collect()
    }
}

/// A ledge that drops shortly after the player lands on it.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakingPlatformDef {
    pub center: (f32, f32, f32),
    pub size: (f32, f32, f32),
    #[serde(default = "default_break_delay")]
    pub break_delay: f32,
    #[serde(default = "default_despawn_after")]
    pub despawn_after: f32,
}

fn default_break_delay() -> f32 {
    0.15
}

fn default_despawn_after() -> f32 {
    2.0
}

impl BreakingPlatformDef {
    pub fn center(&self) -> Vec3 {
        tuple_to_vec3(self.center)
    }

    pub fn size(&self) -> Vec3 {
        tuple_to_vec3(self.size)
    }
}

fn default_fall_limit() -> f32 {
    -20.0
}

/// Everything needed to build the demo arena.
#[derive(Resource, Debug, Clone, Deserialize)]
pub struct ArenaLayout {
    /// Ground plane extent on X and Z
    pub ground_size: (f32, f32),
    #[serde(default)]
    pub walls: Vec<BoxDef>,
    #[serde(default)]
    pub platforms: Vec<BoxDef>,
    #[serde(default)]
    pub grapple_points: Vec<GrapplePointDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub moving_platforms: Vec<MovingPlatformDef>,
    #[serde(default)]
    pub breaking_platforms: Vec<BreakingPlatformDef>,
    pub player_start: (f32, f32, f32),
    /// Falling below this height sends the player back to safe ground
    #[serde(default = "default_fall_limit")]
    pub fall_limit: f32,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            ground_size: (60.0, 60.0),
            walls: vec![
                BoxDef::new((0.0, 2.0, -12.0), (10.0, 4.0, 1.0)),
                BoxDef::new((-9.0, 1.5, 2.0), (1.0, 3.0, 8.0)),
            ],
            platforms: vec![
                BoxDef::new((0.0, 6.0, -20.0), (6.0, 0.5, 6.0)),
                BoxDef::new((12.0, 9.0, -6.0), (4.0, 0.5, 4.0)),
                BoxDef::new((-14.0, 4.0, -10.0), (5.0, 0.5, 5.0)),
            ],
            grapple_points: vec![
                GrapplePointDef { position: (0.0, 9.0, -18.0), radius: 0.4 },
                GrapplePointDef { position: (12.0, 12.0, -6.0), radius: 0.4 },
                GrapplePointDef { position: (-14.0, 7.5, -10.0), radius: 0.4 },
                // Behind the first wall, only reachable from the side.
                GrapplePointDef { position: (0.0, 3.0, -16.0), radius: 0.4 },
            ],
            items: vec![
                ItemDef { position: (4.0, 0.5, -4.0), size: 0.5 },
                ItemDef { position: (-4.0, 0.5, -6.0), size: 0.5 },
                ItemDef { position: (0.0, 6.5, -20.0), size: 0.5 },
            ],
            moving_platforms: vec![MovingPlatformDef {
                size: (3.0, 0.4, 3.0),
                path: vec![(8.0, 0.6, 6.0), (8.0, 4.0, -2.0), (14.0, 8.0, -2.0)],
                speed: 2.0,
                extra_distance: 3.0,
                looped: false,
            }],
            breaking_platforms: vec![
                BreakingPlatformDef {
                    center: (-6.0, 3.0, -16.0),
                    size: (2.5, 0.4, 2.5),
                    break_delay: 0.15,
                    despawn_after: 2.0,
                },
                BreakingPlatformDef {
                    center: (-10.0, 3.5, -13.0),
                    size: (2.5, 0.4, 2.5),
                    break_delay: 0.15,
                    despawn_after: 2.0,
                },
            ],
            player_start: (0.0, 1.0, 4.0),
            fall_limit: -20.0,
        }
    }
}

impl ArenaLayout {
    pub const PATH: &'static str = "assets/data/arena.ron";

    pub fn player_start(&self) -> Vec3 {
        Vec3::new(self.player_start.0, self.player_start.1, self.player_start.2)
    }

    /// Parse and validate a RON document.
    pub fn from_ron(contents: &str, path: &str) -> Result<Self, DataLoadError> {
        let layout: Self = ron::from_str(contents).map_err(|e| DataLoadError::ParseError {
            path: path.to_string(),
            details: e.to_string(),
        })?;
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> Result<(), DataLoadError> {
        let boxes = [("wall", &self.walls), ("platform", &self.platforms)];
        for (what, defs) in boxes {
            if let Some(index) = defs.iter().position(|b| b.size().min_element() <= 0.0) {
                return Err(DataLoadError::InvalidSize { what, index });
            }
        }
        if let Some(index) = self.items.iter().position(|item| item.size <= 0.0) {
            return Err(DataLoadError::InvalidSize { what: "item", index });
        }
        if let Some(index) = self.grapple_points.iter().position(|point| point.radius <= 0.0) {
            return Err(DataLoadError::InvalidSize { what: "grapple point", index });
        }
        for (index, platform) in self.moving_platforms.iter().enumerate() {
            if platform.size().min_element() <= 0.0 {
                return Err(DataLoadError::InvalidSize { what: "moving platform", index });
            }
            if PlatformPath::new(platform.waypoints()).is_none() || platform.speed <= 0.0 {
                return Err(DataLoadError::InvalidPath { index });
            }
        }
        if let Some(index) = self
            .breaking_platforms
            .iter()
            .position(|p| p.size().min_element() <= 0.0)
        {
            return Err(DataLoadError::InvalidSize { what: "breaking platform", index });
        }
        Ok(())
    }

    /// Read and parse an arena file.
    pub fn read(path: &Path) -> Result<Self, DataLoadError> {
        let display = path.display().to_string();
        if !path.exists() {
            return Err(DataLoadError::FileNotFound(display));
        }
        let contents = fs::read_to_string(path).map_err(|e| DataLoadError::ReadError {
            path: display.clone(),
            details: e.to_string(),
        })?;
        Self::from_ron(&contents, &display)
    }

    /// Load from [`Self::PATH`], falling back to the built-in arena.
    pub fn load() -> Self {
        match Self::read(Path::new(Self::PATH)) {
            Ok(layout) => {
                info!("Loaded arena layout from {}", Self::PATH);
                layout
            }
            Err(DataLoadError::FileNotFound(path)) => {
                warn!("Arena layout {} not found. Using built-in arena.", path);
                Self::default()
            }
            Err(e) => {
                error!("{}. Using built-in arena.", e);
                Self::default()
            }
        }
    }
}

/// System to load the arena layout at startup.
pub fn load_arena_layout(mut commands: Commands) {
    commands.insert_resource(ArenaLayout::load());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena_is_valid() {
        assert!(ArenaLayout::default().validate().is_ok());
    }

    #[test]
    fn test_shipped_arena_loads() {
        let layout = ArenaLayout::read(Path::new(ArenaLayout::PATH))
            .expect("shipped arena should load");
        let builtin = ArenaLayout::default();
        assert_eq!(layout.grapple_points.len(), builtin.grapple_points.len());
        assert_eq!(layout.items.len(), builtin.items.len());
        assert_eq!(layout.moving_platforms.len(), builtin.moving_platforms.len());
        assert_eq!(layout.breaking_platforms.len(), builtin.breaking_platforms.len());
        assert_eq!(layout.fall_limit, builtin.fall_limit);
    }

    #[test]
    fn test_parse_arena() {
        let ron = r#"(
            ground_size: (20.0, 20.0),
            walls: [(center: (0.0, 1.0, -5.0), size: (4.0, 2.0, 0.5))],
            grapple_points: [(position: (0.0, 6.0, -8.0))],
            items: [(position: (2.0, 0.5, 0.0), size: 0.3)],
            player_start: (0.0, 1.0, 0.0),
        )"#;
        let layout = ArenaLayout::from_ron(ron, "test").expect("arena should parse");

        assert_eq!(layout.walls.len(), 1);
        assert!(layout.platforms.is_empty());
        assert_eq!(layout.grapple_points[0].radius, 0.4, "radius should default");
        assert_eq!(layout.items[0].size, 0.3);
        assert_eq!(layout.player_start(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_rejects_flat_wall() {
        let ron = r#"(
            ground_size: (20.0, 20.0),
            walls: [(center: (0.0, 1.0, 0.0), size: (4.0, 0.0, 1.0))],
            player_start: (0.0, 1.0, 0.0),
        )"#;
        let err = ArenaLayout::from_ron(ron, "test").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidSize { what: "wall", index: 0 }));
    }

    #[test]
    fn test_parse_platforms() {
        let ron = r#"(
            ground_size: (20.0, 20.0),
            moving_platforms: [(size: (2.0, 0.4, 2.0), path: [(0.0, 1.0, 0.0), (0.0, 1.0, -6.0)])],
            breaking_platforms: [(center: (3.0, 2.0, 0.0), size: (2.0, 0.4, 2.0), break_delay: 0.3)],
            player_start: (0.0, 1.0, 0.0),
        )"#;
        let layout = ArenaLayout::from_ron(ron, "test").expect("arena should parse");

        let mover = &layout.moving_platforms[0];
        assert_eq!(mover.speed, 2.0, "speed should default");
        assert_eq!(mover.extra_distance, 3.0);
        assert!(!mover.looped);
        assert_eq!(layout.breaking_platforms[0].break_delay, 0.3);
        assert_eq!(layout.breaking_platforms[0].despawn_after, 2.0);
        assert_eq!(layout.fall_limit, -20.0);
    }

    #[test]
    fn test_rejects_single_point_path() {
        let ron = r#"(
            ground_size: (20.0, 20.0),
            moving_platforms: [(size: (2.0, 0.4, 2.0), path: [(0.0, 1.0, 0.0)])],
            player_start: (0.0, 1.0, 0.0),
        )"#;
        let err = ArenaLayout::from_ron(ron, "test").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidPath { index: 0 }));
    }

    #[test]
    fn test_missing_file_reports_not_found() {
        let err = ArenaLayout::read(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound(_)));
    }
}
