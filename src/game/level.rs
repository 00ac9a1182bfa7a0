// game/level.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const LEVELS_JSON: &str = include_str!("../../assets/levels.json");

/// Bounce pads share one footprint; only their launch power varies
pub const BOUNCE_PAD_SIZE: [f32; 2] = [64.0, 16.0];

/// Identifier of a level, e.g. "1-2"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(pub String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        LevelId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a collectible within its level's collectible list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectibleId(pub usize);

impl fmt::Display for CollectibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Visual category of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Ground,
    Normal,
    Color1,
    Color2,
    Color3,
    Color4,
    Color5,
    Color6,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: PlatformKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    Static,
    /// Sweeps left and right around its anchor
    #[serde(rename = "moving_h")]
    MovingHorizontal,
    /// Sweeps up and down around its anchor
    #[serde(rename = "moving_v")]
    MovingVertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDesc {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: ObstacleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BouncePadDesc {
    pub x: f32,
    pub y: f32,
    /// Multiplier on the base bounce impulse
    pub power: f32,
}

/// Static description of one level.
///
/// Coordinates are stage pixels on an 800x600 board with y pointing down,
/// so negative vertical impulses launch upwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: LevelId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: u8,
    /// Seconds available to finish the level
    pub time_limit: f32,
    /// Level score needed for one, two and three stars
    pub star_thresholds: [u32; 3],
    pub platforms: Vec<PlatformDesc>,
    pub collectibles: Vec<[f32; 2]>,
    pub start: [f32; 2],
    pub end: [f32; 2],
    #[serde(default)]
    pub obstacles: Vec<ObstacleDesc>,
    #[serde(default)]
    pub bounce_pads: Vec<BouncePadDesc>,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub music: String,
    /// Overrides the global per-stage jump impulses for this level
    #[serde(default)]
    pub jump_forces: Option<Vec<f32>>,
}

impl LevelDefinition {
    pub fn total_collectibles(&self) -> usize {
        self.collectibles.len()
    }

    fn validate(&self) -> Result<(), String> {
        if self.collectibles.is_empty() {
            return Err(format!("Level {} has no collectibles", self.id));
        }
        if self.time_limit <= 0.0 {
            return Err(format!(
                "Level {} has a non-positive time limit ({})",
                self.id, self.time_limit
            ));
        }
        let [one, two, three] = self.star_thresholds;
        if !(one < two && two < three) {
            return Err(format!(
                "Level {} star thresholds must be ascending, got {:?}",
                self.id, self.star_thresholds
            ));
        }
        if let Some(forces) = &self.jump_forces {
            if forces.is_empty() {
                return Err(format!("Level {} has an empty jump_forces override", self.id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogJson {
    levels: Vec<LevelDefinition>,
}

/// Ordered, read-only set of levels looked up by id
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelDefinition>,
}

impl LevelCatalog {
    /// Load the catalog from the embedded level data
    pub fn load() -> Result<Self, String> {
        Self::from_json(LEVELS_JSON)
    }

    /// Parse and validate a catalog. Level order is file order.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let parsed: CatalogJson = serde_json::from_str(json)
            .map_err(|e| format!("Level data parse error at line {}: {}", e.line(), e))?;
        Self::from_levels(parsed.levels)
    }

    pub fn from_levels(levels: Vec<LevelDefinition>) -> Result<Self, String> {
        if levels.is_empty() {
            return Err("No levels defined".to_string());
        }

        let mut seen = HashSet::new();
        for level in &levels {
            if !seen.insert(level.id.clone()) {
                return Err(format!("Duplicate level id {}", level.id));
            }
            level.validate()?;
        }

        Ok(LevelCatalog { levels })
    }

    /// Look up a level by id
    pub fn get(&self, id: &LevelId) -> Option<&LevelDefinition> {
        self.levels.iter().find(|level| &level.id == id)
    }

    /// The level after `id` in catalog order, if any
    pub fn next_after(&self, id: &LevelId) -> Option<&LevelId> {
        let index = self.levels.iter().position(|level| &level.id == id)?;
        self.levels.get(index + 1).map(|level| &level.id)
    }

    pub fn first(&self) -> &LevelDefinition {
        // from_levels rejects an empty list
        &self.levels[0]
    }

    pub fn is_first(&self, id: &LevelId) -> bool {
        &self.first().id == id
    }

    pub fn ids(&self) -> impl Iterator<Item = &LevelId> {
        self.levels.iter().map(|level| &level.id)
    }

    pub fn by_index(&self, index: usize) -> Option<&LevelDefinition> {
        self.levels.get(index)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }
}
