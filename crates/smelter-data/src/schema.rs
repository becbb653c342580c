//! Serde data file structs for level content.
//!
//! These structs define the on-disk format for recipes, building templates
//! and levels. Durations are plain seconds; the loader converts them into
//! fixed-point time once.

use serde::Deserialize;
use smelter_core::resource::ResourceType;
use smelter_core::storage::STORAGE_TRANSFER_SECONDS;
use smelter_core::building::BUILDING_DISPATCH_SECONDS;

// ===========================================================================
// Recipes
// ===========================================================================

/// A named recipe. Empty `input` makes a producer that needs nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub input: Vec<ResourceType>,
    #[serde(default)]
    pub output: Vec<ResourceType>,
    /// Seconds per cycle.
    pub time: f64,
}

// ===========================================================================
// Building templates
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub name: String,
    pub recipe: String,
    #[serde(default)]
    pub warehouses: WarehouseData,
    /// Seconds to push one produced unit into the output warehouse.
    #[serde(default = "default_dispatch_time")]
    pub dispatch_time: f64,
}

fn default_dispatch_time() -> f64 {
    BUILDING_DISPATCH_SECONDS
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseData {
    #[serde(default = "default_capacity")]
    pub input_capacity: u32,
    #[serde(default = "default_capacity")]
    pub output_capacity: u32,
    /// Seconds for a warehouse to hand one unit over.
    #[serde(default = "default_transfer_time")]
    pub transfer_time: f64,
}

fn default_capacity() -> u32 {
    10
}

fn default_transfer_time() -> f64 {
    STORAGE_TRANSFER_SECONDS
}

impl Default for WarehouseData {
    fn default() -> Self {
        Self {
            input_capacity: default_capacity(),
            output_capacity: default_capacity(),
            transfer_time: default_transfer_time(),
        }
    }
}

// ===========================================================================
// Levels
// ===========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub buildings: Vec<PlacedBuildingData>,
    #[serde(default)]
    pub couriers: Vec<CourierData>,
}

/// A building template spawned at a placeholder.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedBuildingData {
    pub template: String,
    /// Instance name; defaults to the template name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation about the vertical axis.
    #[serde(default)]
    pub yaw_degrees: f32,
    /// Units placed in the input warehouse before the building starts.
    #[serde(default)]
    pub stock: Vec<StockData>,
    #[serde(default = "default_true")]
    pub start: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StockData {
    pub resource: ResourceType,
    pub count: u32,
}

/// A player-style inventory that shuttles units between two buildings.
#[derive(Debug, Clone, Deserialize)]
pub struct CourierData {
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub stock: Vec<StockData>,
    /// Building whose output warehouse the courier empties.
    #[serde(default)]
    pub pickup: Option<String>,
    /// Building whose input warehouse the courier fills.
    #[serde(default)]
    pub dropoff: Option<String>,
}
