//! Level pipeline: recipes, then building templates, then the placed level.

use std::collections::HashMap;
use std::path::Path;

use glam::{Quat, Vec3};
use smelter_core::building::BuildingConfig;
use smelter_core::error::SimError;
use smelter_core::factory::{BlockFactory, PlainBlockFactory};
use smelter_core::id::{BuildingId, StorageId};
use smelter_core::log::{GameLog, TracingLog};
use smelter_core::placement::Placement;
use smelter_core::recipe::ResourceRecipe;
use smelter_core::storage::StorageConfig;
use smelter_core::world::World;

use crate::loader::{
    DataLoadError, check_duplicate, deserialize_file, deserialize_list, duration_from, require_data_file,
    resolve_name,
};
use crate::schema::{BuildingData, LevelData, RecipeData, StockData};

/// A courier inventory and the warehouses it shuttles between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Courier {
    pub name: String,
    pub inventory: StorageId,
    /// Output warehouse the courier collects from.
    pub pickup: Option<StorageId>,
    /// Input warehouse the courier delivers to.
    pub dropoff: Option<StorageId>,
}

/// A populated world plus the names the level gave its entities.
#[derive(Debug)]
pub struct LoadedLevel {
    pub world: World,
    pub buildings: HashMap<String, BuildingId>,
    pub couriers: Vec<Courier>,
}

/// Load a level directory into a world that logs through `tracing`.
pub fn load_level(dir: &Path) -> Result<LoadedLevel, DataLoadError> {
    load_level_with(dir, Box::new(TracingLog), Box::new(PlainBlockFactory))
}

/// Load a level directory with a caller-supplied game log and block factory.
pub fn load_level_with(
    dir: &Path,
    log: Box<dyn GameLog>,
    factory: Box<dyn BlockFactory>,
) -> Result<LoadedLevel, DataLoadError> {
    let recipes = load_recipes(dir)?;
    let templates = load_templates(dir, &recipes)?;

    let level_path = require_data_file(dir, "level")?;
    let level: LevelData = deserialize_file(&level_path)?;
    let mut world = World::new(log, factory);
    let populate = |source: SimError| DataLoadError::Populate {
        file: level_path.clone(),
        source,
    };

    let mut buildings = HashMap::new();
    let mut to_start = Vec::new();
    for placed in &level.buildings {
        let template = resolve_name(&templates, &placed.template, &level_path, "building")?;
        let name = placed.name.clone().unwrap_or_else(|| placed.template.clone());
        check_duplicate(&buildings, &name, &level_path)?;

        let rotation = Quat::from_rotation_y(placed.yaw_degrees.to_radians());
        let mut config = template.clone().at(Placement::new(Vec3::from(placed.position), rotation));
        config.name = name.clone();
        let id = world.spawn_building(config);

        let input = world
            .building(id)
            .map(|b| b.input_storage())
            .ok_or_else(|| populate(SimError::UnknownBuilding(id)))?;
        stock_storage(&mut world, input, &placed.stock).map_err(populate)?;
        if placed.start {
            to_start.push(id);
        }
        buildings.insert(name, id);
    }

    // Buildings start once every warehouse is stocked.
    for id in to_start {
        world.start_building(id).map_err(populate)?;
    }

    let mut couriers = Vec::with_capacity(level.couriers.len());
    for data in &level.couriers {
        let config = StorageConfig::new(data.capacity).at(Placement::at(Vec3::from(data.position)));
        let inventory = world.spawn_inventory(config);
        stock_storage(&mut world, inventory, &data.stock).map_err(populate)?;

        let warehouse_of = |name: &Option<String>, output: bool| -> Result<Option<StorageId>, DataLoadError> {
            let Some(name) = name else {
                return Ok(None);
            };
            let id = *resolve_name(&buildings, name, &level_path, "building")?;
            Ok(world
                .building(id)
                .map(|b| if output { b.output_storage() } else { b.input_storage() }))
        };
        let pickup = warehouse_of(&data.pickup, true)?;
        let dropoff = warehouse_of(&data.dropoff, false)?;
        couriers.push(Courier {
            name: data.name.clone(),
            inventory,
            pickup,
            dropoff,
        });
    }

    tracing::info!(
        dir = %dir.display(),
        buildings = buildings.len(),
        couriers = couriers.len(),
        "level loaded"
    );
    Ok(LoadedLevel {
        world,
        buildings,
        couriers,
    })
}

fn stock_storage(
    world: &mut World,
    storage: StorageId,
    stock: &[StockData],
) -> Result<(), SimError> {
    for entry in stock {
        for _ in 0..entry.count {
            world.spawn_block_into(storage, entry.resource)?;
        }
    }
    Ok(())
}

/// Read `recipes.*` into recipes keyed by name.
pub fn load_recipes(dir: &Path) -> Result<HashMap<String, ResourceRecipe>, DataLoadError> {
    let path = require_data_file(dir, "recipes")?;
    let data: Vec<RecipeData> = deserialize_list(&path, "recipes")?;
    let mut recipes = HashMap::with_capacity(data.len());
    for recipe in data {
        check_duplicate(&recipes, &recipe.name, &path)?;
        let time = duration_from(recipe.time, &path, &recipe.name, "time")?;
        recipes.insert(recipe.name, ResourceRecipe::new(recipe.input, recipe.output, time));
    }
    Ok(recipes)
}

/// Read `buildings.*` into building templates keyed by name. Templates sit at
/// the origin; the level places them.
pub fn load_templates(
    dir: &Path,
    recipes: &HashMap<String, ResourceRecipe>,
) -> Result<HashMap<String, BuildingConfig>, DataLoadError> {
    let path = require_data_file(dir, "buildings")?;
    let data: Vec<BuildingData> = deserialize_list(&path, "buildings")?;
    let mut templates = HashMap::with_capacity(data.len());
    for building in data {
        check_duplicate(&templates, &building.name, &path)?;
        let template = template_from(&building, recipes, &path)?;
        templates.insert(building.name, template);
    }
    Ok(templates)
}

fn template_from(
    data: &BuildingData,
    recipes: &HashMap<String, ResourceRecipe>,
    path: &Path,
) -> Result<BuildingConfig, DataLoadError> {
    let recipe = resolve_name(recipes, &data.recipe, path, "recipe")?.clone();
    let dispatch = duration_from(data.dispatch_time, path, &data.name, "dispatch_time")?;
    let transfer = duration_from(data.warehouses.transfer_time, path, &data.name, "transfer_time")?;

    let mut config = BuildingConfig::new(data.name.clone(), recipe, data.warehouses.input_capacity)
        .with_capacities(data.warehouses.input_capacity, data.warehouses.output_capacity)
        .with_dispatch_duration(dispatch);
    config.input_warehouse = config.input_warehouse.with_transfer_duration(transfer);
    config.output_warehouse = config.output_warehouse.with_transfer_duration(transfer);
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use smelter_core::fixed::seconds;
    use smelter_core::resource::ResourceType;
    use std::fs;
    use std::path::PathBuf;

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("smelter_level_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_recipes(dir: &Path) {
        fs::write(
            dir.join("recipes.ron"),
            r#"[
                (name: "smelt", input: [ore], output: [ingot], time: 2.0),
                (name: "mine", output: [ore], time: 1.0),
            ]"#,
        )
        .unwrap();
    }

    #[test]
    fn templates_resolve_recipes_and_durations() {
        let dir = make_test_dir("templates");
        write_recipes(&dir);
        fs::write(
            dir.join("buildings.json"),
            r#"[{"name": "Furnace", "recipe": "smelt", "dispatch_time": 0.5,
                 "warehouses": {"input_capacity": 3, "output_capacity": 2, "transfer_time": 0.25}}]"#,
        )
        .unwrap();

        let recipes = load_recipes(&dir).unwrap();
        let templates = load_templates(&dir, &recipes).unwrap();
        let furnace = &templates["Furnace"];
        assert_eq!(furnace.recipe.input, vec![ResourceType::Ore]);
        assert_eq!(furnace.dispatch_duration, seconds(0.5));
        assert_eq!(furnace.input_warehouse.capacity, 3);
        assert_eq!(furnace.output_warehouse.capacity, 2);
        assert_eq!(furnace.output_warehouse.transfer_duration, seconds(0.25));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_recipe_is_unresolved_ref() {
        let dir = make_test_dir("unresolved");
        write_recipes(&dir);
        fs::write(dir.join("buildings.ron"), r#"[(name: "Forge", recipe: "forge")]"#).unwrap();
        let recipes = load_recipes(&dir).unwrap();
        let err = load_templates(&dir, &recipes).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnresolvedRef {
                expected_kind: "recipe",
                ..
            }
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn duplicate_recipe_names_are_rejected() {
        let dir = make_test_dir("dup");
        fs::write(
            dir.join("recipes.ron"),
            r#"[(name: "smelt", time: 1.0), (name: "smelt", time: 2.0)]"#,
        )
        .unwrap();
        assert!(matches!(load_recipes(&dir), Err(DataLoadError::DuplicateName { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
