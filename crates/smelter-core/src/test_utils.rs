//! Shared test helpers for unit tests, integration tests and downstream
//! crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::building::BuildingConfig;
use crate::factory::{BlockFactory, CountingBlockFactory, PlainBlockFactory};
use crate::fixed::{Seconds, seconds};
use crate::id::{BlockId, BuildingId, StorageId};
use crate::log::RingLog;
use crate::recipe::ResourceRecipe;
use crate::resource::ResourceType;
use crate::world::World;

// ===========================================================================
// Recipes
// ===========================================================================

/// One ore into one ingot.
pub fn smelt_recipe(time: f64) -> ResourceRecipe {
    ResourceRecipe::new(vec![ResourceType::Ore], vec![ResourceType::Ingot], seconds(time))
}

/// Ore and ingot into alloy.
pub fn alloy_recipe(time: f64) -> ResourceRecipe {
    ResourceRecipe::new(
        vec![ResourceType::Ore, ResourceType::Ingot],
        vec![ResourceType::Alloy],
        seconds(time),
    )
}

/// Ore out of nothing.
pub fn mine_recipe(time: f64) -> ResourceRecipe {
    ResourceRecipe::new(Vec::new(), vec![ResourceType::Ore], seconds(time))
}

// ===========================================================================
// Worlds
// ===========================================================================

/// A world logging into a shared ring buffer.
pub fn logged_world() -> (World, RingLog) {
    let log = RingLog::default();
    let world = World::new(Box::new(log.clone()), Box::new(PlainBlockFactory));
    (world, log)
}

/// A world whose factory counts every block it creates.
pub fn counted_world() -> (World, RingLog, CountingBlockFactory) {
    let log = RingLog::default();
    let factory = CountingBlockFactory::new();
    let boxed: Box<dyn BlockFactory> = Box::new(factory.clone());
    let world = World::new(Box::new(log.clone()), boxed);
    (world, log, factory)
}

/// Spawn a building whose dispatch takes as long as a storage transfer.
pub fn spawn_smelter(world: &mut World, recipe: ResourceRecipe, capacity: u32) -> BuildingId {
    let config = BuildingConfig::new("Smelter", recipe, capacity).with_dispatch_duration(seconds(0.5));
    world.spawn_building(config)
}

/// Fill a storage with `count` new units of `resource`.
pub fn stock(world: &mut World, storage: StorageId, resource: ResourceType, count: usize) -> Vec<BlockId> {
    (0..count)
        .map(|_| {
            world
                .spawn_block_into(storage, resource)
                .expect("storage accepts stock")
        })
        .collect()
}

pub fn input_of(world: &World, building: BuildingId) -> StorageId {
    world
        .building(building)
        .expect("building exists")
        .input_storage()
}

pub fn output_of(world: &World, building: BuildingId) -> StorageId {
    world
        .building(building)
        .expect("building exists")
        .output_storage()
}

/// Run `frames` updates of `dt` seconds each.
pub fn run_frames(world: &mut World, frames: usize, dt: f64) {
    let dt: Seconds = seconds(dt);
    for _ in 0..frames {
        world.update(dt);
    }
}
