//! Courier behaviour: a player-style inventory that unloads into one
//! building's input and loads from another building's output.

use glam::Vec3;
use smelter_core::error::SimError;
use smelter_core::id::StorageId;
use smelter_core::placement::Placement;
use smelter_core::world::World;
use smelter_data::Courier;

/// Where a courier stands relative to the warehouse it works with.
const STAND_OFF: Vec3 = Vec3::new(0.0, 0.0, 1.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierAction {
    /// The previous transfer is still running.
    Busy,
    Delivered,
    Collected,
    Idle,
}

/// One interaction attempt: deliver first, then collect.
pub fn step_courier(world: &mut World, courier: &Courier) -> Result<CourierAction, SimError> {
    let busy = world
        .storage(courier.inventory)
        .ok_or(SimError::UnknownStorage(courier.inventory))?
        .has_transfer();
    if busy {
        return Ok(CourierAction::Busy);
    }

    if let Some(dropoff) = courier.dropoff
        && interact(world, courier.inventory, dropoff)?
    {
        tracing::debug!(courier = %courier.name, "delivered");
        return Ok(CourierAction::Delivered);
    }
    if let Some(pickup) = courier.pickup
        && interact(world, courier.inventory, pickup)?
    {
        tracing::debug!(courier = %courier.name, "collected");
        return Ok(CourierAction::Collected);
    }
    Ok(CourierAction::Idle)
}

/// Walk up to `warehouse` and try one transfer with it.
fn interact(world: &mut World, inventory: StorageId, warehouse: StorageId) -> Result<bool, SimError> {
    let target = world
        .storage(warehouse)
        .ok_or(SimError::UnknownStorage(warehouse))?
        .placement();
    let stand = target.transform(&Placement::at(STAND_OFF));
    world.move_storage(inventory, stand)?;
    world.try_transfer_first_allowed(inventory, warehouse)
}
