//! The world: owns every building, storage and block, and runs the
//! production control loop.
//!
//! # Architecture
//!
//! The `World` owns three arenas:
//! - [`Building`]s, each with its [`ResourceProcessing`](crate::processing::ResourceProcessing)
//!   and in-flight transfers
//! - [`Storage`]s: the input/output warehouses spawned with every building
//!   plus free-standing inventories
//! - [`ResourceBlock`]s: every unit in the level, wherever it currently is
//!
//! Relations between them are ids, resolved on every use. Moving units are
//! animated by [`TransferOperation`]s whose endpoints are [`Locator`]s the
//! world resolves each frame.
//!
//! # Frame pipeline
//!
//! Each [`World::update`] runs:
//! 1. **Buildings** -- advance processing, react to completion, then step
//!    the transfers the building started in earlier frames
//! 2. **Inventories** -- step each inventory's single transfer
//! 3. **Notifications** -- after every building and inventory, drain queued
//!    storage changes into the owning building's reaction
//! 4. **Events** -- deliver buffered events to listeners, bump the frame
//!
//! Operations issued during a frame are only stepped from the next frame on.

use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::building::{Building, BuildingConfig, BuildingPhase, RequestPick, StopReason};
use crate::error::SimError;
use crate::event::{Event, EventBus};
use crate::factory::{BlockFactory, PlainBlockFactory};
use crate::fixed::{Frames, Seconds};
use crate::id::{BlockId, BuildingId, StorageId, TransferPoint};
use crate::log::{GameLog, TracingLog};
use crate::placement::{Locator, LocatorResolver, Placement};
use crate::processing::ProcessingTick;
use crate::resource::{Holder, ResourceBlock, ResourceType, StoredBlock};
use crate::storage::{Storage, StorageConfig, StorageKind, StorageOwner, WarehouseRole};
use crate::transfer::{Delivery, TransferOperation};
use crate::transfer_point::{ResourceStorage, ResourceTransferPoint};

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub struct World {
    buildings: SlotMap<BuildingId, Building>,
    storages: SlotMap<StorageId, Storage>,
    blocks: SlotMap<BlockId, ResourceBlock>,

    /// Storages whose contents changed and whose owner has not reacted yet.
    notifications: VecDeque<StorageId>,
    /// Set while the notification queue is being drained.
    draining: bool,

    /// Typed event bus for simulation events.
    pub events: EventBus,

    log: Box<dyn GameLog>,
    factory: Box<dyn BlockFactory>,

    frame: Frames,
    time: Seconds,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("buildings", &self.buildings.len())
            .field("storages", &self.storages.len())
            .field("blocks", &self.blocks.len())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Box::new(TracingLog), Box::new(PlainBlockFactory))
    }
}

impl World {
    pub fn new(log: Box<dyn GameLog>, factory: Box<dyn BlockFactory>) -> Self {
        Self {
            buildings: SlotMap::with_key(),
            storages: SlotMap::with_key(),
            blocks: SlotMap::with_key(),
            notifications: VecDeque::new(),
            draining: false,
            events: EventBus::default(),
            log,
            factory,
            frame: 0,
            time: Seconds::ZERO,
        }
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// Spawn a building together with its input and output warehouses. The
    /// input warehouse accepts the recipe's inputs, the output warehouse its
    /// outputs. The building stays idle until [`World::start_building`].
    pub fn spawn_building(&mut self, config: BuildingConfig) -> BuildingId {
        let input = self.spawn_warehouse(
            WarehouseRole::Input,
            config.recipe.input.iter().copied(),
            config.warehouse_config(WarehouseRole::Input),
        );
        let output = self.spawn_warehouse(
            WarehouseRole::Output,
            config.recipe.output.iter().copied(),
            config.warehouse_config(WarehouseRole::Output),
        );
        let name = config.name.clone();
        let id = self
            .buildings
            .insert_with_key(|id| Building::new(id, config, input, output));
        for (storage, role) in [(input, WarehouseRole::Input), (output, WarehouseRole::Output)] {
            if let Some(storage) = self.storages.get_mut(storage) {
                storage.owner = Some(StorageOwner { building: id, role });
            }
        }
        tracing::debug!(building = ?id, %name, "spawned building");
        id
    }

    /// Spawn a free-standing warehouse. It has no owner, so changes to it
    /// wake nobody.
    pub fn spawn_warehouse(
        &mut self,
        role: WarehouseRole,
        allowed: impl IntoIterator<Item = ResourceType>,
        config: StorageConfig,
    ) -> StorageId {
        let allowed: Vec<ResourceType> = allowed.into_iter().collect();
        self.storages
            .insert_with_key(|id| Storage::warehouse(id, role, allowed, config))
    }

    pub fn spawn_inventory(&mut self, config: StorageConfig) -> StorageId {
        self.storages
            .insert_with_key(|id| Storage::inventory(id, config))
    }

    /// Create a new unit through the block factory directly in a storage's
    /// next slot.
    pub fn spawn_block_into(
        &mut self,
        storage: StorageId,
        resource: ResourceType,
    ) -> Result<BlockId, SimError> {
        let target = self.storages.get(storage).ok_or(SimError::UnknownStorage(storage))?;
        check_accepts(target, resource)?;
        let placement = target.next_slot();
        let mut block = self.factory.create(resource, placement);
        block.holder = Holder::Unowned;
        let id = self.blocks.insert(block);
        self.accept_block(TransferPoint::Storage(storage), id);
        self.drain_notifications();
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Begin the building's first cycle: request inputs, or start producing
    /// right away when the recipe has none.
    pub fn start_building(&mut self, building: BuildingId) -> Result<(), SimError> {
        let target = self
            .buildings
            .get_mut(building)
            .ok_or(SimError::UnknownBuilding(building))?;
        target.started = true;
        tracing::info!(building = ?building, "starting building");
        self.start_new_process(building);
        self.drain_notifications();
        Ok(())
    }

    /// Advance the world by one frame of `dt` seconds. Negative deltas are
    /// treated as zero.
    pub fn update(&mut self, dt: Seconds) {
        let dt = dt.max(Seconds::ZERO);

        let buildings: Vec<BuildingId> = self.buildings.keys().collect();
        for id in buildings {
            self.update_building(id, dt);
            self.drain_notifications();
        }

        let inventories: Vec<StorageId> = self
            .storages
            .iter()
            .filter(|(_, storage)| storage.transfer.is_some())
            .map(|(id, _)| id)
            .collect();
        for id in inventories {
            self.update_inventory(id, dt);
            self.drain_notifications();
        }

        self.events.deliver();
        self.frame += 1;
        self.time += dt;
    }

    /// Step an operation the host owns (one returned by
    /// [`World::transfer_to`] or [`World::try_transfer_to`]).
    pub fn update_transfer(&mut self, operation: &mut TransferOperation, dt: Seconds) {
        self.advance_transfer(operation, dt.max(Seconds::ZERO));
        self.drain_notifications();
    }

    fn update_building(&mut self, id: BuildingId, dt: Seconds) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        let mut operations = std::mem::take(&mut building.transfers);
        if building.processing.update(dt) == ProcessingTick::Completed {
            self.on_processing_completed(id);
        }

        for operation in &mut operations {
            self.advance_transfer(operation, dt);
        }
        operations.retain(|op| !op.is_completed());

        if let Some(building) = self.buildings.get_mut(id) {
            operations.append(&mut building.transfers);
            building.transfers = operations;
        }
    }

    fn update_inventory(&mut self, id: StorageId, dt: Seconds) {
        let Some(mut operation) = self.storages.get_mut(id).and_then(|s| s.transfer.take()) else {
            return;
        };
        self.advance_transfer(&mut operation, dt);
        if !operation.is_completed()
            && let Some(storage) = self.storages.get_mut(id)
        {
            storage.transfer = Some(operation);
        }
    }

    fn advance_transfer(&mut self, operation: &mut TransferOperation, dt: Seconds) {
        let step = operation.update(dt, &*self);
        if let Some(placement) = step.placement
            && let Some(block) = self.blocks.get_mut(operation.payload())
        {
            block.placement = placement;
        }
        if let Some(delivery) = step.delivery {
            self.deliver(delivery);
        }
    }

    // -----------------------------------------------------------------------
    // Transfer protocol
    // -----------------------------------------------------------------------

    /// Move the last-inserted unit of `resource` out of `from` towards `to`.
    ///
    /// The unit leaves `from` immediately and belongs to no point until the
    /// returned operation completes. `None` when `from` holds no such unit or
    /// `to` is a storage that cannot receive it.
    ///
    /// The caller owns the operation and must step it with
    /// [`World::update_transfer`] until it completes. Transfers cannot be
    /// cancelled; dropping one early strands the unit in flight and keeps the
    /// slot reserved at `to`.
    pub fn transfer_to(
        &mut self,
        from: TransferPoint,
        to: TransferPoint,
        resource: ResourceType,
    ) -> Option<TransferOperation> {
        let operation = self.issue_transfer(from, to, resource);
        self.drain_notifications();
        operation
    }

    /// Move the first unit of `from`, in insertion order, that `to` can
    /// receive. Drive the result to completion as with [`World::transfer_to`].
    pub fn try_transfer_to(&mut self, from: StorageId, to: StorageId) -> Option<TransferOperation> {
        let operation = self.issue_first_transferable(from, to);
        self.drain_notifications();
        operation
    }

    /// Hand an unowned block to a transfer point, as if a transfer into it
    /// had just completed.
    pub fn add_block(&mut self, point: TransferPoint, block: BlockId) -> Result<(), SimError> {
        let unit = self.blocks.get(block).ok_or(SimError::UnknownBlock(block))?;
        match unit.holder {
            Holder::Unowned => {}
            Holder::Point(holder) => return Err(SimError::BlockAlreadyOwned { block, holder }),
            Holder::InFlight { .. } => return Err(SimError::BlockInFlight(block)),
        }
        let resource = unit.resource;
        match point {
            TransferPoint::Storage(id) => {
                let storage = self.storages.get(id).ok_or(SimError::UnknownStorage(id))?;
                check_accepts(storage, resource)?;
                let placement = storage.next_slot();
                if let Some(unit) = self.blocks.get_mut(block) {
                    unit.placement = placement;
                }
            }
            TransferPoint::Building(id) => {
                if !self.buildings.contains_key(id) {
                    return Err(SimError::UnknownBuilding(id));
                }
            }
        }
        self.accept_block(point, block);
        self.drain_notifications();
        Ok(())
    }

    /// Take a block out of a transfer point without starting a transfer. The
    /// block stays in the world, unowned. Returns whether it was held there.
    pub fn remove_block(&mut self, point: TransferPoint, block: BlockId) -> Result<bool, SimError> {
        let removed = match point {
            TransferPoint::Storage(id) => self
                .storages
                .get_mut(id)
                .ok_or(SimError::UnknownStorage(id))?
                .remove_block(block),
            TransferPoint::Building(id) => self
                .buildings
                .get_mut(id)
                .ok_or(SimError::UnknownBuilding(id))?
                .remove_block(block),
        };
        if removed.is_none() {
            return Ok(false);
        }
        if let Some(unit) = self.blocks.get_mut(block) {
            unit.holder = Holder::Unowned;
        }
        match point {
            TransferPoint::Storage(id) => self.notify(id),
            // A pending output was withdrawn; the building may be able to go on.
            TransferPoint::Building(id) => self.on_output_changed(id),
        }
        self.drain_notifications();
        Ok(true)
    }

    /// Current world placement where units arriving at `point` land.
    pub fn destination(&self, point: TransferPoint) -> Option<Placement> {
        self.resolve(&self.destination_locator(point)?)
    }

    pub fn can_receive(&self, storage: StorageId, resource: ResourceType) -> bool {
        self.storages
            .get(storage)
            .is_some_and(|s| s.can_receive(resource))
    }

    pub fn contains(&self, storage: StorageId, resource: ResourceType) -> bool {
        self.storages.get(storage).is_some_and(|s| s.contains(resource))
    }

    pub fn capacity(&self, storage: StorageId) -> Option<u32> {
        self.storages.get(storage).map(|s| s.capacity())
    }

    pub fn quantity(&self, storage: StorageId) -> Option<u32> {
        self.storages.get(storage).map(|s| s.quantity())
    }

    // -----------------------------------------------------------------------
    // Interaction and movement
    // -----------------------------------------------------------------------

    /// One courier interaction between an inventory and a warehouse.
    ///
    /// With an input warehouse the inventory gives its first unit the
    /// warehouse accepts; with an output warehouse it takes the first unit it
    /// has room for. Returns `Ok(false)` when the inventory is still busy
    /// with a transfer or nothing could move.
    pub fn try_transfer_first_allowed(
        &mut self,
        inventory: StorageId,
        warehouse: StorageId,
    ) -> Result<bool, SimError> {
        let courier = self
            .storages
            .get(inventory)
            .ok_or(SimError::UnknownStorage(inventory))?;
        if !matches!(courier.kind(), StorageKind::Inventory) {
            return Err(SimError::NotAnInventory(inventory));
        }
        if courier.has_transfer() {
            return Ok(false);
        }
        let role = self
            .storages
            .get(warehouse)
            .ok_or(SimError::UnknownStorage(warehouse))?
            .role()
            .ok_or(SimError::NotAWarehouse(warehouse))?;

        let operation = match role {
            WarehouseRole::Input => self.issue_first_transferable(inventory, warehouse),
            WarehouseRole::Output => self.issue_first_transferable(warehouse, inventory),
        };
        let started = match (operation, self.storages.get_mut(inventory)) {
            (Some(operation), Some(courier)) => {
                courier.transfer = Some(operation);
                true
            }
            _ => false,
        };
        self.drain_notifications();
        Ok(started)
    }

    /// Move a storage. Blocks it holds keep their pose relative to it.
    pub fn move_storage(&mut self, storage: StorageId, placement: Placement) -> Result<(), SimError> {
        let target = self
            .storages
            .get_mut(storage)
            .ok_or(SimError::UnknownStorage(storage))?;
        let previous = target.placement();
        target.set_placement(placement);
        for stored in target.contents() {
            if let Some(block) = self.blocks.get_mut(stored.id) {
                let local = previous.relative(&block.placement);
                block.placement = placement.transform(&local);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn frame(&self) -> Frames {
        self.frame
    }

    /// Total simulated seconds.
    pub fn time(&self) -> Seconds {
        self.time
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(id)
    }

    pub fn storage(&self, id: StorageId) -> Option<&Storage> {
        self.storages.get(id)
    }

    pub fn block(&self, id: BlockId) -> Option<&ResourceBlock> {
        self.blocks.get(id)
    }

    pub fn buildings(&self) -> impl Iterator<Item = (BuildingId, &Building)> {
        self.buildings.iter()
    }

    pub fn storages(&self) -> impl Iterator<Item = (StorageId, &Storage)> {
        self.storages.iter()
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &ResourceBlock)> {
        self.blocks.iter()
    }

    pub fn phase(&self, building: BuildingId) -> Option<BuildingPhase> {
        self.buildings.get(building).map(Building::phase)
    }

    /// Blocks currently travelling between points.
    pub fn in_flight_count(&self) -> usize {
        self.blocks
            .values()
            .filter(|b| matches!(b.holder, Holder::InFlight { .. }))
            .count()
    }

    /// Blocks a storage holds, in insertion order.
    pub fn contents(&self, storage: StorageId) -> Option<&[StoredBlock]> {
        self.storages.get(storage).map(|s| s.contents())
    }

    pub fn holder(&self, block: BlockId) -> Option<Holder> {
        self.blocks.get(block).map(|b| b.holder)
    }

    /// Every point whose contents list `block`. At most one for any block;
    /// empty while it is in flight.
    pub fn points_holding(&self, block: BlockId) -> Vec<TransferPoint> {
        let storages = self
            .storages
            .iter()
            .filter(|(_, s)| s.contents().iter().any(|b| b.id == block))
            .map(|(id, _)| TransferPoint::Storage(id));
        let buildings = self
            .buildings
            .iter()
            .filter(|(_, b)| {
                b.input_blocks()
                    .iter()
                    .chain(b.output_blocks())
                    .any(|b| b.id == block)
            })
            .map(|(id, _)| TransferPoint::Building(id));
        storages.chain(buildings).collect()
    }

    /// Blocks of `resource` alive in the world, wherever they are.
    pub fn count_resource(&self, resource: ResourceType) -> usize {
        self.blocks.values().filter(|b| b.resource == resource).count()
    }

    // -----------------------------------------------------------------------
    // Internals: transfers and deliveries
    // -----------------------------------------------------------------------

    fn destination_locator(&self, point: TransferPoint) -> Option<Locator> {
        match point {
            TransferPoint::Storage(id) => self.storages.get(id).map(|s| s.destination()),
            TransferPoint::Building(id) => self.buildings.get(id).map(|b| b.destination()),
        }
    }

    fn issue_first_transferable(&mut self, from: StorageId, to: StorageId) -> Option<TransferOperation> {
        let resource = {
            let source = self.storages.get(from)?;
            let receiver = self.storages.get(to)?;
            source.first_transferable(receiver)?
        };
        self.issue_transfer(from.into(), to.into(), resource)
    }

    /// Start a transfer without draining notifications.
    fn issue_transfer(
        &mut self,
        from: TransferPoint,
        to: TransferPoint,
        resource: ResourceType,
    ) -> Option<TransferOperation> {
        if let TransferPoint::Storage(id) = to
            && !self.storages.get(id)?.can_receive(resource)
        {
            return None;
        }
        let destination = self.destination_locator(to)?;
        let (stored, operation) = match from {
            TransferPoint::Storage(id) => self.storages.get_mut(id)?.transfer_to(to, destination, resource)?,
            TransferPoint::Building(id) => self.buildings.get_mut(id)?.transfer_to(to, destination, resource)?,
        };

        if let TransferPoint::Storage(id) = to
            && let Some(storage) = self.storages.get_mut(id)
        {
            storage.reserve();
        }
        if let Some(block) = self.blocks.get_mut(stored.id) {
            block.holder = Holder::InFlight { to };
        }
        tracing::debug!(?from, ?to, block = ?stored.id, %resource, "transfer started");
        self.events.emit(Event::TransferStarted {
            from,
            to,
            block: stored.id,
            resource,
            frame: self.frame,
        });
        if let TransferPoint::Storage(id) = from {
            self.notify(id);
        }
        Some(operation)
    }

    fn deliver(&mut self, delivery: Delivery) {
        let Delivery { block, to } = delivery;
        if let TransferPoint::Storage(id) = to
            && let Some(storage) = self.storages.get_mut(id)
        {
            storage.release();
        }
        let Some(resource) = self.blocks.get(block).map(|b| b.resource) else {
            tracing::warn!(?block, "delivered block no longer exists");
            return;
        };
        self.events.emit(Event::TransferCompleted {
            to,
            block,
            resource,
            frame: self.frame,
        });
        self.accept_block(to, block);
    }

    /// Put `block` into `point` and run the point's reaction.
    fn accept_block(&mut self, point: TransferPoint, block: BlockId) {
        let Some(unit) = self.blocks.get_mut(block) else {
            return;
        };
        let stored = StoredBlock {
            id: block,
            resource: unit.resource,
        };
        match point {
            TransferPoint::Storage(id) => {
                let Some(storage) = self.storages.get_mut(id) else {
                    tracing::warn!(storage = ?id, ?block, "block delivered to a missing storage");
                    unit.holder = Holder::Unowned;
                    return;
                };
                unit.holder = Holder::Point(point);
                storage.add_block(stored);
                self.notify(id);
            }
            TransferPoint::Building(id) => {
                let Some(building) = self.buildings.get_mut(id) else {
                    tracing::warn!(building = ?id, ?block, "block delivered to a missing building");
                    unit.holder = Holder::Unowned;
                    return;
                };
                unit.holder = Holder::Point(point);
                let satisfied = building.receive_input(stored);
                if building.started {
                    self.on_input_received(id, satisfied);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals: storage notifications
    // -----------------------------------------------------------------------

    fn notify(&mut self, storage: StorageId) {
        self.notifications.push_back(storage);
        self.events.emit(Event::ResourcesChanged {
            storage,
            frame: self.frame,
        });
    }

    /// Run owner reactions for queued storage changes, including changes
    /// those reactions cause.
    fn drain_notifications(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(storage) = self.notifications.pop_front() {
            let Some(owner) = self.storages.get(storage).and_then(Storage::owner) else {
                continue;
            };
            match owner.role {
                WarehouseRole::Input => self.on_input_changed(owner.building),
                WarehouseRole::Output => self.on_output_changed(owner.building),
            }
        }
        self.draining = false;
    }

    // -----------------------------------------------------------------------
    // Internals: building control loop
    // -----------------------------------------------------------------------

    fn output_full(&self, building: &Building) -> bool {
        self.storages
            .get(building.output_storage())
            .is_none_or(|s| s.free_space() == 0)
    }

    fn report_stop(&mut self, id: BuildingId, reason: StopReason) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        tracing::info!(building = building.name(), %reason, "production stopped");
        self.log
            .log(&format!("Production stopped: {} reason: {}", building.name(), reason));
        self.events.emit(Event::ProductionStopped {
            building: id,
            reason,
            frame: self.frame,
        });
    }

    fn stop_production(&mut self, id: BuildingId, reason: StopReason) {
        if let Some(building) = self.buildings.get_mut(id) {
            building.processing.stop();
        }
        self.report_stop(id, reason);
    }

    fn start_new_process(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        building.begin_cycle();
        self.request_required_resources(id);
    }

    /// Fetch the next outstanding input, or start producing once nothing is
    /// outstanding.
    fn request_required_resources(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        if building.is_required_satisfied() {
            self.start_production(id);
            return;
        }
        let input = building.input_storage();
        let pick = match self.storages.get(input) {
            Some(storage) => building.next_request(storage),
            None => RequestPick::Unavailable,
        };
        match pick {
            RequestPick::AllInTransit => {}
            RequestPick::Unavailable => self.report_stop(id, StopReason::NotEnoughResources),
            RequestPick::Available(resource) => {
                if let Some(building) = self.buildings.get_mut(id) {
                    building.mark_in_transit(resource);
                }
                match self.issue_transfer(input.into(), id.into(), resource) {
                    Some(operation) => {
                        if let Some(building) = self.buildings.get_mut(id) {
                            building.transfers.push(operation);
                        }
                    }
                    None => tracing::warn!(building = ?id, %resource, "input request found no unit"),
                }
            }
        }
    }

    fn start_production(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        if building.has_pending_output() {
            self.stop_production(id, StopReason::FullOutput);
            return;
        }
        let consumed = building.consume_inputs();
        building.processing.start();
        tracing::debug!(building = building.name(), "production started");

        for stored in consumed {
            self.blocks.remove(stored.id);
            self.events.emit(Event::BlockConsumed {
                building: id,
                block: stored.id,
                resource: stored.resource,
                frame: self.frame,
            });
        }
        self.events.emit(Event::ProductionStarted {
            building: id,
            frame: self.frame,
        });
    }

    fn on_input_received(&mut self, id: BuildingId, satisfied: bool) {
        if satisfied {
            self.start_production(id);
        } else {
            self.stop_production(id, StopReason::NotEnoughResources);
        }
    }

    fn on_processing_completed(&mut self, id: BuildingId) {
        self.events.emit(Event::ProductionCompleted {
            building: id,
            frame: self.frame,
        });
        self.start_new_process(id);
        self.finish_production(id);
    }

    /// Materialize the recipe's outputs at the building and dispatch them.
    fn finish_production(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        let placement = building.output_placement();
        let outputs = building.processing.result().to_vec();
        for resource in outputs {
            let mut block = self.factory.create(resource, placement);
            block.holder = Holder::Point(TransferPoint::Building(id));
            let block = self.blocks.insert(block);
            if let Some(building) = self.buildings.get_mut(id) {
                building.push_produced(StoredBlock { id: block, resource });
            }
            self.events.emit(Event::BlockProduced {
                building: id,
                block,
                resource,
                frame: self.frame,
            });
        }
        self.dispatch_production(id);
    }

    /// Send pending outputs, oldest first, while the output storage has room.
    fn dispatch_production(&mut self, id: BuildingId) {
        loop {
            let Some(building) = self.buildings.get(id) else {
                return;
            };
            let Some(&resource) = building.produced().first() else {
                break;
            };
            let output = building.output_storage();
            if !self.can_receive(output, resource) {
                self.stop_production(id, StopReason::FullOutput);
                return;
            }
            let Some(operation) = self.issue_transfer(id.into(), output.into(), resource) else {
                tracing::warn!(building = ?id, %resource, "produced block missing from building");
                return;
            };
            if let Some(building) = self.buildings.get_mut(id) {
                building.pop_produced();
                building.transfers.push(operation);
            }
        }

        let Some(building) = self.buildings.get_mut(id) else {
            return;
        };
        let processing = &building.processing;
        if processing.is_stopped() && !processing.is_completed() && building.is_required_satisfied() {
            building.processing.resume();
            self.events.emit(Event::ProductionResumed {
                building: id,
                frame: self.frame,
            });
        }
    }

    fn on_input_changed(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        if !building.started || self.output_full(building) || !building.processing.is_stopped() {
            return;
        }
        self.request_required_resources(id);
    }

    fn on_output_changed(&mut self, id: BuildingId) {
        let Some(building) = self.buildings.get(id) else {
            return;
        };
        if !building.started || self.output_full(building) || !building.processing.is_stopped() {
            return;
        }
        if building.has_pending_output() {
            self.dispatch_production(id);
            let Some(building) = self.buildings.get(id) else {
                return;
            };
            if building.has_pending_output() || !building.processing.is_stopped() {
                return;
            }
        }

        let Some(building) = self.buildings.get(id) else {
            return;
        };
        if building.is_required_satisfied() {
            self.start_production(id);
        } else if building.requested().len() != building.processing.required().len() {
            self.request_required_resources(id);
        } else {
            self.start_new_process(id);
        }
    }
}

fn check_accepts(storage: &Storage, resource: ResourceType) -> Result<(), SimError> {
    if !storage.allows(resource) {
        return Err(SimError::ResourceNotAllowed {
            storage: storage.id(),
            resource,
        });
    }
    if storage.free_space() == 0 {
        return Err(SimError::StorageFull {
            storage: storage.id(),
            capacity: storage.capacity(),
        });
    }
    Ok(())
}

impl LocatorResolver for World {
    fn resolve(&self, locator: &Locator) -> Option<Placement> {
        match locator {
            Locator::Fixed(placement) => Some(*placement),
            Locator::Dynamic(f) => Some(f()),
            Locator::Block(id) => self.blocks.get(*id).map(|b| b.placement),
            Locator::BuildingInput(id) => self.buildings.get(*id).map(Building::input_placement),
            Locator::BuildingOutput(id) => self.buildings.get(*id).map(Building::output_placement),
            Locator::StorageSlot(id) => self
                .storages
                .get(*id)
                .map(|s| s.slot_placement(s.quantity())),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
