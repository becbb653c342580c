//! Production buildings.
//!
//! A [`Building`] owns one [`ResourceProcessing`], the blocks delivered into
//! it, the blocks it produced and the transfers it started. The control loop
//! that couples it to its input and output warehouses lives in the
//! [`World`](crate::world::World); this module holds the building's local
//! bookkeeping.

use crate::fixed::{Seconds, seconds};
use crate::id::{BlockId, BuildingId, StorageId, TransferPoint};
use crate::placement::{Locator, Placement};
use crate::processing::ResourceProcessing;
use crate::recipe::ResourceRecipe;
use crate::resource::{ResourceType, StoredBlock};
use crate::storage::{StorageConfig, WarehouseRole};
use crate::transfer::TransferOperation;
use crate::transfer_point::{ResourceStorage, ResourceTransferPoint};
use glam::Vec3;
use std::fmt;

/// Default time for a building to push a produced block to its output.
pub const BUILDING_DISPATCH_SECONDS: f64 = 1.0;

// ---------------------------------------------------------------------------
// Reasons and phases
// ---------------------------------------------------------------------------

/// Why production stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StopReason {
    NotEnoughResources,
    FullOutput,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NotEnoughResources => f.write_str("NotEnoughResources"),
            StopReason::FullOutput => f.write_str("FullOutput"),
        }
    }
}

/// Coarse view of where a building is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingPhase {
    AwaitingInputs,
    Producing,
    AwaitingOutputSpace,
    Dispatching,
}

/// What the next input request should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPick {
    /// Nothing left to ask for; every outstanding request has a unit on its way.
    AllInTransit,
    /// This type is outstanding and the input storage holds one.
    Available(ResourceType),
    /// Some outstanding types are not in the input storage.
    Unavailable,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything needed to place a building and its two warehouses.
///
/// Warehouse placements and the input/output points are local to the
/// building's placement.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingConfig {
    pub name: String,
    pub recipe: ResourceRecipe,
    pub placement: Placement,
    pub input_point: Placement,
    pub output_point: Placement,
    pub input_warehouse: StorageConfig,
    pub output_warehouse: StorageConfig,
    pub dispatch_duration: Seconds,
}

impl BuildingConfig {
    /// A building with warehouses on either side and default timings.
    pub fn new(name: impl Into<String>, recipe: ResourceRecipe, capacity: u32) -> Self {
        Self {
            name: name.into(),
            recipe,
            placement: Placement::IDENTITY,
            input_point: Placement::at(Vec3::new(-1.0, 1.0, 0.0)),
            output_point: Placement::at(Vec3::new(1.0, 1.0, 0.0)),
            input_warehouse: StorageConfig::new(capacity).at(Placement::at(Vec3::new(-3.0, 0.0, 0.0))),
            output_warehouse: StorageConfig::new(capacity).at(Placement::at(Vec3::new(3.0, 0.0, 0.0))),
            dispatch_duration: seconds(BUILDING_DISPATCH_SECONDS),
        }
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_dispatch_duration(mut self, duration: Seconds) -> Self {
        self.dispatch_duration = duration;
        self
    }

    pub fn with_capacities(mut self, input: u32, output: u32) -> Self {
        self.input_warehouse.capacity = input;
        self.output_warehouse.capacity = output;
        self
    }

    /// Warehouse construction parameters for `role`, in world space.
    pub fn warehouse_config(&self, role: WarehouseRole) -> StorageConfig {
        let local = match role {
            WarehouseRole::Input => &self.input_warehouse,
            WarehouseRole::Output => &self.output_warehouse,
        };
        let mut config = local.clone();
        config.placement = self.placement.transform(&local.placement);
        config
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Building {
    id: BuildingId,
    name: String,
    placement: Placement,
    input_point: Placement,
    output_point: Placement,
    dispatch_duration: Seconds,

    pub(crate) processing: ResourceProcessing,
    input_storage: StorageId,
    output_storage: StorageId,

    input_blocks: Vec<StoredBlock>,
    output_blocks: Vec<StoredBlock>,
    pub(crate) transfers: Vec<TransferOperation>,
    /// Set by the first `start_building`; warehouse changes are ignored before.
    pub(crate) started: bool,

    /// Inputs of the current cycle not yet delivered.
    requested: Vec<ResourceType>,
    /// Requested inputs whose unit is already on its way.
    in_transit: Vec<ResourceType>,
    /// Produced outputs not yet handed to the output storage.
    produced: Vec<ResourceType>,
}

impl Building {
    pub fn new(id: BuildingId, config: BuildingConfig, input_storage: StorageId, output_storage: StorageId) -> Self {
        let processing = ResourceProcessing::new(config.recipe);
        Self {
            id,
            name: config.name,
            placement: config.placement,
            input_point: config.input_point,
            output_point: config.output_point,
            dispatch_duration: config.dispatch_duration,
            input_blocks: Vec::with_capacity(processing.required().len()),
            output_blocks: Vec::with_capacity(processing.result().len()),
            transfers: Vec::with_capacity(2),
            started: false,
            processing,
            input_storage,
            output_storage,
            requested: Vec::new(),
            in_transit: Vec::new(),
            produced: Vec::new(),
        }
    }

    pub fn id(&self) -> BuildingId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processing(&self) -> &ResourceProcessing {
        &self.processing
    }

    pub fn input_storage(&self) -> StorageId {
        self.input_storage
    }

    pub fn output_storage(&self) -> StorageId {
        self.output_storage
    }

    pub fn requested(&self) -> &[ResourceType] {
        &self.requested
    }

    pub fn in_transit(&self) -> &[ResourceType] {
        &self.in_transit
    }

    pub fn produced(&self) -> &[ResourceType] {
        &self.produced
    }

    pub fn input_blocks(&self) -> &[StoredBlock] {
        &self.input_blocks
    }

    pub fn output_blocks(&self) -> &[StoredBlock] {
        &self.output_blocks
    }

    pub fn transfers(&self) -> &[TransferOperation] {
        &self.transfers
    }

    /// World placement where input blocks arrive.
    pub fn input_placement(&self) -> Placement {
        self.placement.transform(&self.input_point)
    }

    /// World placement where produced blocks appear.
    pub fn output_placement(&self) -> Placement {
        self.placement.transform(&self.output_point)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_required_satisfied(&self) -> bool {
        self.requested.is_empty()
    }

    /// True while at least one produced block waits for output space.
    pub fn has_pending_output(&self) -> bool {
        !self.produced.is_empty()
    }

    pub fn phase(&self) -> BuildingPhase {
        if !self.processing.is_stopped() {
            BuildingPhase::Producing
        } else if self.has_pending_output() {
            BuildingPhase::AwaitingOutputSpace
        } else if self.transfers.iter().any(|op| op.target() != TransferPoint::Building(self.id)) {
            BuildingPhase::Dispatching
        } else {
            BuildingPhase::AwaitingInputs
        }
    }

    /// Start a new cycle's shopping list from the recipe.
    pub(crate) fn begin_cycle(&mut self) {
        self.requested = self.processing.required().to_vec();
    }

    /// Choose the next input to fetch from `input`.
    pub fn next_request(&self, input: &dyn ResourceStorage) -> RequestPick {
        let mut outstanding = false;
        for (index, resource) in self.requested.iter().enumerate() {
            let earlier = self.requested[..index].iter().filter(|r| *r == resource).count();
            let moving = self.in_transit.iter().filter(|r| *r == resource).count();
            if earlier >= moving {
                outstanding = true;
                if input.contains(*resource) {
                    return RequestPick::Available(*resource);
                }
            }
        }
        if outstanding {
            RequestPick::Unavailable
        } else {
            RequestPick::AllInTransit
        }
    }

    pub(crate) fn mark_in_transit(&mut self, resource: ResourceType) {
        self.in_transit.push(resource);
    }

    /// Record an arrived input. Returns whether the cycle's inputs are now
    /// all present.
    pub(crate) fn receive_input(&mut self, block: StoredBlock) -> bool {
        self.add_block(block);
        if let Some(index) = self.requested.iter().position(|r| *r == block.resource) {
            self.requested.remove(index);
        }
        if let Some(index) = self.in_transit.iter().position(|r| *r == block.resource) {
            self.in_transit.remove(index);
        }
        self.is_required_satisfied()
    }

    /// Hand over the delivered inputs for consumption.
    pub(crate) fn consume_inputs(&mut self) -> Vec<StoredBlock> {
        std::mem::take(&mut self.input_blocks)
    }

    /// Register a freshly produced block awaiting dispatch.
    pub(crate) fn push_produced(&mut self, block: StoredBlock) {
        self.output_blocks.push(block);
        self.produced.push(block.resource);
    }

    /// Drop the head of the dispatch queue once it is on its way.
    pub(crate) fn pop_produced(&mut self) -> Option<ResourceType> {
        if self.produced.is_empty() {
            None
        } else {
            Some(self.produced.remove(0))
        }
    }
}

impl ResourceTransferPoint for Building {
    fn point(&self) -> TransferPoint {
        TransferPoint::Building(self.id)
    }

    fn take_last(&mut self, resource: ResourceType) -> Option<StoredBlock> {
        let index = self.output_blocks.iter().rposition(|b| b.resource == resource)?;
        Some(self.output_blocks.remove(index))
    }

    fn add_block(&mut self, block: StoredBlock) {
        self.input_blocks.push(block);
    }

    /// Take a produced block back out. Its dispatch slot goes with it.
    fn remove_block(&mut self, block: BlockId) -> Option<StoredBlock> {
        let index = self.output_blocks.iter().position(|b| b.id == block)?;
        let removed = self.output_blocks.remove(index);
        if let Some(slot) = self.produced.iter().rposition(|r| *r == removed.resource) {
            self.produced.remove(slot);
        }
        Some(removed)
    }

    fn destination(&self) -> Locator {
        Locator::BuildingInput(self.id)
    }

    fn source_of(&self, _block: BlockId) -> Locator {
        Locator::BuildingOutput(self.id)
    }

    fn transfer_duration(&self) -> Seconds {
        self.dispatch_duration
    }
}

// ===========================================================================
// Tests
// ===========================================================================
