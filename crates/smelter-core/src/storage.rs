//! Capacity-bounded storages: warehouses and inventories.
//!
//! Both kinds keep their blocks in insertion order and stack them visually in
//! slots above the storage origin. A warehouse additionally filters by an
//! allowed resource set and has a directional role; an inventory accepts any
//! resource while it has room and owns at most one outgoing transfer.

use crate::fixed::{Seconds, seconds};
use crate::id::{BlockId, BuildingId, StorageId, TransferPoint};
use crate::placement::{Locator, Placement};
use crate::resource::{ResourceType, StoredBlock};
use crate::transfer::TransferOperation;
use crate::transfer_point::{ResourceStorage, ResourceTransferPoint};
use glam::Vec3;
use std::collections::BTreeSet;

/// Default time for a storage-initiated transfer.
pub const STORAGE_TRANSFER_SECONDS: f64 = 0.5;

/// Default vertical spacing between stacked slots.
pub const DEFAULT_SLOT_HEIGHT: f32 = 1.0;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Direction a warehouse serves relative to its building. Tells an
/// interacting inventory whether to deposit into or withdraw from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum WarehouseRole {
    Input,
    Output,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    Warehouse {
        role: WarehouseRole,
        allowed: BTreeSet<ResourceType>,
    },
    Inventory,
}

/// The building whose reactions a storage's change notifications drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageOwner {
    pub building: BuildingId,
    pub role: WarehouseRole,
}

/// Construction parameters shared by both kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub capacity: u32,
    pub placement: Placement,
    pub slot_height: f32,
    pub transfer_duration: Seconds,
}

impl StorageConfig {
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            placement: Placement::IDENTITY,
            slot_height: DEFAULT_SLOT_HEIGHT,
            transfer_duration: seconds(STORAGE_TRANSFER_SECONDS),
        }
    }

    pub fn at(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_transfer_duration(mut self, duration: Seconds) -> Self {
        self.transfer_duration = duration;
        self
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Storage {
    id: StorageId,
    kind: StorageKind,
    capacity: u32,
    contents: Vec<StoredBlock>,
    /// Slots promised to transfers that are still in flight.
    reserved: u32,
    placement: Placement,
    slot_height: f32,
    transfer_duration: Seconds,
    pub(crate) owner: Option<StorageOwner>,
    /// Inventories run their own single transfer.
    pub(crate) transfer: Option<TransferOperation>,
}

impl Storage {
    pub fn new(id: StorageId, kind: StorageKind, config: StorageConfig) -> Self {
        Self {
            id,
            kind,
            capacity: config.capacity,
            contents: Vec::with_capacity(config.capacity as usize),
            reserved: 0,
            placement: config.placement,
            slot_height: config.slot_height,
            transfer_duration: config.transfer_duration,
            owner: None,
            transfer: None,
        }
    }

    pub fn warehouse(
        id: StorageId,
        role: WarehouseRole,
        allowed: impl IntoIterator<Item = ResourceType>,
        config: StorageConfig,
    ) -> Self {
        let kind = StorageKind::Warehouse {
            role,
            allowed: allowed.into_iter().collect(),
        };
        Self::new(id, kind, config)
    }

    pub fn inventory(id: StorageId, config: StorageConfig) -> Self {
        Self::new(id, StorageKind::Inventory, config)
    }

    pub fn id(&self) -> StorageId {
        self.id
    }

    pub fn kind(&self) -> &StorageKind {
        &self.kind
    }

    pub fn role(&self) -> Option<WarehouseRole> {
        match &self.kind {
            StorageKind::Warehouse { role, .. } => Some(*role),
            StorageKind::Inventory => None,
        }
    }

    /// Whether the type filter admits `resource`, ignoring space.
    pub fn allows(&self, resource: ResourceType) -> bool {
        match &self.kind {
            StorageKind::Warehouse { allowed, .. } => allowed.contains(&resource),
            StorageKind::Inventory => true,
        }
    }

    pub fn owner(&self) -> Option<StorageOwner> {
        self.owner
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    pub fn reserved(&self) -> u32 {
        self.reserved
    }

    pub(crate) fn reserve(&mut self) {
        self.reserved += 1;
    }

    pub(crate) fn release(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
    }

    /// Free slots, counting in-flight arrivals as taken.
    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.quantity() + self.reserved)
    }

    /// World placement of slot `index`.
    pub fn slot_placement(&self, index: u32) -> Placement {
        let height = (index as f32 + 0.5) * self.slot_height;
        self.placement.transform(&Placement::at(Vec3::Y * height))
    }

    /// Placement for the next unit, i.e. slot `quantity`.
    pub fn next_slot(&self) -> Placement {
        if self.is_full() {
            tracing::warn!(storage = ?self.id, "next slot requested on a full storage");
        }
        self.slot_placement(self.quantity())
    }

    pub fn has_transfer(&self) -> bool {
        self.transfer.is_some()
    }
}

impl ResourceTransferPoint for Storage {
    fn point(&self) -> TransferPoint {
        TransferPoint::Storage(self.id)
    }

    fn take_last(&mut self, resource: ResourceType) -> Option<StoredBlock> {
        let index = self.contents.iter().rposition(|b| b.resource == resource)?;
        Some(self.contents.remove(index))
    }

    fn add_block(&mut self, block: StoredBlock) {
        self.contents.push(block);
    }

    fn remove_block(&mut self, block: BlockId) -> Option<StoredBlock> {
        let index = self.contents.iter().position(|b| b.id == block)?;
        Some(self.contents.remove(index))
    }

    fn destination(&self) -> Locator {
        Locator::StorageSlot(self.id)
    }

    fn source_of(&self, block: BlockId) -> Locator {
        Locator::Block(block)
    }

    fn transfer_duration(&self) -> Seconds {
        self.transfer_duration
    }
}

impl ResourceStorage for Storage {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn quantity(&self) -> u32 {
        self.contents.len() as u32
    }

    fn can_receive(&self, resource: ResourceType) -> bool {
        self.free_space() > 0 && self.allows(resource)
    }

    fn contains(&self, resource: ResourceType) -> bool {
        self.contents.iter().any(|b| b.resource == resource)
    }

    fn contents(&self) -> &[StoredBlock] {
        &self.contents
    }
}

// ===========================================================================
// Tests
// ===========================================================================
