//! The protocol shared by everything that holds resource blocks.
//!
//! [`ResourceTransferPoint`] covers buildings, warehouses and inventories;
//! [`ResourceStorage`] adds the capacity-bounded queries of storages. Both
//! traits work on local contents only. The [`World`](crate::world::World)
//! wraps them with ownership bookkeeping, notifications and events.

use crate::fixed::Seconds;
use crate::id::{BlockId, TransferPoint};
use crate::placement::Locator;
use crate::resource::{ResourceType, StoredBlock};
use crate::transfer::TransferOperation;

pub trait ResourceTransferPoint {
    /// Id-level handle of this point.
    fn point(&self) -> TransferPoint;

    /// Remove the most recently inserted block of `resource` (LIFO).
    fn take_last(&mut self, resource: ResourceType) -> Option<StoredBlock>;

    /// Append a block to the contents.
    fn add_block(&mut self, block: StoredBlock);

    /// Remove a specific block. Returns it if it was held here.
    fn remove_block(&mut self, block: BlockId) -> Option<StoredBlock>;

    /// Where the next incoming block should be placed.
    fn destination(&self) -> Locator;

    /// Where an outgoing block starts its animation.
    fn source_of(&self, block: BlockId) -> Locator;

    /// How long an outgoing transfer takes.
    fn transfer_duration(&self) -> Seconds;

    /// Detach the last-inserted block of `resource` and build the operation
    /// that carries it to `other`. Ownership of the block leaves this point
    /// immediately; `None` when no such block is held.
    fn transfer_to(
        &mut self,
        other: TransferPoint,
        other_destination: Locator,
        resource: ResourceType,
    ) -> Option<(StoredBlock, TransferOperation)> {
        let block = self.take_last(resource)?;
        let operation = TransferOperation::new(
            self.source_of(block.id),
            other_destination,
            self.transfer_duration(),
            block.id,
            other,
        );
        Some((block, operation))
    }
}

pub trait ResourceStorage: ResourceTransferPoint {
    fn capacity(&self) -> u32;

    fn quantity(&self) -> u32;

    /// Whether one more block of `resource` would be accepted.
    fn can_receive(&self, resource: ResourceType) -> bool;

    fn contains(&self, resource: ResourceType) -> bool;

    /// Stored blocks in insertion order.
    fn contents(&self) -> &[StoredBlock];

    fn is_full(&self) -> bool {
        self.quantity() >= self.capacity()
    }

    /// First resource, scanning contents in insertion order, that `receiver`
    /// can accept.
    fn first_transferable(&self, receiver: &dyn ResourceStorage) -> Option<ResourceType> {
        self.contents()
            .iter()
            .map(|block| block.resource)
            .find(|resource| receiver.can_receive(*resource))
    }
}
