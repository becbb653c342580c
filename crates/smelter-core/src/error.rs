use crate::id::{BlockId, BuildingId, StorageId, TransferPoint};
use crate::resource::ResourceType;

/// Misuse of the world's host-facing API.
///
/// Protocol outcomes inside the simulation (unavailable inputs, full
/// outputs, missing units) are not errors; they show up as stalled
/// production and `None` results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("unknown building {0:?}")]
    UnknownBuilding(BuildingId),

    #[error("unknown storage {0:?}")]
    UnknownStorage(StorageId),

    #[error("unknown block {0:?}")]
    UnknownBlock(BlockId),

    #[error("storage {storage:?} is full ({capacity} blocks)")]
    StorageFull { storage: StorageId, capacity: u32 },

    #[error("storage {storage:?} does not accept {resource}")]
    ResourceNotAllowed {
        storage: StorageId,
        resource: ResourceType,
    },

    #[error("block {block:?} is already held by {holder:?}")]
    BlockAlreadyOwned { block: BlockId, holder: TransferPoint },

    #[error("block {0:?} is in flight")]
    BlockInFlight(BlockId),

    #[error("storage {0:?} is not an inventory")]
    NotAnInventory(StorageId),

    #[error("storage {0:?} is not a warehouse")]
    NotAWarehouse(StorageId),
}
