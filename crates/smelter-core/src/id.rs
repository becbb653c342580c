use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a building in the world.
    pub struct BuildingId;

    /// Identifies a storage (warehouse or inventory) in the world.
    pub struct StorageId;

    /// Identifies a single resource block (one discrete unit).
    pub struct BlockId;
}

/// Anything that can send or receive resource blocks.
///
/// Transfer operations refer to their endpoints through this id-level handle,
/// never through references, so an operation can outlive a borrow of the
/// world between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferPoint {
    Building(BuildingId),
    Storage(StorageId),
}

impl From<BuildingId> for TransferPoint {
    fn from(id: BuildingId) -> Self {
        TransferPoint::Building(id)
    }
}

impl From<StorageId> for TransferPoint {
    fn from(id: StorageId) -> Self {
        TransferPoint::Storage(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn transfer_point_from_ids() {
        let mut buildings = SlotMap::<BuildingId, ()>::with_key();
        let mut storages = SlotMap::<StorageId, ()>::with_key();
        let b = buildings.insert(());
        let s = storages.insert(());

        assert_eq!(TransferPoint::from(b), TransferPoint::Building(b));
        assert_eq!(TransferPoint::from(s), TransferPoint::Storage(s));
        assert_ne!(TransferPoint::from(b), TransferPoint::from(s));
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut storages = SlotMap::<StorageId, ()>::with_key();
        let s = storages.insert(());
        let mut map = HashMap::new();
        map.insert(TransferPoint::Storage(s), "input warehouse");
        assert_eq!(map[&TransferPoint::Storage(s)], "input warehouse");
    }
}
