//! Resource kinds and the physical blocks that carry them.

use crate::id::{BlockId, TransferPoint};
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete resource kind.
///
/// Discriminants start at 1; there is no "unset" resource. Lookups that may
/// find nothing return `Option<ResourceType>` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Ore = 1,
    Ingot = 2,
    Alloy = 3,
}

impl ResourceType {
    /// Every resource kind, in discriminant order.
    pub const ALL: [ResourceType; 3] = [ResourceType::Ore, ResourceType::Ingot, ResourceType::Alloy];
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Ore => "Ore",
            ResourceType::Ingot => "Ingot",
            ResourceType::Alloy => "Alloy",
        };
        f.write_str(name)
    }
}

/// Who currently owns a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// Not yet placed anywhere (fresh from the factory).
    Unowned,
    /// Owned by a building or storage.
    Point(TransferPoint),
    /// Carried by a transfer operation towards the given point.
    InFlight { to: TransferPoint },
}

/// One physical unit of a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceBlock {
    pub resource: ResourceType,
    /// World-space transform, driven by transfer animations.
    pub placement: Placement,
    pub holder: Holder,
}

impl ResourceBlock {
    pub fn new(resource: ResourceType, placement: Placement) -> Self {
        Self {
            resource,
            placement,
            holder: Holder::Unowned,
        }
    }

    /// Display name, e.g. `ResourceBlock Ore`.
    pub fn name(&self) -> String {
        format!("ResourceBlock {}", self.resource)
    }
}

/// A block reference as kept in a transfer point's contents. Carries the
/// resource type so contents can be queried without the block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredBlock {
    pub id: BlockId,
    pub resource: ResourceType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_discriminants_start_at_one() {
        assert_eq!(ResourceType::Ore as u8, 1);
        assert_eq!(ResourceType::Ingot as u8, 2);
        assert_eq!(ResourceType::Alloy as u8, 3);
    }

    #[test]
    fn block_starts_unowned() {
        let block = ResourceBlock::new(ResourceType::Ingot, Placement::IDENTITY);
        assert_eq!(block.holder, Holder::Unowned);
        assert_eq!(block.name(), "ResourceBlock Ingot");
    }
}
