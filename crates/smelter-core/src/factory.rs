//! Creation of new resource blocks.
//!
//! The world asks its [`BlockFactory`] for every block a building produces.
//! Hosts plug in their own factory to attach visuals or pooling; the
//! default just builds the plain block.

use crate::placement::Placement;
use crate::resource::{ResourceBlock, ResourceType};

pub trait BlockFactory {
    fn create(&mut self, resource: ResourceType, placement: Placement) -> ResourceBlock;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainBlockFactory;

impl BlockFactory for PlainBlockFactory {
    fn create(&mut self, resource: ResourceType, placement: Placement) -> ResourceBlock {
        ResourceBlock::new(resource, placement)
    }
}

/// Counts what it creates per resource type. Handy for checking that a
/// stalled building does not produce duplicates.
#[derive(Debug, Clone, Default)]
pub struct CountingBlockFactory {
    counts: std::rc::Rc<std::cell::RefCell<std::collections::BTreeMap<ResourceType, u32>>>,
}

impl CountingBlockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self, resource: ResourceType) -> u32 {
        self.counts.borrow().get(&resource).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.borrow().values().sum()
    }
}

impl BlockFactory for CountingBlockFactory {
    fn create(&mut self, resource: ResourceType, placement: Placement) -> ResourceBlock {
        *self.counts.borrow_mut().entry(resource).or_insert(0) += 1;
        ResourceBlock::new(resource, placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Holder;

    #[test]
    fn plain_factory_builds_unowned_block() {
        let block = PlainBlockFactory.create(ResourceType::Ore, Placement::IDENTITY);
        assert_eq!(block.resource, ResourceType::Ore);
        assert_eq!(block.holder, Holder::Unowned);
    }

    #[test]
    fn counting_factory_clones_share_counts() {
        let counter = CountingBlockFactory::new();
        let mut handle = counter.clone();
        handle.create(ResourceType::Ingot, Placement::IDENTITY);
        handle.create(ResourceType::Ingot, Placement::IDENTITY);
        handle.create(ResourceType::Alloy, Placement::IDENTITY);
        assert_eq!(counter.created(ResourceType::Ingot), 2);
        assert_eq!(counter.total(), 3);
    }
}
