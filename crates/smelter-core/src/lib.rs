//! Smelter Core -- the simulation for resource-processing levels.
//!
//! Buildings turn input resource units into output units following a
//! [`recipe::ResourceRecipe`]. Each building owns an input and an output
//! warehouse; units move between buildings, warehouses and player
//! inventories only through animated [`transfer::TransferOperation`]s, one
//! unit at a time.
//!
//! # Frame Pipeline
//!
//! Each call to [`world::World::update`] advances the level by one frame:
//!
//! 1. **Buildings** -- Advance processing, then step transfers the building
//!    started in earlier frames.
//! 2. **Inventories** -- Step each inventory's single transfer.
//! 3. **Notifications** -- Storage changes wake the owning building.
//! 4. **Events** -- Deliver buffered events to listeners.
//!
//! # Ownership Rule
//!
//! A unit is held by at most one transfer point at any time. While a
//! transfer carries it, it is held by none:
//!
//! ```rust,ignore
//! let op = world.transfer_to(from, to, ResourceType::Ore).unwrap();
//! assert!(world.points_holding(op.payload()).is_empty());
//! ```
//!
//! # Key Types
//!
//! - [`world::World`] -- Arena of buildings, storages and blocks; runs the
//!   production control loop.
//! - [`building::Building`] -- A producer with its processing and transfers.
//! - [`storage::Storage`] -- Warehouses (typed, role-bound) and inventories.
//! - [`processing::ResourceProcessing`] -- Timed recipe execution.
//! - [`transfer::TransferOperation`] -- Interpolated single-unit move.
//! - [`placement::Locator`] -- Late-bound endpoint of a transfer.
//! - [`fixed::Seconds`] -- Q32.32 fixed-point seconds for deterministic timers.
//! - [`event::EventBus`] -- Subscription-based event bus with buffered delivery.

pub mod building;
pub mod error;
pub mod event;
pub mod factory;
pub mod fixed;
pub mod id;
pub mod log;
pub mod placement;
pub mod processing;
pub mod recipe;
pub mod resource;
pub mod storage;
pub mod transfer;
pub mod transfer_point;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
