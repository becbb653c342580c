//! Spatial placements and the locators that resolve them.
//!
//! Transfer animations interpolate between two [`Locator`]s that are
//! re-resolved every tick, so endpoints may move while a unit is in flight.

use crate::id::{BlockId, BuildingId, StorageId};
use glam::{Quat, Vec3};
use std::fmt;
use std::rc::Rc;

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// A world-space position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Placement {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Linear position, spherical orientation.
    pub fn lerp(&self, other: &Placement, t: f32) -> Placement {
        Placement {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }

    /// Map a placement expressed relative to `self` into world space.
    pub fn transform(&self, local: &Placement) -> Placement {
        Placement {
            position: self.position + self.rotation * local.position,
            rotation: self.rotation * local.rotation,
        }
    }

    /// Express a world-space placement relative to `self`.
    pub fn relative(&self, world: &Placement) -> Placement {
        let inverse = self.rotation.inverse();
        Placement {
            position: inverse * (world.position - self.position),
            rotation: inverse * world.rotation,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// A zero-argument lookup of a placement, evaluated on demand.
#[derive(Clone)]
pub enum Locator {
    /// A placement that never moves.
    Fixed(Placement),
    /// The current transform of a block.
    Block(BlockId),
    /// Where a building receives input blocks.
    BuildingInput(BuildingId),
    /// Where a building emits produced blocks.
    BuildingOutput(BuildingId),
    /// The slot for the next unit placed into a storage.
    StorageSlot(StorageId),
    /// Host-supplied accessor, e.g. a moving character.
    Dynamic(Rc<dyn Fn() -> Placement>),
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Fixed(p) => f.debug_tuple("Fixed").field(p).finish(),
            Locator::Block(id) => f.debug_tuple("Block").field(id).finish(),
            Locator::BuildingInput(id) => f.debug_tuple("BuildingInput").field(id).finish(),
            Locator::BuildingOutput(id) => f.debug_tuple("BuildingOutput").field(id).finish(),
            Locator::StorageSlot(id) => f.debug_tuple("StorageSlot").field(id).finish(),
            Locator::Dynamic(_) => write!(f, "Dynamic(<fn>)"),
        }
    }
}

/// Resolves locators against current world state.
pub trait LocatorResolver {
    /// `None` when the located entity no longer exists.
    fn resolve(&self, locator: &Locator) -> Option<Placement>;
}

/// Resolver for locators that do not need a world: `Fixed` and `Dynamic`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedResolver;

impl LocatorResolver for DetachedResolver {
    fn resolve(&self, locator: &Locator) -> Option<Placement> {
        match locator {
            Locator::Fixed(p) => Some(*p),
            Locator::Dynamic(f) => Some(f()),
            _ => None,
        }
    }
}
