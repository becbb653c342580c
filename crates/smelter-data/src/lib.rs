//! Level data for the smelter simulation.
//!
//! A level directory holds three data files, each in RON, JSON or TOML:
//! `recipes` (named recipes), `buildings` (named building templates) and
//! `level` (placed buildings, their starting stock and couriers).
//! [`load_level`] reads them, resolves names and returns a populated
//! [`World`](smelter_core::world::World).

pub mod level;
pub mod loader;
pub mod schema;

pub use level::{Courier, LoadedLevel, load_level, load_level_with};
pub use loader::DataLoadError;
