//! Headless runner for smelter levels.
//!
//! Loads a level directory, drives its couriers, advances the world at a
//! fixed frame delta and summarizes the outcome in a [`report::Report`].

pub mod courier;
pub mod report;
pub mod runner;

pub use runner::{RunConfig, RunError, run_level};
