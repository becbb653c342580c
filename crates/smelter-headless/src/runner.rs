//! Fixed-step level runner.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use smelter_core::event::{Event, EventKind};
use smelter_core::factory::PlainBlockFactory;
use smelter_core::fixed::{Seconds, checked_seconds};
use smelter_core::id::BuildingId;
use smelter_core::log::{DEFAULT_LOG_LINES, RingLog};
use smelter_data::{DataLoadError, load_level_with};

use crate::courier::{CourierAction, step_courier};
use crate::report::{CourierTally, Report};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error("frame delta must be a positive number of seconds within the simulation range, got {0}")]
    InvalidDelta(f64),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub frames: u64,
    /// Seconds per frame.
    pub dt: f64,
    /// Drive the level's couriers each frame.
    pub couriers: bool,
    /// Game log lines kept for the report.
    pub log_lines: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            dt: 1.0 / 60.0,
            couriers: true,
            log_lines: DEFAULT_LOG_LINES,
        }
    }
}

/// Load `dir`, run it for `config.frames` frames and report the result.
pub fn run_level(dir: &Path, config: &RunConfig) -> Result<Report, RunError> {
    let dt = checked_seconds(config.dt)
        .filter(|dt| *dt > Seconds::ZERO)
        .ok_or(RunError::InvalidDelta(config.dt))?;

    let log = RingLog::new(config.log_lines);
    let mut level = load_level_with(dir, Box::new(log.clone()), Box::new(PlainBlockFactory))?;

    let cycles: Rc<RefCell<HashMap<BuildingId, u64>>> = Rc::default();
    let sink = cycles.clone();
    level.world.events.on(
        EventKind::ProductionCompleted,
        Box::new(move |event| {
            if let Event::ProductionCompleted { building, .. } = event {
                *sink.borrow_mut().entry(*building).or_insert(0) += 1;
            }
        }),
    );

    let mut tallies = vec![CourierTally::default(); level.couriers.len()];
    let span = tracing::info_span!("run", dir = %dir.display(), frames = config.frames);
    let _guard = span.enter();
    for _ in 0..config.frames {
        if config.couriers {
            for (courier, tally) in level.couriers.iter().zip(tallies.iter_mut()) {
                match step_courier(&mut level.world, courier) {
                    Ok(CourierAction::Delivered) => tally.delivered += 1,
                    Ok(CourierAction::Collected) => tally.collected += 1,
                    Ok(CourierAction::Busy | CourierAction::Idle) => {}
                    Err(err) => tracing::warn!(courier = %courier.name, %err, "courier step failed"),
                }
            }
        }
        level.world.update(dt);
    }

    let cycles = cycles.borrow().clone();
    Ok(Report::collect(&level, &cycles, &tallies, log.lines()))
}
