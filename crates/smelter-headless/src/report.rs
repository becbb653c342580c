//! End-of-run summary of a level.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use smelter_core::fixed::{fixed64_to_f64, progress_ratio};
use smelter_core::id::BuildingId;
use smelter_core::resource::ResourceType;
use smelter_core::transfer_point::ResourceStorage;
use smelter_core::world::World;
use smelter_data::LoadedLevel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingReport {
    pub name: String,
    pub phase: String,
    /// Fraction of the current cycle done, in `[0, 1]`.
    pub progress: f32,
    pub input: u32,
    pub output: u32,
    pub cycles: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourierReport {
    pub name: String,
    pub carrying: u32,
    pub delivered: u64,
    pub collected: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub frames: u64,
    pub seconds: f64,
    pub buildings: Vec<BuildingReport>,
    pub couriers: Vec<CourierReport>,
    pub totals: Vec<(ResourceType, usize)>,
    pub in_flight: usize,
    pub log: Vec<String>,
}

/// Per-courier counters gathered while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourierTally {
    pub delivered: u64,
    pub collected: u64,
}

impl Report {
    pub fn collect(
        level: &LoadedLevel,
        cycles: &HashMap<BuildingId, u64>,
        tallies: &[CourierTally],
        log: Vec<String>,
    ) -> Self {
        let world = &level.world;
        let mut buildings: Vec<BuildingReport> = level
            .buildings
            .iter()
            .filter_map(|(name, id)| building_report(world, name, *id, cycles))
            .collect();
        buildings.sort_by(|a, b| a.name.cmp(&b.name));

        let couriers = level
            .couriers
            .iter()
            .zip(tallies.iter().copied().chain(std::iter::repeat(CourierTally::default())))
            .map(|(courier, tally)| CourierReport {
                name: courier.name.clone(),
                carrying: world.quantity(courier.inventory).unwrap_or(0),
                delivered: tally.delivered,
                collected: tally.collected,
            })
            .collect();

        Self {
            frames: world.frame(),
            seconds: fixed64_to_f64(world.time()),
            buildings,
            couriers,
            totals: ResourceType::ALL
                .iter()
                .map(|r| (*r, world.count_resource(*r)))
                .collect(),
            in_flight: world.in_flight_count(),
            log,
        }
    }
}

fn building_report(
    world: &World,
    name: &str,
    id: BuildingId,
    cycles: &HashMap<BuildingId, u64>,
) -> Option<BuildingReport> {
    let building = world.building(id)?;
    let processing = building.processing();
    let quantity = |storage| world.storage(storage).map_or(0, |s| s.quantity());
    Some(BuildingReport {
        name: name.to_string(),
        phase: format!("{:?}", building.phase()),
        progress: progress_ratio(processing.elapsed(), processing.recipe().time).clamp(0.0, 1.0),
        input: quantity(building.input_storage()),
        output: quantity(building.output_storage()),
        cycles: cycles.get(&id).copied().unwrap_or(0),
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "After {} frames ({:.2} s):", self.frames, self.seconds)?;
        for b in &self.buildings {
            writeln!(
                f,
                "  [{:>12}] phase={}, progress={:.2}, in={}, out={}, cycles={}",
                b.name, b.phase, b.progress, b.input, b.output, b.cycles
            )?;
        }
        for c in &self.couriers {
            writeln!(
                f,
                "  courier {:>8}: carrying={}, delivered={}, collected={}",
                c.name, c.carrying, c.delivered, c.collected
            )?;
        }
        let totals: Vec<String> = self.totals.iter().map(|(r, n)| format!("{r}={n}")).collect();
        writeln!(f, "  units: {} (in flight: {})", totals.join(", "), self.in_flight)?;
        if !self.log.is_empty() {
            writeln!(f, "  log:")?;
            for line in &self.log {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}
