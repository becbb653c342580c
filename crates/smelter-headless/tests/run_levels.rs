//! Runs the bundled levels end to end.

use std::path::{Path, PathBuf};

use smelter_headless::{RunConfig, RunError, run_level};

fn level_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../smelter-data/levels")
        .join(name)
}

fn config(frames: u64) -> RunConfig {
    RunConfig {
        frames,
        dt: 0.25,
        ..RunConfig::default()
    }
}

#[test]
fn foundry_runs_and_produces() {
    let report = run_level(&level_dir("foundry"), &config(80)).unwrap();
    assert_eq!(report.frames, 80);
    assert!((report.seconds - 20.0).abs() < 1e-9);
    assert_eq!(report.buildings.len(), 3);

    let mine = report.buildings.iter().find(|b| b.name == "Mine").unwrap();
    assert!(mine.cycles > 0);
    let furnace = report.buildings.iter().find(|b| b.name == "Furnace").unwrap();
    assert!(furnace.cycles > 0);
    assert!(report.couriers.iter().any(|c| c.collected > 0));
}

#[test]
fn repeated_runs_agree() {
    let a = run_level(&level_dir("foundry"), &config(120)).unwrap();
    let b = run_level(&level_dir("foundry"), &config(120)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn couriers_can_be_disabled() {
    let mut cfg = config(40);
    cfg.couriers = false;
    let report = run_level(&level_dir("foundry"), &cfg).unwrap();
    assert!(report.couriers.iter().all(|c| c.delivered == 0 && c.collected == 0));
}

#[test]
fn report_renders_as_text_and_json() {
    let report = run_level(&level_dir("outpost"), &config(20)).unwrap();
    let text = report.to_string();
    assert!(text.starts_with("After 20 frames (5.00 s):"));
    assert!(text.contains("North Drill"));

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["frames"], 20);
    assert_eq!(json["buildings"].as_array().unwrap().len(), 2);
}

#[test]
fn bad_delta_is_rejected() {
    let mut cfg = config(1);
    cfg.dt = 0.0;
    assert!(matches!(
        run_level(&level_dir("foundry"), &cfg),
        Err(RunError::InvalidDelta(_))
    ));
}

#[test]
fn delta_outside_fixed_range_is_rejected() {
    for dt in [1e10, 1e-12, f64::NAN] {
        let mut cfg = config(1);
        cfg.dt = dt;
        assert!(
            matches!(run_level(&level_dir("foundry"), &cfg), Err(RunError::InvalidDelta(_))),
            "dt = {dt}"
        );
    }
}

#[test]
fn missing_level_reports_load_error() {
    let err = run_level(Path::new("/nonexistent/smelter-level"), &config(1)).unwrap_err();
    assert!(matches!(err, RunError::Load(_)));
}
