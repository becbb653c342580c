//! End-to-end production scenarios driven through the `World` API.

use smelter_core::building::BuildingPhase;
use smelter_core::event::{Event, EventKind};
use smelter_core::fixed::seconds;
use smelter_core::id::TransferPoint;
use smelter_core::resource::{Holder, ResourceType};
use smelter_core::storage::{StorageConfig, WarehouseRole};
use smelter_core::test_utils::*;

use std::cell::RefCell;
use std::rc::Rc;

// ===========================================================================
// Single building cycle
// ===========================================================================

#[test]
fn single_cycle_timeline() {
    let (mut world, log) = logged_world();
    let smelter = spawn_smelter(&mut world, smelt_recipe(2.0), 4);
    let input = input_of(&world, smelter);
    let output = output_of(&world, smelter);
    let ore = stock(&mut world, input, ResourceType::Ore, 1)[0];

    world.start_building(smelter).unwrap();
    assert_eq!(world.holder(ore), Some(Holder::InFlight { to: smelter.into() }));

    // t = 0.5: the ore arrives and is consumed.
    run_frames(&mut world, 1, 0.5);
    assert!(world.block(ore).is_none());
    assert_eq!(world.phase(smelter), Some(BuildingPhase::Producing));

    // t = 2.0: still producing.
    run_frames(&mut world, 3, 0.5);
    assert_eq!(world.events.total_emitted(EventKind::ProductionCompleted), 0);

    // t = 2.5: done; the ingot heads for the output and the next cycle
    // finds no ore.
    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.events.total_emitted(EventKind::ProductionCompleted), 1);
    assert_eq!(world.quantity(output), Some(0));
    assert_eq!(world.in_flight_count(), 1);
    assert!(log.contains("Production stopped: Smelter reason: NotEnoughResources"));

    // t = 3.0: the ingot lands in the output warehouse.
    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.quantity(output), Some(1));
    assert_eq!(world.count_resource(ResourceType::Ingot), 1);
    assert_eq!(world.phase(smelter), Some(BuildingPhase::AwaitingInputs));
}

#[test]
fn recipe_without_inputs_starts_immediately() {
    let (mut world, _) = logged_world();
    let mine = spawn_smelter(&mut world, mine_recipe(1.0), 4);

    world.start_building(mine).unwrap();
    assert_eq!(world.phase(mine), Some(BuildingPhase::Producing));
    assert!(world.building(mine).unwrap().transfers().is_empty());
    assert_eq!(world.in_flight_count(), 0);

    run_frames(&mut world, 2, 0.5);
    assert_eq!(world.count_resource(ResourceType::Ore), 1);
    assert_eq!(world.phase(mine), Some(BuildingPhase::Producing));
}

#[test]
fn two_input_recipe_requests_each_type_once() {
    let (mut world, _) = logged_world();
    let foundry = spawn_smelter(&mut world, alloy_recipe(1.0), 4);
    let input = input_of(&world, foundry);
    stock(&mut world, input, ResourceType::Ore, 2);
    stock(&mut world, input, ResourceType::Ingot, 2);

    world.start_building(foundry).unwrap();
    assert_eq!(world.in_flight_count(), 2);
    assert_eq!(world.quantity(input), Some(2));

    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.phase(foundry), Some(BuildingPhase::Producing));
    assert_eq!(world.events.total_emitted(EventKind::BlockConsumed), 2);
}

#[test]
fn partial_inputs_stop_until_restocked() {
    let (mut world, log) = logged_world();
    let foundry = spawn_smelter(&mut world, alloy_recipe(1.0), 4);
    let input = input_of(&world, foundry);
    stock(&mut world, input, ResourceType::Ore, 1);

    world.start_building(foundry).unwrap();
    assert!(log.contains("NotEnoughResources"));
    run_frames(&mut world, 2, 0.5);
    assert_eq!(world.phase(foundry), Some(BuildingPhase::AwaitingInputs));
    assert_eq!(world.building(foundry).unwrap().input_blocks().len(), 1);

    stock(&mut world, input, ResourceType::Ingot, 1);
    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.phase(foundry), Some(BuildingPhase::Producing));
}

// ===========================================================================
// Output stalls
// ===========================================================================

#[test]
fn full_output_stalls_without_duplicating_blocks() {
    let (mut world, log, factory) = counted_world();
    let mine = spawn_smelter(&mut world, mine_recipe(1.0), 2);
    let output = output_of(&world, mine);

    world.start_building(mine).unwrap();
    run_frames(&mut world, 6, 0.5);
    assert_eq!(world.quantity(output), Some(2));
    assert_eq!(factory.created(ResourceType::Ore), 3);
    assert_eq!(world.phase(mine), Some(BuildingPhase::AwaitingOutputSpace));
    assert!(log.contains("Production stopped: Smelter reason: FullOutput"));

    run_frames(&mut world, 20, 0.5);
    assert_eq!(factory.created(ResourceType::Ore), 3);
    assert_eq!(world.count_resource(ResourceType::Ore), 3);
}

#[test]
fn freed_output_space_resumes_dispatch_then_production() {
    let (mut world, _, factory) = counted_world();
    let mine = spawn_smelter(&mut world, mine_recipe(1.0), 2);
    let output = output_of(&world, mine);
    world.start_building(mine).unwrap();
    run_frames(&mut world, 6, 0.5);

    let resumed = Rc::new(RefCell::new(0u32));
    let seen = resumed.clone();
    world.events.on(
        EventKind::ProductionResumed,
        Box::new(move |_| *seen.borrow_mut() += 1),
    );

    let taken = world.contents(output).unwrap()[0].id;
    assert!(world.remove_block(output.into(), taken).unwrap());
    assert_eq!(world.phase(mine), Some(BuildingPhase::Producing));
    assert_eq!(world.in_flight_count(), 1);

    run_frames(&mut world, 1, 0.5);
    assert_eq!(*resumed.borrow(), 1);
    assert_eq!(world.quantity(output), Some(2));
    assert_eq!(factory.created(ResourceType::Ore), 3);
}

#[test]
fn withdrawn_pending_output_does_not_wedge_the_building() {
    let (mut world, _, factory) = counted_world();
    let mine = spawn_smelter(&mut world, mine_recipe(1.0), 1);
    let output = output_of(&world, mine);
    world.start_building(mine).unwrap();
    run_frames(&mut world, 4, 0.5);
    assert_eq!(world.phase(mine), Some(BuildingPhase::AwaitingOutputSpace));
    assert_eq!(factory.created(ResourceType::Ore), 2);

    let pending = world.building(mine).unwrap().output_blocks()[0].id;
    assert!(world.remove_block(mine.into(), pending).unwrap());
    assert!(world.building(mine).unwrap().produced().is_empty());
    assert_eq!(world.holder(pending), Some(Holder::Unowned));

    let stored = world.contents(output).unwrap()[0].id;
    world.remove_block(output.into(), stored).unwrap();
    assert_eq!(world.phase(mine), Some(BuildingPhase::Producing));

    run_frames(&mut world, 2, 0.5);
    assert_eq!(factory.created(ResourceType::Ore), 3);
    assert_eq!(world.in_flight_count(), 1);
    run_frames(&mut world, 2, 0.5);
    assert_eq!(world.quantity(output), Some(1));
}

#[test]
fn stalled_smelter_restarts_with_delivered_input() {
    let (mut world, _, factory) = counted_world();
    let smelter = spawn_smelter(&mut world, smelt_recipe(1.0), 1);
    let input = input_of(&world, smelter);
    let output = output_of(&world, smelter);
    stock(&mut world, input, ResourceType::Ore, 1);
    world.spawn_block_into(input, ResourceType::Ore).unwrap_err();

    world.start_building(smelter).unwrap();
    // Refill after the first request emptied the input.
    stock(&mut world, input, ResourceType::Ore, 1);
    run_frames(&mut world, 12, 0.5);
    assert_eq!(world.quantity(output), Some(1));
    assert_eq!(factory.created(ResourceType::Ingot), 2);
    assert_eq!(world.phase(smelter), Some(BuildingPhase::AwaitingOutputSpace));

    let ingot = world.contents(output).unwrap()[0].id;
    world.remove_block(output.into(), ingot).unwrap();
    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.quantity(output), Some(1));
    assert_eq!(world.phase(smelter), Some(BuildingPhase::AwaitingInputs));
}

// ===========================================================================
// Ownership and transfer protocol
// ===========================================================================

#[test]
fn block_in_flight_belongs_to_no_point() {
    let (mut world, _) = logged_world();
    let smelter = spawn_smelter(&mut world, smelt_recipe(1.0), 4);
    let input = input_of(&world, smelter);
    let ore = stock(&mut world, input, ResourceType::Ore, 1)[0];
    assert_eq!(world.points_holding(ore), vec![TransferPoint::Storage(input)]);

    world.start_building(smelter).unwrap();
    assert!(world.points_holding(ore).is_empty());
    assert!(!world.contains(input, ResourceType::Ore));
}

#[test]
fn transfer_to_takes_last_while_try_transfer_scans_first() {
    let (mut world, _) = logged_world();
    let shelf = world.spawn_inventory(StorageConfig::new(4));
    let bag = world.spawn_inventory(StorageConfig::new(4));
    let ingot_rack = world.spawn_warehouse(WarehouseRole::Input, [ResourceType::Ingot], StorageConfig::new(4));
    let first_ore = world.spawn_block_into(shelf, ResourceType::Ore).unwrap();
    let ingot = world.spawn_block_into(shelf, ResourceType::Ingot).unwrap();
    let last_ore = world.spawn_block_into(shelf, ResourceType::Ore).unwrap();

    let lifo = world
        .transfer_to(shelf.into(), bag.into(), ResourceType::Ore)
        .unwrap();
    assert_eq!(lifo.payload(), last_ore);

    let scan = world.try_transfer_to(shelf, ingot_rack).unwrap();
    assert_eq!(scan.payload(), ingot);

    let scan = world.try_transfer_to(shelf, bag).unwrap();
    assert_eq!(scan.payload(), first_ore);
    assert!(world.try_transfer_to(shelf, bag).is_none());
}

#[test]
fn missing_unit_yields_no_operation() {
    let (mut world, _) = logged_world();
    let a = world.spawn_inventory(StorageConfig::new(2));
    let b = world.spawn_inventory(StorageConfig::new(2));
    assert!(world.transfer_to(a.into(), b.into(), ResourceType::Alloy).is_none());
    assert!(world.try_transfer_to(a, b).is_none());
    assert_eq!(world.events.total_emitted(EventKind::TransferStarted), 0);
}

// ===========================================================================
// Courier interaction
// ===========================================================================

#[test]
fn courier_feeds_input_and_collects_output() {
    let (mut world, _) = logged_world();
    let smelter = spawn_smelter(&mut world, smelt_recipe(1.0), 4);
    let input = input_of(&world, smelter);
    let output = output_of(&world, smelter);
    let courier = world.spawn_inventory(StorageConfig::new(3));
    stock(&mut world, courier, ResourceType::Ore, 2);
    world.start_building(smelter).unwrap();

    assert!(world.try_transfer_first_allowed(courier, input).unwrap());
    run_frames(&mut world, 1, 0.5);
    assert!(world.try_transfer_first_allowed(courier, input).unwrap());
    run_frames(&mut world, 12, 0.5);
    assert_eq!(world.quantity(output), Some(2));

    assert!(world.try_transfer_first_allowed(courier, output).unwrap());
    run_frames(&mut world, 1, 0.5);
    assert_eq!(world.quantity(output), Some(1));
    assert!(world.contains(courier, ResourceType::Ingot));
}

#[test]
fn stopped_event_carries_reason() {
    let (mut world, _) = logged_world();
    let smelter = spawn_smelter(&mut world, smelt_recipe(1.0), 4);

    let reasons = Rc::new(RefCell::new(Vec::new()));
    let sink = reasons.clone();
    world.events.on(
        EventKind::ProductionStopped,
        Box::new(move |event| {
            if let Event::ProductionStopped { reason, .. } = event {
                sink.borrow_mut().push(*reason);
            }
        }),
    );

    world.start_building(smelter).unwrap();
    world.update(seconds(0.1));
    assert_eq!(
        reasons.borrow().as_slice(),
        &[smelter_core::building::StopReason::NotEnoughResources]
    );
}
