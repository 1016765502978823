//! Staggered scheduling tests — offsets, liveness, fire-time reads.

use ants_core::{
    engine::Choreographer,
    event::{ChoreoEvent, UpdateSource},
    position::PositionStrategy,
    substrate::LoopbackSubstrate,
    types::AntId,
};
use serde_json::json;

fn build(run_id: &str) -> Choreographer<LoopbackSubstrate> {
    Choreographer::build_test(run_id.to_string(), 0x5EED).expect("build test controller")
}

fn updated_ids(events: &[ChoreoEvent]) -> Vec<AntId> {
    events
        .iter()
        .filter_map(|e| match e {
            ChoreoEvent::AntUpdated { ant_id, source: UpdateSource::Stagger, .. } => Some(*ant_id),
            _ => None,
        })
        .collect()
}

#[test]
fn offsets_are_index_times_delay_for_every_strategy() {
    for strategy in [
        PositionStrategy::Uniform,
        PositionStrategy::Ring,
        PositionStrategy::Edge,
        PositionStrategy::Center,
    ] {
        let mut choreo = build("stagger-offsets");
        let updates = choreo.stagger(strategy, 10.0, None).expect("stagger");

        let ids: Vec<AntId> = updates.iter().map(|u| u.ant_id).collect();
        let offsets: Vec<f64> = updates.iter().map(|u| u.offset).collect();
        assert_eq!(ids, vec![0, 1, 2], "{strategy:?}: wrong order");
        assert_eq!(offsets, vec![0.0, 10.0, 20.0], "{strategy:?}: wrong offsets");
    }
}

#[test]
fn updates_fire_in_registry_order_at_their_offsets() {
    let mut choreo = build("stagger-fire-times");
    choreo.stagger(PositionStrategy::Ring, 10.0, None).unwrap();

    assert_eq!(updated_ids(&choreo.run_until(0.0).unwrap()), vec![0]);
    assert_eq!(updated_ids(&choreo.run_until(9.9).unwrap()), Vec::<AntId>::new());
    assert_eq!(updated_ids(&choreo.run_until(10.0).unwrap()), vec![1]);
    assert_eq!(updated_ids(&choreo.run_until(30.0).unwrap()), vec![2]);
    assert_eq!(choreo.pending_timers(), 0);
}

#[test]
fn removed_ant_update_is_a_silent_no_op() {
    let mut choreo = build("stagger-stale");
    choreo.stagger(PositionStrategy::Uniform, 10.0, None).unwrap();
    choreo.remove_last().unwrap(); // ant 2

    let events = choreo.advance_by(25.0).expect("stale fire must not error");

    assert_eq!(updated_ids(&events), vec![0, 1], "each live ant moves exactly once");
    assert!(events
        .iter()
        .any(|e| matches!(e, ChoreoEvent::StaleUpdateSkipped { ant_id: 2, .. })));
    assert!(!choreo.substrate().is_published("ants/#2"));
}

#[test]
fn ants_added_after_the_call_are_not_moved() {
    let mut choreo = build("stagger-late-add");
    choreo.stagger(PositionStrategy::Edge, 5.0, None).unwrap();
    let late = choreo.add_one().unwrap();
    let spawned = choreo.registry().get(late).unwrap().state.clone();

    let events = choreo.run_until_idle().unwrap();

    assert!(!updated_ids(&events).contains(&late));
    assert_eq!(choreo.registry().get(late).unwrap().state, spawned);
}

#[test]
fn colour_and_size_are_read_when_the_timer_fires() {
    let mut choreo = build("stagger-fire-read");
    choreo.stagger(PositionStrategy::Ring, 10.0, None).unwrap();

    // Ant 1 fires at t=10; change it in between.
    choreo.run_until(5.0).unwrap();
    choreo
        .handle_set("ants/#1", &json!({ "color": "hsl(1,50%,60%)", "size": 20 }))
        .unwrap();
    choreo.run_until(15.0).unwrap();

    let ant = &choreo.registry().get(1).unwrap().state;
    assert_eq!(ant.color, "hsl(1,50%,60%)");
    assert_eq!(ant.size, 20.0);
}

#[test]
fn size_override_replaces_size_and_keeps_colour() {
    let mut choreo = build("stagger-override");
    let colours: Vec<String> = choreo.registry().iter().map(|a| a.state.color.clone()).collect();

    choreo.stagger(PositionStrategy::Center, 1.0, Some(3.0)).unwrap();
    choreo.run_until_idle().unwrap();

    for (ant, colour) in choreo.registry().iter().zip(&colours) {
        assert_eq!(ant.state.size, 3.0);
        assert_eq!(&ant.state.color, colour);
        assert_eq!(ant.state.pos.x, 50.0);
        assert_eq!(ant.state.pos.y, 50.0);
    }
}

#[test]
fn zero_delay_puts_every_update_on_the_same_instant() {
    let mut choreo = build("stagger-zero");
    let updates = choreo.stagger(PositionStrategy::Uniform, 0.0, None).unwrap();
    assert!(updates.iter().all(|u| u.fire_at == 0.0));

    let events = choreo.run_until(0.0).unwrap();
    assert_eq!(updated_ids(&events).len(), 3);
}

#[test]
fn each_fire_draws_a_fresh_position() {
    let mut choreo = build("stagger-fresh");
    choreo.stagger(PositionStrategy::Uniform, 0.0, None).unwrap();
    choreo.run_until_idle().unwrap();

    let a = choreo.registry().get(0).unwrap().state.pos;
    let b = choreo.registry().get(1).unwrap().state.pos;
    assert_ne!(a, b, "positions must not be precomputed once per call");
}
