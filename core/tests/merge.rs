//! Merge policy tests — partial updates from peers.

use ants_core::{
    command::ChoreoCommand,
    engine::Choreographer,
    error::ChoreoError,
    event::{ChoreoEvent, UpdateSource},
    position::{Point, PositionStrategy},
    state::{AntPatch, AntState},
};
use serde_json::json;

fn sample_state() -> AntState {
    AntState {
        pos:   Point::new(12.5, 40.0),
        color: "hsl(200,50%,60%)".into(),
        size:  8.0,
    }
}

#[test]
fn empty_patch_is_identity() {
    let state = sample_state();
    for submitted in [json!({}), json!({ "speed": 3 }), json!(42), json!(null), json!("pos")] {
        let patch = AntPatch::from_value(&submitted);
        assert!(patch.is_empty(), "{submitted} should carry no fields");
        assert_eq!(state.merge(&patch), state, "merging {submitted} changed the state");
    }
}

#[test]
fn size_only_patch_touches_only_size() {
    let state = sample_state();
    let merged = state.merge(&AntPatch::default().with_size(12.0));

    assert_eq!(merged.size, 12.0);
    assert_eq!(
        serde_json::to_vec(&merged.pos).unwrap(),
        serde_json::to_vec(&state.pos).unwrap()
    );
    assert_eq!(merged.color.as_bytes(), state.color.as_bytes());
}

#[test]
fn every_field_overwrites_when_present() {
    let state = sample_state();
    let patch = AntPatch::from_value(&json!({
        "pos":   { "x": 1.0, "y": 2.0 },
        "color": "hsl(10,90%,60%)",
        "size":  3.5
    }));
    let merged = state.merge(&patch);

    assert_eq!(merged.pos, Point::new(1.0, 2.0));
    assert_eq!(merged.color, "hsl(10,90%,60%)");
    assert_eq!(merged.size, 3.5);
}

// Current policy: a zero size is indistinguishable from "not sent".
// If that ever changes on purpose, this test should change with it.
#[test]
fn size_zero_is_treated_as_absent() {
    let state = sample_state();
    let merged = state.merge(&AntPatch::from_value(&json!({ "size": 0 })));
    assert_eq!(merged.size, 8.0, "size 0 should not overwrite");

    let merged = state.merge(&AntPatch::default().with_size(0.0));
    assert_eq!(merged.size, 8.0, "size 0 built in code should not overwrite either");
}

#[test]
fn empty_colour_is_treated_as_absent() {
    let state = sample_state();
    let merged = state.merge(&AntPatch::from_value(&json!({ "color": "" })));
    assert_eq!(merged.color, state.color);
}

#[test]
fn origin_position_and_negative_size_are_present() {
    let state = sample_state();
    let merged = state.merge(&AntPatch::from_value(&json!({
        "pos":  { "x": 0, "y": 0 },
        "size": -2
    })));
    assert_eq!(merged.pos, Point::new(0.0, 0.0), "origin is a real position");
    assert_eq!(merged.size, -2.0, "negative sizes are stored verbatim");
}

#[test]
fn wrongly_shaped_fields_are_ignored() {
    let state = sample_state();
    let merged = state.merge(&AntPatch::from_value(&json!({
        "pos":   { "x": "left" },
        "color": 7,
        "size":  "big"
    })));
    assert_eq!(merged, state);
}

#[test]
fn peer_set_returns_and_publishes_merged_value() {
    let mut choreo = Choreographer::build_test("merge-peer".into(), 5).expect("build");
    let before = choreo.registry().get(1).unwrap().state.clone();

    let (authoritative, events) = choreo
        .handle_set("ants/#1", &json!({ "size": 20 }))
        .expect("set");

    let after = choreo.registry().get(1).unwrap().state.clone();
    assert_eq!(after.size, 20.0);
    assert_eq!(after.pos, before.pos);
    assert_eq!(after.color, before.color);
    assert_eq!(authoritative, after.to_value().unwrap());
    assert_eq!(choreo.substrate().value("ants/#1"), Some(&authoritative));

    assert_eq!(events.len(), 1, "a set reports only its own update");
    assert!(events.iter().any(|e| matches!(
        e,
        ChoreoEvent::AntUpdated { ant_id: 1, source: UpdateSource::Peer, .. }
    )));
}

#[test]
fn peer_set_events_do_not_leak_into_later_calls() {
    let mut choreo = Choreographer::build_test("merge-no-leak".into(), 5).expect("build");
    for i in 0..1000 {
        choreo
            .handle_set("ants/#0", &json!({ "size": i + 1 }))
            .expect("set");
    }

    let events = choreo.invoke(ChoreoCommand::Add).expect("add");
    let from_peers = events
        .iter()
        .filter(|e| matches!(e, ChoreoEvent::AntUpdated { source: UpdateSource::Peer, .. }))
        .count();
    assert_eq!(from_peers, 0, "earlier peer sets came back from invoke");
    assert_eq!(events.len(), 2, "expected CommandInvoked + AntCreated, got {events:?}");
}

#[test]
fn direct_operations_do_not_leak_into_later_calls() {
    let mut choreo = Choreographer::build_test("merge-direct".into(), 5).expect("build");
    choreo.add_one().expect("add");
    choreo.remove_last().expect("remove");
    choreo.stagger(PositionStrategy::Center, 1.0, None).expect("stagger");

    let events = choreo.invoke(ChoreoCommand::SetDelay { delay: 4.0 }).expect("set delay");
    assert!(
        events.iter().all(|e| matches!(
            e,
            ChoreoEvent::CommandInvoked { .. } | ChoreoEvent::DelayChanged { .. }
        )),
        "invoke returned events from earlier calls: {events:?}"
    );

    // Still journalled even though nobody collected them.
    assert_eq!(choreo.store().event_count("merge-direct", "ant_removed").unwrap(), 1);
    assert_eq!(choreo.store().event_count("merge-direct", "stagger_scheduled").unwrap(), 1);
}

#[test]
fn peer_set_on_unknown_path_is_rejected() {
    let mut choreo = Choreographer::build_test("merge-unknown".into(), 5).expect("build");
    let err = choreo.handle_set("ants/#99", &json!({ "size": 3 })).unwrap_err();
    assert!(matches!(err, ChoreoError::UnknownState { .. }), "got {err}");
}
