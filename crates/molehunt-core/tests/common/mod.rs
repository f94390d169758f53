//! Shared fixtures for the rules integration tests.

#![allow(dead_code)]

use molehunt_core::{MatchState, PlayerSeed};
use molehunt_map::{Interactable, MapDefinition, Room, RoomGraph};
use molehunt_protocol::{PlayerId, RoomId, SabotageKind, TaskId};

/// A four-room test map with a three-task catalog.
///
/// ```text
///   security ── hallway ── council-room
///                  │            ┆ (vent)
///               workshop ┄┄┄┄┄┄┘
/// ```
pub fn test_map() -> MapDefinition {
    MapDefinition::new("test-map", "Test Map", "council-room", "security")
        .with_room(
            Room::new("council-room", "Council Room")
                .with_exit("hallway")
                .with_interactable(Interactable::button("emergency-button"))
                .with_interactable(Interactable::task("task-1", "Swipe card")),
        )
        .with_room(
            Room::new("hallway", "Hallway")
                .with_exit("council-room")
                .with_exit("security")
                .with_exit("workshop"),
        )
        .with_room(
            Room::new("security", "Security")
                .with_exit("hallway")
                .with_interactable(Interactable::log("security-log"))
                .with_interactable(Interactable::task("task-2", "Check cameras")),
        )
        .with_room(
            Room::new("workshop", "Workshop")
                .with_exit("hallway")
                .with_interactable(Interactable::task("task-3", "Fix wiring")),
        )
        .with_vent("workshop", "council-room")
        .with_sabotage(SabotageKind::Lights, "workshop", Some("security"))
}

pub fn rooms() -> RoomGraph {
    RoomGraph::new(test_map()).unwrap()
}

/// `loyalist-1..=n` plus a single `mole`.
pub fn roster(loyalists: usize) -> Vec<PlayerSeed> {
    let mut seeds: Vec<PlayerSeed> = (1..=loyalists)
        .map(|i| PlayerSeed::loyalist(format!("loyalist-{i}")))
        .collect();
    seeds.push(PlayerSeed::mole("mole"));
    seeds
}

/// Match state already in round 1, started at t=0.
pub fn round_state(loyalists: usize) -> MatchState {
    let mut state = MatchState::new(rooms(), roster(loyalists)).unwrap();
    state.begin_round(0).unwrap();
    state
}

pub fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}

pub fn rid(id: &str) -> RoomId {
    RoomId::from(id)
}

pub fn tid(id: &str) -> TaskId {
    TaskId::from(id)
}

pub const CATALOG: [&str; 3] = ["task-1", "task-2", "task-3"];
