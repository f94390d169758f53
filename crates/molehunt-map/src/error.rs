//! Error types for the map layer.
//!
//! Every variant here is fatal: a map that fails validation is a
//! deployment mistake, not a game event, so nothing is ever built from it.

use molehunt_protocol::{InteractableId, RoomId, SabotageKind};

use crate::InteractableKind;

/// Errors that make a map unusable.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The JSON document didn't match the map schema.
    #[error("map document could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required identifier was blank.
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),

    /// The map has no rooms at all.
    #[error("map {0} has no rooms")]
    NoRooms(String),

    #[error("room {0} is defined more than once")]
    DuplicateRoom(RoomId),

    /// Interactable ids are unique across the whole map, not per room.
    #[error("interactable {0} is defined more than once")]
    DuplicateInteractable(InteractableId),

    /// A lookup or exit named a room the map doesn't define.
    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),

    #[error("room {room} lists unknown exit {exit}")]
    UnknownExit { room: RoomId, exit: RoomId },

    #[error("room {0} lists itself as an exit")]
    SelfExit(RoomId),

    /// Exits must be authored in both directions.
    #[error("exit {from} -> {to} has no matching exit {to} -> {from}")]
    AsymmetricExit { from: RoomId, to: RoomId },

    #[error("vent link {from} <-> {to} references an unknown room")]
    UnknownVentRoom { from: RoomId, to: RoomId },

    #[error("vent link from {0} to itself")]
    SelfVent(RoomId),

    /// The emergency-button or logs room isn't on the map.
    #[error("designated {purpose} room {room} does not exist")]
    MissingDesignatedRoom { purpose: &'static str, room: RoomId },

    /// A designated room exists but lacks its interactable.
    #[error("room {room} has no {kind} interactable")]
    MissingInteractable { room: RoomId, kind: InteractableKind },

    #[error("sabotage location for {kind} references unknown room {room}")]
    UnknownSabotageRoom { kind: SabotageKind, room: RoomId },

    #[error("sabotage {0} has more than one location")]
    DuplicateSabotage(SabotageKind),
}
