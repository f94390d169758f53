//! The authored map document.
//!
//! These types mirror the JSON schema one-to-one. They carry no
//! invariants of their own; [`MapDefinition::validate`] checks them and
//! [`RoomGraph::new`](crate::RoomGraph::new) refuses anything that fails.

use std::fmt;

use molehunt_protocol::{InteractableId, RoomId, SabotageKind};
use serde::{Deserialize, Serialize};

use crate::MapError;

// ---------------------------------------------------------------------------
// Interactables
// ---------------------------------------------------------------------------

/// What an interactable does when a player uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractableKind {
    /// Calls an emergency meeting.
    Button,
    /// Shows the movement log.
    Log,
    /// A task loyalists must complete.
    Task,
}

impl fmt::Display for InteractableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => write!(f, "button"),
            Self::Log => write!(f, "log"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Something a player can use inside a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactable {
    pub id: InteractableId,
    pub name: String,
    pub kind: InteractableKind,
    /// Verb shown to agents ("Align engine output", "Press button").
    pub action: String,
}

impl Interactable {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: InteractableKind,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: InteractableId::new(id),
            name: name.into(),
            kind,
            action: action.into(),
        }
    }

    pub fn task(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let action = format!("Complete {name}");
        Self::new(id, name, InteractableKind::Task, action)
    }

    pub fn button(id: impl Into<String>) -> Self {
        Self::new(id, "Emergency button", InteractableKind::Button, "Call meeting")
    }

    pub fn log(id: impl Into<String>) -> Self {
        Self::new(id, "Security log", InteractableKind::Log, "Read log")
    }
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// Layout coordinate. Debug metadata only; never used for validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A room on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Rooms reachable by walking. Must be mirrored in each target room.
    #[serde(default)]
    pub exits: Vec<RoomId>,
    #[serde(default)]
    pub interactables: Vec<Interactable>,
    #[serde(default)]
    pub position: Position,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(id),
            name: name.into(),
            exits: Vec::new(),
            interactables: Vec::new(),
            position: Position::default(),
        }
    }

    pub fn with_exit(mut self, to: impl Into<String>) -> Self {
        self.exits.push(RoomId::new(to));
        self
    }

    pub fn with_interactable(mut self, interactable: Interactable) -> Self {
        self.interactables.push(interactable);
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    /// Returns `true` if `to` is listed as an exit of this room.
    pub fn has_exit(&self, to: &RoomId) -> bool {
        self.exits.contains(to)
    }

    pub fn has_interactable_kind(&self, kind: InteractableKind) -> bool {
        self.interactables.iter().any(|i| i.kind == kind)
    }
}

/// An undirected vent connection. Only the covert role may use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VentLink {
    pub from: RoomId,
    pub to: RoomId,
}

/// Where a sabotage is triggered from and, optionally, where it's fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SabotageLocation {
    pub kind: SabotageKind,
    pub source: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<RoomId>,
}

impl SabotageLocation {
    /// The room a player must stand in to fix this sabotage.
    pub fn fix_room(&self) -> &RoomId {
        self.target.as_ref().unwrap_or(&self.source)
    }
}

// ---------------------------------------------------------------------------
// MapDefinition
// ---------------------------------------------------------------------------

/// A complete, authored map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    pub id: String,
    pub name: String,
    /// Rooms in authoring order. [`RoomGraph::rooms`](crate::RoomGraph::rooms)
    /// preserves it.
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub vents: Vec<VentLink>,
    #[serde(default)]
    pub sabotage_locations: Vec<SabotageLocation>,
    pub emergency_button_room: RoomId,
    pub logs_room: RoomId,
}

impl MapDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        emergency_button_room: impl Into<String>,
        logs_room: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rooms: Vec::new(),
            vents: Vec::new(),
            sabotage_locations: Vec::new(),
            emergency_button_room: RoomId::new(emergency_button_room),
            logs_room: RoomId::new(logs_room),
        }
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }

    pub fn with_vent(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.vents.push(VentLink {
            from: RoomId::new(from),
            to: RoomId::new(to),
        });
        self
    }

    pub fn with_sabotage(
        mut self,
        kind: SabotageKind,
        source: impl Into<String>,
        target: Option<&str>,
    ) -> Self {
        self.sabotage_locations.push(SabotageLocation {
            kind,
            source: RoomId::new(source),
            target: target.map(RoomId::from),
        });
        self
    }

    /// Parses a JSON map document and validates it.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let def: Self = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }
}
