//! Core identity and game-state types.
//!
//! Everything here is plain data that may be handed to the broadcast
//! layer, so every type derives `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player within a match.
///
/// A newtype over `String` rather than a bare string so a `RoomId` can
/// never be passed where a `PlayerId` is expected. Agents pick readable
/// ids ("loyalist-1", "mole"), so the wrapper stays a string instead of
/// an integer.
///
/// `#[serde(transparent)]` serializes `PlayerId("p1")` as just `"p1"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Builds an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A unique identifier for a room on the map ("council-room", "reactor").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A unique identifier for an interactable placed in a room.
///
/// Buttons, log terminals and tasks all share one id space, so a task
/// id is simply the id of its interactable (see [`TaskId`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractableId(pub String);

impl InteractableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InteractableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InteractableId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Task ids are the ids of Task-type interactables.
pub type TaskId = InteractableId;

// ---------------------------------------------------------------------------
// Roles and status
// ---------------------------------------------------------------------------

/// Which side a player is secretly on.
///
/// Exactly one variant is covert. Everything else in the engine asks
/// [`Role::is_covert`] rather than matching on the variant directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Completes tasks, hunts the moles.
    Loyalist,
    /// Sabotages, kills, cannot complete tasks.
    Mole,
}

impl Role {
    /// Returns `true` for the covert faction.
    pub fn is_covert(&self) -> bool {
        matches!(self, Self::Mole)
    }

    /// The faction this role wins with.
    pub fn faction(&self) -> Faction {
        match self {
            Self::Loyalist => Faction::Loyalists,
            Self::Mole => Faction::Moles,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loyalist => write!(f, "loyalist"),
            Self::Mole => write!(f, "mole"),
        }
    }
}

/// A player's life status.
///
/// `Dead` and `Ejected` are terminal: nothing moves a player back to
/// `Alive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Alive,
    Dead,
    Ejected,
}

impl PlayerStatus {
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => write!(f, "alive"),
            Self::Dead => write!(f, "dead"),
            Self::Ejected => write!(f, "ejected"),
        }
    }
}

/// A winning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Loyalists,
    Moles,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loyalists => write!(f, "loyalists"),
            Self::Moles => write!(f, "moles"),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The phase of a match.
///
/// ```text
/// Lobby → Round ⇄ Voting
///           │        │
///           └─→ GameOver ←┘
/// ```
///
/// - **Lobby**: players registered, nothing playable yet.
/// - **Round**: free movement, tasks, kills, sabotage.
/// - **Voting**: meeting in progress; only votes are accepted.
/// - **GameOver**: terminal. Some faction has won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Round,
    Voting,
    GameOver,
}

impl Phase {
    /// Returns `true` if moving from `self` to `target` is legal.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Lobby, Self::Round)
                | (Self::Round, Self::Voting)
                | (Self::Round, Self::GameOver)
                | (Self::Voting, Self::Round)
                | (Self::Voting, Self::GameOver)
        )
    }

    /// Returns `true` once the match has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Round => write!(f, "Round"),
            Self::Voting => write!(f, "Voting"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sabotage
// ---------------------------------------------------------------------------

/// The kinds of sabotage a mole can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SabotageKind {
    Lights,
    Comms,
    Reactor,
    Oxygen,
    Doors,
}

impl fmt::Display for SabotageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lights => write!(f, "lights"),
            Self::Comms => write!(f, "comms"),
            Self::Reactor => write!(f, "reactor"),
            Self::Oxygen => write!(f, "oxygen"),
            Self::Doors => write!(f, "doors"),
        }
    }
}
