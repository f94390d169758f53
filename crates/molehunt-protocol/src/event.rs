//! Match events and their audience.
//!
//! The engine never performs I/O. Every state change it wants the world to
//! know about is queued as a `(Recipient, MatchEvent)` pair; the front end
//! drains the queue and pushes each event down the right player channels.

use serde::{Deserialize, Serialize};

use crate::{Faction, InteractableId, Phase, PlayerId, Role, RoomId, SabotageKind};

/// Who should receive an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the match.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Only players on the covert side.
    Moles,
}

/// Something observable happened in the match.
///
/// Internally tagged, so `PhaseChanged` serializes as
/// `{"type": "PhaseChanged", "from": "round", "to": "voting"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchEvent {
    PhaseChanged {
        from: Phase,
        to: Phase,
    },

    RoundStarted {
        round: u32,
        started_at_ms: u64,
    },

    PlayerMoved {
        player_id: PlayerId,
        from: RoomId,
        to: RoomId,
        via_vent: bool,
    },

    TaskCompleted {
        player_id: PlayerId,
        task_id: InteractableId,
    },

    /// Aggregate progress over living loyalists.
    TaskProgress {
        completed: usize,
        required: usize,
    },

    SabotageStarted {
        kind: SabotageKind,
        triggered_by: PlayerId,
    },

    SabotageResolved {
        kind: SabotageKind,
        /// `None` when the sabotage ran out on its own.
        resolved_by: Option<PlayerId>,
    },

    PlayerKilled {
        player_id: PlayerId,
        room: RoomId,
    },

    BodyReported {
        reporter: PlayerId,
        body_of: PlayerId,
        room: RoomId,
    },

    EmergencyCalled {
        caller: PlayerId,
    },

    VoteCast {
        voter: PlayerId,
    },

    PlayerEjected {
        player_id: PlayerId,
        role: Role,
    },

    /// Voting closed with nobody ejected (tie or skip).
    NoEjection,

    GameOver {
        winner: Faction,
        reason: String,
    },
}
