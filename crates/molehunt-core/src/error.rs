//! Error types for the rules layer.
//!
//! Two very different kinds of failure live here:
//!
//! - [`RuleViolation`]: an action was refused. Routine and frequent; the
//!   caller forwards it to the player and carries on.
//! - [`MatchError`]: the match couldn't be built at all. Fatal, and
//!   always a deployment mistake (bad map, bad roster).

use std::fmt;

use molehunt_map::MapError;
use molehunt_protocol::{PlayerId, RoomId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RuleViolation
// ---------------------------------------------------------------------------

/// The closed set of reasons an action can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PlayerNotFound,
    PlayerNotAlive,
    WrongRoom,
    WarmUpActive,
    SabotageActive,
    AlreadyUsed,
    AlreadyCompleted,
    WrongRole,
    WrongPhase,
    TaskFailed,
    IllegalMove,
    KillOnCooldown,
    InvalidTarget,
    NoActiveSabotage,
    BodyNotFound,
    AlreadyVoted,
}

impl ViolationKind {
    /// Stable machine-readable tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PlayerNotFound => "player_not_found",
            Self::PlayerNotAlive => "player_not_alive",
            Self::WrongRoom => "wrong_room",
            Self::WarmUpActive => "warm_up_active",
            Self::SabotageActive => "sabotage_active",
            Self::AlreadyUsed => "already_used",
            Self::AlreadyCompleted => "already_completed",
            Self::WrongRole => "wrong_role",
            Self::WrongPhase => "wrong_phase",
            Self::TaskFailed => "task_failed",
            Self::IllegalMove => "illegal_move",
            Self::KillOnCooldown => "kill_on_cooldown",
            Self::InvalidTarget => "invalid_target",
            Self::NoActiveSabotage => "no_active_sabotage",
            Self::BodyNotFound => "body_not_found",
            Self::AlreadyVoted => "already_voted",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An action was refused.
///
/// `kind` is for code that branches on the reason; `message` is the
/// human-readable phrase sent to the player. Messages always contain the
/// phrase agents match on ("not found", "not alive", "council room",
/// "warm-up", "sabotage", "already used", "already completed",
/// "only loyalists").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuleViolation {
    pub kind: ViolationKind,
    pub message: String,
}

impl RuleViolation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn player_not_found(player_id: &PlayerId) -> Self {
        Self::new(
            ViolationKind::PlayerNotFound,
            format!("Player {player_id} not found"),
        )
    }

    pub fn player_not_alive() -> Self {
        Self::new(ViolationKind::PlayerNotAlive, "Player is not alive")
    }

    pub fn not_in_council_room(button_room: &RoomId) -> Self {
        Self::new(
            ViolationKind::WrongRoom,
            format!(
                "Emergency meetings can only be called from the council room ({button_room})"
            ),
        )
    }

    pub fn warm_up(remaining_ms: u64) -> Self {
        Self::new(
            ViolationKind::WarmUpActive,
            format!(
                "Emergency meetings are locked during the warm-up period ({remaining_ms}ms left)"
            ),
        )
    }

    pub fn meeting_during_sabotage() -> Self {
        Self::new(
            ViolationKind::SabotageActive,
            "Cannot call an emergency meeting while a sabotage is active",
        )
    }

    pub fn sabotage_already_active() -> Self {
        Self::new(
            ViolationKind::SabotageActive,
            "A sabotage is already active",
        )
    }

    pub fn meeting_already_used() -> Self {
        Self::new(
            ViolationKind::AlreadyUsed,
            "Player has already used their emergency meeting",
        )
    }

    pub fn task_already_completed() -> Self {
        Self::new(
            ViolationKind::AlreadyCompleted,
            "Task already completed by this player",
        )
    }

    pub fn only_loyalists() -> Self {
        Self::new(ViolationKind::WrongRole, "Only loyalists can complete tasks")
    }

    pub fn only_moles(action: &str) -> Self {
        Self::new(ViolationKind::WrongRole, format!("Only moles can {action}"))
    }

    pub fn wrong_phase(action: &str, phase: molehunt_protocol::Phase) -> Self {
        Self::new(
            ViolationKind::WrongPhase,
            format!("Cannot {action} during {phase}"),
        )
    }

    /// The kind's tag, for statically typed callers.
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

// ---------------------------------------------------------------------------
// MatchError
// ---------------------------------------------------------------------------

/// Errors that prevent a match from being created.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The map failed validation.
    #[error(transparent)]
    Map(#[from] MapError),

    #[error("roster is empty")]
    EmptyRoster,

    #[error("player {0} appears in the roster more than once")]
    DuplicatePlayer(PlayerId),

    /// A match needs at least one mole and at least one loyalist.
    #[error("roster has {moles} moles and {loyalists} loyalists")]
    UnbalancedRoster { moles: usize, loyalists: usize },

    #[error("spawn room {0} is not on the map")]
    UnknownSpawnRoom(RoomId),
}
