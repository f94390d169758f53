//! Players and where they stand.

use molehunt_map::Position;
use molehunt_protocol::{PlayerId, PlayerStatus, Role, RoomId, TaskId};
use serde::{Deserialize, Serialize};

/// A player's location: a room plus a fine coordinate inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub room: RoomId,
    pub position: Position,
}

impl Location {
    pub fn new(room: RoomId, position: Position) -> Self {
        Self { room, position }
    }
}

/// One entry of the roster handed over by the lobby.
///
/// Role assignment happens outside the engine; the roster arrives with
/// roles already decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
}

impl PlayerSeed {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.into(),
            role,
        }
    }

    pub fn loyalist(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, Role::Loyalist)
    }

    pub fn mole(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, Role::Mole)
    }
}

/// A player in the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub status: PlayerStatus,
    pub location: Location,
    /// Tasks this player has completed, in completion order. No repeats.
    pub completed_tasks: Vec<TaskId>,
    /// Successful task completions. Equals `completed_tasks.len()`.
    pub task_progress: u32,
    /// Meetings called so far. Only ever increases.
    pub emergency_meetings_used: u32,
    /// Moles only: earliest timestamp (ms) of the next legal kill.
    pub kill_ready_at_ms: Option<u64>,
}

impl Player {
    pub fn new(seed: PlayerSeed, location: Location) -> Self {
        let kill_ready_at_ms = seed.role.is_covert().then_some(0);
        Self {
            id: seed.id,
            name: seed.name,
            role: seed.role,
            status: PlayerStatus::Alive,
            location,
            completed_tasks: Vec::new(),
            task_progress: 0,
            emergency_meetings_used: 0,
            kill_ready_at_ms,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    pub fn is_covert(&self) -> bool {
        self.role.is_covert()
    }

    pub fn has_completed(&self, task: &TaskId) -> bool {
        self.completed_tasks.contains(task)
    }

    /// Records a completed task. Returns `false` if it was already there.
    pub(crate) fn record_task(&mut self, task: TaskId) -> bool {
        if self.has_completed(&task) {
            return false;
        }
        self.completed_tasks.push(task);
        self.task_progress += 1;
        true
    }

    /// Moves the player out of `Alive`. Status never goes back, so a
    /// non-alive player keeps the status it already has.
    pub(crate) fn retire(&mut self, status: PlayerStatus) -> bool {
        if !self.is_alive() || status.is_alive() {
            return false;
        }
        self.status = status;
        true
    }
}
