//! The task engine.
//!
//! Each loyalist must personally complete every task in the catalog. The
//! catalog is the set of Task interactables on the map at the moment the
//! engine is built; later edits to the room graph don't change it.
//!
//! Per-player completions live on [`Player`](crate::Player) inside the
//! match state. The engine keeps the frozen catalog and an append-only
//! history of successful attempts.

use std::collections::BTreeSet;

use molehunt_map::RoomGraph;
use molehunt_protocol::{Faction, PlayerId, TaskId};
use serde::{Deserialize, Serialize};

use crate::victory::{TaskSnapshot, loyalists_completed_catalog};
use crate::{MatchState, RuleViolation, ViolationKind};

/// One successful task completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub player_id: PlayerId,
    pub task_id: TaskId,
    pub at_ms: u64,
}

/// What a successful attempt changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskReceipt {
    /// The player's completed-task count after this attempt.
    pub player_progress: u32,
    /// `true` if this completion ended the match.
    pub victory: bool,
}

/// Tracks task completion and the loyalist task win.
#[derive(Debug)]
pub struct TaskEngine {
    catalog: BTreeSet<TaskId>,
    history: Vec<TaskRecord>,
}

impl TaskEngine {
    /// Scans `rooms` once and freezes the catalog.
    pub fn new(rooms: &RoomGraph) -> Self {
        let catalog = rooms.task_ids();
        tracing::debug!(tasks = catalog.len(), "task catalog frozen");
        Self {
            catalog,
            history: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &BTreeSet<TaskId> {
        &self.catalog
    }

    pub fn history(&self) -> &[TaskRecord] {
        &self.history
    }

    /// Records the outcome of a task attempt.
    ///
    /// `success` is the result of the minigame the agent played outside
    /// the engine. A failed minigame is refused without touching
    /// anything.
    pub fn attempt_task(
        &mut self,
        state: &mut MatchState,
        player_id: &PlayerId,
        task_id: &TaskId,
        success: bool,
        now_ms: u64,
    ) -> Result<TaskReceipt, RuleViolation> {
        let player = state
            .player_mut(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;

        if player.is_covert() {
            return Err(RuleViolation::only_loyalists());
        }
        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }
        if player.has_completed(task_id) {
            return Err(RuleViolation::task_already_completed());
        }
        if !success {
            tracing::debug!(%player_id, %task_id, "task attempt failed");
            return Err(RuleViolation::new(
                ViolationKind::TaskFailed,
                format!("Task {task_id} was not completed"),
            ));
        }

        player.record_task(task_id.clone());
        let player_progress = player.task_progress;

        self.history.push(TaskRecord {
            player_id: player_id.clone(),
            task_id: task_id.clone(),
            at_ms: now_ms,
        });
        tracing::info!(%player_id, %task_id, player_progress, "task completed");

        let victory = self.check_win(state);
        Ok(TaskReceipt {
            player_progress,
            victory,
        })
    }

    /// Re-evaluates the task win after a player stopped being alive.
    ///
    /// A death can complete the condition retroactively: if the only
    /// loyalist still missing tasks dies, everyone left has finished.
    pub fn on_status_change(&self, state: &mut MatchState) -> bool {
        self.check_win(state)
    }

    /// Ends the match if every living loyalist has finished the catalog.
    /// Returns `true` if this call ended it.
    pub fn check_win(&self, state: &mut MatchState) -> bool {
        if state.phase().is_terminal() {
            return false;
        }
        let finished =
            loyalists_completed_catalog(state.players().map(TaskSnapshot::from), &self.catalog);
        finished && state.declare_winner(Faction::Loyalists, "all tasks completed")
    }

    /// Tasks completed by living loyalists. The dead contribute nothing.
    pub fn completed_task_count(&self, state: &MatchState) -> usize {
        state
            .alive_players()
            .filter(|p| !p.is_covert())
            .map(|p| p.completed_tasks.len())
            .sum()
    }

    /// Completions needed for the task win with the current population.
    pub fn required_task_count(&self, state: &MatchState) -> usize {
        self.catalog.len() * state.alive_loyalists()
    }

    /// Clears the history. The catalog stays frozen.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
