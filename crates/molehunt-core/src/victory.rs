//! Win conditions as pure functions.
//!
//! Nothing here is cached. The engine hands in a fresh view of the roster
//! after every relevant mutation, so a death mid-match is reflected in the
//! very next evaluation.

use std::collections::BTreeSet;

use molehunt_protocol::{Faction, PlayerStatus, Role, TaskId};

use crate::Player;

/// The slice of a player the task win condition looks at.
#[derive(Debug, Clone, Copy)]
pub struct TaskSnapshot<'a> {
    pub role: Role,
    pub status: PlayerStatus,
    pub completed: &'a [TaskId],
}

impl<'a> From<&'a Player> for TaskSnapshot<'a> {
    fn from(p: &'a Player) -> Self {
        Self {
            role: p.role,
            status: p.status,
            completed: &p.completed_tasks,
        }
    }
}

/// Returns `true` iff there is at least one living loyalist and every
/// living loyalist has completed every task in `catalog`.
///
/// Dead and ejected players are ignored entirely, whatever they finished.
pub fn loyalists_completed_catalog<'a>(
    players: impl IntoIterator<Item = TaskSnapshot<'a>>,
    catalog: &BTreeSet<TaskId>,
) -> bool {
    let mut living = players
        .into_iter()
        .filter(|p| !p.role.is_covert() && p.status.is_alive())
        .peekable();

    if living.peek().is_none() {
        return false;
    }
    living.all(|p| catalog.iter().all(|task| p.completed.contains(task)))
}

/// Head-count victory, checked after every kill and ejection.
///
/// - no living moles → loyalists win
/// - moles at least as many as living loyalists → moles win
pub fn elimination_winner(alive_loyalists: usize, alive_moles: usize) -> Option<Faction> {
    if alive_moles == 0 {
        Some(Faction::Loyalists)
    } else if alive_moles >= alive_loyalists {
        Some(Faction::Moles)
    } else {
        None
    }
}
