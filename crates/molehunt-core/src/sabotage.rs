//! The sabotage engine.
//!
//! A two-state machine per match:
//!
//! ```text
//!          trigger()
//!   Idle ─────────────→ Active(kind, triggered_by, started_at)
//!    ↑                        │
//!    └── resolve() / expire() / reset() ──┘
//! ```
//!
//! At most one sabotage is active at a time. Triggering while one is
//! active is refused; it never queues and never replaces the current one.

use molehunt_protocol::{Phase, PlayerId, SabotageKind};
use serde::{Deserialize, Serialize};

use crate::config::as_millis;
use crate::{MatchConfig, MatchState, RuleViolation, ViolationKind};

/// The sabotage currently in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSabotage {
    pub kind: SabotageKind,
    pub triggered_by: PlayerId,
    pub started_at_ms: u64,
}

/// Tracks the single active sabotage of a match.
#[derive(Debug, Default)]
pub struct SabotageEngine {
    active: Option<ActiveSabotage>,
}

impl SabotageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a sabotage.
    ///
    /// Checks, in order: the match is in `Round`; the player exists, is
    /// alive, and is a mole; no sabotage is already active.
    pub fn trigger(
        &mut self,
        state: &MatchState,
        player_id: &PlayerId,
        kind: SabotageKind,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        if state.phase() != Phase::Round {
            return Err(RuleViolation::wrong_phase("sabotage", state.phase()));
        }
        let player = state
            .player(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;
        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }
        if !player.is_covert() {
            return Err(RuleViolation::only_moles("sabotage"));
        }
        if let Some(active) = &self.active {
            tracing::debug!(
                %player_id,
                requested = %kind,
                active = %active.kind,
                "sabotage rejected, one already active"
            );
            return Err(RuleViolation::sabotage_already_active());
        }

        self.active = Some(ActiveSabotage {
            kind,
            triggered_by: player_id.clone(),
            started_at_ms: now_ms,
        });
        tracing::info!(%player_id, %kind, started_at_ms = now_ms, "sabotage triggered");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_kind(&self) -> Option<SabotageKind> {
        self.active.as_ref().map(|a| a.kind)
    }

    pub fn active(&self) -> Option<&ActiveSabotage> {
        self.active.as_ref()
    }

    /// A living player fixes the active sabotage.
    ///
    /// When the map names a location for the active kind, the player must
    /// stand in its fix room (the target room, or the source room when no
    /// target is set). Kinds without a location can be fixed anywhere.
    pub fn resolve(
        &mut self,
        state: &MatchState,
        player_id: &PlayerId,
    ) -> Result<ActiveSabotage, RuleViolation> {
        let kind = self.active_kind().ok_or_else(|| {
            RuleViolation::new(
                ViolationKind::NoActiveSabotage,
                "There is no sabotage to fix",
            )
        })?;
        let player = state
            .player(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;
        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }
        if let Some(location) = state.rooms().sabotage_location(kind) {
            let fix_room = location.fix_room();
            if &player.location.room != fix_room {
                return Err(RuleViolation::new(
                    ViolationKind::WrongRoom,
                    format!("The {kind} sabotage can only be fixed from {fix_room}"),
                ));
            }
        }

        let resolved = self.active.take().ok_or_else(|| {
            RuleViolation::new(ViolationKind::NoActiveSabotage, "There is no sabotage to fix")
        })?;
        tracing::info!(%player_id, %kind, "sabotage resolved");
        Ok(resolved)
    }

    /// Clears the active sabotage once its configured duration has
    /// elapsed. Returns the expired sabotage, if any.
    pub fn expire(
        &mut self,
        now_ms: u64,
        config: &MatchConfig,
    ) -> Option<ActiveSabotage> {
        let active = self.active.as_ref()?;
        let duration = config.sabotage_duration_for(active.kind)?;
        if now_ms.saturating_sub(active.started_at_ms) < as_millis(duration) {
            return None;
        }
        let expired = self.active.take();
        if let Some(s) = &expired {
            tracing::info!(kind = %s.kind, "sabotage expired");
        }
        expired
    }

    /// Forces the engine back to idle.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(kind = %active.kind, "sabotage cleared by reset");
        }
    }
}
