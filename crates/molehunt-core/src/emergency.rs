//! The emergency meeting gate.
//!
//! The gate owns no clock. Callers pass the round start and the current
//! time, which keeps every check deterministic.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. the player exists
//! 2. the player is alive
//! 3. the call comes from the emergency-button room
//! 4. the warm-up has elapsed (`now - round_start >= warmup`)
//! 5. no sabotage is active
//! 6. the player hasn't used up their meetings

use molehunt_protocol::{PlayerId, RoomId};

use crate::config::as_millis;
use crate::{MatchConfig, MatchState, RuleViolation, SabotageEngine};

/// The last successful call, kept for inspection until [`EmergencyGate::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyCall {
    pub caller: PlayerId,
    pub at_ms: u64,
}

/// Decides whether a player may call an emergency meeting.
#[derive(Debug)]
pub struct EmergencyGate {
    warmup_ms: u64,
    meetings_per_player: u32,
    last_call: Option<EmergencyCall>,
}

impl EmergencyGate {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            warmup_ms: as_millis(config.emergency_warmup),
            meetings_per_player: config.emergency_meetings_per_player,
            last_call: None,
        }
    }

    /// Evaluates every precondition without changing anything.
    pub fn can_call(
        &self,
        state: &MatchState,
        sabotage: &SabotageEngine,
        player_id: &PlayerId,
        from_room: &RoomId,
        round_start_ms: u64,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        let player = state
            .player(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;

        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }

        let button_room = state.rooms().emergency_button_room();
        if from_room != button_room {
            return Err(RuleViolation::not_in_council_room(button_room));
        }

        let elapsed = now_ms.saturating_sub(round_start_ms);
        if elapsed < self.warmup_ms {
            return Err(RuleViolation::warm_up(self.warmup_ms - elapsed));
        }

        if sabotage.is_active() {
            return Err(RuleViolation::meeting_during_sabotage());
        }

        if player.emergency_meetings_used >= self.meetings_per_player {
            return Err(RuleViolation::meeting_already_used());
        }

        Ok(())
    }

    /// Re-checks eligibility and, on success, spends one of the player's
    /// meetings.
    ///
    /// The phase change to `Voting` is left to the caller.
    pub fn call(
        &mut self,
        state: &mut MatchState,
        sabotage: &SabotageEngine,
        player_id: &PlayerId,
        from_room: &RoomId,
        round_start_ms: u64,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        if let Err(violation) =
            self.can_call(state, sabotage, player_id, from_room, round_start_ms, now_ms)
        {
            tracing::debug!(%player_id, reason = %violation, "emergency call rejected");
            return Err(violation);
        }

        let player = state
            .player_mut(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;
        player.emergency_meetings_used += 1;
        let used = player.emergency_meetings_used;

        self.last_call = Some(EmergencyCall {
            caller: player_id.clone(),
            at_ms: now_ms,
        });
        tracing::info!(%player_id, used, "emergency meeting called");
        Ok(())
    }

    pub fn last_call(&self) -> Option<&EmergencyCall> {
        self.last_call.as_ref()
    }

    /// Forgets the last call. Usage counters live on the players and are
    /// untouched.
    pub fn reset(&mut self) {
        self.last_call = None;
    }
}
