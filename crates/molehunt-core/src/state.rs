//! Match state: the arena every engine reads and writes.
//!
//! `MatchState` owns the player registry and the room graph. Engines never
//! keep copies of either; they receive `&MatchState` (or `&mut`) on every
//! call, so a status flip is visible to the very next check.

use std::collections::BTreeMap;

use molehunt_map::RoomGraph;
use molehunt_protocol::{Faction, Phase, PlayerId, PlayerStatus, Role, RoomId};
use serde::{Deserialize, Serialize};

use crate::{Location, MatchError, Player, PlayerSeed, RuleViolation};

/// A body left behind by a kill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadBody {
    pub player_id: PlayerId,
    /// Snapshot of the victim's role, when the rules reveal it.
    pub role: Option<Role>,
    pub location: Location,
    pub reported: bool,
    pub killed_at_ms: u64,
}

/// One walk from room to room, as the security log records it.
/// Vent travel is never logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub player_id: PlayerId,
    pub from: RoomId,
    pub to: RoomId,
    pub at_ms: u64,
}

/// Everything the rules engines share.
#[derive(Debug, Clone)]
pub struct MatchState {
    phase: Phase,
    round: u32,
    round_started_at_ms: u64,
    mole_count: usize,
    players: BTreeMap<PlayerId, Player>,
    rooms: RoomGraph,
    bodies: Vec<DeadBody>,
    movement_log: Vec<MovementRecord>,
    winner: Option<Faction>,
    end_reason: Option<String>,
}

impl MatchState {
    /// Builds the state in `Lobby`, spawning every player in the
    /// emergency-button room.
    ///
    /// # Errors
    /// Fails on an empty roster, duplicate ids, or a roster without at
    /// least one mole and one loyalist.
    pub fn new(rooms: RoomGraph, roster: Vec<PlayerSeed>) -> Result<Self, MatchError> {
        let spawn = rooms.emergency_button_room().clone();
        Self::with_spawn(rooms, roster, &spawn)
    }

    /// Like [`MatchState::new`] with an explicit spawn room.
    pub fn with_spawn(
        rooms: RoomGraph,
        roster: Vec<PlayerSeed>,
        spawn: &RoomId,
    ) -> Result<Self, MatchError> {
        if roster.is_empty() {
            return Err(MatchError::EmptyRoster);
        }
        let spawn_position = rooms
            .get_room(spawn)
            .map(|r| r.position)
            .ok_or_else(|| MatchError::UnknownSpawnRoom(spawn.clone()))?;

        let moles = roster.iter().filter(|s| s.role.is_covert()).count();
        let loyalists = roster.len() - moles;
        if moles == 0 || loyalists == 0 {
            return Err(MatchError::UnbalancedRoster { moles, loyalists });
        }

        let mut players = BTreeMap::new();
        for seed in roster {
            if players.contains_key(&seed.id) {
                return Err(MatchError::DuplicatePlayer(seed.id));
            }
            let location = Location::new(spawn.clone(), spawn_position);
            players.insert(seed.id.clone(), Player::new(seed, location));
        }

        tracing::info!(
            map_id = %rooms.map_id(),
            players = players.len(),
            moles,
            "match state created"
        );

        Ok(Self {
            phase: Phase::Lobby,
            round: 0,
            round_started_at_ms: 0,
            mole_count: moles,
            players,
            rooms,
            bodies: Vec::new(),
            movement_log: Vec::new(),
            winner: None,
            end_reason: None,
        })
    }

    // -- Phase and rounds --------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn round_started_at_ms(&self) -> u64 {
        self.round_started_at_ms
    }

    /// Milliseconds since the current round started.
    pub fn round_elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.round_started_at_ms)
    }

    /// Number of moles the match started with.
    pub fn mole_count(&self) -> usize {
        self.mole_count
    }

    pub fn winner(&self) -> Option<Faction> {
        self.winner
    }

    /// Why the match ended, once it has.
    pub fn end_reason(&self) -> Option<&str> {
        self.end_reason.as_deref()
    }

    /// Moves to `target` if the phase machine allows it.
    pub fn transition(&mut self, target: Phase) -> Result<(), RuleViolation> {
        if !self.phase.can_transition_to(target) {
            return Err(RuleViolation::wrong_phase(
                &format!("move to {target}"),
                self.phase,
            ));
        }
        tracing::info!(from = %self.phase, to = %target, round = self.round, "phase changed");
        self.phase = target;
        Ok(())
    }

    /// Enters a new round at `now_ms`. Bodies from the last round are
    /// cleaned up.
    pub fn begin_round(&mut self, now_ms: u64) -> Result<u32, RuleViolation> {
        self.transition(Phase::Round)?;
        self.round += 1;
        self.round_started_at_ms = now_ms;
        self.bodies.clear();
        tracing::info!(round = self.round, started_at_ms = now_ms, "round started");
        Ok(self.round)
    }

    /// Ends the match with `faction` as the winner. Returns `false` if the
    /// match was already over or hasn't started.
    pub(crate) fn declare_winner(&mut self, faction: Faction, reason: &str) -> bool {
        if self.transition(Phase::GameOver).is_err() {
            return false;
        }
        self.winner = Some(faction);
        self.end_reason = Some(reason.to_string());
        tracing::info!(winner = %faction, reason, round = self.round, "game over");
        true
    }

    // -- Players -----------------------------------------------------------

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    /// All players, ordered by id.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_alive())
    }

    pub fn alive_loyalists(&self) -> usize {
        self.alive_players().filter(|p| !p.is_covert()).count()
    }

    pub fn alive_moles(&self) -> usize {
        self.alive_players().filter(|p| p.is_covert()).count()
    }

    /// Flips a player out of `Alive`.
    ///
    /// Only the status changes. Win conditions are re-evaluated by the
    /// caller (see [`TaskEngine::on_status_change`](crate::TaskEngine::on_status_change)).
    pub fn retire_player(
        &mut self,
        id: &PlayerId,
        status: PlayerStatus,
    ) -> Result<(), RuleViolation> {
        let player = self
            .players
            .get_mut(id)
            .ok_or_else(|| RuleViolation::player_not_found(id))?;
        if !player.retire(status) {
            return Err(RuleViolation::player_not_alive());
        }
        tracing::info!(player_id = %id, %status, "player retired");
        Ok(())
    }

    // -- Map ---------------------------------------------------------------

    pub fn rooms(&self) -> &RoomGraph {
        &self.rooms
    }

    /// Setup-time access to the room graph (interactable edits).
    pub fn rooms_mut(&mut self) -> &mut RoomGraph {
        &mut self.rooms
    }

    // -- Bodies and logs ---------------------------------------------------

    pub fn bodies(&self) -> &[DeadBody] {
        &self.bodies
    }

    pub(crate) fn bodies_mut(&mut self) -> &mut Vec<DeadBody> {
        &mut self.bodies
    }

    pub fn movement_log(&self) -> &[MovementRecord] {
        &self.movement_log
    }

    pub(crate) fn record_movement(&mut self, record: MovementRecord) {
        self.movement_log.push(record);
    }
}
