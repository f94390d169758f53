//! The match controller.
//!
//! `Match` owns the [`MatchState`] and the engines that act on it. It's the
//! one place that performs the phase changes the engines leave to their
//! caller (meeting → `Voting`, meeting over → next `Round`), and the one
//! place that queues events for the broadcast layer.
//!
//! Every mutating method takes `&mut self`, so in-process the borrow
//! checker already guarantees a single writer. Sharing a match across tasks
//! goes through `molehunt::MatchHandle`.

use molehunt_map::{InteractableKind, MapDefinition, RoomGraph};
use molehunt_protocol::{
    Faction, MatchEvent, Phase, PlayerId, PlayerStatus, Recipient, RoomId, SabotageKind, TaskId,
};

use crate::config::as_millis;
use crate::victory::elimination_winner;
use crate::{
    Ballot, DeadBody, EmergencyGate, MatchConfig, MatchError, MatchState, MovementRecord, Player,
    PlayerSeed, RuleViolation, SabotageEngine, TaskEngine, TaskReceipt, ViolationKind, VoteBox,
    VoteOutcome,
};

/// One authoritative match.
#[derive(Debug)]
pub struct Match {
    state: MatchState,
    config: MatchConfig,
    roster: Vec<PlayerSeed>,
    tasks: TaskEngine,
    sabotage: SabotageEngine,
    emergency: EmergencyGate,
    votes: VoteBox,
    outbox: Vec<(Recipient, MatchEvent)>,
}

impl Match {
    /// Validates `map`, builds the room graph, and seats the roster.
    pub fn new(
        map: MapDefinition,
        config: MatchConfig,
        roster: Vec<PlayerSeed>,
    ) -> Result<Self, MatchError> {
        Self::from_graph(RoomGraph::new(map)?, config, roster)
    }

    /// Builds a match on an already-validated room graph.
    pub fn from_graph(
        rooms: RoomGraph,
        config: MatchConfig,
        roster: Vec<PlayerSeed>,
    ) -> Result<Self, MatchError> {
        let state = MatchState::new(rooms, roster.clone())?;
        let tasks = TaskEngine::new(state.rooms());
        let emergency = EmergencyGate::new(&config);
        Ok(Self {
            state,
            config,
            roster,
            tasks,
            sabotage: SabotageEngine::new(),
            emergency,
            votes: VoteBox::new(),
            outbox: Vec::new(),
        })
    }

    // -- Read access -------------------------------------------------------

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn tasks(&self) -> &TaskEngine {
        &self.tasks
    }

    pub fn sabotage(&self) -> &SabotageEngine {
        &self.sabotage
    }

    pub fn emergency(&self) -> &EmergencyGate {
        &self.emergency
    }

    pub fn votes(&self) -> &VoteBox {
        &self.votes
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks.completed_task_count(&self.state)
    }

    /// Setup-time edits to the map. The task catalog is already frozen
    /// and doesn't see them until [`Match::reset`].
    pub fn rooms_mut(&mut self) -> &mut RoomGraph {
        self.state.rooms_mut()
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<(Recipient, MatchEvent)> {
        std::mem::take(&mut self.outbox)
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Leaves the lobby and starts round 1.
    pub fn start(&mut self, now_ms: u64) -> Result<(), RuleViolation> {
        if self.state.phase() != Phase::Lobby {
            return Err(RuleViolation::wrong_phase("start the match", self.state.phase()));
        }
        self.begin_next_round(now_ms)
    }

    /// Rebuilds the match from its roster on the current map. Every
    /// counter, status, and ledger goes back to zero and the task catalog
    /// is scanned again.
    pub fn reset(&mut self) -> Result<(), MatchError> {
        let rooms = self.state.rooms().clone();
        self.state = MatchState::new(rooms, self.roster.clone())?;
        self.tasks = TaskEngine::new(self.state.rooms());
        self.sabotage.reset();
        self.emergency.reset();
        self.votes = VoteBox::new();
        self.outbox.clear();
        tracing::info!("match reset");
        Ok(())
    }

    /// Advances time-driven rules: sabotage expiry during a round, and the
    /// voting deadline during a meeting.
    pub fn tick(&mut self, now_ms: u64) {
        match self.state.phase() {
            Phase::Round => {
                if let Some(expired) = self.sabotage.expire(now_ms, &self.config) {
                    self.emit(
                        Recipient::All,
                        MatchEvent::SabotageResolved {
                            kind: expired.kind,
                            resolved_by: None,
                        },
                    );
                }
            }
            Phase::Voting => {
                let deadline = self
                    .votes
                    .opened_at_ms()
                    .map(|t| t.saturating_add(as_millis(self.config.voting_duration)));
                if deadline.is_some_and(|d| now_ms >= d) {
                    tracing::debug!("voting window elapsed");
                    if let Err(err) = self.close_voting(now_ms) {
                        tracing::warn!(%err, "failed to close voting");
                    }
                }
            }
            Phase::Lobby | Phase::GameOver => {}
        }
    }

    // -- Round actions -----------------------------------------------------

    /// Walks to an adjacent room, or vents for moles.
    pub fn move_player(
        &mut self,
        player_id: &PlayerId,
        to: &RoomId,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "move")?;
        let player = self.alive_player(player_id)?;
        let from = player.location.room.clone();
        let covert = player.is_covert();

        let rooms = self.state.rooms();
        let via_vent = if rooms.validate_movement(&from, to) {
            false
        } else if covert && rooms.validate_vent(&from, to) {
            true
        } else {
            return Err(RuleViolation::new(
                ViolationKind::IllegalMove,
                format!("Cannot move from {from} to {to}"),
            ));
        };
        let position = rooms
            .get_room(to)
            .map(|r| r.position)
            .unwrap_or_default();

        if let Some(player) = self.state.player_mut(player_id) {
            player.location.room = to.clone();
            player.location.position = position;
        }
        if !via_vent {
            self.state.record_movement(MovementRecord {
                player_id: player_id.clone(),
                from: from.clone(),
                to: to.clone(),
                at_ms: now_ms,
            });
        }
        tracing::debug!(%player_id, %from, %to, via_vent, "player moved");

        let event = MatchEvent::PlayerMoved {
            player_id: player_id.clone(),
            from,
            to: to.clone(),
            via_vent,
        };
        let recipient = if via_vent {
            Recipient::Moles
        } else {
            Recipient::All
        };
        self.emit(recipient, event);
        Ok(())
    }

    /// Reports the result of a task minigame.
    ///
    /// On top of the engine's checks, a loyalist must be standing in the
    /// room that holds the task.
    pub fn attempt_task(
        &mut self,
        player_id: &PlayerId,
        task_id: &TaskId,
        success: bool,
        now_ms: u64,
    ) -> Result<TaskReceipt, RuleViolation> {
        self.require_phase(Phase::Round, "do tasks")?;
        self.check_task_location(player_id, task_id)?;

        let before = self.state.phase();
        let receipt =
            self.tasks
                .attempt_task(&mut self.state, player_id, task_id, success, now_ms)?;

        self.emit(
            Recipient::Player(player_id.clone()),
            MatchEvent::TaskCompleted {
                player_id: player_id.clone(),
                task_id: task_id.clone(),
            },
        );
        self.emit_progress();
        self.emit_phase_change(before);
        Ok(receipt)
    }

    pub fn trigger_sabotage(
        &mut self,
        player_id: &PlayerId,
        kind: SabotageKind,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.sabotage
            .trigger(&self.state, player_id, kind, now_ms)?;
        self.emit(
            Recipient::All,
            MatchEvent::SabotageStarted {
                kind,
                triggered_by: player_id.clone(),
            },
        );
        Ok(())
    }

    pub fn resolve_sabotage(
        &mut self,
        player_id: &PlayerId,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "fix sabotage")?;
        let resolved = self.sabotage.resolve(&self.state, player_id)?;
        self.emit(
            Recipient::All,
            MatchEvent::SabotageResolved {
                kind: resolved.kind,
                resolved_by: Some(player_id.clone()),
            },
        );
        Ok(())
    }

    /// Checks whether `player_id` could call a meeting from where they
    /// stand right now.
    pub fn can_call_emergency(
        &self,
        player_id: &PlayerId,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "call a meeting")?;
        let from_room = self.current_room(player_id);
        self.emergency.can_call(
            &self.state,
            &self.sabotage,
            player_id,
            &from_room,
            self.state.round_started_at_ms(),
            now_ms,
        )
    }

    /// Calls a meeting from the player's current room and opens voting.
    pub fn call_emergency(
        &mut self,
        player_id: &PlayerId,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "call a meeting")?;
        let from_room = self.current_room(player_id);
        let round_start = self.state.round_started_at_ms();
        self.emergency.call(
            &mut self.state,
            &self.sabotage,
            player_id,
            &from_room,
            round_start,
            now_ms,
        )?;

        self.emit(
            Recipient::All,
            MatchEvent::EmergencyCalled {
                caller: player_id.clone(),
            },
        );
        self.enter_voting(now_ms)
    }

    /// A mole kills a loyalist in the same room.
    pub fn kill(
        &mut self,
        killer_id: &PlayerId,
        target_id: &PlayerId,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "kill")?;
        let killer = self.alive_player(killer_id)?;
        if !killer.is_covert() {
            return Err(RuleViolation::only_moles("kill"));
        }
        if let Some(ready_at) = killer.kill_ready_at_ms.filter(|t| now_ms < *t) {
            return Err(RuleViolation::new(
                ViolationKind::KillOnCooldown,
                format!("Kill is on cooldown for {}ms", ready_at - now_ms),
            ));
        }
        let killer_room = killer.location.room.clone();

        let target = self
            .state
            .player(target_id)
            .ok_or_else(|| RuleViolation::player_not_found(target_id))?;
        if !target.is_alive() {
            return Err(RuleViolation::new(
                ViolationKind::InvalidTarget,
                format!("Target {target_id} is not alive"),
            ));
        }
        if target.is_covert() {
            return Err(RuleViolation::new(
                ViolationKind::InvalidTarget,
                "Moles cannot kill each other",
            ));
        }
        if target.location.room != killer_room {
            return Err(RuleViolation::new(
                ViolationKind::WrongRoom,
                format!("Target {target_id} is not in {killer_room}"),
            ));
        }
        let body = DeadBody {
            player_id: target_id.clone(),
            role: Some(target.role),
            location: target.location.clone(),
            reported: false,
            killed_at_ms: now_ms,
        };

        let before = self.state.phase();
        self.state.retire_player(target_id, PlayerStatus::Dead)?;
        self.state.bodies_mut().push(body);
        let cooldown = as_millis(self.config.kill_cooldown);
        if let Some(killer) = self.state.player_mut(killer_id) {
            killer.kill_ready_at_ms = Some(now_ms.saturating_add(cooldown));
        }
        tracing::info!(%killer_id, %target_id, room = %killer_room, "player killed");

        self.emit(
            Recipient::All,
            MatchEvent::PlayerKilled {
                player_id: target_id.clone(),
                room: killer_room,
            },
        );
        self.after_retirement();
        self.emit_phase_change(before);
        Ok(())
    }

    /// Reports an unreported body in the reporter's room and opens voting.
    pub fn report_body(
        &mut self,
        reporter_id: &PlayerId,
        body_of: &PlayerId,
        now_ms: u64,
    ) -> Result<(), RuleViolation> {
        self.require_phase(Phase::Round, "report a body")?;
        let room = self.alive_player(reporter_id)?.location.room.clone();

        let body = self
            .state
            .bodies_mut()
            .iter_mut()
            .find(|b| &b.player_id == body_of && !b.reported)
            .ok_or_else(|| {
                RuleViolation::new(
                    ViolationKind::BodyNotFound,
                    format!("No unreported body of {body_of} was found"),
                )
            })?;
        if body.location.room != room {
            return Err(RuleViolation::new(
                ViolationKind::WrongRoom,
                format!("The body of {body_of} is not in {room}"),
            ));
        }
        body.reported = true;
        tracing::info!(%reporter_id, %body_of, %room, "body reported");

        self.emit(
            Recipient::All,
            MatchEvent::BodyReported {
                reporter: reporter_id.clone(),
                body_of: body_of.clone(),
                room,
            },
        );
        self.enter_voting(now_ms)
    }

    /// Reads the most recent walks from the logs terminal.
    pub fn view_logs(
        &self,
        player_id: &PlayerId,
    ) -> Result<Vec<MovementRecord>, RuleViolation> {
        let player = self.alive_player(player_id)?;
        let logs_room = self.state.rooms().logs_room();
        if &player.location.room != logs_room {
            return Err(RuleViolation::new(
                ViolationKind::WrongRoom,
                format!("Logs can only be read in {logs_room}"),
            ));
        }
        let log = self.state.movement_log();
        let start = log.len().saturating_sub(self.config.log_window);
        Ok(log[start..].to_vec())
    }

    // -- Meetings ----------------------------------------------------------

    /// Casts a ballot. Voting closes on its own once every living player
    /// has voted; the outcome is returned in that case.
    pub fn cast_vote(
        &mut self,
        voter: &PlayerId,
        ballot: Ballot,
        now_ms: u64,
    ) -> Result<Option<VoteOutcome>, RuleViolation> {
        self.votes.cast(&self.state, voter, ballot)?;
        self.emit(
            Recipient::All,
            MatchEvent::VoteCast {
                voter: voter.clone(),
            },
        );
        if self.votes.all_voted(&self.state) {
            return self.close_voting(now_ms).map(Some);
        }
        Ok(None)
    }

    /// Tallies the meeting, ejects the loser if there is one, and either
    /// ends the match or starts the next round.
    pub fn close_voting(&mut self, now_ms: u64) -> Result<VoteOutcome, RuleViolation> {
        self.require_phase(Phase::Voting, "close voting")?;
        let before = self.state.phase();
        let outcome = self.votes.close(&self.state);

        match &outcome {
            VoteOutcome::Ejected(player_id) => {
                self.state.retire_player(player_id, PlayerStatus::Ejected)?;
                let role = self
                    .state
                    .player(player_id)
                    .map(|p| p.role)
                    .ok_or_else(|| RuleViolation::player_not_found(player_id))?;
                self.emit(
                    Recipient::All,
                    MatchEvent::PlayerEjected {
                        player_id: player_id.clone(),
                        role,
                    },
                );
                self.after_retirement();
            }
            VoteOutcome::NoEjection => {
                self.emit(Recipient::All, MatchEvent::NoEjection);
            }
        }

        if self.state.phase().is_terminal() {
            self.emit_phase_change(before);
        } else {
            self.begin_next_round(now_ms)?;
        }
        Ok(outcome)
    }

    // -- External status changes ------------------------------------------

    /// Applies a status change decided outside the engine and re-runs the
    /// win conditions.
    pub fn retire_player(
        &mut self,
        player_id: &PlayerId,
        status: PlayerStatus,
    ) -> Result<(), RuleViolation> {
        let before = self.state.phase();
        self.state.retire_player(player_id, status)?;
        if before == Phase::Voting {
            self.votes.discard_votes_for(player_id);
        }
        self.after_retirement();
        self.emit_phase_change(before);
        Ok(())
    }

    // -- Internals ---------------------------------------------------------

    fn emit(&mut self, recipient: Recipient, event: MatchEvent) {
        self.outbox.push((recipient, event));
    }

    fn emit_progress(&mut self) {
        let completed = self.tasks.completed_task_count(&self.state);
        let required = self.tasks.required_task_count(&self.state);
        self.emit(Recipient::All, MatchEvent::TaskProgress { completed, required });
    }

    /// Queues the phase change since `before`, plus the result when the
    /// match just ended.
    fn emit_phase_change(&mut self, before: Phase) {
        let after = self.state.phase();
        if after == before {
            return;
        }
        self.emit(Recipient::All, MatchEvent::PhaseChanged { from: before, to: after });
        if after.is_terminal() {
            if let Some(winner) = self.state.winner() {
                let reason = self.state.end_reason().unwrap_or_default().to_string();
                self.emit(Recipient::All, MatchEvent::GameOver { winner, reason });
            }
        }
    }

    fn require_phase(&self, phase: Phase, action: &str) -> Result<(), RuleViolation> {
        if self.state.phase() != phase {
            return Err(RuleViolation::wrong_phase(action, self.state.phase()));
        }
        Ok(())
    }

    fn alive_player(&self, player_id: &PlayerId) -> Result<&Player, RuleViolation> {
        let player = self
            .state
            .player(player_id)
            .ok_or_else(|| RuleViolation::player_not_found(player_id))?;
        if !player.is_alive() {
            return Err(RuleViolation::player_not_alive());
        }
        Ok(player)
    }

    fn current_room(&self, player_id: &PlayerId) -> RoomId {
        self.state
            .player(player_id)
            .map(|p| p.location.room.clone())
            .unwrap_or_else(|| RoomId::new(""))
    }

    /// Only a living loyalist who hasn't done the task yet gets the
    /// location check; everyone else is refused by the engine with the
    /// more specific reason.
    fn check_task_location(
        &self,
        player_id: &PlayerId,
        task_id: &TaskId,
    ) -> Result<(), RuleViolation> {
        let Some(player) = self.state.player(player_id) else {
            return Ok(());
        };
        if player.is_covert() || !player.is_alive() || player.has_completed(task_id) {
            return Ok(());
        }
        let Some((room, interactable)) = self.state.rooms().find_interactable(task_id) else {
            return Err(RuleViolation::new(
                ViolationKind::InvalidTarget,
                format!("Task {task_id} not found on this map"),
            ));
        };
        if interactable.kind != InteractableKind::Task {
            return Err(RuleViolation::new(
                ViolationKind::InvalidTarget,
                format!("{task_id} is not a task"),
            ));
        }
        if &player.location.room != room {
            return Err(RuleViolation::new(
                ViolationKind::WrongRoom,
                format!("Task {task_id} is in {room}"),
            ));
        }
        Ok(())
    }

    /// Re-runs both win paths after someone stopped being alive.
    fn after_retirement(&mut self) {
        if self.tasks.on_status_change(&mut self.state) {
            return;
        }
        let winner = elimination_winner(self.state.alive_loyalists(), self.state.alive_moles());
        match winner {
            Some(Faction::Loyalists) => {
                self.state.declare_winner(Faction::Loyalists, "all moles removed");
            }
            Some(Faction::Moles) => {
                self.state.declare_winner(Faction::Moles, "moles outnumber loyalists");
            }
            None => {}
        }
    }

    fn enter_voting(&mut self, now_ms: u64) -> Result<(), RuleViolation> {
        let before = self.state.phase();
        self.state.transition(Phase::Voting)?;
        self.sabotage.reset();
        self.votes.open(now_ms);
        self.emit_phase_change(before);
        Ok(())
    }

    fn begin_next_round(&mut self, now_ms: u64) -> Result<(), RuleViolation> {
        let before = self.state.phase();
        let round = self.state.begin_round(now_ms)?;
        self.sabotage.reset();
        self.emergency.reset();

        let ready_at = now_ms.saturating_add(as_millis(self.config.kill_cooldown));
        let moles: Vec<PlayerId> = self
            .state
            .alive_players()
            .filter(|p| p.is_covert())
            .map(|p| p.id.clone())
            .collect();
        for id in moles {
            if let Some(mole) = self.state.player_mut(&id) {
                mole.kill_ready_at_ms = Some(ready_at);
            }
        }

        self.emit_phase_change(before);
        self.emit(
            Recipient::All,
            MatchEvent::RoundStarted {
                round,
                started_at_ms: now_ms,
            },
        );
        Ok(())
    }
}
