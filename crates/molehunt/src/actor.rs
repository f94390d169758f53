//! Match actor: an isolated Tokio task that owns one [`Match`].
//!
//! The match is only ever touched from inside its task. Everyone else holds
//! a [`MatchHandle`] and sends commands over a bounded channel, so two
//! mutations can never interleave. Reads go through the same queue and
//! always observe a settled state.
//!
//! After every command the actor drains the match's event queue and pushes
//! each event to the subscribers its [`Recipient`] names.

use std::collections::HashMap;

use molehunt_core::{
    Ballot, Match, MatchError, MovementRecord, RuleViolation, TaskReceipt, VoteOutcome,
};
use molehunt_protocol::{
    Faction, MatchEvent, Phase, PlayerId, PlayerStatus, Recipient, RoomId, SabotageKind, TaskId,
    Validation,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::MolehuntError;

/// Channel a player's events are delivered on.
pub type EventSender = mpsc::UnboundedSender<MatchEvent>;

/// Channel a spectator receives every event on, with its audience.
pub type ObserverSender = mpsc::UnboundedSender<(Recipient, MatchEvent)>;

type Reply<T, E = RuleViolation> = oneshot::Sender<Result<T, E>>;

/// Commands sent to a match actor through its channel.
///
/// Every variant that can be refused carries a reply channel. Timestamps
/// are supplied by the caller; the actor never reads a clock.
enum MatchCommand {
    Start {
        now_ms: u64,
        reply: Reply<()>,
    },
    Reset {
        reply: Reply<(), MatchError>,
    },
    Tick {
        now_ms: u64,
    },
    Move {
        player_id: PlayerId,
        to: RoomId,
        now_ms: u64,
        reply: Reply<()>,
    },
    AttemptTask {
        player_id: PlayerId,
        task_id: TaskId,
        success: bool,
        now_ms: u64,
        reply: Reply<TaskReceipt>,
    },
    TriggerSabotage {
        player_id: PlayerId,
        kind: SabotageKind,
        now_ms: u64,
        reply: Reply<()>,
    },
    ResolveSabotage {
        player_id: PlayerId,
        reply: Reply<()>,
    },
    CanCallEmergency {
        player_id: PlayerId,
        now_ms: u64,
        reply: oneshot::Sender<Validation>,
    },
    CallEmergency {
        player_id: PlayerId,
        now_ms: u64,
        reply: Reply<()>,
    },
    Kill {
        killer_id: PlayerId,
        target_id: PlayerId,
        now_ms: u64,
        reply: Reply<()>,
    },
    ReportBody {
        reporter_id: PlayerId,
        body_of: PlayerId,
        now_ms: u64,
        reply: Reply<()>,
    },
    ViewLogs {
        player_id: PlayerId,
        reply: Reply<Vec<MovementRecord>>,
    },
    Vote {
        voter: PlayerId,
        ballot: Ballot,
        now_ms: u64,
        reply: Reply<Option<VoteOutcome>>,
    },
    CloseVoting {
        now_ms: u64,
        reply: Reply<VoteOutcome>,
    },
    Retire {
        player_id: PlayerId,
        status: PlayerStatus,
        reply: Reply<()>,
    },
    Subscribe {
        player_id: PlayerId,
        sender: EventSender,
        reply: Reply<()>,
    },
    Observe {
        sender: ObserverSender,
    },
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },
    Shutdown,
}

/// A read-only summary of the match, safe to hand to any player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub map_id: String,
    pub phase: Phase,
    pub round: u32,
    pub alive_loyalists: usize,
    pub alive_moles: usize,
    pub completed_tasks: usize,
    pub required_tasks: usize,
    pub active_sabotage: Option<SabotageKind>,
    pub winner: Option<Faction>,
    pub end_reason: Option<String>,
}

impl MatchSnapshot {
    fn of(game: &Match) -> Self {
        let state = game.state();
        Self {
            map_id: state.rooms().map_id().to_string(),
            phase: state.phase(),
            round: state.round(),
            alive_loyalists: state.alive_loyalists(),
            alive_moles: state.alive_moles(),
            completed_tasks: game.completed_task_count(),
            required_tasks: game.tasks().required_task_count(state),
            active_sabotage: game.sabotage().active_kind(),
            winner: state.winner(),
            end_reason: state.end_reason().map(str::to_string),
        }
    }
}

/// Handle to a running match actor.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct MatchHandle {
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    async fn request<T, E>(
        &self,
        build: impl FnOnce(Reply<T, E>) -> MatchCommand,
    ) -> Result<T, MolehuntError>
    where
        MolehuntError: From<E>,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| MolehuntError::Unavailable)?;
        let result = reply_rx.await.map_err(|_| MolehuntError::Unavailable)?;
        Ok(result?)
    }

    /// Leaves the lobby and starts round 1.
    pub async fn start(&self, now_ms: u64) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::Start { now_ms, reply })
            .await
    }

    /// Rebuilds the match from its roster. Subscriptions survive.
    pub async fn reset(&self) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::Reset { reply }).await
    }

    /// Advances time-driven rules (fire-and-forget).
    pub async fn tick(&self, now_ms: u64) -> Result<(), MolehuntError> {
        self.sender
            .send(MatchCommand::Tick { now_ms })
            .await
            .map_err(|_| MolehuntError::Unavailable)
    }

    pub async fn move_player(
        &self,
        player_id: PlayerId,
        to: RoomId,
        now_ms: u64,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::Move {
            player_id,
            to,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn attempt_task(
        &self,
        player_id: PlayerId,
        task_id: TaskId,
        success: bool,
        now_ms: u64,
    ) -> Result<TaskReceipt, MolehuntError> {
        self.request(|reply| MatchCommand::AttemptTask {
            player_id,
            task_id,
            success,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn trigger_sabotage(
        &self,
        player_id: PlayerId,
        kind: SabotageKind,
        now_ms: u64,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::TriggerSabotage {
            player_id,
            kind,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn resolve_sabotage(&self, player_id: PlayerId) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::ResolveSabotage { player_id, reply })
            .await
    }

    /// Checks meeting eligibility from the player's current room.
    ///
    /// A refusal is a normal answer here, so it comes back as an invalid
    /// [`Validation`] rather than an error.
    pub async fn can_call_emergency(
        &self,
        player_id: PlayerId,
        now_ms: u64,
    ) -> Result<Validation, MolehuntError> {
        let (reply, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::CanCallEmergency {
                player_id,
                now_ms,
                reply,
            })
            .await
            .map_err(|_| MolehuntError::Unavailable)?;
        reply_rx.await.map_err(|_| MolehuntError::Unavailable)
    }

    pub async fn call_emergency(
        &self,
        player_id: PlayerId,
        now_ms: u64,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::CallEmergency {
            player_id,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn kill(
        &self,
        killer_id: PlayerId,
        target_id: PlayerId,
        now_ms: u64,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::Kill {
            killer_id,
            target_id,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn report_body(
        &self,
        reporter_id: PlayerId,
        body_of: PlayerId,
        now_ms: u64,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::ReportBody {
            reporter_id,
            body_of,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn view_logs(
        &self,
        player_id: PlayerId,
    ) -> Result<Vec<MovementRecord>, MolehuntError> {
        self.request(|reply| MatchCommand::ViewLogs { player_id, reply })
            .await
    }

    pub async fn vote(
        &self,
        voter: PlayerId,
        ballot: Ballot,
        now_ms: u64,
    ) -> Result<Option<VoteOutcome>, MolehuntError> {
        self.request(|reply| MatchCommand::Vote {
            voter,
            ballot,
            now_ms,
            reply,
        })
        .await
    }

    pub async fn close_voting(&self, now_ms: u64) -> Result<VoteOutcome, MolehuntError> {
        self.request(|reply| MatchCommand::CloseVoting { now_ms, reply })
            .await
    }

    /// Applies a status change decided outside the rules (a disconnect,
    /// a moderator) and re-runs the win conditions.
    pub async fn retire_player(
        &self,
        player_id: PlayerId,
        status: PlayerStatus,
    ) -> Result<(), MolehuntError> {
        self.request(|reply| MatchCommand::Retire {
            player_id,
            status,
            reply,
        })
        .await
    }

    /// Registers the event channel of a seated player. A second
    /// subscription for the same player replaces the first.
    pub async fn subscribe(
        &self,
        player_id: PlayerId,
    ) -> Result<mpsc::UnboundedReceiver<MatchEvent>, MolehuntError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.request(|reply| MatchCommand::Subscribe {
            player_id,
            sender,
            reply,
        })
        .await?;
        Ok(receiver)
    }

    /// Receives every event together with its intended audience.
    pub async fn observe(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<(Recipient, MatchEvent)>, MolehuntError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.sender
            .send(MatchCommand::Observe { sender })
            .await
            .map_err(|_| MolehuntError::Unavailable)?;
        Ok(receiver)
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot, MolehuntError> {
        let (reply, reply_rx) = oneshot::channel();
        self.sender
            .send(MatchCommand::Snapshot { reply })
            .await
            .map_err(|_| MolehuntError::Unavailable)?;
        reply_rx.await.map_err(|_| MolehuntError::Unavailable)
    }

    /// Completions by living loyalists.
    pub async fn completed_task_count(&self) -> Result<usize, MolehuntError> {
        Ok(self.snapshot().await?.completed_tasks)
    }

    /// Tells the actor to stop. Queued commands ahead of this one still run.
    pub async fn shutdown(&self) -> Result<(), MolehuntError> {
        self.sender
            .send(MatchCommand::Shutdown)
            .await
            .map_err(|_| MolehuntError::Unavailable)
    }
}

/// The actor side. Runs inside a Tokio task.
struct MatchActor {
    game: Match,
    subscribers: HashMap<PlayerId, EventSender>,
    observers: Vec<ObserverSender>,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl MatchActor {
    async fn run(mut self) {
        let map_id = self.game.state().rooms().map_id().to_string();
        tracing::info!(%map_id, "match actor started");

        while let Some(cmd) = self.receiver.recv().await {
            if matches!(cmd, MatchCommand::Shutdown) {
                tracing::info!(%map_id, "match shutting down");
                break;
            }
            self.handle(cmd);
            self.dispatch();
        }

        tracing::info!(%map_id, "match actor stopped");
    }

    fn handle(&mut self, cmd: MatchCommand) {
        let game = &mut self.game;
        match cmd {
            MatchCommand::Start { now_ms, reply } => {
                let _ = reply.send(game.start(now_ms));
            }
            MatchCommand::Reset { reply } => {
                let _ = reply.send(game.reset());
            }
            MatchCommand::Tick { now_ms } => game.tick(now_ms),
            MatchCommand::Move {
                player_id,
                to,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.move_player(&player_id, &to, now_ms));
            }
            MatchCommand::AttemptTask {
                player_id,
                task_id,
                success,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.attempt_task(&player_id, &task_id, success, now_ms));
            }
            MatchCommand::TriggerSabotage {
                player_id,
                kind,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.trigger_sabotage(&player_id, kind, now_ms));
            }
            MatchCommand::ResolveSabotage { player_id, reply } => {
                let _ = reply.send(game.resolve_sabotage(&player_id));
            }
            MatchCommand::CanCallEmergency {
                player_id,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.can_call_emergency(&player_id, now_ms).into());
            }
            MatchCommand::CallEmergency {
                player_id,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.call_emergency(&player_id, now_ms));
            }
            MatchCommand::Kill {
                killer_id,
                target_id,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.kill(&killer_id, &target_id, now_ms));
            }
            MatchCommand::ReportBody {
                reporter_id,
                body_of,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.report_body(&reporter_id, &body_of, now_ms));
            }
            MatchCommand::ViewLogs { player_id, reply } => {
                let _ = reply.send(game.view_logs(&player_id));
            }
            MatchCommand::Vote {
                voter,
                ballot,
                now_ms,
                reply,
            } => {
                let _ = reply.send(game.cast_vote(&voter, ballot, now_ms));
            }
            MatchCommand::CloseVoting { now_ms, reply } => {
                let _ = reply.send(game.close_voting(now_ms));
            }
            MatchCommand::Retire {
                player_id,
                status,
                reply,
            } => {
                let _ = reply.send(game.retire_player(&player_id, status));
            }
            MatchCommand::Subscribe {
                player_id,
                sender,
                reply,
            } => {
                let result = if game.state().player(&player_id).is_some() {
                    tracing::debug!(%player_id, "player subscribed");
                    self.subscribers.insert(player_id, sender);
                    Ok(())
                } else {
                    Err(RuleViolation::player_not_found(&player_id))
                };
                let _ = reply.send(result);
            }
            MatchCommand::Observe { sender } => {
                self.observers.push(sender);
            }
            MatchCommand::Snapshot { reply } => {
                let _ = reply.send(MatchSnapshot::of(game));
            }
            MatchCommand::Shutdown => {}
        }
    }

    /// Pushes queued events to the right subscribers. Closed channels are
    /// pruned as they are found.
    fn dispatch(&mut self) {
        let events = self.game.drain_events();
        if events.is_empty() {
            return;
        }

        for (recipient, event) in events {
            self.observers
                .retain(|o| o.send((recipient.clone(), event.clone())).is_ok());

            let state = self.game.state();
            for (player_id, sender) in &self.subscribers {
                let wanted = match &recipient {
                    Recipient::All => true,
                    Recipient::Player(target) => target == player_id,
                    Recipient::Moles => state.player(player_id).is_some_and(|p| p.is_covert()),
                };
                if wanted {
                    let _ = sender.send(event.clone());
                }
            }
        }
        self.subscribers.retain(|_, s| !s.is_closed());
    }
}

/// Spawns a match actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_match(game: Match, channel_size: usize) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = MatchActor {
        game,
        subscribers: HashMap::new(),
        observers: Vec::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle { sender: tx }
}
