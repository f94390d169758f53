//! Authoritative match rules for Molehunt.
//!
//! A match is one shared, mutable world acted on by many agents. This
//! crate keeps it consistent: who may move where, who may sabotage, when a
//! meeting may be called, and when the match is won.
//!
//! # Key types
//!
//! - [`MatchState`]: the arena: players, room graph, phase, round
//! - [`TaskEngine`]: task ledger and the loyalist task win
//! - [`SabotageEngine`]: the single active sabotage
//! - [`EmergencyGate`]: meeting eligibility
//! - [`Match`]: the controller tying them together and queuing events
//! - [`RuleViolation`]: why an action was refused
//!
//! Engines hold no copies of the registry. Each call receives the state by
//! reference, so a player dying is seen by the very next check.

mod config;
mod emergency;
mod error;
mod game;
mod player;
mod sabotage;
mod state;
mod tasks;
pub mod victory;
mod voting;

pub use config::MatchConfig;
pub use emergency::{EmergencyCall, EmergencyGate};
pub use error::{MatchError, RuleViolation, ViolationKind};
pub use game::Match;
pub use player::{Location, Player, PlayerSeed};
pub use sabotage::{ActiveSabotage, SabotageEngine};
pub use state::{DeadBody, MatchState, MovementRecord};
pub use tasks::{TaskEngine, TaskReceipt, TaskRecord};
pub use voting::{Ballot, VoteBox, VoteOutcome};
