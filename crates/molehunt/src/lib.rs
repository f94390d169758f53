//! # Molehunt
//!
//! Authoritative rules for hidden-role matches aboard a station.
//!
//! Loyalists walk the station's rooms finishing tasks; moles blend in,
//! sabotage systems, and pick players off. Meetings are called from the
//! council room and end in a vote. This crate ties the layers together:
//! map → rules → actor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use molehunt::prelude::*;
//!
//! # async fn run() -> Result<(), MolehuntError> {
//! let handle = MatchBuilder::new(builtin::station()?)
//!     .player(PlayerSeed::loyalist("ada"))
//!     .player(PlayerSeed::loyalist("bo"))
//!     .player(PlayerSeed::mole("mallory"))
//!     .spawn()?;
//!
//! let clock = MatchClock::start();
//! handle.start(clock.now_ms()).await?;
//! handle
//!     .move_player(PlayerId::from("ada"), RoomId::from("hallway"), clock.now_ms())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod builder;
mod error;
pub mod telemetry;
mod ticker;

pub use actor::{EventSender, MatchHandle, MatchSnapshot, ObserverSender, spawn_match};
pub use builder::MatchBuilder;
pub use error::MolehuntError;
pub use ticker::{MatchClock, spawn_ticker};

/// Everything a front end usually needs.
pub mod prelude {
    pub use crate::{MatchBuilder, MatchClock, MatchHandle, MatchSnapshot, MolehuntError};
    pub use crate::{spawn_match, spawn_ticker};

    pub use molehunt_core::{
        Ballot, Match, MatchConfig, PlayerSeed, RuleViolation, ViolationKind, VoteOutcome,
    };
    pub use molehunt_map::{MapDefinition, RoomGraph, builtin};
    pub use molehunt_protocol::{
        ActionOutcome, Faction, MatchEvent, Phase, PlayerId, PlayerStatus, Recipient, Role,
        RoomId, SabotageKind, TaskId, Validation,
    };
}
