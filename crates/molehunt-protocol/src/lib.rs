//! Shared vocabulary for Molehunt.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`], [`InteractableId`]):
//!   string newtypes, so map authors and agents can use readable ids.
//! - **Game enums** ([`Role`], [`PlayerStatus`], [`Phase`],
//!   [`SabotageKind`], [`Faction`]).
//! - **Outcomes** ([`ActionOutcome`], [`Validation`]): the
//!   `{success|valid, reason?}` shapes handed to the broadcast layer.
//! - **Events** ([`MatchEvent`], [`Recipient`]): what happened, and who
//!   should hear about it.
//!
//! # Architecture
//!
//! ```text
//! Map (topology) → Core (rules) → Facade (single-writer actor)
//!        ↑              ↑               ↑
//!        └──────── Protocol (this crate) ┘
//! ```

mod event;
mod outcome;
mod types;

pub use event::{MatchEvent, Recipient};
pub use outcome::{ActionOutcome, Validation};
pub use types::{
    Faction, InteractableId, Phase, PlayerId, PlayerStatus, Role, RoomId,
    SabotageKind, TaskId,
};
