//! Map topology for Molehunt.
//!
//! A map is authored as a [`MapDefinition`] (usually JSON), validated once
//! at load time, and frozen into a [`RoomGraph`] that the rules engine
//! consults for movement, vents, designated rooms, and the task catalog.
//!
//! # Key types
//!
//! - [`MapDefinition`]: the authored document
//! - [`RoomGraph`]: the validated, read-mostly runtime view
//! - [`MapError`]: everything that makes a map unloadable
//! - [`builtin`]: maps that ship with the crate

pub mod builtin;
mod definition;
mod error;
mod graph;
mod validate;

pub use definition::{
    Interactable, InteractableKind, MapDefinition, Position, Room,
    SabotageLocation, VentLink,
};
pub use error::MapError;
pub use graph::RoomGraph;
