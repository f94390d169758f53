//! Maps that ship with the crate.

use crate::{MapDefinition, MapError};

const STATION_JSON: &str = include_str!("../maps/station.json");

/// The default six-room station: council room, hallway hub, security
/// (logs), reactor, electrical, and storage, with four tasks and two vents.
pub fn station() -> Result<MapDefinition, MapError> {
    MapDefinition::from_json(STATION_JSON)
}
