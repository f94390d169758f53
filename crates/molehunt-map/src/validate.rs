//! Load-time map validation.
//!
//! Checks run in a fixed order and the first failure is returned, so the
//! same broken map always reports the same error.

use std::collections::{HashMap, HashSet};

use molehunt_protocol::RoomId;

use crate::{InteractableKind, MapDefinition, MapError, Room};

impl MapDefinition {
    /// Validates the structural invariants every map must satisfy.
    ///
    /// - ids are non-empty, room and interactable ids are unique
    /// - exits reference existing rooms, never the room itself, and are
    ///   mirrored in the target room
    /// - vent links reference existing, distinct rooms
    /// - the emergency-button room holds a Button, the logs room a Log
    /// - each sabotage kind has at most one location, on existing rooms
    pub fn validate(&self) -> Result<(), MapError> {
        if self.id.trim().is_empty() {
            return Err(MapError::EmptyId("map"));
        }
        if self.rooms.is_empty() {
            return Err(MapError::NoRooms(self.id.clone()));
        }

        let rooms = self.index_rooms()?;
        self.check_interactables()?;

        for room in &self.rooms {
            check_exits(room, &rooms)?;
        }

        for vent in &self.vents {
            if vent.from == vent.to {
                return Err(MapError::SelfVent(vent.from.clone()));
            }
            if !rooms.contains_key(&vent.from) || !rooms.contains_key(&vent.to) {
                return Err(MapError::UnknownVentRoom {
                    from: vent.from.clone(),
                    to: vent.to.clone(),
                });
            }
        }

        check_designated(
            &rooms,
            "emergency button",
            &self.emergency_button_room,
            InteractableKind::Button,
        )?;
        check_designated(&rooms, "logs", &self.logs_room, InteractableKind::Log)?;

        let mut seen_kinds = HashSet::new();
        for location in &self.sabotage_locations {
            if !seen_kinds.insert(location.kind) {
                return Err(MapError::DuplicateSabotage(location.kind));
            }
            let referenced = std::iter::once(&location.source)
                .chain(location.target.as_ref());
            for room in referenced {
                if !rooms.contains_key(room) {
                    return Err(MapError::UnknownSabotageRoom {
                        kind: location.kind,
                        room: room.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn index_rooms(&self) -> Result<HashMap<&RoomId, &Room>, MapError> {
        let mut index = HashMap::with_capacity(self.rooms.len());
        for room in &self.rooms {
            if room.id.as_str().trim().is_empty() {
                return Err(MapError::EmptyId("room"));
            }
            if index.insert(&room.id, room).is_some() {
                return Err(MapError::DuplicateRoom(room.id.clone()));
            }
        }
        Ok(index)
    }

    fn check_interactables(&self) -> Result<(), MapError> {
        let mut seen = HashSet::new();
        for interactable in self.rooms.iter().flat_map(|r| &r.interactables) {
            if interactable.id.as_str().trim().is_empty() {
                return Err(MapError::EmptyId("interactable"));
            }
            if !seen.insert(&interactable.id) {
                return Err(MapError::DuplicateInteractable(
                    interactable.id.clone(),
                ));
            }
        }
        Ok(())
    }
}

fn check_exits(
    room: &Room,
    rooms: &HashMap<&RoomId, &Room>,
) -> Result<(), MapError> {
    for exit in &room.exits {
        if *exit == room.id {
            return Err(MapError::SelfExit(room.id.clone()));
        }
        let target = rooms.get(exit).ok_or_else(|| MapError::UnknownExit {
            room: room.id.clone(),
            exit: exit.clone(),
        })?;
        if !target.has_exit(&room.id) {
            return Err(MapError::AsymmetricExit {
                from: room.id.clone(),
                to: exit.clone(),
            });
        }
    }
    Ok(())
}

fn check_designated(
    rooms: &HashMap<&RoomId, &Room>,
    purpose: &'static str,
    room_id: &RoomId,
    kind: InteractableKind,
) -> Result<(), MapError> {
    let room = rooms
        .get(room_id)
        .ok_or_else(|| MapError::MissingDesignatedRoom {
            purpose,
            room: room_id.clone(),
        })?;
    if !room.has_interactable_kind(kind) {
        return Err(MapError::MissingInteractable {
            room: room_id.clone(),
            kind,
        });
    }
    Ok(())
}
