//! The runtime room graph.
//!
//! Built once per map load from a validated [`MapDefinition`]. After that
//! it's read-mostly: the only mutation is setup code adding or removing
//! interactables, which never affects movement.

use std::collections::{BTreeSet, HashMap};

use molehunt_protocol::{InteractableId, RoomId, SabotageKind, TaskId};

use crate::{Interactable, InteractableKind, MapDefinition, MapError, Room, SabotageLocation};

/// Validated map topology.
#[derive(Debug, Clone)]
pub struct RoomGraph {
    map_id: String,
    map_name: String,
    /// Authoring order, so [`RoomGraph::rooms`] is deterministic.
    order: Vec<RoomId>,
    rooms: HashMap<RoomId, Room>,
    /// Vent adjacency, stored in both directions.
    vents: HashMap<RoomId, Vec<RoomId>>,
    sabotage_locations: Vec<SabotageLocation>,
    emergency_button_room: RoomId,
    logs_room: RoomId,
}

impl RoomGraph {
    /// Validates `def` and builds the graph from it.
    ///
    /// # Errors
    /// Returns the first [`MapError`] found by
    /// [`MapDefinition::validate`]. No graph is ever built from an
    /// invalid map.
    pub fn new(def: MapDefinition) -> Result<Self, MapError> {
        def.validate()?;

        let mut vents: HashMap<RoomId, Vec<RoomId>> = HashMap::new();
        for link in &def.vents {
            push_unique(vents.entry(link.from.clone()).or_default(), &link.to);
            push_unique(vents.entry(link.to.clone()).or_default(), &link.from);
        }

        let order = def.rooms.iter().map(|r| r.id.clone()).collect();
        let rooms = def
            .rooms
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect::<HashMap<_, _>>();

        tracing::info!(
            map_id = %def.id,
            rooms = rooms.len(),
            vents = def.vents.len(),
            "room graph built"
        );

        Ok(Self {
            map_id: def.id,
            map_name: def.name,
            order,
            rooms,
            vents,
            sabotage_locations: def.sabotage_locations,
            emergency_button_room: def.emergency_button_room,
            logs_room: def.logs_room,
        })
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Looks up a room by id.
    pub fn get_room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &RoomId) -> bool {
        self.rooms.contains_key(id)
    }

    /// Returns a copy of every room, in authoring order.
    ///
    /// Edits to the returned rooms never reach the graph.
    pub fn rooms(&self) -> Vec<Room> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .cloned()
            .collect()
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &RoomId> {
        self.order.iter()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` iff both rooms exist and `to` is an exit of `from`.
    ///
    /// Only `from`'s exit list is consulted. Symmetry was enforced when
    /// the map was loaded.
    pub fn validate_movement(&self, from: &RoomId, to: &RoomId) -> bool {
        if !self.rooms.contains_key(to) {
            return false;
        }
        self.rooms
            .get(from)
            .is_some_and(|room| room.has_exit(to))
    }

    /// Returns `true` iff a vent connects `from` and `to`.
    pub fn validate_vent(&self, from: &RoomId, to: &RoomId) -> bool {
        self.vents
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    pub fn emergency_button_room(&self) -> &RoomId {
        &self.emergency_button_room
    }

    pub fn logs_room(&self) -> &RoomId {
        &self.logs_room
    }

    pub fn sabotage_locations(&self) -> &[SabotageLocation] {
        &self.sabotage_locations
    }

    pub fn sabotage_location(
        &self,
        kind: SabotageKind,
    ) -> Option<&SabotageLocation> {
        self.sabotage_locations.iter().find(|l| l.kind == kind)
    }

    /// Iterates every interactable of `kind`, with the room holding it.
    pub fn interactables_of_kind(
        &self,
        kind: InteractableKind,
    ) -> impl Iterator<Item = (&RoomId, &Interactable)> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .flat_map(move |room| {
                room.interactables
                    .iter()
                    .filter(move |i| i.kind == kind)
                    .map(move |i| (&room.id, i))
            })
    }

    /// The ids of every Task interactable currently on the map.
    pub fn task_ids(&self) -> BTreeSet<TaskId> {
        self.interactables_of_kind(InteractableKind::Task)
            .map(|(_, i)| i.id.clone())
            .collect()
    }

    /// Finds an interactable anywhere on the map.
    pub fn find_interactable(
        &self,
        id: &InteractableId,
    ) -> Option<(&RoomId, &Interactable)> {
        self.order
            .iter()
            .filter_map(|rid| self.rooms.get(rid))
            .find_map(|room| {
                room.interactables
                    .iter()
                    .find(|i| &i.id == id)
                    .map(|i| (&room.id, i))
            })
    }

    /// Adds an interactable to a room during match setup.
    ///
    /// # Errors
    /// [`MapError::UnknownRoom`] if the room doesn't exist,
    /// [`MapError::DuplicateInteractable`] if the id is already used.
    pub fn add_interactable(
        &mut self,
        room: &RoomId,
        interactable: Interactable,
    ) -> Result<(), MapError> {
        if self.find_interactable(&interactable.id).is_some() {
            return Err(MapError::DuplicateInteractable(interactable.id));
        }
        let target = self
            .rooms
            .get_mut(room)
            .ok_or_else(|| MapError::UnknownRoom(room.clone()))?;
        tracing::debug!(%room, interactable = %interactable.id, "interactable added");
        target.interactables.push(interactable);
        Ok(())
    }

    /// Removes an interactable from a room. Returns it if it was there.
    pub fn remove_interactable(
        &mut self,
        room: &RoomId,
        id: &InteractableId,
    ) -> Option<Interactable> {
        let target = self.rooms.get_mut(room)?;
        let pos = target.interactables.iter().position(|i| &i.id == id)?;
        tracing::debug!(%room, interactable = %id, "interactable removed");
        Some(target.interactables.remove(pos))
    }
}

fn push_unique(list: &mut Vec<RoomId>, room: &RoomId) {
    if !list.contains(room) {
        list.push(room.clone());
    }
}
