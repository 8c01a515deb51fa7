//! Room/device state store.

use crate::devices::room::{Room, household_layout};
use crate::error::SimError;

/// Mutable record of every room's device settings.
///
/// The room set and each room's slot layout are fixed when the store is
/// created; [`RoomStore::set`] only accepts replacements with the same
/// layout. Rooms iterate in creation order.
#[derive(Debug, Clone)]
pub struct RoomStore {
    rooms: Vec<Room>,
    revision: u64,
}

impl RoomStore {
    /// Creates a store holding the given rooms.
    ///
    /// # Panics
    ///
    /// Panics if two rooms share a name.
    pub fn new(rooms: Vec<Room>) -> Self {
        for (i, room) in rooms.iter().enumerate() {
            assert!(
                rooms[..i].iter().all(|r| r.name() != room.name()),
                "duplicate room name `{}`",
                room.name()
            );
        }
        Self { rooms, revision: 0 }
    }

    /// Creates a store with the standard household layout, all devices off.
    pub fn household() -> Self {
        Self::new(household_layout())
    }

    /// Returns a copy of the named room.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] if no room has that name.
    pub fn get(&self, name: &str) -> Result<Room, SimError> {
        self.find(name).map(|i| self.rooms[i].clone())
    }

    /// Borrows the named room without copying.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] if no room has that name.
    pub fn room(&self, name: &str) -> Result<&Room, SimError> {
        self.find(name).map(|i| &self.rooms[i])
    }

    /// Replaces the named room with `room`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NotFound`] for an unknown name and
    /// [`SimError::InvalidSlot`] if `room` does not keep the stored room's
    /// name and slot layout, or holds a fan speed or setpoint outside its
    /// range. The store is unchanged on error.
    pub fn set(&mut self, name: &str, room: Room) -> Result<(), SimError> {
        let idx = self.find(name)?;
        let current = &self.rooms[idx];
        if room.name() != current.name() || !current.same_shape(&room) {
            return Err(SimError::invalid_slot(name, "matching slot layout"));
        }
        if let Some(i) = room.first_invalid_slot() {
            return Err(SimError::invalid_slot(
                name,
                format!("in-range value for slot {i}"),
            ));
        }
        self.rooms[idx] = room;
        self.revision += 1;
        Ok(())
    }

    /// Iterates rooms in layout order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// All rooms in layout order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Number of successful writes since creation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn find(&self, name: &str) -> Result<usize, SimError> {
        self.rooms
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| SimError::NotFound(name.to_string()))
    }
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::household()
    }
}
