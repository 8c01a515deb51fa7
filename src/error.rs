//! Error types shared by the state store and command processor.

use thiserror::Error;

/// Errors raised when a command or store access cannot be applied.
///
/// A failed operation never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The named room does not exist in the household.
    #[error("room `{0}` not found")]
    NotFound(String),
    /// The room has no slot matching the request.
    #[error("room `{room}` has no {slot}")]
    InvalidSlot { room: String, slot: String },
}

impl SimError {
    pub(crate) fn invalid_slot(room: &str, slot: impl Into<String>) -> Self {
        SimError::InvalidSlot {
            room: room.to_string(),
            slot: slot.into(),
        }
    }
}
