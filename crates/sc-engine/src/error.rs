//! Engine error types.

use thiserror::Error;

/// Conditions that abort playback.
///
/// Reaching the end of the song is not an error; see [`crate::RowStatus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An effect command the engine does not know, under the strict policy.
    #[error("unknown effect {command}{param:02X}")]
    UnknownEffect { command: char, param: u8 },
    /// A known effect the engine deliberately does not implement.
    #[error("unsupported effect {name} ({param:02X})")]
    UnsupportedEffect { name: &'static str, param: u8 },
}
