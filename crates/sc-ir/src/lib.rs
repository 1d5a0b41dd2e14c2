//! Core song types for the screamer playback engine.
//!
//! This crate defines the in-memory song representation the engine plays:
//! patterns of raw note/instrument/volume/command cells, the order list,
//! instruments, per-channel settings, and the pitch and volume value types.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod cell_format;
mod instrument;
mod pattern;
mod pitch;
mod sample;
pub mod song;
mod volume;

pub use cell_format::RowDisplay;
pub use instrument::{Instrument, InstrumentKind};
pub use pattern::{command_index, Cell, Note, Pattern};
pub use pitch::{Period, Semitone, BASE_C2SPD};
pub use sample::{Sample, SampleData};
pub use song::{ChannelCategory, ChannelSettings, OrderEntry, Song, SongFlags};
pub use volume::{Panning, Volume, NATIVE_VOLUME_MAX};
