//! Playback engine for the screamer S3M player.
//!
//! Plays a [`sc_ir::Song`] one row at a time: the [`Engine`] resolves each
//! row's effects and note data per channel, runs them tick by tick, and
//! hands every tick's channel voices to a [`Mixer`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod channel_data;
mod config;
pub mod effects;
mod error;
mod frame;
mod memory;
mod mixer;
mod oscillator;
mod playback;
pub mod sequencer;

pub use channel::{ChannelState, Voice};
pub use channel_data::{ChannelTarget, NoteAction, TargetVolume};
pub use config::Features;
pub use effects::{Effect, EffectKind};
pub use error::EngineError;
pub use frame::Frame;
pub use memory::{EffectMemory, MemoryCell, PatternLoop, Tremor};
pub use mixer::{Mixer, SampleMixer};
pub use oscillator::{Oscillator, Waveform};
pub use playback::{EffectEvent, Engine, Playback, RowStatus};
pub use sequencer::{LoopBracket, Position, RowUpdate, StopReason};
