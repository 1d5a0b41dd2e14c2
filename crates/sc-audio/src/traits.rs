//! Audio output trait and error types.

use sc_engine::Frame;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// A sink for rendered frames.
pub trait AudioOutput {
    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Queue frames for playback, dropping any that don't fit.
    /// Returns the number of frames accepted.
    fn write(&mut self, frames: &[Frame]) -> usize;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}
