//! Headless controller for the screamer S3M player.
//!
//! Owns a song and its playback settings, and drives the engine either
//! in real time on a render thread or offline into a WAV buffer. The CLI
//! and the integration tests both go through this API.

mod demo;
mod wav;

use sc_audio::{AudioOutput, CpalOutput};
use sc_engine::{Engine, RowStatus};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

// Re-export common types so callers don't need sc-ir/sc-engine directly.
pub use sc_engine::{EngineError, Features, Frame, Position, StopReason};
pub use sc_ir::Song;

pub use demo::demo_song;
pub use wav::{frames_to_wav, write_wav};

/// Order/row of the row being rendered, published by the render thread.
#[derive(Default)]
struct SharedPosition {
    order: AtomicUsize,
    row: AtomicU16,
}

/// Owns a song and manages playback.
pub struct Controller {
    song: Song,
    features: Features,
    start: (usize, u16),
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    position: Arc<SharedPosition>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(song: Song) -> Self {
        Self {
            song,
            features: Features::default(),
            start: (0, 0),
            playback: None,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Replace the song, stopping any playback.
    pub fn set_song(&mut self, song: Song) {
        self.stop();
        self.song = song;
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Settings applied from the next `play` or offline render on.
    pub fn set_features(&mut self, features: Features) {
        self.features = features;
    }

    /// Start playback at `order`, `row` instead of the top of the song.
    pub fn set_start(&mut self, order: usize, row: u16) {
        self.start = (order, row);
    }

    fn engine(&self, sample_rate: u32) -> Engine {
        let mut engine = Engine::new(self.song.clone(), sample_rate);
        engine.configure(self.features);
        if self.start != (0, 0) {
            engine.seek(self.start.0, self.start.1);
        }
        engine
    }

    // --- Real-time playback ---

    pub fn play(&mut self) {
        self.stop();

        let controller = Self {
            song: self.song.clone(),
            features: self.features,
            start: self.start,
            playback: None,
        };
        let stop_signal = Arc::new(AtomicBool::new(false));
        let position = Arc::new(SharedPosition::default());
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let pos = position.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            render_thread(&controller, &stop, &pos);
            done.store(true, Ordering::Relaxed);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            position,
            finished,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                if handle.join().is_err() {
                    log::error!("render thread panicked");
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Order and row currently being rendered.
    pub fn position(&self) -> Option<(usize, u16)> {
        let pb = self.playback.as_ref()?;
        if pb.finished.load(Ordering::Relaxed) {
            return None;
        }
        Some((
            pb.position.order.load(Ordering::Relaxed),
            pb.position.row.load(Ordering::Relaxed),
        ))
    }

    // --- Offline rendering ---

    /// Render up to `max_frames` frames, stopping early at the end of the song.
    pub fn render_frames(&self, sample_rate: u32, max_frames: usize) -> Result<Vec<Frame>, EngineError> {
        let mut engine = self.engine(sample_rate);
        let frames = engine.render_frames(max_frames)?;
        if let Some(reason) = engine.stop_reason() {
            log::info!("offline render stopped: {reason:?}");
        }
        Ok(frames)
    }

    pub fn render_to_wav(&self, sample_rate: u32, max_seconds: u32) -> Result<Vec<u8>, EngineError> {
        let max_frames = sample_rate as usize * max_seconds as usize;
        let frames = self.render_frames(sample_rate, max_frames)?;
        Ok(wav::frames_to_wav(&frames, sample_rate))
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn render_thread(controller: &Controller, stop: &AtomicBool, position: &SharedPosition) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("cannot open audio output: {e}");
            return;
        }
    };
    if let Err(e) = output.build_stream(consumer) {
        log::error!("cannot build audio stream: {e}");
        return;
    }
    if let Err(e) = output.start() {
        log::error!("cannot start audio stream: {e}");
        return;
    }

    let sample_rate = output.sample_rate();
    let mut engine = controller.engine(sample_rate);

    while !stop.load(Ordering::Relaxed) {
        let status = engine.render_row(&mut |frame| {
            output.write_spin(frame, stop);
        });
        match status {
            Ok(RowStatus::Playing(pos)) => {
                position.order.store(pos.order, Ordering::Relaxed);
                position.row.store(pos.row, Ordering::Relaxed);
            }
            Ok(RowStatus::Stopped(reason)) => {
                log::info!("playback stopped: {reason:?}");
                break;
            }
            Err(e) => {
                log::error!("playback aborted: {e}");
                break;
            }
        }
    }

    // Let the queued audio drain before the stream is dropped.
    while output.buffered() > 0 && !stop.load(Ordering::Relaxed) {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    let _ = output.stop();
}
