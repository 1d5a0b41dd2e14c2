//! Mixer seam and the built-in sample mixer.

use alloc::vec;
use alloc::vec::Vec;
use sc_ir::{Instrument, Song};

use crate::channel::Voice;
use crate::frame::Frame;

/// Turns per-tick channel voices into PCM frames.
pub trait Mixer {
    /// Update one channel's voice. Called once per channel per tick.
    fn set_voice(&mut self, channel: usize, voice: &Voice);

    /// Render `frames` frames with the current voices.
    fn render(&mut self, frames: u32, sink: &mut dyn FnMut(Frame));
}

/// Mixer-side playback state of one channel.
#[derive(Clone, Copy, Debug, Default)]
struct MixVoice {
    /// Instrument index (0-based)
    instrument: Option<usize>,
    /// Position in sample (16.16 fixed-point)
    position: u32,
    /// Playback increment (16.16 fixed-point)
    increment: u32,
    /// Volume (0-256)
    volume: i32,
    left: i32,
    right: i32,
    playing: bool,
}

/// Linear-interpolating sample mixer.
///
/// FM and empty instruments play as silence.
pub struct SampleMixer {
    instruments: Vec<Instrument>,
    voices: Vec<MixVoice>,
    sample_rate: u32,
}

impl SampleMixer {
    /// Create a mixer for every channel of `song`.
    pub fn new(song: &Song, sample_rate: u32) -> Self {
        Self {
            instruments: song.instruments.clone(),
            voices: vec![MixVoice::default(); song.num_channels()],
            sample_rate,
        }
    }

    fn mix_frame(&mut self) -> Frame {
        let mut left: i32 = 0;
        let mut right: i32 = 0;

        for voice in self.voices.iter_mut().filter(|v| v.playing) {
            let Some(sample) = voice.instrument.and_then(|i| self.instruments.get(i)).and_then(|inst| inst.sample()) else {
                voice.playing = false;
                continue;
            };

            let value = sample.data.get_interpolated(voice.position) as i32;
            left += (value * voice.volume * voice.left) >> 16;
            right += (value * voice.volume * voice.right) >> 16;

            voice.position = voice.position.wrapping_add(voice.increment);
            let pos = voice.position >> 16;
            if sample.has_loop() && pos >= sample.loop_end {
                let loop_len = sample.loop_end - sample.loop_start;
                voice.position -= loop_len << 16;
            } else if pos as usize >= sample.len() {
                voice.playing = false;
            }
        }

        Frame::clamped(left, right)
    }
}

impl Mixer for SampleMixer {
    fn set_voice(&mut self, channel: usize, voice: &Voice) {
        let Some(mix) = self.voices.get_mut(channel) else {
            return;
        };
        if let Some(position) = voice.trigger {
            mix.instrument = voice.instrument.and_then(|n| (n as usize).checked_sub(1));
            mix.position = position << 16;
            mix.playing = true;
        }
        if !voice.active {
            mix.playing = false;
        }
        mix.increment = voice.period.increment(self.sample_rate);
        mix.volume = (voice.volume.value() * 256.0) as i32;
        (mix.left, mix.right) = voice.pan.gains();
    }

    fn render(&mut self, frames: u32, sink: &mut dyn FnMut(Frame)) {
        for _ in 0..frames {
            let frame = self.mix_frame();
            sink(frame);
        }
    }
}
