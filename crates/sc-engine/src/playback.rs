//! Row-by-row playback.
//!
//! [`Engine::render_row`] plays one row across all channels:
//!
//! 1. build every channel's effect from its cell,
//! 2. stage note/instrument/volume targets and run `pre_start`,
//! 3. commit the targets (note-delayed channels commit at their tick),
//! 4. run `start`, `tick` and `stop`, rendering audio after each tick,
//! 5. commit the row's [`RowUpdate`] to the sequencer.

use alloc::boxed::Box;
use alloc::vec::Vec;
use sc_ir::{RowDisplay, Song, SongFlags, Volume};

use crate::channel::ChannelState;
use crate::channel_data::ChannelTarget;
use crate::config::Features;
use crate::effects::{self, Effect};
use crate::error::EngineError;
use crate::frame::Frame;
use crate::mixer::{Mixer, SampleMixer};
use crate::sequencer::{Position, RowUpdate, Sequencer, StopReason};

/// Context handed to effects while a row plays.
pub struct Playback<'a> {
    pub song: &'a Song,
    /// Cursor changes requested by this row
    pub update: &'a mut RowUpdate,
    pub flags: SongFlags,
    pub global_volume: &'a mut Volume,
    pub order: usize,
    pub row: u16,
    rng: &'a mut u32,
}

impl Playback<'_> {
    /// Next value of the playback-wide noise source (random waveforms).
    pub fn random(&mut self) -> u16 {
        *self.rng = self.rng.wrapping_mul(1_103_515_245).wrapping_add(12345);
        (*self.rng >> 16) as u16
    }
}

/// Result of playing one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowStatus {
    /// The row at this position was played.
    Playing(Position),
    /// Nothing was played; the song is over.
    Stopped(StopReason),
}

/// An effect resolved for one channel, reported to the `on_effect` hook.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectEvent {
    pub order: usize,
    pub row: u16,
    pub channel: usize,
    pub effect: Effect,
}

type EffectHook = Box<dyn FnMut(&EffectEvent) + Send>;

/// The playback engine.
pub struct Engine {
    song: Song,
    sequencer: Sequencer,
    channels: Vec<ChannelState>,
    mixer: Box<dyn Mixer + Send>,
    features: Features,
    flags: SongFlags,
    global_volume: Volume,
    sample_rate: u32,
    rng: u32,
    on_effect: Option<EffectHook>,
}

impl Engine {
    /// Create an engine with the built-in sample mixer.
    pub fn new(song: Song, sample_rate: u32) -> Self {
        let mixer = SampleMixer::new(&song, sample_rate);
        Self::with_mixer(song, sample_rate, Box::new(mixer))
    }

    /// Create an engine that renders through `mixer`.
    pub fn with_mixer(song: Song, sample_rate: u32, mixer: Box<dyn Mixer + Send>) -> Self {
        let channels = song
            .channels
            .iter()
            .enumerate()
            .map(|(i, settings)| ChannelState::new(i, settings))
            .collect();
        let features = Features::default();
        Self {
            sequencer: Sequencer::new(&song),
            channels,
            mixer,
            flags: features.song_flags(song.flags),
            features,
            global_volume: Volume::from_native(song.global_volume),
            sample_rate,
            rng: 0x1234_5678,
            on_effect: None,
            song,
        }
    }

    pub fn configure(&mut self, features: Features) {
        self.features = features;
        self.flags = features.song_flags(self.song.flags);
        self.sequencer.set_song_loop(features.song_loop);
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Call `hook` for every effect resolved on a channel.
    pub fn set_on_effect(&mut self, hook: impl FnMut(&EffectEvent) + Send + 'static) {
        self.on_effect = Some(Box::new(hook));
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn position(&self) -> Position {
        self.sequencer.position()
    }

    /// Ticks per row.
    pub fn speed(&self) -> u8 {
        self.sequencer.speed()
    }

    pub fn tempo(&self) -> u8 {
        self.sequencer.tempo()
    }

    pub fn global_volume(&self) -> Volume {
        self.global_volume
    }

    pub fn channel(&self, index: usize) -> Option<&ChannelState> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    pub fn is_finished(&self) -> bool {
        self.sequencer.stopped().is_some()
    }

    /// Why playback stopped, if it did.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.sequencer.stopped()
    }

    /// An empty row update for host-initiated cursor changes.
    pub fn start_pattern_transaction(&self) -> RowUpdate {
        RowUpdate::new()
    }

    /// Apply a host-built row update to the cursor.
    pub fn commit_pattern_transaction(&mut self, mut update: RowUpdate) {
        update.commit(&mut self.sequencer);
        self.sync_pattern_loops();
    }

    /// Continue playback from `order`, `row`.
    pub fn seek(&mut self, order: usize, row: u16) {
        log::debug!("seek to order {order} row {row}");
        self.sequencer.rewind_history();
        let mut update = self.start_pattern_transaction();
        update.set_next_order(order);
        update.set_next_row(row, true);
        self.commit_pattern_transaction(update);
    }

    /// Play one row, passing every rendered frame to `sink`.
    pub fn render_row(&mut self, sink: &mut dyn FnMut(Frame)) -> Result<RowStatus, EngineError> {
        if self.sequencer.take_reset_pattern_loops() {
            for ch in &mut self.channels {
                ch.memory.pattern_loop.reset();
            }
        }
        let pos = match self.sequencer.begin_row() {
            Ok(pos) => pos,
            Err(reason) => return Ok(RowStatus::Stopped(reason)),
        };
        if self.features.trace_rows {
            if let Some(pattern) = self.song.pattern_at(pos.order) {
                log::trace!("{:03}:{:02} {}", pos.order, pos.row, RowDisplay(pattern.row(pos.row)));
            }
        }

        for ch in self.channels.iter_mut().filter(|ch| ch.enabled) {
            let cell = self.song.cell(pos.order, pos.row, ch.index);
            ch.effect = effects::build(cell.command, cell.param, &mut ch.memory, &self.features)?;
            ch.target = ChannelTarget::process(&cell, &self.song, ch);
            ch.note_tick = 0;
            if let Some(hook) = &mut self.on_effect {
                if ch.effect != Effect::None {
                    hook(&EffectEvent {
                        order: pos.order,
                        row: pos.row,
                        channel: ch.index,
                        effect: ch.effect,
                    });
                }
            }
        }

        let mut update = RowUpdate::new();
        let mut pb = Playback {
            song: &self.song,
            update: &mut update,
            flags: self.flags,
            global_volume: &mut self.global_volume,
            order: pos.order,
            row: pos.row,
            rng: &mut self.rng,
        };
        let amiga_limits = self.flags.amiga_limits;

        for ch in &mut self.channels {
            let effect = ch.effect;
            effect.pre_start(ch, &mut pb);
        }
        for ch in self.channels.iter_mut().filter(|ch| ch.note_tick == 0) {
            ch.commit_target(pb.song, amiga_limits);
        }

        let mut tick = 0;
        loop {
            if tick == 0 {
                for ch in &mut self.channels {
                    let effect = ch.effect;
                    effect.start(ch, &mut pb);
                }
            }
            // Start may have changed the speed or added delays.
            let ticks = self.sequencer.ticks_this_row(pb.update);
            if tick >= ticks {
                break;
            }
            for ch in &mut self.channels {
                if tick == ch.note_tick {
                    ch.commit_target(pb.song, amiga_limits);
                }
                let effect = ch.effect;
                effect.tick(ch, &mut pb, tick);
                if tick + 1 == ticks {
                    effect.stop(ch, &mut pb, tick);
                }
                let voice = ch.take_voice(*pb.global_volume);
                self.mixer.set_voice(ch.index, &voice);
            }
            let frames = self.sequencer.samples_per_tick(pb.update, self.sample_rate);
            #[cfg(feature = "alloc_check")]
            assert_no_alloc::assert_no_alloc(|| self.mixer.render(frames, sink));
            #[cfg(not(feature = "alloc_check"))]
            self.mixer.render(frames, sink);
            tick += 1;
        }

        update.commit(&mut self.sequencer);
        self.sync_pattern_loops();
        Ok(RowStatus::Playing(pos))
    }

    /// Render whole rows until at least `max` frames exist or the song ends,
    /// then truncate to `max`.
    pub fn render_frames(&mut self, max: usize) -> Result<Vec<Frame>, EngineError> {
        let mut frames = Vec::with_capacity(max);
        while frames.len() < max {
            match self.render_row(&mut |frame| frames.push(frame))? {
                RowStatus::Playing(_) => {}
                RowStatus::Stopped(_) => break,
            }
        }
        frames.truncate(max);
        Ok(frames)
    }

    fn sync_pattern_loops(&mut self) {
        let armed = self.sequencer.pattern_loop().copied();
        for ch in &mut self.channels {
            ch.memory.pattern_loop.sync(armed.as_ref());
        }
    }
}
