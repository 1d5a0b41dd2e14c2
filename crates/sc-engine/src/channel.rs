//! Per-channel playback state.

use sc_ir::{ChannelSettings, Panning, Period, Semitone, Volume, BASE_C2SPD};

use crate::channel_data::ChannelTarget;
use crate::effects::Effect;
use crate::memory::EffectMemory;
use crate::oscillator::Oscillator;

/// What the mixer plays on one channel for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Voice {
    /// Instrument number (1-based), if any was ever selected
    pub instrument: Option<u8>,
    /// Restart the sample at this frame position on this tick
    pub trigger: Option<u32>,
    pub period: Period,
    /// Channel volume scaled by the global volume
    pub volume: Volume,
    pub pan: Panning,
    /// Is a note sounding?
    pub active: bool,
}

/// State of a single tracker channel.
#[derive(Clone, Debug)]
pub struct ChannelState {
    /// Channel index within the song
    pub index: usize,
    pub enabled: bool,
    /// Current instrument (1-based)
    pub instrument: Option<u8>,
    /// C2SPD of the current instrument, after finetune
    pub c2spd: u32,
    /// Semitone of the last note played
    pub semitone: Option<Semitone>,
    /// Period sent to the mixer, including vibrato and arpeggio
    pub period: Period,
    /// Period slides and portamento work on
    pub base_period: Period,
    /// Where tone portamento is heading
    pub porta_target: Period,
    /// Volume sent to the mixer
    pub volume: Volume,
    /// Volume set by the note, instrument or volume column; tremor and tremolo swing around it
    pub base_volume: Volume,
    pub pan: Panning,
    /// Is a note sounding?
    pub active: bool,
    /// Effect running on the current row
    pub effect: Effect,
    /// Note, instrument and volume staged for this row
    pub target: ChannelTarget,
    /// Tick at which the staged target commits (note delay)
    pub note_tick: u32,
    /// Ticks since the last retrigger
    pub retrigger_count: u8,
    pub memory: EffectMemory,
    pub vibrato: Oscillator,
    pub tremolo: Oscillator,
    pending_trigger: Option<u32>,
}

impl ChannelState {
    /// Create a channel from its song settings.
    pub fn new(index: usize, settings: &ChannelSettings) -> Self {
        Self {
            index,
            enabled: settings.enabled,
            instrument: None,
            c2spd: BASE_C2SPD,
            semitone: None,
            period: Period::default(),
            base_period: Period::default(),
            porta_target: Period::default(),
            volume: settings.initial_volume,
            base_volume: settings.initial_volume,
            pan: settings.initial_pan,
            active: false,
            effect: Effect::None,
            target: ChannelTarget::default(),
            note_tick: 0,
            retrigger_count: 0,
            memory: EffectMemory::default(),
            vibrato: Oscillator::default(),
            tremolo: Oscillator::default(),
            pending_trigger: None,
        }
    }

    /// Start a note from `position` (in sample frames) on the next mixer update.
    pub fn trigger(&mut self, position: u32) {
        if self.instrument.is_none() || self.base_period.is_zero() {
            return;
        }
        self.pending_trigger = Some(position);
        self.active = true;
        self.vibrato.retrigger();
        self.tremolo.retrigger();
    }

    /// Restart the playing sample without touching the oscillators.
    pub fn restart(&mut self, position: u32) {
        if self.active {
            self.pending_trigger = Some(position);
        }
    }

    /// Stop the note; the volume is kept.
    pub fn key_off(&mut self) {
        self.active = false;
        self.pending_trigger = None;
    }

    /// Silence the channel and forget its pitch.
    pub fn cut(&mut self) {
        self.key_off();
        self.volume = Volume::SILENT;
        self.base_volume = Volume::SILENT;
        self.set_period(Period::default());
    }

    /// Set both the live and the base period.
    pub fn set_period(&mut self, period: Period) {
        self.base_period = period;
        self.period = period;
    }

    /// Set both the live and the base volume.
    pub fn set_volume(&mut self, volume: Volume) {
        self.base_volume = volume;
        self.volume = volume;
    }

    /// Snapshot for the mixer. Consumes a pending trigger.
    pub fn take_voice(&mut self, global_volume: Volume) -> Voice {
        Voice {
            instrument: self.instrument,
            trigger: self.pending_trigger.take(),
            period: self.period,
            volume: self.volume.scaled(global_volume),
            pan: self.pan,
            active: self.enabled && self.active && !self.period.is_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_ir::ChannelCategory;

    fn channel() -> ChannelState {
        ChannelState::new(0, &ChannelSettings::new(0, ChannelCategory::Right))
    }

    #[test]
    fn new_channel_uses_settings() {
        let ch = channel();
        assert_eq!(ch.pan, Panning::RIGHT);
        assert_eq!(ch.volume, Volume::FULL);
        assert!(!ch.active);
    }

    #[test]
    fn trigger_needs_instrument_and_period() {
        let mut ch = channel();
        ch.trigger(0);
        assert!(!ch.active);

        ch.instrument = Some(1);
        ch.set_period(Period(1712));
        ch.trigger(256);
        let voice = ch.take_voice(Volume::FULL);
        assert!(voice.active);
        assert_eq!(voice.trigger, Some(256));
        // The trigger is consumed by the first snapshot.
        assert_eq!(ch.take_voice(Volume::FULL).trigger, None);
    }

    #[test]
    fn key_off_keeps_volume_but_cut_silences() {
        let mut ch = channel();
        ch.instrument = Some(1);
        ch.set_period(Period(1712));
        ch.trigger(0);
        ch.key_off();
        assert!(!ch.active);
        assert_eq!(ch.volume, Volume::FULL);

        ch.cut();
        assert_eq!(ch.volume, Volume::SILENT);
        assert!(ch.period.is_zero());
    }

    #[test]
    fn voice_volume_is_scaled_by_global() {
        let mut ch = channel();
        ch.set_volume(Volume::from_native(32));
        let voice = ch.take_voice(Volume::from_native(32));
        assert_eq!(voice.volume.value(), 0.25);
    }
}
