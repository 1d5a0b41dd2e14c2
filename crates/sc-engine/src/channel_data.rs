//! Resolution of a row's note, instrument and volume fields.
//!
//! [`ChannelTarget::process`] turns a raw [`Cell`] into staged targets;
//! [`ChannelState::commit_target`] applies them later, after every effect
//! had a chance to edit them in `pre_start`.

use sc_ir::{Cell, Note, Period, Semitone, Song, Volume};

use crate::channel::ChannelState;

/// Volume staged by a row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetVolume {
    /// The default volume of the instrument about to play
    Instrument,
    Value(Volume),
}

/// What happens to the note when the target commits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoteAction {
    #[default]
    None,
    /// Start the staged semitone from the staged position.
    Trigger,
    /// Slide toward the staged semitone instead of restarting it.
    Glide,
    /// Restart the channel's current note with the staged instrument.
    Retrigger,
    KeyOff,
    Cut,
}

/// Note, instrument and volume staged for one channel on one row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelTarget {
    /// Instrument to switch to (1-based)
    pub instrument: Option<u8>,
    pub semitone: Option<Semitone>,
    pub volume: Option<TargetVolume>,
    pub action: NoteAction,
    /// Sample frame the note starts from
    pub position: u32,
    /// C2SPD override from finetune
    pub c2spd: Option<u32>,
    committed: bool,
}

impl ChannelTarget {
    /// Stage the targets of `cell` for `channel`.
    ///
    /// An instrument number that does not name a playable instrument drops
    /// the note and instrument; the volume column still applies.
    pub fn process(cell: &Cell, song: &Song, channel: &ChannelState) -> Self {
        let mut target = Self::default();

        let instrument = match cell.instrument {
            0 => channel.instrument,
            number => match song.instrument(number) {
                Some(inst) if inst.is_playable() => {
                    target.instrument = Some(number);
                    target.volume = Some(TargetVolume::Instrument);
                    target.action = NoteAction::Retrigger;
                    Some(number)
                }
                _ => {
                    log::debug!("channel {}: invalid instrument {number}", channel.index);
                    target.volume = cell.volume.map(|v| TargetVolume::Value(Volume::from_native(v)));
                    return target;
                }
            },
        };

        match cell.note {
            Note::None => {}
            Note::Off => target.action = NoteAction::KeyOff,
            Note::Cut => target.action = NoteAction::Cut,
            Note::On(semitone) => {
                target.semitone = Some(semitone);
                if instrument.is_some() {
                    target.action = NoteAction::Trigger;
                }
            }
        }

        if let Some(volume) = cell.volume {
            target.volume = Some(TargetVolume::Value(Volume::from_native(volume)));
        }
        target
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

impl ChannelState {
    /// Apply the staged target. Only the first call per row has an effect.
    pub fn commit_target(&mut self, song: &Song, amiga_limits: bool) {
        if self.target.committed {
            return;
        }
        self.target.committed = true;
        let target = self.target;

        if let Some(number) = target.instrument {
            self.instrument = Some(number);
            if let Some(inst) = song.instrument(number) {
                self.c2spd = inst.c2spd;
            }
        }
        if let Some(c2spd) = target.c2spd {
            self.c2spd = c2spd;
        }
        if let Some(semitone) = target.semitone {
            self.semitone = Some(semitone);
        }

        match target.action {
            NoteAction::None => {}
            NoteAction::Trigger => {
                if let Some(semitone) = target.semitone {
                    self.set_period(Period::from_semitone(semitone, self.c2spd).clamp(amiga_limits));
                    self.trigger(target.position);
                }
            }
            NoteAction::Glide => {
                if let Some(semitone) = target.semitone {
                    self.porta_target = Period::from_semitone(semitone, self.c2spd).clamp(amiga_limits);
                    // Nothing to slide from: start the note where it is headed.
                    if self.base_period.is_zero() {
                        self.set_period(self.porta_target);
                        self.trigger(target.position);
                    }
                }
            }
            NoteAction::Retrigger => {
                // A cut channel has no pitch to restart.
                if !self.base_period.is_zero() {
                    if let Some(semitone) = self.semitone {
                        self.set_period(Period::from_semitone(semitone, self.c2spd).clamp(amiga_limits));
                    }
                    self.trigger(target.position);
                }
            }
            NoteAction::KeyOff => self.key_off(),
            NoteAction::Cut => self.cut(),
        }

        match target.volume {
            Some(TargetVolume::Instrument) => {
                let volume = self
                    .instrument
                    .and_then(|number| song.instrument(number))
                    .map_or(Volume::FULL, |inst| inst.volume());
                self.set_volume(volume);
            }
            Some(TargetVolume::Value(volume)) => self.set_volume(volume),
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_ir::{ChannelSettings, Instrument, Sample, SampleData};

    fn song() -> Song {
        let mut song = Song::with_channels("data", 1);
        let sample = Sample::new(SampleData::Mono8(alloc::vec![0; 32]));
        song.instruments.push(Instrument::sampled("lead", sample.clone(), 48));
        song.instruments.push(Instrument::new("empty"));
        let mut quiet = Instrument::sampled("quiet", sample, 16);
        quiet.c2spd = 16726;
        song.instruments.push(quiet);
        song
    }

    fn channel() -> ChannelState {
        ChannelState::new(0, &ChannelSettings::default())
    }

    fn c4() -> Note {
        Note::On(Semitone::C4)
    }

    #[test]
    fn note_with_instrument_triggers_and_resets_volume() {
        let song = song();
        let mut ch = channel();
        ch.target = ChannelTarget::process(&Cell::note(c4(), 1), &song, &ch);
        assert_eq!(ch.target.action, NoteAction::Trigger);
        ch.commit_target(&song, false);
        assert!(ch.active);
        assert_eq!(ch.period, Period(1712));
        assert_eq!(ch.volume.to_native(), 48);
    }

    #[test]
    fn note_without_instrument_keeps_volume() {
        let song = song();
        let mut ch = channel();
        ch.instrument = Some(1);
        ch.set_volume(Volume::from_native(20));
        ch.target = ChannelTarget::process(&Cell::note(c4(), 0), &song, &ch);
        ch.commit_target(&song, false);
        assert!(ch.active);
        assert_eq!(ch.volume.to_native(), 20);
    }

    #[test]
    fn instrument_without_note_retriggers_current_note() {
        let song = song();
        let mut ch = channel();
        ch.target = ChannelTarget::process(&Cell::note(c4(), 1), &song, &ch);
        ch.commit_target(&song, false);
        ch.take_voice(Volume::FULL);
        ch.key_off();
        ch.set_volume(Volume::from_native(5));

        ch.target = ChannelTarget::process(&Cell::note(Note::None, 3), &song, &ch);
        assert_eq!(ch.target.action, NoteAction::Retrigger);
        ch.commit_target(&song, false);
        assert!(ch.active);
        assert_eq!(ch.volume.to_native(), 16);
        // Same note, retuned to the new instrument's C2SPD.
        assert_eq!(ch.period, Period(856));
        assert_eq!(ch.take_voice(Volume::FULL).trigger, Some(0));
    }

    #[test]
    fn instrument_without_note_on_idle_channel_sets_volume_only() {
        let song = song();
        let mut ch = channel();
        ch.set_volume(Volume::from_native(5));
        ch.target = ChannelTarget::process(&Cell::note(Note::None, 1), &song, &ch);
        ch.commit_target(&song, false);
        assert!(!ch.active);
        assert_eq!(ch.volume.to_native(), 48);
    }

    #[test]
    fn invalid_instrument_drops_note_but_keeps_volume_column() {
        let song = song();
        let mut ch = channel();
        let cell = Cell::note(c4(), 2).with_volume(10);
        ch.target = ChannelTarget::process(&cell, &song, &ch);
        assert_eq!(ch.target.action, NoteAction::None);
        ch.commit_target(&song, false);
        assert!(!ch.active);
        assert_eq!(ch.instrument, None);
        assert_eq!(ch.volume.to_native(), 10);

        let out_of_range = ChannelTarget::process(&Cell::note(c4(), 99), &song, &ch);
        assert_eq!(out_of_range.action, NoteAction::None);
    }

    #[test]
    fn instrument_volume_resolves_against_new_instrument() {
        let song = song();
        let mut ch = channel();
        ch.instrument = Some(1);
        ch.target = ChannelTarget::process(&Cell::note(c4(), 3), &song, &ch);
        ch.commit_target(&song, false);
        assert_eq!(ch.volume.to_native(), 16);
        // Double C2SPD halves the period.
        assert_eq!(ch.period, Period(856));
    }

    #[test]
    fn volume_column_overrides_instrument_default() {
        let song = song();
        let mut ch = channel();
        let cell = Cell::note(c4(), 1).with_volume(32);
        ch.target = ChannelTarget::process(&cell, &song, &ch);
        ch.commit_target(&song, false);
        assert_eq!(ch.volume.value(), 0.5);
    }

    #[test]
    fn key_off_and_cut() {
        let song = song();
        let mut ch = channel();
        ch.target = ChannelTarget::process(&Cell::note(c4(), 1), &song, &ch);
        ch.commit_target(&song, false);

        ch.target = ChannelTarget::process(&Cell::note(Note::Off, 0), &song, &ch);
        ch.commit_target(&song, false);
        assert!(!ch.active);
        assert_eq!(ch.volume.to_native(), 48);

        ch.target = ChannelTarget::process(&Cell::note(Note::Cut, 0), &song, &ch);
        ch.commit_target(&song, false);
        assert_eq!(ch.volume, Volume::SILENT);
    }

    #[test]
    fn commit_is_idempotent() {
        let song = song();
        let mut ch = channel();
        ch.target = ChannelTarget::process(&Cell::note(c4(), 1), &song, &ch);
        ch.commit_target(&song, false);
        ch.set_volume(Volume::from_native(3));
        ch.commit_target(&song, false);
        assert!(ch.target.is_committed());
        assert_eq!(ch.volume.to_native(), 3);
    }

    #[test]
    fn glide_sets_porta_target_without_retrigger() {
        let song = song();
        let mut ch = channel();
        ch.instrument = Some(1);
        ch.set_period(Period(1712));
        ch.target = ChannelTarget::process(&Cell::note(Note::On(Semitone::C4.transpose(12)), 0), &song, &ch);
        ch.target.action = NoteAction::Glide;
        ch.commit_target(&song, false);
        assert_eq!(ch.porta_target, Period(856));
        assert_eq!(ch.base_period, Period(1712));
        assert!(!ch.active);
    }
}
