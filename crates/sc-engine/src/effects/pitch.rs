//! Pitch effects: portamento, tone portamento, vibrato, arpeggio, finetune.

use core::fmt;

use sc_ir::Period;

use crate::channel::ChannelState;
use crate::channel_data::NoteAction;
use crate::playback::Playback;

/// Slide resolution selected by the parameter's high nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fineness {
    /// `xx * 4` on every tick but the first
    Normal,
    /// `0xFx`: `x * 4`, tick 0 only
    Fine,
    /// `0xEx`: `x`, tick 0 only
    ExtraFine,
}

impl Fineness {
    /// Split a porta parameter into its resolution and amount.
    pub fn split(param: u8) -> (Fineness, u8) {
        match param >> 4 {
            0xF => (Fineness::Fine, param & 0x0F),
            0xE => (Fineness::ExtraFine, param & 0x0F),
            _ => (Fineness::Normal, param),
        }
    }
}

/// Portamento up (`F`) or down (`E`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Porta {
    /// Toward higher pitch, i.e. lower periods
    pub up: bool,
    pub amount: u8,
    pub fineness: Fineness,
}

impl Porta {
    pub fn new(up: bool, param: u8) -> Self {
        let (fineness, amount) = Fineness::split(param);
        Self { up, amount, fineness }
    }

    fn delta(&self, tick: u32) -> Option<i32> {
        let delta = match self.fineness {
            Fineness::Normal if tick > 0 => self.amount as i32 * 4,
            Fineness::Fine if tick == 0 => self.amount as i32 * 4,
            Fineness::ExtraFine if tick == 0 => self.amount as i32,
            _ => return None,
        };
        Some(if self.up { -delta } else { delta })
    }

    pub(super) fn tick(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, tick: u32) {
        if ch.base_period.is_zero() {
            return;
        }
        if let Some(delta) = self.delta(tick) {
            let period = ch.base_period.offset(delta).clamp(pb.flags.amiga_limits);
            ch.set_period(period);
        }
    }
}

impl fmt::Display for Porta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fineness {
            Fineness::Normal => write!(f, "{}", self.amount),
            Fineness::Fine => write!(f, "fine {}", self.amount),
            Fineness::ExtraFine => write!(f, "extra fine {}", self.amount),
        }
    }
}

/// Vibrato (`H`, `U`, and the vibrato half of `K`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vibrato {
    pub speed: u8,
    pub depth: u8,
    /// `U`: a quarter of the depth
    pub fine: bool,
}

impl Vibrato {
    pub(super) fn tick(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, tick: u32) {
        if tick == 0 && !pb.flags.legacy_vibrato {
            return;
        }
        let mut shift = if self.fine { 7 } else { 5 };
        if pb.flags.old_st_vibrato {
            shift -= 1;
        }
        let random = pb.random();
        let delta = ch.vibrato.step(self.speed, self.depth, shift, random);
        if !ch.base_period.is_zero() {
            ch.period = ch.base_period.offset(delta).clamp(pb.flags.amiga_limits);
        }
    }
}

/// A tone porta on a row with a note glides to it instead of restarting;
/// a bare instrument keeps the slide running.
pub(super) fn tone_porta_pre_start(ch: &mut ChannelState) {
    match ch.target.action {
        NoteAction::Trigger => ch.target.action = NoteAction::Glide,
        NoteAction::Retrigger => ch.target.action = NoteAction::None,
        _ => {}
    }
}

pub(super) fn tone_porta(ch: &mut ChannelState, pb: &mut Playback<'_>, speed: u8, tick: u32) {
    if tick == 0 || ch.porta_target.is_zero() || ch.base_period.is_zero() {
        return;
    }
    let step = speed as u32 * 4;
    let (current, target) = (ch.base_period.0, ch.porta_target.0);
    let period = if current > target {
        current.saturating_sub(step).max(target)
    } else {
        current.saturating_add(step).min(target)
    };
    ch.set_period(Period(period).clamp(pb.flags.amiga_limits));
}

/// Cycle through the base note and two offsets, one per tick.
pub(super) fn arpeggio(ch: &mut ChannelState, pb: &mut Playback<'_>, x: u8, y: u8, tick: u32) {
    let Some(semitone) = ch.semitone else {
        return;
    };
    if ch.base_period.is_zero() {
        return;
    }
    let offset = match tick % 3 {
        0 => 0,
        1 => x,
        _ => y,
    };
    ch.period = Period::from_semitone(semitone.transpose(offset), ch.c2spd).clamp(pb.flags.amiga_limits);
}

pub(super) fn set_finetune(ch: &mut ChannelState, c2spd: u32) {
    ch.target.c2spd = Some(c2spd);
}
