//! Volume effects.

use core::fmt;

use sc_ir::{Volume, NATIVE_VOLUME_MAX};

use crate::channel::ChannelState;
use crate::playback::Playback;

/// Volume change per retrigger, indexed by the `Qxy` high nibble.
/// The second half holds multipliers (in sixteenths); 0 means "add instead".
const RETRIG_VOL_ADD: [i8; 32] = [
    0, -1, -2, -4, -8, -16, 0, 0, 0, 1, 2, 4, 8, 16, 0, 0,
    0, 0, 0, 0, 0, 0, 10, 8, 0, 0, 0, 0, 0, 0, 24, 32,
];

/// `Dxy` decoded into a signed native delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeSlide {
    pub delta: i8,
    /// Applies once, on tick 0
    pub fine: bool,
}

impl VolumeSlide {
    pub fn from_param(param: u8) -> Self {
        let (hi, lo) = ((param >> 4) as i8, (param & 0x0F) as i8);
        match (hi, lo) {
            (0, 0xF) => Self { delta: -15, fine: false },
            (0xF, 0) => Self { delta: 15, fine: false },
            (_, 0xF) => Self { delta: hi, fine: true },
            (0xF, _) => Self { delta: -lo, fine: true },
            (_, 0) => Self { delta: hi, fine: false },
            _ => Self { delta: -lo, fine: false },
        }
    }

    pub(super) fn tick(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, tick: u32) {
        let applies = if self.fine {
            tick == 0
        } else {
            tick > 0 || pb.flags.vol_slide_every_frame
        };
        if applies && self.delta != 0 {
            ch.volume = ch.volume.slide(self.delta as i32);
        }
    }
}

impl fmt::Display for VolumeSlide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fine {
            write!(f, "fine {:+}", self.delta)
        } else {
            write!(f, "{:+}", self.delta)
        }
    }
}

pub(super) fn tremor(ch: &mut ChannelState, on: u8, off: u8) {
    if let Some(audible) = ch.memory.tremor.tick(on, off) {
        ch.volume = if audible { ch.base_volume } else { Volume::SILENT };
    }
}

/// Restart the sample every `interval` ticks, changing the volume each time.
pub(super) fn retrigger(ch: &mut ChannelState, volume: u8, interval: u8) {
    if interval == 0 || ch.retrigger_count < interval {
        ch.retrigger_count = ch.retrigger_count.saturating_add(1);
        return;
    }
    ch.retrigger_count = 0;
    ch.restart(0);

    let index = (volume & 0x0F) as usize;
    let native = ch.volume.to_native() as i32;
    let native = match RETRIG_VOL_ADD[16 + index] {
        0 => native + RETRIG_VOL_ADD[index] as i32,
        factor => native * factor as i32 / 16,
    };
    ch.volume = Volume::from_native(native.clamp(0, NATIVE_VOLUME_MAX as i32) as u8);
    // The retrigger tick counts toward the next interval.
    ch.retrigger_count = 1;
}

/// Swing the volume around the base volume.
pub(super) fn tremolo(ch: &mut ChannelState, pb: &mut Playback<'_>, speed: u8, depth: u8, tick: u32) {
    if tick == 0 && !pb.flags.legacy_vibrato {
        return;
    }
    let random = pb.random();
    let delta = ch.tremolo.step(speed, depth, 7, random);
    if ch.base_volume != Volume::SILENT {
        ch.volume = ch.base_volume.slide(delta);
    }
}

pub(super) fn note_cut(ch: &mut ChannelState, at: u8, tick: u32) {
    if at != 0 && tick == at as u32 {
        ch.volume = Volume::SILENT;
    }
}

pub(super) fn set_global_volume(pb: &mut Playback<'_>, volume: u8) {
    if volume <= 64 {
        *pb.global_volume = Volume::from_native(volume);
    }
}
