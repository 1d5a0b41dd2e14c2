//! Pitch types: tracker periods and packed semitones.
//!
//! Periods are expressed in Scream Tracker's internal unit: a C-4 played
//! by an instrument whose C2SPD is 8363 Hz has period 1712. Lower periods
//! mean higher pitch.

use core::fmt;

/// The C2SPD every period table is written against.
pub const BASE_C2SPD: u32 = 8363;

/// Clock constant dividing a period to give the playback frequency in Hz.
const PERIOD_CLOCK: u32 = 14_317_056;

/// Periods of octave 0 (already multiplied by 16, the octave-0 shift).
const NOTE_PERIODS: [u32; 12] = [
    1712 * 16, 1616 * 16, 1524 * 16, 1440 * 16, 1356 * 16, 1280 * 16,
    1208 * 16, 1140 * 16, 1076 * 16, 1016 * 16, 960 * 16, 907 * 16,
];

/// Key names used by [`Semitone`]'s `Display` impl.
const KEY_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

/// A note pitch: octave in the high nibble, key (0-11) in the low nibble.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Semitone(u8);

impl Semitone {
    /// Highest octave a semitone can name.
    pub const MAX_OCTAVE: u8 = 9;

    /// Middle C as used by the default C2SPD.
    pub const C4: Semitone = Semitone(0x40);

    /// Create a semitone from an octave (0-9) and key (0-11), or `None` if out of range.
    pub const fn new(octave: u8, key: u8) -> Option<Self> {
        if octave > Self::MAX_OCTAVE || key > 11 {
            None
        } else {
            Some(Semitone((octave << 4) | key))
        }
    }

    /// Decode a packed S3M note byte.
    pub const fn from_packed(byte: u8) -> Option<Self> {
        Self::new(byte >> 4, byte & 0x0F)
    }

    /// Linear index `octave * 12 + key`, in 0..=131.
    pub const fn from_index(index: u8) -> Option<Self> {
        Self::new(index / 12, index % 12)
    }

    pub const fn packed(self) -> u8 {
        self.0
    }

    pub const fn octave(self) -> u8 {
        self.0 >> 4
    }

    pub const fn key(self) -> u8 {
        self.0 & 0x0F
    }

    pub const fn index(self) -> u8 {
        self.octave() * 12 + self.key()
    }

    /// Move up by `keys` semitones, carrying into the octave.
    ///
    /// Saturates at B-9.
    pub fn transpose(self, keys: u8) -> Self {
        let index = (self.index() as u16 + keys as u16).min(131) as u8;
        Semitone::from_index(index).unwrap_or(self)
    }
}

impl fmt::Display for Semitone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", KEY_NAMES[self.key() as usize % 12], self.octave())
    }
}

/// A pitch in tracker period units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(pub u32);

impl Period {
    /// Lowest period (highest pitch) Scream Tracker allows.
    pub const MIN: Period = Period(64);
    /// Highest period (lowest pitch) Scream Tracker allows.
    pub const MAX: Period = Period(32767);
    /// Amiga-limits lower bound (B-5).
    pub const AMIGA_MIN: Period = Period(907 / 2);
    /// Amiga-limits upper bound (C-3).
    pub const AMIGA_MAX: Period = Period(1712 * 2);

    /// Period of `semitone` for an instrument sampled at `c2spd`.
    pub fn from_semitone(semitone: Semitone, c2spd: u32) -> Period {
        let c2spd = if c2spd == 0 { BASE_C2SPD } else { c2spd };
        let base = NOTE_PERIODS[semitone.key() as usize % 12] >> semitone.octave();
        let scaled = (base as u64 * BASE_C2SPD as u64) / c2spd as u64;
        Period(scaled.min(Self::MAX.0 as u64) as u32)
    }

    /// Nearest semitone whose period matches this one at `c2spd`.
    ///
    /// Inverse of [`Period::from_semitone`] within one table step.
    pub fn to_semitone(self, c2spd: u32) -> Option<Semitone> {
        if self.0 == 0 {
            return None;
        }
        let c2spd = if c2spd == 0 { BASE_C2SPD } else { c2spd };
        let period = (self.0 as u64 * c2spd as u64 / BASE_C2SPD as u64) as u32;

        // Octave boundaries sit halfway between B of one octave and C of the next.
        let mut octave = 0u8;
        let mut boundary = (1712 * 8 + 907 * 16) / 2;
        while boundary >= period && octave < Semitone::MAX_OCTAVE {
            octave += 1;
            boundary /= 2;
        }

        let key = NOTE_PERIODS
            .iter()
            .enumerate()
            .min_by_key(|&(_, &p)| (p >> octave).abs_diff(period))
            .map(|(key, _)| key as u8)
            .unwrap_or(0);
        Semitone::new(octave, key)
    }

    /// Playback frequency in Hz.
    pub fn frequency(self) -> u32 {
        if self.0 == 0 {
            return 0;
        }
        PERIOD_CLOCK / self.0
    }

    /// 16.16 fixed-point step through sample data at `sample_rate`.
    pub fn increment(self, sample_rate: u32) -> u32 {
        if self.0 == 0 || sample_rate == 0 {
            return 0;
        }
        ((PERIOD_CLOCK as u64 * 65536) / (self.0 as u64 * sample_rate as u64)) as u32
    }

    /// Add a signed delta, saturating at zero.
    pub fn offset(self, delta: i32) -> Period {
        Period((self.0 as i64 + delta as i64).max(0) as u32)
    }

    /// Clamp into the playable range (Amiga range when `amiga_limits` is set).
    pub fn clamp(self, amiga_limits: bool) -> Period {
        if amiga_limits {
            Period(self.0.clamp(Self::AMIGA_MIN.0, Self::AMIGA_MAX.0))
        } else {
            Period(self.0.clamp(Self::MIN.0, Self::MAX.0))
        }
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}
