//! Instrument definitions.

use arrayvec::ArrayString;

use crate::pitch::BASE_C2SPD;
use crate::sample::Sample;
use crate::volume::Volume;

/// What an instrument plays.
#[derive(Clone, Debug, Default)]
pub enum InstrumentKind {
    /// Unused slot; referencing it invalidates the note.
    #[default]
    Empty,
    /// Sampled PCM data.
    Sample(Sample),
    /// OPL2 (Adlib) patch registers, passed through opaquely.
    Fm([u8; 12]),
}

/// An instrument definition.
#[derive(Clone, Debug)]
pub struct Instrument {
    /// Instrument name
    pub name: ArrayString<28>,
    /// What the instrument plays
    pub kind: InstrumentKind,
    /// Default volume on the native 0-64 scale
    pub default_volume: u8,
    /// Playback rate that reproduces the recorded pitch at middle C
    pub c2spd: u32,
}

impl Default for Instrument {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            kind: InstrumentKind::Empty,
            default_volume: 64,
            c2spd: BASE_C2SPD,
        }
    }
}

impl Instrument {
    /// Create an empty instrument slot.
    pub fn new(name: &str) -> Self {
        let mut inst = Self::default();
        let _ = inst.name.try_push_str(name);
        inst
    }

    /// Create a sampled instrument.
    pub fn sampled(name: &str, sample: Sample, default_volume: u8) -> Self {
        Self {
            kind: InstrumentKind::Sample(sample),
            default_volume: default_volume.min(64),
            ..Self::new(name)
        }
    }

    /// Create an FM instrument.
    pub fn fm(name: &str, registers: [u8; 12], default_volume: u8) -> Self {
        Self {
            kind: InstrumentKind::Fm(registers),
            default_volume: default_volume.min(64),
            ..Self::new(name)
        }
    }

    /// Whether notes may be triggered with this instrument.
    pub fn is_playable(&self) -> bool {
        !matches!(self.kind, InstrumentKind::Empty)
    }

    /// The sample, for sampled instruments.
    pub fn sample(&self) -> Option<&Sample> {
        match &self.kind {
            InstrumentKind::Sample(sample) => Some(sample),
            _ => None,
        }
    }

    pub fn volume(&self) -> Volume {
        Volume::from_native(self.default_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleData;

    #[test]
    fn empty_slot_is_not_playable() {
        assert!(!Instrument::new("blank").is_playable());
        assert!(Instrument::fm("bass", [0; 12], 48).is_playable());
    }

    #[test]
    fn sampled_clamps_default_volume() {
        let inst = Instrument::sampled("lead", Sample::new(SampleData::Mono8(alloc::vec![1, 2])), 99);
        assert_eq!(inst.default_volume, 64);
        assert!(inst.sample().is_some());
        assert_eq!(inst.c2spd, BASE_C2SPD);
    }
}
