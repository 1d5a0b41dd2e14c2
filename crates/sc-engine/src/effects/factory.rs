//! Maps a raw command and parameter to an [`Effect`].

use sc_ir::Panning;

use super::{Effect, EffectKind, Porta, Vibrato, VolumeSlide};
use crate::config::Features;
use crate::error::EngineError;
use crate::memory::{EffectMemory, MemoryCell};

/// C2SPD for each `S2x` finetune step (Amiga finetune -8..=7).
const FINETUNE_C2SPD: [u32; 16] = [
    7895, 7941, 7985, 8046, 8107, 8169, 8232, 8280, 8363, 8413, 8463, 8529, 8581, 8651, 8723, 8757,
];

/// Build the effect for one cell.
///
/// Every nonzero parameter is remembered in [`MemoryCell::LastNonZero`],
/// whatever the command; commands with their own cells resolve against those.
pub fn build(
    command: u8,
    param: u8,
    memory: &mut EffectMemory,
    features: &Features,
) -> Result<Effect, EngineError> {
    let recalled = memory.remember_or_recall(param, MemoryCell::LastNonZero);
    let (hi, lo) = (recalled >> 4, recalled & 0x0F);

    let kind = match command {
        0 => return Ok(Effect::None),
        0x01 => EffectKind::SetSpeed(param),
        0x02 => EffectKind::OrderJump(param),
        0x03 => EffectKind::PatternBreak((param >> 4) as u16 * 10 + (param & 0x0F) as u16),
        0x04 => EffectKind::VolumeSlide(VolumeSlide::from_param(recalled)),
        0x05 => EffectKind::Porta(Porta::new(false, recalled)),
        0x06 => EffectKind::Porta(Porta::new(true, recalled)),
        0x07 => EffectKind::TonePorta(memory.remember_or_recall(param, MemoryCell::Porta)),
        0x08 | 0x15 => {
            let (speed, depth) = memory.remember_or_recall_nibbles(param, MemoryCell::VibratoSpeed, MemoryCell::VibratoDepth);
            EffectKind::Vibrato(Vibrato { speed, depth, fine: command == 0x15 })
        }
        0x09 => EffectKind::Tremor { on: hi, off: lo },
        0x0A => EffectKind::Arpeggio { x: hi, y: lo },
        0x0B => {
            let vibrato = Vibrato {
                speed: memory.recall(MemoryCell::VibratoSpeed),
                depth: memory.recall(MemoryCell::VibratoDepth),
                fine: false,
            };
            let slide = EffectKind::VolumeSlide(VolumeSlide::from_param(recalled));
            return Ok(Effect::Combined([slide, EffectKind::Vibrato(vibrato)]));
        }
        0x0C => {
            let speed = memory.recall(MemoryCell::Porta);
            let slide = EffectKind::VolumeSlide(VolumeSlide::from_param(recalled));
            return Ok(Effect::Combined([slide, EffectKind::TonePorta(speed)]));
        }
        0x0F => EffectKind::SampleOffset(memory.remember_or_recall(param, MemoryCell::SampleOffset) as u32 * 256),
        0x11 => EffectKind::Retrigger { volume: hi, interval: lo },
        0x12 => {
            let (speed, depth) = memory.remember_or_recall_nibbles(param, MemoryCell::TremoloSpeed, MemoryCell::TremoloDepth);
            EffectKind::Tremolo { speed, depth }
        }
        0x13 => return special(hi, lo, recalled, features),
        0x14 if param >= 0x20 => EffectKind::SetTempo(param),
        0x14 => match memory.remember_or_recall(param, MemoryCell::TempoSlide) {
            slide @ 0x00..=0x0F => EffectKind::TempoSlide(-(slide as i8)),
            slide => EffectKind::TempoSlide((slide - 0x10) as i8),
        },
        0x16 => EffectKind::SetGlobalVolume(param),
        0x18 => EffectKind::SetPan(Panning::from_byte(param)),
        _ => return unknown(command, param, features),
    };
    Ok(Effect::Single(kind))
}

/// `Sxy` sub-commands.
fn special(hi: u8, lo: u8, param: u8, features: &Features) -> Result<Effect, EngineError> {
    let kind = match hi {
        0x0 => return unsupported("SetFilter", param, features),
        0x1 => return unsupported("Glissando", param, features),
        0x2 => EffectKind::SetFinetune(FINETUNE_C2SPD[lo as usize]),
        0x3 => EffectKind::SetVibratoWaveform(lo),
        0x4 => EffectKind::SetTremoloWaveform(lo),
        0x6 => EffectKind::FinePatternDelay(lo),
        0x8 => EffectKind::SetPan(Panning::from_nibble(lo)),
        0xB => EffectKind::PatternLoop(lo),
        0xC => EffectKind::NoteCut(lo),
        0xD => EffectKind::NoteDelay(lo),
        0xE => EffectKind::PatternDelay(lo),
        0xF => return unsupported("FunkRepeat", param, features),
        _ => return unknown(0x13, param, features),
    };
    Ok(Effect::Single(kind))
}

fn unsupported(name: &'static str, param: u8, features: &Features) -> Result<Effect, EngineError> {
    if features.abort_on_unsupported {
        return Err(EngineError::UnsupportedEffect { name, param });
    }
    log::debug!("unsupported effect {name} ({param:02X}) ignored");
    Ok(Effect::Single(EffectKind::Unhandled { command: 0x13, param }))
}

fn unknown(command: u8, param: u8, features: &Features) -> Result<Effect, EngineError> {
    let letter = match command {
        1..=26 => (b'A' + command - 1) as char,
        _ => '?',
    };
    if !features.ignore_unknown_effects {
        return Err(EngineError::UnknownEffect { command: letter, param });
    }
    log::warn!("unknown effect {letter}{param:02X} ignored");
    Ok(Effect::Single(EffectKind::Unhandled { command, param }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Fineness;
    use sc_ir::command_index;

    fn build_with(memory: &mut EffectMemory, letter: u8, param: u8) -> Effect {
        build(command_index(letter), param, memory, &Features::default()).unwrap()
    }

    fn single(effect: Effect) -> EffectKind {
        match effect {
            Effect::Single(kind) => kind,
            other => panic!("expected a single effect, got {other:?}"),
        }
    }

    #[test]
    fn no_command_is_none_but_param_is_remembered() {
        let mut memory = EffectMemory::default();
        assert_eq!(build(0, 0x24, &mut memory, &Features::default()), Ok(Effect::None));
        assert_eq!(memory.recall(MemoryCell::LastNonZero), 0x24);
    }

    #[test]
    fn zero_param_recalls_last_nonzero() {
        let mut memory = EffectMemory::default();
        build_with(&mut memory, b'D', 0x04);
        assert_eq!(single(build_with(&mut memory, b'D', 0)), EffectKind::VolumeSlide(VolumeSlide::from_param(0x04)));
        // Any command feeds the shared cell.
        build_with(&mut memory, b'A', 0x03);
        assert_eq!(single(build_with(&mut memory, b'E', 0)), EffectKind::Porta(Porta::new(false, 0x03)));
    }

    #[test]
    fn porta_fineness_from_high_nibble() {
        let mut memory = EffectMemory::default();
        let EffectKind::Porta(porta) = single(build_with(&mut memory, b'F', 0xE4)) else {
            panic!("expected porta");
        };
        assert!(porta.up);
        assert_eq!((porta.fineness, porta.amount), (Fineness::ExtraFine, 4));
        let EffectKind::Porta(porta) = single(build_with(&mut memory, b'E', 0xF2)) else {
            panic!("expected porta");
        };
        assert_eq!((porta.fineness, porta.amount), (Fineness::Fine, 2));
    }

    #[test]
    fn tone_porta_uses_its_own_cell() {
        let mut memory = EffectMemory::default();
        build_with(&mut memory, b'G', 0x10);
        build_with(&mut memory, b'D', 0x02);
        assert_eq!(single(build_with(&mut memory, b'G', 0)), EffectKind::TonePorta(0x10));
    }

    #[test]
    fn vibrato_nibbles_recall_independently() {
        let mut memory = EffectMemory::default();
        build_with(&mut memory, b'H', 0x46);
        let kind = single(build_with(&mut memory, b'U', 0x02));
        assert_eq!(kind, EffectKind::Vibrato(Vibrato { speed: 4, depth: 2, fine: true }));
    }

    #[test]
    fn combined_effects_continue_from_memory() {
        let mut memory = EffectMemory::default();
        build_with(&mut memory, b'H', 0x46);
        build_with(&mut memory, b'G', 0x08);
        let k = build_with(&mut memory, b'K', 0x03);
        assert_eq!(
            k,
            Effect::Combined([
                EffectKind::VolumeSlide(VolumeSlide::from_param(0x03)),
                EffectKind::Vibrato(Vibrato { speed: 4, depth: 6, fine: false }),
            ])
        );
        let l = build_with(&mut memory, b'L', 0x20);
        assert_eq!(l.name(), "TonePortaVolumeSlide");
        assert_eq!(
            l,
            Effect::Combined([EffectKind::VolumeSlide(VolumeSlide::from_param(0x20)), EffectKind::TonePorta(0x08)])
        );
    }

    #[test]
    fn sample_offset_is_in_pages() {
        let mut memory = EffectMemory::default();
        assert_eq!(single(build_with(&mut memory, b'O', 0x02)), EffectKind::SampleOffset(512));
        assert_eq!(single(build_with(&mut memory, b'O', 0)), EffectKind::SampleOffset(512));
    }

    #[test]
    fn pattern_break_is_decimal() {
        let mut memory = EffectMemory::default();
        assert_eq!(single(build_with(&mut memory, b'C', 0x32)), EffectKind::PatternBreak(32));
        // C00 is row 0, not a recall.
        assert_eq!(single(build_with(&mut memory, b'C', 0)), EffectKind::PatternBreak(0));
    }

    #[test]
    fn tempo_set_and_slide() {
        let mut memory = EffectMemory::default();
        assert_eq!(single(build_with(&mut memory, b'T', 0x80)), EffectKind::SetTempo(0x80));
        assert_eq!(single(build_with(&mut memory, b'T', 0x04)), EffectKind::TempoSlide(-4));
        assert_eq!(single(build_with(&mut memory, b'T', 0x13)), EffectKind::TempoSlide(3));
        assert_eq!(single(build_with(&mut memory, b'T', 0)), EffectKind::TempoSlide(3));
    }

    #[test]
    fn special_subcommands() {
        let mut memory = EffectMemory::default();
        let cases = [
            (0x2F, EffectKind::SetFinetune(8757)),
            (0x28, EffectKind::SetFinetune(8363)),
            (0x31, EffectKind::SetVibratoWaveform(1)),
            (0x62, EffectKind::FinePatternDelay(2)),
            (0xB0, EffectKind::PatternLoop(0)),
            (0xC3, EffectKind::NoteCut(3)),
            (0xD2, EffectKind::NoteDelay(2)),
            (0xE1, EffectKind::PatternDelay(1)),
        ];
        for (param, expected) in cases {
            assert_eq!(single(build_with(&mut memory, b'S', param)), expected, "S{param:02X}");
        }
    }

    #[test]
    fn unknown_effects_follow_policy() {
        let mut memory = EffectMemory::default();
        let lenient = build(command_index(b'Z'), 0x10, &mut memory, &Features::default());
        assert!(matches!(lenient, Ok(Effect::Single(EffectKind::Unhandled { .. }))));

        let strict = build(command_index(b'Z'), 0x10, &mut memory, &Features::strict());
        assert_eq!(strict, Err(EngineError::UnknownEffect { command: 'Z', param: 0x10 }));
    }

    #[test]
    fn unsupported_effects_abort_only_when_asked() {
        let mut memory = EffectMemory::default();
        let features = Features {
            abort_on_unsupported: true,
            ..Features::default()
        };
        let funk = build(command_index(b'S'), 0xF1, &mut memory, &features);
        assert_eq!(funk, Err(EngineError::UnsupportedEffect { name: "FunkRepeat", param: 0xF1 }));

        let lenient = build(command_index(b'S'), 0x11, &mut memory, &Features::default());
        assert!(lenient.is_ok());
    }
}
