//! Effect objects and their four-phase lifecycle.
//!
//! Every row, each channel gets one [`Effect`] built by [`build`] from the
//! cell's command and parameter. The engine then drives it through:
//!
//! - `pre_start`: before the row's note/instrument/volume targets commit;
//!   may edit those targets or stage cursor changes.
//! - `start`: once at tick 0, after targets commit.
//! - `tick`: every tick of the row.
//! - `stop`: on the row's last tick, after `tick`.
//!
//! Combined commands (`K`, `L`) hold two simple effects that run in order.

mod factory;
mod flow;
mod pitch;
mod volume;

use core::fmt;

use sc_ir::Panning;

use crate::channel::ChannelState;
use crate::playback::Playback;

pub use factory::build;
pub use pitch::{Fineness, Porta, Vibrato};
pub use volume::VolumeSlide;

/// One simple effect with its resolved parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectKind {
    /// `Axx`
    SetSpeed(u8),
    /// `Bxx`
    OrderJump(u8),
    /// `Cxy`, already decoded to a row number
    PatternBreak(u16),
    /// `Dxy`
    VolumeSlide(VolumeSlide),
    /// `Exx` / `Fxx`
    Porta(Porta),
    /// `Gxx`
    TonePorta(u8),
    /// `Hxy` / `Uxy`
    Vibrato(Vibrato),
    /// `Ixy`
    Tremor { on: u8, off: u8 },
    /// `Jxy`
    Arpeggio { x: u8, y: u8 },
    /// `Oxx`, in sample frames
    SampleOffset(u32),
    /// `Qxy`
    Retrigger { volume: u8, interval: u8 },
    /// `Rxy`
    Tremolo { speed: u8, depth: u8 },
    /// `S2x`, as a C2SPD
    SetFinetune(u32),
    /// `S3x`
    SetVibratoWaveform(u8),
    /// `S4x`
    SetTremoloWaveform(u8),
    /// `S6x`
    FinePatternDelay(u8),
    /// `S8x` / `Xxx`
    SetPan(Panning),
    /// `SBx`
    PatternLoop(u8),
    /// `SCx`
    NoteCut(u8),
    /// `SDx`
    NoteDelay(u8),
    /// `SEx`
    PatternDelay(u8),
    /// `Txx` with xx >= 0x20
    SetTempo(u8),
    /// `T0x` / `T1x`
    TempoSlide(i8),
    /// `Vxx`
    SetGlobalVolume(u8),
    /// Anything the engine does not play.
    Unhandled { command: u8, param: u8 },
}

impl EffectKind {
    /// Short effect name, used by coverage tooling.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::SetSpeed(_) => "SetSpeed",
            EffectKind::OrderJump(_) => "OrderJump",
            EffectKind::PatternBreak(_) => "PatternBreak",
            EffectKind::VolumeSlide(_) => "VolumeSlide",
            EffectKind::Porta(p) if p.up => "PortaUp",
            EffectKind::Porta(_) => "PortaDown",
            EffectKind::TonePorta(_) => "TonePorta",
            EffectKind::Vibrato(v) if v.fine => "FineVibrato",
            EffectKind::Vibrato(_) => "Vibrato",
            EffectKind::Tremor { .. } => "Tremor",
            EffectKind::Arpeggio { .. } => "Arpeggio",
            EffectKind::SampleOffset(_) => "SampleOffset",
            EffectKind::Retrigger { .. } => "Retrigger",
            EffectKind::Tremolo { .. } => "Tremolo",
            EffectKind::SetFinetune(_) => "SetFinetune",
            EffectKind::SetVibratoWaveform(_) => "SetVibratoWaveform",
            EffectKind::SetTremoloWaveform(_) => "SetTremoloWaveform",
            EffectKind::FinePatternDelay(_) => "FinePatternDelay",
            EffectKind::SetPan(_) => "SetPan",
            EffectKind::PatternLoop(_) => "PatternLoop",
            EffectKind::NoteCut(_) => "NoteCut",
            EffectKind::NoteDelay(_) => "NoteDelay",
            EffectKind::PatternDelay(_) => "PatternDelay",
            EffectKind::SetTempo(_) => "SetTempo",
            EffectKind::TempoSlide(_) => "TempoSlide",
            EffectKind::SetGlobalVolume(_) => "SetGlobalVolume",
            EffectKind::Unhandled { .. } => "Unhandled",
        }
    }

    fn pre_start(&self, ch: &mut ChannelState, pb: &mut Playback<'_>) {
        match *self {
            EffectKind::TonePorta(_) => pitch::tone_porta_pre_start(ch),
            EffectKind::SampleOffset(offset) => ch.target.position = offset,
            EffectKind::SetFinetune(c2spd) => pitch::set_finetune(ch, c2spd),
            EffectKind::FinePatternDelay(ticks) => pb.update.add_fine_pattern_delay(ticks),
            EffectKind::PatternLoop(repeats) => flow::pattern_loop(ch, pb, repeats),
            EffectKind::NoteDelay(ticks) => ch.note_tick = ticks as u32,
            EffectKind::PatternDelay(repeats) if repeats > 0 => pb.update.set_pattern_delay(repeats + 1),
            _ => {}
        }
    }

    fn start(&self, ch: &mut ChannelState, pb: &mut Playback<'_>) {
        match *self {
            EffectKind::SetSpeed(speed) => pb.update.set_speed(speed),
            EffectKind::PatternBreak(row) => pb.update.set_next_row(row, false),
            EffectKind::SetVibratoWaveform(value) => ch.vibrato.set_waveform(value),
            EffectKind::SetTremoloWaveform(value) => ch.tremolo.set_waveform(value),
            EffectKind::SetPan(pan) => ch.pan = pan,
            EffectKind::SetTempo(tempo) => pb.update.set_tempo(tempo),
            EffectKind::SetGlobalVolume(volume) => volume::set_global_volume(pb, volume),
            _ => {}
        }
    }

    fn tick(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, tick: u32) {
        match *self {
            EffectKind::VolumeSlide(slide) => slide.tick(ch, pb, tick),
            EffectKind::Porta(porta) => porta.tick(ch, pb, tick),
            EffectKind::TonePorta(speed) => pitch::tone_porta(ch, pb, speed, tick),
            EffectKind::Vibrato(vibrato) => vibrato.tick(ch, pb, tick),
            EffectKind::Tremor { on, off } => volume::tremor(ch, on, off),
            EffectKind::Arpeggio { x, y } => pitch::arpeggio(ch, pb, x, y, tick),
            EffectKind::Retrigger { volume, interval } => volume::retrigger(ch, volume, interval),
            EffectKind::Tremolo { speed, depth } => volume::tremolo(ch, pb, speed, depth, tick),
            EffectKind::NoteCut(at) => volume::note_cut(ch, at, tick),
            EffectKind::TempoSlide(delta) => flow::tempo_slide(pb, delta, tick),
            _ => {}
        }
    }

    fn stop(&self, _ch: &mut ChannelState, pb: &mut Playback<'_>, _last_tick: u32) {
        if let EffectKind::OrderJump(order) = *self {
            flow::order_jump(pb, order);
        }
    }
}

/// The effect a channel runs for one row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Effect {
    /// No command on this row.
    #[default]
    None,
    Single(EffectKind),
    /// Volume slide first, then the continued effect.
    Combined([EffectKind; 2]),
}

impl Effect {
    /// Name of the effect (combined effects are named after both parts).
    pub fn name(&self) -> &'static str {
        match self {
            Effect::None => "None",
            Effect::Single(kind) => kind.name(),
            Effect::Combined([_, EffectKind::Vibrato(_)]) => "VibratoVolumeSlide",
            Effect::Combined(_) => "TonePortaVolumeSlide",
        }
    }

    fn kinds(&self) -> &[EffectKind] {
        match self {
            Effect::None => &[],
            Effect::Single(kind) => core::slice::from_ref(kind),
            Effect::Combined(kinds) => kinds,
        }
    }

    /// Whether this row's command keeps the vibrato/tremolo phase running.
    fn continues_oscillators(&self) -> bool {
        self.kinds()
            .iter()
            .any(|k| matches!(k, EffectKind::Vibrato(_) | EffectKind::Tremolo { .. }))
    }

    pub fn pre_start(&self, ch: &mut ChannelState, pb: &mut Playback<'_>) {
        for kind in self.kinds() {
            kind.pre_start(ch, pb);
        }
    }

    pub fn start(&self, ch: &mut ChannelState, pb: &mut Playback<'_>) {
        if !matches!(self, Effect::Single(EffectKind::Retrigger { .. })) {
            ch.retrigger_count = 0;
        }
        ch.period = ch.base_period;
        if *self != Effect::None {
            if !matches!(self, Effect::Single(EffectKind::Tremor { .. })) {
                ch.memory.tremor.reset();
            }
            if !self.continues_oscillators() {
                ch.vibrato.interrupt();
                ch.tremolo.interrupt();
            }
        }
        for kind in self.kinds() {
            kind.start(ch, pb);
        }
    }

    pub fn tick(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, tick: u32) {
        // K and L do nothing on tick 0, fine slides included.
        if matches!(self, Effect::Combined(_)) && tick == 0 && !pb.flags.legacy_vibrato {
            return;
        }
        for kind in self.kinds() {
            kind.tick(ch, pb, tick);
        }
    }

    pub fn stop(&self, ch: &mut ChannelState, pb: &mut Playback<'_>, last_tick: u32) {
        for kind in self.kinds() {
            kind.stop(ch, pb, last_tick);
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::VolumeSlide(slide) => write!(f, "{}({})", self.name(), slide),
            EffectKind::Porta(porta) => write!(f, "{}({})", self.name(), porta),
            EffectKind::Vibrato(v) => write!(f, "{}({}, {})", self.name(), v.speed, v.depth),
            EffectKind::Tremolo { speed, depth } => write!(f, "{}({speed}, {depth})", self.name()),
            EffectKind::Tremor { on, off } => write!(f, "{}({on}, {off})", self.name()),
            EffectKind::Arpeggio { x, y } => write!(f, "{}({x}, {y})", self.name()),
            EffectKind::Retrigger { volume, interval } => write!(f, "{}({volume}, {interval})", self.name()),
            EffectKind::SetPan(pan) => write!(f, "{}({:.2})", self.name(), pan.value()),
            EffectKind::TempoSlide(delta) => write!(f, "{}({delta:+})", self.name()),
            EffectKind::Unhandled { command, param } => {
                let letter = (b'@' + command.min(&26)) as char;
                write!(f, "{}({letter}{param:02X})", self.name())
            }
            EffectKind::SetSpeed(v)
            | EffectKind::OrderJump(v)
            | EffectKind::TonePorta(v)
            | EffectKind::SetVibratoWaveform(v)
            | EffectKind::SetTremoloWaveform(v)
            | EffectKind::FinePatternDelay(v)
            | EffectKind::PatternLoop(v)
            | EffectKind::NoteCut(v)
            | EffectKind::NoteDelay(v)
            | EffectKind::PatternDelay(v)
            | EffectKind::SetTempo(v)
            | EffectKind::SetGlobalVolume(v) => write!(f, "{}({v})", self.name()),
            EffectKind::PatternBreak(row) => write!(f, "{}({row})", self.name()),
            EffectKind::SampleOffset(v) | EffectKind::SetFinetune(v) => write!(f, "{}({v})", self.name()),
        }
    }
}

/// Combined effects show only the volume slide's parameter.
impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => f.write_str("None"),
            Effect::Single(kind) => write!(f, "{kind}"),
            Effect::Combined([EffectKind::VolumeSlide(slide), _]) => write!(f, "{}({slide})", self.name()),
            Effect::Combined([first, _]) => write!(f, "{}({first})", self.name()),
        }
    }
}
