//! Vibrato and tremolo oscillator.

/// Sine table shared by the sine and random waveforms (one full cycle, 64 steps).
const SINE: [i16; 64] = [
    0x00, 0x18, 0x31, 0x4A, 0x61, 0x78, 0x8D, 0xA1,
    0xB4, 0xC5, 0xD4, 0xE0, 0xEB, 0xF4, 0xFA, 0xFD,
    0xFF, 0xFD, 0xFA, 0xF4, 0xEB, 0xE0, 0xD4, 0xC5,
    0xB4, 0xA1, 0x8D, 0x78, 0x61, 0x4A, 0x31, 0x18,
    0x00, -0x18, -0x31, -0x4A, -0x61, -0x78, -0x8D, -0xA1,
    -0xB4, -0xC5, -0xD4, -0xE0, -0xEB, -0xF4, -0xFA, -0xFD,
    -0xFF, -0xFD, -0xFA, -0xF4, -0xEB, -0xE0, -0xD4, -0xC5,
    -0xB4, -0xA1, -0x8D, -0x78, -0x61, -0x4A, -0x31, -0x18,
];

/// Waveform shape selected by `S3x` / `S4x`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Sine,
    RampDown,
    Square,
    Random,
}

impl Waveform {
    fn value(self, step: usize) -> i32 {
        let step = step & 63;
        match self {
            Waveform::Sine | Waveform::Random => SINE[step] as i32,
            // -248 just after the start, rising to 248 at the end of the cycle.
            Waveform::RampDown if step == 0 => 0,
            Waveform::RampDown => (step as i32 - 32) * 8,
            Waveform::Square if step < 32 => 255,
            Waveform::Square => 0,
        }
    }
}

/// Oscillator phase plus waveform selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Oscillator {
    phase: u8,
    waveform: Waveform,
    /// Bit 2 of the waveform command: keep the phase across interruptions.
    continuous: bool,
    /// Another command interrupted the effect; restart on next use.
    interrupted: bool,
}

impl Oscillator {
    /// Apply an `S3x`/`S4x` waveform value.
    pub fn set_waveform(&mut self, value: u8) {
        self.waveform = match value & 3 {
            0 => Waveform::Sine,
            1 => Waveform::RampDown,
            2 => Waveform::Square,
            _ => Waveform::Random,
        };
        self.continuous = value & 4 != 0;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// A new note was triggered.
    pub fn retrigger(&mut self) {
        self.phase = 0;
        self.interrupted = false;
    }

    /// A row carried a command that does not continue this oscillator.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    /// Current output scaled by `depth`, then advance by `speed`.
    ///
    /// `random` perturbs the phase of the random waveform.
    pub fn step(&mut self, speed: u8, depth: u8, shift: u32, random: u16) -> i32 {
        if self.interrupted {
            self.interrupted = false;
            if !self.continuous {
                self.phase = 0;
            }
        }
        let mut phase = self.phase as usize & 0x7F;
        let value = self.waveform.value(phase / 2);
        if self.waveform == Waveform::Random {
            phase += (random & 0x1E) as usize;
        }
        self.phase = ((phase + speed as usize * 2) & 0x7E) as u8;
        (value * depth as i32) >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_starts_at_zero_and_peaks_at_quarter() {
        let mut osc = Oscillator::default();
        assert_eq!(osc.step(8, 15, 0, 0), 0);
        // Speed 8 advances 16 phase units = 8 table steps per tick.
        osc.step(8, 15, 0, 0);
        assert_eq!(osc.step(8, 15, 0, 0), 0xFF * 15);
    }

    #[test]
    fn phase_wraps_within_cycle() {
        let mut osc = Oscillator::default();
        for _ in 0..100 {
            osc.step(15, 1, 0, 0);
        }
        assert!(osc.phase <= 0x7E);
        assert_eq!(osc.phase & 1, 0);
    }

    #[test]
    fn square_is_positive_half_cycle() {
        let mut osc = Oscillator::default();
        osc.set_waveform(2);
        assert_eq!(osc.step(16, 1, 0, 0), 255);
        assert_eq!(osc.step(16, 1, 0, 0), 255);
        assert_eq!(osc.step(16, 1, 0, 0), 0);
    }

    #[test]
    fn ramp_covers_full_range() {
        assert_eq!(Waveform::RampDown.value(1), -248);
        assert_eq!(Waveform::RampDown.value(63), 248);
        assert_eq!(Waveform::RampDown.value(0), 0);
    }

    #[test]
    fn interruption_resets_unless_continuous() {
        let mut osc = Oscillator::default();
        osc.step(4, 1, 0, 0);
        osc.interrupt();
        assert_eq!(osc.step(4, 1, 0, 0), 0);

        let mut continuous = Oscillator::default();
        continuous.set_waveform(4);
        continuous.step(4, 1, 0, 0);
        continuous.interrupt();
        assert_ne!(continuous.step(4, 1, 0, 0), 0);
    }
}
