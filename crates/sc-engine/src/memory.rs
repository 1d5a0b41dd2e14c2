//! Per-channel effect parameter memory.
//!
//! Most S3M commands treat a zero parameter as "use the last nonzero value".
//! Each channel keeps those values in named cells, plus the running state of
//! tremor and the pattern-loop bracket.

use crate::sequencer::LoopBracket;

/// Named memory cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryCell {
    /// Shared fallback written by every nonzero parameter.
    LastNonZero,
    /// Tone portamento speed (`G`).
    Porta,
    VibratoSpeed,
    VibratoDepth,
    TremoloSpeed,
    TremoloDepth,
    /// Sample offset (`O`).
    SampleOffset,
    /// Tempo slide (`T0x`/`T1x`).
    TempoSlide,
}

impl MemoryCell {
    const COUNT: usize = 8;

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Effect memory owned by one channel.
#[derive(Clone, Debug, Default)]
pub struct EffectMemory {
    cells: [u8; MemoryCell::COUNT],
    /// Tremor duty-cycle state
    pub tremor: Tremor,
    /// Pattern-loop bracket opened/closed on this channel
    pub pattern_loop: PatternLoop,
}

impl EffectMemory {
    /// Store `input` if nonzero and return it, otherwise return the stored value.
    pub fn remember_or_recall(&mut self, input: u8, cell: MemoryCell) -> u8 {
        if input != 0 {
            self.cells[cell.slot()] = input;
            input
        } else {
            self.cells[cell.slot()]
        }
    }

    /// Nibble-wise recall: the high nibble against `hi`, the low nibble against `lo`.
    ///
    /// Cells store the nibble value (0-15).
    pub fn remember_or_recall_nibbles(&mut self, input: u8, hi: MemoryCell, lo: MemoryCell) -> (u8, u8) {
        (
            self.remember_or_recall(input >> 4, hi),
            self.remember_or_recall(input & 0x0F, lo),
        )
    }

    /// Current value of a cell without touching it.
    pub fn recall(&self, cell: MemoryCell) -> u8 {
        self.cells[cell.slot()]
    }
}

/// Tremor on/off counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tremor {
    counter: u8,
    on: bool,
}

impl Default for Tremor {
    fn default() -> Self {
        Self { counter: 0, on: true }
    }
}

impl Tremor {
    /// Advance one tick. Returns `Some(audible)` when the channel toggles.
    pub fn tick(&mut self, on_ticks: u8, off_ticks: u8) -> Option<bool> {
        if self.counter != 0 {
            self.counter -= 1;
            return None;
        }
        self.on = !self.on;
        self.counter = if self.on { on_ticks } else { off_ticks };
        Some(self.on)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// This channel's view of a pattern-loop bracket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternLoop {
    /// Row opened by `SB0`
    pub start_row: u16,
    /// Row of the closing `SBx`
    pub end_row: u16,
    /// Extra passes requested by the closing `SBx`
    pub target: u8,
    /// Passes completed so far
    pub count: u8,
    /// A closing `SBx` has armed the loop
    pub enabled: bool,
}

impl PatternLoop {
    pub fn open(&mut self, row: u16) {
        self.start_row = row;
    }

    /// Close the bracket at `row`. Returns the loop the sequencer should arm.
    pub fn close(&mut self, row: u16, repeats: u8) -> LoopBracket {
        if !self.enabled {
            self.enabled = true;
            self.end_row = row;
            self.target = repeats;
            self.count = 0;
        }
        LoopBracket::new(self.start_row.min(row), row, self.target)
    }

    /// Mirror the sequencer's armed loop after the cursor moved.
    ///
    /// Once the loop falls through, a later `SBx` without `SB0` loops back
    /// to the row after this bracket.
    pub fn sync(&mut self, armed: Option<&LoopBracket>) {
        if !self.enabled {
            return;
        }
        match armed {
            Some(bracket) if bracket.end == self.end_row => self.count = bracket.count,
            _ => {
                self.enabled = false;
                self.count = 0;
                self.start_row = self.end_row.saturating_add(1);
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
