//! Pattern and cell types for tracker sequences.

use alloc::vec::Vec;

use crate::pitch::Semitone;

/// A note value in a pattern cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Note {
    /// No note: the channel keeps whatever it is playing.
    #[default]
    None,
    /// Trigger a note.
    On(Semitone),
    /// Key off: stop the playing note, keep the channel's volume.
    Off,
    /// Hard cut: the note is invalidated and the channel silenced.
    Cut,
}

impl Note {
    /// Decode an S3M note byte (255 = none, 254 = key off).
    ///
    /// Bytes that are neither sentinels nor valid octave/key pairs decode as a hard cut.
    pub const fn from_s3m(byte: u8) -> Self {
        match byte {
            255 => Note::None,
            254 => Note::Off,
            _ => match Semitone::from_packed(byte) {
                Some(semitone) => Note::On(semitone),
                None => Note::Cut,
            },
        }
    }

    /// Create a note from octave (0-9) and key (0-11).
    pub const fn from_octave_key(octave: u8, key: u8) -> Self {
        match Semitone::new(octave, key) {
            Some(semitone) => Note::On(semitone),
            None => Note::Cut,
        }
    }
}

/// Effect letters are stored as 1-based indices, as S3M files store them.
/// Anything that is not a letter maps to 0, the empty command.
pub const fn command_index(letter: u8) -> u8 {
    match letter.to_ascii_uppercase() {
        upper @ b'A'..=b'Z' => upper - b'A' + 1,
        _ => 0,
    }
}

/// A single cell in a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    /// Note value
    pub note: Note,
    /// Instrument number (0 = none, 1-255 = instrument index + 1)
    pub instrument: u8,
    /// Volume column (native 0-64), if present
    pub volume: Option<u8>,
    /// Effect command (0 = none, 1 = 'A' .. 26 = 'Z')
    pub command: u8,
    /// Effect parameter
    pub param: u8,
}

impl Cell {
    /// Create an empty cell.
    pub const fn empty() -> Self {
        Self {
            note: Note::None,
            instrument: 0,
            volume: None,
            command: 0,
            param: 0,
        }
    }

    /// A cell that only carries an effect, e.g. `Cell::effect(b'D', 0x0F)`.
    pub const fn effect(letter: u8, param: u8) -> Self {
        let mut cell = Self::empty();
        cell.command = command_index(letter);
        cell.param = param;
        cell
    }

    /// A cell that triggers `note` with `instrument` (1-based).
    pub const fn note(note: Note, instrument: u8) -> Self {
        let mut cell = Self::empty();
        cell.note = note;
        cell.instrument = instrument;
        cell
    }

    /// Add an effect to this cell.
    pub const fn with_effect(mut self, letter: u8, param: u8) -> Self {
        self.command = command_index(letter);
        self.param = param;
        self
    }

    /// Add a volume column value to this cell.
    pub const fn with_volume(mut self, volume: u8) -> Self {
        self.volume = Some(volume);
        self
    }

    /// The effect letter, if any.
    pub fn command_letter(&self) -> Option<char> {
        match self.command {
            1..=26 => Some((b'A' + self.command - 1) as char),
            _ => None,
        }
    }

    /// Returns true if the cell is completely empty.
    pub fn is_empty(&self) -> bool {
        self.note == Note::None && self.instrument == 0 && self.volume.is_none() && self.command == 0
    }
}

/// A pattern containing rows of cells across channels.
#[derive(Clone, Debug)]
pub struct Pattern {
    /// Number of rows (64 in S3M, can be 1-256)
    pub rows: u16,
    /// Number of channels
    pub channels: u8,
    /// Pattern data, stored row-major: data[row * channels + channel]
    pub data: Vec<Cell>,
}

impl Pattern {
    /// Create a new pattern with empty cells.
    pub fn new(rows: u16, channels: u8) -> Self {
        Self {
            rows,
            channels,
            data: alloc::vec![Cell::empty(); rows as usize * channels as usize],
        }
    }

    /// Get a reference to a cell.
    pub fn cell(&self, row: u16, channel: u8) -> &Cell {
        debug_assert!(row < self.rows);
        debug_assert!(channel < self.channels);
        &self.data[row as usize * self.channels as usize + channel as usize]
    }

    /// Get a mutable reference to a cell.
    pub fn cell_mut(&mut self, row: u16, channel: u8) -> &mut Cell {
        debug_assert!(row < self.rows);
        debug_assert!(channel < self.channels);
        &mut self.data[row as usize * self.channels as usize + channel as usize]
    }

    /// All cells in a row, or an empty slice past the end.
    pub fn row(&self, row: u16) -> &[Cell] {
        if row >= self.rows {
            return &[];
        }
        let start = row as usize * self.channels as usize;
        &self.data[start..start + self.channels as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_from_octave_key() {
        let c4 = Note::from_octave_key(4, 0);
        assert_eq!(c4, Note::On(Semitone::C4));
        assert_eq!(Note::from_octave_key(4, 12), Note::Cut);
    }

    #[test]
    fn note_from_s3m_sentinels() {
        assert_eq!(Note::from_s3m(255), Note::None);
        assert_eq!(Note::from_s3m(254), Note::Off);
        assert_eq!(Note::from_s3m(0x40), Note::On(Semitone::C4));
        assert_eq!(Note::from_s3m(0x4E), Note::Cut);
    }

    #[test]
    fn effect_letters_are_one_based() {
        let cell = Cell::effect(b'D', 0x0F);
        assert_eq!(cell.command, 4);
        assert_eq!(cell.command_letter(), Some('D'));
        assert_eq!(Cell::empty().command_letter(), None);
    }

    #[test]
    fn non_letters_are_no_command() {
        assert_eq!(command_index(b'd'), 4);
        assert_eq!(command_index(b'Z'), 26);
        assert_eq!(command_index(b'1'), 0);
        assert_eq!(command_index(b'@'), 0);
        assert_eq!(Cell::effect(b'.', 0x10).command, 0);
    }

    #[test]
    fn pattern_cell_access() {
        let mut pattern = Pattern::new(64, 4);
        pattern.cell_mut(10, 2).note = Note::On(Semitone::C4);

        assert_eq!(pattern.cell(10, 2).note, Note::On(Semitone::C4));
        assert_eq!(pattern.cell(10, 1).note, Note::None);
        assert_eq!(pattern.row(10).len(), 4);
        assert!(pattern.row(64).is_empty());
    }
}
