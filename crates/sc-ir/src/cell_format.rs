//! Human-readable cell and row rendering, in tracker column layout.

use core::fmt;

use crate::pattern::{Cell, Note};

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Note::None => f.write_str("..."),
            Note::On(semitone) => write!(f, "{semitone}"),
            Note::Off => f.write_str("^^^"),
            Note::Cut => f.write_str("==="),
        }
    }
}

/// `C-4 01 32 D0F`; empty columns render as dots.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.note)?;
        match self.instrument {
            0 => f.write_str(".. ")?,
            n => write!(f, "{n:02} ")?,
        }
        match self.volume {
            Some(v) => write!(f, "{v:02} ")?,
            None => f.write_str(".. ")?,
        }
        match self.command_letter() {
            Some(letter) => write!(f, "{letter}{:02X}", self.param),
            None => f.write_str("..."),
        }
    }
}

/// A whole row, channels separated by `|`.
pub struct RowDisplay<'a>(pub &'a [Cell]);

impl fmt::Display for RowDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}
