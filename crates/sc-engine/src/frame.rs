//! Audio frame type.

/// A stereo audio frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Create a frame from wide accumulators, clamping to 16 bits.
    pub fn clamped(left: i32, right: i32) -> Self {
        Self {
            left: left.clamp(-32768, 32767) as i16,
            right: right.clamp(-32768, 32767) as i16,
        }
    }

    /// Peak absolute sample value of both channels.
    pub fn peak(&self) -> u16 {
        self.left.unsigned_abs().max(self.right.unsigned_abs())
    }
}
