//! Normalized volume and panning values.

/// Loudest value on the native 0-63 volume scale.
pub const NATIVE_VOLUME_MAX: u8 = 63;

/// Channel or instrument volume, normalized to `[0, 1]`.
///
/// The native scale has 64 steps per unit, so native 32 is exactly 0.5.
/// Converting back to native rounds half-to-even and clamps at 63.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Volume(f32);

impl Volume {
    pub const SILENT: Volume = Volume(0.0);
    pub const FULL: Volume = Volume(1.0);

    /// Create from a normalized value, clamped to `[0, 1]`.
    pub fn new(value: f32) -> Self {
        Volume(value.clamp(0.0, 1.0))
    }

    /// Create from the native 0-64 scale.
    pub fn from_native(native: u8) -> Self {
        Volume::new(native.min(64) as f32 / 64.0)
    }

    /// Native 0-63 value.
    pub fn to_native(self) -> u8 {
        (libm::rintf(self.0 * 64.0) as i32).clamp(0, NATIVE_VOLUME_MAX as i32) as u8
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Apply a native-scale delta, clamping the result to 0-63.
    pub fn slide(self, delta: i32) -> Self {
        let native = (self.to_native() as i32 + delta).clamp(0, NATIVE_VOLUME_MAX as i32);
        Volume::from_native(native as u8)
    }

    /// Scale by another volume (e.g. global volume).
    pub fn scaled(self, by: Volume) -> Self {
        Volume::new(self.0 * by.0)
    }
}

/// Stereo position, normalized to `[0, 1]` (0 = hard left, 1 = hard right).
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Panning(f32);

impl Default for Panning {
    fn default() -> Self {
        Panning::CENTER
    }
}

impl Panning {
    /// Default for channels placed on the left (nibble 0x3).
    pub const LEFT: Panning = Panning(3.0 / 15.0);
    /// Default for channels placed on the right (nibble 0xC).
    pub const RIGHT: Panning = Panning(12.0 / 15.0);
    /// Default for unset or mono channels.
    pub const CENTER: Panning = Panning(0.5);

    pub fn new(value: f32) -> Self {
        Panning(value.clamp(0.0, 1.0))
    }

    /// From a 0-15 panning nibble (`S8x`).
    pub fn from_nibble(nibble: u8) -> Self {
        Panning::new((nibble & 0x0F) as f32 / 15.0)
    }

    /// From a 0-0x80 panning byte (`Xxx`).
    pub fn from_byte(byte: u8) -> Self {
        Panning::new(byte.min(0x80) as f32 / 128.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Left and right gains on a 0-256 integer scale.
    pub fn gains(self) -> (i32, i32) {
        let right = libm::roundf(self.0 * 256.0) as i32;
        (256 - right, right)
    }
}
