//! Sample data types.

use alloc::vec::Vec;

/// PCM data of a sampled instrument.
#[derive(Clone, Debug, Default)]
pub struct Sample {
    /// Audio data
    pub data: SampleData,
    /// Loop start position (in frames)
    pub loop_start: u32,
    /// Loop end position (in frames, exclusive)
    pub loop_end: u32,
    /// Whether the loop range is used
    pub looped: bool,
}

impl Sample {
    /// An unlooped sample.
    pub fn new(data: SampleData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// A sample looping over `loop_start..loop_end`.
    pub fn looping(data: SampleData, loop_start: u32, loop_end: u32) -> Self {
        Self {
            data,
            loop_start,
            loop_end,
            looped: true,
        }
    }

    /// Get the length of the sample in frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if the sample has a usable loop.
    pub fn has_loop(&self) -> bool {
        self.looped && self.loop_end > self.loop_start && self.loop_end as usize <= self.len()
    }
}

/// Sample audio data.
#[derive(Clone, Debug)]
pub enum SampleData {
    /// 8-bit signed samples
    Mono8(Vec<i8>),
    /// 16-bit signed samples
    Mono16(Vec<i16>),
}

impl Default for SampleData {
    fn default() -> Self {
        SampleData::Mono8(Vec::new())
    }
}

impl SampleData {
    /// Get the number of sample frames.
    pub fn len(&self) -> usize {
        match self {
            SampleData::Mono8(v) => v.len(),
            SampleData::Mono16(v) => v.len(),
        }
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the sample value at `pos` as i16 (0 past the end).
    pub fn get(&self, pos: usize) -> i16 {
        match self {
            SampleData::Mono8(v) => v.get(pos).copied().unwrap_or(0) as i16 * 256,
            SampleData::Mono16(v) => v.get(pos).copied().unwrap_or(0),
        }
    }

    /// Get a linearly interpolated sample value.
    ///
    /// `pos_fixed` is a 16.16 fixed-point position. Blends between the two
    /// nearest sample values using the fractional part.
    pub fn get_interpolated(&self, pos_fixed: u32) -> i16 {
        let idx = (pos_fixed >> 16) as usize;
        let frac = (pos_fixed & 0xFFFF) as i64;

        let a = self.get(idx) as i64;
        let b = self.get(idx + 1) as i64;

        (a + (((b - a) * frac) >> 16)) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono8(data: &[i8]) -> SampleData {
        SampleData::Mono8(data.to_vec())
    }

    #[test]
    fn interpolated_at_integer_matches_nearest() {
        let data = mono8(&[0, 100, -50, 30]);
        assert_eq!(data.get_interpolated(1 << 16), data.get(1));
    }

    #[test]
    fn interpolated_midpoint_averages_neighbors() {
        let data = mono8(&[0, 100]);
        let mid = data.get_interpolated(32768);
        let expected = (data.get(0) as i32 + data.get(1) as i32) / 2;
        assert!((mid as i32 - expected).abs() <= 1);
    }

    #[test]
    fn interpolated_past_end_fades_to_zero() {
        let data = mono8(&[100]);
        let val = data.get_interpolated(32768);
        let expected = data.get(0) as i32 / 2;
        assert!((val as i32 - expected).abs() <= 1);
    }

    #[test]
    fn loop_must_fit_inside_data() {
        let data = SampleData::Mono16(alloc::vec![0; 100]);
        assert!(Sample::looping(data.clone(), 10, 100).has_loop());
        assert!(!Sample::looping(data.clone(), 10, 200).has_loop());
        assert!(!Sample::looping(data.clone(), 50, 50).has_loop());
        assert!(!Sample::new(data).has_loop());
    }
}
