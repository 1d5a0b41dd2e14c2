//! Song structure and order list.

use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::instrument::Instrument;
use crate::pattern::{Cell, Pattern};
use crate::volume::{Panning, Volume};

/// A complete song.
#[derive(Clone, Debug)]
pub struct Song {
    /// Song title
    pub title: ArrayString<28>,
    /// Initial tempo (32-255)
    pub initial_tempo: u8,
    /// Initial speed (ticks per row, 1-255)
    pub initial_speed: u8,
    /// Global volume (0-64)
    pub global_volume: u8,
    /// Pattern pool
    pub patterns: Vec<Pattern>,
    /// Order list
    pub order: Vec<OrderEntry>,
    /// Instruments (cells reference them 1-based)
    pub instruments: Vec<Instrument>,
    /// Per-channel settings
    pub channels: Vec<ChannelSettings>,
    /// Format compatibility switches
    pub flags: SongFlags,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            title: ArrayString::new(),
            initial_tempo: 125,
            initial_speed: 6,
            global_volume: 64,
            patterns: Vec::new(),
            order: Vec::new(),
            instruments: Vec::new(),
            channels: Vec::new(),
            flags: SongFlags::default(),
        }
    }
}

impl Song {
    /// Create a new empty song.
    pub fn new(title: &str) -> Self {
        let mut song = Self::default();
        let _ = song.title.try_push_str(title);
        song
    }

    /// Create a song with `num_channels` channels and one empty 64-row pattern in order 0.
    ///
    /// Channels alternate left/right like the S3M default layout.
    pub fn with_channels(title: &str, num_channels: u8) -> Self {
        let mut song = Self::new(title);
        for i in 0..num_channels {
            let category = if i % 2 == 0 { ChannelCategory::Left } else { ChannelCategory::Right };
            song.channels.push(ChannelSettings::new(i, category));
        }
        song.patterns.push(Pattern::new(64, num_channels));
        song.order.push(OrderEntry::Pattern(0));
        song
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Pattern referenced by an order slot, if it is a playable entry.
    pub fn pattern_at(&self, order: usize) -> Option<&Pattern> {
        match self.order.get(order)? {
            OrderEntry::Pattern(idx) => self.patterns.get(*idx as usize),
            _ => None,
        }
    }

    /// Cell lookup that tolerates out-of-range rows and channels.
    pub fn cell(&self, order: usize, row: u16, channel: usize) -> Cell {
        self.pattern_at(order)
            .and_then(|p| p.row(row).get(channel).copied())
            .unwrap_or_default()
    }

    /// Look up an instrument by its 1-based cell number.
    pub fn instrument(&self, number: u8) -> Option<&Instrument> {
        let index = (number as usize).checked_sub(1)?;
        self.instruments.get(index)
    }
}

/// An entry in the order list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderEntry {
    /// Play pattern with this index
    Pattern(u8),
    /// Skip marker (+++), continue to next
    Skip,
    /// End of song marker (---)
    End,
}

impl OrderEntry {
    /// Decode a raw S3M order byte (254 = skip, 255 = end).
    pub const fn from_s3m(byte: u8) -> Self {
        match byte {
            254 => OrderEntry::Skip,
            255 => OrderEntry::End,
            pattern => OrderEntry::Pattern(pattern),
        }
    }
}

/// How a channel is wired to the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelCategory {
    /// Sample channel panned left
    #[default]
    Left,
    /// Sample channel panned right
    Right,
    /// Adlib FM channel
    Fm,
    /// Not played
    Disabled,
}

/// Per-channel settings.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSettings {
    /// Is the channel played at all?
    pub enabled: bool,
    /// Initial volume
    pub initial_volume: Volume,
    /// Initial panning
    pub initial_pan: Panning,
    /// Mixer channel this channel renders into
    pub output: u8,
    /// Channel category
    pub category: ChannelCategory,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self::new(0, ChannelCategory::Left)
    }
}

impl ChannelSettings {
    /// Settings for an enabled channel with the category's default pan.
    pub fn new(output: u8, category: ChannelCategory) -> Self {
        let initial_pan = match category {
            ChannelCategory::Left => Panning::LEFT,
            ChannelCategory::Right => Panning::RIGHT,
            ChannelCategory::Fm | ChannelCategory::Disabled => Panning::CENTER,
        };
        Self {
            enabled: category != ChannelCategory::Disabled,
            initial_volume: Volume::FULL,
            initial_pan,
            output,
            category,
        }
    }
}

/// Format-specific playback switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SongFlags {
    /// Non-fine volume slides also apply on tick 0 (ST3.00 behavior).
    pub vol_slide_every_frame: bool,
    /// Data was upgraded from MOD: vibrato and tremolo also update on tick 0.
    pub legacy_vibrato: bool,
    /// Vibrato depth is doubled.
    pub old_st_vibrato: bool,
    /// Periods are clamped to the Amiga range.
    pub amiga_limits: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Note;
    use crate::pitch::Semitone;

    #[test]
    fn with_channels_builds_playable_song() {
        let song = Song::with_channels("test", 4);
        assert_eq!(song.num_channels(), 4);
        assert_eq!(song.order, [OrderEntry::Pattern(0)]);
        assert_eq!(song.pattern_at(0).map(|p| p.rows), Some(64));
        assert_eq!(song.channels[0].initial_pan, Panning::LEFT);
        assert_eq!(song.channels[1].initial_pan, Panning::RIGHT);
    }

    #[test]
    fn sentinel_orders_have_no_pattern() {
        let mut song = Song::with_channels("test", 1);
        song.order = alloc::vec![OrderEntry::Skip, OrderEntry::End, OrderEntry::Pattern(9)];
        assert!(song.pattern_at(0).is_none());
        assert!(song.pattern_at(1).is_none());
        assert!(song.pattern_at(2).is_none());
        assert!(song.pattern_at(3).is_none());
    }

    #[test]
    fn cell_lookup_tolerates_out_of_range() {
        let mut song = Song::with_channels("test", 2);
        song.patterns[0].cell_mut(3, 1).note = Note::On(Semitone::C4);
        assert_eq!(song.cell(0, 3, 1).note, Note::On(Semitone::C4));
        assert_eq!(song.cell(0, 3, 7), Cell::empty());
        assert_eq!(song.cell(0, 99, 0), Cell::empty());
        assert_eq!(song.cell(5, 0, 0), Cell::empty());
    }

    #[test]
    fn instruments_are_one_based() {
        let mut song = Song::new("test");
        song.instruments.push(Instrument::new("first"));
        assert!(song.instrument(0).is_none());
        assert_eq!(song.instrument(1).map(|i| i.name.as_str()), Some("first"));
        assert!(song.instrument(2).is_none());
    }

    #[test]
    fn order_bytes_decode() {
        assert_eq!(OrderEntry::from_s3m(3), OrderEntry::Pattern(3));
        assert_eq!(OrderEntry::from_s3m(254), OrderEntry::Skip);
        assert_eq!(OrderEntry::from_s3m(255), OrderEntry::End);
    }

    #[test]
    fn disabled_channel_category() {
        let settings = ChannelSettings::new(3, ChannelCategory::Disabled);
        assert!(!settings.enabled);
        assert_eq!(settings.initial_pan, Panning::CENTER);
    }
}
