//! Playback feature switches.

use sc_ir::SongFlags;

/// Host-selected playback behavior, passed to [`crate::Engine::configure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Features {
    /// Wrap to order 0 at the end of the order list instead of stopping.
    pub song_loop: bool,
    /// Replace unknown effects with a no-op instead of failing.
    pub ignore_unknown_effects: bool,
    /// Fail on Set Filter, Glissando and Funk Repeat even when unknown effects are ignored.
    pub abort_on_unsupported: bool,
    /// Override the song's fast-volume-slide flag.
    pub vol_slide_every_frame: Option<bool>,
    /// Log every row's raw cells at trace level.
    pub trace_rows: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            song_loop: false,
            ignore_unknown_effects: true,
            abort_on_unsupported: false,
            vol_slide_every_frame: None,
            trace_rows: false,
        }
    }
}

impl Features {
    /// Strict mode: every effect the engine cannot play is an error.
    pub fn strict() -> Self {
        Self {
            ignore_unknown_effects: false,
            abort_on_unsupported: true,
            ..Self::default()
        }
    }

    /// Song flags with host overrides applied.
    pub fn song_flags(&self, flags: SongFlags) -> SongFlags {
        SongFlags {
            vol_slide_every_frame: self.vol_slide_every_frame.unwrap_or(flags.vol_slide_every_frame),
            ..flags
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_permissive() {
        let features = Features::default();
        assert!(features.ignore_unknown_effects);
        assert!(!features.abort_on_unsupported);
        assert!(!features.song_loop);
    }

    #[test]
    fn override_wins_over_song_flag() {
        let flags = SongFlags { vol_slide_every_frame: true, ..SongFlags::default() };
        let features = Features { vol_slide_every_frame: Some(false), ..Features::default() };
        assert!(!features.song_flags(flags).vol_slide_every_frame);
        assert!(Features::default().song_flags(flags).vol_slide_every_frame);
    }
}
