//! Effects that steer the sequencer.

use crate::channel::ChannelState;
use crate::playback::Playback;

/// `SB0` opens a bracket at this row; `SBx` closes it with `x` repeats.
pub(super) fn pattern_loop(ch: &mut ChannelState, pb: &mut Playback<'_>, repeats: u8) {
    if repeats == 0 {
        ch.memory.pattern_loop.open(pb.row);
    } else {
        let bracket = ch.memory.pattern_loop.close(pb.row, repeats);
        pb.update.set_pattern_loop(bracket);
    }
}

/// `Bxx`; `BFF` ends the song.
pub(super) fn order_jump(pb: &mut Playback<'_>, order: u8) {
    if order == 0xFF {
        pb.update.stop_song();
    } else {
        pb.update.set_next_order(order as usize);
    }
}

pub(super) fn tempo_slide(pb: &mut Playback<'_>, delta: i8, tick: u32) {
    if tick > 0 {
        pb.update.slide_tempo(delta as i16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::tests::Harness;

    #[test]
    fn loop_close_stages_bracket_from_open_row() {
        let mut h = Harness::new();
        h.row = 10;
        h.run(|ch, pb| pattern_loop(ch, pb, 0));
        h.row = 14;
        h.run(|ch, pb| pattern_loop(ch, pb, 3));
        let mut seq = h.sequencer();
        h.update.commit(&mut seq);
        let bracket = seq.pattern_loop().copied();
        assert_eq!(bracket.map(|b| (b.start, b.end, b.repeats)), Some((10, 14, 3)));
    }

    #[test]
    fn bff_requests_stop() {
        let mut h = Harness::new();
        h.run(|_, pb| order_jump(pb, 0xFF));
        let mut seq = h.sequencer();
        h.update.commit(&mut seq);
        assert_eq!(seq.stopped(), Some(crate::StopReason::Requested));
    }

    #[test]
    fn tempo_slide_skips_tick_zero() {
        let mut h = Harness::new();
        for tick in 0..4 {
            h.run(|_, pb| tempo_slide(pb, -2, tick));
        }
        assert_eq!(h.update.effective_tempo(125), 119);
    }
}
