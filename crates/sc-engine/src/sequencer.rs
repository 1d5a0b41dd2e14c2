//! Order/row sequencer and the row-update transaction.
//!
//! The [`Sequencer`] owns the playback cursor. Effects never move it
//! directly: during a row they stage requests on a [`RowUpdate`], which the
//! engine commits once the row has finished playing.

use alloc::vec;
use alloc::vec::Vec;
use sc_ir::{OrderEntry, Song};

/// Slowest tempo accepted by `Txx`.
pub const MIN_TEMPO: u8 = 32;

/// Why playback stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The order list ran out (or hit an end marker) without song looping.
    EndOfSong,
    /// A row was about to play a second time; the order list never ends.
    LoopDetected,
    /// An effect or the host asked to stop.
    Requested,
}

/// Playback cursor as seen from outside.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// Index into the order list
    pub order: usize,
    /// Pattern played by that order slot
    pub pattern: u8,
    /// Row within the pattern
    pub row: u16,
}

/// An armed pattern loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopBracket {
    /// First row of the loop
    pub start: u16,
    /// Row whose end jumps back
    pub end: u16,
    /// Extra passes to play
    pub repeats: u8,
    /// Passes completed so far
    pub count: u8,
}

impl LoopBracket {
    pub fn new(start: u16, end: u16, repeats: u8) -> Self {
        Self { start, end, repeats, count: 0 }
    }

    fn contains(&self, row: u16) -> bool {
        (self.start..=self.end).contains(&row)
    }
}

/// Order slot resolved against the pattern pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Pattern { index: u8, rows: u16 },
    Skip,
    End,
}

/// The playback cursor and its timing state.
#[derive(Clone, Debug)]
pub struct Sequencer {
    slots: Vec<Slot>,
    order: usize,
    row: u16,
    /// Ticks per row
    speed: u8,
    tempo: u8,
    song_loop: bool,
    reset_pattern_loops: bool,
    pattern_loop: Option<LoopBracket>,
    /// One bit per row (up to 256) per order slot.
    visited: Vec<[u64; 4]>,
    stopped: Option<StopReason>,
}

impl Sequencer {
    /// Create a sequencer positioned on the first playable order.
    pub fn new(song: &Song) -> Self {
        let slots: Vec<Slot> = song
            .order
            .iter()
            .map(|entry| match *entry {
                OrderEntry::Pattern(index) => match song.patterns.get(index as usize) {
                    Some(pattern) if pattern.rows > 0 => Slot::Pattern {
                        index,
                        rows: pattern.rows.min(256),
                    },
                    _ => Slot::End,
                },
                OrderEntry::Skip => Slot::Skip,
                OrderEntry::End => Slot::End,
            })
            .collect();
        let visited = vec![[0u64; 4]; slots.len()];

        let mut seq = Self {
            slots,
            order: 0,
            row: 0,
            speed: song.initial_speed.max(1),
            tempo: song.initial_tempo.max(MIN_TEMPO),
            song_loop: false,
            reset_pattern_loops: false,
            pattern_loop: None,
            visited,
            stopped: None,
        };
        seq.enter_order(0);
        seq
    }

    pub fn set_song_loop(&mut self, enabled: bool) {
        self.song_loop = enabled;
    }

    pub fn position(&self) -> Position {
        let pattern = match self.slots.get(self.order) {
            Some(Slot::Pattern { index, .. }) => *index,
            _ => 0,
        };
        Position {
            order: self.order,
            pattern,
            row: self.row,
        }
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn tempo(&self) -> u8 {
        self.tempo
    }

    pub fn stopped(&self) -> Option<StopReason> {
        self.stopped
    }

    pub fn stop(&mut self, reason: StopReason) {
        if self.stopped.is_none() {
            log::info!("playback stopped at order {} row {}: {:?}", self.order, self.row, reason);
            self.stopped = Some(reason);
        }
    }

    /// Forget visited rows and any stop, so playback can resume after a seek.
    pub fn rewind_history(&mut self) {
        self.visited.iter_mut().for_each(|rows| *rows = [0; 4]);
        self.stopped = None;
    }

    /// The loop currently armed, if any.
    pub fn pattern_loop(&self) -> Option<&LoopBracket> {
        self.pattern_loop.as_ref()
    }

    /// Returns true once after every order change.
    pub fn take_reset_pattern_loops(&mut self) -> bool {
        core::mem::take(&mut self.reset_pattern_loops)
    }

    /// Start playing the current row.
    ///
    /// Without song looping, playing a row twice (outside an armed pattern
    /// loop) means the order list cycles forever, and playback stops.
    pub fn begin_row(&mut self) -> Result<Position, StopReason> {
        if let Some(reason) = self.stopped {
            return Err(reason);
        }
        if !self.song_loop {
            let looping = self.pattern_loop.is_some_and(|lp| lp.contains(self.row));
            let (word, bit) = (self.row as usize / 64, self.row as usize % 64);
            let seen = self.visited[self.order][word] & (1 << bit) != 0;
            if seen && !looping {
                log::warn!("order {} row {} revisited, stopping", self.order, self.row);
                self.stop(StopReason::LoopDetected);
                return Err(StopReason::LoopDetected);
            }
            self.visited[self.order][word] |= 1 << bit;
        }
        Ok(self.position())
    }

    /// Ticks the current row lasts, including delays staged on `update`.
    pub fn ticks_this_row(&self, update: &RowUpdate) -> u32 {
        let speed = update.speed.unwrap_or(self.speed) as u32;
        let repeats = update.pattern_delay.unwrap_or(1) as u32;
        speed * repeats + update.fine_pattern_delay as u32
    }

    /// Output samples per tick: 2.5 seconds divided by the tempo.
    pub fn samples_per_tick(&self, update: &RowUpdate, sample_rate: u32) -> u32 {
        let tempo = update.effective_tempo(self.tempo) as u32;
        (sample_rate * 5) / (tempo * 2)
    }

    /// Move to the next row, honoring an armed pattern loop.
    pub fn advance_row(&mut self) {
        if let Some(lp) = &mut self.pattern_loop {
            if self.row == lp.end {
                lp.count += 1;
                if lp.count <= lp.repeats {
                    log::debug!("pattern loop pass {} of {}, back to row {}", lp.count, lp.repeats, lp.start);
                    self.row = lp.start;
                    return;
                }
                log::debug!("pattern loop at row {} done", lp.end);
                self.pattern_loop = None;
            }
        }
        self.row += 1;
        if self.row >= self.rows() {
            self.advance_order(true);
        }
    }

    /// Move to the next order slot. Loops never survive an order change.
    pub fn advance_order(&mut self, reset_row: bool) {
        self.enter_order(self.order + 1);
        if reset_row {
            self.row = 0;
        }
    }

    /// Jump to `order`, then `row` within it.
    pub fn jump(&mut self, order: usize, row: u16) {
        self.enter_order(order);
        self.set_row(row);
    }

    /// Set the row in the current order; rows past the end land on row 0.
    pub fn set_row(&mut self, row: u16) {
        self.row = if row < self.rows() { row } else { 0 };
    }

    /// Arm a pattern loop unless the same loop is already running.
    pub fn arm_loop(&mut self, bracket: LoopBracket) {
        if self.pattern_loop.is_some_and(|lp| lp.end == bracket.end) {
            return;
        }
        log::debug!("pattern loop armed: rows {}..={} x{}", bracket.start, bracket.end, bracket.repeats);
        self.pattern_loop = Some(bracket);
    }

    fn rows(&self) -> u16 {
        match self.slots.get(self.order) {
            Some(Slot::Pattern { rows, .. }) => *rows,
            _ => 1,
        }
    }

    /// Land on the first playable slot at or after `order`.
    fn enter_order(&mut self, mut order: usize) {
        self.reset_pattern_loops = true;
        self.pattern_loop = None;

        // Bounded so an order list made only of markers cannot spin.
        for _ in 0..=self.slots.len() {
            match self.slots.get(order) {
                Some(Slot::Pattern { .. }) => {
                    if order != self.order {
                        log::debug!("order {} -> {}", self.order, order);
                    }
                    self.order = order;
                    self.row = self.row.min(self.rows() - 1);
                    return;
                }
                Some(Slot::Skip) => order += 1,
                Some(Slot::End) | None if self.song_loop && order != 0 => {
                    self.visited.iter_mut().for_each(|rows| *rows = [0; 4]);
                    order = 0;
                }
                Some(Slot::End) | None => break,
            }
        }
        self.stop(StopReason::EndOfSong);
    }
}

/// A requested row jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowJump {
    pub row: u16,
    /// Allow landing in the current order instead of the next one.
    pub backtrack: bool,
}

/// Cursor and timing changes requested while a row plays.
///
/// Every field is write-once: the first request in a row wins, except the
/// tempo slide and fine pattern delay, which accumulate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowUpdate {
    next_order: Option<usize>,
    next_row: Option<RowJump>,
    break_order: bool,
    tempo: Option<u8>,
    tempo_delta: i16,
    speed: Option<u8>,
    pattern_delay: Option<u8>,
    fine_pattern_delay: u16,
    pattern_loop: Option<LoopBracket>,
    stop: bool,
    finished: bool,
}

impl RowUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_next_order(&mut self, order: usize) {
        self.next_order.get_or_insert(order);
    }

    pub fn set_next_row(&mut self, row: u16, backtrack: bool) {
        self.next_row.get_or_insert(RowJump { row, backtrack });
    }

    /// Continue with row 0 of the next order.
    pub fn break_to_next_order(&mut self) {
        self.break_order = true;
    }

    pub fn set_tempo(&mut self, tempo: u8) {
        self.tempo.get_or_insert(tempo.max(MIN_TEMPO));
    }

    pub fn slide_tempo(&mut self, delta: i16) {
        self.tempo_delta = self.tempo_delta.saturating_add(delta);
    }

    /// Ticks per row, from this row on.
    pub fn set_speed(&mut self, speed: u8) {
        if speed > 0 {
            self.speed.get_or_insert(speed);
        }
    }

    /// Play the row `repeats` times in total. Only the first request counts.
    pub fn set_pattern_delay(&mut self, repeats: u8) {
        if repeats > 0 && self.pattern_delay.is_none() {
            log::debug!("pattern delay x{repeats}");
            self.pattern_delay = Some(repeats);
        }
    }

    pub fn add_fine_pattern_delay(&mut self, ticks: u8) {
        self.fine_pattern_delay += ticks as u16;
    }

    pub fn set_pattern_loop(&mut self, bracket: LoopBracket) {
        self.pattern_loop.get_or_insert(bracket);
    }

    pub fn stop_song(&mut self) {
        self.stop = true;
    }

    pub fn pattern_delay(&self) -> Option<u8> {
        self.pattern_delay
    }

    pub fn fine_pattern_delay(&self) -> u16 {
        self.fine_pattern_delay
    }

    /// Tempo in effect with this row's requests applied.
    pub fn effective_tempo(&self, current: u8) -> u8 {
        let base = self.tempo.unwrap_or(current) as i16;
        (base + self.tempo_delta).clamp(MIN_TEMPO as i16, 255) as u8
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Discard every request. Later commits do nothing.
    pub fn cancel(&mut self) {
        self.finished = true;
    }

    /// Apply every request to `seq` and move the cursor. Only the first call has an effect.
    pub fn commit(&mut self, seq: &mut Sequencer) {
        if self.finished {
            return;
        }
        self.finished = true;

        seq.tempo = self.effective_tempo(seq.tempo);
        if let Some(speed) = self.speed {
            seq.speed = speed;
        }
        if let Some(bracket) = self.pattern_loop {
            seq.arm_loop(bracket);
        }
        if self.stop {
            seq.stop(StopReason::Requested);
            return;
        }

        match (self.next_order, self.next_row) {
            (Some(order), jump) => seq.jump(order, jump.map_or(0, |j| j.row)),
            (None, Some(jump)) if jump.backtrack => seq.set_row(jump.row),
            (None, Some(jump)) => {
                seq.advance_order(true);
                seq.set_row(jump.row);
            }
            (None, None) if self.break_order => seq.advance_order(true),
            (None, None) => seq.advance_row(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_ir::Pattern;

    fn song_with_orders(order: &[OrderEntry], patterns: usize, rows: u16) -> Song {
        let mut song = Song::with_channels("seq", 1);
        song.patterns = (0..patterns).map(|_| Pattern::new(rows, 1)).collect();
        song.order = order.to_vec();
        song
    }

    fn advance(seq: &mut Sequencer) {
        RowUpdate::new().commit(seq);
    }

    #[test]
    fn skip_marker_is_transparent() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Skip, OrderEntry::Pattern(1)], 2, 2);
        let mut seq = Sequencer::new(&song);
        assert_eq!(seq.begin_row().unwrap().order, 0);
        advance(&mut seq);
        advance(&mut seq);
        let pos = seq.begin_row().unwrap();
        assert_eq!((pos.order, pos.pattern, pos.row), (2, 1, 0));
    }

    #[test]
    fn leading_skip_markers_are_skipped_at_start() {
        let song = song_with_orders(&[OrderEntry::Skip, OrderEntry::Skip, OrderEntry::Pattern(0)], 1, 4);
        let seq = Sequencer::new(&song);
        assert_eq!(seq.position().order, 2);
    }

    #[test]
    fn end_marker_stops_without_loop() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::End, OrderEntry::Pattern(0)], 1, 1);
        let mut seq = Sequencer::new(&song);
        seq.begin_row().unwrap();
        advance(&mut seq);
        assert_eq!(seq.begin_row(), Err(StopReason::EndOfSong));
    }

    #[test]
    fn order_overflow_wraps_with_song_loop() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], 2, 1);
        let mut seq = Sequencer::new(&song);
        seq.set_song_loop(true);
        for _ in 0..5 {
            seq.begin_row().unwrap();
            advance(&mut seq);
        }
        assert_eq!(seq.position().order, 1);
        assert_eq!(seq.stopped(), None);
    }

    #[test]
    fn marker_only_order_list_stops_even_with_song_loop() {
        let song = song_with_orders(&[OrderEntry::Skip, OrderEntry::Skip], 1, 1);
        let mut seq = Sequencer::new(&song);
        seq.set_song_loop(true);
        assert_eq!(seq.begin_row(), Err(StopReason::EndOfSong));
    }

    #[test]
    fn missing_pattern_ends_song() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(7)], 1, 1);
        let mut seq = Sequencer::new(&song);
        seq.begin_row().unwrap();
        advance(&mut seq);
        assert_eq!(seq.stopped(), Some(StopReason::EndOfSong));
    }

    #[test]
    fn backward_order_jump_is_detected_as_loop() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], 2, 2);
        let mut seq = Sequencer::new(&song);
        for _ in 0..3 {
            seq.begin_row().unwrap();
            advance(&mut seq);
        }
        seq.begin_row().unwrap();
        let mut update = RowUpdate::new();
        update.set_next_order(0);
        update.commit(&mut seq);
        assert_eq!(seq.begin_row(), Err(StopReason::LoopDetected));
    }

    #[test]
    fn pattern_loop_plays_bracket_repeats_plus_one_times() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(0)], 1, 8);
        let mut seq = Sequencer::new(&song);
        seq.jump(0, 2);
        let mut visits = [0u32; 8];
        while seq.position().order == 0 {
            let pos = seq.begin_row().unwrap();
            visits[pos.row as usize] += 1;
            let mut update = RowUpdate::new();
            if pos.row == 5 {
                update.set_pattern_loop(LoopBracket::new(3, 5, 2));
            }
            update.commit(&mut seq);
        }
        assert_eq!(visits, [0, 0, 1, 3, 3, 3, 1, 1]);
    }

    #[test]
    fn order_change_disarms_pattern_loop() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(0)], 1, 8);
        let mut seq = Sequencer::new(&song);
        seq.take_reset_pattern_loops();
        seq.jump(0, 5);
        seq.take_reset_pattern_loops();
        let mut update = RowUpdate::new();
        update.set_pattern_loop(LoopBracket::new(3, 5, 9));
        update.set_next_order(1);
        update.commit(&mut seq);
        assert!(seq.pattern_loop().is_none());
        assert!(seq.take_reset_pattern_loops());
        assert!(!seq.take_reset_pattern_loops());
        assert_eq!(seq.position().order, 1);
    }

    #[test]
    fn row_jump_without_backtrack_lands_in_next_order() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], 2, 16);
        let mut seq = Sequencer::new(&song);
        seq.jump(0, 10);
        let mut update = RowUpdate::new();
        update.set_next_row(4, false);
        update.commit(&mut seq);
        assert_eq!((seq.position().order, seq.position().row), (1, 4));
    }

    #[test]
    fn row_jump_with_backtrack_stays_in_order() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], 2, 16);
        let mut seq = Sequencer::new(&song);
        seq.jump(0, 10);
        let mut update = RowUpdate::new();
        update.set_next_row(4, true);
        update.commit(&mut seq);
        assert_eq!((seq.position().order, seq.position().row), (0, 4));
    }

    #[test]
    fn order_and_row_jump_apply_together() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1), OrderEntry::Pattern(0)], 2, 16);
        let mut seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.set_next_row(7, false);
        update.set_next_order(2);
        update.commit(&mut seq);
        assert_eq!((seq.position().order, seq.position().row), (2, 7));
    }

    #[test]
    fn break_to_next_order_resets_row() {
        let song = song_with_orders(&[OrderEntry::Pattern(0), OrderEntry::Pattern(1)], 2, 16);
        let mut seq = Sequencer::new(&song);
        seq.jump(0, 9);
        let mut update = RowUpdate::new();
        update.break_to_next_order();
        update.commit(&mut seq);
        assert_eq!((seq.position().order, seq.position().row), (1, 0));
    }

    #[test]
    fn pattern_delay_first_request_wins() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 4);
        let seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.set_pattern_delay(3);
        update.set_pattern_delay(5);
        assert_eq!(update.pattern_delay(), Some(3));
        assert_eq!(seq.ticks_this_row(&update), 6 * 3);
    }

    #[test]
    fn fine_pattern_delay_accumulates() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 4);
        let seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.add_fine_pattern_delay(2);
        update.add_fine_pattern_delay(3);
        update.set_pattern_delay(2);
        assert_eq!(seq.ticks_this_row(&update), 6 * 2 + 5);
    }

    #[test]
    fn commit_is_idempotent() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 8);
        let mut seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.set_speed(3);
        update.commit(&mut seq);
        update.commit(&mut seq);
        assert_eq!(seq.position().row, 1);
        assert_eq!(seq.speed(), 3);
    }

    #[test]
    fn cancel_discards_requests() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 8);
        let mut seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.set_tempo(200);
        update.cancel();
        update.commit(&mut seq);
        assert_eq!(seq.tempo(), 125);
        assert_eq!(seq.position().row, 0);
    }

    #[test]
    fn tempo_slide_clamps() {
        let mut update = RowUpdate::new();
        update.slide_tempo(-200);
        assert_eq!(update.effective_tempo(125), MIN_TEMPO);
        let mut update = RowUpdate::new();
        update.set_tempo(250);
        update.slide_tempo(20);
        assert_eq!(update.effective_tempo(125), 255);
    }

    #[test]
    fn samples_per_tick_follows_tempo() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 8);
        let seq = Sequencer::new(&song);
        // 125 BPM: 20 ms per tick.
        assert_eq!(seq.samples_per_tick(&RowUpdate::new(), 44100), 882);
    }

    #[test]
    fn requested_stop_ends_playback() {
        let song = song_with_orders(&[OrderEntry::Pattern(0)], 1, 8);
        let mut seq = Sequencer::new(&song);
        let mut update = RowUpdate::new();
        update.stop_song();
        update.commit(&mut seq);
        assert_eq!(seq.begin_row(), Err(StopReason::Requested));
    }
}
