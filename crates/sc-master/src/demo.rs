//! A small built-in song for trying the player without a file.

use sc_ir::{Cell, Instrument, Note, OrderEntry, Pattern, Sample, SampleData, Song};

const SQUARE: u8 = 1;
const SAW: u8 = 2;

fn note(octave: u8, key: u8, instrument: u8) -> Cell {
    Cell::note(Note::from_octave_key(octave, key), instrument)
}

fn square_wave() -> Sample {
    let data = (0..32).map(|i| if i < 16 { 96 } else { -96 }).collect();
    Sample::looping(SampleData::Mono8(data), 0, 32)
}

fn saw_wave() -> Sample {
    let data = (0..64).map(|i| (i * 512 - 16384) as i16).collect();
    Sample::looping(SampleData::Mono16(data), 0, 64)
}

/// Arpeggio, vibrato, slides and retrigger over a bass line.
fn intro() -> Pattern {
    let mut p = Pattern::new(32, 4);

    *p.cell_mut(0, 0) = note(4, 0, SQUARE).with_volume(48).with_effect(b'J', 0x37);
    for row in 1..4 {
        *p.cell_mut(row, 0) = Cell::effect(b'J', 0);
    }
    *p.cell_mut(8, 0) = note(4, 4, SQUARE).with_effect(b'H', 0x44);
    for row in 9..12 {
        *p.cell_mut(row, 0) = Cell::effect(b'H', 0);
    }
    *p.cell_mut(16, 0) = note(4, 7, SQUARE).with_effect(b'D', 0x04);
    for row in 17..20 {
        *p.cell_mut(row, 0) = Cell::effect(b'D', 0);
    }
    *p.cell_mut(24, 0) = note(5, 0, SQUARE).with_effect(b'F', 0x08);
    *p.cell_mut(28, 0) = Cell::note(Note::Off, 0);

    *p.cell_mut(0, 1) = note(2, 0, SAW);
    *p.cell_mut(8, 1) = note(2, 7, SAW).with_effect(b'G', 0x10);
    *p.cell_mut(9, 1) = Cell::effect(b'G', 0);
    *p.cell_mut(16, 1) = note(2, 4, SAW).with_effect(b'Q', 0x33);
    *p.cell_mut(24, 1) = note(2, 0, SAW).with_effect(b'S', 0xC3);

    *p.cell_mut(0, 2) = note(3, 0, SAW).with_volume(32).with_effect(b'R', 0x44);
    for row in 1..8 {
        *p.cell_mut(row, 2) = Cell::effect(b'R', 0);
    }
    *p.cell_mut(16, 2) = note(3, 7, SAW).with_effect(b'X', 0x40);

    *p.cell_mut(0, 3) = Cell::effect(b'V', 0x30);
    p
}

/// A two-pass pattern loop, then a faster outro with combined effects.
fn outro() -> Pattern {
    let mut p = Pattern::new(32, 4);

    *p.cell_mut(0, 0) = note(4, 0, SQUARE).with_effect(b'S', 0xB0);
    *p.cell_mut(2, 0) = note(4, 3, SQUARE);
    *p.cell_mut(3, 0) = Cell::effect(b'S', 0xB1);
    *p.cell_mut(8, 0) = note(4, 7, SQUARE).with_effect(b'H', 0x36);
    for row in 9..12 {
        *p.cell_mut(row, 0) = Cell::effect(b'K', 0x02);
    }

    *p.cell_mut(0, 1) = note(2, 0, SAW);
    *p.cell_mut(8, 1) = note(2, 5, SAW).with_effect(b'G', 0x08);
    for row in 9..12 {
        *p.cell_mut(row, 1) = Cell::effect(b'L', 0x01);
    }
    *p.cell_mut(16, 1) = note(2, 0, SAW).with_effect(b'S', 0xD2);

    *p.cell_mut(8, 3) = Cell::effect(b'A', 0x04);
    *p.cell_mut(16, 3) = Cell::effect(b'T', 0x12);
    *p.cell_mut(24, 3) = Cell::effect(b'S', 0xE1);
    p
}

/// Build the demo song: two patterns with a skip marker between them.
pub fn demo_song() -> Song {
    let mut song = Song::with_channels("screamer demo", 4);
    song.instruments.push(Instrument::sampled("square", square_wave(), 64));
    song.instruments.push(Instrument::sampled("saw", saw_wave(), 48));
    song.patterns = vec![intro(), outro()];
    song.order = vec![
        OrderEntry::Pattern(0),
        OrderEntry::Skip,
        OrderEntry::Pattern(1),
        OrderEntry::End,
    ];
    song
}
