//! screamer CLI: headless playback and WAV export of the built-in demo song.
//!
//! Usage:
//!   cargo run --bin sc-cli
//!   cargo run --bin sc-cli -- --wav output.wav --seconds 30
//!
//! Set `RUST_LOG=debug` to follow order changes and pattern loops.

use sc_master::{demo_song, Controller, Features};
use std::io::Write;
use std::{env, fs, process};

const USAGE: &str = "Usage: sc-cli [--wav output.wav] [--seconds n] [--loop] [--strict] [--start order:row]";

struct Options {
    wav: Option<String>,
    seconds: u32,
    song_loop: bool,
    strict: bool,
    start: Option<(usize, u16)>,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("{msg}");
    eprintln!("{USAGE}");
    process::exit(1);
}

fn parse_start(arg: &str) -> Option<(usize, u16)> {
    let (order, row) = arg.split_once(':')?;
    Some((order.parse().ok()?, row.parse().ok()?))
}

fn parse_args(args: &[String]) -> Options {
    let mut opts = Options {
        wav: None,
        seconds: 300,
        song_loop: false,
        strict: false,
        start: None,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--wav" => opts.wav = Some(iter.next().cloned().unwrap_or_else(|| fail("--wav needs a path"))),
            "--seconds" => {
                opts.seconds = iter
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--seconds needs a number"));
            }
            "--loop" => opts.song_loop = true,
            "--strict" => opts.strict = true,
            "--start" => {
                opts.start = Some(
                    iter.next()
                        .and_then(|s| parse_start(s))
                        .unwrap_or_else(|| fail("--start needs order:row")),
                );
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => fail(format!("Unknown argument: {other}")),
        }
    }
    opts
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    let mut ctrl = Controller::new(demo_song());
    let base = if opts.strict { Features::strict() } else { Features::default() };
    ctrl.set_features(Features {
        song_loop: opts.song_loop,
        trace_rows: log::log_enabled!(log::Level::Trace),
        ..base
    });
    if let Some((order, row)) = opts.start {
        ctrl.set_start(order, row);
    }

    let song = ctrl.song();
    println!("Title:    {}", song.title);
    println!("Channels: {}", song.num_channels());
    println!("Patterns: {}", song.patterns.len());
    println!("Orders:   {}", song.order.len());
    println!("Tempo:    {} BPM, Speed: {}", song.initial_tempo, song.initial_speed);
    let playable = song.instruments.iter().filter(|i| i.is_playable()).count();
    println!("Instruments: {} ({} playable)", song.instruments.len(), playable);
    println!();

    match opts.wav {
        Some(wav) => render_to_wav(&ctrl, &wav, opts.seconds),
        None => play_audio(&mut ctrl),
    }
}

fn play_audio(ctrl: &mut Controller) {
    ctrl.play();
    println!("Playing...");
    println!();

    while ctrl.is_playing() {
        if let Some((order, row)) = ctrl.position() {
            print!("\rOrd: {order:02X} | Row: {row:02X}");
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    println!("\rDone.          ");
}

fn render_to_wav(ctrl: &Controller, path: &str, max_seconds: u32) {
    let sample_rate: u32 = 44100;
    println!("Rendering to {path} at {sample_rate} Hz...");

    let wav = ctrl
        .render_to_wav(sample_rate, max_seconds)
        .unwrap_or_else(|e| fail(format!("Render failed: {e}")));
    println!("Rendered {} bytes", wav.len());

    fs::write(path, &wav).unwrap_or_else(|e| fail(format!("Failed to write {path}: {e}")));

    println!("Done.");
}
