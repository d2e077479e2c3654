//! Groove engine binary: parses CLI args, starts the audio thread, and reads
//! a minimal line-oriented control surface from stdin until EOF or `quit`.

use clap::Parser;
use groove_engine::constants::{
    CONTROL_QUEUE_CAPACITY, DEFAULT_AUDIO_PRIORITY, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_VOICES,
    DEFAULT_SAMPLE_RATE, EXIT_FATAL_INIT, EXIT_OK, TELEMETRY_QUEUE_CAPACITY,
};
use groove_engine::control::{ControlEvent, control_channel, engine_event_channel, status_channel};
use groove_engine::engine::GrooveEngine;
use std::io::BufRead;

/// Command line arguments for the groove engine.
#[derive(Parser)]
#[command(name = "groove_engine")]
#[command(about = "Embedded polyphonic groove-workstation audio engine")]
struct Args {
    /// Audio sample rate in Hz
    #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,

    /// Audio buffer size in frames, delivered to the output stream per callback
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Maximum number of simultaneous voices
    #[arg(short, long, default_value_t = DEFAULT_MAX_VOICES)]
    max_voices: usize,

    /// Specific audio output device name
    #[arg(long)]
    output_device: Option<String>,

    /// Audio thread priority (0-99, higher = more priority, 0 = disable, auto-mapped to platform ranges)
    #[arg(long, default_value_t = DEFAULT_AUDIO_PRIORITY)]
    audio_priority: u8,

    /// List available audio output devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn print_banner(sample_rate: u32, buffer_size: usize, max_voices: usize) {
    println!();
    println!("groove_engine");
    println!("  sample rate : {sample_rate} Hz");
    println!("  buffer size : {buffer_size} frames");
    println!("  max voices  : {max_voices}");
    println!();
}

/// Parses one line of the stdin control surface into a `ControlEvent`.
/// Unknown commands and malformed arguments are reported and otherwise
/// ignored; a blank line is a no-op.
fn parse_command(line: &str) -> Option<ControlEvent> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;

    let parse_f32 = |s: Option<&str>| s.and_then(|v| v.parse::<f32>().ok());
    let parse_u8 = |s: Option<&str>| s.and_then(|v| v.parse::<u8>().ok());

    match command {
        "note_on" => Some(ControlEvent::NoteOn {
            track_id: parse_u8(parts.next())?,
            note: parse_u8(parts.next())?,
            velocity: parse_f32(parts.next())?,
        }),
        "note_off" => Some(ControlEvent::NoteOff {
            track_id: parse_u8(parts.next())?,
            note: parse_u8(parts.next())?,
        }),
        "set_engine" => {
            let track_id = parse_u8(parts.next())?;
            let engine = match parts.next()? {
                "subtractive" => "subtractive",
                "fm2" => "fm2",
                "wavetable" => "wavetable",
                "waveshaper" => "waveshaper",
                "chord" => "chord",
                "harmonics" => "harmonics",
                "formant_vocal" => "formant_vocal",
                "particles" => "particles",
                "tidal" => "tidal",
                "resonator" => "resonator",
                "modal" => "modal",
                "drum_kit" => "drum_kit",
                "sample_kit" => "sample_kit",
                "sample_slicer" => "sample_slicer",
                other => {
                    eprintln!("unknown engine: {other}");
                    return None;
                }
            };
            Some(ControlEvent::SetEngine { track_id, engine })
        }
        "set_tempo" => Some(ControlEvent::SetTempo { bpm: parse_f32(parts.next())? }),
        "set_swing" => Some(ControlEvent::SetSwing { amount: parse_f32(parts.next())? }),
        "sequencer_start" => Some(ControlEvent::SequencerTransport { running: true }),
        "sequencer_stop" => Some(ControlEvent::SequencerTransport { running: false }),
        "chain_clear" => Some(ControlEvent::ChainClear),
        "chain_append" => Some(ControlEvent::ChainAppend {
            pattern_index: parts.next()?.parse().ok()?,
            repeats: parse_u8(parts.next())?,
        }),
        "master_volume" => Some(ControlEvent::MasterVolume { value: parse_f32(parts.next())? }),
        "all_notes_off" => Some(ControlEvent::AllNotesOff),
        "panic" => Some(ControlEvent::Panic),
        "" => None,
        other => {
            eprintln!("unknown command: {other}");
            None
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.list_devices {
        groove_engine::list_audio_devices();
        std::process::exit(EXIT_OK);
    }

    print_banner(args.sample_rate, args.buffer_size, args.max_voices);

    let (control_tx, control_rx) = control_channel(CONTROL_QUEUE_CAPACITY);
    let (event_tx, event_rx) = engine_event_channel(TELEMETRY_QUEUE_CAPACITY);
    let (status_tx, status_rx) = status_channel(TELEMETRY_QUEUE_CAPACITY);

    if args.max_voices == 0 {
        eprintln!("fatal: max_voices must be at least 1");
        std::process::exit(EXIT_FATAL_INIT);
    }

    let engine = GrooveEngine::new(args.sample_rate as f32, args.max_voices, control_rx, event_tx, status_tx);

    println!("starting audio thread...");
    let audio_thread = GrooveEngine::start_audio_thread(
        engine,
        args.sample_rate,
        args.buffer_size,
        args.output_device,
        args.audio_priority,
    );

    println!("ready. type commands on stdin (note_on/note_off/set_engine/set_tempo/set_swing/sequencer_start/sequencer_stop/chain_append/chain_clear/master_volume/all_notes_off/panic/quit)");
    println!("engines: subtractive/fm2/wavetable/waveshaper/chord/harmonics/formant_vocal/particles/tidal/resonator/modal/drum_kit/sample_kit/sample_slicer");

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        while let Ok(event) = event_rx.try_recv() {
            println!("engine event: {event:?}");
        }
        while let Ok(status) = status_rx.try_recv() {
            println!("engine status: {status:?}");
        }
        if let Some(event) = parse_command(line) {
            if control_tx.send(event).is_err() {
                eprintln!("control channel closed, audio thread has exited");
                break;
            }
        }
    }

    // No ControlEvent tears down the cpal stream; process exit is what stops
    // audio output once the stdin loop ends.
    let _ = audio_thread;
}
