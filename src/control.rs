//! The bounded, lock-free boundary between the control thread (CLI, UI,
//! sequencer clock) and the audio thread. Every mutation the audio callback
//! can't make atomically arrives here as a plain-data `ControlEvent`;
//! `crossbeam-channel` gives us an SPSC-friendly MPSC with a bounded capacity
//! so a stalled consumer can never grow memory under the audio thread's feet.

use crate::sequencer::Step;
use crate::types::{EngineStatusMessage, ParameterId, TrackId, VoiceId};
use crossbeam_channel::{Receiver, Sender, bounded};

#[derive(Debug, Clone)]
pub enum ControlEvent {
    NoteOn { track_id: TrackId, note: u8, velocity: f32 },
    NoteOff { track_id: TrackId, note: u8 },
    Aftertouch { track_id: TrackId, value: f32 },
    PitchBend { track_id: TrackId, semitones: f32 },
    SetEngine { track_id: TrackId, engine: &'static str },
    SetParameter { track_id: TrackId, param: ParameterId, value: f32 },
    SetModDepth { track_id: TrackId, slot: usize, depth: f32 },
    SequencerStep { track_id: TrackId, step_index: usize, step: Step },
    SequencerTransport { running: bool },
    SetTempo { bpm: f32 },
    SetSwing { amount: f32 },
    ChainAppend { pattern_index: usize, repeats: u8 },
    ChainClear,
    VelocityLatch { channel: u8, enabled: bool },
    VelocityEmergencyStop,
    MasterVolume { value: f32 },
    TrackSend { track_id: TrackId, send_index: usize, level: f32 },
    AllNotesOff,
    Panic,
}

pub fn control_channel(capacity: usize) -> (Sender<ControlEvent>, Receiver<ControlEvent>) {
    bounded(capacity)
}

/// Audio-thread -> control-thread direction: telemetry and any data too large
/// to fit the atomic double-buffers (spectrum frames travel that way instead).
#[derive(Debug, Clone)]
pub enum EngineEvent {
    VoiceStolen { voice_id: VoiceId, track_id: TrackId },
    PatternLooped { pattern_index: usize },
    CalibrationComplete { channel: u8 },
}

pub fn engine_event_channel(capacity: usize) -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    bounded(capacity)
}

/// Audio-thread -> control-thread logging: configuration errors are clamped
/// or ignored in place on the audio path and reported here as a non-fatal
/// warning rather than ever unwinding. Fed through [`crate::rt_status!`].
pub fn status_channel(capacity: usize) -> (Sender<EngineStatusMessage>, Receiver<EngineStatusMessage>) {
    bounded(capacity)
}
