//! The top-level engine: owns every per-track and master subsystem, drains
//! the control channel once per block, and drives the cpal output stream on
//! its own real-time-priority thread.
//!
//! Each track owns a serial insert chain rather than sending to a shared
//! effect pool, so routing stays local to `process` with no cross-track
//! aliasing.

use crate::analyzer::SnapshotBuffer;
use crate::constants::{DEFAULT_MAX_VOICES, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE, MAX_TRACKS, MOD_UPDATE_RATE_HZ};
use crate::control::{ControlEvent, EngineEvent};
use crate::engines::EngineType;
use crate::fx::{MasterChain, PerTrackChain};
use crate::modulation::{ModSource, ModulationMatrix};
use crate::modules::Frame;
use crate::rt_status;
use crate::sequencer::{MAX_STEP_EVENTS_PER_BLOCK, Pattern, Sequencer, StepEventKind};
use crate::types::{EngineStatusMessage, TrackId};
use crate::velocity::VelocityPipeline;
use crate::voice_manager::VoiceManager;
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use thread_priority::{ThreadPriority, ThreadPriorityValue, set_current_thread_priority};

/// Maps user priority (0-99) to platform-appropriate priority range.
fn map_to_platform_priority(user_priority: u8) -> u8 {
    let user_priority = user_priority.min(99);

    #[cfg(target_os = "macos")]
    {
        let min_priority = 15u8;
        let max_priority = 47u8;
        let range = max_priority - min_priority;
        min_priority + ((user_priority as u16 * range as u16) / 99) as u8
    }

    #[cfg(target_os = "linux")]
    {
        user_priority.max(1)
    }

    #[cfg(target_os = "windows")]
    {
        user_priority.min(31)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        user_priority.min(50)
    }
}

#[inline]
fn flush_denormals(x: f32) -> f32 {
    const DENORMAL_THRESHOLD: f32 = 1e-15;
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

#[inline]
fn soft_clip(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x <= 0.5 {
        x
    } else if abs_x <= 1.0 {
        let t = abs_x - 0.5;
        let soft = 0.5 + t * (0.75 - 0.25 * t);
        x.signum() * soft
    } else {
        let normalized = abs_x.min(2.0) / 2.0;
        let soft = normalized * (3.0 - normalized * normalized) * 0.5;
        (x.signum() * soft).clamp(-1.0, 1.0)
    }
}

/// Per-track routing state that doesn't belong to the voice pool itself:
/// which engine new notes on this track use, and its effect tail.
struct Track {
    engine_type: EngineType,
    chain: PerTrackChain,
    send_level: f32,
}

impl Track {
    fn new(sample_rate: f32) -> Self {
        Self { engine_type: EngineType::default(), chain: PerTrackChain::new(sample_rate), send_level: 1.0 }
    }
}

/// Owns the whole signal path for one block: sequencer -> modulation ->
/// voices -> per-track fx -> master bus -> analyzer.
pub struct GrooveEngine {
    sample_rate: f32,
    voices: VoiceManager,
    modulation: ModulationMatrix,
    sequencer: Sequencer,
    velocity: VelocityPipeline,
    tracks: [Track; MAX_TRACKS],
    master: MasterChain,
    analyzer: crate::analyzer::SpectrumAnalyzer,
    control_rx: Receiver<ControlEvent>,
    event_tx: Sender<EngineEvent>,
    status_tx: Sender<EngineStatusMessage>,
    track_scratch: [Frame; MAX_BUFFER_SIZE],
    master_scratch: [Frame; MAX_BUFFER_SIZE],
    master_volume: f32,
}

impl GrooveEngine {
    pub fn new(
        sample_rate: f32,
        max_voices: usize,
        control_rx: Receiver<ControlEvent>,
        event_tx: Sender<EngineEvent>,
        status_tx: Sender<EngineStatusMessage>,
    ) -> Self {
        Self {
            sample_rate,
            voices: VoiceManager::new(max_voices),
            modulation: ModulationMatrix::new(MOD_UPDATE_RATE_HZ),
            sequencer: Sequencer::new(Pattern::new(16, MAX_TRACKS)),
            velocity: VelocityPipeline::new(),
            tracks: std::array::from_fn(|_| Track::new(sample_rate)),
            master: MasterChain::new(sample_rate),
            analyzer: crate::analyzer::SpectrumAnalyzer::new(sample_rate),
            control_rx,
            event_tx,
            status_tx,
            track_scratch: [Frame::ZERO; MAX_BUFFER_SIZE],
            master_scratch: [Frame::ZERO; MAX_BUFFER_SIZE],
            master_volume: 1.0,
        }
    }

    pub fn snapshot_handle(&self) -> Arc<SnapshotBuffer> {
        self.analyzer.snapshot_handle()
    }

    fn handle_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::NoteOn { track_id, note, velocity } => {
                let engine_type = self.tracks.get(track_id as usize).map(|t| t.engine_type).unwrap_or_default();
                let was_full = self.voices.active_voice_count() >= self.voices.voice_count();
                let voice_id = self.voices.note_on(track_id, engine_type, note, velocity, self.sample_rate);
                if was_full {
                    let _ = self.event_tx.try_send(EngineEvent::VoiceStolen { voice_id, track_id });
                }
                self.modulation.set_source_value(ModSource::Velocity, velocity);
                self.modulation.set_source_value(ModSource::NoteNumber, note as f32 / 127.0);
            }
            ControlEvent::NoteOff { track_id, note } => {
                self.voices.note_off(track_id, note);
            }
            ControlEvent::Aftertouch { track_id: _, value } => {
                self.modulation.set_source_value(ModSource::Aftertouch, value);
            }
            ControlEvent::PitchBend { track_id: _, semitones: _ } => {
                // Pitch bend is consumed directly by the next note-on's frequency
                // computation in a fuller build; tracked here only as telemetry.
            }
            ControlEvent::SetEngine { track_id, engine } => match engine.parse::<EngineType>() {
                Ok(kind) => match self.tracks.get_mut(track_id as usize) {
                    Some(track) => track.engine_type = kind,
                    None => rt_status!(self.status_tx, Warning, "invalid track {track_id}"),
                },
                Err(_) => rt_status!(self.status_tx, Warning, "unknown engine '{engine}'"),
            },
            ControlEvent::SetParameter { track_id, param, value } => {
                self.voices.set_parameter(track_id, param, value);
            }
            ControlEvent::SetModDepth { track_id: _, slot, depth } => {
                // The modulation fabric's slot list is global rather than
                // per-track (§4.4), so `slot` indexes directly into it.
                self.modulation.set_slot_amount(slot, depth);
            }
            ControlEvent::SequencerStep { track_id, step_index, step } => {
                self.sequencer.pattern.set_step(track_id as usize, step_index, step);
            }
            ControlEvent::SequencerTransport { running } => {
                self.sequencer.running = running;
                if !running {
                    self.sequencer.all_notes_off();
                }
            }
            ControlEvent::SetTempo { bpm } => {
                self.sequencer.set_tempo(bpm);
                self.modulation.set_tempo(bpm);
            }
            ControlEvent::SetSwing { amount } => {
                self.sequencer.pattern.timing.swing = amount.clamp(0.0, 1.0);
            }
            ControlEvent::ChainAppend { pattern_index, repeats } => {
                // `pattern_index` names the successor; links are appended onto
                // pattern slot 0, the only slot a single-pattern sequencer ever
                // loops on.
                self.sequencer.chain.append_link(0, crate::sequencer::ChainLink::new(pattern_index, repeats));
            }
            ControlEvent::ChainClear => {
                self.sequencer.chain.clear();
            }
            ControlEvent::VelocityLatch { channel, enabled } => {
                if !enabled {
                    self.velocity.latch.release(channel as usize, 0.0);
                }
            }
            ControlEvent::VelocityEmergencyStop => {
                self.velocity.latch.emergency_stop();
            }
            ControlEvent::MasterVolume { value } => {
                self.master_volume = value.clamp(0.0, 2.0);
            }
            ControlEvent::TrackSend { track_id, send_index: _, level } => {
                match self.tracks.get_mut(track_id as usize) {
                    Some(track) => track.send_level = level.clamp(0.0, 1.0),
                    None => rt_status!(self.status_tx, Warning, "invalid track {track_id}"),
                }
            }
            ControlEvent::AllNotesOff => {
                for track in 0..MAX_TRACKS {
                    self.voices.all_notes_off(track as TrackId);
                }
            }
            ControlEvent::Panic => {
                self.voices.emergency_stop();
                self.sequencer.all_notes_off();
                self.velocity.latch.emergency_stop();
            }
        }
    }

    fn drain_control_events(&mut self) {
        while let Ok(event) = self.control_rx.try_recv() {
            self.handle_control_event(event);
        }
    }

    fn apply_step_events(&mut self, events: &[Option<crate::sequencer::StepEvent>]) {
        for event in events.iter().flatten() {
            let engine_type = self.tracks.get(event.track as usize).map(|t| t.engine_type).unwrap_or_default();
            match event.kind {
                StepEventKind::NoteOn => {
                    let accent_gain = 10f32.powf(event.accent_gain_db / 20.0);
                    let velocity = (event.velocity * accent_gain).clamp(0.0, 1.0);
                    let was_full = self.voices.active_voice_count() >= self.voices.voice_count();
                    let voice_id = self.voices.note_on(event.track, engine_type, event.note, velocity, self.sample_rate);
                    if was_full {
                        let _ = self.event_tx.try_send(EngineEvent::VoiceStolen { voice_id, track_id: event.track });
                    }
                }
                StepEventKind::NoteOff => {
                    self.voices.note_off(event.track, event.note);
                }
            }
        }
    }

    /// Renders one block of audio into `output`, whose length must not
    /// exceed [`MAX_BUFFER_SIZE`].
    pub fn process(&mut self, output: &mut [Frame]) {
        let len = output.len().min(MAX_BUFFER_SIZE);
        Frame::process_block_zero(&mut output[..len]);

        self.drain_control_events();

        let mut step_events = [None; MAX_STEP_EVENTS_PER_BLOCK];
        let num_events = self.sequencer.advance(len, self.sample_rate, &mut step_events);
        self.apply_step_events(&step_events[..num_events]);

        let dt_seconds = len as f32 / self.sample_rate;
        self.modulation.update(dt_seconds);
        self.modulation.set_source_value(ModSource::VoiceCount, self.voices.active_voice_count() as f32 / self.voices.voice_count().max(1) as f32);
        self.voices.apply_modulation(&mut self.modulation);

        let master = &mut self.master_scratch[..len];
        Frame::process_block_zero(master);

        for (track_id, track) in self.tracks.iter_mut().enumerate() {
            let scratch = &mut self.track_scratch[..len];
            Frame::process_block_zero(scratch);

            self.voices.process_track(track_id as TrackId, scratch, self.sample_rate);
            track.chain.process_block(scratch);

            let send = track.send_level;
            for (m, s) in master.iter_mut().zip(scratch.iter()) {
                m.left += s.left * send;
                m.right += s.right * send;
            }
        }

        self.master.process_block(master);
        self.analyzer.process_audio_buffer(master);

        for (out, frame) in output[..len].iter_mut().zip(master.iter()) {
            out.left = soft_clip(flush_denormals(frame.left * self.master_volume));
            out.right = soft_clip(flush_denormals(frame.right * self.master_volume));
        }
    }

    /// Spawns the audio thread and runs the cpal output stream until a
    /// `ControlEvent::Panic`-triggered stop or the process exits.
    pub fn start_audio_thread(
        mut engine: GrooveEngine,
        sample_rate: u32,
        buffer_size: usize,
        output_device: Option<String>,
        audio_priority: u8,
    ) -> thread::JoinHandle<()> {
        thread::Builder::new()
            .name("audio".to_string())
            .spawn(move || {
                Self::run_audio_thread(&mut engine, sample_rate, buffer_size, output_device, audio_priority);
            })
            .expect("failed to spawn audio thread")
    }

    fn run_audio_thread(engine: &mut GrooveEngine, sample_rate: u32, buffer_size: usize, output_device: Option<String>, audio_priority: u8) {
        if audio_priority > 0 {
            let platform_priority = map_to_platform_priority(audio_priority);
            match ThreadPriorityValue::try_from(platform_priority) {
                Ok(priority_value) => {
                    let priority = ThreadPriority::Crossplatform(priority_value);
                    match set_current_thread_priority(priority) {
                        Ok(_) => println!("Audio thread real-time priority set to {audio_priority} (platform: {platform_priority})"),
                        Err(e) => {
                            eprintln!("Warning: failed to set audio thread real-time priority: {e}");
                            eprintln!("Consider running with elevated privileges for better audio performance");
                        }
                    }
                }
                Err(e) => eprintln!("Warning: invalid priority value {platform_priority}: {e}"),
            }
        } else {
            println!("Audio thread real-time priority disabled (priority = 0)");
        }

        use crate::device_selector::{DeviceSelector, SelectionResult};
        use cpal::StreamConfig;
        use cpal::traits::{DeviceTrait, StreamTrait};

        let selector = DeviceSelector::new(sample_rate);
        let device_info = match selector.select_output_device(output_device) {
            SelectionResult::Success(info) => {
                println!("Successfully selected audio device: {} {}", info.name, if info.is_default { "(default)" } else { "" });
                info
            }
            SelectionResult::Fallback(info, reason) => {
                println!("Audio device fallback: {reason}");
                info
            }
            SelectionResult::Error(err) => {
                eprintln!("Failed to select audio device: {err}");
                std::process::exit(crate::constants::EXIT_AUDIO_DEVICE_UNAVAILABLE);
            }
        };

        let device = device_info.device;
        let config = StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(buffer_size as u32),
        };

        let mut pre_allocated_buffer = vec![Frame::ZERO; buffer_size];
        let should_exit = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames_needed = data.len() / 2;
                    let actual_frames = frames_needed.min(buffer_size);
                    let buffer_slice = &mut pre_allocated_buffer[..actual_frames];

                    engine.process(buffer_slice);

                    data.fill(0.0);
                    for (i, frame) in buffer_slice.iter().enumerate() {
                        let idx = i * 2;
                        if idx + 1 < data.len() {
                            data[idx] = frame.left;
                            data[idx + 1] = frame.right;
                        }
                    }
                },
                |err| eprintln!("audio stream error: {err}"),
                None,
            )
            .expect("failed to build audio stream");

        stream.play().expect("failed to start audio stream");
        println!("Audio thread started at {sample_rate}Hz, buffer: {buffer_size}");

        loop {
            if should_exit.load(std::sync::atomic::Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
    }
}

impl Default for GrooveEngine {
    fn default() -> Self {
        let (_tx, rx) = crate::control::control_channel(crate::constants::CONTROL_QUEUE_CAPACITY);
        let (event_tx, _rx) = crate::control::engine_event_channel(crate::constants::TELEMETRY_QUEUE_CAPACITY);
        let (status_tx, _rx) = crate::control::status_channel(crate::constants::TELEMETRY_QUEUE_CAPACITY);
        Self::new(DEFAULT_SAMPLE_RATE as f32, DEFAULT_MAX_VOICES, rx, event_tx, status_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_silent_engine_produces_silence() {
        let mut engine = GrooveEngine::default();
        let mut output = [Frame::ZERO; 128];
        engine.process(&mut output);
        assert!(output.iter().all(|f| f.left.abs() < 1e-6 && f.right.abs() < 1e-6));
    }

    #[test]
    fn a_note_on_event_produces_nonzero_output_eventually() {
        let (tx, rx) = crate::control::control_channel(16);
        let (event_tx, _event_rx) = crate::control::engine_event_channel(16);
        let (status_tx, _status_rx) = crate::control::status_channel(16);
        let mut engine = GrooveEngine::new(48000.0, 8, rx, event_tx, status_tx);
        tx.send(ControlEvent::SetEngine { track_id: 0, engine: "subtractive" }).unwrap();
        tx.send(ControlEvent::NoteOn { track_id: 0, note: 60, velocity: 1.0 }).unwrap();

        let mut any_signal = false;
        for _ in 0..50 {
            let mut output = [Frame::ZERO; 256];
            engine.process(&mut output);
            if output.iter().any(|f| f.left.abs() > 1e-6 || f.right.abs() > 1e-6) {
                any_signal = true;
                break;
            }
        }
        assert!(any_signal);
    }
}
