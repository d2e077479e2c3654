//! Step sequencer: clock, playhead, per-step event emission, pattern
//! chaining, and the Euclidean pattern generator.
//!
//! The clock lives on the audio thread (it is advanced once per buffer, in
//! sample-accurate lockstep with the voice manager), so nothing in this
//! module allocates once a pattern is loaded. `advance` writes events into a
//! caller-provided fixed buffer instead of returning a `Vec`.

pub mod arpeggiator;
pub mod chain;
pub mod euclidean;
pub mod pattern;
pub mod step;

pub use arpeggiator::{ArpMode, Arpeggiator};
pub use chain::{ChainLink, ChainManager, TriggerMode};
pub use pattern::{Pattern, Selection, TimingConfig, TrackConfig, TrackType};
pub use step::{Step, StepFlags};

use crate::constants::MAX_TRACKS;
use crate::types::TrackId;

/// Upper bound on note-on/note-off events a single buffer can produce; sized
/// generously (every track firing a note-on and a note-off in the same
/// block) so the hot path never needs to grow the event buffer.
pub const MAX_STEP_EVENTS_PER_BLOCK: usize = MAX_TRACKS * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEventKind {
    NoteOn,
    NoteOff,
}

#[derive(Debug, Clone, Copy)]
pub struct StepEvent {
    pub track: TrackId,
    pub kind: StepEventKind,
    pub note: u8,
    pub velocity: f32,
    pub accent_gain_db: f32,
    pub accent_cutoff_boost: f32,
    pub slide_time_s: f32,
    pub sample_offset: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct TrackPlayhead {
    step_index: usize,
    samples_to_next_step: i64,
    note_off_countdown: i64,
    off_note: Option<u8>,
    tied_through: bool,
}

/// Deterministic xorshift64* PRNG used for per-step probability rolls;
/// reseedable so tests are reproducible.
struct Rng(u64);

impl Rng {
    fn next_unit(&mut self) -> f32 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        let bits = x.wrapping_mul(0x2545F4914F6CDD1D);
        ((bits >> 40) as f32) / ((1u64 << 24) as f32)
    }
}

pub struct Sequencer {
    pub pattern: Pattern,
    pub chain: ChainManager,
    pub arp: Arpeggiator,
    pub running: bool,
    tempo_bpm: f32,
    steps_per_beat: f32,
    playheads: [TrackPlayhead; MAX_TRACKS],
    current_pattern_index: usize,
    rng: Rng,
}

impl Sequencer {
    pub fn new(pattern: Pattern) -> Self {
        let tempo_bpm = pattern.tempo_bpm;
        Self {
            pattern,
            chain: ChainManager::new(1),
            arp: Arpeggiator::new(),
            running: false,
            tempo_bpm,
            steps_per_beat: 4.0,
            playheads: [TrackPlayhead::default(); MAX_TRACKS],
            current_pattern_index: 0,
            rng: Rng(0xA24BAED4963EE407),
        }
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo_bpm = bpm.clamp(20.0, 300.0);
    }

    pub fn tempo_bpm(&self) -> f32 {
        self.tempo_bpm
    }

    fn step_duration_samples(&self, sample_rate: f32) -> f32 {
        let samples_per_beat = 60.0 / self.tempo_bpm * sample_rate;
        samples_per_beat / self.steps_per_beat
    }

    fn scheduled_interval(&self, step_index: usize, sample_rate: f32) -> i64 {
        let base = self.step_duration_samples(sample_rate);
        let swing_offset = if step_index % 2 == 1 {
            (self.pattern.timing.swing - 0.5) * 0.1 * base
        } else {
            0.0
        };
        (base + swing_offset).round().max(1.0) as i64
    }

    /// Advances every track's playhead by `num_samples` and writes any
    /// note-on/note-off events into `events`, returning how many were
    /// written. Safe to call with `running == false` (just drains pending
    /// note-offs so held notes still get released).
    pub fn advance(
        &mut self,
        num_samples: usize,
        sample_rate: f32,
        events: &mut [Option<StepEvent>; MAX_STEP_EVENTS_PER_BLOCK],
    ) -> usize {
        let mut count = 0;
        let num_tracks = self.pattern.num_tracks();

        for track in 0..num_tracks {
            let audible = self.pattern.is_track_audible(track);
            let step_len = self.pattern.length();
            if step_len == 0 {
                continue;
            }

            // Drain any pending note-off that falls within this block.
            let ph = &mut self.playheads[track];
            if let Some(note) = ph.off_note {
                if ph.note_off_countdown <= num_samples as i64 {
                    if count < events.len() && audible {
                        events[count] = Some(StepEvent {
                            track: track as TrackId,
                            kind: StepEventKind::NoteOff,
                            note,
                            velocity: 0.0,
                            accent_gain_db: 0.0,
                            accent_cutoff_boost: 0.0,
                            slide_time_s: 0.0,
                            sample_offset: ph.note_off_countdown.max(0) as usize,
                        });
                        count += 1;
                    }
                    self.playheads[track].off_note = None;
                } else {
                    self.playheads[track].note_off_countdown -= num_samples as i64;
                }
            }

            if !self.running {
                continue;
            }

            self.playheads[track].samples_to_next_step -= num_samples as i64;
            // Bounded: a step can never be shorter than one sample, so this
            // loop runs at most `num_samples` times per track per block.
            while self.playheads[track].samples_to_next_step <= 0 {
                let overshoot = -self.playheads[track].samples_to_next_step;
                let sample_offset = (num_samples as i64 - overshoot).clamp(0, num_samples as i64 - 1).max(0) as usize;

                self.emit_step(track, sample_offset, audible, step_len, sample_rate, events, &mut count);

                let next_index = (self.playheads[track].step_index + 1) % step_len;
                if next_index == 0 {
                    self.chain.on_pattern_looped(track, self.current_pattern_index);
                }
                self.playheads[track].step_index = next_index;
                self.playheads[track].samples_to_next_step += self.scheduled_interval(next_index, sample_rate);
            }
        }

        count
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_step(
        &mut self,
        track: usize,
        sample_offset: usize,
        audible: bool,
        step_len: usize,
        sample_rate: f32,
        events: &mut [Option<StepEvent>; MAX_STEP_EVENTS_PER_BLOCK],
        count: &mut usize,
    ) {
        let step_index = self.playheads[track].step_index;
        let Some(step) = self.pattern.get_step(track, step_index).copied() else { return };

        if step.flags.contains(StepFlags::TIE) {
            // Extend the currently sounding note through this step instead
            // of retriggering.
            let extra = self.scheduled_interval(step_index, sample_rate);
            self.playheads[track].note_off_countdown += extra;
            self.playheads[track].tied_through = true;
            return;
        }

        if !step.is_active() {
            return;
        }

        let roll = self.rng.next_unit();
        if roll >= step.probability as f32 / 127.0 {
            return;
        }

        let micro_offset = (step.micro_timing() as f32 / 64.0) * 0.5 * self.step_duration_samples(sample_rate);
        let offset = (sample_offset as i64 + micro_offset.round() as i64)
            .clamp(0, sample_offset.max(1) as i64)
            .max(0) as usize;

        let transpose = self.pattern.track_config(track).transpose;
        let note = (step.note as i32 + transpose as i32).clamp(0, 127) as u8;
        let velocity = step.velocity as f32 / 127.0;

        let accent_gain_db = if step.flags.contains(StepFlags::ACCENT) { step.accent_gain_db() } else { 0.0 };
        let accent_cutoff_boost =
            if step.flags.contains(StepFlags::ACCENT) { step.accent_cutoff_boost() } else { 0.0 };
        let slide_time_s = if step.flags.contains(StepFlags::SLIDE) { step.slide_time_seconds() } else { 0.0 };

        if audible && *count < events.len() {
            events[*count] = Some(StepEvent {
                track: track as TrackId,
                kind: StepEventKind::NoteOn,
                note,
                velocity,
                accent_gain_db,
                accent_cutoff_boost,
                slide_time_s,
                sample_offset: offset,
            });
            *count += 1;
        }

        let step_samples = self.scheduled_interval(step_index, sample_rate);
        let gate_samples = (step_samples as f32 * self.pattern.timing.gate_time) as i64;
        self.playheads[track].note_off_countdown = gate_samples.max(1);
        self.playheads[track].off_note = Some(note);
        self.playheads[track].tied_through = false;
    }

    pub fn all_notes_off(&mut self) {
        self.running = false;
        for ph in &mut self.playheads {
            ph.off_note = None;
            ph.note_off_countdown = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_sequencer(steps: usize) -> Sequencer {
        let mut pattern = Pattern::new(steps, 1);
        for i in 0..steps {
            let mut step = Step::default();
            step.set_flag(StepFlags::ENABLED, true);
            step.note = 60;
            step.set_probability(127);
            pattern.set_step(0, i, step);
        }
        let mut seq = Sequencer::new(pattern);
        seq.set_tempo(120.0);
        seq.running = true;
        seq
    }

    #[test]
    fn every_enabled_step_eventually_emits_a_note_on() {
        let mut seq = running_sequencer(4);
        let sample_rate = 48000.0;
        let mut note_ons = 0;
        for _ in 0..2000 {
            let mut events = [None; MAX_STEP_EVENTS_PER_BLOCK];
            let n = seq.advance(64, sample_rate, &mut events);
            note_ons += events[..n].iter().filter(|e| e.unwrap().kind == StepEventKind::NoteOn).count();
            if note_ons >= 4 {
                break;
            }
        }
        assert!(note_ons >= 4);
    }

    #[test]
    fn disabled_track_never_emits_events() {
        let mut pattern = Pattern::new(4, 1);
        pattern.track_config_mut(0).enabled = false;
        let mut step = Step::default();
        step.set_flag(StepFlags::ENABLED, true);
        pattern.set_step(0, 0, step);
        let mut seq = Sequencer::new(pattern);
        seq.running = true;
        let mut any = false;
        for _ in 0..500 {
            let mut events = [None; MAX_STEP_EVENTS_PER_BLOCK];
            let n = seq.advance(64, 48000.0, &mut events);
            any |= n > 0;
        }
        assert!(!any);
    }

    #[test]
    fn stopped_sequencer_still_releases_a_pending_note() {
        let mut seq = running_sequencer(1);
        let mut events = [None; MAX_STEP_EVENTS_PER_BLOCK];
        // Force a note-on.
        let _ = seq.advance(1, 48000.0, &mut events);
        seq.running = false;
        let mut saw_note_off = false;
        for _ in 0..10000 {
            let mut events = [None; MAX_STEP_EVENTS_PER_BLOCK];
            let n = seq.advance(64, 48000.0, &mut events);
            if events[..n].iter().any(|e| e.unwrap().kind == StepEventKind::NoteOff) {
                saw_note_off = true;
                break;
            }
        }
        assert!(saw_note_off);
    }
}
