//! The `tracks x steps` grid plus per-track configuration, timing, and the
//! selection/clipboard support used by external pattern editors.
//!
//! Covers track types, mute/solo/level/transpose, swing/shuffle/humanize/
//! gate-time, and a selection rectangle with clipboard support.

use crate::constants::{MAX_STEPS_PER_TRACK, MAX_TRACKS};
use crate::sequencer::step::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TrackType {
    MonoSynth,
    PolySynth,
    Drum,
    Sampler,
    Aux,
}

impl Default for TrackType {
    fn default() -> Self {
        TrackType::MonoSynth
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TrackConfig {
    pub track_type: TrackType,
    pub enabled: bool,
    pub muted: bool,
    pub solo: bool,
    pub level: f32,
    pub midi_channel: u8,
    pub transpose: i8,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            track_type: TrackType::default(),
            enabled: true,
            muted: false,
            solo: false,
            level: 0.8,
            midi_channel: 0,
            transpose: 0,
        }
    }
}

impl TrackConfig {
    pub fn set_transpose(&mut self, semitones: i8) {
        self.transpose = semitones.clamp(-24, 24);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimingConfig {
    pub swing: f32,
    pub shuffle: f32,
    pub humanize: i8,
    pub gate_time: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { swing: 0.0, shuffle: 0.0, humanize: 0, gate_time: 0.8 }
    }
}

impl TimingConfig {
    pub fn set_swing(&mut self, swing: f32) {
        self.swing = swing.clamp(0.0, 1.0);
    }

    pub fn set_shuffle(&mut self, shuffle: f32) {
        self.shuffle = shuffle.clamp(0.0, 1.0);
    }

    pub fn set_gate_time(&mut self, gate_time: f32) {
        self.gate_time = gate_time.clamp(0.1, 2.0);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    pub start_track: usize,
    pub end_track: usize,
    pub start_step: usize,
    pub end_step: usize,
    pub active: bool,
}

impl Selection {
    pub fn is_valid(&self) -> bool {
        self.active && self.start_track <= self.end_track && self.start_step <= self.end_step
    }
}

pub struct Pattern {
    steps: [[Step; MAX_STEPS_PER_TRACK]; MAX_TRACKS],
    length: usize,
    num_tracks: usize,
    track_configs: [TrackConfig; MAX_TRACKS],
    pub timing: TimingConfig,
    selection: Selection,
    clipboard: Vec<Vec<Step>>,
    pub tempo_bpm: f32,
}

impl Pattern {
    pub fn new(length: usize, num_tracks: usize) -> Self {
        Self {
            steps: [[Step::default(); MAX_STEPS_PER_TRACK]; MAX_TRACKS],
            length: length.clamp(1, MAX_STEPS_PER_TRACK),
            num_tracks: num_tracks.clamp(1, MAX_TRACKS),
            track_configs: [TrackConfig::default(); MAX_TRACKS],
            timing: TimingConfig::default(),
            selection: Selection::default(),
            clipboard: Vec::new(),
            tempo_bpm: crate::constants::DEFAULT_TEMPO_BPM,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn set_length(&mut self, length: usize) {
        self.length = length.clamp(1, MAX_STEPS_PER_TRACK);
    }

    pub fn num_tracks(&self) -> usize {
        self.num_tracks
    }

    pub fn set_num_tracks(&mut self, num_tracks: usize) {
        self.num_tracks = num_tracks.clamp(1, MAX_TRACKS);
    }

    pub fn is_valid_track(&self, track: usize) -> bool {
        track < self.num_tracks
    }

    pub fn is_valid_step(&self, step: usize) -> bool {
        step < self.length
    }

    pub fn get_step(&self, track: usize, step: usize) -> Option<&Step> {
        if self.is_valid_track(track) && self.is_valid_step(step) {
            Some(&self.steps[track][step])
        } else {
            None
        }
    }

    pub fn get_step_mut(&mut self, track: usize, step: usize) -> Option<&mut Step> {
        if track < MAX_TRACKS && step < MAX_STEPS_PER_TRACK {
            Some(&mut self.steps[track][step])
        } else {
            None
        }
    }

    pub fn set_step(&mut self, track: usize, step: usize, data: Step) {
        if let Some(slot) = self.get_step_mut(track, step) {
            *slot = data;
        }
    }

    pub fn clear_step(&mut self, track: usize, step: usize) {
        if let Some(slot) = self.get_step_mut(track, step) {
            *slot = Step::default();
        }
    }

    pub fn track_config(&self, track: usize) -> &TrackConfig {
        &self.track_configs[track.min(MAX_TRACKS - 1)]
    }

    pub fn track_config_mut(&mut self, track: usize) -> &mut TrackConfig {
        &mut self.track_configs[track.min(MAX_TRACKS - 1)]
    }

    /// A track sounds iff enabled, not muted, and (no track is soloed or this
    /// one is).
    pub fn is_track_audible(&self, track: usize) -> bool {
        let config = self.track_config(track);
        if !config.enabled || config.muted {
            return false;
        }
        let any_solo = self.track_configs[..self.num_tracks].iter().any(|c| c.solo);
        !any_solo || config.solo
    }

    pub fn clear(&mut self) {
        self.steps = [[Step::default(); MAX_STEPS_PER_TRACK]; MAX_TRACKS];
    }

    pub fn clear_track(&mut self, track: usize) {
        if track < MAX_TRACKS {
            self.steps[track] = [Step::default(); MAX_STEPS_PER_TRACK];
        }
    }

    pub fn shift_track(&mut self, track: usize, amount: isize) {
        if track >= MAX_TRACKS || self.length == 0 {
            return;
        }
        let len = self.length;
        let mut shifted = [Step::default(); MAX_STEPS_PER_TRACK];
        for i in 0..len {
            let src = (i as isize - amount).rem_euclid(len as isize) as usize;
            shifted[i] = self.steps[track][src];
        }
        self.steps[track][..len].copy_from_slice(&shifted[..len]);
    }

    pub fn reverse_track(&mut self, track: usize) {
        if track < MAX_TRACKS {
            self.steps[track][..self.length].reverse();
        }
    }

    pub fn count_active_steps(&self, track: usize) -> usize {
        if track >= MAX_TRACKS {
            return 0;
        }
        self.steps[track][..self.length].iter().filter(|s| s.is_active()).count()
    }

    pub fn is_track_empty(&self, track: usize) -> bool {
        self.count_active_steps(track) == 0
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    pub fn copy_selection(&mut self) {
        if !self.selection.is_valid() {
            return;
        }
        let sel = self.selection;
        let mut buf = Vec::new();
        for track in sel.start_track..=sel.end_track {
            let mut row = Vec::new();
            for step in sel.start_step..=sel.end_step {
                row.push(self.steps[track][step]);
            }
            buf.push(row);
        }
        self.clipboard = buf;
    }

    pub fn has_clipboard(&self) -> bool {
        !self.clipboard.is_empty()
    }

    pub fn paste_selection(&mut self, target_track: usize, target_step: usize) {
        for (dt, row) in self.clipboard.iter().enumerate() {
            let track = target_track + dt;
            if track >= MAX_TRACKS {
                break;
            }
            for (ds, step) in row.iter().enumerate() {
                let step_index = target_step + ds;
                if step_index >= MAX_STEPS_PER_TRACK {
                    break;
                }
                self.steps[track][step_index] = *step;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::step::StepFlags;

    #[test]
    fn solo_on_one_track_silences_the_others() {
        let mut pattern = Pattern::new(16, 2);
        pattern.track_config_mut(0).solo = true;
        assert!(pattern.is_track_audible(0));
        assert!(!pattern.is_track_audible(1));
    }

    #[test]
    fn muted_track_is_never_audible_even_when_soloed() {
        let mut pattern = Pattern::new(16, 1);
        pattern.track_config_mut(0).solo = true;
        pattern.track_config_mut(0).muted = true;
        assert!(!pattern.is_track_audible(0));
    }

    #[test]
    fn copy_and_paste_round_trips_step_data() {
        let mut pattern = Pattern::new(16, 2);
        let mut step = Step::default();
        step.set_flag(StepFlags::ENABLED, true);
        step.note = 72;
        pattern.set_step(0, 0, step);
        pattern.set_selection(Selection { start_track: 0, end_track: 0, start_step: 0, end_step: 0, active: true });
        pattern.copy_selection();
        pattern.paste_selection(1, 4);
        assert_eq!(pattern.get_step(1, 4).unwrap().note, 72);
    }

    #[test]
    fn shift_track_is_a_cyclic_rotation() {
        let mut pattern = Pattern::new(4, 1);
        for i in 0..4u8 {
            let mut step = Step::default();
            step.note = i;
            pattern.set_step(0, i as usize, step);
        }
        pattern.shift_track(0, 1);
        let notes: Vec<u8> = (0..4).map(|i| pattern.get_step(0, i).unwrap().note).collect();
        assert_eq!(notes, vec![3, 0, 1, 2]);
    }
}
