//! Chord engine: stacks up to four detuned sawtooth oscillators at fixed
//! interval offsets selected by `harmonics`, so a single note plays a full
//! voicing.

use super::{SynthEngine, note_to_freq};
use crate::modules::Frame;
use crate::types::ParameterId;

const CHORDS: [[i32; 4]; 6] = [
    [0, 0, 0, 0],    // unison
    [0, 4, 7, 0],    // major triad
    [0, 3, 7, 0],    // minor triad
    [0, 4, 7, 11],   // major 7th
    [0, 3, 7, 10],   // minor 7th
    [0, 5, 7, 12],   // sus4 + octave
];

#[derive(Default)]
pub struct ChordEngine {
    phases: [f32; 4],
    incs: [f32; 4],
    gate: bool,
    root_freq: f32,

    chord_index: usize,
    spread: f32,
    cutoff_morph: f32,
}

impl SynthEngine for ChordEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, sample_rate: f32) {
        self.root_freq = note_to_freq(note);
        self.gate = true;
        let intervals = CHORDS[self.chord_index.min(CHORDS.len() - 1)];
        for (i, semis) in intervals.iter().enumerate() {
            let detune = 1.0 + (i as f32 - 1.5) * self.spread * 0.002;
            let freq = self.root_freq * 2f32.powf(*semis as f32 / 12.0) * detune;
            self.incs[i] = freq / sample_rate;
        }
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.spread = (self.spread + value).clamp(0.0, 20.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.chord_index = ((value.clamp(0.0, 1.0) * (CHORDS.len() - 1) as f32).round()) as usize;
            }
            ParameterId::Timbre => self.spread = value.clamp(0.0, 1.0) * 20.0,
            ParameterId::Morph => self.cutoff_morph = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.chord_index as f32 / (CHORDS.len() - 1) as f32),
            ParameterId::Timbre => Some(self.spread / 20.0),
            ParameterId::Morph => Some(self.cutoff_morph),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], _sample_rate: f32) {
        if !self.gate && self.root_freq == 0.0 {
            return;
        }
        let gain = 1.0 / 4.0_f32.sqrt();
        for frame in output.iter_mut() {
            let mut out = 0.0;
            for i in 0..4 {
                out += (2.0 * self.phases[i] - 1.0) * gain;
                self.phases[i] = (self.phases[i] + self.incs[i]).fract();
            }
            frame.left += out * (0.6 + self.cutoff_morph * 0.4);
            frame.right += out * (0.6 + self.cutoff_morph * 0.4);
        }
    }

    fn reset(&mut self) {
        self.phases = [0.0; 4];
        self.gate = false;
    }
}
