//! Formant/vocal engine: a buzzy pulse source excites three parallel
//! bandpass resonances tuned to vowel formants, selected by `harmonics` and
//! shifted by `morph`.

use super::{SynthEngine, note_to_freq};
use crate::dsp::biquad::BiquadFilter;
use crate::modules::Frame;
use crate::types::ParameterId;

const VOWELS: [[f32; 3]; 5] = [
    [800.0, 1150.0, 2900.0],  // A
    [350.0, 2000.0, 2800.0],  // E
    [270.0, 2140.0, 2950.0],  // I
    [450.0, 800.0, 2830.0],   // O
    [325.0, 700.0, 2530.0],   // U
];

pub struct FormantVocalEngine {
    phase: f32,
    freq: f32,
    gate: bool,
    formants: [BiquadFilter; 3],

    vowel_index: usize,
    q: f32,
    shift: f32,
}

impl Default for FormantVocalEngine {
    fn default() -> Self {
        Self {
            phase: 0.0,
            freq: 0.0,
            gate: false,
            formants: [BiquadFilter::new(), BiquadFilter::new(), BiquadFilter::new()],
            vowel_index: 0,
            q: 8.0,
            shift: 0.0,
        }
    }
}

impl FormantVocalEngine {
    fn update_formants(&mut self, sample_rate: f32) {
        let base = VOWELS[self.vowel_index.min(VOWELS.len() - 1)];
        for (filter, freq) in self.formants.iter_mut().zip(base.iter()) {
            let shifted = (freq * (1.0 + self.shift)).clamp(80.0, sample_rate * 0.45);
            filter.set_bandpass(shifted, self.q, sample_rate);
        }
    }
}

impl SynthEngine for FormantVocalEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
        self.update_formants(sample_rate);
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.q = (self.q + value * 4.0).clamp(1.0, 30.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.vowel_index = ((value.clamp(0.0, 1.0) * (VOWELS.len() - 1) as f32).round()) as usize;
            }
            ParameterId::Timbre => self.q = 1.0 + value.clamp(0.0, 1.0) * 29.0,
            ParameterId::Morph => self.shift = (value.clamp(0.0, 1.0) - 0.5) * 0.6,
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.vowel_index as f32 / (VOWELS.len() - 1) as f32),
            ParameterId::Timbre => Some((self.q - 1.0) / 29.0),
            ParameterId::Morph => Some(self.shift / 0.6 + 0.5),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.freq == 0.0 {
            return;
        }
        let inc = self.freq / sample_rate;
        for frame in output.iter_mut() {
            let excitation = if self.phase < 0.1 { 1.0 - self.phase / 0.1 } else { 0.0 };

            let mut out = 0.0;
            for filter in self.formants.iter_mut() {
                out += filter.process(excitation);
            }
            out *= 0.4;

            self.phase = (self.phase + inc).fract();
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        for filter in self.formants.iter_mut() {
            filter.reset();
        }
        self.gate = false;
    }
}
