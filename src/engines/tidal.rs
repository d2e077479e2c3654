//! Slope-generator engine inspired by function-generator/complex-oscillator
//! designs: a ramp whose rise/fall ratio (`morph`) and curvature (`timbre`)
//! are continuously variable, run fast enough to serve as an oscillator.

use super::{SynthEngine, note_to_freq};
use crate::dsp::oscillators::{exp_shape, log_shape};
use crate::modules::Frame;
use crate::types::ParameterId;

#[derive(Default)]
pub struct TidalEngine {
    phase: f32,
    freq: f32,
    gate: bool,

    ratio: f32,
    shape_amount: f32,
    symmetry: f32,
}

impl SynthEngine for TidalEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.shape_amount = (self.shape_amount + value * 0.05).clamp(0.0, 1.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.ratio = (value.clamp(0.0, 1.0) * 4.0 - 2.0).exp2(),
            ParameterId::Timbre => self.shape_amount = value.clamp(0.0, 1.0),
            ParameterId::Morph => self.symmetry = value.clamp(0.01, 0.99),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some((self.ratio.log2() + 2.0) / 4.0),
            ParameterId::Timbre => Some(self.shape_amount),
            ParameterId::Morph => Some(self.symmetry),
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
        let inc = (self.freq * self.ratio.max(0.01)) / sample_rate;

        for frame in output.iter_mut() {
            let rise_len = self.symmetry;
            let unipolar = if self.phase < rise_len {
                self.phase / rise_len
            } else {
                1.0 - (self.phase - rise_len) / (1.0 - rise_len)
            };

            let curved = if self.shape_amount >= 0.5 {
                exp_shape(unipolar, (self.shape_amount - 0.5) * 2.0 * 9.0 + 0.5)
            } else {
                log_shape(unipolar, (0.5 - self.shape_amount) * 2.0 * 9.0 + 0.5)
            };

            self.phase = (self.phase + inc).fract();
            frame.left += curved;
            frame.right += curved;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.gate = false;
    }
}
