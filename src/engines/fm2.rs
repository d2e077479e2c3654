//! Two-operator FM engine: sine carrier phase-modulated by a sine modulator,
//! with a feedback path on the modulator for metallic/chaotic timbres.

use super::{SynthEngine, note_to_freq};
use crate::dsp::tables::table_sin;
use crate::modules::Frame;
use crate::types::ParameterId;

#[derive(Default)]
pub struct Fm2Engine {
    carrier_phase: f32,
    mod_phase: f32,
    mod_freq: f32,
    carrier_freq: f32,
    mod_feedback_state: f32,
    gate: bool,

    ratio: f32,
    index: f32,
    feedback: f32,
}

impl SynthEngine for Fm2Engine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.carrier_freq = note_to_freq(note);
        self.mod_freq = self.carrier_freq * self.ratio.max(0.25);
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.index = (self.index + value * 2.0).clamp(0.0, 16.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.ratio = 0.25 + value.clamp(0.0, 1.0) * 7.75,
            ParameterId::Timbre => self.index = value.clamp(0.0, 1.0) * 16.0,
            ParameterId::Morph => self.feedback = value.clamp(0.0, 1.0) * 0.9,
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some((self.ratio - 0.25) / 7.75),
            ParameterId::Timbre => Some(self.index / 16.0),
            ParameterId::Morph => Some(self.feedback / 0.9),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.carrier_freq == 0.0 {
            return;
        }
        let carrier_inc = self.carrier_freq / sample_rate;
        let mod_inc = self.mod_freq / sample_rate;

        for frame in output.iter_mut() {
            let modulator = table_sin(self.mod_phase) + self.mod_feedback_state * self.feedback;
            let out = table_sin((self.carrier_phase + modulator * self.index * 0.125).rem_euclid(1.0));

            self.mod_feedback_state = modulator;
            self.carrier_phase = (self.carrier_phase + carrier_inc).fract();
            self.mod_phase = (self.mod_phase + mod_inc).fract();

            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.carrier_phase = 0.0;
        self.mod_phase = 0.0;
        self.mod_feedback_state = 0.0;
        self.gate = false;
    }
}
