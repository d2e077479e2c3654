//! Additive engine: sums up to 16 sine partials with a falloff curve set by
//! `timbre` and an odd/even balance set by `morph`, count set by `harmonics`.

use super::{SynthEngine, note_to_freq};
use crate::dsp::tables::table_sin;
use crate::modules::Frame;
use crate::types::ParameterId;

const MAX_PARTIALS: usize = 16;

pub struct HarmonicsEngine {
    phases: [f32; MAX_PARTIALS],
    incs: [f32; MAX_PARTIALS],
    gate: bool,
    freq: f32,

    partial_count: usize,
    falloff: f32,
    odd_even_balance: f32,
}

impl Default for HarmonicsEngine {
    fn default() -> Self {
        Self {
            phases: [0.0; MAX_PARTIALS],
            incs: [0.0; MAX_PARTIALS],
            gate: false,
            freq: 0.0,
            partial_count: 8,
            falloff: 1.0,
            odd_even_balance: 0.5,
        }
    }
}

impl SynthEngine for HarmonicsEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
        for h in 0..MAX_PARTIALS {
            self.incs[h] = self.freq * (h + 1) as f32 / sample_rate;
        }
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.falloff = (self.falloff + value * 0.1).clamp(0.1, 4.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.partial_count = 1 + (value.clamp(0.0, 1.0) * (MAX_PARTIALS - 1) as f32) as usize;
            }
            ParameterId::Timbre => self.falloff = 0.1 + value.clamp(0.0, 1.0) * 3.9,
            ParameterId::Morph => self.odd_even_balance = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some((self.partial_count - 1) as f32 / (MAX_PARTIALS - 1) as f32),
            ParameterId::Timbre => Some((self.falloff - 0.1) / 3.9),
            ParameterId::Morph => Some(self.odd_even_balance),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], _sample_rate: f32) {
        if !self.gate && self.freq == 0.0 {
            return;
        }
        let mut weights = [0.0f32; MAX_PARTIALS];
        let mut weight_sum = 0.0;
        for h in 0..self.partial_count {
            let is_odd = h % 2 == 0; // h=0 is the fundamental, an "odd" harmonic
            let parity_gain = if is_odd { self.odd_even_balance } else { 1.0 - self.odd_even_balance };
            let w = parity_gain / (h as f32 + 1.0).powf(self.falloff);
            weights[h] = w;
            weight_sum += w;
        }
        if weight_sum < 1e-6 {
            weight_sum = 1.0;
        }

        for frame in output.iter_mut() {
            let mut out = 0.0;
            for h in 0..self.partial_count {
                out += table_sin(self.phases[h]) * weights[h];
                self.phases[h] = (self.phases[h] + self.incs[h]).fract();
            }
            out /= weight_sum;
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.phases = [0.0; MAX_PARTIALS];
        self.gate = false;
    }
}
