//! Struck-object model: a short noise "mallet" excitation through a single
//! resonant Moog ladder whose cutoff tracks the note and whose resonance
//! (`harmonics`) stands in for the struck material's stiffness. `timbre`
//! brightens the strike, `morph` moves the excitation point, which thins out
//! every other partial by mixing in a comb-delayed copy of the excitation.

use super::{SynthEngine, note_to_freq};
use crate::dsp::feedback_delay::FeedbackDelay;
use crate::dsp::moog_ladder::MoogLadder;
use crate::dsp::oscillators::SmoothNoiseGenerator;
use crate::modules::Frame;
use crate::types::ParameterId;

const COMB_SIZE: usize = 512;

pub struct ModalEngine {
    noise: SmoothNoiseGenerator,
    filter: MoogLadder,
    comb: FeedbackDelay<COMB_SIZE>,
    freq: f32,
    gate: bool,
    strike_countdown: u32,

    material: f32,
    brightness: f32,
    position: f32,
}

impl Default for ModalEngine {
    fn default() -> Self {
        Self {
            noise: SmoothNoiseGenerator::new(),
            filter: MoogLadder::new(),
            comb: FeedbackDelay::new(),
            freq: 0.0,
            gate: false,
            strike_countdown: 0,
            material: 0.3,
            brightness: 0.5,
            position: 0.5,
        }
    }
}

impl SynthEngine for ModalEngine {
    fn note_on(&mut self, note: u8, velocity: f32, _sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
        self.strike_countdown = (2.0 + velocity * 30.0) as u32;
        self.filter.set_cutoff(self.freq * 2.0);
        self.filter.set_resonance(self.material * 4.0);
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.material = (self.material + value * 0.05).clamp(0.0, 1.0);
        self.filter.set_resonance(self.material * 4.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.material = value.clamp(0.0, 1.0);
                self.filter.set_resonance(self.material * 4.0);
            }
            ParameterId::Timbre => self.brightness = value.clamp(0.0, 1.0),
            ParameterId::Morph => self.position = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.material),
            ParameterId::Timbre => Some(self.brightness),
            ParameterId::Morph => Some(self.position),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.strike_countdown == 0 {
            return;
        }
        self.filter.set_cutoff((self.freq * (1.0 + self.brightness * 6.0)).clamp(20.0, sample_rate * 0.45));
        let delay_samples = (COMB_SIZE as f32 * 0.5 * (1.0 - self.position)) as usize;

        for frame in output.iter_mut() {
            let strike = if self.strike_countdown > 0 {
                self.strike_countdown -= 1;
                self.noise.next_sample()
            } else {
                0.0
            };

            let thinned = self.comb.process(strike, delay_samples.max(1), 0.2);
            let excitation = strike - thinned * self.position;
            let out = self.filter.process(excitation).clamp(-1.0, 1.0);

            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.noise.reset();
        self.filter.reset();
        self.comb.clear();
        self.strike_countdown = 0;
        self.gate = false;
    }
}
