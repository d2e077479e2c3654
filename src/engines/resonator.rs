//! Modal resonator bank: an impulse excites up to 6 independently-tuned
//! bandpass resonances (inharmonic stack set by `harmonics`), each decaying
//! at a rate set by `morph`. Resonances are independent (no cross-coupling
//! matrix) and each stage's output is clamped before summing, which keeps
//! the bank's output bounded regardless of how long resonances ring.

use super::{SynthEngine, note_to_freq};
use crate::dsp::biquad::BiquadFilter;
use crate::modules::Frame;
use crate::types::ParameterId;

const MODES: usize = 6;
const INHARMONIC_RATIOS: [f32; MODES] = [1.0, 2.01, 3.05, 4.2, 5.4, 6.9];

pub struct ResonatorEngine {
    filters: [BiquadFilter; MODES],
    gains: [f32; MODES],
    freq: f32,
    gate: bool,
    excite_countdown: u32,

    inharmonicity: f32,
    brightness: f32,
    decay: f32,
}

impl Default for ResonatorEngine {
    fn default() -> Self {
        Self {
            filters: [BiquadFilter::new(); MODES],
            gains: [1.0; MODES],
            freq: 0.0,
            gate: false,
            excite_countdown: 0,
            inharmonicity: 0.0,
            brightness: 0.5,
            decay: 0.5,
        }
    }
}

impl ResonatorEngine {
    fn retune(&mut self, sample_rate: f32) {
        for (i, filter) in self.filters.iter_mut().enumerate() {
            let stretch = 1.0 + self.inharmonicity * (i as f32);
            let mode_freq = (self.freq * INHARMONIC_RATIOS[i] * stretch).clamp(20.0, sample_rate * 0.45);
            let q = 4.0 + self.decay * 60.0;
            filter.set_bandpass(mode_freq, q, sample_rate);
            self.gains[i] = (1.0 - i as f32 / MODES as f32) * (0.3 + self.brightness * 0.7);
        }
    }
}

impl SynthEngine for ResonatorEngine {
    fn note_on(&mut self, note: u8, velocity: f32, sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
        self.excite_countdown = (4.0 + velocity * 40.0) as u32;
        self.retune(sample_rate);
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.brightness = (self.brightness + value * 0.05).clamp(0.0, 1.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.inharmonicity = value.clamp(0.0, 1.0) * 0.1,
            ParameterId::Timbre => self.brightness = value.clamp(0.0, 1.0),
            ParameterId::Morph => self.decay = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.inharmonicity / 0.1),
            ParameterId::Timbre => Some(self.brightness),
            ParameterId::Morph => Some(self.decay),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], _sample_rate: f32) {
        if !self.gate && self.excite_countdown == 0 {
            return;
        }
        for frame in output.iter_mut() {
            let excitation = if self.excite_countdown > 0 {
                self.excite_countdown -= 1;
                1.0
            } else {
                0.0
            };

            let mut out = 0.0;
            for (filter, gain) in self.filters.iter_mut().zip(self.gains.iter()) {
                out += filter.process(excitation).clamp(-4.0, 4.0) * gain;
            }
            out = (out * 0.3).clamp(-1.0, 1.0);

            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.reset();
        }
        self.excite_countdown = 0;
        self.gate = false;
    }
}
