//! MacroVA-style subtractive engine: a detuned saw/square pair through a
//! resonant Moog-style ladder filter. The oldest and simplest engine in the
//! set; every other engine borrows its parameter-naming conventions.

use super::{SynthEngine, note_to_freq};
use crate::dsp::moog_ladder::MoogLadder;
use crate::modules::Frame;
use crate::types::ParameterId;

#[derive(Default)]
pub struct SubtractiveEngine {
    phase_a: f32,
    phase_b: f32,
    freq: f32,
    filter: MoogLadder,
    gate: bool,

    detune: f32,
    osc_mix: f32,
    cutoff: f32,
    resonance: f32,
}

impl SubtractiveEngine {
    #[inline]
    fn saw(phase: f32) -> f32 {
        2.0 * phase - 1.0
    }

    #[inline]
    fn square(phase: f32) -> f32 {
        if phase < 0.5 { 1.0 } else { -1.0 }
    }
}

impl SynthEngine for SubtractiveEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.resonance = (self.resonance + value * 0.01).clamp(0.0, 4.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.detune = value.clamp(0.0, 1.0) * 0.06,
            ParameterId::OscMix => self.osc_mix = value.clamp(0.0, 1.0),
            ParameterId::Timbre | ParameterId::FilterCutoff => {
                self.cutoff = 20.0 + value.clamp(0.0, 1.0) * 18_000.0;
                self.filter.set_cutoff(self.cutoff);
            }
            ParameterId::Morph | ParameterId::FilterResonance => {
                self.resonance = value.clamp(0.0, 4.0);
                self.filter.set_resonance(self.resonance);
            }
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.detune / 0.06),
            ParameterId::OscMix => Some(self.osc_mix),
            ParameterId::Timbre | ParameterId::FilterCutoff => Some(((self.cutoff - 20.0) / 18_000.0).clamp(0.0, 1.0)),
            ParameterId::Morph | ParameterId::FilterResonance => Some((self.resonance / 4.0).clamp(0.0, 1.0)),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(
            param,
            ParameterId::Harmonics
                | ParameterId::OscMix
                | ParameterId::Timbre
                | ParameterId::FilterCutoff
                | ParameterId::Morph
                | ParameterId::FilterResonance
        )
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.freq == 0.0 {
            return;
        }
        let inc_a = self.freq / sample_rate;
        let inc_b = self.freq * (1.0 + self.detune) / sample_rate;

        for frame in output.iter_mut() {
            let a = Self::saw(self.phase_a);
            let b = Self::square(self.phase_b);
            let mixed = a * (1.0 - self.osc_mix) + b * self.osc_mix;
            let filtered = self.filter.process(mixed);

            self.phase_a = (self.phase_a + inc_a).fract();
            self.phase_b = (self.phase_b + inc_b).fract();

            frame.left += filtered;
            frame.right += filtered;
        }
    }

    fn reset(&mut self) {
        self.phase_a = 0.0;
        self.phase_b = 0.0;
        self.filter.reset();
        self.gate = false;
    }
}
