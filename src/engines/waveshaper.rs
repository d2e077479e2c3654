//! Waveshaping engine: a sawtooth driven through a `tanh`-family shaper whose
//! drive and asymmetry are the macro controls, followed by a brightness
//! lowpass.

use super::{SynthEngine, note_to_freq};
use crate::dsp::one_pole::OnePole;
use crate::modules::Frame;
use crate::types::ParameterId;

#[derive(Default)]
pub struct WaveshaperEngine {
    phase: f32,
    freq: f32,
    gate: bool,
    tone: OnePole,

    drive: f32,
    asymmetry: f32,
    brightness: f32,
}

impl WaveshaperEngine {
    #[inline]
    fn shape(x: f32, drive: f32, asymmetry: f32) -> f32 {
        let driven = x * (1.0 + drive * 12.0);
        let biased = driven + asymmetry * 0.6;
        biased.tanh()
    }
}

impl SynthEngine for WaveshaperEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.drive = (self.drive + value * 0.05).clamp(0.0, 1.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.drive = value.clamp(0.0, 1.0),
            ParameterId::Timbre => self.asymmetry = value.clamp(-1.0, 1.0),
            ParameterId::Morph | ParameterId::FilterCutoff => {
                self.brightness = 200.0 + value.clamp(0.0, 1.0) * 15_000.0;
            }
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.drive),
            ParameterId::Timbre => Some(self.asymmetry),
            ParameterId::Morph | ParameterId::FilterCutoff => Some(self.brightness),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(
            param,
            ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph | ParameterId::FilterCutoff
        )
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.freq == 0.0 {
            return;
        }
        let inc = self.freq / sample_rate;
        self.tone.set_cutoff(self.brightness.max(20.0), sample_rate);

        for frame in output.iter_mut() {
            let saw = 2.0 * self.phase - 1.0;
            let shaped = Self::shape(saw, self.drive, self.asymmetry);
            let out = self.tone.process_lowpass(shaped);

            self.phase = (self.phase + inc).fract();
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.tone.reset();
        self.gate = false;
    }
}
