//! Wavetable engine: scans across the procedurally generated wavetable bank
//! (see `build.rs`) and blends in a sub-oscillator an octave down.

use super::{SynthEngine, note_to_freq};
use crate::dsp::tables::table_sin;
use crate::dsp::wavetables::WavetableOscillator;
use crate::modules::Frame;
use crate::types::ParameterId;

pub struct WavetableEngine {
    osc: WavetableOscillator,
    sub_phase: f32,
    freq: f32,
    gate: bool,
    table_index: f32,
    sub_level: f32,
    morph: f32,
}

impl Default for WavetableEngine {
    fn default() -> Self {
        Self {
            osc: WavetableOscillator::new(),
            sub_phase: 0.0,
            freq: 0.0,
            gate: false,
            table_index: 0.0,
            sub_level: 0.0,
            morph: 0.0,
        }
    }
}

impl SynthEngine for WavetableEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.freq = note_to_freq(note);
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.osc.set_wavetable_index(self.table_index + value * 2.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.table_index = value.clamp(0.0, 1.0) * 7.0;
                self.osc.set_wavetable_index(self.table_index);
            }
            ParameterId::SubLevel => self.sub_level = value.clamp(0.0, 1.0),
            ParameterId::Morph | ParameterId::Timbre => self.morph = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.table_index / 7.0),
            ParameterId::SubLevel => Some(self.sub_level),
            ParameterId::Morph | ParameterId::Timbre => Some(self.morph),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(
            param,
            ParameterId::Harmonics | ParameterId::SubLevel | ParameterId::Morph | ParameterId::Timbre
        )
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.freq == 0.0 {
            return;
        }
        self.osc.set_frequency(self.freq * (1.0 + self.morph * 0.01), sample_rate);
        let sub_inc = self.freq * 0.5 / sample_rate;

        for frame in output.iter_mut() {
            let main = self.osc.next_sample();
            let sub = table_sin(self.sub_phase) * self.sub_level;
            self.sub_phase = (self.sub_phase + sub_inc).fract();

            let out = main * (1.0 - self.sub_level * 0.5) + sub;
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.osc.reset_phase();
        self.sub_phase = 0.0;
        self.gate = false;
    }
}
