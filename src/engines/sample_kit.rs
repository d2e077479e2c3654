//! Sample-kit engine: plays one of the procedurally generated wavetables
//! (see `build.rs`) back as a one-shot transient, selected by MIDI note.
//! No audio assets ship with the engine, so this and [`super::sample_slicer`]
//! draw from the same build-time-synthesized material the wavetable engine
//! uses rather than fabricating binary sample data.

use super::SynthEngine;
use crate::dsp::wavetables::get_wavetable;
use crate::modules::Frame;
use crate::types::ParameterId;

pub struct SampleKitEngine {
    slot: usize,
    read_pos: f32,
    playback_rate: f32,
    gate: bool,

    start_offset: f32,
    rate_control: f32,
    decay: f32,
    age: u32,
}

impl Default for SampleKitEngine {
    fn default() -> Self {
        Self {
            slot: 0,
            read_pos: 0.0,
            playback_rate: 1.0,
            gate: false,
            start_offset: 0.0,
            rate_control: 1.0,
            decay: 0.5,
            age: 0,
        }
    }
}

impl SynthEngine for SampleKitEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.slot = note as usize;
        self.read_pos = self.start_offset * 600.0;
        self.playback_rate = self.rate_control;
        self.age = 0;
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.playback_rate = (self.playback_rate + value * 0.1).clamp(0.25, 4.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.start_offset = value.clamp(0.0, 1.0),
            ParameterId::Timbre => self.rate_control = 0.25 + value.clamp(0.0, 1.0) * 3.75,
            ParameterId::Morph => self.decay = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.start_offset),
            ParameterId::Timbre => Some((self.rate_control - 0.25) / 3.75),
            ParameterId::Morph => Some(self.decay),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate && self.age == 0 {
            return;
        }
        let table = get_wavetable(self.slot);
        let decay_samples = (0.05 + self.decay * 1.5) * sample_rate;

        for frame in output.iter_mut() {
            let index = self.read_pos as usize % table.len();
            let envelope = (-(self.age as f32) / decay_samples).exp();
            if envelope < 0.0005 {
                self.gate = false;
            }
            let out = table[index] * envelope;

            self.read_pos += self.playback_rate;
            self.age += 1;
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.read_pos = 0.0;
        self.age = 0;
        self.gate = false;
    }
}
