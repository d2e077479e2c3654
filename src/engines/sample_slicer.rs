//! Slicer engine: divides one procedurally generated wavetable into up to 16
//! slices; the note number picks the slice, `timbre` sets playback rate
//! (including reverse via negative rates), `morph` sets the number of active
//! slices (coarser slicing sounds more "stuttered").

use super::SynthEngine;
use crate::dsp::wavetables::get_wavetable;
use crate::modules::Frame;
use crate::types::ParameterId;

const MAX_SLICES: usize = 16;

pub struct SampleSlicerEngine {
    table_index: usize,
    slice_count: usize,
    slice: usize,
    read_pos: f32,
    rate: f32,
    gate: bool,

    source_select: f32,
    rate_control: f32,
}

impl Default for SampleSlicerEngine {
    fn default() -> Self {
        Self {
            table_index: 0,
            slice_count: 8,
            slice: 0,
            read_pos: 0.0,
            rate: 1.0,
            gate: false,
            source_select: 0.0,
            rate_control: 0.5,
        }
    }
}

impl SampleSlicerEngine {
    fn slice_bounds(&self) -> (usize, usize) {
        let table = get_wavetable(self.table_index);
        let slice_len = table.len() / self.slice_count.max(1);
        let start = (self.slice % self.slice_count.max(1)) * slice_len;
        (start, slice_len.max(1))
    }
}

impl SynthEngine for SampleSlicerEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.slice = note as usize;
        self.read_pos = 0.0;
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.rate = (self.rate + value * 0.2).clamp(-4.0, 4.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => {
                self.table_index = (value.clamp(0.0, 1.0) * 7.0) as usize;
            }
            ParameterId::Timbre => {
                self.rate_control = value.clamp(0.0, 1.0);
                self.rate = (value - 0.5) * 8.0;
                if self.rate.abs() < 0.1 {
                    self.rate = self.rate.signum() * 0.1;
                }
            }
            ParameterId::Morph => {
                self.slice_count = 1 + (value.clamp(0.0, 1.0) * (MAX_SLICES - 1) as f32) as usize;
            }
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.table_index as f32 / 7.0),
            ParameterId::Timbre => Some(self.rate_control),
            ParameterId::Morph => Some((self.slice_count - 1) as f32 / (MAX_SLICES - 1) as f32),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(param, ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph)
    }

    fn process(&mut self, output: &mut [Frame], _sample_rate: f32) {
        if !self.gate {
            return;
        }
        let table = get_wavetable(self.table_index);
        let (start, len) = self.slice_bounds();

        for frame in output.iter_mut() {
            if self.read_pos < 0.0 || self.read_pos >= len as f32 {
                self.gate = false;
                break;
            }
            let index = start + self.read_pos as usize;
            let out = table[index % table.len()];

            self.read_pos += self.rate;
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.read_pos = 0.0;
        self.gate = false;
    }
}
