//! Noise-particle engine: fires short filtered noise grains at a rate set by
//! `harmonics` (density), each grain shaped by a one-pole whose cutoff is
//! `timbre`-controlled and whose pitch is spread by `morph`.

use super::SynthEngine;
use crate::dsp::one_pole::OnePole;
use crate::dsp::oscillators::SmoothNoiseGenerator;
use crate::modules::Frame;
use crate::types::ParameterId;

const MAX_GRAINS: usize = 8;
const GRAIN_LIFETIME_SAMPLES: u32 = 2400;

#[derive(Clone, Copy, Default)]
struct Grain {
    age: u32,
    filter_state: f32,
}

pub struct ParticlesEngine {
    noise: SmoothNoiseGenerator,
    tone: OnePole,
    grains: [Grain; MAX_GRAINS],
    next_grain: usize,
    trigger_accum: f32,
    gate: bool,

    density: f32,
    brightness: f32,
    pitch_spread: f32,
    rng: u32,
}

impl Default for ParticlesEngine {
    fn default() -> Self {
        Self {
            noise: SmoothNoiseGenerator::new(),
            tone: OnePole::default(),
            grains: [Grain::default(); MAX_GRAINS],
            next_grain: 0,
            trigger_accum: 0.0,
            gate: false,
            density: 20.0,
            brightness: 4000.0,
            pitch_spread: 0.0,
            rng: 0x1234_5678,
        }
    }
}

impl ParticlesEngine {
    fn spawn_grain(&mut self) {
        self.grains[self.next_grain] = Grain { age: 0, filter_state: 0.0 };
        self.next_grain = (self.next_grain + 1) % MAX_GRAINS;
    }

    fn next_rand(&mut self) -> f32 {
        self.rng = self.rng.wrapping_mul(1664525).wrapping_add(1013904223);
        (self.rng >> 8) as f32 / (1u32 << 24) as f32
    }
}

impl SynthEngine for ParticlesEngine {
    fn note_on(&mut self, _note: u8, velocity: f32, _sample_rate: f32) {
        self.gate = true;
        self.density = self.density.max(1.0) * (0.5 + velocity);
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.brightness = (self.brightness + value * 1000.0).clamp(200.0, 18_000.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.density = 1.0 + value.clamp(0.0, 1.0) * 119.0,
            ParameterId::Timbre | ParameterId::FilterCutoff => {
                self.brightness = 200.0 + value.clamp(0.0, 1.0) * 17_800.0;
            }
            ParameterId::Morph => self.pitch_spread = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some((self.density - 1.0) / 119.0),
            ParameterId::Timbre | ParameterId::FilterCutoff => Some((self.brightness - 200.0) / 17_800.0),
            ParameterId::Morph => Some(self.pitch_spread),
            _ => None,
        }
    }

    fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(
            param,
            ParameterId::Harmonics | ParameterId::Timbre | ParameterId::FilterCutoff | ParameterId::Morph
        )
    }

    fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.gate {
            return;
        }
        let grains_per_sample = self.density / sample_rate;

        for frame in output.iter_mut() {
            self.trigger_accum += grains_per_sample;
            if self.trigger_accum >= 1.0 {
                self.trigger_accum -= 1.0;
                self.spawn_grain();
            }

            let raw = self.noise.next_sample();
            let spread_cutoff = self.brightness * (1.0 + (self.next_rand() - 0.5) * self.pitch_spread);
            self.tone.set_cutoff(spread_cutoff.max(20.0), sample_rate);
            let shaped = self.tone.process_lowpass(raw);

            let mut active_gain = 0.0;
            for grain in self.grains.iter_mut() {
                if grain.age < GRAIN_LIFETIME_SAMPLES {
                    let envelope = 1.0 - grain.age as f32 / GRAIN_LIFETIME_SAMPLES as f32;
                    active_gain += envelope;
                    grain.age += 1;
                }
            }

            let out = shaped * (active_gain / MAX_GRAINS as f32).min(1.0);
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.noise.reset();
        self.tone.reset();
        self.grains = [Grain::default(); MAX_GRAINS];
        self.gate = false;
    }
}
