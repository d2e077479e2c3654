//! Drum kit engine: the incoming MIDI note number selects one of a fixed set
//! of synthesized percussion voices (kick/snare/hat/clap) rather than
//! controlling pitch; each has its own short internal amplitude shape
//! independent of the voice's shared ADSR, since real drums decay far faster
//! than a typical envelope's minimum release time.

use super::SynthEngine;
use crate::dsp::biquad::BiquadFilter;
use crate::dsp::oscillators::SmoothNoiseGenerator;
use crate::dsp::tables::table_sin;
use crate::modules::Frame;
use crate::types::ParameterId;

#[derive(Clone, Copy, PartialEq, Eq)]
enum DrumVoice {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
    Clap,
}

fn voice_for_note(note: u8) -> DrumVoice {
    match note % 5 {
        0 => DrumVoice::Kick,
        1 => DrumVoice::Snare,
        2 => DrumVoice::ClosedHat,
        3 => DrumVoice::OpenHat,
        _ => DrumVoice::Clap,
    }
}

pub struct DrumKitEngine {
    voice: DrumVoice,
    age: u32,
    phase: f32,
    pitch_env: f32,
    noise: SmoothNoiseGenerator,
    tone: BiquadFilter,
    gate: bool,

    tuning: f32,
    tone_amount: f32,
    decay_scale: f32,
}

impl Default for DrumKitEngine {
    fn default() -> Self {
        Self {
            voice: DrumVoice::Kick,
            age: 0,
            phase: 0.0,
            pitch_env: 0.0,
            noise: SmoothNoiseGenerator::new(),
            tone: BiquadFilter::new(),
            gate: false,
            tuning: 0.5,
            tone_amount: 0.5,
            decay_scale: 1.0,
        }
    }
}

impl SynthEngine for DrumKitEngine {
    fn note_on(&mut self, note: u8, _velocity: f32, _sample_rate: f32) {
        self.voice = voice_for_note(note);
        self.age = 0;
        self.phase = 0.0;
        self.pitch_env = 1.0;
        self.gate = true;
    }

    fn note_off(&mut self) {
        self.gate = false;
    }

    fn set_aftertouch(&mut self, value: f32) {
        self.tone_amount = (self.tone_amount + value * 0.05).clamp(0.0, 1.0);
    }

    fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Harmonics => self.tuning = value.clamp(0.0, 1.0),
            ParameterId::Timbre => self.tone_amount = value.clamp(0.0, 1.0),
            ParameterId::Morph => self.decay_scale = 0.2 + value.clamp(0.0, 1.0) * 3.0,
            _ => {}
        }
    }

    fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Harmonics => Some(self.tuning),
            ParameterId::Timbre => Some(self.tone_amount),
            ParameterId::Morph => Some((self.decay_scale - 0.2) / 3.0),
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

        let base_decay = match self.voice {
            DrumVoice::Kick => 0.35,
            DrumVoice::Snare => 0.18,
            DrumVoice::ClosedHat => 0.04,
            DrumVoice::OpenHat => 0.25,
            DrumVoice::Clap => 0.12,
        } * self.decay_scale;
        let decay_samples = (base_decay * sample_rate).max(1.0);

        let base_freq = match self.voice {
            DrumVoice::Kick => 40.0 + self.tuning * 80.0,
            DrumVoice::Snare => 160.0 + self.tuning * 120.0,
            DrumVoice::ClosedHat | DrumVoice::OpenHat => 6000.0,
            DrumVoice::Clap => 900.0,
        };

        self.tone.set_highpass((2000.0 + self.tone_amount * 8000.0).min(sample_rate * 0.45), 0.707, sample_rate);

        for frame in output.iter_mut() {
            let env = (-(self.age as f32) / decay_samples).exp();
            if env < 0.0005 {
                self.gate = false;
            }

            let out = match self.voice {
                DrumVoice::Kick => {
                    self.pitch_env *= 0.9995;
                    let freq = base_freq * (1.0 + self.pitch_env * 3.0);
                    self.phase = (self.phase + freq / sample_rate).fract();
                    table_sin(self.phase) * env
                }
                DrumVoice::Snare => {
                    self.phase = (self.phase + base_freq / sample_rate).fract();
                    let tone = table_sin(self.phase) * (1.0 - self.tone_amount);
                    let noise = self.tone.process(self.noise.next_sample()) * self.tone_amount;
                    (tone + noise) * env
                }
                DrumVoice::ClosedHat | DrumVoice::OpenHat => {
                    self.tone.process(self.noise.next_sample()) * env
                }
                DrumVoice::Clap => {
                    let noise = self.tone.process(self.noise.next_sample());
                    let bursty = if (self.age / 200) % 2 == 0 { 1.0 } else { 0.3 };
                    noise * env * bursty
                }
            };

            self.age += 1;
            frame.left += out;
            frame.right += out;
        }
    }

    fn reset(&mut self) {
        self.age = 0;
        self.phase = 0.0;
        self.noise.reset();
        self.tone.reset();
        self.gate = false;
    }
}
