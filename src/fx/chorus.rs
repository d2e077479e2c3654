//! Per-track chorus. Two variants share one struct: `Classic` runs a single
//! LFO-modulated fractional delay per channel (the textbook stereo chorus);
//! `Gentle` crossfades two delay taps with an equal-power, squared-Hann
//! weighting and tames the wet path's top end with a one-pole lowpass, so it
//! reads as thicker rather than wobblier. Which one a track uses is exposed
//! as a runtime toggle rather than decided here.
//!
//! Built on `dsp::interpolating_delay::InterpolatingDelay` for the
//! fractional-sample read/write and `dsp::one_pole::OnePole` for the gentle
//! variant's HF limiter; LFO phase uses `dsp::tables::table_sin`.

use crate::dsp::tables::table_sin;
use crate::dsp::{InterpolatingDelay, OnePole};

const DELAY_BUFFER_SAMPLES: usize = 4096;
const BASE_DELAY_MS: f32 = 18.0;
const DEPTH_MS: f32 = 7.0;
const GENTLE_HF_LIMIT_HZ: f32 = 8000.0;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ChorusVariant {
    Classic,
    Gentle,
}

pub struct Chorus {
    variant: ChorusVariant,
    delay_l: InterpolatingDelay<DELAY_BUFFER_SAMPLES>,
    delay_r: InterpolatingDelay<DELAY_BUFFER_SAMPLES>,
    phase_l: f32,
    phase_r: f32,
    rate_hz: f32,
    depth_ms: f32,
    mix: f32,
    hf_limit_l: OnePole,
    hf_limit_r: OnePole,
    sample_rate: f32,
}

impl Chorus {
    pub fn new(sample_rate: f32) -> Self {
        let mut hf_limit_l = OnePole::new();
        let mut hf_limit_r = OnePole::new();
        hf_limit_l.set_cutoff(GENTLE_HF_LIMIT_HZ, sample_rate);
        hf_limit_r.set_cutoff(GENTLE_HF_LIMIT_HZ, sample_rate);
        Self {
            variant: ChorusVariant::Classic,
            delay_l: InterpolatingDelay::new(),
            delay_r: InterpolatingDelay::new(),
            phase_l: 0.0,
            phase_r: 0.25, // quarter-cycle offset between channels for stereo width
            rate_hz: 0.35,
            depth_ms: DEPTH_MS,
            mix: 0.5,
            hf_limit_l,
            hf_limit_r,
            sample_rate,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.hf_limit_l.set_cutoff(GENTLE_HF_LIMIT_HZ, sample_rate);
        self.hf_limit_r.set_cutoff(GENTLE_HF_LIMIT_HZ, sample_rate);
    }

    pub fn set_variant(&mut self, variant: ChorusVariant) {
        self.variant = variant;
    }

    pub fn set_rate_hz(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.max(0.01);
    }

    pub fn set_depth_ms(&mut self, depth_ms: f32) {
        self.depth_ms = depth_ms.max(0.0);
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn advance_phase(&mut self) {
        let inc = self.rate_hz / self.sample_rate;
        self.phase_l = (self.phase_l + inc).fract();
        self.phase_r = (self.phase_r + inc).fract();
    }

    #[inline]
    fn classic_tap(delay: &mut InterpolatingDelay<DELAY_BUFFER_SAMPLES>, input: f32, phase: f32, base_samples: f32, depth_samples: f32) -> f32 {
        let lfo = table_sin(phase);
        let delay_samples = base_samples + lfo * depth_samples;
        let wet = delay.read_interpolated(delay_samples);
        delay.write(input);
        wet
    }

    #[inline]
    fn gentle_tap(
        delay: &mut InterpolatingDelay<DELAY_BUFFER_SAMPLES>,
        hf_limit: &mut OnePole,
        input: f32,
        phase: f32,
        base_samples: f32,
        depth_samples: f32,
    ) -> f32 {
        // Two taps a half-cycle apart, crossfaded with an equal-power
        // (squared-Hann) window so the seam between them is inaudible.
        let window_a = (std::f32::consts::PI * phase).sin().powi(2);
        let window_b = 1.0 - window_a;
        let phase_b = (phase + 0.5).fract();

        let lfo_a = table_sin(phase);
        let lfo_b = table_sin(phase_b);
        let tap_a = delay.read_interpolated(base_samples + lfo_a * depth_samples);
        let tap_b = delay.read_interpolated(base_samples + lfo_b * depth_samples);
        delay.write(input);

        let wet = tap_a * window_a + tap_b * window_b;
        hf_limit.process_lowpass(wet)
    }

    /// Processes one stereo frame in place.
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let base_samples = BASE_DELAY_MS * 0.001 * self.sample_rate;
        let depth_samples = self.depth_ms * 0.001 * self.sample_rate;

        let (wet_l, wet_r) = match self.variant {
            ChorusVariant::Classic => (
                Self::classic_tap(&mut self.delay_l, left, self.phase_l, base_samples, depth_samples),
                Self::classic_tap(&mut self.delay_r, right, self.phase_r, base_samples, depth_samples),
            ),
            ChorusVariant::Gentle => (
                Self::gentle_tap(&mut self.delay_l, &mut self.hf_limit_l, left, self.phase_l, base_samples, depth_samples),
                Self::gentle_tap(&mut self.delay_r, &mut self.hf_limit_r, right, self.phase_r, base_samples, depth_samples),
            ),
        };
        self.advance_phase();

        (left * (1.0 - self.mix) + wet_l * self.mix, right * (1.0 - self.mix) + wet_r * self.mix)
    }
}
