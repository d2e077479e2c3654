//! Schroeder/Moorer-style reverb: four parallel damped comb filters per
//! channel feed two series allpasses. Delay times are spec'd in milliseconds
//! and converted to samples at the live sample rate, so (unlike a plain
//! `dsp::CombFilter<N>`, whose delay is pinned to its buffer length) the
//! actual delay tracks whatever sample rate the engine is running at; the
//! `N`-sized buffers only bound how long a delay can ever get.
//!
//! Built on `dsp::interpolating_delay::InterpolatingDelay` for the
//! variable-length read, combined with the feedback/damping shape from
//! `dsp::comb_filter::CombFilter` and the allpass shape from
//! `dsp::all_pass_filter::AllPassFilter`.

use crate::constants::{
    REVERB_ALLPASS_FEEDBACK, REVERB_ALLPASS_MS, REVERB_COMB_FEEDBACK, REVERB_COMB_MS_L, REVERB_COMB_MS_R,
    REVERB_MAX_ALLPASS_SAMPLES, REVERB_MAX_COMB_SAMPLES,
};
use crate::dsp::{InterpolatingDelay, OnePole};

struct DampedComb {
    delay: InterpolatingDelay<REVERB_MAX_COMB_SAMPLES>,
    damper: OnePole,
    delay_samples: f32,
    feedback: f32,
}

impl DampedComb {
    fn new(delay_ms: f32, feedback: f32, damp_hz: f32, sample_rate: f32) -> Self {
        let mut damper = OnePole::new();
        damper.set_cutoff(damp_hz, sample_rate);
        Self {
            delay: InterpolatingDelay::new(),
            damper,
            delay_samples: delay_ms * 0.001 * sample_rate,
            feedback,
        }
    }

    fn set_sample_rate(&mut self, delay_ms: f32, damp_hz: f32, sample_rate: f32) {
        self.delay_samples = delay_ms * 0.001 * sample_rate;
        self.damper.set_cutoff(damp_hz, sample_rate);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.delay.read_interpolated(self.delay_samples);
        let damped = self.damper.process_lowpass(out);
        self.delay.write(input + damped * self.feedback);
        out
    }
}

struct SeriesAllpass {
    delay: InterpolatingDelay<REVERB_MAX_ALLPASS_SAMPLES>,
    delay_samples: f32,
    feedback: f32,
}

impl SeriesAllpass {
    fn new(delay_ms: f32, feedback: f32, sample_rate: f32) -> Self {
        Self { delay: InterpolatingDelay::new(), delay_samples: delay_ms * 0.001 * sample_rate, feedback }
    }

    fn set_sample_rate(&mut self, delay_ms: f32, sample_rate: f32) {
        self.delay_samples = delay_ms * 0.001 * sample_rate;
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read_interpolated(self.delay_samples);
        let out = -input + delayed;
        self.delay.write(input + delayed * self.feedback);
        out
    }
}

const DAMP_HZ: f32 = 5000.0;

pub struct Reverb {
    combs_l: [DampedComb; 4],
    combs_r: [DampedComb; 4],
    allpass_l: [SeriesAllpass; 2],
    allpass_r: [SeriesAllpass; 2],
    pub wet: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            combs_l: std::array::from_fn(|i| DampedComb::new(REVERB_COMB_MS_L[i], REVERB_COMB_FEEDBACK, DAMP_HZ, sample_rate)),
            combs_r: std::array::from_fn(|i| DampedComb::new(REVERB_COMB_MS_R[i], REVERB_COMB_FEEDBACK, DAMP_HZ, sample_rate)),
            allpass_l: std::array::from_fn(|i| SeriesAllpass::new(REVERB_ALLPASS_MS[i], REVERB_ALLPASS_FEEDBACK, sample_rate)),
            allpass_r: std::array::from_fn(|i| SeriesAllpass::new(REVERB_ALLPASS_MS[i], REVERB_ALLPASS_FEEDBACK, sample_rate)),
            wet: 0.25,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for (i, comb) in self.combs_l.iter_mut().enumerate() {
            comb.set_sample_rate(REVERB_COMB_MS_L[i], DAMP_HZ, sample_rate);
        }
        for (i, comb) in self.combs_r.iter_mut().enumerate() {
            comb.set_sample_rate(REVERB_COMB_MS_R[i], DAMP_HZ, sample_rate);
        }
        for (i, ap) in self.allpass_l.iter_mut().enumerate() {
            ap.set_sample_rate(REVERB_ALLPASS_MS[i], sample_rate);
        }
        for (i, ap) in self.allpass_r.iter_mut().enumerate() {
            ap.set_sample_rate(REVERB_ALLPASS_MS[i], sample_rate);
        }
    }

    /// Returns the reverb's tail only (pre-mix); callers combine with dry and
    /// shimmer themselves per the master bus's wet/dry formula.
    #[inline]
    pub fn process_tail(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut sum_l = 0.0f32;
        for comb in &mut self.combs_l {
            sum_l += comb.process(left);
        }
        sum_l *= 0.25;

        let mut sum_r = 0.0f32;
        for comb in &mut self.combs_r {
            sum_r += comb.process(right);
        }
        sum_r *= 0.25;

        let mut out_l = sum_l;
        for ap in &mut self.allpass_l {
            out_l = ap.process(out_l);
        }
        let mut out_r = sum_r;
        for ap in &mut self.allpass_r {
            out_r = ap.process(out_r);
        }

        (out_l, out_r)
    }
}
