//! Master bus: fixed processing order, spec'd as
//! tilt EQ -> 7-band parametric EQ -> compressor -> lowpass -> reverb ->
//! shimmer -> limiter. No stage is reorderable or skippable; tracks that want
//! less processing turn a stage's parameters down rather than bypass it.

use crate::dsp::{FilterType, StereoBiquadFilter};
use crate::fx::compressor::Compressor;
use crate::fx::eq::ParametricEq;
use crate::fx::reverb::Reverb;
use crate::fx::shimmer::Shimmer;
use crate::fx::tilt::TiltEq;
use crate::modules::Frame;

const LIMITER_CEILING: f32 = 0.99;

/// One-pole lowpass with a low-shelf makeup boost: cutting highs with a
/// gentle 6dB/oct slope also perceptually thins the bass, so the shelf adds
/// back gain below 150Hz proportional to how aggressive the cut is.
struct MasterLowpass {
    filter: StereoBiquadFilter,
    shelf: StereoBiquadFilter,
    cutoff_hz: f32,
    sample_rate: f32,
}

impl MasterLowpass {
    fn new(sample_rate: f32) -> Self {
        let mut lp = Self { filter: StereoBiquadFilter::new(), shelf: StereoBiquadFilter::new(), cutoff_hz: 18_000.0, sample_rate };
        lp.rebuild();
        lp
    }

    fn rebuild(&mut self) {
        self.filter.set_filter(FilterType::LowPass, self.cutoff_hz, 0.707, 0.0, self.sample_rate);
        let cut_amount = (1.0 - self.cutoff_hz / 20_000.0).clamp(0.0, 1.0);
        self.shelf.set_filter(FilterType::LowShelf, 150.0, 0.707, cut_amount * 3.0, self.sample_rate);
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.rebuild();
    }

    fn set_cutoff_hz(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.clamp(200.0, 20_000.0);
        self.rebuild();
    }

    #[inline]
    fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self.filter.process(left, right);
        self.shelf.process(l, r)
    }
}

pub struct MasterChain {
    tilt: TiltEq,
    eq: ParametricEq,
    compressor: Compressor,
    lowpass: MasterLowpass,
    reverb: Reverb,
    shimmer: Shimmer,
    pub reverb_wet: f32,
}

impl MasterChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            tilt: TiltEq::new(sample_rate),
            eq: ParametricEq::new(sample_rate),
            compressor: Compressor::new(sample_rate),
            lowpass: MasterLowpass::new(sample_rate),
            reverb: Reverb::new(sample_rate),
            shimmer: Shimmer::new(),
            reverb_wet: 0.25,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.tilt.set_sample_rate(sample_rate);
        self.eq.set_sample_rate(sample_rate);
        self.compressor.set_sample_rate(sample_rate);
        self.lowpass.set_sample_rate(sample_rate);
        self.reverb.set_sample_rate(sample_rate);
    }

    pub fn tilt_mut(&mut self) -> &mut TiltEq {
        &mut self.tilt
    }

    pub fn eq_mut(&mut self) -> &mut ParametricEq {
        &mut self.eq
    }

    pub fn compressor_mut(&mut self) -> &mut Compressor {
        &mut self.compressor
    }

    pub fn set_lowpass_cutoff_hz(&mut self, cutoff_hz: f32) {
        self.lowpass.set_cutoff_hz(cutoff_hz);
    }

    pub fn set_reverb_wet(&mut self, wet: f32) {
        self.reverb_wet = wet.clamp(0.0, 1.0);
    }

    pub fn process_block(&mut self, buffer: &mut [Frame]) {
        for frame in buffer.iter_mut() {
            let (l, r) = self.tilt.process(frame.left, frame.right);
            let (l, r) = self.eq.process(l, r);
            let (l, r) = self.compressor.process(l, r);
            let (dry_l, dry_r) = self.lowpass.process(l, r);

            let (tail_l, tail_r) = self.reverb.process_tail(dry_l, dry_r);
            let (shimmer_l, shimmer_r) = self.shimmer.process(tail_l, tail_r, self.reverb_wet);

            let wet_l = tail_l + shimmer_l;
            let wet_r = tail_r + shimmer_r;
            let out_l = dry_l * (1.0 - self.reverb_wet) + wet_l * self.reverb_wet;
            let out_r = dry_r * (1.0 - self.reverb_wet) + wet_r * self.reverb_wet;

            frame.left = out_l.clamp(-LIMITER_CEILING, LIMITER_CEILING);
            frame.right = out_r.clamp(-LIMITER_CEILING, LIMITER_CEILING);
        }
    }
}
