//! 7-band parametric EQ with per-band solo and an auto-gain pass that samples
//! the cascade's combined response at fixed frequencies and compensates so
//! solo/boost moves don't blow out the overall level.
//!
//! Built on `dsp::biquad::StereoBiquadFilter`'s cascade with coefficients
//! recomputed on parameter change, plus its `response_db` helper for the
//! auto-gain pass.

use crate::constants::{EQ_AUTO_GAIN_SAMPLE_COUNT, EQ_BAND_COUNT};
use crate::dsp::{FilterType, StereoBiquadFilter};

const AUTO_GAIN_SAMPLE_HZ: [f32; EQ_AUTO_GAIN_SAMPLE_COUNT] =
    [31.5, 63.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0];

#[derive(Clone, Copy)]
pub struct BandConfig {
    pub freq_hz: f32,
    pub gain_db: f32,
    pub q: f32,
    pub filter_type: FilterType,
    pub enabled: bool,
    pub solo: bool,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self { freq_hz: 1000.0, gain_db: 0.0, q: 0.707, filter_type: FilterType::Peak, enabled: true, solo: false }
    }
}

pub struct ParametricEq {
    configs: [BandConfig; EQ_BAND_COUNT],
    filters: [StereoBiquadFilter; EQ_BAND_COUNT],
    sample_rate: f32,
    auto_gain_linear: f32,
    auto_gain_enabled: bool,
}

const DEFAULT_FREQS: [f32; EQ_BAND_COUNT] = [60.0, 150.0, 400.0, 1000.0, 2500.0, 6000.0, 12000.0];

impl ParametricEq {
    pub fn new(sample_rate: f32) -> Self {
        let mut configs = [BandConfig::default(); EQ_BAND_COUNT];
        for (i, cfg) in configs.iter_mut().enumerate() {
            cfg.freq_hz = DEFAULT_FREQS[i];
        }
        let mut eq = Self {
            configs,
            filters: std::array::from_fn(|_| StereoBiquadFilter::new()),
            sample_rate,
            auto_gain_linear: 1.0,
            auto_gain_enabled: true,
        };
        eq.rebuild_all();
        eq
    }

    /// Toggles the auto-gain makeup pass. Off entirely disables the
    /// `-0.5 * mean_gain_db` compensation in [`Self::process`], independent
    /// of whether any band is enabled or soloed.
    pub fn set_auto_gain_enabled(&mut self, enabled: bool) {
        self.auto_gain_enabled = enabled;
    }

    pub fn auto_gain_enabled(&self) -> bool {
        self.auto_gain_enabled
    }

    pub fn set_band(&mut self, band: usize, config: BandConfig) {
        if band >= EQ_BAND_COUNT {
            return;
        }
        self.configs[band] = config;
        self.rebuild_band(band);
        self.recompute_auto_gain();
    }

    pub fn band(&self, band: usize) -> Option<BandConfig> {
        self.configs.get(band).copied()
    }

    fn rebuild_band(&mut self, band: usize) {
        let cfg = self.configs[band];
        let any_solo = self.configs.iter().any(|c| c.solo);
        let bypassed = !cfg.enabled || (any_solo && !cfg.solo);
        if bypassed {
            self.filters[band].set_bypass();
        } else {
            self.filters[band].set_filter(cfg.filter_type, cfg.freq_hz, cfg.q, cfg.gain_db, self.sample_rate);
        }
    }

    fn rebuild_all(&mut self) {
        for band in 0..EQ_BAND_COUNT {
            self.rebuild_band(band);
        }
        self.recompute_auto_gain();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.rebuild_all();
    }

    /// Samples the cascade's magnitude response (summed in dB across bands,
    /// since series biquads multiply in linear magnitude) at ten fixed
    /// frequencies, averages it, and applies `-0.5 * mean_gain_db` of makeup
    /// gain so a broad boost doesn't shift the overall loudness as much.
    fn recompute_auto_gain(&mut self) {
        let mut sum_db = 0.0f32;
        for &hz in &AUTO_GAIN_SAMPLE_HZ {
            let mut band_db = 0.0f32;
            for (band, cfg) in self.configs.iter().enumerate() {
                let any_solo = self.configs.iter().any(|c| c.solo);
                let bypassed = !cfg.enabled || (any_solo && !cfg.solo);
                if bypassed {
                    continue;
                }
                band_db += self.filters[band].response_db(hz, self.sample_rate);
            }
            sum_db += band_db;
        }
        let mean_db = sum_db / EQ_AUTO_GAIN_SAMPLE_COUNT as f32;
        self.auto_gain_linear = 10f32.powf((-0.5 * mean_db) / 20.0);
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut l, mut r) = (left, right);
        for filter in &mut self.filters {
            let (nl, nr) = filter.process(l, r);
            l = nl;
            r = nr;
        }
        let gain = if self.auto_gain_enabled { self.auto_gain_linear } else { 1.0 };
        (l * gain, r * gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bands_disabled_and_auto_gain_off_is_pass_through() {
        let mut eq = ParametricEq::new(48000.0);
        eq.set_auto_gain_enabled(false);
        for band in 0..EQ_BAND_COUNT {
            let mut cfg = eq.band(band).unwrap();
            cfg.enabled = false;
            eq.set_band(band, cfg);
        }
        for i in 0..256 {
            let input = ((i as f32) * 0.017).sin();
            let (l, r) = eq.process(input, input);
            assert!((l - input).abs() < 1e-6);
            assert!((r - input).abs() < 1e-6);
        }
    }
}
