//! Feed-forward bus compressor: a [`crate::dsp::PeakFollower`] tracks the
//! signal envelope, gain reduction is derived once the envelope crosses
//! `threshold_db`, and a fixed makeup trim compensates.

use crate::dsp::PeakFollower;

pub struct Compressor {
    follower: PeakFollower,
    threshold_db: f32,
    ratio: f32,
    makeup_db: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            follower: PeakFollower::new(0.005, 0.15, sample_rate),
            threshold_db: -18.0,
            ratio: 4.0,
            makeup_db: 6.0,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.follower.set_times(0.005, 0.15, sample_rate);
    }

    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db;
    }

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = ratio.max(1.0);
    }

    pub fn set_makeup_db(&mut self, makeup_db: f32) {
        self.makeup_db = makeup_db;
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let level = self.follower.process(left.abs().max(right.abs()));
        let level_db = 20.0 * level.max(1e-9).log10();

        let gain_reduction_db = if level_db > self.threshold_db {
            (level_db - self.threshold_db) * (1.0 - 1.0 / self.ratio)
        } else {
            0.0
        };

        let gain = 10f32.powf((self.makeup_db - gain_reduction_db) / 20.0);
        (left * gain, right * gain)
    }
}
