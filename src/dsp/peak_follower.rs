//! Attack/release envelope follower: `level += (|x| - level) * rate_per_sample`,
//! using the attack rate while rising and the release rate while falling.
//! Used by the compressor, the voice manager's deactivation check, and as a
//! modulation-fabric audio-derived source.

#[derive(Clone, Copy, Debug)]
pub struct PeakFollower {
    level: f32,
    attack_rate: f32,
    release_rate: f32,
}

impl Default for PeakFollower {
    fn default() -> Self {
        Self::new(0.001, 0.1, 48000.0)
    }
}

impl PeakFollower {
    pub fn new(attack_secs: f32, release_secs: f32, sample_rate: f32) -> Self {
        let mut f = Self {
            level: 0.0,
            attack_rate: 0.0,
            release_rate: 0.0,
        };
        f.set_times(attack_secs, release_secs, sample_rate);
        f
    }

    pub fn set_times(&mut self, attack_secs: f32, release_secs: f32, sample_rate: f32) {
        self.attack_rate = Self::rate_from_time(attack_secs, sample_rate);
        self.release_rate = Self::rate_from_time(release_secs, sample_rate);
    }

    fn rate_from_time(time_secs: f32, sample_rate: f32) -> f32 {
        let n = (time_secs.max(0.0001) * sample_rate).max(1.0);
        1.0 - (-1.0 / n).exp()
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let rectified = input.abs();
        let rate = if rectified > self.level {
            self.attack_rate
        } else {
            self.release_rate
        };
        self.level += (rectified - self.level) * rate;
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}
