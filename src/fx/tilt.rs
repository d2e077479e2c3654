//! Tilt EQ: a single one-pole split at a fixed pivot frequency, with bass and
//! treble shelves gained in opposite directions by one `tilt` knob. Grounded
//! on `dsp::one_pole::OnePole`'s lowpass/highpass split, generalized from mono
//! to the two independent per-channel filters a stereo master bus needs.

use crate::dsp::OnePole;

const PIVOT_HZ: f32 = 1600.0;
const TILT_RANGE: f32 = 0.6;

pub struct TiltEq {
    split_l: OnePole,
    split_r: OnePole,
    tilt: f32,
}

impl TiltEq {
    pub fn new(sample_rate: f32) -> Self {
        let mut split_l = OnePole::new();
        let mut split_r = OnePole::new();
        split_l.set_cutoff(PIVOT_HZ, sample_rate);
        split_r.set_cutoff(PIVOT_HZ, sample_rate);
        Self { split_l, split_r, tilt: 0.5 }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.split_l.set_cutoff(PIVOT_HZ, sample_rate);
        self.split_r.set_cutoff(PIVOT_HZ, sample_rate);
    }

    /// 0.0 = full bass boost / treble cut, 1.0 = the reverse, 0.5 = flat.
    pub fn set_tilt(&mut self, tilt: f32) {
        self.tilt = tilt.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let bass_gain = 1.0 + (0.5 - self.tilt) * TILT_RANGE;
        let treble_gain = 1.0 + (self.tilt - 0.5) * TILT_RANGE;

        let low_l = self.split_l.process_lowpass(left);
        let high_l = left - low_l;
        let low_r = self.split_r.process_lowpass(right);
        let high_r = right - low_r;

        (low_l * bass_gain + high_l * treble_gain, low_r * bass_gain + high_r * treble_gain)
    }
}
