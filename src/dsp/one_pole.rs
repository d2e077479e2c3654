//! One-pole low/high-pass: `y += alpha * (x - y)`, alpha derived from the
//! cutoff's time constant. Used for the tilt EQ split, the master lowpass,
//! and anywhere a cheap single-pole slope is enough.

#[derive(Clone, Copy, Debug, Default)]
pub struct OnePole {
    state: f32,
    alpha: f32,
}

impl OnePole {
    pub fn new() -> Self {
        Self { state: 0.0, alpha: 1.0 }
    }

    pub fn set_cutoff(&mut self, fc: f32, sample_rate: f32) {
        let dt = 1.0 / sample_rate;
        self.alpha = dt / ((1.0 / (2.0 * std::f32::consts::PI * fc.max(1.0))) + dt);
    }

    #[inline]
    pub fn process_lowpass(&mut self, input: f32) -> f32 {
        self.state += self.alpha * (input - self.state);
        self.state
    }

    #[inline]
    pub fn process_highpass(&mut self, input: f32) -> f32 {
        input - self.process_lowpass(input)
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowpass_tracks_dc() {
        let mut f = OnePole::new();
        f.set_cutoff(200.0, 48000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = f.process_lowpass(1.0);
        }
        assert!((out - 1.0).abs() < 1e-3);
    }
}
