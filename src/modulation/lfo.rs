//! The modulation fabric's LFO model: richer than a bare oscillator because
//! it also tempo-syncs, takes FM/AM from other sources, and can switch into
//! an envelope sub-mode that ignores the waveform entirely.
//!
//! Waveform generation itself is delegated to
//! [`crate::dsp::oscillators::BandLimitedOscillator`] rather than
//! reimplemented here.

use crate::dsp::adsr::{Envelope, EnvelopeParams, EnvelopeState};
use crate::dsp::oscillators::{BandLimitedOscillator, Waveform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    FreeRunning,
    TempoSync,
    KeySync,
    OneShot,
    Envelope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDivision {
    FourBars,
    TwoBars,
    OneBar,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl ClockDivision {
    /// Multiplier against the quarter-note rate `tempo_bpm / 60`.
    pub fn multiplier(self) -> f32 {
        match self {
            ClockDivision::FourBars => 1.0 / 16.0,
            ClockDivision::TwoBars => 1.0 / 8.0,
            ClockDivision::OneBar => 1.0 / 4.0,
            ClockDivision::Half => 1.0 / 2.0,
            ClockDivision::Quarter => 1.0,
            ClockDivision::Eighth => 2.0,
            ClockDivision::Sixteenth => 4.0,
            ClockDivision::ThirtySecond => 8.0,
        }
    }
}

pub struct Lfo {
    pub waveform: Waveform,
    pub sync_mode: SyncMode,
    pub clock_division: ClockDivision,
    pub rate_hz: f32,
    pub depth: f32,
    pub offset: f32,
    pub bipolar: bool,
    pub invert: bool,
    pub pulse_width: f32,
    pub smooth: f32,
    pub fm_amount: f32,
    pub am_amount: f32,
    pub envelope_params: EnvelopeParams,
    pub phase_random: f32,
    pub rate_random: f32,
    pub enabled: bool,
    pub retrigger: bool,

    osc: BandLimitedOscillator,
    envelope_state: EnvelopeState,
    smoothed_value: f32,
    current_value: f32,
    rng_state: u64,
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            waveform: Waveform::Sine,
            sync_mode: SyncMode::FreeRunning,
            clock_division: ClockDivision::Quarter,
            rate_hz: 1.0,
            depth: 1.0,
            offset: 0.0,
            bipolar: true,
            invert: false,
            pulse_width: 0.5,
            smooth: 0.0,
            fm_amount: 0.0,
            am_amount: 0.0,
            envelope_params: EnvelopeParams::default(),
            phase_random: 0.0,
            rate_random: 0.0,
            enabled: true,
            retrigger: true,
            osc: BandLimitedOscillator::new(Waveform::Sine),
            envelope_state: EnvelopeState::default(),
            smoothed_value: 0.0,
            current_value: 0.0,
            rng_state: 0x853C49E6748FEA9B,
        }
    }

    fn next_random_unit(&mut self) -> f32 {
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545F4914F6CDD1D);
        (((bits >> 40) as f32) / ((1u64 << 24) as f32)) * 2.0 - 1.0
    }

    /// `note_on`/retrigger: restarts phase (if `retrigger`) and the envelope
    /// sub-mode's ADSR.
    pub fn trigger(&mut self) {
        if self.retrigger {
            self.osc.reset_phase();
        }
        self.envelope_state.trigger();
    }

    pub fn release(&mut self) {
        self.envelope_state.release();
    }

    fn effective_rate_hz(&mut self, tempo_bpm: f32) -> f32 {
        let base = match self.sync_mode {
            SyncMode::TempoSync => (tempo_bpm / 60.0) * self.clock_division.multiplier(),
            _ => self.rate_hz,
        };
        if self.rate_random > 0.0 {
            base * (1.0 + self.next_random_unit() * self.rate_random * 0.5)
        } else {
            base
        }
    }

    /// Advances the LFO by one tick of the modulation fabric's update rate,
    /// taking external FM/AM inputs in `[-1, 1]`, and returns the new output
    /// value (already depth/offset/polarity shaped).
    pub fn process(&mut self, update_rate_hz: f32, tempo_bpm: f32, fm_in: f32, am_in: f32) -> f32 {
        if !self.enabled {
            return 0.0;
        }

        if self.sync_mode == SyncMode::Envelope {
            let dt = 1.0 / update_rate_hz;
            let level = Envelope::get_amplitude(&self.envelope_params, &mut self.envelope_state, dt);
            self.current_value = if self.invert { -level } else { level };
        } else {
            let rate = self.effective_rate_hz(tempo_bpm);
            let fm_shift = rate * self.fm_amount * fm_in;
            self.osc.waveform = self.waveform;
            self.osc.set_pulse_width(self.pulse_width);
            self.osc.set_frequency((rate + fm_shift).max(0.0), update_rate_hz);

            let mut raw = self.osc.next_sample();
            if !self.bipolar {
                raw = (raw + 1.0) * 0.5;
            }
            if self.invert {
                raw = -raw;
            }
            let am_gain = 1.0 + self.am_amount * am_in;
            raw *= am_gain.max(0.0);

            self.current_value = raw * self.depth + self.offset;
        }

        if self.smooth > 0.0 {
            let coeff = (-1.0 / (self.smooth * update_rate_hz).max(1.0)).exp();
            self.smoothed_value = self.smoothed_value * coeff + self.current_value * (1.0 - coeff);
            self.smoothed_value
        } else {
            self.smoothed_value = self.current_value;
            self.current_value
        }
    }

    pub fn current_value(&self) -> f32 {
        self.smoothed_value
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_lfo_outputs_zero() {
        let mut lfo = Lfo::new();
        lfo.enabled = false;
        assert_eq!(lfo.process(1000.0, 120.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn unipolar_sine_stays_nonnegative() {
        let mut lfo = Lfo::new();
        lfo.bipolar = false;
        lfo.rate_hz = 3.0;
        for _ in 0..500 {
            let v = lfo.process(1000.0, 120.0, 0.0, 0.0);
            assert!(v >= -1e-5);
        }
    }

    #[test]
    fn envelope_submode_ramps_up_on_trigger_then_releases() {
        let mut lfo = Lfo::new();
        lfo.sync_mode = SyncMode::Envelope;
        lfo.envelope_params.attack = 0.01;
        lfo.envelope_params.release = 0.01;
        lfo.trigger();
        let mut peak = 0.0f32;
        for _ in 0..50 {
            peak = peak.max(lfo.process(1000.0, 120.0, 0.0, 0.0));
        }
        assert!(peak > 0.3);

        lfo.release();
        for _ in 0..200 {
            lfo.process(1000.0, 120.0, 0.0, 0.0);
        }
        assert!(lfo.current_value().abs() < 0.05);
    }
}
