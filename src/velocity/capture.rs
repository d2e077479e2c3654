//! Raw velocity input capture: per-channel calibration, noise/debounce
//! gating, velocity curves, and cross-channel ghost suppression.
//!
//! Channel configuration stays signal-processing only: no ADC/hardware-timing
//! fields, since those belong to an embedded platform this crate doesn't
//! target.

use crate::constants::{CALIBRATION_SAMPLES_REQUIRED, GHOST_SUPPRESSION_WINDOW_US, MAX_VELOCITY_CHANNELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocitySourceType {
    HallEffect,
    Midi,
    Analog,
    Software,
    Composite,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityCurve {
    Linear,
    Exponential,
    Logarithmic,
    Custom,
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    pub source_type: VelocitySourceType,
    pub sensitivity: f32,
    pub noise_floor: f32,
    pub max_velocity: f32,
    pub debounce_us: u64,
    pub curve: Option<VelocityCurve>,
    pub curve_amount: f32,
    pub ghost_suppression: bool,
    pub ghost_threshold: f32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            source_type: VelocitySourceType::HallEffect,
            sensitivity: 1.0,
            noise_floor: 0.02,
            max_velocity: 1.0,
            debounce_us: 1000,
            curve: None,
            curve_amount: 1.0,
            ghost_suppression: false,
            ghost_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VelocityEvent {
    pub channel: u8,
    pub velocity: f32,
    pub timestamp_us: u64,
    pub source_type: VelocitySourceType,
    pub raw_value: f32,
    pub is_ghost: bool,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Calibration {
    samples_seen: u32,
    running_min: f32,
    running_max: f32,
    calibrated: bool,
    optimal_sensitivity: f32,
}

impl Calibration {
    fn reset(&mut self) {
        *self = Self { running_min: f32::MAX, running_max: f32::MIN, ..Default::default() };
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    config: ChannelConfig,
    last_event_us: u64,
    last_high_velocity_us: u64,
    calibration: Calibration,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            config: ChannelConfig::default(),
            last_event_us: 0,
            last_high_velocity_us: 0,
            calibration: Calibration { running_min: f32::MAX, running_max: f32::MIN, ..Default::default() },
        }
    }
}

/// Accepts raw samples from up to [`MAX_VELOCITY_CHANNELS`] input channels
/// and turns them into [`VelocityEvent`]s.
pub struct VelocityCapture {
    channels: [ChannelState; MAX_VELOCITY_CHANNELS],
    global_sensitivity: f32,
}

impl VelocityCapture {
    pub fn new() -> Self {
        Self { channels: [ChannelState::default(); MAX_VELOCITY_CHANNELS], global_sensitivity: 1.0 }
    }

    pub fn set_channel_config(&mut self, channel: usize, config: ChannelConfig) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.config = config;
        }
    }

    pub fn set_global_sensitivity(&mut self, sensitivity: f32) {
        self.global_sensitivity = sensitivity.clamp(0.1, 10.0);
    }

    pub fn begin_calibration(&mut self, channel: usize) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.calibration.reset();
        }
    }

    fn apply_curve(curve: VelocityCurve, amount: f32, value: f32) -> f32 {
        let v = value.clamp(0.0, 1.0);
        match curve {
            VelocityCurve::Linear => v,
            VelocityCurve::Exponential => crate::dsp::oscillators::exp_shape(v, amount) * 0.5 + 0.5,
            VelocityCurve::Logarithmic => crate::dsp::oscillators::log_shape(v, amount) * 0.5 + 0.5,
            VelocityCurve::Custom => v.powf(amount.max(0.01)),
        }
    }

    /// Processes one raw sample from `channel` at `timestamp_us`. Returns
    /// `None` if the sample is discarded (below noise floor, inside the
    /// debounce window, or the channel is disabled).
    pub fn process_raw_sample(
        &mut self,
        channel: usize,
        raw_value: f32,
        timestamp_us: u64,
        other_channel_peak: f32,
    ) -> Option<VelocityEvent> {
        let state = self.channels.get_mut(channel)?;
        if state.config.source_type == VelocitySourceType::Disabled {
            return None;
        }

        if raw_value < state.config.noise_floor {
            return None;
        }
        if timestamp_us.saturating_sub(state.last_event_us) < state.config.debounce_us {
            return None;
        }
        state.last_event_us = timestamp_us;

        let sensitized = (raw_value * state.config.sensitivity * self.global_sensitivity).min(state.config.max_velocity);

        if !state.calibration.calibrated {
            state.calibration.samples_seen += 1;
            state.calibration.running_min = state.calibration.running_min.min(sensitized);
            state.calibration.running_max = state.calibration.running_max.max(sensitized);
            if state.calibration.samples_seen >= CALIBRATION_SAMPLES_REQUIRED {
                state.calibration.calibrated = true;
                let span = (state.calibration.running_max - state.calibration.running_min).max(1e-4);
                state.calibration.optimal_sensitivity = 1.0 / span;
            }
        }

        let processed = match state.config.curve {
            Some(curve) => Self::apply_curve(curve, state.config.curve_amount, sensitized),
            None => sensitized.clamp(0.0, 1.0),
        };

        let is_ghost = state.config.ghost_suppression
            && other_channel_peak > state.config.ghost_threshold
            && timestamp_us.saturating_sub(state.last_high_velocity_us) < GHOST_SUPPRESSION_WINDOW_US;

        if processed > state.config.ghost_threshold {
            state.last_high_velocity_us = timestamp_us;
        }

        let mut confidence = 1.0f32;
        if !state.calibration.calibrated {
            confidence -= 0.3;
        }
        if sensitized < state.config.noise_floor * 2.0 {
            confidence -= 0.2;
        }
        if sensitized > state.config.max_velocity * 0.98 {
            confidence -= 0.1;
        }

        Some(VelocityEvent {
            channel: channel as u8,
            velocity: processed,
            timestamp_us,
            source_type: state.config.source_type,
            raw_value,
            is_ghost,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

impl Default for VelocityCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_noise_floor_is_discarded() {
        let mut capture = VelocityCapture::new();
        capture.set_channel_config(0, ChannelConfig { noise_floor: 0.1, ..Default::default() });
        assert!(capture.process_raw_sample(0, 0.01, 0, 0.0).is_none());
    }

    #[test]
    fn debounce_window_discards_rapid_repeats() {
        let mut capture = VelocityCapture::new();
        capture.set_channel_config(0, ChannelConfig { debounce_us: 2000, ..Default::default() });
        assert!(capture.process_raw_sample(0, 0.5, 0, 0.0).is_some());
        assert!(capture.process_raw_sample(0, 0.5, 500, 0.0).is_none());
        assert!(capture.process_raw_sample(0, 0.5, 3000, 0.0).is_some());
    }

    #[test]
    fn calibration_completes_after_required_samples() {
        let mut capture = VelocityCapture::new();
        capture.set_channel_config(0, ChannelConfig { debounce_us: 0, ..Default::default() });
        for i in 0..CALIBRATION_SAMPLES_REQUIRED {
            capture.process_raw_sample(0, 0.5, i as u64 * 10, 0.0);
        }
        assert!(capture.channels[0].calibration.calibrated);
    }

    #[test]
    fn ghost_suppression_flags_simultaneous_events() {
        let mut capture = VelocityCapture::new();
        capture.set_channel_config(
            1,
            ChannelConfig { ghost_suppression: true, ghost_threshold: 0.2, debounce_us: 0, ..Default::default() },
        );
        capture.process_raw_sample(1, 0.9, 0, 0.95);
        let event = capture.process_raw_sample(1, 0.9, 1000, 0.95).unwrap();
        assert!(event.is_ghost);
    }
}
