//! Velocity latch/hold state machines: momentary, toggle, timed-hold,
//! sustain-pedal and velocity-threshold triggering, with configurable
//! release shapes and mutually-exclusive latch groups.
//!
//! Per-channel trigger/active-time counters are tracked alongside the state
//! machines themselves as a diagnostics surface.

use crate::constants::{MAX_LATCH_CHANNELS, MAX_LATCH_TIME_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchMode {
    Off,
    Momentary,
    Toggle,
    TimedHold,
    SustainPedal,
    VelocityThreshold,
    PatternSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    Instant,
    Linear,
    Exponential,
    Logarithmic,
    CustomEnvelope,
    PatternQuantized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    VelocityInput,
    HardwareButton,
    MidiNote,
    PatternStep,
    ExternalGate,
    SoftwareTrigger,
}

#[derive(Debug, Clone, Copy)]
pub struct ChannelLatchConfig {
    pub mode: LatchMode,
    pub release_mode: ReleaseMode,
    pub trigger_source: TriggerSource,
    pub hold_time_ms: f32,
    pub release_time_ms: f32,
    pub attack_time_ms: f32,
    pub debounce_time_ms: f32,
    pub velocity_threshold: f32,
    pub sustain_level: f32,
    pub release_velocity: f32,
    pub maintain_original_velocity: bool,
    pub enable_retrigger: bool,
    pub max_retrigger_count: u32,
    pub latch_group: Option<u8>,
    pub mute_on_group_trigger: bool,
    pub inherit_group_velocity: bool,
}

impl Default for ChannelLatchConfig {
    fn default() -> Self {
        Self {
            mode: LatchMode::Off,
            release_mode: ReleaseMode::Instant,
            trigger_source: TriggerSource::VelocityInput,
            hold_time_ms: 1000.0,
            release_time_ms: 500.0,
            attack_time_ms: 50.0,
            debounce_time_ms: 20.0,
            velocity_threshold: 0.1,
            sustain_level: 1.0,
            release_velocity: 0.0,
            maintain_original_velocity: false,
            enable_retrigger: false,
            max_retrigger_count: 0,
            latch_group: None,
            mute_on_group_trigger: true,
            inherit_group_velocity: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    config: ChannelLatchConfig,
    is_latched: bool,
    is_triggered: bool,
    is_releasing: bool,
    is_attacking: bool,
    current_velocity: f32,
    target_velocity: f32,
    original_velocity: f32,
    envelope_phase_ms: f32,
    latch_elapsed_ms: f32,
    retrigger_count: u32,
    last_trigger_ms: f32,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            config: ChannelLatchConfig::default(),
            is_latched: false,
            is_triggered: false,
            is_releasing: false,
            is_attacking: false,
            current_velocity: 0.0,
            target_velocity: 0.0,
            original_velocity: 0.0,
            envelope_phase_ms: 0.0,
            latch_elapsed_ms: 0.0,
            retrigger_count: 0,
            last_trigger_ms: f32::NEG_INFINITY,
        }
    }
}

/// Per-channel latch/hold state machine plus the latch-group arbitration
/// the original source calls "emergency stop" and "group exclusivity".
pub struct VelocityLatch {
    channels: [ChannelState; MAX_LATCH_CHANNELS],
    channel_latch_counts: [u32; MAX_LATCH_CHANNELS],
    channel_active_times_ms: [f32; MAX_LATCH_CHANNELS],
}

impl VelocityLatch {
    pub fn new() -> Self {
        Self {
            channels: [ChannelState::default(); MAX_LATCH_CHANNELS],
            channel_latch_counts: [0; MAX_LATCH_CHANNELS],
            channel_active_times_ms: [0.0; MAX_LATCH_CHANNELS],
        }
    }

    pub fn set_channel_config(&mut self, channel: usize, config: ChannelLatchConfig) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.config = config;
        }
    }

    pub fn latch_count(&self, channel: usize) -> u32 {
        self.channel_latch_counts.get(channel).copied().unwrap_or(0)
    }

    pub fn active_time_ms(&self, channel: usize) -> f32 {
        self.channel_active_times_ms.get(channel).copied().unwrap_or(0.0)
    }

    /// Triggers `channel` with `velocity` (`[0, 1]`), handling group
    /// exclusivity (muting other members of the same `latch_group` first).
    pub fn trigger(&mut self, channel: usize, velocity: f32, now_ms: f32) {
        let group = match self.channels.get(channel) {
            Some(state) => state.config.latch_group,
            None => return,
        };
        if let Some(group) = group {
            for other in 0..self.channels.len() {
                if other == channel {
                    continue;
                }
                let in_group = self.channels[other].config.latch_group == Some(group);
                if in_group && self.channels[other].config.mute_on_group_trigger {
                    self.release_channel(other, now_ms);
                }
            }
        }

        let inherited_velocity = if let Some(group) = group {
            self.channels
                .iter()
                .find(|c| c.config.latch_group == Some(group) && c.is_latched && c.config.inherit_group_velocity)
                .map(|c| c.original_velocity)
        } else {
            None
        };

        let Some(state) = self.channels.get_mut(channel) else { return };
        let v = inherited_velocity.unwrap_or(velocity).clamp(0.0, 1.0);

        if state.is_triggered && state.config.enable_retrigger {
            if state.config.max_retrigger_count == 0 || state.retrigger_count < state.config.max_retrigger_count {
                state.retrigger_count += 1;
            }
        } else {
            state.retrigger_count = 0;
        }

        match state.config.mode {
            LatchMode::Off => {
                state.is_latched = false;
                state.is_triggered = true;
                state.target_velocity = v;
                state.is_attacking = true;
                state.is_releasing = false;
            }
            LatchMode::Momentary | LatchMode::SustainPedal => {
                state.is_triggered = true;
                state.is_latched = false;
                state.target_velocity = v;
                state.is_attacking = true;
                state.is_releasing = false;
            }
            LatchMode::Toggle => {
                if state.is_latched {
                    state.is_latched = false;
                    state.is_triggered = false;
                    state.is_releasing = true;
                    state.is_attacking = false;
                } else {
                    state.is_latched = true;
                    state.is_triggered = true;
                    state.target_velocity = v;
                    state.is_attacking = true;
                    state.is_releasing = false;
                    self.channel_latch_counts[channel] += 1;
                }
            }
            LatchMode::TimedHold | LatchMode::PatternSync => {
                state.is_latched = true;
                state.is_triggered = true;
                state.target_velocity = v;
                state.latch_elapsed_ms = 0.0;
                state.is_attacking = true;
                state.is_releasing = false;
                self.channel_latch_counts[channel] += 1;
            }
            LatchMode::VelocityThreshold => {
                if v >= state.config.velocity_threshold {
                    state.is_latched = true;
                    state.is_triggered = true;
                    state.target_velocity = v;
                    state.is_attacking = true;
                    state.is_releasing = false;
                    self.channel_latch_counts[channel] += 1;
                }
            }
        }

        state.original_velocity = v;
        state.envelope_phase_ms = 0.0;
        state.last_trigger_ms = now_ms;
    }

    /// `note_off`/gate-released equivalent: momentary and sustain-pedal
    /// modes begin release immediately, latching modes ignore it.
    pub fn release(&mut self, channel: usize, now_ms: f32) {
        let Some(state) = self.channels.get_mut(channel) else { return };
        match state.config.mode {
            LatchMode::Momentary | LatchMode::SustainPedal | LatchMode::Off => {
                self.release_channel(channel, now_ms);
            }
            _ => {}
        }
    }

    fn release_channel(&mut self, channel: usize, _now_ms: f32) {
        if let Some(state) = self.channels.get_mut(channel) {
            state.is_latched = false;
            state.is_triggered = false;
            state.is_releasing = true;
            state.is_attacking = false;
            state.target_velocity = state.config.release_velocity;
            state.envelope_phase_ms = 0.0;
        }
    }

    pub fn emergency_stop(&mut self) {
        for state in &mut self.channels {
            state.is_latched = false;
            state.is_triggered = false;
            state.is_releasing = false;
            state.is_attacking = false;
            state.current_velocity = 0.0;
            state.target_velocity = 0.0;
        }
    }

    /// Advances every channel's envelope/timeout state by `dt_ms` and
    /// returns the current per-channel output velocities.
    pub fn update(&mut self, dt_ms: f32) -> [f32; MAX_LATCH_CHANNELS] {
        let mut out = [0.0f32; MAX_LATCH_CHANNELS];
        for (i, state) in self.channels.iter_mut().enumerate() {
            if state.is_latched && matches!(state.config.mode, LatchMode::TimedHold) {
                state.latch_elapsed_ms += dt_ms;
                if state.latch_elapsed_ms >= state.config.hold_time_ms.min(MAX_LATCH_TIME_MS) {
                    state.is_latched = false;
                    state.is_triggered = false;
                    state.is_releasing = true;
                    state.is_attacking = false;
                    state.target_velocity = state.config.release_velocity;
                    state.envelope_phase_ms = 0.0;
                }
            }

            if state.is_attacking {
                state.envelope_phase_ms += dt_ms;
                let t = if state.config.attack_time_ms > 0.0 {
                    (state.envelope_phase_ms / state.config.attack_time_ms).min(1.0)
                } else {
                    1.0
                };
                state.current_velocity = state.current_velocity
                    + (state.target_velocity * t - state.current_velocity) * t.min(1.0);
                if state.maintain_original_and_done(t) {
                    state.current_velocity = state.target_velocity;
                    state.is_attacking = false;
                }
            } else if state.is_releasing {
                state.envelope_phase_ms += dt_ms;
                let t = if state.config.release_time_ms > 0.0 {
                    (state.envelope_phase_ms / state.config.release_time_ms).min(1.0)
                } else {
                    1.0
                };
                state.current_velocity = match state.config.release_mode {
                    ReleaseMode::Instant => state.target_velocity,
                    ReleaseMode::Linear => {
                        state.original_velocity + (state.target_velocity - state.original_velocity) * t
                    }
                    ReleaseMode::Exponential => {
                        let k = 1.0 - (-4.0 * t).exp();
                        state.original_velocity + (state.target_velocity - state.original_velocity) * k
                    }
                    ReleaseMode::Logarithmic => {
                        let k = (1.0 + 9.0 * t).ln() / (10.0f32).ln();
                        state.original_velocity + (state.target_velocity - state.original_velocity) * k
                    }
                    ReleaseMode::CustomEnvelope | ReleaseMode::PatternQuantized => {
                        state.original_velocity + (state.target_velocity - state.original_velocity) * t
                    }
                };
                if t >= 1.0 {
                    state.is_releasing = false;
                }
            } else if state.is_latched {
                state.current_velocity = state.target_velocity * state.config.sustain_level;
            }

            if state.is_latched || state.is_attacking || state.is_releasing {
                self.channel_active_times_ms[i] += dt_ms;
            }

            out[i] = state.current_velocity.clamp(0.0, 1.0);
        }
        out
    }
}

impl ChannelState {
    fn maintain_original_and_done(&self, t: f32) -> bool {
        t >= 1.0
    }
}

impl Default for VelocityLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_mode_latches_then_unlatches_on_repeated_trigger() {
        let mut latch = VelocityLatch::new();
        latch.set_channel_config(0, ChannelLatchConfig { mode: LatchMode::Toggle, attack_time_ms: 0.0, ..Default::default() });
        latch.trigger(0, 0.8, 0.0);
        let out = latch.update(1.0);
        assert!(out[0] > 0.0);
        latch.trigger(0, 0.8, 10.0);
        assert!(!latch.channels[0].is_latched);
    }

    #[test]
    fn momentary_mode_releases_on_note_off() {
        let mut latch = VelocityLatch::new();
        latch.set_channel_config(
            0,
            ChannelLatchConfig { mode: LatchMode::Momentary, attack_time_ms: 0.0, release_time_ms: 0.0, ..Default::default() },
        );
        latch.trigger(0, 1.0, 0.0);
        latch.update(1.0);
        latch.release(0, 1.0);
        let out = latch.update(1.0);
        assert!(out[0] < 0.01);
    }

    #[test]
    fn timed_hold_releases_itself_after_hold_time_elapses() {
        let mut latch = VelocityLatch::new();
        latch.set_channel_config(
            0,
            ChannelLatchConfig {
                mode: LatchMode::TimedHold,
                hold_time_ms: 50.0,
                attack_time_ms: 0.0,
                release_time_ms: 0.0,
                ..Default::default()
            },
        );
        latch.trigger(0, 1.0, 0.0);
        for _ in 0..60 {
            latch.update(1.0);
        }
        assert!(!latch.channels[0].is_latched);
    }

    #[test]
    fn latch_group_mutes_other_members_on_trigger() {
        let mut latch = VelocityLatch::new();
        let cfg = ChannelLatchConfig { mode: LatchMode::Toggle, latch_group: Some(1), attack_time_ms: 0.0, ..Default::default() };
        latch.set_channel_config(0, cfg);
        latch.set_channel_config(1, cfg);
        latch.trigger(0, 1.0, 0.0);
        assert!(latch.channels[0].is_latched);
        latch.trigger(1, 1.0, 10.0);
        assert!(!latch.channels[0].is_latched);
        assert!(latch.channels[1].is_latched);
    }

    #[test]
    fn emergency_stop_clears_all_channels() {
        let mut latch = VelocityLatch::new();
        latch.set_channel_config(0, ChannelLatchConfig { mode: LatchMode::Toggle, ..Default::default() });
        latch.trigger(0, 1.0, 0.0);
        latch.emergency_stop();
        let out = latch.update(1.0);
        assert_eq!(out[0], 0.0);
    }
}
