//! Velocity capture and latch pipeline: raw sensor/MIDI samples go through
//! [`capture::VelocityCapture`] to become calibrated [`capture::VelocityEvent`]s,
//! which can then drive [`latch::VelocityLatch`] to hold a note's gain open
//! past the original trigger (sustain pedal, toggle pads, timed holds).

pub mod capture;
pub mod latch;

pub use capture::{ChannelConfig, VelocityCapture, VelocityCurve, VelocityEvent, VelocitySourceType};
pub use latch::{ChannelLatchConfig, LatchMode, ReleaseMode, TriggerSource, VelocityLatch};

use crate::constants::MAX_LATCH_CHANNELS;

/// Wires capture straight into latch: a raw sample becomes a calibrated
/// event, which is immediately used to trigger (or release) the
/// corresponding latch channel.
pub struct VelocityPipeline {
    pub capture: VelocityCapture,
    pub latch: VelocityLatch,
}

impl VelocityPipeline {
    pub fn new() -> Self {
        Self { capture: VelocityCapture::new(), latch: VelocityLatch::new() }
    }

    /// Feeds one raw sample through capture and, if it produced an event,
    /// latches or releases the matching channel. Returns the capture event
    /// (if any) so callers can also route it to note-on logic directly.
    pub fn process_sample(
        &mut self,
        channel: usize,
        raw_value: f32,
        timestamp_us: u64,
        now_ms: f32,
        other_channel_peak: f32,
        gate_high: bool,
    ) -> Option<VelocityEvent> {
        let event = self.capture.process_raw_sample(channel, raw_value, timestamp_us, other_channel_peak)?;
        if !event.is_ghost {
            if gate_high {
                self.latch.trigger(channel, event.velocity, now_ms);
            } else {
                self.latch.release(channel, now_ms);
            }
        }
        Some(event)
    }

    /// Advances the latch envelopes and returns the current output
    /// velocities for every channel.
    pub fn update(&mut self, dt_ms: f32) -> [f32; MAX_LATCH_CHANNELS] {
        self.latch.update(dt_ms)
    }
}

impl Default for VelocityPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_high_event_latches_the_channel() {
        let mut pipeline = VelocityPipeline::new();
        pipeline.latch.set_channel_config(0, ChannelLatchConfig { mode: LatchMode::Toggle, attack_time_ms: 0.0, ..Default::default() });
        pipeline.capture.set_channel_config(0, ChannelConfig { debounce_us: 0, noise_floor: 0.0, ..Default::default() });

        let event = pipeline.process_sample(0, 0.7, 0, 0.0, 0.0, true);
        assert!(event.is_some());
        let out = pipeline.update(1.0);
        assert!(out[0] > 0.0);
    }

    #[test]
    fn ghost_events_never_trigger_the_latch() {
        let mut pipeline = VelocityPipeline::new();
        pipeline.capture.set_channel_config(
            0,
            ChannelConfig { debounce_us: 0, noise_floor: 0.0, ghost_suppression: true, ghost_threshold: 0.1, ..Default::default() },
        );
        pipeline.latch.set_channel_config(0, ChannelLatchConfig { mode: LatchMode::Toggle, attack_time_ms: 0.0, ..Default::default() });

        pipeline.process_sample(0, 0.8, 0, 0.0, 0.9, true);
        let event = pipeline.process_sample(0, 0.8, 1, 1.0, 0.9, true).unwrap();
        assert!(event.is_ghost);
        let out = pipeline.update(1.0);
        assert_eq!(out[0], 0.0);
    }
}
