//! A single polyphonic voice slot: one [`Engine`] instance, one shared ADSR,
//! and the smoothing/DC-blocking every engine gets for free regardless of
//! algorithm. Voices never own a `Box<dyn _>`; the whole struct is plain data
//! sized for a fixed-capacity array in [`crate::voice_manager`].

use crate::constants::MAX_BUFFER_SIZE;
use crate::dsp::adsr::{Envelope, EnvelopeParams, EnvelopeState};
use crate::dsp::dc_blocker::DcBlocker;
use crate::dsp::smoothed_parameter::SmoothedParameter;
use crate::engines::{Engine, EngineType};
use crate::modules::Frame;
use crate::types::{ParameterId, TrackId, VoiceId};

pub struct Voice {
    pub id: VoiceId,
    pub track_id: TrackId,
    pub engine: Engine,
    pub envelope_params: EnvelopeParams,
    envelope_state: EnvelopeState,
    amp: SmoothedParameter,
    pan: SmoothedParameter,
    dc_blocker: DcBlocker,
    pub is_active: bool,
    /// Monotonic counter stamped by the voice manager at `trigger()`, used to
    /// find the oldest voice when stealing.
    pub allocated_at: u64,
    pub note: u8,
}

impl Voice {
    pub fn new(id: VoiceId, track_id: TrackId) -> Self {
        Self {
            id,
            track_id,
            engine: Engine::new(EngineType::default()),
            envelope_params: EnvelopeParams::default(),
            envelope_state: EnvelopeState::default(),
            amp: SmoothedParameter::new(1.0),
            pan: SmoothedParameter::new(0.0),
            dc_blocker: DcBlocker::new(),
            is_active: false,
            allocated_at: 0,
            note: 0,
        }
    }

    pub fn set_engine(&mut self, kind: EngineType) {
        self.engine = Engine::new(kind);
    }

    pub fn set_parameter(&mut self, param: ParameterId, value: f32) {
        match param {
            ParameterId::Attack => self.envelope_params.attack = value,
            ParameterId::Decay => self.envelope_params.decay = value,
            ParameterId::Sustain => self.envelope_params.sustain = value,
            ParameterId::Release => self.envelope_params.release = value,
            ParameterId::AttackCurve => self.envelope_params.attack_curve = value.clamp(0.0, 1.0),
            ParameterId::DecayCurve => self.envelope_params.decay_curve = value.clamp(0.0, 1.0),
            ParameterId::ReleaseCurve => self.envelope_params.release_curve = value.clamp(0.0, 1.0),
            ParameterId::Volume => self.amp.set_target(value.clamp(0.0, 2.0)),
            ParameterId::Pan => self.pan.set_target(value.clamp(-1.0, 1.0)),
            _ => self.engine.set_parameter(param, value),
        }
    }

    /// The inverse of `set_parameter`, used as the "user-set base value" the
    /// modulation fabric composes on top of (§4.4): the ADSR/amp/pan block
    /// this struct owns directly, falling through to the engine for
    /// everything else.
    pub fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        match param {
            ParameterId::Attack => Some(self.envelope_params.attack),
            ParameterId::Decay => Some(self.envelope_params.decay),
            ParameterId::Sustain => Some(self.envelope_params.sustain),
            ParameterId::Release => Some(self.envelope_params.release),
            ParameterId::AttackCurve => Some(self.envelope_params.attack_curve),
            ParameterId::DecayCurve => Some(self.envelope_params.decay_curve),
            ParameterId::ReleaseCurve => Some(self.envelope_params.release_curve),
            ParameterId::Volume => Some(self.amp.target()),
            ParameterId::Pan => Some(self.pan.target()),
            _ => self.engine.get_parameter(param),
        }
    }

    /// Whether this voice (directly, or via its engine) honors `param` at all.
    pub fn has_parameter(&self, param: ParameterId) -> bool {
        matches!(
            param,
            ParameterId::Attack
                | ParameterId::Decay
                | ParameterId::Sustain
                | ParameterId::Release
                | ParameterId::AttackCurve
                | ParameterId::DecayCurve
                | ParameterId::ReleaseCurve
                | ParameterId::Volume
                | ParameterId::Pan
        ) || self.engine.has_parameter(param)
    }

    /// `note_on` from any state restarts the envelope at Attack using the
    /// current level as the starting point, so no click is audible even when
    /// retriggering a still-sounding voice.
    pub fn trigger(&mut self, note: u8, velocity: f32, sample_rate: f32, allocated_at: u64) {
        self.note = note;
        self.allocated_at = allocated_at;
        self.is_active = true;
        self.envelope_state.trigger();
        self.engine.note_on(note, velocity, sample_rate);
    }

    pub fn release(&mut self) {
        self.envelope_state.release();
        self.engine.note_off();
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.envelope_state.set_idle();
        self.engine.reset();
    }

    pub fn set_aftertouch(&mut self, value: f32) {
        self.engine.set_aftertouch(value);
    }

    pub fn is_releasing_or_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        if !self.is_active {
            return;
        }

        let mut buffer = [Frame::ZERO; MAX_BUFFER_SIZE];
        let len = output.len().min(MAX_BUFFER_SIZE);
        let buffer = &mut buffer[..len];

        self.engine.process(buffer, sample_rate);
        self.dc_blocker.process_block_optimized(buffer);

        let mut envelope_levels = [0.0f32; MAX_BUFFER_SIZE];
        Envelope::process_block(
            &self.envelope_params,
            &mut self.envelope_state,
            &mut envelope_levels[..len],
            sample_rate,
        );

        for (i, frame) in buffer.iter().enumerate() {
            let amp = self.amp.next();
            let pan = self.pan.next();
            let pan_factor = (pan + 1.0) * 0.5;
            let left_gain = (1.0 - pan_factor).max(0.0);
            let right_gain = pan_factor.max(0.0);

            let level = envelope_levels[i] * amp;
            output[i].left += frame.left * level * left_gain;
            output[i].right += frame.right * level * right_gain;
        }

        if self.envelope_state.is_finished() {
            self.is_active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_voice_leaves_output_untouched() {
        let mut voice = Voice::new(0, 0);
        let mut output = [Frame::ZERO; 16];
        voice.process(&mut output, 48000.0);
        assert!(output.iter().all(|f| f.left == 0.0 && f.right == 0.0));
    }

    #[test]
    fn triggering_makes_voice_active_and_eventually_finishes_on_release() {
        let mut voice = Voice::new(1, 0);
        voice.set_engine(EngineType::Subtractive);
        voice.envelope_params.release = 0.01;
        voice.trigger(69, 1.0, 48000.0, 1);
        assert!(voice.is_active);

        let mut output = [Frame::ZERO; 64];
        voice.process(&mut output, 48000.0);
        assert!(voice.is_active);

        voice.release();
        for _ in 0..200 {
            let mut output = [Frame::ZERO; 64];
            voice.process(&mut output, 48000.0);
        }
        assert!(!voice.is_active);
    }
}
