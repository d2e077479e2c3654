//! Per-voice ADSR envelope: four-stage amplitude shaping with curve-adjustable
//! segments. At the default curve value each segment is a literal linear ramp;
//! `note_on` while a voice is already sounding restarts Attack from the current
//! level rather than from zero, so retriggering never clicks.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePhase {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub attack_curve: f32,
    pub decay_curve: f32,
    pub release_curve: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            attack_curve: 0.5,
            decay_curve: 0.5,
            release_curve: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeState {
    pub phase: EnvelopePhase,
    pub current_level: f32,
    pub phase_time: f32,
    pub gate_open: bool,
    pub gate_time: f32,
    pub duration: f32,
    /// Whether `duration` auto-releases the gate. Only [`EnvelopeState::scale_to_duration`]
    /// turns this on; the ordinary note-on/note-off gate path leaves it off so a
    /// held MIDI note sustains indefinitely instead of timing out after `duration`.
    duration_gated: bool,
    pub release_start_level: f32,
    attack_start_level: f32,
}

impl Default for EnvelopeState {
    fn default() -> Self {
        Self {
            phase: EnvelopePhase::Idle,
            current_level: 0.0,
            phase_time: 0.0,
            gate_open: false,
            gate_time: 0.0,
            duration: 1.0,
            duration_gated: false,
            release_start_level: 0.0,
            attack_start_level: 0.0,
        }
    }
}

impl EnvelopeState {
    /// note_on: restarts Attack. If the envelope was already sounding, Attack
    /// ramps from `current_level` rather than 0 so there is no discontinuity.
    #[inline]
    pub fn trigger(&mut self) {
        self.attack_start_level = self.current_level;
        self.phase = EnvelopePhase::Attack;
        self.phase_time = 0.0;
        self.gate_open = true;
        self.gate_time = 0.0;
        self.duration_gated = false;
        self.release_start_level = 0.0;
    }

    /// note_off: no-op from Idle, otherwise starts Release from the current level.
    #[inline]
    pub fn release(&mut self) {
        if matches!(self.phase, EnvelopePhase::Idle) {
            return;
        }
        if self.gate_open && !matches!(self.phase, EnvelopePhase::Release) {
            self.gate_open = false;
            self.release_start_level = self.current_level;
            self.phase = EnvelopePhase::Release;
            self.phase_time = 0.0;
        }
    }

    #[inline]
    pub fn set_idle(&mut self) {
        self.phase = EnvelopePhase::Idle;
        self.current_level = 0.0;
        self.phase_time = 0.0;
        self.gate_open = false;
        self.gate_time = 0.0;
        self.duration = 1.0;
        self.duration_gated = false;
        self.release_start_level = 0.0;
        self.attack_start_level = 0.0;
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, EnvelopePhase::Idle)
    }

    /// Opts this gate into releasing on its own once `gate_time >= dur`,
    /// for fixed-duration triggers (e.g. a sequencer step's gate length)
    /// rather than an explicit note-off.
    #[inline]
    pub fn scale_to_duration(&mut self, dur: f32) {
        self.duration = dur.max(0.001);
        self.duration_gated = true;
    }
}

pub struct Envelope;

impl Envelope {
    /// Shapes linear progress `t` by `curve`. `curve == 0.5` is the identity
    /// (literal linear ramp); values below/above bow the segment early/late.
    #[inline]
    fn curve_transform(t: f32, curve: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let curve = curve.clamp(0.001, 0.999);

        if curve < 0.5 {
            let factor = curve * 2.0;
            t * (1.0 + factor * (1.0 - t))
        } else {
            let factor = (curve - 0.5) * 2.0;
            let inv = 1.0 - t;
            1.0 - inv * (1.0 + factor * t)
        }
    }

    #[inline]
    fn flush_denormals(x: f32) -> f32 {
        const DENORMAL_THRESHOLD: f32 = 1e-15;
        if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
    }

    #[inline]
    fn update_envelope_state(params: &EnvelopeParams, state: &mut EnvelopeState, dt: f32) {
        if state.gate_open {
            state.gate_time += dt;
            if state.duration_gated && state.gate_time >= state.duration {
                state.release();
            }
        }

        state.phase_time += dt;

        match state.phase {
            EnvelopePhase::Idle => {
                state.current_level = 0.0;
            }
            EnvelopePhase::Attack => {
                if params.attack <= 0.001 {
                    state.current_level = 1.0;
                    state.phase = EnvelopePhase::Decay;
                    state.phase_time = 0.0;
                } else {
                    let progress = (state.phase_time / params.attack).clamp(0.0, 1.0);
                    if progress >= 1.0 {
                        state.current_level = 1.0;
                        state.phase = EnvelopePhase::Decay;
                        state.phase_time = 0.0;
                    } else {
                        let curve_val = Self::curve_transform(progress, params.attack_curve);
                        state.current_level =
                            state.attack_start_level + curve_val * (1.0 - state.attack_start_level);
                    }
                }
            }
            EnvelopePhase::Decay => {
                if params.decay <= 0.001 {
                    state.current_level = params.sustain;
                    state.phase = EnvelopePhase::Sustain;
                    state.phase_time = 0.0;
                } else {
                    let progress = (state.phase_time / params.decay).clamp(0.0, 1.0);
                    if progress >= 1.0 {
                        state.current_level = params.sustain;
                        state.phase = EnvelopePhase::Sustain;
                        state.phase_time = 0.0;
                    } else {
                        let curve_val = Self::curve_transform(progress, params.decay_curve);
                        state.current_level = 1.0 - curve_val * (1.0 - params.sustain);
                    }
                }
            }
            EnvelopePhase::Sustain => {
                state.current_level = params.sustain;
            }
            EnvelopePhase::Release => {
                if params.release <= 0.001 {
                    state.current_level = 0.0;
                    state.phase = EnvelopePhase::Idle;
                    state.phase_time = 0.0;
                } else {
                    let progress = (state.phase_time / params.release).clamp(0.0, 1.0);
                    if progress >= 1.0 {
                        state.current_level = 0.0;
                        state.phase = EnvelopePhase::Idle;
                        state.phase_time = 0.0;
                    } else {
                        let curve_val = Self::curve_transform(progress, params.release_curve);
                        state.current_level = state.release_start_level * (1.0 - curve_val);
                    }
                }
            }
        }

        state.current_level = state.current_level.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process_block(
        params: &EnvelopeParams,
        state: &mut EnvelopeState,
        buffer: &mut [f32],
        sample_rate: f32,
    ) {
        let dt = 1.0 / sample_rate;
        for sample in buffer.iter_mut() {
            Self::update_envelope_state(params, state, dt);
            *sample = Self::flush_denormals(state.current_level);
        }
    }

    #[inline]
    pub fn get_amplitude(params: &EnvelopeParams, state: &mut EnvelopeState, dt: f32) -> f32 {
        if matches!(state.phase, EnvelopePhase::Idle) {
            return 0.0;
        }
        Self::update_envelope_state(params, state, dt);
        Self::flush_denormals(state.current_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_stays_in_unit_range() {
        let params = EnvelopeParams::default();
        let mut state = EnvelopeState::default();
        state.trigger();
        for _ in 0..100_000 {
            let lvl = Envelope::get_amplitude(&params, &mut state, 1.0 / 48000.0);
            assert!((0.0..=1.0).contains(&lvl));
        }
    }

    #[test]
    fn release_reaches_idle_at_zero() {
        let params = EnvelopeParams {
            attack: 0.001,
            decay: 0.001,
            sustain: 0.5,
            release: 0.01,
            ..EnvelopeParams::default()
        };
        let mut state = EnvelopeState::default();
        state.trigger();
        state.scale_to_duration(0.02);
        for _ in 0..48000 {
            Envelope::get_amplitude(&params, &mut state, 1.0 / 48000.0);
        }
        assert_eq!(state.phase, EnvelopePhase::Idle);
        assert_eq!(state.current_level, 0.0);
    }

    #[test]
    fn note_off_from_idle_is_noop() {
        let mut state = EnvelopeState::default();
        state.release();
        assert_eq!(state.phase, EnvelopePhase::Idle);
    }

    #[test]
    fn retrigger_preserves_level_no_click() {
        let params = EnvelopeParams::default();
        let mut state = EnvelopeState::default();
        state.trigger();
        for _ in 0..100 {
            Envelope::get_amplitude(&params, &mut state, 1.0 / 48000.0);
        }
        let level_before = state.current_level;
        state.trigger();
        assert_eq!(state.current_level, level_before);
        let level_after_one_sample = Envelope::get_amplitude(&params, &mut state, 1.0 / 48000.0);
        assert!((level_after_one_sample - level_before).abs() < 0.01);
    }
}
