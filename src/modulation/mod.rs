//! The modulation fabric: a dense source array, an LFO bank, envelope
//! followers, a macro table, and the list of modulation slots that read from
//! sources and write additively on top of a parameter's base value.
//!
//! Ticks at its own `update_rate_hz`, decoupled from the audio block rate
//! (§4.4). The slot list itself is edited only via [`ModulationMatrix::set_slots`],
//! a copy-on-write swap so the audio thread never observes a half-written list.

pub mod lfo;

pub use lfo::Lfo;

use crate::constants::{MAX_ENV_FOLLOWERS, MAX_LFOS, MAX_MACROS, MAX_MOD_SLOTS, MOD_RANDOM_SUBDIVISION_MS};
use crate::dsp::oscillators::{exp_shape, log_shape};
use crate::dsp::peak_follower::PeakFollower;
use crate::dsp::smoothed_parameter::SmoothedParameter;
use crate::types::ParameterId;

/// Every signal the fabric can route from. Indices follow declaration order,
/// which is also the dense array index used internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumCount)]
pub enum ModSource {
    SmartKnob,
    TouchX,
    TouchY,
    Aftertouch,
    Velocity,
    Lfo1,
    Lfo2,
    Lfo3,
    Lfo4,
    Lfo5,
    Lfo6,
    Lfo7,
    Lfo8,
    Env1,
    Env2,
    Env3,
    Random,
    AudioLevel,
    AudioPitch,
    AudioBrightness,
    NoteNumber,
    NoteOnTime,
    VoiceCount,
    Macro1,
    Macro2,
    Macro3,
    Macro4,
}

impl ModSource {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    fn is_time_varying(self) -> bool {
        matches!(
            self,
            ModSource::Lfo1
                | ModSource::Lfo2
                | ModSource::Lfo3
                | ModSource::Lfo4
                | ModSource::Lfo5
                | ModSource::Lfo6
                | ModSource::Lfo7
                | ModSource::Lfo8
        )
    }

}

pub const NUM_SOURCES: usize = <ModSource as strum::EnumCount>::COUNT;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Processing {
    Direct,
    Inverted,
    Rectified,
    Quantized(u8),
    Smoothed,
    SampleHold,
    ExpCurve,
    LogCurve,
    SCurve,
}

#[derive(Debug, Clone, Copy)]
pub struct ModCondition {
    pub source: ModSource,
    pub threshold: f32,
    pub invert: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ModulationSlot {
    pub id: u32,
    pub source: ModSource,
    pub destination: ParameterId,
    pub amount: f32,
    pub offset: f32,
    pub processing: Processing,
    pub rate_mult: f32,
    pub phase_offset: f32,
    pub threshold: f32,
    pub bipolar: bool,
    pub curve_amount: f32,
    pub response_time: f32,
    pub condition: Option<ModCondition>,
    pub enabled: bool,
}

impl ModulationSlot {
    pub fn new(id: u32, source: ModSource, destination: ParameterId, amount: f32) -> Self {
        Self {
            id,
            source,
            destination,
            amount: amount.clamp(-1.0, 1.0),
            offset: 0.0,
            processing: Processing::Direct,
            rate_mult: 1.0,
            phase_offset: 0.0,
            threshold: 0.0,
            bipolar: true,
            curve_amount: 1.0,
            response_time: 0.0,
            condition: None,
            enabled: true,
        }
    }
}

struct SlotRuntime {
    smoother: SmoothedParameter,
    sh_value: f32,
    sh_counter: u32,
}

impl SlotRuntime {
    fn new() -> Self {
        Self { smoother: SmoothedParameter::new(0.0), sh_value: 0.0, sh_counter: 0 }
    }
}

pub struct ModulationMatrix {
    sources: [f32; NUM_SOURCES],
    lfos: Vec<Lfo>,
    env_followers: [PeakFollower; MAX_ENV_FOLLOWERS],
    macros: [Option<(ModSource, f32)>; MAX_MACROS],
    slots: Vec<ModulationSlot>,
    runtime: Vec<SlotRuntime>,
    update_rate_hz: f32,
    tempo_bpm: f32,
    global_mod_amount: f32,
    time_since_update: f32,
    time_since_random: f32,
    rng_state: u64,
}

impl ModulationMatrix {
    pub fn new(update_rate_hz: f32) -> Self {
        let lfo_count = MAX_LFOS.min(8).max(3);
        Self {
            sources: [0.0; NUM_SOURCES],
            lfos: (0..lfo_count).map(|_| Lfo::new()).collect(),
            env_followers: std::array::from_fn(|_| PeakFollower::new(0.01, 0.1, 48000.0)),
            macros: [None; MAX_MACROS],
            slots: Vec::with_capacity(MAX_MOD_SLOTS),
            runtime: Vec::with_capacity(MAX_MOD_SLOTS),
            update_rate_hz,
            tempo_bpm: crate::constants::DEFAULT_TEMPO_BPM,
            global_mod_amount: 1.0,
            time_since_update: 0.0,
            time_since_random: 0.0,
            rng_state: 0x2545F4914F6CDD1D,
        }
    }

    pub fn lfo_mut(&mut self, index: usize) -> Option<&mut Lfo> {
        self.lfos.get_mut(index)
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.tempo_bpm = bpm;
    }

    pub fn set_global_mod_amount(&mut self, amount: f32) {
        self.global_mod_amount = amount.clamp(0.0, 2.0);
    }

    pub fn set_source_value(&mut self, source: ModSource, value: f32) {
        self.sources[source.index()] = value;
    }

    pub fn source_value(&self, source: ModSource) -> f32 {
        self.sources[source.index()]
    }

    pub fn set_macro(&mut self, macro_index: usize, source: ModSource, weight: f32) {
        if let Some(slot) = self.macros.get_mut(macro_index) {
            *slot = Some((source, weight));
        }
    }

    /// Copy-on-write replacement of the entire slot list; never mutated
    /// in-place while the audio thread might be reading it mid-block.
    pub fn set_slots(&mut self, slots: Vec<ModulationSlot>) {
        self.runtime = slots.iter().map(|_| SlotRuntime::new()).collect();
        self.slots = slots;
    }

    /// Updates the `amount` of the slot at `index` in place (no full
    /// copy-on-write replacement), clamped to the same range [`ModulationSlot::new`]
    /// clamps to. Out-of-range indices are ignored.
    pub fn set_slot_amount(&mut self, index: usize, amount: f32) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.amount = amount.clamp(-1.0, 1.0);
        }
    }

    fn next_random_bipolar(&mut self) -> f32 {
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545F4914F6CDD1D);
        (((bits >> 40) as f32) / ((1u64 << 24) as f32)) * 2.0 - 1.0
    }

    /// Runs the ticker if `dt_since_last_call` has crossed the configured
    /// update interval; advances LFOs, re-draws the random source on its
    /// subdivision, and re-evaluates macros. Audio-derived sources are
    /// expected to already have been refreshed via `set_source_value`.
    pub fn update(&mut self, dt_seconds: f32) {
        self.time_since_update += dt_seconds;
        let interval = 1.0 / self.update_rate_hz;
        while self.time_since_update >= interval {
            self.time_since_update -= interval;
            self.tick();
        }
    }

    fn tick(&mut self) {
        let macro_values = self.macros;

        for i in 0..self.lfos.len() {
            let value = self.lfos[i].process(self.update_rate_hz, self.tempo_bpm, 0.0, 0.0);
            let source = lfo_source_for_index(i);
            if let Some(source) = source {
                self.sources[source.index()] = value;
            }
        }

        self.time_since_random += 1000.0 / self.update_rate_hz;
        if self.time_since_random >= MOD_RANDOM_SUBDIVISION_MS {
            self.time_since_random = 0.0;
            self.sources[ModSource::Random.index()] = self.next_random_bipolar();
        }

        for (i, macro_slot) in macro_values.iter().enumerate() {
            if let Some((source, weight)) = macro_slot {
                let value = self.sources[source.index()] * weight;
                let index = ModSource::Macro1.index() + i;
                if index < NUM_SOURCES {
                    self.sources[index] = value.clamp(-1.0, 1.0);
                }
            }
        }
    }

    /// Feeds an envelope-follower index from an audio block's peak magnitude.
    pub fn feed_envelope_follower(&mut self, index: usize, sample: f32) {
        if let Some(follower) = self.env_followers.get_mut(index) {
            let level = follower.process(sample);
            let source = match index {
                0 => Some(ModSource::Env1),
                1 => Some(ModSource::Env2),
                2 => Some(ModSource::Env3),
                _ => None,
            };
            if let Some(source) = source {
                self.sources[source.index()] = level;
            }
        }
    }

    /// The hot path: for every enabled slot targeting `param`, evaluate the
    /// condition, read the source, apply processing/shift/scale, and either
    /// smooth or add directly. Returns `base` plus the additive sum.
    pub fn get_modulated_value(&mut self, param: ParameterId, base: f32) -> f32 {
        let mut result = base;
        for i in 0..self.slots.len() {
            let slot = self.slots[i];
            if !slot.enabled || slot.destination != param {
                continue;
            }

            if let Some(condition) = slot.condition {
                let cond_value = self.sources[condition.source.index()];
                let met = if condition.invert { cond_value < condition.threshold } else { cond_value >= condition.threshold };
                if !met {
                    continue;
                }
            }

            let raw = self.sources[slot.source.index()];

            let mut value = match slot.processing {
                Processing::Direct | Processing::Smoothed => raw,
                Processing::Inverted => -raw,
                Processing::Rectified => raw.abs(),
                Processing::Quantized(levels) => {
                    let levels = (levels.max(1)) as f32;
                    (((raw * 0.5 + 0.5) * levels).floor() / levels) * 2.0 - 1.0
                }
                Processing::SampleHold => {
                    let runtime = &mut self.runtime[i];
                    let hold_ticks = (self.update_rate_hz / (10.0 * slot.rate_mult.max(0.01))).max(1.0) as u32;
                    runtime.sh_counter += 1;
                    if runtime.sh_counter >= hold_ticks {
                        runtime.sh_counter = 0;
                        runtime.sh_value = raw;
                    }
                    runtime.sh_value
                }
                Processing::ExpCurve => exp_shape((raw * 0.5 + 0.5).clamp(0.0, 1.0), slot.curve_amount),
                Processing::LogCurve => log_shape((raw * 0.5 + 0.5).clamp(0.0, 1.0), slot.curve_amount),
                Processing::SCurve => {
                    let u = (raw * 0.5 + 0.5).clamp(0.0, 1.0);
                    let s = u * u * (3.0 - 2.0 * u);
                    s * 2.0 - 1.0
                }
            };

            if slot.threshold > 0.0 && value.abs() < slot.threshold {
                value = 0.0;
            }

            if slot.source.is_time_varying() && (slot.phase_offset != 0.0 || slot.rate_mult != 1.0) {
                let asin_v = value.clamp(-1.0, 1.0).asin();
                let shift = slot.phase_offset * slot.rate_mult * 2.0 * std::f32::consts::PI;
                value = (asin_v + shift).sin();
            }

            if !slot.bipolar {
                value = (value + 1.0) * 0.5;
            }

            let mut contribution = value * slot.amount + slot.offset;
            contribution *= self.global_mod_amount;

            if slot.response_time > 0.0 {
                let runtime = &mut self.runtime[i];
                runtime.smoother.set_smoothing_time_ms(slot.response_time, self.update_rate_hz);
                runtime.smoother.set_target(contribution);
                result += runtime.smoother.next();
            } else {
                result += contribution;
            }
        }
        result
    }
}

fn lfo_source_for_index(index: usize) -> Option<ModSource> {
    match index {
        0 => Some(ModSource::Lfo1),
        1 => Some(ModSource::Lfo2),
        2 => Some(ModSource::Lfo3),
        3 => Some(ModSource::Lfo4),
        4 => Some(ModSource::Lfo5),
        5 => Some(ModSource::Lfo6),
        6 => Some(ModSource::Lfo7),
        7 => Some(ModSource::Lfo8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_slots_means_no_op() {
        let mut matrix = ModulationMatrix::new(1000.0);
        assert_eq!(matrix.get_modulated_value(ParameterId::FilterCutoff, 0.5), 0.5);
    }

    #[test]
    fn disabled_condition_blocks_the_contribution() {
        let mut matrix = ModulationMatrix::new(1000.0);
        matrix.set_source_value(ModSource::Velocity, 0.0);
        let mut slot = ModulationSlot::new(1, ModSource::Velocity, ParameterId::FilterCutoff, 1.0);
        slot.condition = Some(ModCondition { source: ModSource::Velocity, threshold: 0.5, invert: false });
        matrix.set_slots(vec![slot]);
        assert_eq!(matrix.get_modulated_value(ParameterId::FilterCutoff, 0.2), 0.2);
    }

    #[test]
    fn direct_slot_adds_scaled_source_to_base() {
        let mut matrix = ModulationMatrix::new(1000.0);
        matrix.set_source_value(ModSource::Aftertouch, 1.0);
        let slot = ModulationSlot::new(1, ModSource::Aftertouch, ParameterId::FilterCutoff, 0.5);
        matrix.set_slots(vec![slot]);
        let result = matrix.get_modulated_value(ParameterId::FilterCutoff, 0.0);
        assert!((result - 0.5).abs() < 1e-5);
    }

    #[test]
    fn rectified_processing_folds_negative_values_positive() {
        let mut matrix = ModulationMatrix::new(1000.0);
        matrix.set_source_value(ModSource::Aftertouch, -0.8);
        let mut slot = ModulationSlot::new(1, ModSource::Aftertouch, ParameterId::FilterCutoff, 1.0);
        slot.processing = Processing::Rectified;
        matrix.set_slots(vec![slot]);
        let result = matrix.get_modulated_value(ParameterId::FilterCutoff, 0.0);
        assert!(result > 0.0);
    }

    #[test]
    fn lfo_bank_advances_when_ticked() {
        let mut matrix = ModulationMatrix::new(1000.0);
        matrix.lfo_mut(0).unwrap().rate_hz = 5.0;
        matrix.update(1.0);
        assert_ne!(matrix.source_value(ModSource::Lfo1), 0.0);
    }
}
