//! Synthesis engines.
//!
//! Each engine owns the DSP state for exactly one voice at a time (the
//! polyphony, stealing, and shared ADSR live one layer up in
//! [`crate::voice`]/[`crate::voice_manager`]). Engines are dispatched through
//! a tagged enum rather than `Box<dyn Source>`: no heap allocation to create
//! a voice, no vtable indirection in the per-sample hot path, and a voice can
//! be reused across note-offs by just overwriting the enum in place.
//!
//! Every engine exposes the same three macro-controls (harmonics / timbre /
//! morph) plus a filter cutoff/resonance/type and an oscillator mix, mapped
//! to whatever is musically meaningful for that engine's algorithm.

mod chord;
mod drum_kit;
mod fm2;
mod formant_vocal;
mod harmonics;
mod modal;
mod particles;
mod resonator;
mod sample_kit;
mod sample_slicer;
mod subtractive;
mod tidal;
mod wavetable;
mod waveshaper;

use crate::modules::Frame;
use crate::types::ParameterId;
use strum::{EnumCount, IntoEnumIterator};

/// Behavior every engine implements. Implemented by each concrete engine
/// struct; dispatch happens through [`Engine`]'s match arms, never through a
/// trait object.
pub trait SynthEngine {
    fn note_on(&mut self, note: u8, velocity: f32, sample_rate: f32);
    fn note_off(&mut self);
    fn set_aftertouch(&mut self, value: f32);
    fn set_parameter(&mut self, param: ParameterId, value: f32);
    fn get_parameter(&self, param: ParameterId) -> Option<f32>;
    fn has_parameter(&self, param: ParameterId) -> bool;
    fn process(&mut self, output: &mut [Frame], sample_rate: f32);
    fn reset(&mut self);

    /// Whether the modulation fabric may target `param` on this engine.
    /// Every parameter an engine declares accepts modulation by default.
    fn supports_parameter_modulation(&self, param: ParameterId) -> bool {
        self.has_parameter(param)
    }

    /// Applies a modulation amount on top of `param`'s current base value,
    /// using the same additive composition the modulation fabric's
    /// `get_modulated_value` uses, clamped to the engine's normalized range.
    fn set_modulation(&mut self, param: ParameterId, amount: f32) {
        if let Some(base) = self.get_parameter(param) {
            self.set_parameter(param, (base + amount).clamp(0.0, 1.0));
        }
    }

    /// Serializes every parameter this engine declares as little-endian
    /// `f32`s, in `ParameterId` enum order. Returns the byte count written.
    fn save_preset(&self, buf: &mut [u8]) -> usize {
        let mut offset = 0;
        for param in ParameterId::iter() {
            if !self.has_parameter(param) {
                continue;
            }
            if offset + 4 > buf.len() {
                break;
            }
            let value = self.get_parameter(param).unwrap_or(0.0);
            buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            offset += 4;
        }
        offset
    }

    /// Inverse of `save_preset`: reads back every declared parameter in the
    /// same enum order and applies it via `set_parameter`. Returns `false`
    /// if `buf` is too short for the engine's declared parameter set.
    fn load_preset(&mut self, buf: &[u8]) -> bool {
        let mut offset = 0;
        for param in ParameterId::iter() {
            if !self.has_parameter(param) {
                continue;
            }
            if offset + 4 > buf.len() {
                return false;
            }
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(&buf[offset..offset + 4]);
            self.set_parameter(param, f32::from_le_bytes(bytes));
            offset += 4;
        }
        true
    }
}

/// Identifies an engine kind without owning its state; used by the CLI's
/// `set_engine` command and by presets to select which variant to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EngineType {
    Subtractive,
    Fm2,
    Wavetable,
    Waveshaper,
    Chord,
    Harmonics,
    FormantVocal,
    Particles,
    Tidal,
    Resonator,
    Modal,
    DrumKit,
    SampleKit,
    SampleSlicer,
}

impl Default for EngineType {
    fn default() -> Self {
        EngineType::Subtractive
    }
}

/// The tagged union of all synthesis algorithms. One instance lives inside
/// every voice slot in the voice manager's fixed array.
pub enum Engine {
    Subtractive(subtractive::SubtractiveEngine),
    Fm2(fm2::Fm2Engine),
    Wavetable(wavetable::WavetableEngine),
    Waveshaper(waveshaper::WaveshaperEngine),
    Chord(chord::ChordEngine),
    Harmonics(harmonics::HarmonicsEngine),
    FormantVocal(formant_vocal::FormantVocalEngine),
    Particles(particles::ParticlesEngine),
    Tidal(tidal::TidalEngine),
    Resonator(resonator::ResonatorEngine),
    Modal(modal::ModalEngine),
    DrumKit(drum_kit::DrumKitEngine),
    SampleKit(sample_kit::SampleKitEngine),
    SampleSlicer(sample_slicer::SampleSlicerEngine),
}

macro_rules! dispatch {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            Engine::Subtractive(e) => e.$method($($arg),*),
            Engine::Fm2(e) => e.$method($($arg),*),
            Engine::Wavetable(e) => e.$method($($arg),*),
            Engine::Waveshaper(e) => e.$method($($arg),*),
            Engine::Chord(e) => e.$method($($arg),*),
            Engine::Harmonics(e) => e.$method($($arg),*),
            Engine::FormantVocal(e) => e.$method($($arg),*),
            Engine::Particles(e) => e.$method($($arg),*),
            Engine::Tidal(e) => e.$method($($arg),*),
            Engine::Resonator(e) => e.$method($($arg),*),
            Engine::Modal(e) => e.$method($($arg),*),
            Engine::DrumKit(e) => e.$method($($arg),*),
            Engine::SampleKit(e) => e.$method($($arg),*),
            Engine::SampleSlicer(e) => e.$method($($arg),*),
        }
    };
}

impl Engine {
    pub fn new(kind: EngineType) -> Self {
        match kind {
            EngineType::Subtractive => Engine::Subtractive(Default::default()),
            EngineType::Fm2 => Engine::Fm2(Default::default()),
            EngineType::Wavetable => Engine::Wavetable(Default::default()),
            EngineType::Waveshaper => Engine::Waveshaper(Default::default()),
            EngineType::Chord => Engine::Chord(Default::default()),
            EngineType::Harmonics => Engine::Harmonics(Default::default()),
            EngineType::FormantVocal => Engine::FormantVocal(Default::default()),
            EngineType::Particles => Engine::Particles(Default::default()),
            EngineType::Tidal => Engine::Tidal(Default::default()),
            EngineType::Resonator => Engine::Resonator(Default::default()),
            EngineType::Modal => Engine::Modal(Default::default()),
            EngineType::DrumKit => Engine::DrumKit(Default::default()),
            EngineType::SampleKit => Engine::SampleKit(Default::default()),
            EngineType::SampleSlicer => Engine::SampleSlicer(Default::default()),
        }
    }

    pub fn kind(&self) -> EngineType {
        match self {
            Engine::Subtractive(_) => EngineType::Subtractive,
            Engine::Fm2(_) => EngineType::Fm2,
            Engine::Wavetable(_) => EngineType::Wavetable,
            Engine::Waveshaper(_) => EngineType::Waveshaper,
            Engine::Chord(_) => EngineType::Chord,
            Engine::Harmonics(_) => EngineType::Harmonics,
            Engine::FormantVocal(_) => EngineType::FormantVocal,
            Engine::Particles(_) => EngineType::Particles,
            Engine::Tidal(_) => EngineType::Tidal,
            Engine::Resonator(_) => EngineType::Resonator,
            Engine::Modal(_) => EngineType::Modal,
            Engine::DrumKit(_) => EngineType::DrumKit,
            Engine::SampleKit(_) => EngineType::SampleKit,
            Engine::SampleSlicer(_) => EngineType::SampleSlicer,
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: f32, sample_rate: f32) {
        dispatch!(self, note_on, note, velocity, sample_rate)
    }

    pub fn note_off(&mut self) {
        dispatch!(self, note_off)
    }

    pub fn set_aftertouch(&mut self, value: f32) {
        dispatch!(self, set_aftertouch, value)
    }

    pub fn set_parameter(&mut self, param: ParameterId, value: f32) {
        dispatch!(self, set_parameter, param, value)
    }

    pub fn get_parameter(&self, param: ParameterId) -> Option<f32> {
        dispatch!(self, get_parameter, param)
    }

    pub fn has_parameter(&self, param: ParameterId) -> bool {
        dispatch!(self, has_parameter, param)
    }

    pub fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        dispatch!(self, process, output, sample_rate)
    }

    pub fn reset(&mut self) {
        dispatch!(self, reset)
    }

    pub fn supports_parameter_modulation(&self, param: ParameterId) -> bool {
        dispatch!(self, supports_parameter_modulation, param)
    }

    pub fn set_modulation(&mut self, param: ParameterId, amount: f32) {
        dispatch!(self, set_modulation, param, amount)
    }

    /// Upper bound on `save_preset`'s output: one little-endian `f32` per
    /// possible `ParameterId`, enough to size a buffer for any engine since
    /// each one only ever writes the subset it declares via `has_parameter`.
    pub const MAX_PRESET_SIZE: usize = ParameterId::COUNT * 4;

    pub fn save_preset(&self, buf: &mut [u8]) -> usize {
        dispatch!(self, save_preset, buf)
    }

    pub fn load_preset(&mut self, buf: &[u8]) -> bool {
        dispatch!(self, load_preset, buf)
    }

    /// Static identifier metadata for this engine's kind: `{ type, name,
    /// description }` as required by the per-engine contract.
    pub fn description(&self) -> &'static str {
        self.kind().description()
    }
}

impl EngineType {
    /// One-line description of the synthesis algorithm, used by the CLI and
    /// preset metadata's identifier triple `{ type, name, description }`.
    pub fn description(self) -> &'static str {
        match self {
            EngineType::Subtractive => "classic subtractive: oscillator mix into a resonant filter",
            EngineType::Fm2 => "2-operator FM with feedback",
            EngineType::Wavetable => "single-table wavetable playback with morph scanning",
            EngineType::Waveshaper => "waveshaping distortion of a band-limited source",
            EngineType::Chord => "stacked-interval chord oscillator",
            EngineType::Harmonics => "additive harmonic-stack synthesis",
            EngineType::FormantVocal => "formant-filtered vocal-like source",
            EngineType::Particles => "granular noise/particle texture generator",
            EngineType::Tidal => "wavefolding tidal-style oscillator",
            EngineType::Resonator => "modal physical-model resonator excited by noise/impulse",
            EngineType::Modal => "coupled modal resonant body",
            EngineType::DrumKit => "one-shot drum kit sample player",
            EngineType::SampleKit => "multi-sample kit player",
            EngineType::SampleSlicer => "sliced-sample playback engine",
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineType::default())
    }
}

/// Converts a MIDI-style note number to frequency in Hz (A4 = note 69).
#[inline]
pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_type_constructs_and_reports_its_own_kind() {
        use strum::IntoEnumIterator;
        for kind in EngineType::iter() {
            let engine = Engine::new(kind);
            assert_eq!(engine.kind(), kind);
        }
    }

    #[test]
    fn note_to_freq_a4_is_440() {
        assert!((note_to_freq(69) - 440.0).abs() < 0.001);
    }

    #[test]
    fn preset_round_trip_restores_every_declared_parameter() {
        for kind in EngineType::iter() {
            let mut source = Engine::new(kind);
            for param in ParameterId::iter() {
                if source.has_parameter(param) {
                    source.set_parameter(param, 0.25);
                }
            }
            let mut buf = [0u8; Engine::MAX_PRESET_SIZE];
            let written = source.save_preset(&mut buf);

            let mut dest = Engine::new(kind);
            assert!(dest.load_preset(&buf[..written]));
            for param in ParameterId::iter() {
                if source.has_parameter(param) {
                    assert_eq!(dest.get_parameter(param), source.get_parameter(param), "{kind:?} {param:?}");
                }
            }
        }
    }

    #[test]
    fn set_modulation_composes_additively_on_the_base_value() {
        let mut engine = Engine::new(EngineType::Subtractive);
        engine.set_parameter(ParameterId::FilterCutoff, 0.5);
        engine.set_modulation(ParameterId::FilterCutoff, 0.2);
        assert!((engine.get_parameter(ParameterId::FilterCutoff).unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn modulation_support_matches_parameter_declaration() {
        let engine = Engine::new(EngineType::Subtractive);
        for param in ParameterId::iter() {
            assert_eq!(engine.supports_parameter_modulation(param), engine.has_parameter(param));
        }
    }
}
