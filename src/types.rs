//! Core type definitions shared across the engine: identifiers, the engine's
//! fixed parameter vocabulary, and the error/status/message types used at the
//! control <-> audio boundary.

use std::cmp::Ordering;

/// Unique identifier for a voice instance in the audio engine.
pub type VoiceId = u32;

/// Identifier for one of the fixed tracks (0..MAX_TRACKS).
pub type TrackId = u8;

/// Time-scheduled message wrapper for deferred execution of engine commands,
/// ordered so a `BinaryHeap<ScheduledMessage>` pops the earliest due time first.
#[derive(Debug)]
pub struct ScheduledMessage {
    pub due_time_ms: u64,
    pub message: EngineMessage,
}

impl PartialEq for ScheduledMessage {
    fn eq(&self, other: &Self) -> bool {
        self.due_time_ms == other.due_time_ms
    }
}

impl Eq for ScheduledMessage {}

impl PartialOrd for ScheduledMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due_time_ms.cmp(&self.due_time_ms)
    }
}

/// Every parameter an engine can expose, named rather than stringly-typed so
/// the control path can validate and the modulation fabric can index densely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumCount, strum::EnumIter)]
pub enum ParameterId {
    Harmonics,
    Timbre,
    Morph,
    FilterCutoff,
    FilterResonance,
    FilterType,
    Attack,
    Decay,
    Sustain,
    Release,
    AttackCurve,
    DecayCurve,
    ReleaseCurve,
    Volume,
    Pan,
    Detune,
    OscMix,
    SubLevel,
    SubAnchor,
    LfoRate,
    LfoDepth,
}

impl ParameterId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterId::Harmonics => "harmonics",
            ParameterId::Timbre => "timbre",
            ParameterId::Morph => "morph",
            ParameterId::FilterCutoff => "filter_cutoff",
            ParameterId::FilterResonance => "filter_resonance",
            ParameterId::FilterType => "filter_type",
            ParameterId::Attack => "attack",
            ParameterId::Decay => "decay",
            ParameterId::Sustain => "sustain",
            ParameterId::Release => "release",
            ParameterId::AttackCurve => "attack_curve",
            ParameterId::DecayCurve => "decay_curve",
            ParameterId::ReleaseCurve => "release_curve",
            ParameterId::Volume => "volume",
            ParameterId::Pan => "pan",
            ParameterId::Detune => "detune",
            ParameterId::OscMix => "osc_mix",
            ParameterId::SubLevel => "sub_level",
            ParameterId::SubAnchor => "sub_anchor",
            ParameterId::LfoRate => "lfo_rate",
            ParameterId::LfoDepth => "lfo_depth",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        ParameterId::iter().find(|p| p.as_str() == name)
    }

    /// The canonical base value a track starts with before any explicit
    /// `set_parameter` or modulation is applied. Used as the "user-set base
    /// value" §4.4's modulation fabric composes additively on top of.
    pub fn default_value(&self) -> f32 {
        match self {
            ParameterId::Harmonics | ParameterId::Timbre | ParameterId::Morph => 0.5,
            ParameterId::FilterCutoff => 1.0,
            ParameterId::FilterResonance => 0.0,
            ParameterId::FilterType => 0.0,
            ParameterId::Attack => crate::constants::DEFAULT_ATTACK,
            ParameterId::Decay => crate::constants::DEFAULT_DECAY,
            ParameterId::Sustain => crate::constants::DEFAULT_SUSTAIN,
            ParameterId::Release => crate::constants::DEFAULT_RELEASE,
            ParameterId::AttackCurve | ParameterId::DecayCurve | ParameterId::ReleaseCurve => {
                crate::constants::DEFAULT_CURVE
            }
            ParameterId::Volume => crate::constants::DEFAULT_AMP,
            ParameterId::Pan => crate::constants::DEFAULT_PAN,
            ParameterId::Detune => 0.0,
            ParameterId::OscMix => 0.5,
            ParameterId::SubLevel => 0.0,
            ParameterId::SubAnchor => 0.0,
            ParameterId::LfoRate => 0.5,
            ParameterId::LfoDepth => 0.5,
        }
    }
}

/// Errors surfaced to the control layer. Never unwound through the audio
/// thread; the audio thread only ever reports these via [`EngineStatusMessage`].
#[derive(Debug, Clone)]
pub enum EngineError {
    UnknownEngine { name: String },
    InvalidTrack { track_id: TrackId },
    InvalidVoice { voice_id: VoiceId },
    UnknownParameter { param: String, engine: &'static str },
    ParameterOutOfRange { param: String, value: f32, min: f32, max: f32 },
    InvalidPatternIndex { index: usize },
    InvalidStepIndex { step: usize },
    AudioDeviceError { reason: String },
    PresetIoError { path: String, reason: String },
    PresetFormatError { reason: String },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownEngine { name } => write!(f, "unknown engine '{name}'"),
            EngineError::InvalidTrack { track_id } => write!(f, "invalid track {track_id}"),
            EngineError::InvalidVoice { voice_id } => write!(f, "invalid voice {voice_id}"),
            EngineError::UnknownParameter { param, engine } => {
                write!(f, "engine '{engine}' has no parameter '{param}'")
            }
            EngineError::ParameterOutOfRange { param, value, min, max } => write!(
                f,
                "parameter '{param}' value {value} out of range [{min}, {max}]"
            ),
            EngineError::InvalidPatternIndex { index } => write!(f, "invalid pattern index {index}"),
            EngineError::InvalidStepIndex { step } => write!(f, "invalid step index {step}"),
            EngineError::AudioDeviceError { reason } => write!(f, "audio device error: {reason}"),
            EngineError::PresetIoError { path, reason } => {
                write!(f, "failed to access preset '{path}': {reason}")
            }
            EngineError::PresetFormatError { reason } => write!(f, "malformed preset data: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Status messages drained from the engine's telemetry queue by whatever UI
/// or logging layer is attached; never blocks the audio thread.
#[derive(Debug, Clone)]
pub enum EngineStatusMessage {
    Error(EngineError),
    Warning(String),
    Info(String),
    Debug(String),
}

/// Emits a status message through `$tx` without blocking if the queue is full.
/// Telemetry is best-effort from the audio thread's perspective.
#[macro_export]
macro_rules! rt_status {
    ($tx:expr, $variant:ident, $($arg:tt)*) => {
        let _ = $tx.try_send($crate::types::EngineStatusMessage::$variant(format!($($arg)*)));
    };
}

/// Commands that mutate engine state outside of the hot per-sample path:
/// engine/pattern edits, presets, transport. These cross the control->audio
/// boundary over a bounded SPSC channel; never carries heap-erased payloads.
#[derive(Debug)]
pub enum EngineMessage {
    Stop,
    Panic,
}
