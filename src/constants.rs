//! Centralized constants for the groove engine.
//! Defaults here are the ones named explicitly at the system level; everything
//! else (ranges, per-module tunings) lives next to the code that uses it.

// Audio processing constants
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;
pub const DEFAULT_BLOCK_SIZE: u32 = 512;
pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const MAX_BUFFER_SIZE: usize = 2048;
pub const AUDIO_BLOCK_SIZE_FALLBACK: usize = 256;

// Memory allocation constants
pub const DEFAULT_MEMORY_SIZE: usize = 64 * 1024 * 1024; // 64MB

// Voice and track limits
pub const DEFAULT_MAX_VOICES: usize = 32;
pub const MAX_TRACKS: usize = 8;
pub const MAX_STEPS_PER_TRACK: usize = 64;
pub const MAX_MOD_SLOTS: usize = 64;
pub const MAX_LFOS: usize = 8;
pub const MAX_ENV_FOLLOWERS: usize = 3;
pub const MAX_MACROS: usize = 4;
pub const MAX_CHAIN_LINKS_PER_PATTERN: usize = 8;
pub const MAX_VELOCITY_CHANNELS: usize = 16;
pub const MAX_LATCH_CHANNELS: usize = 16;
pub const CALIBRATION_SAMPLES_REQUIRED: u32 = 500;
pub const GHOST_SUPPRESSION_WINDOW_US: u64 = 2_000;
pub const MAX_LATCH_TIME_MS: f32 = 60_000.0;

// Thread priority
pub const DEFAULT_AUDIO_PRIORITY: u8 = 80;

// Engine parameter indices (ADSR/amp/pan block shared by every voice)
pub const ENGINE_PARAM_AMP: usize = 0;
pub const ENGINE_PARAM_PAN: usize = 1;
pub const ENGINE_PARAM_ATTACK: usize = 2;
pub const ENGINE_PARAM_DECAY: usize = 3;
pub const ENGINE_PARAM_SUSTAIN: usize = 4;
pub const ENGINE_PARAM_RELEASE: usize = 5;
pub const ENGINE_PARAM_DUR: usize = 6;
pub const ENGINE_PARAM_ATTACK_CURVE: usize = 7;
pub const ENGINE_PARAM_DECAY_CURVE: usize = 8;
pub const ENGINE_PARAM_RELEASE_CURVE: usize = 9;
pub const ENGINE_PARAM_COUNT: usize = 10;

pub const DEFAULT_AMP: f32 = 1.0;
pub const DEFAULT_PAN: f32 = 0.0;
pub const DEFAULT_ATTACK: f32 = 0.01;
pub const DEFAULT_DECAY: f32 = 0.1;
pub const DEFAULT_SUSTAIN: f32 = 0.7;
pub const DEFAULT_RELEASE: f32 = 0.3;
pub const DEFAULT_DURATION: f32 = 1.0;
pub const DEFAULT_CURVE: f32 = 0.5;

pub const AMP_MIN: f32 = 0.0;
pub const AMP_MAX: f32 = 2.0;
pub const PAN_MIN: f32 = -1.0;
pub const PAN_MAX: f32 = 1.0;
pub const ATTACK_MIN: f32 = 0.0005;
pub const ATTACK_MAX: f32 = 10.0;
pub const DECAY_MIN: f32 = 0.001;
pub const DECAY_MAX: f32 = 10.0;
pub const SUSTAIN_MIN: f32 = 0.0;
pub const SUSTAIN_MAX: f32 = 1.0;
pub const RELEASE_MIN: f32 = 0.001;
pub const RELEASE_MAX: f32 = 10.0;
pub const CURVE_MIN: f32 = 0.0;
pub const CURVE_MAX: f32 = 1.0;

// Voice manager
pub const VOICE_DEACTIVATE_EPSILON: f32 = 1e-3;
pub const VOICE_MIX_BASE_GAIN: f32 = 0.8;

// Modulation fabric
pub const MOD_UPDATE_RATE_HZ: f32 = 1000.0;
pub const MOD_RANDOM_SUBDIVISION_MS: f32 = 100.0;

// Sequencer
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;
pub const DEFAULT_SWING: f32 = 0.5;

// Spectrum analyzer
pub const FFT_SIZE: usize = 1024;
pub const SPECTRUM_BINS: usize = 512;
pub const BARK_BANDS: usize = 24;
pub const DISPLAY_BARS: usize = 32;
pub const ANALYZER_ACTIVITY_THRESHOLD: f32 = 1e-10;

// Master EQ
pub const EQ_BAND_COUNT: usize = 7;
pub const EQ_AUTO_GAIN_SAMPLE_COUNT: usize = 10;

// Reverb (exact spec tunings, milliseconds)
pub const REVERB_COMB_MS_L: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
pub const REVERB_COMB_MS_R: [f32; 4] = [30.5, 36.4, 40.8, 42.9];
pub const REVERB_COMB_FEEDBACK: f32 = 0.85;
pub const REVERB_ALLPASS_MS: [f32; 2] = [5.0, 1.7];
pub const REVERB_ALLPASS_FEEDBACK: f32 = 0.7;
pub const REVERB_MAX_COMB_SAMPLES: usize = 2048; // bounds the const-generic delay lines
pub const REVERB_MAX_ALLPASS_SAMPLES: usize = 256;

// Shimmer
pub const SHIMMER_GRAIN_COUNT: usize = 6;
pub const SHIMMER_GRAIN_SIZE: usize = 2048;
pub const SHIMMER_PITCH_SEMITONES: f32 = 7.0;
pub const SHIMMER_DETUNE_CENTS: f32 = 3.0;
pub const SHIMMER_WET_THRESHOLD: f32 = 0.4;
pub const SHIMMER_WET_SCALE: f32 = 0.15;

// CLI / control surface
pub const CONTROL_QUEUE_CAPACITY: usize = 4096;
pub const TELEMETRY_QUEUE_CAPACITY: usize = 1024;
pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL_INIT: i32 = 1;
pub const EXIT_AUDIO_DEVICE_UNAVAILABLE: i32 = 2;
