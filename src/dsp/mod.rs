pub mod adsr;
pub mod biquad;
pub mod dc_blocker;
pub mod moog_ladder;
pub mod one_pole;
pub mod peak_follower;
pub mod smoothed_parameter;

pub mod math;
/// High-performance DSP utilities for oscillators and effects
pub mod oscillators;
pub mod polyblep;
pub mod tables;
pub mod wavetables;

pub mod all_pass_filter;
pub mod comb_filter;
/// Reverb DSP components
pub mod delay_line;
pub mod interpolating_delay;

/// DSP components for effects
pub mod feedback_delay;

pub use all_pass_filter::AllPassFilter;
pub use biquad::{BiquadFilter, FilterType, StereoBiquadFilter};
pub use comb_filter::CombFilter;
pub use delay_line::DelayLine;
pub use interpolating_delay::InterpolatingDelay;
pub use math::*;
pub use moog_ladder::{MoogLadder, StereoMoogLadder};
pub use one_pole::OnePole;
pub use oscillators::*;
pub use peak_follower::PeakFollower;
pub use polyblep::*;
pub use smoothed_parameter::SmoothedParameter;
pub use tables::{SineTable, get_sine_table, table_cos, table_sin};
pub use wavetables::*;
