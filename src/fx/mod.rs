//! Effects: the optional per-track tail (chorus/filter/drive) and the
//! always-present, fixed-order master bus.
//!
//! Each effect is a stateful stream processor built on `crate::dsp`'s
//! primitives rather than duplicating delay-line/filter code locally.

pub mod chorus;
pub mod compressor;
pub mod drive;
pub mod eq;
pub mod master;
pub mod reverb;
pub mod shimmer;
pub mod tilt;

pub use chorus::{Chorus, ChorusVariant};
pub use compressor::Compressor;
pub use drive::Drive;
pub use eq::{BandConfig, ParametricEq};
pub use master::MasterChain;
pub use reverb::Reverb;
pub use shimmer::Shimmer;
pub use tilt::TiltEq;

use crate::dsp::{FilterType, StereoBiquadFilter};
use crate::modules::Frame;

/// Optional per-track effect tail: chorus, then a general-purpose filter,
/// then drive. Any stage left `None` is a no-op pass-through.
pub struct PerTrackChain {
    pub chorus: Option<Chorus>,
    filter: Option<StereoBiquadFilter>,
    filter_type: FilterType,
    filter_freq_hz: f32,
    filter_q: f32,
    pub drive: Option<Drive>,
    sample_rate: f32,
}

impl PerTrackChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            chorus: None,
            filter: None,
            filter_type: FilterType::LowPass,
            filter_freq_hz: 20_000.0,
            filter_q: 0.707,
            drive: None,
            sample_rate,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        if let Some(chorus) = &mut self.chorus {
            chorus.set_sample_rate(sample_rate);
        }
        if self.filter.is_some() {
            self.rebuild_filter();
        }
    }

    pub fn enable_chorus(&mut self, enabled: bool) {
        self.chorus = if enabled { Some(Chorus::new(self.sample_rate)) } else { None };
    }

    pub fn enable_drive(&mut self, enabled: bool) {
        self.drive = if enabled { Some(Drive::new()) } else { None };
    }

    pub fn enable_filter(&mut self, enabled: bool) {
        if enabled {
            self.filter = Some(StereoBiquadFilter::new());
            self.rebuild_filter();
        } else {
            self.filter = None;
        }
    }

    pub fn set_filter_params(&mut self, filter_type: FilterType, freq_hz: f32, q: f32) {
        self.filter_type = filter_type;
        self.filter_freq_hz = freq_hz;
        self.filter_q = q;
        if self.filter.is_some() {
            self.rebuild_filter();
        }
    }

    fn rebuild_filter(&mut self) {
        if let Some(filter) = &mut self.filter {
            filter.set_filter(self.filter_type, self.filter_freq_hz, self.filter_q, 0.0, self.sample_rate);
        }
    }

    pub fn process_block(&mut self, buffer: &mut [Frame]) {
        for frame in buffer.iter_mut() {
            let mut l = frame.left;
            let mut r = frame.right;

            if let Some(chorus) = &mut self.chorus {
                let (nl, nr) = chorus.process(l, r);
                l = nl;
                r = nr;
            }
            if let Some(filter) = &mut self.filter {
                let (nl, nr) = filter.process(l, r);
                l = nl;
                r = nr;
            }
            if let Some(drive) = &self.drive {
                let (nl, nr) = drive.process(l, r);
                l = nl;
                r = nr;
            }

            frame.left = l;
            frame.right = r;
        }
    }
}
