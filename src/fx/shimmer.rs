//! Granular shimmer: a bank of overlapping grains reads the reverb tail at a
//! pitched-up rate (+7 semitones, alternating grains detuned a few cents
//! either way) and crossfades with a Hann-squared window, giving the classic
//! "shimmer" octave-up wash. Only engages once the reverb wet level clears
//! [`crate::constants::SHIMMER_WET_THRESHOLD`].
//!
//! Built on `dsp::interpolating_delay::InterpolatingDelay` for the
//! fractional-rate grain read, with the grain bank itself following
//! `modulation`'s pattern of a fixed-size array of independent
//! oscillator-like state machines.

use crate::constants::{SHIMMER_DETUNE_CENTS, SHIMMER_GRAIN_COUNT, SHIMMER_GRAIN_SIZE, SHIMMER_PITCH_SEMITONES, SHIMMER_WET_SCALE, SHIMMER_WET_THRESHOLD};
use crate::dsp::InterpolatingDelay;

const SOURCE_BUFFER_SAMPLES: usize = SHIMMER_GRAIN_SIZE * 2;

#[derive(Clone, Copy)]
struct Grain {
    read_pos: f32,
    progress: f32,
    active: bool,
    detune_sign: f32,
}

pub struct Shimmer {
    source_l: InterpolatingDelay<SOURCE_BUFFER_SAMPLES>,
    source_r: InterpolatingDelay<SOURCE_BUFFER_SAMPLES>,
    grains: [Grain; SHIMMER_GRAIN_COUNT],
    samples_until_next_grain: usize,
    write_counter: f32,
}

fn hann_squared(progress: f32) -> f32 {
    (std::f32::consts::PI * progress).sin().powi(2)
}

impl Shimmer {
    pub fn new() -> Self {
        let hop = SHIMMER_GRAIN_SIZE / 2;
        Self {
            source_l: InterpolatingDelay::new(),
            source_r: InterpolatingDelay::new(),
            grains: std::array::from_fn(|i| Grain {
                read_pos: 0.0,
                progress: 1.0, // idle until triggered
                active: false,
                detune_sign: if i % 2 == 0 { 1.0 } else { -1.0 },
            }),
            samples_until_next_grain: hop,
            write_counter: 0.0,
        }
    }

    fn pitch_ratio(detune_sign: f32) -> f32 {
        let cents = SHIMMER_PITCH_SEMITONES * 100.0 + detune_sign * SHIMMER_DETUNE_CENTS;
        2f32.powf(cents / 1200.0)
    }

    /// Feeds the reverb tail in and returns the shimmer wash, already scaled
    /// by [`SHIMMER_WET_SCALE`]; callers add it into the wet bus themselves.
    /// Silent (and cheap) when `wet <= SHIMMER_WET_THRESHOLD`.
    pub fn process(&mut self, tail_l: f32, tail_r: f32, wet: f32) -> (f32, f32) {
        self.source_l.write(tail_l);
        self.source_r.write(tail_r);
        self.write_counter += 1.0;

        if wet <= SHIMMER_WET_THRESHOLD {
            return (0.0, 0.0);
        }

        let hop = SHIMMER_GRAIN_SIZE / 2;
        if self.samples_until_next_grain == 0 {
            self.samples_until_next_grain = hop;
            if let Some(slot) = self.grains.iter_mut().find(|g| !g.active) {
                slot.active = true;
                slot.progress = 0.0;
                slot.read_pos = 0.0;
            }
        } else {
            self.samples_until_next_grain -= 1;
        }

        let mut out_l = 0.0f32;
        let mut out_r = 0.0f32;
        for grain in &mut self.grains {
            if !grain.active {
                continue;
            }
            let window = hann_squared(grain.progress);
            let delay_samples = grain.read_pos.clamp(1.0, (SOURCE_BUFFER_SAMPLES - 1) as f32);
            out_l += self.source_l.read_interpolated(delay_samples) * window;
            out_r += self.source_r.read_interpolated(delay_samples) * window;

            grain.read_pos += Self::pitch_ratio(grain.detune_sign);
            grain.progress += 1.0 / SHIMMER_GRAIN_SIZE as f32;
            if grain.progress >= 1.0 {
                grain.active = false;
            }
        }

        let scale = ((wet - SHIMMER_WET_THRESHOLD).max(0.0) / (1.0 - SHIMMER_WET_THRESHOLD)) * SHIMMER_WET_SCALE;
        (out_l * scale, out_r * scale)
    }
}

impl Default for Shimmer {
    fn default() -> Self {
        Self::new()
    }
}
