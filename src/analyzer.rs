//! Real-time spectrum analyzer: a rolling FFT over the master output feeds a
//! double-buffered [`AnalyzerSnapshot`] that the control thread can read
//! without ever blocking the audio thread.
//!
//! The analysis window is precomputed once and never reallocated per block,
//! and every buffer here is sized at compile time from [`crate::constants`]
//! in keeping with the fixed-capacity-array discipline used throughout the
//! audio path.

use crate::constants::{
    ANALYZER_ACTIVITY_THRESHOLD, BARK_BANDS, DISPLAY_BARS, FFT_SIZE, SPECTRUM_BINS,
};
use crate::modules::Frame;
use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One analyzed block: magnitude spectrum plus the derived scalar features
/// spec'd for the analyzer. Plain `Copy`-able floats only, so a snapshot can
/// be cloned out of the double buffer without allocating.
#[derive(Clone, Copy)]
pub struct SpectrumFrame {
    pub magnitudes: [f32; SPECTRUM_BINS],
    pub bark_bands: [f32; BARK_BANDS],
    pub display_bars: [f32; DISPLAY_BARS],
    pub spectral_centroid: f32,
    pub spectral_spread: f32,
    pub rolloff: f32,
    pub flux: f32,
    pub fundamental_hz: f32,
    pub rms: f32,
    pub peak: f32,
    pub bass_energy: f32,
    pub mid_energy: f32,
    pub high_energy: f32,
    pub low_mid_ratio: f32,
    pub high_mid_ratio: f32,
    pub total_energy: f32,
    pub has_activity: bool,
    pub processing_load: f32,
}

impl Default for SpectrumFrame {
    fn default() -> Self {
        Self {
            magnitudes: [0.0; SPECTRUM_BINS],
            bark_bands: [0.0; BARK_BANDS],
            display_bars: [0.0; DISPLAY_BARS],
            spectral_centroid: 0.0,
            spectral_spread: 0.0,
            rolloff: 0.0,
            flux: 0.0,
            fundamental_hz: 0.0,
            rms: 0.0,
            peak: 0.0,
            bass_energy: 0.0,
            mid_energy: 0.0,
            high_energy: 0.0,
            low_mid_ratio: 0.0,
            high_mid_ratio: 0.0,
            total_energy: 0.0,
            has_activity: false,
            processing_load: 0.0,
        }
    }
}

/// Coarse, best-effort musical features derived from a [`SpectrumFrame`].
/// None of these claim to be a reference-quality classifier; they exist so a
/// UI or a modulation source can react to "is something playing" / "is this
/// percussive" without re-deriving spectral math itself.
#[derive(Clone, Copy, Default)]
pub struct AudioFeatures {
    pub has_kick: bool,
    pub has_snare: bool,
    pub has_hihat: bool,
    pub has_bass: bool,
    pub has_vocals: bool,
    pub is_percussive: bool,
    pub is_melodic: bool,
    pub is_noisy: bool,
    pub tempo_bpm: f32,
    pub key: Option<u8>,
    pub rhythm_strength: f32,
    pub harmonicity: f32,
}

#[derive(Clone, Copy, Default)]
pub struct AnalyzerSnapshot {
    pub spectrum: SpectrumFrame,
    pub features: AudioFeatures,
}

/// Lock-free double buffer: the audio thread writes into the back slot and
/// flips `front` with `Release`; any reader loads `front` with `Acquire` and
/// clones the slot it names. A reader racing a flip still gets a complete,
/// self-consistent frame (either the previous or the just-published one)
/// because writers never touch the slot a reader could be pointing at.
pub struct SnapshotBuffer {
    slots: [UnsafeCell<AnalyzerSnapshot>; 2],
    front: AtomicUsize,
}

unsafe impl Sync for SnapshotBuffer {}

impl SnapshotBuffer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: [UnsafeCell::new(AnalyzerSnapshot::default()), UnsafeCell::new(AnalyzerSnapshot::default())],
            front: AtomicUsize::new(0),
        })
    }

    /// Audio-thread only: writes a fresh snapshot into the back slot, then
    /// publishes it by flipping the front index.
    fn publish(&self, snapshot: AnalyzerSnapshot) {
        let back = 1 - self.front.load(Ordering::Acquire);
        unsafe { *self.slots[back].get() = snapshot };
        self.front.store(back, Ordering::Release);
    }

    /// Safe to call from any thread.
    pub fn read(&self) -> AnalyzerSnapshot {
        let front = self.front.load(Ordering::Acquire);
        unsafe { *self.slots[front].get() }
    }
}

fn hz_to_bark(hz: f32) -> f32 {
    13.0 * (0.00076 * hz).atan() + 3.5 * (hz / 7500.0).powi(2).atan()
}

/// Rolling FFT analyzer fed one audio block at a time from the master bus.
pub struct SpectrumAnalyzer {
    ring: [f32; FFT_SIZE],
    ring_pos: usize,
    window: [f32; FFT_SIZE],
    fft: Arc<dyn RealToComplex<f32>>,
    fft_input: Vec<f32>,
    fft_output: Vec<Complex32>,
    smoothed_mags: [f32; SPECTRUM_BINS],
    prev_mags: [f32; SPECTRUM_BINS],
    smoothing: f32,
    sample_rate: f32,
    bark_band_of_bin: [usize; SPECTRUM_BINS],
    bar_range_of_bin: [usize; SPECTRUM_BINS],
    snapshot: Arc<SnapshotBuffer>,
    onset_history: [u64; 8],
    onset_count: usize,
    samples_seen: u64,
    running_flux_avg: f32,
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let fft_input = fft.make_input_vec();
        let fft_output = fft.make_output_vec();

        let mut window = [0.0f32; FFT_SIZE];
        for (i, w) in window.iter_mut().enumerate() {
            *w = 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (FFT_SIZE - 1) as f32).cos();
        }

        let mut analyzer = Self {
            ring: [0.0; FFT_SIZE],
            ring_pos: 0,
            window,
            fft,
            fft_input,
            fft_output,
            smoothed_mags: [0.0; SPECTRUM_BINS],
            prev_mags: [0.0; SPECTRUM_BINS],
            smoothing: 0.3,
            sample_rate,
            bark_band_of_bin: [0; SPECTRUM_BINS],
            bar_range_of_bin: [0; SPECTRUM_BINS],
            snapshot: SnapshotBuffer::new(),
            onset_history: [0; 8],
            onset_count: 0,
            samples_seen: 0,
            running_flux_avg: 0.0,
        };
        analyzer.rebuild_bin_maps();
        analyzer
    }

    /// A cheap, clonable handle for a UI or telemetry thread to poll.
    pub fn snapshot_handle(&self) -> Arc<SnapshotBuffer> {
        Arc::clone(&self.snapshot)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if (self.sample_rate - sample_rate).abs() > f32::EPSILON {
            self.sample_rate = sample_rate;
            self.rebuild_bin_maps();
        }
    }

    fn bin_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / FFT_SIZE as f32
    }

    fn rebuild_bin_maps(&mut self) {
        for bin in 0..SPECTRUM_BINS {
            let hz = self.bin_hz(bin);
            let band = (hz_to_bark(hz).floor() as usize).min(BARK_BANDS - 1);
            self.bark_band_of_bin[bin] = band;

            // Logarithmic 20Hz-20kHz remap into DISPLAY_BARS buckets.
            let ratio = (hz.max(20.0) / 20.0).ln() / (20_000.0f32 / 20.0).ln();
            let bar = ((ratio * DISPLAY_BARS as f32) as usize).min(DISPLAY_BARS - 1);
            self.bar_range_of_bin[bin] = bar;
        }
    }

    /// Feeds one audio block (post master-bus, pre output) into the rolling
    /// window, and republishes the analyzer snapshot if a frame's worth of
    /// new data has accumulated.
    pub fn process_audio_buffer(&mut self, block: &[Frame]) {
        let start = std::time::Instant::now();

        for frame in block {
            self.ring[self.ring_pos] = (frame.left + frame.right) * 0.5;
            self.ring_pos = (self.ring_pos + 1) % FFT_SIZE;
        }
        self.samples_seen += block.len() as u64;

        // Read the ring out in chronological order and window it.
        for i in 0..FFT_SIZE {
            let idx = (self.ring_pos + i) % FFT_SIZE;
            self.fft_input[i] = self.ring[idx] * self.window[i];
        }

        let _ = self.fft.process(&mut self.fft_input, &mut self.fft_output);

        let mut time_peak = 0.0f32;
        let mut time_sum_sq = 0.0f32;
        for s in &self.ring {
            time_peak = time_peak.max(s.abs());
            time_sum_sq += s * s;
        }
        let _time_rms = (time_sum_sq / FFT_SIZE as f32).sqrt();

        self.prev_mags.copy_from_slice(&self.smoothed_mags);
        for bin in 0..SPECTRUM_BINS {
            let mag = self.fft_output[bin].norm() * 2.0 / FFT_SIZE as f32;
            self.smoothed_mags[bin] += (mag - self.smoothed_mags[bin]) * self.smoothing;
        }

        let spectrum = self.derive_spectrum_frame(time_peak);
        let features = self.derive_features(&spectrum);

        let elapsed = start.elapsed().as_secs_f32();
        let buffer_seconds = block.len() as f32 / self.sample_rate.max(1.0);
        let processing_load = if buffer_seconds > 0.0 { elapsed / buffer_seconds } else { 0.0 };

        let mut spectrum = spectrum;
        spectrum.processing_load = processing_load;
        self.snapshot.publish(AnalyzerSnapshot { spectrum, features });
    }

    fn derive_spectrum_frame(&self, time_peak: f32) -> SpectrumFrame {
        let mags = &self.smoothed_mags;

        let mut weighted_hz = 0.0f32;
        let mut mag_sum = 0.0f32;
        let mut total_energy = 0.0f32;
        let mut peak = 0.0f32;
        let (mut bass, mut mid, mut high) = (0.0f32, 0.0f32, 0.0f32);

        for bin in 0..SPECTRUM_BINS {
            let hz = self.bin_hz(bin);
            let m = mags[bin];
            weighted_hz += hz * m;
            mag_sum += m;
            total_energy += m * m;
            peak = peak.max(m);

            match hz {
                h if h < 250.0 => bass += m * m,
                h if h < 4000.0 => mid += m * m,
                _ => high += m * m,
            }
        }

        let centroid = if mag_sum > 1e-9 { weighted_hz / mag_sum } else { 0.0 };

        let mut spread_acc = 0.0f32;
        for bin in 0..SPECTRUM_BINS {
            let hz = self.bin_hz(bin);
            spread_acc += mags[bin] * (hz - centroid).powi(2);
        }
        let spread = if mag_sum > 1e-9 { (spread_acc / mag_sum).sqrt() } else { 0.0 };

        let rolloff_target = total_energy * 0.95;
        let mut cumulative = 0.0f32;
        let mut rolloff_bin = SPECTRUM_BINS - 1;
        for bin in 0..SPECTRUM_BINS {
            cumulative += mags[bin] * mags[bin];
            if cumulative >= rolloff_target {
                rolloff_bin = bin;
                break;
            }
        }
        let rolloff = self.bin_hz(rolloff_bin);

        let mut flux = 0.0f32;
        for bin in 0..SPECTRUM_BINS {
            flux += (mags[bin] - self.prev_mags[bin]).abs();
        }

        let fundamental_bin = (1..SPECTRUM_BINS)
            .filter(|&b| {
                let hz = self.bin_hz(b);
                (40.0..2000.0).contains(&hz)
            })
            .max_by(|&a, &b| mags[a].partial_cmp(&mags[b]).unwrap())
            .unwrap_or(0);
        let fundamental_hz = self.bin_hz(fundamental_bin);

        let mut bark_bands = [0.0f32; BARK_BANDS];
        let mut bark_counts = [0u32; BARK_BANDS];
        for bin in 0..SPECTRUM_BINS {
            let band = self.bark_band_of_bin[bin];
            bark_bands[band] += mags[bin];
            bark_counts[band] += 1;
        }
        for band in 0..BARK_BANDS {
            if bark_counts[band] > 0 {
                bark_bands[band] /= bark_counts[band] as f32;
            }
        }

        let mut display_bars = [0.0f32; DISPLAY_BARS];
        let mut bar_counts = [0u32; DISPLAY_BARS];
        for bin in 0..SPECTRUM_BINS {
            let bar = self.bar_range_of_bin[bin];
            display_bars[bar] += mags[bin];
            bar_counts[bar] += 1;
        }
        for bar in 0..DISPLAY_BARS {
            if bar_counts[bar] > 0 {
                display_bars[bar] /= bar_counts[bar] as f32;
            }
        }

        let rms = (total_energy / SPECTRUM_BINS as f32).sqrt();

        SpectrumFrame {
            magnitudes: *mags,
            bark_bands,
            display_bars,
            spectral_centroid: centroid,
            spectral_spread: spread,
            rolloff,
            flux,
            fundamental_hz,
            rms,
            peak: peak.max(time_peak),
            bass_energy: bass,
            mid_energy: mid,
            high_energy: high,
            low_mid_ratio: if mid > 1e-9 { bass / mid } else { 0.0 },
            high_mid_ratio: if mid > 1e-9 { high / mid } else { 0.0 },
            total_energy,
            has_activity: total_energy > ANALYZER_ACTIVITY_THRESHOLD,
            processing_load: 0.0,
        }
    }

    fn derive_features(&mut self, spectrum: &SpectrumFrame) -> AudioFeatures {
        // Spectral flatness: geometric mean over arithmetic mean of the
        // magnitude spectrum, in the log domain to avoid underflow.
        let mut log_sum = 0.0f32;
        let mut lin_sum = 0.0f32;
        for &m in &spectrum.magnitudes {
            log_sum += (m + 1e-9).ln();
            lin_sum += m;
        }
        let geo_mean = (log_sum / SPECTRUM_BINS as f32).exp();
        let arith_mean = (lin_sum / SPECTRUM_BINS as f32).max(1e-9);
        let flatness = geo_mean / arith_mean;

        let fundamental_bin = ((spectrum.fundamental_hz * FFT_SIZE as f32 / self.sample_rate.max(1.0)) as usize)
            .max(1)
            .min(SPECTRUM_BINS - 1);
        let mut harmonic_energy = 0.0f32;
        for h in 1..=6 {
            let bin = fundamental_bin * h;
            if bin < SPECTRUM_BINS {
                harmonic_energy += spectrum.magnitudes[bin].powi(2);
            }
        }
        let harmonicity = if spectrum.total_energy > 1e-9 { (harmonic_energy / spectrum.total_energy).min(1.0) } else { 0.0 };

        // Onset detection: a flux spike well above its own running average,
        // spaced at least ~100ms apart, feeds a ring of recent onset times
        // used to estimate tempo from the median inter-onset interval.
        self.running_flux_avg += (spectrum.flux - self.running_flux_avg) * 0.05;
        let is_onset = spectrum.flux > self.running_flux_avg * 1.8 + 1e-4;
        let min_gap_samples = (0.1 * self.sample_rate) as u64;
        let last_onset = self.onset_history[(self.onset_count + 7) % 8];
        if is_onset && (self.onset_count == 0 || self.samples_seen.saturating_sub(last_onset) > min_gap_samples) {
            self.onset_history[self.onset_count % 8] = self.samples_seen;
            self.onset_count += 1;
        }

        let tempo_bpm = if self.onset_count >= 3 {
            let n = self.onset_count.min(8);
            let mut intervals = [0u64; 7];
            let mut count = 0usize;
            for i in 1..n {
                let a = self.onset_history[(self.onset_count + 8 - n + i) % 8];
                let b = self.onset_history[(self.onset_count + 8 - n + i - 1) % 8];
                let d = a.saturating_sub(b);
                if d > 0 {
                    intervals[count] = d;
                    count += 1;
                }
            }
            if count == 0 {
                120.0
            } else {
                intervals[..count].sort_unstable();
                let median = intervals[count / 2] as f32 / self.sample_rate.max(1.0);
                (60.0 / median.max(0.01)).clamp(60.0, 200.0)
            }
        } else {
            120.0
        };

        AudioFeatures {
            has_kick: spectrum.bass_energy / spectrum.total_energy.max(1e-9) > 0.45 && spectrum.has_activity,
            has_snare: spectrum.flux > self.running_flux_avg * 1.5 && spectrum.mid_energy > spectrum.bass_energy,
            has_hihat: spectrum.high_energy / spectrum.total_energy.max(1e-9) > 0.35,
            has_bass: spectrum.bass_energy > ANALYZER_ACTIVITY_THRESHOLD * 10.0,
            has_vocals: (300.0..3000.0).contains(&spectrum.spectral_centroid) && harmonicity > 0.3,
            is_percussive: is_onset,
            is_melodic: harmonicity > 0.5,
            is_noisy: flatness > 0.6,
            tempo_bpm,
            key: None,
            rhythm_strength: (self.running_flux_avg * 50.0).min(1.0),
            harmonicity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_reports_no_activity() {
        let mut analyzer = SpectrumAnalyzer::new(48000.0);
        let block = [Frame::ZERO; 512];
        analyzer.process_audio_buffer(&block);
        let snap = analyzer.snapshot_handle().read();
        assert!(!snap.spectrum.has_activity);
    }

    #[test]
    fn a_sine_tone_reports_activity_and_a_plausible_centroid() {
        let mut analyzer = SpectrumAnalyzer::new(48000.0);
        let freq = 440.0f32;
        let mut phase = 0.0f32;
        for _ in 0..8 {
            let mut block = [Frame::ZERO; 512];
            for f in block.iter_mut() {
                let s = (phase * 2.0 * std::f32::consts::PI).sin() * 0.5;
                *f = Frame::mono(s);
                phase += freq / 48000.0;
                phase = phase.fract();
            }
            analyzer.process_audio_buffer(&block);
        }
        let snap = analyzer.snapshot_handle().read();
        assert!(snap.spectrum.has_activity);
        assert!(snap.spectrum.spectral_centroid > 0.0);
    }

    #[test]
    fn bark_bands_and_display_bars_cover_every_bin() {
        let analyzer = SpectrumAnalyzer::new(48000.0);
        for band in analyzer.bark_band_of_bin {
            assert!(band < BARK_BANDS);
        }
        for bar in analyzer.bar_range_of_bin {
            assert!(bar < DISPLAY_BARS);
        }
    }
}
