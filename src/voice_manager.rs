//! Fixed-capacity polyphony: `MAX_VOICES` voice slots allocated by a
//! monotonic counter, stolen oldest-first when the pool is full, and mixed
//! down with headroom that shrinks as more voices sound.
//!
//! Slots are indices into a fixed array, never a raw pointer, and stealing
//! never aliases: the stolen voice is released in place before being reused.

use crate::constants::{DEFAULT_MAX_VOICES, MAX_BUFFER_SIZE, MAX_TRACKS};
use crate::engines::EngineType;
use crate::modules::Frame;
use crate::modulation::ModulationMatrix;
use crate::types::{ParameterId, TrackId, VoiceId};
use crate::voice::Voice;
use strum::{EnumCount, IntoEnumIterator};

/// Below this RMS-ish peak, a releasing voice is considered silent and is
/// deactivated even if its envelope hasn't reported `is_finished()` yet
/// (e.g. a synthesis engine with its own long internal tail).
const SILENCE_EPSILON: f32 = 1e-3;

const NUM_PARAMS: usize = <ParameterId as EnumCount>::COUNT;

fn default_track_params() -> [f32; NUM_PARAMS] {
    let mut values = [0.0f32; NUM_PARAMS];
    for (i, param) in ParameterId::iter().enumerate() {
        values[i] = param.default_value();
    }
    values
}

pub struct VoiceManager {
    voices: Vec<Voice>,
    next_allocation: u64,
    scratch: [Frame; MAX_BUFFER_SIZE],
    /// Per-track, per-parameter user-set base value (§4.3's broadcast
    /// `set_parameter`), applied to every voice allocated on that track and
    /// used as the base the modulation fabric composes on top of.
    track_params: [[f32; NUM_PARAMS]; MAX_TRACKS],
}

impl VoiceManager {
    pub fn new(max_voices: usize) -> Self {
        let max_voices = max_voices.max(1);
        let voices = (0..max_voices).map(|i| Voice::new(i as VoiceId, 0)).collect();
        Self {
            voices,
            next_allocation: 0,
            scratch: [Frame::ZERO; MAX_BUFFER_SIZE],
            track_params: std::array::from_fn(|_| default_track_params()),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MAX_VOICES)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active).count()
    }

    /// Finds a free slot, or steals the slot with the oldest
    /// `allocated_at` stamp if every slot is in use.
    fn find_slot(&mut self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.is_active) {
            return idx;
        }

        let mut oldest = 0usize;
        let mut oldest_stamp = u64::MAX;
        for (i, voice) in self.voices.iter().enumerate() {
            if voice.allocated_at < oldest_stamp {
                oldest_stamp = voice.allocated_at;
                oldest = i;
            }
        }
        self.voices[oldest].stop();
        oldest
    }

    /// Triggers a new note on `track`, stealing the oldest voice if the
    /// pool is exhausted. Returns the allocated voice's id.
    pub fn note_on(&mut self, track: TrackId, engine_type: EngineType, note: u8, velocity: f32, sample_rate: f32) -> VoiceId {
        let slot = self.find_slot();
        let allocated_at = self.next_allocation;
        self.next_allocation = self.next_allocation.wrapping_add(1);

        let voice = &mut self.voices[slot];
        voice.track_id = track;
        voice.set_engine(engine_type);
        if let Some(cache) = self.track_params.get(track as usize) {
            for (i, param) in ParameterId::iter().enumerate() {
                if voice.has_parameter(param) {
                    voice.set_parameter(param, cache[i]);
                }
            }
        }
        voice.trigger(note, velocity, sample_rate, allocated_at);
        voice.id
    }

    /// Broadcasts a user-set parameter change to every active voice on
    /// `track` and updates the cached base value new voices on that track
    /// inherit at the next `note_on`.
    pub fn set_parameter(&mut self, track: TrackId, param: ParameterId, value: f32) {
        if let Some(cache) = self.track_params.get_mut(track as usize) {
            cache[ParameterId::iter().position(|p| p == param).unwrap_or(0)] = value;
        }
        for voice in &mut self.voices {
            if voice.is_active && voice.track_id == track && voice.has_parameter(param) {
                voice.set_parameter(param, value);
            }
        }
    }

    /// Runs every parameter this track's active engine honors through the
    /// modulation fabric (base value from the cache, not the voice's live
    /// value, so contributions don't compound block over block) and pushes
    /// the result onto every active voice on that track.
    pub fn apply_modulation(&mut self, modulation: &mut ModulationMatrix) {
        for track in 0..MAX_TRACKS as TrackId {
            let cache = self.track_params[track as usize];
            for (i, param) in ParameterId::iter().enumerate() {
                let base = cache[i];
                let modulated = modulation.get_modulated_value(param, base);
                if (modulated - base).abs() < f32::EPSILON {
                    continue;
                }
                for voice in &mut self.voices {
                    if voice.is_active && voice.track_id == track && voice.has_parameter(param) {
                        voice.set_parameter(param, modulated);
                    }
                }
            }
        }
    }

    /// Releases every active voice on `track` playing `note` (gate off,
    /// envelope enters release).
    pub fn note_off(&mut self, track: TrackId, note: u8) {
        for voice in &mut self.voices {
            if voice.is_active && voice.track_id == track && voice.note == note {
                voice.release();
            }
        }
    }

    pub fn all_notes_off(&mut self, track: TrackId) {
        for voice in &mut self.voices {
            if voice.is_active && voice.track_id == track {
                voice.release();
            }
        }
    }

    pub fn emergency_stop(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    /// Renders every active voice into `output`, scaled down as polyphony
    /// grows (`0.8 / max(1, sqrt(active))`), and deactivates any voice whose
    /// last block stayed under [`SILENCE_EPSILON`].
    pub fn process(&mut self, output: &mut [Frame], sample_rate: f32) {
        let active = self.active_voice_count();
        if active == 0 {
            return;
        }
        let mixdown_gain = 0.8 / (active as f32).sqrt().max(1.0);
        let len = output.len().min(MAX_BUFFER_SIZE);

        for voice in &mut self.voices {
            if !voice.is_active {
                continue;
            }

            let scratch = &mut self.scratch[..len];
            scratch.fill(Frame::ZERO);
            voice.process(scratch, sample_rate);

            let mut peak = 0.0f32;
            for (out, s) in output[..len].iter_mut().zip(scratch.iter()) {
                out.left += s.left * mixdown_gain;
                out.right += s.right * mixdown_gain;
                peak = peak.max(s.left.abs()).max(s.right.abs());
            }

            if !voice.is_active {
                continue;
            }
            if peak < SILENCE_EPSILON {
                voice.stop();
            }
        }
    }

    pub fn voice_track(&self, voice_id: VoiceId) -> Option<TrackId> {
        self.voices.iter().find(|v| v.id == voice_id).map(|v| v.track_id)
    }

    /// Renders only the voices belonging to `track` into `output`, using the
    /// same pool-wide mixdown gain as [`Self::process`] (polyphony headroom
    /// is shared across every track, not per-track). Call once per track per
    /// block so every voice is still rendered exactly once.
    pub fn process_track(&mut self, track: TrackId, output: &mut [Frame], sample_rate: f32) {
        let active = self.active_voice_count();
        if active == 0 {
            return;
        }
        let mixdown_gain = 0.8 / (active as f32).sqrt().max(1.0);
        let len = output.len().min(MAX_BUFFER_SIZE);

        for voice in &mut self.voices {
            if !voice.is_active || voice.track_id != track {
                continue;
            }

            let scratch = &mut self.scratch[..len];
            scratch.fill(Frame::ZERO);
            voice.process(scratch, sample_rate);

            let mut peak = 0.0f32;
            for (out, s) in output[..len].iter_mut().zip(scratch.iter()) {
                out.left += s.left * mixdown_gain;
                out.right += s.right * mixdown_gain;
                peak = peak.max(s.left.abs()).max(s.right.abs());
            }

            if !voice.is_active {
                continue;
            }
            if peak < SILENCE_EPSILON {
                voice.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_activates_a_voice() {
        let mut vm = VoiceManager::new(4);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        assert_eq!(vm.active_voice_count(), 1);
    }

    #[test]
    fn exhausting_the_pool_steals_the_oldest_voice() {
        let mut vm = VoiceManager::new(2);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.note_on(0, EngineType::Subtractive, 64, 1.0, 48000.0);
        assert_eq!(vm.active_voice_count(), 2);

        // A third note-on must steal the first (oldest) voice rather than
        // grow the pool.
        vm.note_on(0, EngineType::Subtractive, 67, 1.0, 48000.0);
        assert_eq!(vm.voice_count(), 2);
        assert_eq!(vm.active_voice_count(), 2);
    }

    #[test]
    fn mixdown_gain_shrinks_as_polyphony_grows() {
        let mut vm = VoiceManager::new(4);
        for note in [60u8, 64, 67, 71] {
            vm.note_on(0, EngineType::Subtractive, note, 1.0, 48000.0);
        }
        let mut output = [Frame::ZERO; 32];
        vm.process(&mut output, 48000.0);
        let max_sample = output.iter().map(|f| f.left.abs().max(f.right.abs())).fold(0.0f32, f32::max);
        // Four full-scale voices summed at 0.8/sqrt(4) should stay well
        // under a single voice's raw peak.
        assert!(max_sample < 1.0);
    }

    #[test]
    fn all_notes_off_releases_only_the_given_track() {
        let mut vm = VoiceManager::new(4);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.note_on(1, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.all_notes_off(0);
        // Releasing starts the envelope release phase; voices stay active
        // until the tail finishes, so this just checks it doesn't panic and
        // leaves track 1 alone.
        assert_eq!(vm.active_voice_count(), 2);
    }

    #[test]
    fn set_parameter_reaches_an_already_active_voice() {
        let mut vm = VoiceManager::new(2);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.set_parameter(0, ParameterId::Release, 2.5);
        assert_eq!(vm.voices[0].get_parameter(ParameterId::Release), Some(2.5));
    }

    #[test]
    fn set_parameter_is_inherited_by_the_next_note_on() {
        let mut vm = VoiceManager::new(2);
        vm.set_parameter(0, ParameterId::Release, 2.5);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        assert_eq!(vm.voices[0].get_parameter(ParameterId::Release), Some(2.5));
    }

    #[test]
    fn set_parameter_on_one_track_leaves_another_track_alone() {
        let mut vm = VoiceManager::new(2);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.note_on(1, EngineType::Subtractive, 60, 1.0, 48000.0);
        vm.set_parameter(0, ParameterId::Release, 2.5);
        assert_ne!(vm.voices[1].get_parameter(ParameterId::Release), Some(2.5));
    }

    #[test]
    fn apply_modulation_pushes_a_modulated_value_onto_active_voices() {
        use crate::modulation::{ModSource, ModulationMatrix, ModulationSlot};

        let mut vm = VoiceManager::new(2);
        vm.note_on(0, EngineType::Subtractive, 60, 1.0, 48000.0);

        let mut matrix = ModulationMatrix::new(1000.0);
        matrix.set_source_value(ModSource::Aftertouch, 1.0);
        let slot = ModulationSlot::new(1, ModSource::Aftertouch, ParameterId::Release, 1.0);
        matrix.set_slots(vec![slot]);

        vm.apply_modulation(&mut matrix);
        let release = vm.voices[0].get_parameter(ParameterId::Release).unwrap();
        let base = ParameterId::Release.default_value();
        assert!((release - (base + 1.0)).abs() < 1e-4);
    }
}
