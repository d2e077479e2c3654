//! Pattern-to-pattern chaining: each pattern can name a successor, a repeat
//! count, a trigger probability, and a trigger mode that decides when the
//! switch actually happens relative to the playhead.
//!
//! Only the playback-relevant fields are modeled here; UI-facing concerns
//! like scene color or song-section labels belong to a presentation layer
//! this crate does not own.

use crate::constants::MAX_CHAIN_LINKS_PER_PATTERN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Immediate,
    Quantized,
    Queued,
}

/// A condition gating whether a chain link fires at its last repeat. Kept as
/// plain data (not a closure) so the chain manager stays allocation-free and
/// `Clone`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainCondition {
    Always,
    Never,
    /// Fires once every `n`-th time the link is evaluated.
    EveryN { n: u32, counter: u32 },
}

impl ChainCondition {
    fn evaluate(&mut self) -> bool {
        match self {
            ChainCondition::Always => true,
            ChainCondition::Never => false,
            ChainCondition::EveryN { n, counter } => {
                *counter += 1;
                let fire = *counter >= *n;
                if fire {
                    *counter = 0;
                }
                fire
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainLink {
    pub next_pattern: usize,
    pub repeat_count: u8,
    pub current_repeats: u8,
    pub probability: f32,
    pub trigger_mode: TriggerMode,
    pub condition: ChainCondition,
    pub mutation_amount: f32,
    pub swing: f32,
    pub velocity_scale: f32,
}

impl ChainLink {
    pub fn new(next_pattern: usize, repeat_count: u8) -> Self {
        Self {
            next_pattern,
            repeat_count: repeat_count.max(1),
            current_repeats: 0,
            probability: 1.0,
            trigger_mode: TriggerMode::Quantized,
            condition: ChainCondition::Always,
            mutation_amount: 0.0,
            swing: 0.0,
            velocity_scale: 1.0,
        }
    }
}

/// Per-track chaining state plus the links owned by each pattern slot.
pub struct ChainManager {
    links: Vec<Vec<ChainLink>>,
    pub current_pattern: [usize; crate::constants::MAX_TRACKS],
    pub queued_pattern: [Option<usize>; crate::constants::MAX_TRACKS],
    pub armed_pattern: [Option<usize>; crate::constants::MAX_TRACKS],
    pub global_quantization_bars: u32,
    rng_state: u64,
}

impl ChainManager {
    pub fn new(pattern_count: usize) -> Self {
        Self {
            links: vec![Vec::with_capacity(MAX_CHAIN_LINKS_PER_PATTERN); pattern_count],
            current_pattern: [0; crate::constants::MAX_TRACKS],
            queued_pattern: [None; crate::constants::MAX_TRACKS],
            armed_pattern: [None; crate::constants::MAX_TRACKS],
            global_quantization_bars: 1,
            rng_state: 0x9E3779B97F4A7C15,
        }
    }

    pub fn append_link(&mut self, pattern_index: usize, link: ChainLink) {
        if let Some(slot) = self.links.get_mut(pattern_index) {
            if slot.len() < MAX_CHAIN_LINKS_PER_PATTERN {
                slot.push(link);
            }
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.links {
            slot.clear();
        }
        self.queued_pattern = [None; crate::constants::MAX_TRACKS];
        self.armed_pattern = [None; crate::constants::MAX_TRACKS];
    }

    fn next_random(&mut self) -> f32 {
        // xorshift64*, deterministic and allocation-free.
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545F4914F6CDD1D);
        ((bits >> 40) as f32) / ((1u64 << 24) as f32)
    }

    /// Called at each pattern-loop boundary for `track`. Advances repeat
    /// counters, evaluates the chain link's condition and probability on the
    /// last repeat, and queues (or immediately applies) the successor.
    pub fn on_pattern_looped(&mut self, track: usize, pattern_index: usize) {
        let roll = self.next_random();
        let Some(slot) = self.links.get_mut(pattern_index) else { return };
        let Some(link) = slot.first_mut() else { return };

        link.current_repeats += 1;
        if link.current_repeats < link.repeat_count {
            return;
        }
        link.current_repeats = 0;

        if !link.condition.evaluate() || roll >= link.probability {
            return;
        }

        match link.trigger_mode {
            TriggerMode::Immediate => {
                if let Some(slot) = self.current_pattern.get_mut(track) {
                    *slot = link.next_pattern;
                }
            }
            TriggerMode::Quantized => {
                if let Some(slot) = self.queued_pattern.get_mut(track) {
                    *slot = Some(link.next_pattern);
                }
            }
            TriggerMode::Queued => {
                if let Some(slot) = self.armed_pattern.get_mut(track) {
                    *slot = Some(link.next_pattern);
                }
            }
        }
    }

    /// Applies a queued pattern switch once the quantization point is reached.
    pub fn apply_quantization_point(&mut self, track: usize) {
        if let Some(queued) = self.queued_pattern.get_mut(track).and_then(Option::take) {
            if let Some(slot) = self.current_pattern.get_mut(track) {
                *slot = queued;
            }
        }
    }

    /// Launches whatever pattern is armed for `track` (the caller decides
    /// when, e.g. on a hardware launch-pad press).
    pub fn launch_armed(&mut self, track: usize) {
        if let Some(armed) = self.armed_pattern.get_mut(track).and_then(Option::take) {
            if let Some(slot) = self.current_pattern.get_mut(track) {
                *slot = armed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantized_link_only_switches_after_repeats_and_quantization_point() {
        let mut mgr = ChainManager::new(4);
        let mut link = ChainLink::new(2, 2);
        link.trigger_mode = TriggerMode::Quantized;
        mgr.append_link(0, link);

        mgr.on_pattern_looped(0, 0);
        assert_eq!(mgr.queued_pattern[0], None);
        mgr.on_pattern_looped(0, 0);
        assert_eq!(mgr.queued_pattern[0], Some(2));
        assert_eq!(mgr.current_pattern[0], 0);

        mgr.apply_quantization_point(0);
        assert_eq!(mgr.current_pattern[0], 2);
    }

    #[test]
    fn immediate_link_switches_without_a_quantization_point() {
        let mut mgr = ChainManager::new(2);
        let mut link = ChainLink::new(1, 1);
        link.trigger_mode = TriggerMode::Immediate;
        mgr.append_link(0, link);

        mgr.on_pattern_looped(0, 0);
        assert_eq!(mgr.current_pattern[0], 1);
    }

    #[test]
    fn never_condition_blocks_the_switch_forever() {
        let mut mgr = ChainManager::new(2);
        let mut link = ChainLink::new(1, 1);
        link.trigger_mode = TriggerMode::Immediate;
        link.condition = ChainCondition::Never;
        mgr.append_link(0, link);

        for _ in 0..10 {
            mgr.on_pattern_looped(0, 0);
        }
        assert_eq!(mgr.current_pattern[0], 0);
    }
}
