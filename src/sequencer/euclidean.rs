//! Euclidean rhythm generation via the bucket-increment algorithm.

use crate::constants::MAX_STEPS_PER_TRACK;

/// Fills a boolean pattern of `steps` slots with `pulses` evenly distributed
/// hits, then rotates the result by `rotation`. `count(true) == min(pulses,
/// steps)` always holds.
pub fn generate(steps: usize, pulses: usize, rotation: usize) -> [bool; MAX_STEPS_PER_TRACK] {
    let mut out = [false; MAX_STEPS_PER_TRACK];
    let steps = steps.min(MAX_STEPS_PER_TRACK).max(1);
    let pulses = pulses.min(steps);

    if pulses == 0 {
        return out;
    }

    let mut bucket = 0usize;
    for slot in out.iter_mut().take(steps) {
        bucket += pulses;
        if bucket >= steps {
            bucket -= steps;
            *slot = true;
        }
    }

    let rot = rotation % steps;
    if rot > 0 {
        let mut rotated = [false; MAX_STEPS_PER_TRACK];
        for i in 0..steps {
            rotated[i] = out[(i + rot) % steps];
        }
        out[..steps].copy_from_slice(&rotated[..steps]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_count_matches_min_pulses_steps() {
        for pulses in 0..=20 {
            let pattern = generate(16, pulses, 0);
            assert_eq!(pattern[..16].iter().filter(|b| **b).count(), pulses.min(16));
        }
    }

    #[test]
    fn e_16_5_0_matches_the_bucket_increment_reference_pattern() {
        let pattern = generate(16, 5, 0);
        let expected = [
            false, false, false, true, false, false, true, false, false, true, false, false,
            true, false, false, true,
        ];
        assert_eq!(&pattern[..16], &expected[..]);
    }

    #[test]
    fn rotation_is_a_pure_cyclic_shift() {
        let base = generate(8, 3, 0);
        let rotated = generate(8, 3, 1);
        for i in 0..8 {
            assert_eq!(rotated[i], base[(i + 1) % 8]);
        }
    }

    #[test]
    fn zero_pulses_yields_empty_pattern() {
        let pattern = generate(16, 0, 3);
        assert!(pattern.iter().all(|b| !b));
    }
}
