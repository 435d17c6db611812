//! Noise gating and automatic gain control on the beamformed signal.

use crate::frame::{Samples, FRAME_SIZE};

/// Samples at or below this magnitude are considered noise and zeroed.
pub const NOISE_FLOOR: i32 = 100;

/// Mean-square level the gain control steers towards.
pub const TARGET_LEVEL: i32 = 2000;

/// Gain limits in 1/256 fixed-point units, 0.25x to 2x.
pub const MIN_GAIN: i32 = 64;
pub const MAX_GAIN: i32 = 512;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Normalized {
    pub samples: Samples,
    /// Applied gain in 1/256 units. Stays 1 for an all-quiet frame,
    /// which zeroes the output; audible frames get [64, 512].
    pub gain: i32,
}

#[must_use]
pub fn gate_and_normalize(input: &Samples) -> Normalized {
    let mut gated = [0i16; FRAME_SIZE];
    let mut energy = 0i64;
    for (i, x) in input.iter().enumerate() {
        let sample = i32::from(*x);
        if sample.abs() > NOISE_FLOOR {
            gated[i] = *x;
        }
        let gated_sample = i64::from(gated[i]);
        energy += gated_sample * gated_sample;
    }

    let mean_square = (energy / FRAME_SIZE as i64) as i32;
    let mut gain = 1;
    if mean_square > 0 {
        gain = ((TARGET_LEVEL * 256) / (mean_square + 1)).clamp(MIN_GAIN, MAX_GAIN);
    }

    let mut samples = [0i16; FRAME_SIZE];
    for (i, x) in gated.iter().enumerate() {
        samples[i] = ((i32::from(*x) * gain) / 256) as i16;
    }

    Normalized { samples, gain }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_floor_samples_are_gated_out() {
        let input = [NOISE_FLOOR as i16; FRAME_SIZE];
        let normalized = gate_and_normalize(&input);
        assert_eq!(normalized.samples, [0i16; FRAME_SIZE]);
        assert_eq!(normalized.gain, 1);
    }

    #[test]
    fn sparse_quiet_frame_is_amplified_up_to_the_limit() {
        // A single gated-through spike leaves the frame well below the
        // target level, driving the gain against the upper clamp.
        let mut input = [0i16; FRAME_SIZE];
        input[10] = 150;
        let normalized = gate_and_normalize(&input);
        assert_eq!(normalized.gain, MAX_GAIN);
        assert_eq!(normalized.samples[10], 300);
    }

    #[test]
    fn loud_frame_is_attenuated_down_to_the_limit() {
        let input = [4000i16; FRAME_SIZE];
        let normalized = gate_and_normalize(&input);
        assert_eq!(normalized.gain, MIN_GAIN);
        assert_eq!(normalized.samples, [1000i16; FRAME_SIZE]);
    }

    #[test]
    fn gain_stays_within_limits_whenever_signal_passes_the_gate() {
        for level in [101i16, 300, 1000, 2000, 4095] {
            let input = [level; FRAME_SIZE];
            let normalized = gate_and_normalize(&input);
            assert!((MIN_GAIN..=MAX_GAIN).contains(&normalized.gain));
        }
    }

    #[test]
    fn random_frames_never_escape_the_gain_limits() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let mut input = [0i16; FRAME_SIZE];
            for x in &mut input {
                *x = rng.gen_range(-4096..=4096);
            }
            let normalized = gate_and_normalize(&input);
            assert!(normalized.gain == 1 || (MIN_GAIN..=MAX_GAIN).contains(&normalized.gain));
        }
    }
}
