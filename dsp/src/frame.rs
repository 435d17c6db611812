//! Frame geometry and per-frame metrics shared by all audio workloads.

/// Number of microphones on the pendant.
pub const NUM_MICS: usize = 3;

/// Samples per frame and channel, 16 ms at 8 kHz.
pub const FRAME_SIZE: usize = 128;

pub type Samples = [i16; FRAME_SIZE];
pub type MicFrame = [Samples; NUM_MICS];

/// Mean of squared samples, the frame energy figure used by the VAD and
/// the double-talk detector.
#[must_use]
pub fn mean_square(samples: &[i16]) -> u32 {
    let sum: i64 = samples.iter().map(|x| i64::from(*x) * i64::from(*x)).sum();
    let mean = sum / samples.len() as i64;
    mean.min(i64::from(u32::MAX)) as u32
}

/// Mean of squares with the per-term `/256` scaling the analysis stages
/// use. The per-term truncation is part of the fixed-point contract.
#[must_use]
pub fn scaled_mean_square(samples: &[i16]) -> i32 {
    let mut sum = 0i32;
    for x in samples {
        let x = i32::from(*x);
        sum += (x * x) / 256;
    }
    sum / samples.len() as i32
}

/// Sign changes across the frame; zero counts as non-negative.
#[must_use]
pub fn zero_crossings(samples: &[i16]) -> u32 {
    let mut crossings = 0;
    for i in 1..samples.len() {
        let negative = samples[i] < 0;
        let previous_negative = samples[i - 1] < 0;
        if negative != previous_negative {
            crossings += 1;
        }
    }
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_square_of_constant_signal_is_its_square() {
        let samples = [4i16; FRAME_SIZE];
        assert_eq!(mean_square(&samples), 16);
    }

    #[test]
    fn mean_square_ignores_sign() {
        let positive = [100i16; FRAME_SIZE];
        let negative = [-100i16; FRAME_SIZE];
        assert_eq!(mean_square(&positive), mean_square(&negative));
    }

    #[test]
    fn mean_square_of_full_scale_frame_does_not_overflow() {
        let samples = [i16::MIN; FRAME_SIZE];
        assert_eq!(mean_square(&samples), 32768 * 32768);
    }

    #[test]
    fn scaled_mean_square_truncates_per_term() {
        // 15^2 = 225, truncated to 0 by the per-term /256.
        let samples = [15i16; FRAME_SIZE];
        assert_eq!(scaled_mean_square(&samples), 0);
    }

    #[test]
    fn zero_crossings_count_sign_changes() {
        let mut samples = [0i16; FRAME_SIZE];
        for (i, x) in samples.iter_mut().enumerate() {
            *x = if i % 2 == 0 { 10 } else { -10 };
        }
        assert_eq!(zero_crossings(&samples), FRAME_SIZE as u32 - 1);
    }

    #[test]
    fn zero_is_treated_as_non_negative() {
        let samples = [0i16; FRAME_SIZE];
        assert_eq!(zero_crossings(&samples), 0);
    }
}
