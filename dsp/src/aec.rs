//! Acoustic echo cancellation with a normalized least-mean-squares
//! adaptive filter.
//!
//! The filter spans 256 taps, a 32 ms echo tail at 8 kHz. Its
//! coefficients and the far-end reference history persist across frames
//! of the same workload; the dispatcher resets them only when the
//! workload switches away.

use crate::frame::{mean_square, Samples, FRAME_SIZE};

/// Taps of the adaptive filter and length of the reference history.
pub const FILTER_TAPS: usize = 256;

/// Hard clamp applied to every coefficient after each update.
pub const COEFFICIENT_LIMIT: i16 = 8192;

/// NLMS step size in 1/256 fixed-point units, 0.0625.
const STEP_SIZE: i32 = 16;

/// Mean-square energy above which a signal counts as active for the
/// double-talk detector.
const DOUBLE_TALK_ENERGY: u32 = 500;

/// Residual magnitudes below this are halved when no double-talk.
const RESIDUAL_THRESHOLD: i32 = 50;

/// 11-bit range of the simulated far-end reference.
const REFERENCE_MASK: u32 = 0x7FF;
const REFERENCE_STRIDE: u32 = 29;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EchoCancelled {
    pub samples: Samples,
    pub double_talk: bool,
}

/// Echo path estimate and far-end history, owned by the AEC workload.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdaptiveFilter {
    coefficients: [i16; FILTER_TAPS],
    reference: [i16; FILTER_TAPS],
}

impl Default for AdaptiveFilter {
    fn default() -> Self {
        Self {
            coefficients: [0; FILTER_TAPS],
            reference: [0; FILTER_TAPS],
        }
    }
}

impl AdaptiveFilter {
    pub fn reset(&mut self) {
        self.coefficients = [0; FILTER_TAPS];
        self.reference = [0; FILTER_TAPS];
    }

    #[must_use]
    pub fn coefficients(&self) -> &[i16; FILTER_TAPS] {
        &self.coefficients
    }

    /// Runs one frame of echo cancellation against a freshly simulated
    /// far-end reference. Adaptation happens on every second sample to
    /// halve the computational cost.
    #[must_use]
    pub fn cancel(&mut self, near_end: &Samples, near_end_energy: u32, seed: u32) -> EchoCancelled {
        for (i, x) in self.reference.iter_mut().take(FRAME_SIZE).enumerate() {
            let raw = (i as u32)
                .wrapping_mul(REFERENCE_STRIDE)
                .wrapping_add(seed);
            *x = (raw & REFERENCE_MASK) as i16;
        }

        let mut error = [0i16; FRAME_SIZE];
        for n in 0..FRAME_SIZE {
            let mut echo_estimate = 0i32;
            for k in 0..=n {
                let tap = i32::from(self.coefficients[k]);
                let reference = i32::from(self.reference[n - k]);
                echo_estimate += (tap * reference) / 256;
            }
            error[n] = (i32::from(near_end[n]) - i32::from(echo_estimate as i16)) as i16;

            if n % 2 == 0 {
                self.adapt(n, i32::from(error[n]));
            }
        }

        let far_end_energy = mean_square(&self.reference[..FRAME_SIZE]);
        let double_talk =
            near_end_energy > DOUBLE_TALK_ENERGY && far_end_energy > DOUBLE_TALK_ENERGY;

        let mut samples = [0i16; FRAME_SIZE];
        if double_talk {
            // Adaptation is unreliable while both ends talk; pass the
            // near end through untouched.
            samples.copy_from_slice(near_end);
        } else {
            for (i, x) in error.iter().enumerate() {
                let mut suppressed = i32::from(*x);
                if suppressed.abs() < RESIDUAL_THRESHOLD {
                    suppressed /= 2;
                }
                samples[i] = suppressed as i16;
            }
        }

        EchoCancelled {
            samples,
            double_talk,
        }
    }

    fn adapt(&mut self, n: usize, error: i32) {
        let mut power = 0i32;
        for k in 0..=n {
            let reference = i32::from(self.reference[n - k]);
            power += (reference * reference) / 256;
        }
        let power = power / FILTER_TAPS as i32 + 1;

        let update_factor = (STEP_SIZE * error) / power;
        for k in 0..=n {
            let reference = i32::from(self.reference[n - k]);
            let update = (update_factor * reference) / 256;
            let limit = i32::from(COEFFICIENT_LIMIT);
            let updated = (i32::from(self.coefficients[k]) + update).clamp(-limit, limit);
            self.coefficients[k] = updated as i16;
        }
    }
}
