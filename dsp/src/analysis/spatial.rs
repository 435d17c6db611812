//! Spatial noise cancellation in the style of a generalized sidelobe
//! canceller.
//!
//! The primary beam favors the center microphone; a blocking beam
//! nulls the wearer out to obtain a noise reference, and a short LMS
//! filter subtracts the correlated part of that reference from the
//! primary beam. The filter persists across frames of the workload.

use crate::frame::{MicFrame, Samples, FRAME_SIZE};

/// Taps of the noise-path filter.
pub const FILTER_TAPS: usize = 32;

/// Hard clamp applied to every coefficient after each update.
pub const COEFFICIENT_LIMIT: i16 = 2048;

/// LMS step size.
const STEP_SIZE: i64 = 8;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpatialReport {
    pub samples: Samples,
    /// Mean scaled energy of the cleaned output.
    pub residual_energy: i32,
}

/// Noise-path estimate, owned by the spatial cancellation workload.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpatialCanceller {
    filter: [i16; FILTER_TAPS],
}

impl SpatialCanceller {
    pub fn reset(&mut self) {
        self.filter = [0; FILTER_TAPS];
    }

    #[must_use]
    pub fn filter(&self) -> &[i16; FILTER_TAPS] {
        &self.filter
    }

    #[must_use]
    pub fn cancel(&mut self, mics: &MicFrame) -> SpatialReport {
        let mut clean = [0i16; FRAME_SIZE];
        let mut noise_reference = [0i16; FRAME_SIZE];
        for i in 0..FRAME_SIZE {
            let center = i32::from(mics[0][i]);
            let left = i32::from(mics[1][i]);
            let right = i32::from(mics[2][i]);
            clean[i] = ((center * 2 + left + right) / 4) as i16;
            noise_reference[i] = ((left + right) / 2 - center) as i16;
        }

        for n in FILTER_TAPS..FRAME_SIZE {
            let mut noise_estimate = 0i32;
            for k in 0..FILTER_TAPS {
                let tap = i32::from(self.filter[k]);
                let reference = i32::from(noise_reference[n - k]);
                noise_estimate += (tap * reference) / 256;
            }

            let error = i32::from(clean[n]) - noise_estimate;
            clean[n] = error as i16;

            for k in 0..FILTER_TAPS {
                let reference = i64::from(noise_reference[n - k]);
                let update = (STEP_SIZE * i64::from(error) * reference)
                    / (FRAME_SIZE as i64 * 256);
                let limit = i64::from(COEFFICIENT_LIMIT);
                let updated = (i64::from(self.filter[k]) + update).clamp(-limit, limit);
                self.filter[k] = updated as i16;
            }
        }

        let mut residual_energy = 0i32;
        for x in &clean {
            let sample = i32::from(*x);
            residual_energy += (sample * sample) / 256;
        }

        SpatialReport {
            samples: clean,
            residual_energy: residual_energy / FRAME_SIZE as i32,
        }
    }
}
