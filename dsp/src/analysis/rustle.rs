//! Clothing rustle suppression.
//!
//! Fabric brushing against the housing produces sharp transients on
//! whichever microphone is touched, with little correlation on the
//! other two. Correlated transients are left alone.

use crate::frame::{MicFrame, Samples, FRAME_SIZE, NUM_MICS};

/// Summed second-derivative magnitude that marks a transient.
const IMPULSE_THRESHOLD: i32 = 500;

/// Inter-mic spread above which the transient is localized contact.
const DECORRELATION_THRESHOLD: i32 = 300;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RustleReport {
    pub samples: Samples,
    /// Number of output samples that were attenuated.
    pub suppressed: u32,
}

#[must_use]
pub fn suppress(mics: &MicFrame) -> RustleReport {
    let mut rustle_detected = [false; FRAME_SIZE];

    for i in 2..FRAME_SIZE {
        let mut energy_change = [0i32; NUM_MICS];
        let mut total_change = 0i32;
        for (mic, channel) in mics.iter().enumerate() {
            let accel = i32::from(channel[i]) - 2 * i32::from(channel[i - 1])
                + i32::from(channel[i - 2]);
            energy_change[mic] = accel.abs();
            total_change += energy_change[mic];
        }

        let change_avg = total_change / NUM_MICS as i32;
        let correlation = energy_change
            .iter()
            .map(|change| (change - change_avg).abs())
            .sum::<i32>();

        if total_change > IMPULSE_THRESHOLD && correlation > DECORRELATION_THRESHOLD {
            rustle_detected[i - 1] = true;
            rustle_detected[i] = true;
            if i < FRAME_SIZE - 1 {
                rustle_detected[i + 1] = true;
            }
        }
    }

    let mut samples = [0i16; FRAME_SIZE];
    let mut suppressed = 0;
    for i in 0..FRAME_SIZE {
        if rustle_detected[i] {
            // Attenuate the impulse by 75%.
            samples[i] = mics[0][i] / 4;
            suppressed += 1;
        } else {
            samples[i] = mics[0][i];
        }
    }

    RustleReport {
        samples,
        suppressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_signal_passes_untouched() {
        let mics = [[800i16; FRAME_SIZE]; NUM_MICS];
        let report = suppress(&mics);
        assert_eq!(report.suppressed, 0);
        assert_eq!(report.samples, mics[0]);
    }

    #[test]
    fn localized_spike_is_attenuated_with_its_neighbours() {
        // A spike on a single mic only: large change, low correlation
        // with the untouched channels.
        let mut mics = [[0i16; FRAME_SIZE]; NUM_MICS];
        mics[0][64] = 4000;
        let report = suppress(&mics);
        assert!(report.suppressed >= 3);
        assert_eq!(report.samples[64], 1000);
    }

    #[test]
    fn correlated_transient_is_kept() {
        // The same spike on every channel reads as real signal.
        let mut mics = [[0i16; FRAME_SIZE]; NUM_MICS];
        for channel in &mut mics {
            channel[64] = 4000;
        }
        let report = suppress(&mics);
        assert_eq!(report.suppressed, 0);
        assert_eq!(report.samples[64], 4000);
    }
}
