//! Wind noise reduction.
//!
//! Wind buffeting is low-frequency, strong, and nearly uncorrelated
//! between microphones. When detected, the least affected microphone
//! is selected and high-pass filtered; otherwise the normal beamformed
//! mix is used.

use crate::frame::{MicFrame, Samples, FRAME_SIZE, NUM_MICS};

/// Average decimated energy above which wind is plausible.
const ENERGY_THRESHOLD: i32 = 400;

/// Inter-mic correlation below which the energy is wind, not signal.
const CORRELATION_THRESHOLD: i32 = 100;

/// Decimation factor for the low-band energy estimate.
const DECIMATION: usize = 8;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindReport {
    pub samples: Samples,
    pub wind_detected: bool,
}

#[must_use]
pub fn reduce(mics: &MicFrame) -> WindReport {
    let mut low_freq_energy = [0i32; NUM_MICS];
    for (mic, channel) in mics.iter().enumerate() {
        let mut energy = 0i32;
        let mut i = DECIMATION;
        while i < FRAME_SIZE {
            let sample = i32::from(channel[i]);
            energy += (sample * sample) / 256;
            i += DECIMATION;
        }
        low_freq_energy[mic] = energy / (FRAME_SIZE / DECIMATION) as i32;
    }

    let mut correlation = 0i32;
    for i in 0..FRAME_SIZE {
        let m0 = i32::from(mics[0][i]);
        let m1 = i32::from(mics[1][i]);
        let m2 = i32::from(mics[2][i]);
        let cross_product = m0 * m1 + m1 * m2 + m0 * m2;
        correlation += cross_product / (256 * NUM_MICS as i32);
    }
    correlation /= FRAME_SIZE as i32;

    let avg_energy = low_freq_energy.iter().sum::<i32>() / NUM_MICS as i32;
    let wind_detected = avg_energy > ENERGY_THRESHOLD && correlation < CORRELATION_THRESHOLD;

    let mut samples = [0i16; FRAME_SIZE];
    if wind_detected {
        let mut best_mic = 0;
        for mic in 1..NUM_MICS {
            if low_freq_energy[mic] < low_freq_energy[best_mic] {
                best_mic = mic;
            }
        }

        for i in 0..FRAME_SIZE {
            // First-difference high-pass to knock out the wind band.
            samples[i] = if i >= 2 {
                (i32::from(mics[best_mic][i]) - i32::from(mics[best_mic][i - 1])) as i16
            } else {
                mics[best_mic][i]
            };
        }
    } else {
        for i in 0..FRAME_SIZE {
            let mixed = i32::from(mics[0][i]) * 2 + i32::from(mics[1][i]) + i32::from(mics[2][i]);
            samples[i] = (mixed / 4) as i16;
        }
    }

    WindReport {
        samples,
        wind_detected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_not_wind() {
        let report = reduce(&[[0i16; FRAME_SIZE]; NUM_MICS]);
        assert!(!report.wind_detected);
        assert_eq!(report.samples, [0i16; FRAME_SIZE]);
    }

    #[test]
    fn correlated_energy_is_beamformed_not_filtered() {
        // Loud but identical on every channel: correlation is high, so
        // the beamformed mix comes through at full level.
        let mics = [[1000i16; FRAME_SIZE]; NUM_MICS];
        let report = reduce(&mics);
        assert!(!report.wind_detected);
        assert_eq!(report.samples, [1000i16; FRAME_SIZE]);
    }

    #[test]
    fn anticorrelated_rumble_is_high_pass_filtered() {
        // Alternating-sign channels cancel in the cross products while
        // carrying plenty of low-band energy.
        let mut mics = [[0i16; FRAME_SIZE]; NUM_MICS];
        for i in 0..FRAME_SIZE {
            mics[0][i] = 2000;
            mics[1][i] = -2000;
            mics[2][i] = 2000;
        }
        let report = reduce(&mics);
        assert!(report.wind_detected);
        // The selected constant channel differentiates to zero past the
        // leading samples.
        assert_eq!(report.samples[3], 0);
    }
}
