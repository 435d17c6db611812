//! Chest resonance detection.
//!
//! Speech conducted through the wearer's chest shows up as coherent
//! low-frequency energy on all three microphones at once. Ambient
//! rumble tends to hit them unevenly.

use crate::frame::{MicFrame, FRAME_SIZE, NUM_MICS};

/// Minimum average band energy for a detection.
const MIN_ENERGY: i32 = 300;

/// Coherence score (x100) above which the energy counts as resonance.
const COHERENCE_SCORE: i32 = 50;

/// Returns the average resonance-band energy when a coherent chest
/// resonance is present, `None` otherwise.
#[must_use]
pub fn coherent_energy(mics: &MicFrame) -> Option<i32> {
    let mut resonance_energy = [0i32; NUM_MICS];
    for (mic, channel) in mics.iter().enumerate() {
        resonance_energy[mic] = band_energy(channel);
    }

    let energy_avg = resonance_energy.iter().sum::<i32>() / NUM_MICS as i32;
    let energy_variance = resonance_energy
        .iter()
        .map(|energy| {
            let diff = energy - energy_avg;
            (diff * diff) / 256
        })
        .sum::<i32>()
        / NUM_MICS as i32;

    let coherence = (energy_avg * 100) / (energy_variance + 1);
    if energy_avg > MIN_ENERGY && coherence > COHERENCE_SCORE {
        Some(energy_avg)
    } else {
        None
    }
}

/// Energy of the channel after downsampling by 4, a crude low-pass
/// isolating the 50 to 200 Hz chest band at 8 kHz.
fn band_energy(channel: &[i16; FRAME_SIZE]) -> i32 {
    let mut sum = 0i32;
    let mut count = 0i32;
    let mut i = 4;
    while i < FRAME_SIZE {
        let avg = (i32::from(channel[i - 3])
            + i32::from(channel[i - 2])
            + i32::from(channel[i - 1])
            + i32::from(channel[i]))
            / 4;
        sum += (avg * avg) / 256;
        count += 1;
        i += 4;
    }
    sum / count
}
