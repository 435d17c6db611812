//! Proximity-based voice detection, separating the wearer from
//! far-field speakers.
//!
//! A mouth a few centimetres from the center microphone produces a
//! large energy spread between channels; a speaker across the room
//! illuminates all three roughly equally.

use crate::frame::{scaled_mean_square, zero_crossings, MicFrame, FRAME_SIZE, NUM_MICS};

/// Energy-spread ratio (x100) above which the source is near-field.
const NEAR_FIELD_RATIO: i32 = 30;

/// Minimum average channel energy to consider the frame at all.
const MIN_ENERGY: i32 = 500;

/// Voiced speech zero-crossing band for a 16 ms frame, inclusive.
const VOICE_CROSSINGS: (u32, u32) = (10, 30);

#[must_use]
pub fn wearer_voice(mics: &MicFrame) -> bool {
    let mut mic_energy = [0i32; NUM_MICS];
    for (mic, channel) in mics.iter().enumerate() {
        mic_energy[mic] = scaled_mean_square(channel);
    }

    let energy_avg = mic_energy.iter().sum::<i32>() / NUM_MICS as i32;
    let energy_spread = mic_energy
        .iter()
        .map(|energy| (energy - energy_avg).abs())
        .sum::<i32>();
    let proximity_ratio = (energy_spread * 100) / (energy_avg + 1);

    // Rough spectral split: the first quarter of the frame stands in
    // for the low band, the rest for the high band.
    let mut voice_band_energy = 0i32;
    let mut noise_band_energy = 0i32;
    for channel in mics {
        let crossings = zero_crossings(channel);
        let mut low = 0i32;
        let mut high = 0i32;
        for i in 1..FRAME_SIZE {
            let sample = i32::from(channel[i]);
            let energy = (sample * sample) / 256;
            if i < FRAME_SIZE / 4 {
                low += energy;
            } else {
                high += energy;
            }
        }
        if (VOICE_CROSSINGS.0..=VOICE_CROSSINGS.1).contains(&crossings) {
            voice_band_energy += low;
        } else {
            noise_band_energy += high;
        }
    }

    proximity_ratio > NEAR_FIELD_RATIO
        && voice_band_energy > noise_band_energy * 2
        && energy_avg > MIN_ENERGY
}
