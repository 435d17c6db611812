//! Combined necklace pipeline.
//!
//! Chains simplified renditions of every wearable stage over one frame:
//! DC removal, spatial noise subtraction, wind high-pass, rustle
//! attenuation, proximity scoring, then gain control with a chest
//! resonance check backing the final voice decision.

use crate::frame::{MicFrame, Samples, FRAME_SIZE, NUM_MICS};

/// Decimated energy above which the frame is treated as windy.
const WIND_ENERGY_THRESHOLD: i32 = 400;

/// Second-derivative magnitude that marks a rustle impulse.
const IMPULSE_THRESHOLD: i32 = 500;

/// Energy-spread ratio (x100) above which the source is near-field.
const NEAR_FIELD_RATIO: i32 = 30;

/// Minimum output level and chest-band energy for the voice decision.
const VOICE_RMS_THRESHOLD: i32 = 500;
const RESONANCE_THRESHOLD: i32 = 300;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NecklaceReport {
    pub samples: Samples,
    pub voice_detected: bool,
}

#[must_use]
pub fn process(mics: &MicFrame) -> NecklaceReport {
    // Stage 1: per-channel DC removal.
    let mut centered = [[0i16; FRAME_SIZE]; NUM_MICS];
    for (mic, channel) in mics.iter().enumerate() {
        let mut dc_sum = 0i32;
        for x in channel {
            dc_sum += i32::from(*x);
        }
        let dc_offset = dc_sum / FRAME_SIZE as i32;
        for i in 0..FRAME_SIZE {
            centered[mic][i] = (i32::from(channel[i]) - dc_offset) as i16;
        }
    }

    // Stage 2: beamform plus partial noise-reference subtraction.
    let mut denoised = [0i16; FRAME_SIZE];
    for i in 0..FRAME_SIZE {
        let center = i32::from(centered[0][i]);
        let left = i32::from(centered[1][i]);
        let right = i32::from(centered[2][i]);
        let primary = (center * 2 + left + right) / 4;
        let noise_reference = (left + right) / 2 - center;
        denoised[i] = (primary - noise_reference / 4) as i16;
    }

    // Stage 3: wind check on the decimated signal, high-pass if windy.
    let mut low_freq_energy = 0i32;
    let mut i = 0;
    while i < FRAME_SIZE {
        let sample = i32::from(denoised[i]);
        low_freq_energy += (sample * sample) / 256;
        i += 8;
    }
    let wind_detected = low_freq_energy / (FRAME_SIZE / 8) as i32 > WIND_ENERGY_THRESHOLD;

    let mut dewinded = [0i16; FRAME_SIZE];
    for i in 0..FRAME_SIZE {
        dewinded[i] = if wind_detected && i >= 1 {
            (i32::from(denoised[i]) - i32::from(denoised[i - 1])) as i16
        } else {
            denoised[i]
        };
    }

    // Stage 4: rustle impulse attenuation.
    let mut derustled = [0i16; FRAME_SIZE];
    derustled[0] = dewinded[0];
    derustled[1] = dewinded[1];
    for i in 2..FRAME_SIZE {
        let accel = i32::from(dewinded[i]) - 2 * i32::from(dewinded[i - 1])
            + i32::from(dewinded[i - 2]);
        derustled[i] = if accel.abs() > IMPULSE_THRESHOLD {
            dewinded[i] / 4
        } else {
            dewinded[i]
        };
    }

    // Stage 5: proximity score from the centered channel energies.
    let mut mic_energy = [0i32; NUM_MICS];
    for (mic, channel) in centered.iter().enumerate() {
        let mut energy = 0i32;
        for x in channel {
            let sample = i32::from(*x);
            energy += (sample * sample) / 256;
        }
        mic_energy[mic] = energy / FRAME_SIZE as i32;
    }
    let energy_avg = mic_energy.iter().sum::<i32>() / NUM_MICS as i32;
    let energy_spread = mic_energy
        .iter()
        .map(|energy| (energy - energy_avg).abs())
        .sum::<i32>();
    let near_field = (energy_spread * 100) / (energy_avg + 1) > NEAR_FIELD_RATIO;

    // Stage 6: gain control and the resonance-backed voice decision.
    let mut signal_energy = 0i32;
    for x in &derustled {
        let sample = i32::from(*x);
        signal_energy += (sample * sample) / 256;
    }
    let rms = signal_energy / FRAME_SIZE as i32;
    let mut gain = 128;
    if rms > 0 {
        gain = ((2000 * 256) / (rms + 1)).clamp(64, 512);
    }

    let mut samples = [0i16; FRAME_SIZE];
    for i in 0..FRAME_SIZE {
        samples[i] = ((i32::from(derustled[i]) * gain) / 256) as i16;
    }

    let mut chest_resonance = 0i32;
    let mut i = 4;
    while i < FRAME_SIZE {
        let low_freq = (i32::from(centered[0][i - 3])
            + i32::from(centered[0][i - 2])
            + i32::from(centered[0][i - 1])
            + i32::from(centered[0][i]))
            / 4;
        chest_resonance += (low_freq * low_freq) / 256;
        i += 4;
    }
    chest_resonance /= (FRAME_SIZE / 4) as i32;

    let voice_detected =
        near_field && rms > VOICE_RMS_THRESHOLD && chest_resonance > RESONANCE_THRESHOLD;

    NecklaceReport {
        samples,
        voice_detected,
    }
}
