//! Synthetic microphone capture.
//!
//! There is no real ADC behind the benchmark. Frames are generated
//! deterministically from the channel index, a per-workload stride and a
//! seed carried over from the previous invocation, which provides
//! inter-frame variability without randomness.

use crate::frame::{MicFrame, FRAME_SIZE, NUM_MICS};

/// 12-bit sample range, matching the SAADC resolution.
const SAMPLE_MASK: u32 = 0xFFF;

#[must_use]
pub fn capture(seed: u32, stride: u32) -> MicFrame {
    let mut mics = [[0i16; FRAME_SIZE]; NUM_MICS];
    for (mic, channel) in mics.iter_mut().enumerate() {
        let weight = (mic as u32 + 1).wrapping_mul(stride);
        for (i, sample) in channel.iter_mut().enumerate() {
            let raw = (i as u32).wrapping_mul(weight).wrapping_add(seed);
            *sample = (raw & SAMPLE_MASK) as i16;
        }
    }
    mics
}
