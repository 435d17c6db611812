//! Per-channel conditioning: DC offset removal and a 3-tap smoothing FIR.

use crate::frame::{Samples, FRAME_SIZE};

/// Removes the channel's DC offset and smooths it with a symmetric
/// 1:2:1 FIR. The first two samples have no history and are zeroed.
#[must_use]
pub fn condition(channel: &Samples) -> Samples {
    let mut dc_sum = 0i32;
    for x in channel {
        dc_sum += i32::from(*x);
    }
    let dc_offset = dc_sum / FRAME_SIZE as i32;

    let mut conditioned = [0i16; FRAME_SIZE];
    for i in 2..FRAME_SIZE {
        let smoothed = (i32::from(channel[i - 2])
            + 2 * i32::from(channel[i - 1])
            + i32::from(channel[i]))
            / 4;
        conditioned[i] = (smoothed - dc_offset) as i16;
    }
    conditioned
}
