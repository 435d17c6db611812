//! Delay-and-sum beamforming over the three pendant microphones.
//!
//! The center microphone sits closest to the wearer's mouth and gets
//! half the weight; the side microphones are delayed by two samples and
//! contribute a quarter each.

use crate::frame::{MicFrame, Samples, FRAME_SIZE};

const SIDE_DELAY: usize = 2;

#[must_use]
pub fn delay_and_sum(mics: &MicFrame) -> Samples {
    let mut beam = [0i16; FRAME_SIZE];
    for i in 0..FRAME_SIZE {
        let delayed = i.saturating_sub(SIDE_DELAY);
        let sum = 2 * i32::from(mics[0][i])
            + i32::from(mics[1][delayed])
            + i32::from(mics[2][delayed]);
        beam[i] = (sum / 4) as i16;
    }
    beam
}
