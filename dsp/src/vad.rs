//! Energy and zero-crossing based voice activity detection.

/// Minimum frame energy for voice.
pub const ENERGY_THRESHOLD: u32 = 1000;

/// Voiced speech lands between these zero-crossing counts per frame;
/// both bounds are exclusive.
pub const ZERO_CROSSING_RANGE: (u32, u32) = (10, 80);

/// Pure decision over the frame's derived metrics.
#[must_use]
pub fn voice_present(energy: u32, zero_crossings: u32) -> bool {
    energy > ENERGY_THRESHOLD
        && zero_crossings > ZERO_CROSSING_RANGE.0
        && zero_crossings < ZERO_CROSSING_RANGE.1
}
