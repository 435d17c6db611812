//! Signal processing and synthetic compute workloads running on the
//! compute core of the necklace benchmark firmware.
//!
//! Every routine in this crate is bounded: fixed frame sizes, fixed loop
//! counts, no allocation. Each invocation returns an elapsed-cycle
//! estimate derived from a monotonic microsecond clock and the nominal
//! core frequency, which the control crate accumulates into telemetry.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::needless_range_loop)]

pub mod adc;
pub mod aec;
pub mod agc;
pub mod analysis;
pub mod beamforming;
pub mod frame;
pub mod kernels;
pub mod monotonic;
pub mod pre_processing;
pub mod processor;
pub mod vad;
