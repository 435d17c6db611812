//! Cross-core plumbing of the necklace benchmark firmware.
//!
//! The firmware splits across two cores. The compute core runs the
//! workloads from [`lariat_dsp`] under the [`dispatcher`], accumulates
//! cycle counts, and ships telemetry through the [`reporter`]. The
//! radio core receives that telemetry in the [`link`] hub, merges it
//! with its own throughput counters, and forwards workload commands
//! back. All traffic between the two travels as fixed-size frames
//! defined in [`message`].
//!
//! ```text
//!   [ radio core ]                      [ compute core ]
//!    Hub, LinkMonitor                    Dispatcher, Reporter
//!         |  SetWorkload --------------------->  |
//!         |  <------------------- Stats (1 Hz)   |
//!         |  <-------- AudioData (voiced frames) |
//! ```
//!
//! Everything here is platform-independent: the actual interconnect
//! and scheduler hide behind the [`transport`] traits, so the whole
//! crate runs under host tests.

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

pub mod dispatcher;
pub mod link;
pub mod message;
pub mod reporter;
pub mod transport;
pub mod workload;

mod log;
