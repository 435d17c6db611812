//! Wearable-specific acoustic analysis stages.
//!
//! Each module approximates one phenomenon of the necklace form factor
//! by combining the shared channel-energy and zero-crossing primitives
//! with its own weighting and thresholds. All of them are bounded,
//! allocation-free, and return a scalar or boolean decision.

mod necklace;
mod proximity;
mod resonance;
mod rustle;
mod spatial;
mod wind;

pub use necklace::{process as necklace_process, NecklaceReport};
pub use proximity::wearer_voice;
pub use resonance::coherent_energy;
pub use rustle::{suppress as rustle_suppress, RustleReport};
pub use spatial::{SpatialCanceller, SpatialReport};
pub use wind::{reduce as wind_reduce, WindReport};
