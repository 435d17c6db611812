//! Periodic telemetry of the compute core.
//!
//! Once per interval the reporter snapshots the shared accumulators,
//! converts the delta since its previous snapshot into MIPS and CPU
//! utilization figures, and wraps them in a stats frame for the radio
//! core. The MIPS estimate assumes 1.5 cycles per instruction, a rough
//! average for the core's integer pipeline.

use crate::dispatcher::{SharedState, Snapshot};
use crate::message::{Envelope, Payload, StatsPayload};

/// How often the compute core ships stats.
pub const REPORT_INTERVAL_MS: u32 = 1000;

#[derive(Debug)]
pub struct Reporter {
    previous: Snapshot,
    frequency_mhz: u32,
}

impl Reporter {
    #[must_use]
    pub fn new(frequency_mhz: u32) -> Self {
        Self {
            previous: Snapshot::default(),
            frequency_mhz,
        }
    }

    /// Produces the stats frame for the interval since the last call.
    /// When the accumulators were reset by a workload switch in the
    /// meantime, the delta restarts from the fresh totals instead of
    /// underflowing.
    pub fn tick(&mut self, shared: &SharedState) -> Envelope {
        let snapshot = shared.accumulators.snapshot();
        // A workload switch zeroes both accumulators together, so a
        // drop in either counter marks the whole interval as restarted
        // and both deltas fall back to the fresh totals.
        let restarted = snapshot.cycles < self.previous.cycles
            || snapshot.iterations < self.previous.iterations;
        let (cycle_delta, iteration_delta) = if restarted {
            (snapshot.cycles, snapshot.iterations)
        } else {
            (
                snapshot.cycles - self.previous.cycles,
                snapshot.iterations - self.previous.iterations,
            )
        };
        self.previous = snapshot;

        let instructions = cycle_delta * 10 / 15;
        let mips = (instructions / 1_000_000) as u32;
        let cpu_percent = ((mips * 100) / self.frequency_mhz).min(100);

        Envelope {
            workload: shared.active_workload(),
            payload: Payload::Stats(StatsPayload {
                cycle_delta,
                iteration_delta,
                mips,
                cpu_percent,
            }),
        }
    }
}
