//! Frame processor running the audio workloads end to end.
//!
//! The processor owns the state that survives between frames: the echo
//! canceller's adaptive filter and the spatial canceller's noise-path
//! filter. Everything else is rebuilt per frame from the invocation
//! seed, so a workload's output stream is fully determined by its
//! starting seed.
//!
//! Each method times its whole body, including the simulated ADC read,
//! and reports the elapsed-cycle estimate alongside the seed for the
//! next invocation.

use crate::adc;
use crate::aec::AdaptiveFilter;
use crate::agc;
use crate::analysis;
use crate::analysis::SpatialCanceller;
use crate::beamforming;
use crate::frame::{mean_square, zero_crossings, Samples, NUM_MICS};
use crate::monotonic::{Monotonic, Timing};
use crate::pre_processing;
use crate::vad;

/// Per-workload ADC stride, decorrelating the simulated inputs of the
/// different workloads.
const VOICE_STRIDE: u32 = 37;
const RESONANCE_STRIDE: u32 = 41;
const RUSTLE_STRIDE: u32 = 43;
const SPATIAL_STRIDE: u32 = 47;
const WIND_STRIDE: u32 = 51;
const NECKLACE_STRIDE: u32 = 53;

/// Metrics of a frame the voice pipelines flagged as speech.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VoiceMetrics {
    /// Leading output samples, enough for the control core to verify
    /// the stream without shipping whole frames.
    pub samples: [i16; 4],
    pub energy: u32,
    pub zero_crossings: u32,
    /// Set by the echo-cancelling pipeline only.
    pub double_talk: Option<bool>,
}

/// Outcome of one voice-pipeline frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameReport {
    /// Seed for the next invocation of the same workload.
    pub seed: u32,
    pub elapsed_cycles: u64,
    /// Present when the frame carried voice.
    pub voice: Option<VoiceMetrics>,
}

/// Outcome of one analysis-workload frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalysisReport {
    pub seed: u32,
    pub elapsed_cycles: u64,
}

#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Processor {
    echo: AdaptiveFilter,
    spatial: SpatialCanceller,
}

impl Processor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the adaptive echo filter, called when the dispatcher
    /// switches away from the echo-cancelling workload.
    pub fn reset_echo_state(&mut self) {
        self.echo.reset();
    }

    /// Drops the spatial noise filter, called when the dispatcher
    /// switches away from the spatial cancellation workload.
    pub fn reset_spatial_state(&mut self) {
        self.spatial.reset();
    }

    /// The echo canceller's persistent state, for inspection.
    #[must_use]
    pub fn echo_filter(&self) -> &AdaptiveFilter {
        &self.echo
    }

    /// The spatial canceller's persistent state, for inspection.
    #[must_use]
    pub fn spatial_filter(&self) -> &SpatialCanceller {
        &self.spatial
    }

    /// Capture, conditioning, beamforming, gain control, and voice
    /// detection over one frame.
    pub fn voice_pipeline<M: Monotonic>(&mut self, seed: u32, timing: &Timing<M>) -> FrameReport {
        let stopwatch = timing.stopwatch();
        let processed = front_end(seed, VOICE_STRIDE);
        let energy = mean_square(&processed);
        let crossings = zero_crossings(&processed);
        let voice = vad::voice_present(energy, crossings);
        let elapsed_cycles = stopwatch.elapsed_cycles();

        if voice {
            FrameReport {
                seed: i32::from(processed[0]) as u32,
                elapsed_cycles,
                voice: Some(VoiceMetrics {
                    samples: leading(&processed),
                    energy,
                    zero_crossings: crossings,
                    double_talk: None,
                }),
            }
        } else {
            FrameReport {
                seed: 0,
                elapsed_cycles,
                voice: None,
            }
        }
    }

    /// The voice pipeline followed by echo cancellation. Voice metrics
    /// are taken before the canceller, the shipped samples after it.
    pub fn voice_pipeline_aec<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> FrameReport {
        let stopwatch = timing.stopwatch();
        let processed = front_end(seed, VOICE_STRIDE);
        let energy = mean_square(&processed);
        let crossings = zero_crossings(&processed);
        let voice = vad::voice_present(energy, crossings);

        let cancelled = self.echo.cancel(&processed, energy, seed);
        let elapsed_cycles = stopwatch.elapsed_cycles();

        if voice {
            FrameReport {
                seed: i32::from(cancelled.samples[0]) as u32,
                elapsed_cycles,
                voice: Some(VoiceMetrics {
                    samples: leading(&cancelled.samples),
                    energy,
                    zero_crossings: crossings,
                    double_talk: Some(cancelled.double_talk),
                }),
            }
        } else {
            FrameReport {
                seed: 0,
                elapsed_cycles,
                voice: None,
            }
        }
    }

    pub fn proximity_vad<M: Monotonic>(&mut self, seed: u32, timing: &Timing<M>) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, VOICE_STRIDE);
        let wearer = analysis::wearer_voice(&mics);
        AnalysisReport {
            seed: u32::from(wearer),
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }

    pub fn chest_resonance<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, RESONANCE_STRIDE);
        let energy = analysis::coherent_energy(&mics).unwrap_or(0);
        AnalysisReport {
            seed: energy as u32,
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }

    pub fn clothing_rustle<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, RUSTLE_STRIDE);
        let report = analysis::rustle_suppress(&mics);
        AnalysisReport {
            seed: report.suppressed,
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }

    pub fn spatial_noise_cancel<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, SPATIAL_STRIDE);
        let report = self.spatial.cancel(&mics);
        AnalysisReport {
            seed: report.residual_energy as u32,
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }

    pub fn wind_noise_reduction<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, WIND_STRIDE);
        let report = analysis::wind_reduce(&mics);
        AnalysisReport {
            seed: u32::from(report.wind_detected),
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }

    pub fn necklace_full<M: Monotonic>(
        &mut self,
        seed: u32,
        timing: &Timing<M>,
    ) -> AnalysisReport {
        let stopwatch = timing.stopwatch();
        let mics = adc::capture(seed, NECKLACE_STRIDE);
        let report = analysis::necklace_process(&mics);
        let seed = if report.voice_detected {
            i32::from(report.samples[0]) as u32
        } else {
            0
        };
        AnalysisReport {
            seed,
            elapsed_cycles: stopwatch.elapsed_cycles(),
        }
    }
}

/// The shared front half of both voice pipelines: capture, per-channel
/// conditioning, beamforming, then the gate and gain control.
fn front_end(seed: u32, stride: u32) -> Samples {
    let mics = adc::capture(seed, stride);
    let mut conditioned = [[0i16; crate::frame::FRAME_SIZE]; NUM_MICS];
    for (mic, channel) in mics.iter().enumerate() {
        conditioned[mic] = pre_processing::condition(channel);
    }
    let beamformed = beamforming::delay_and_sum(&conditioned);
    agc::gate_and_normalize(&beamformed).samples
}

fn leading(samples: &Samples) -> [i16; 4] {
    [samples[0], samples[1], samples[2], samples[3]]
}
