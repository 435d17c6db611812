//! Workload execution loop of the compute core.
//!
//! The interconnect delivers commands from an interrupt context while
//! the dispatcher runs in thread context, so the two meet only through
//! [`SharedState`]: the receive callback stores the requested ordinal
//! into an atomic mailbox and the dispatcher picks it up at the top of
//! its next pass. Telemetry accumulators are atomics as well, read
//! concurrently by the reporter.

use core::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use lariat_dsp::kernels::{self, KernelRun};
use lariat_dsp::monotonic::{Monotonic, Timing};
use lariat_dsp::processor::{Processor, VoiceMetrics};

use crate::log;
use crate::message::{AudioDataPayload, Envelope, MalformedMessage, Payload};
use crate::workload::Workload;

const NO_REQUEST: u8 = 0xFF;

/// Totals since the last workload switch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub cycles: u64,
    pub iterations: u32,
}

/// Cycle and iteration counters written by the dispatcher and read by
/// the reporter.
#[derive(Debug, Default)]
pub struct Accumulators {
    cycles: AtomicU64,
    iterations: AtomicU32,
}

impl Accumulators {
    pub fn record(&self, cycles: u64) {
        self.cycles.fetch_add(cycles, Ordering::Relaxed);
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            iterations: self.iterations.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.iterations.store(0, Ordering::Relaxed);
    }
}

/// State shared between the receive callback, the dispatcher, and the
/// reporter.
#[derive(Debug)]
pub struct SharedState {
    pub accumulators: Accumulators,
    requested: AtomicU8,
    active: AtomicU8,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            accumulators: Accumulators::default(),
            requested: AtomicU8::new(NO_REQUEST),
            active: AtomicU8::new(Workload::Idle.ordinal()),
        }
    }
}

impl SharedState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The workload the dispatcher is currently running.
    #[must_use]
    pub fn active_workload(&self) -> Workload {
        Workload::from_ordinal(self.active.load(Ordering::Relaxed)).unwrap_or(Workload::Idle)
    }

    fn request(&self, workload: Workload) {
        self.requested.store(workload.ordinal(), Ordering::Relaxed);
    }

    fn take_request(&self) -> Option<Workload> {
        let ordinal = self.requested.swap(NO_REQUEST, Ordering::Relaxed);
        Workload::from_ordinal(ordinal)
    }
}

/// Receive callback of the compute core. Only parses and stores; the
/// dispatcher acts on the request from thread context.
pub fn on_message(shared: &SharedState, bytes: &[u8]) -> Result<(), MalformedMessage> {
    let envelope = Envelope::decode(bytes)?;
    match envelope.payload {
        Payload::SetWorkload => shared.request(envelope.workload),
        _ => {
            log::warn!("Dropping message kind not handled by the compute core");
        }
    }
    Ok(())
}

/// What one dispatcher pass did, telling the caller whether to sleep.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// Nothing to run; the caller should idle before the next pass.
    Idle,
    /// One workload iteration ran; `message` carries an audio frame
    /// when the iteration produced one to forward.
    Busy { message: Option<Envelope> },
}

/// Runs the active workload one iteration at a time.
#[derive(Debug)]
pub struct Dispatcher<'a, M> {
    shared: &'a SharedState,
    timing: Timing<'a, M>,
    processor: Processor,
    workload: Workload,
    seed: u32,
}

impl<'a, M: Monotonic> Dispatcher<'a, M> {
    #[must_use]
    pub fn new(shared: &'a SharedState, timing: Timing<'a, M>) -> Self {
        Self {
            shared,
            timing,
            processor: Processor::new(),
            workload: Workload::Idle,
            seed: 0,
        }
    }

    /// Applies any pending workload command, then runs one iteration
    /// of the active workload.
    pub fn run_once(&mut self) -> Activity {
        if let Some(workload) = self.shared.take_request() {
            self.switch_to(workload);
        }

        match self.workload {
            Workload::Idle => Activity::Idle,
            Workload::MatrixMultiply => self.run_kernel(kernels::matrix_multiply),
            Workload::Sorting => self.run_kernel(kernels::bubble_sort),
            Workload::Fft => self.run_kernel(kernels::fft_butterflies),
            Workload::Crypto => self.run_kernel(kernels::crypto_rounds),
            Workload::Mixed => self.run_kernel(kernels::mixed),
            Workload::VoicePipeline | Workload::VoicePipelineAec => self.run_voice(),
            Workload::ProximityVad
            | Workload::ChestResonance
            | Workload::ClothingRustle
            | Workload::SpatialNoiseCancel
            | Workload::WindNoiseReduction
            | Workload::NecklaceFull => self.run_analysis(),
        }
    }

    fn switch_to(&mut self, workload: Workload) {
        log::info!("Switching workload to {}", workload);

        // A repeated command for the running workload restarts its
        // telemetry but keeps the adapted filters.
        if workload != self.workload {
            match self.workload {
                Workload::VoicePipelineAec => self.processor.reset_echo_state(),
                Workload::SpatialNoiseCancel => self.processor.reset_spatial_state(),
                _ => (),
            }
            self.seed = 0;
        }

        self.workload = workload;
        self.shared.accumulators.reset();
        self.shared
            .active
            .store(workload.ordinal(), Ordering::Relaxed);
    }

    fn run_kernel(&mut self, kernel: fn(u32, &Timing<M>) -> KernelRun) -> Activity {
        let run = kernel(self.seed, &self.timing);
        self.seed = run.result;
        self.shared.accumulators.record(run.elapsed_cycles);
        Activity::Busy { message: None }
    }

    fn run_voice(&mut self) -> Activity {
        let report = if self.workload == Workload::VoicePipelineAec {
            self.processor.voice_pipeline_aec(self.seed, &self.timing)
        } else {
            self.processor.voice_pipeline(self.seed, &self.timing)
        };
        self.seed = report.seed;
        self.shared.accumulators.record(report.elapsed_cycles);

        let message = report
            .voice
            .map(|voice| audio_envelope(self.workload, &voice));
        Activity::Busy { message }
    }

    fn run_analysis(&mut self) -> Activity {
        let report = match self.workload {
            Workload::ProximityVad => self.processor.proximity_vad(self.seed, &self.timing),
            Workload::ChestResonance => self.processor.chest_resonance(self.seed, &self.timing),
            Workload::ClothingRustle => self.processor.clothing_rustle(self.seed, &self.timing),
            Workload::SpatialNoiseCancel => {
                self.processor.spatial_noise_cancel(self.seed, &self.timing)
            }
            Workload::WindNoiseReduction => {
                self.processor.wind_noise_reduction(self.seed, &self.timing)
            }
            _ => self.processor.necklace_full(self.seed, &self.timing),
        };
        self.seed = report.seed;
        self.shared.accumulators.record(report.elapsed_cycles);
        Activity::Busy { message: None }
    }

    #[cfg(test)]
    fn processor(&self) -> &Processor {
        &self.processor
    }
}

/// Wraps a voiced frame's metrics for the radio core.
fn audio_envelope(workload: Workload, voice: &VoiceMetrics) -> Envelope {
    Envelope {
        workload,
        payload: Payload::AudioData(AudioDataPayload {
            samples: voice.samples,
            energy: voice.energy,
            zero_crossings: voice.zero_crossings,
            double_talk: voice.double_talk.unwrap_or(false),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct SteppingClock {
        now: Cell<u64>,
        step: u64,
    }

    impl Monotonic for SteppingClock {
        fn now_us(&self) -> u64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    fn stepping(step: u64) -> SteppingClock {
        SteppingClock {
            now: Cell::new(0),
            step,
        }
    }

    fn command(workload: Workload) -> [u8; crate::message::ENVELOPE_SIZE] {
        Envelope {
            workload,
            payload: Payload::SetWorkload,
        }
        .encode()
    }

    #[test]
    fn dispatcher_starts_idle() {
        let shared = SharedState::new();
        let clock = stepping(25);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));
        assert_eq!(dispatcher.run_once(), Activity::Idle);
        assert_eq!(shared.accumulators.snapshot(), Snapshot::default());
    }

    #[test]
    fn commanded_workload_runs_and_accumulates() {
        let shared = SharedState::new();
        let clock = stepping(25);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        on_message(&shared, &command(Workload::Sorting)).unwrap();
        assert_eq!(
            dispatcher.run_once(),
            Activity::Busy { message: None }
        );
        assert_eq!(dispatcher.run_once(), Activity::Busy { message: None });

        let snapshot = shared.accumulators.snapshot();
        assert_eq!(snapshot.iterations, 2);
        assert_eq!(snapshot.cycles, 2 * 25 * 128);
        assert_eq!(shared.active_workload(), Workload::Sorting);
    }

    #[test]
    fn every_command_resets_the_accumulators() {
        let shared = SharedState::new();
        let clock = stepping(25);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        on_message(&shared, &command(Workload::Crypto)).unwrap();
        let _ = dispatcher.run_once();
        let _ = dispatcher.run_once();

        // Repeating the same command restarts the count.
        on_message(&shared, &command(Workload::Crypto)).unwrap();
        let _ = dispatcher.run_once();
        assert_eq!(shared.accumulators.snapshot().iterations, 1);
    }

    #[test]
    fn voice_workload_iterates_even_without_voiced_frames() {
        let shared = SharedState::new();
        let clock = stepping(0);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        on_message(&shared, &command(Workload::VoicePipelineAec)).unwrap();
        for _ in 0..8 {
            assert!(matches!(dispatcher.run_once(), Activity::Busy { .. }));
        }
        assert_eq!(shared.accumulators.snapshot().iterations, 8);
    }

    #[test]
    fn voiced_frames_are_forwarded_as_audio_data() {
        let metrics = VoiceMetrics {
            samples: [120, -45, 300, 7],
            energy: 4200,
            zero_crossings: 24,
            double_talk: Some(true),
        };
        let envelope = audio_envelope(Workload::VoicePipelineAec, &metrics);
        assert_eq!(envelope.workload, Workload::VoicePipelineAec);
        match envelope.payload {
            Payload::AudioData(payload) => {
                assert_eq!(payload.samples, [120, -45, 300, 7]);
                assert_eq!(payload.energy, 4200);
                assert_eq!(payload.zero_crossings, 24);
                assert!(payload.double_talk);
            }
            _ => panic!("voiced frames must ship as audio data"),
        }

        // The plain pipeline never reports double-talk.
        let plain = VoiceMetrics {
            double_talk: None,
            ..metrics
        };
        let envelope = audio_envelope(Workload::VoicePipeline, &plain);
        match envelope.payload {
            Payload::AudioData(payload) => assert!(!payload.double_talk),
            _ => panic!("voiced frames must ship as audio data"),
        }
    }

    #[test]
    fn repeated_commands_keep_the_adapted_filters() {
        let clock = stepping(0);

        let shared = SharedState::new();
        let mut uninterrupted = Dispatcher::new(&shared, Timing::new(&clock, 128));
        on_message(&shared, &command(Workload::VoicePipelineAec)).unwrap();
        let _ = uninterrupted.run_once();
        let _ = uninterrupted.run_once();

        let shared = SharedState::new();
        let mut recommanded = Dispatcher::new(&shared, Timing::new(&clock, 128));
        on_message(&shared, &command(Workload::VoicePipelineAec)).unwrap();
        let _ = recommanded.run_once();
        on_message(&shared, &command(Workload::VoicePipelineAec)).unwrap();
        let _ = recommanded.run_once();

        let adapted = uninterrupted.processor().echo_filter().coefficients();
        assert!(adapted.iter().any(|c| *c != 0));
        assert_eq!(
            recommanded.processor().echo_filter().coefficients(),
            adapted
        );
    }

    #[test]
    fn switching_away_zeroes_the_adaptive_filters() {
        let shared = SharedState::new();
        let clock = stepping(0);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        on_message(&shared, &command(Workload::VoicePipelineAec)).unwrap();
        let _ = dispatcher.run_once();
        assert!(dispatcher
            .processor()
            .echo_filter()
            .coefficients()
            .iter()
            .any(|c| *c != 0));

        on_message(&shared, &command(Workload::SpatialNoiseCancel)).unwrap();
        let _ = dispatcher.run_once();
        assert!(dispatcher
            .processor()
            .echo_filter()
            .coefficients()
            .iter()
            .all(|c| *c == 0));
        assert!(dispatcher
            .processor()
            .spatial_filter()
            .filter()
            .iter()
            .any(|c| *c != 0));

        on_message(&shared, &command(Workload::Sorting)).unwrap();
        let _ = dispatcher.run_once();
        assert!(dispatcher
            .processor()
            .spatial_filter()
            .filter()
            .iter()
            .all(|c| *c == 0));
    }

    #[test]
    fn malformed_commands_are_rejected_and_change_nothing() {
        let shared = SharedState::new();
        let clock = stepping(25);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        let mut bytes = command(Workload::Idle);
        bytes[1] = 200;
        assert_eq!(
            on_message(&shared, &bytes),
            Err(MalformedMessage::UnknownWorkload)
        );
        assert_eq!(on_message(&shared, &bytes[..10]), Err(MalformedMessage::UnexpectedLength));
        assert_eq!(dispatcher.run_once(), Activity::Idle);
    }

    #[test]
    fn non_command_messages_are_ignored() {
        let shared = SharedState::new();
        let clock = stepping(25);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        let heartbeat = Envelope {
            workload: Workload::Idle,
            payload: Payload::Heartbeat,
        }
        .encode();
        on_message(&shared, &heartbeat).unwrap();
        assert_eq!(dispatcher.run_once(), Activity::Idle);
    }

    #[test]
    fn analysis_workloads_run_without_messages() {
        let shared = SharedState::new();
        let clock = stepping(10);
        let mut dispatcher = Dispatcher::new(&shared, Timing::new(&clock, 128));

        for workload in [
            Workload::ProximityVad,
            Workload::ChestResonance,
            Workload::ClothingRustle,
            Workload::SpatialNoiseCancel,
            Workload::WindNoiseReduction,
            Workload::NecklaceFull,
        ] {
            on_message(&shared, &command(workload)).unwrap();
            assert_eq!(dispatcher.run_once(), Activity::Busy { message: None });
            assert_eq!(shared.active_workload(), workload);
        }
    }
}
