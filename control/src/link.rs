//! Radio-core bookkeeping: throughput accounting, the telemetry hub,
//! and workload command forwarding.
//!
//! The radio core's CPU load is not measured, it is modelled from
//! throughput: a base overhead for keeping the connection alive plus a
//! per-kilobyte cost for packet processing. The model is coarse but
//! stable, which makes runs comparable.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::HistoryBuffer;

use crate::log;
use crate::message::{Envelope, Payload, StatsPayload};
use crate::reporter::REPORT_INTERVAL_MS;
use crate::transport::{Delay, SendError, Transport};
use crate::workload::Workload;

/// Baseline radio-core load for connection maintenance.
const BASE_OVERHEAD_PERCENT: u32 = 10;

/// Audio frames above this energy count as voiced in hub statistics.
const VOICE_ENERGY_THRESHOLD: u32 = 1000;

/// Voiced-frame energies kept for the rolling average.
const ENERGY_HISTORY: usize = 16;

/// How long and how often to retry a command while the interconnect
/// comes up.
pub const COMMAND_RETRY_LIMIT: u32 = 20;
pub const COMMAND_RETRY_DELAY_MS: u32 = 100;

/// Byte counters bumped from the radio stack's callbacks.
#[derive(Debug, Default)]
pub struct LinkCounters {
    bytes_sent: AtomicU32,
    bytes_received: AtomicU32,
}

impl LinkCounters {
    pub fn record_sent(&self, bytes: u32) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_received(&self, bytes: u32) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Throughput and modelled load over one reporting interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkReport {
    pub tx_kbps: u32,
    pub rx_kbps: u32,
    pub radio_cpu_percent: u32,
}

/// Turns the raw byte counters into per-interval reports.
#[derive(Debug, Default)]
pub struct LinkMonitor {
    previous_sent: u32,
    previous_received: u32,
}

impl LinkMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, counters: &LinkCounters) -> LinkReport {
        let sent = counters.bytes_sent.load(Ordering::Relaxed);
        let received = counters.bytes_received.load(Ordering::Relaxed);
        let sent_delta = sent.wrapping_sub(self.previous_sent);
        let received_delta = received.wrapping_sub(self.previous_received);
        self.previous_sent = sent;
        self.previous_received = received;

        let total_bytes = sent_delta + received_delta;
        let kilobytes_per_second = total_bytes / 1000;
        let throughput_cost = (kilobytes_per_second * 5) / 10;

        LinkReport {
            tx_kbps: (sent_delta * 8) / REPORT_INTERVAL_MS,
            rx_kbps: (received_delta * 8) / REPORT_INTERVAL_MS,
            radio_cpu_percent: (BASE_OVERHEAD_PERCENT + throughput_cost).min(100),
        }
    }
}

/// Delay between outgoing stream packets for a target rate. Zero means
/// unpaced, which still backs off a little to keep the stack's buffers
/// from overflowing.
#[must_use]
pub fn pacing_delay_ms(payload_len: usize, target_kbps: u32) -> u32 {
    if target_kbps == 0 {
        return 10;
    }
    let bytes_per_second = (target_kbps * 1000) / 8;
    let delay = (payload_len as u32 * 1000) / bytes_per_second;
    delay.max(5)
}

/// Latest stats frame received from the compute core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteStats {
    pub workload: Workload,
    pub stats: StatsPayload,
}

/// Collects everything the compute core sends over the interconnect.
#[derive(Default)]
pub struct Hub {
    remote: Option<RemoteStats>,
    audio_frames: u32,
    voiced_frames: u32,
    heartbeats: u32,
    recent_energy: HistoryBuffer<u32, ENERGY_HISTORY>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message(&mut self, envelope: &Envelope) {
        match envelope.payload {
            Payload::Stats(stats) => {
                log::info!("Compute stats: {} at {}%", stats.mips, stats.cpu_percent);
                self.remote = Some(RemoteStats {
                    workload: envelope.workload,
                    stats,
                });
            }
            Payload::AudioData(audio) => {
                self.audio_frames = self.audio_frames.wrapping_add(1);
                if audio.energy > VOICE_ENERGY_THRESHOLD {
                    self.voiced_frames = self.voiced_frames.wrapping_add(1);
                    self.recent_energy.write(audio.energy);
                }
            }
            Payload::Heartbeat => {
                self.heartbeats = self.heartbeats.wrapping_add(1);
            }
            Payload::SetWorkload => {
                log::warn!("Dropping command frame addressed to the compute core");
            }
        }
    }

    #[must_use]
    pub fn remote_stats(&self) -> Option<&RemoteStats> {
        self.remote.as_ref()
    }

    #[must_use]
    pub fn audio_frames(&self) -> u32 {
        self.audio_frames
    }

    #[must_use]
    pub fn heartbeats(&self) -> u32 {
        self.heartbeats
    }

    /// Share of received audio frames that carried voice, once any
    /// frame has arrived.
    #[must_use]
    pub fn voice_activity_percent(&self) -> Option<u32> {
        if self.audio_frames == 0 {
            return None;
        }
        Some((self.voiced_frames * 100) / self.audio_frames)
    }

    /// Rolling average energy of recent voiced frames.
    #[must_use]
    pub fn average_voice_energy(&self) -> Option<u32> {
        let recent = self.recent_energy.as_slice();
        if recent.is_empty() {
            return None;
        }
        let sum: u64 = recent.iter().map(|energy| u64::from(*energy)).sum();
        Some((sum / recent.len() as u64) as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The selector does not name a workload.
    InvalidSelector,
    /// The interconnect did not come up within the retry budget.
    TransportUnavailable,
    /// The interconnect rejected the frame.
    SendFailed,
}

/// Validates a host-written workload selector and forwards it to the
/// compute core, waiting for the interconnect to come up if needed.
pub fn forward_workload_command<T: Transport, D: Delay>(
    transport: &mut T,
    delay: &mut D,
    selector: u8,
) -> Result<Workload, CommandError> {
    let workload = Workload::from_ordinal(selector).ok_or(CommandError::InvalidSelector)?;
    let envelope = Envelope {
        workload,
        payload: Payload::SetWorkload,
    };

    for _ in 0..COMMAND_RETRY_LIMIT {
        match transport.send(&envelope) {
            Ok(()) => {
                log::info!("Forwarded workload command {}", workload);
                return Ok(workload);
            }
            Err(SendError::NotReady) => delay.delay_ms(COMMAND_RETRY_DELAY_MS),
            Err(SendError::Failed) => return Err(CommandError::SendFailed),
        }
    }

    Err(CommandError::TransportUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::AudioDataPayload;

    fn audio_frame(energy: u32) -> Envelope {
        Envelope {
            workload: Workload::VoicePipeline,
            payload: Payload::AudioData(AudioDataPayload {
                samples: [0; 4],
                energy,
                zero_crossings: 20,
                double_talk: false,
            }),
        }
    }

    #[test]
    fn monitor_reports_interval_deltas() {
        let counters = LinkCounters::default();
        let mut monitor = LinkMonitor::new();

        counters.record_sent(125_000);
        counters.record_received(2_000);
        let report = monitor.tick(&counters);
        assert_eq!(report.tx_kbps, 1000);
        assert_eq!(report.rx_kbps, 16);
        assert_eq!(report.radio_cpu_percent, 10 + 63);

        // No further traffic: the next interval drops to the baseline.
        let quiet = monitor.tick(&counters);
        assert_eq!(quiet.tx_kbps, 0);
        assert_eq!(quiet.rx_kbps, 0);
        assert_eq!(quiet.radio_cpu_percent, BASE_OVERHEAD_PERCENT);
    }

    #[test]
    fn modelled_load_is_capped() {
        let counters = LinkCounters::default();
        let mut monitor = LinkMonitor::new();
        counters.record_sent(20_000_000);
        assert_eq!(monitor.tick(&counters).radio_cpu_percent, 100);
    }

    #[test]
    fn unpaced_streams_use_the_minimal_backoff() {
        assert_eq!(pacing_delay_ms(495, 0), 10);
    }

    #[test]
    fn paced_streams_match_the_target_rate() {
        // 100 kbps is 12500 bytes per second; a 495-byte packet every
        // 39 ms approximates it.
        assert_eq!(pacing_delay_ms(495, 100), 39);
    }

    #[test]
    fn pacing_never_drops_below_the_floor() {
        assert_eq!(pacing_delay_ms(495, 2000), 5);
    }

    #[test]
    fn hub_tracks_voice_activity() {
        let mut hub = Hub::new();
        assert_eq!(hub.voice_activity_percent(), None);

        hub.on_message(&audio_frame(2000));
        hub.on_message(&audio_frame(500));
        hub.on_message(&audio_frame(3000));
        assert_eq!(hub.audio_frames(), 3);
        assert_eq!(hub.voice_activity_percent(), Some(66));
        assert_eq!(hub.average_voice_energy(), Some(2500));
    }

    #[test]
    fn hub_keeps_the_latest_stats() {
        let mut hub = Hub::new();
        assert!(hub.remote_stats().is_none());

        for mips in [5, 9] {
            hub.on_message(&Envelope {
                workload: Workload::Fft,
                payload: Payload::Stats(StatsPayload {
                    cycle_delta: 1000,
                    iteration_delta: 4,
                    mips,
                    cpu_percent: 7,
                }),
            });
        }

        let remote = hub.remote_stats().unwrap();
        assert_eq!(remote.workload, Workload::Fft);
        assert_eq!(remote.stats.mips, 9);
    }

    struct FlakyTransport {
        failures_left: u32,
        sent: Option<Envelope>,
    }

    impl Transport for FlakyTransport {
        fn send(&mut self, envelope: &Envelope) -> Result<(), SendError> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(SendError::NotReady);
            }
            self.sent = Some(*envelope);
            Ok(())
        }
    }

    struct CountingDelay {
        total_ms: u32,
    }

    impl Delay for CountingDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    #[test]
    fn commands_with_unknown_selectors_are_rejected() {
        let mut transport = FlakyTransport {
            failures_left: 0,
            sent: None,
        };
        let mut delay = CountingDelay { total_ms: 0 };
        assert_eq!(
            forward_workload_command(&mut transport, &mut delay, 14),
            Err(CommandError::InvalidSelector)
        );
        assert!(transport.sent.is_none());
    }

    #[test]
    fn commands_wait_for_the_interconnect() {
        let mut transport = FlakyTransport {
            failures_left: 3,
            sent: None,
        };
        let mut delay = CountingDelay { total_ms: 0 };
        assert_eq!(
            forward_workload_command(&mut transport, &mut delay, 2),
            Ok(Workload::Sorting)
        );
        assert_eq!(delay.total_ms, 3 * COMMAND_RETRY_DELAY_MS);
        let sent = transport.sent.unwrap();
        assert_eq!(sent.workload, Workload::Sorting);
        assert_eq!(sent.payload, Payload::SetWorkload);
    }

    #[test]
    fn commands_give_up_after_the_retry_budget() {
        let mut transport = FlakyTransport {
            failures_left: u32::MAX,
            sent: None,
        };
        let mut delay = CountingDelay { total_ms: 0 };
        assert_eq!(
            forward_workload_command(&mut transport, &mut delay, 2),
            Err(CommandError::TransportUnavailable)
        );
        assert_eq!(delay.total_ms, COMMAND_RETRY_LIMIT * COMMAND_RETRY_DELAY_MS);
    }
}
