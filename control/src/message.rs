//! Fixed-size wire frames exchanged between the two cores.
//!
//! Every frame is exactly [`ENVELOPE_SIZE`] bytes: a one-byte kind, a
//! one-byte workload ordinal, two reserved bytes, and a 20-byte
//! little-endian payload whose interpretation follows the kind.
//! Shorter or longer buffers are rejected rather than padded so that a
//! framing bug on either side surfaces immediately.

use crate::workload::Workload;

/// Total size of every frame on the interconnect.
pub const ENVELOPE_SIZE: usize = 24;

const PAYLOAD_SIZE: usize = 20;

const KIND_STATS: u8 = 1;
const KIND_SET_WORKLOAD: u8 = 2;
const KIND_HEARTBEAT: u8 = 3;
const KIND_AUDIO_DATA: u8 = 4;

/// Telemetry deltas covering one reporting interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsPayload {
    pub cycle_delta: u64,
    pub iteration_delta: u32,
    pub mips: u32,
    pub cpu_percent: u32,
}

/// Leading samples and metrics of one voiced audio frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioDataPayload {
    pub samples: [i16; 4],
    pub energy: u32,
    pub zero_crossings: u32,
    pub double_talk: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Payload {
    Stats(StatsPayload),
    SetWorkload,
    Heartbeat,
    AudioData(AudioDataPayload),
}

/// One frame: the workload it concerns and its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Envelope {
    pub workload: Workload,
    pub payload: Payload,
}

/// Raised when a received buffer does not parse as a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MalformedMessage {
    UnexpectedLength,
    UnknownKind,
    UnknownWorkload,
}

impl Envelope {
    #[must_use]
    pub fn encode(&self) -> [u8; ENVELOPE_SIZE] {
        let mut bytes = [0u8; ENVELOPE_SIZE];
        bytes[0] = match self.payload {
            Payload::Stats(_) => KIND_STATS,
            Payload::SetWorkload => KIND_SET_WORKLOAD,
            Payload::Heartbeat => KIND_HEARTBEAT,
            Payload::AudioData(_) => KIND_AUDIO_DATA,
        };
        bytes[1] = self.workload.ordinal();

        let payload = &mut bytes[4..];
        match self.payload {
            Payload::Stats(stats) => {
                payload[0..8].copy_from_slice(&stats.cycle_delta.to_le_bytes());
                payload[8..12].copy_from_slice(&stats.iteration_delta.to_le_bytes());
                payload[12..16].copy_from_slice(&stats.mips.to_le_bytes());
                payload[16..20].copy_from_slice(&stats.cpu_percent.to_le_bytes());
            }
            Payload::AudioData(audio) => {
                for (i, sample) in audio.samples.iter().enumerate() {
                    payload[i * 2..i * 2 + 2].copy_from_slice(&sample.to_le_bytes());
                }
                payload[8..12].copy_from_slice(&audio.energy.to_le_bytes());
                payload[12..16].copy_from_slice(&audio.zero_crossings.to_le_bytes());
                payload[16..20].copy_from_slice(&u32::from(audio.double_talk).to_le_bytes());
            }
            Payload::SetWorkload | Payload::Heartbeat => (),
        }

        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MalformedMessage> {
        if bytes.len() != ENVELOPE_SIZE {
            return Err(MalformedMessage::UnexpectedLength);
        }

        let workload =
            Workload::from_ordinal(bytes[1]).ok_or(MalformedMessage::UnknownWorkload)?;
        let payload = &bytes[4..];

        let payload = match bytes[0] {
            KIND_STATS => Payload::Stats(StatsPayload {
                cycle_delta: u64::from_le_bytes(section(payload, 0)),
                iteration_delta: u32::from_le_bytes(section(payload, 8)),
                mips: u32::from_le_bytes(section(payload, 12)),
                cpu_percent: u32::from_le_bytes(section(payload, 16)),
            }),
            KIND_SET_WORKLOAD => Payload::SetWorkload,
            KIND_HEARTBEAT => Payload::Heartbeat,
            KIND_AUDIO_DATA => {
                let mut samples = [0i16; 4];
                for (i, sample) in samples.iter_mut().enumerate() {
                    *sample = i16::from_le_bytes(section(payload, i * 2));
                }
                Payload::AudioData(AudioDataPayload {
                    samples,
                    energy: u32::from_le_bytes(section(payload, 8)),
                    zero_crossings: u32::from_le_bytes(section(payload, 12)),
                    double_talk: u32::from_le_bytes(section(payload, 16)) != 0,
                })
            }
            _ => return Err(MalformedMessage::UnknownKind),
        };

        Ok(Envelope { workload, payload })
    }
}

fn section<const N: usize>(payload: &[u8], offset: usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&payload[offset..offset + N]);
    bytes
}

const _: () = assert!(PAYLOAD_SIZE + 4 == ENVELOPE_SIZE);
