//! Workload selection shared by both cores and the host-facing
//! control surface.

/// Everything the compute core can be asked to run. The ordinal is the
/// wire representation and the value written to the control
/// characteristic by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Workload {
    Idle = 0,
    MatrixMultiply = 1,
    Sorting = 2,
    Fft = 3,
    Crypto = 4,
    Mixed = 5,
    VoicePipeline = 6,
    VoicePipelineAec = 7,
    ProximityVad = 8,
    ChestResonance = 9,
    ClothingRustle = 10,
    SpatialNoiseCancel = 11,
    WindNoiseReduction = 12,
    NecklaceFull = 13,
}

impl Workload {
    #[must_use]
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Idle),
            1 => Some(Self::MatrixMultiply),
            2 => Some(Self::Sorting),
            3 => Some(Self::Fft),
            4 => Some(Self::Crypto),
            5 => Some(Self::Mixed),
            6 => Some(Self::VoicePipeline),
            7 => Some(Self::VoicePipelineAec),
            8 => Some(Self::ProximityVad),
            9 => Some(Self::ChestResonance),
            10 => Some(Self::ClothingRustle),
            11 => Some(Self::SpatialNoiseCancel),
            12 => Some(Self::WindNoiseReduction),
            13 => Some(Self::NecklaceFull),
            _ => None,
        }
    }

    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The two workloads that stream audio frames to the radio core.
    #[must_use]
    pub fn is_voice_pipeline(self) -> bool {
        matches!(self, Self::VoicePipeline | Self::VoicePipelineAec)
    }
}
