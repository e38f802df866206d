/// File extension of every recording.
pub const AUDIO_EXTENSION: &str = "m4a";

/// Lossy codec used for recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    /// MPEG-4 AAC in an M4A container.
    Aac,
}

impl AudioCodec {
    /// Encoder name understood by ffmpeg.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            Self::Aac => "aac",
        }
    }
}

/// Encoder quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EncoderQuality {
    /// Smallest files.
    Min,
    /// Below average.
    Low,
    /// Balanced.
    Medium,
    /// Recommended for speech that will be transcribed.
    High,
    /// Largest files.
    Max,
}

impl EncoderQuality {
    /// Target bitrate for a mono stream at this quality.
    pub fn mono_bitrate_kbps(self) -> u32 {
        match self {
            Self::Min => 32,
            Self::Low => 48,
            Self::Medium => 64,
            Self::High => 96,
            Self::Max => 128,
        }
    }
}

/// Encoding parameters handed to a capture backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    /// Output codec.
    pub codec: AudioCodec,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    /// Encoder quality tier.
    pub quality: EncoderQuality,
}

/// The only settings recordings are made with.
///
/// Downstream transcription relies on this format; it is not configurable.
pub const RECORDING_SETTINGS: EncoderSettings = EncoderSettings {
    codec: AudioCodec::Aac,
    sample_rate: 44_100,
    channels: 1,
    quality: EncoderQuality::High,
};
