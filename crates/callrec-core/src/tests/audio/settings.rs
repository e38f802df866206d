use crate::{AUDIO_EXTENSION, AudioCodec, EncoderQuality, RECORDING_SETTINGS};

/// WHAT: Recordings are mono 44.1 kHz AAC at high quality
/// WHY: Transcription expects this format and predictable file sizes
#[test]
fn given_recording_settings_when_inspected_then_fixed_format() {
    // Given / When / Then
    assert_eq!(RECORDING_SETTINGS.codec, AudioCodec::Aac);
    assert_eq!(RECORDING_SETTINGS.sample_rate, 44_100);
    assert_eq!(RECORDING_SETTINGS.channels, 1);
    assert_eq!(RECORDING_SETTINGS.quality, EncoderQuality::High);
    assert_eq!(AUDIO_EXTENSION, "m4a");
}

/// WHAT: Higher quality tiers never lower the bitrate
/// WHY: Quality ordering must match file size ordering
#[test]
fn given_quality_tiers_when_ordered_then_bitrates_increase() {
    // Given: Tiers from lowest to highest
    let tiers = [
        EncoderQuality::Min,
        EncoderQuality::Low,
        EncoderQuality::Medium,
        EncoderQuality::High,
        EncoderQuality::Max,
    ];

    // When / Then: Strictly increasing bitrate
    assert!(
        tiers
            .windows(2)
            .all(|pair| pair[0].mono_bitrate_kbps() < pair[1].mono_bitrate_kbps())
    );
    assert_eq!(EncoderQuality::High.mono_bitrate_kbps(), 96);
}
