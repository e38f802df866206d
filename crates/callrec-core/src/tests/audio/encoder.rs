use crate::{FfmpegEncoder, RECORDING_SETTINGS, RecorderError};

use std::path::Path;

/// WHAT: ffmpeg is told the device format on input and the recording format on output
/// WHY: Devices capture at their native rate and channel count
#[test]
fn given_stereo_48k_input_when_building_args_then_downmixed_to_recording_format() {
    // Given: A stereo 48 kHz device
    let destination = Path::new("/tmp/recordings/m1.m4a");

    // When: Building the ffmpeg arguments
    let args = FfmpegEncoder::command_args(destination, 48_000, 2, &RECORDING_SETTINGS);

    // Then: Raw f32 input at 48k stereo, AAC mono 44.1k output at 96k
    let joined = args.join(" ");
    assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i pipe:0"));
    assert!(joined.contains("-ac 1 -ar 44100 -c:a aac -b:a 96k"));
    assert_eq!(args.last().map(String::as_str), Some("/tmp/recordings/m1.m4a"));
    assert!(args.iter().any(|arg| arg == "-y"));
}

/// WHAT: A missing ffmpeg binary fails device setup
/// WHY: The user must learn the encoder is missing before recording starts
#[test]
fn given_missing_ffmpeg_when_spawning_then_device_setup_failed() {
    // Given: A path that is not an executable
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = dir.path().join("no-such-ffmpeg");

    // When: Spawning the encoder
    let result = FfmpegEncoder::spawn(
        &ffmpeg,
        &dir.path().join("m1.m4a"),
        48_000,
        1,
        &RECORDING_SETTINGS,
    );

    // Then: Setup failure naming the encoder
    match result {
        Err(RecorderError::DeviceSetupFailed { reason, .. }) => {
            assert!(reason.contains("Failed to launch encoder"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("encoder should not start"),
    }
}

/// WHAT: The destination is created and truncated before the encoder runs
/// WHY: A start that returns success must already own a writable file
#[cfg(unix)]
#[test]
fn given_stale_recording_when_spawning_then_destination_truncated() {
    // Given: A previous recording of the same meeting in a nested directory
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("nested").join("m1.m4a");
    std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
    std::fs::write(&destination, b"old audio").unwrap();

    // When: Spawning an encoder that never writes anything itself
    let encoder =
        FfmpegEncoder::spawn(Path::new("true"), &destination, 48_000, 1, &RECORDING_SETTINGS)
            .unwrap();

    // Then: The file exists and is empty at construction
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), 0);
    encoder.abort();
}

/// WHAT: An unwritable destination fails device setup before ffmpeg starts
/// WHY: Meeting metadata is only written back when recording really started
#[test]
fn given_unwritable_destination_when_spawning_then_device_setup_failed() {
    // Given: A destination whose parent is a regular file
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let destination = blocker.join("m1.m4a");

    // When: Spawning with an encoder binary that would otherwise launch
    let result = FfmpegEncoder::spawn(
        Path::new("true"),
        &destination,
        48_000,
        1,
        &RECORDING_SETTINGS,
    );

    // Then: Setup failure naming the recording directory
    match result {
        Err(RecorderError::DeviceSetupFailed { reason, .. }) => {
            assert!(reason.contains("Failed to create recording"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("encoder should not start"),
    }
    assert!(!destination.exists());
}

/// WHAT: Encoding one second of silence produces a finalized file
/// WHY: Verifies the real ffmpeg pipeline end to end
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_real_ffmpeg_when_encoding_silence_then_file_written() {
    // Given: A running encoder
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("silence.m4a");
    let ffmpeg = std::env::var("TEST_FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());
    let mut encoder = FfmpegEncoder::spawn(
        Path::new(&ffmpeg),
        &destination,
        48_000,
        1,
        &RECORDING_SETTINGS,
    )
    .unwrap();

    // When: Writing one second of silence and finishing
    encoder.write_samples(&vec![0.0; 48_000]).unwrap();
    let finalized = encoder.finish().unwrap();

    // Then: ffmpeg succeeded and wrote the file
    assert!(finalized);
    assert!(std::fs::metadata(&destination).unwrap().len() > 0);
}
