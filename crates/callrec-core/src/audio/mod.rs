mod cpal_backend;
mod device;
mod encoder;
mod meter;
mod settings;
pub(crate) mod writer;

pub(crate) use meter::PowerMeter;

pub use {
    cpal_backend::CpalBackend,
    device::{CaptureBackend, CaptureDevice, CaptureSignal, DeviceEvent, DeviceEventSender, SessionId},
    encoder::FfmpegEncoder,
    meter::{METER_FLOOR_DB, SILENCE_DB, normalize_level, power_db},
    settings::{AUDIO_EXTENSION, AudioCodec, EncoderQuality, EncoderSettings, RECORDING_SETTINGS},
};
