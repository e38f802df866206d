use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use tracing::error;

/// Power at or below which the level reads as zero.
pub const METER_FLOOR_DB: f32 = -60.0;

/// Power reported for digital silence.
pub const SILENCE_DB: f32 = -160.0;

/// Map an average power reading in dBFS onto `[0, 1]`.
///
/// `-60 dB` and below read as `0`, `0 dB` and above as `1`, linear in between.
pub fn normalize_level(power_db: f32) -> f32 {
    if power_db.is_nan() {
        return 0.0;
    }
    ((power_db - METER_FLOOR_DB) / -METER_FLOOR_DB).clamp(0.0, 1.0)
}

/// Convert a mean square amplitude into dBFS, floored at [`SILENCE_DB`].
pub fn power_db(mean_square: f64) -> f32 {
    if mean_square.is_nan() || mean_square <= 0.0 {
        return SILENCE_DB;
    }
    let db = 10.0 * mean_square.log10();
    (db as f32).max(SILENCE_DB)
}

#[derive(Debug, Default)]
struct MeterWindow {
    sum_squares: f64,
    count: u64,
}

/// Average power meter shared between an audio callback and its device.
///
/// The callback accumulates samples; `refresh` folds everything received
/// since the previous refresh into one reading.
#[derive(Debug)]
pub(crate) struct PowerMeter {
    enabled: AtomicBool,
    window: Mutex<MeterWindow>,
    average_db: AtomicU32,
}

impl PowerMeter {
    pub(crate) fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            window: Mutex::new(MeterWindow::default()),
            average_db: AtomicU32::new(SILENCE_DB.to_bits()),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.average_db.store(SILENCE_DB.to_bits(), Ordering::Release);
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Called from the audio callback.
    pub(crate) fn accumulate(&self, samples: &[f32]) {
        if !self.is_enabled() || samples.is_empty() {
            return;
        }

        let sum: f64 = samples
            .iter()
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();

        let mut window = self.window.lock().unwrap_or_else(|e| {
            error!("Meter window lock poisoned, recovering: {}", e);
            e.into_inner()
        });
        window.sum_squares += sum;
        window.count += samples.len() as u64;
    }

    /// Fold pending samples into a new reading.
    ///
    /// Keeps the previous reading when nothing arrived since the last call.
    pub(crate) fn refresh(&self) -> f32 {
        if !self.is_enabled() {
            return SILENCE_DB;
        }

        let window = {
            let mut guard = self.window.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        if window.count > 0 {
            let db = power_db(window.sum_squares / window.count as f64);
            self.average_db.store(db.to_bits(), Ordering::Release);
        }

        self.average_power()
    }

    pub(crate) fn average_power(&self) -> f32 {
        f32::from_bits(self.average_db.load(Ordering::Acquire))
    }
}
