use chrono::DateTime;
use chrono_tz::Tz;

/// One fully assembled set of sensor quantities, captured at one wall-clock
/// instant. The device does not send a humidity frame on every cycle, so
/// humidity is attached only when it was observed during assembly; `0.0` is a
/// valid observed value, distinct from absent.
#[derive(Debug, Clone)]
pub struct Reading {
    pub measured_at: DateTime<Tz>,

    pub co2_ppm: u16,

    pub temperature_celsius: f64,

    pub humidity_percent: Option<f64>,
}
