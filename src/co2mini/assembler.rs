use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use crate::co2mini::{FRAME_LEN, FrameData, Reading, decode_frame};

/// Source of raw device frames.
///
/// `read` blocks for at most `timeout` and returns the number of bytes
/// written into `buf`; `Ok(0)` means no data arrived before the timeout.
pub trait FrameSource {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;
}

#[derive(Debug, Error)]
pub enum ReadError {
    /// Shutdown was requested while waiting for sensor data. A normal
    /// termination path, not a device fault.
    #[error("interrupted while waiting for sensor data")]
    Cancelled,

    /// The device handle failed. Not retried here; the caller owns teardown.
    #[error("failed to read from sensor device")]
    Device(#[source] anyhow::Error),
}

/// Pulls frames from `source` until both CO2 and temperature have been
/// observed, then returns a [`Reading`] stamped with the current wall-clock
/// time in `timezone`.
///
/// Every call starts from a clean slate; nothing carries over from earlier
/// readings. Empty reads (timeout with no data) are retried. Humidity is
/// best-effort: it is attached only if a humidity frame arrived in the
/// current accumulation window, and completion does not wait for it.
///
/// `cancel` is checked before every read so that a shutdown request raised
/// during the blocking loop unwinds promptly with [`ReadError::Cancelled`].
pub fn next_reading<S: FrameSource>(
    source: &mut S,
    timeout: Duration,
    cancel: &AtomicBool,
    timezone: Tz,
) -> Result<Reading, ReadError> {
    let mut co2_ppm = None;
    let mut temperature_celsius = None;
    let mut humidity_percent = None;

    let mut buf = [0u8; FRAME_LEN];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(ReadError::Cancelled);
        }

        let n = source.read(&mut buf, timeout).map_err(ReadError::Device)?;
        if n == 0 {
            debug!("no sensor data received within timeout, retrying");
            continue;
        }

        match decode_frame(&buf[..n]) {
            Some(FrameData::Co2Ppm(v)) => co2_ppm = Some(v),
            Some(FrameData::TemperatureCelsius(v)) => temperature_celsius = Some(v),
            Some(FrameData::HumidityPercent(v)) => humidity_percent = Some(v),
            None => {}
        }

        if let (Some(co2_ppm), Some(temperature_celsius)) = (co2_ppm, temperature_celsius) {
            return Ok(Reading {
                measured_at: Utc::now().with_timezone(&timezone),
                co2_ppm,
                temperature_celsius,
                humidity_percent,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::anyhow;
    use chrono_tz::Tz;

    use super::*;

    struct ScriptedSource {
        reads: VecDeque<Result<Vec<u8>>>,
    }

    impl ScriptedSource {
        fn new(reads: impl IntoIterator<Item = Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into_iter().collect(),
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
            let data = self
                .reads
                .pop_front()
                .expect("scripted source exhausted")?;
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        }
    }

    fn frame(key: u8, value: u16) -> Result<Vec<u8>> {
        let [hi, lo] = value.to_be_bytes();
        Ok(vec![key, hi, lo, 0, 0, 0, 0, 0])
    }

    const TIMEOUT: Duration = Duration::from_millis(10);

    fn read_one(source: &mut ScriptedSource) -> Result<Reading, ReadError> {
        next_reading(source, TIMEOUT, &AtomicBool::new(false), Tz::UTC)
    }

    #[test]
    fn test_completes_without_humidity() {
        let mut source = ScriptedSource::new([frame(0x50, 500), frame(0x42, 4633)]);

        let reading = read_one(&mut source).unwrap();
        assert_eq!(reading.co2_ppm, 500);
        assert!((reading.temperature_celsius - (4633.0 / 16.0 - 273.15)).abs() < 1e-9);
        assert_eq!(reading.humidity_percent, None);
    }

    #[test]
    fn test_attaches_humidity_when_observed() {
        let mut source =
            ScriptedSource::new([frame(0x41, 5500), frame(0x42, 4633), frame(0x50, 600)]);

        let reading = read_one(&mut source).unwrap();
        assert_eq!(reading.co2_ppm, 600);
        assert_eq!(reading.humidity_percent, Some(55.0));
    }

    #[test]
    fn test_zero_humidity_is_observed() {
        let mut source =
            ScriptedSource::new([frame(0x41, 0), frame(0x50, 500), frame(0x42, 4633)]);

        let reading = read_one(&mut source).unwrap();
        assert_eq!(reading.humidity_percent, Some(0.0));
    }

    #[test]
    fn test_empty_reads_are_retried() {
        let mut source = ScriptedSource::new([
            Ok(vec![]),
            frame(0x50, 500),
            Ok(vec![]),
            frame(0x42, 4633),
        ]);

        let reading = read_one(&mut source).unwrap();
        assert_eq!(reading.co2_ppm, 500);
    }

    #[test]
    fn test_unknown_frames_are_ignored() {
        let mut source =
            ScriptedSource::new([frame(0x6d, 1234), frame(0x50, 500), frame(0x42, 4633)]);

        let reading = read_one(&mut source).unwrap();
        assert_eq!(reading.co2_ppm, 500);
    }

    #[test]
    fn test_no_carry_over_between_readings() {
        let mut source = ScriptedSource::new([
            frame(0x41, 5500),
            frame(0x50, 500),
            frame(0x42, 4633),
            // Second cycle: no humidity, fresh CO2 and temperature required.
            frame(0x42, 4700),
            frame(0x50, 600),
        ]);

        let first = read_one(&mut source).unwrap();
        assert_eq!(first.co2_ppm, 500);
        assert_eq!(first.humidity_percent, Some(55.0));

        let second = read_one(&mut source).unwrap();
        assert_eq!(second.co2_ppm, 600);
        assert!((second.temperature_celsius - (4700.0 / 16.0 - 273.15)).abs() < 1e-9);
        assert_eq!(second.humidity_percent, None);
    }

    #[test]
    fn test_device_error_propagates() {
        let mut source = ScriptedSource::new([frame(0x50, 500), Err(anyhow!("device unplugged"))]);

        let err = read_one(&mut source).unwrap_err();
        assert!(matches!(err, ReadError::Device(_)));
    }

    #[test]
    fn test_cancellation_unwinds_before_reading() {
        let mut source = ScriptedSource::new([frame(0x50, 500)]);

        let cancel = AtomicBool::new(true);
        let err = next_reading(&mut source, TIMEOUT, &cancel, Tz::UTC).unwrap_err();
        assert!(matches!(err, ReadError::Cancelled));
        // The scripted frame is still queued; nothing was consumed.
        assert_eq!(source.reads.len(), 1);
    }
}
