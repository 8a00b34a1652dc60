use std::time::Duration;

use anyhow::{Context as _, Result};
use hidapi::{HidApi, HidDevice};

use co2mon::co2mini::FrameSource;

// USB ids of the TFA AIRCO2NTROL MINI / CO2Mini family of monitors.
pub const VENDOR_ID: u16 = 0x04d9;
pub const PRODUCT_ID: u16 = 0xa052;

/// Exclusively owned handle to the monitor. Dropping it closes the device.
pub struct HidFrameSource {
    device: HidDevice,
}

impl HidFrameSource {
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = HidApi::new().context("failed to initialize the HID API")?;

        let device = api.open(vendor_id, product_id).with_context(|| {
            format!("failed to open HID device {vendor_id:04x}:{product_id:04x}")
        })?;

        Ok(Self { device })
    }
}

impl FrameSource for HidFrameSource {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        self.device
            .read_timeout(buf, millis)
            .context("failed to read from HID device")
    }
}
