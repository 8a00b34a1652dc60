/// Length of one raw report from the CO2 monitor.
pub const FRAME_LEN: usize = 8;

const KEY_CO2: u8 = 0x50;
const KEY_TEMPERATURE: u8 = 0x42;
const KEY_HUMIDITY: u8 = 0x41;

/// One quantity carried by a single device frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameData {
    Co2Ppm(u16),
    TemperatureCelsius(f64),
    HumidityPercent(f64),
}

/// Decodes one raw frame. The key byte at offset 0 selects the quantity and
/// the big-endian `u16` at offsets 1-2 carries the raw value. Frames with an
/// unknown key, and frames too short to hold a value, yield `None`.
pub fn decode_frame(frame: &[u8]) -> Option<FrameData> {
    if frame.len() < 3 {
        return None;
    }

    let raw = u16::from_be_bytes([frame[1], frame[2]]);

    match frame[0] {
        KEY_CO2 => Some(FrameData::Co2Ppm(raw)),
        // The device reports temperature in 1/16 K.
        KEY_TEMPERATURE => Some(FrameData::TemperatureCelsius(raw as f64 / 16.0 - 273.15)),
        KEY_HUMIDITY => Some(FrameData::HumidityPercent(raw as f64 / 100.0)),
        _ => None,
    }
}
