//! Wii Remote wire protocol.
//!
//! Commands go out prefixed with the HID output header `0xA2`; input
//! reports arrive as fixed 7-byte frames once report mode `0x31`
//! (buttons + accelerometer) is enabled. Protocol reference: wiibrew.org.

use crate::domain::models::{ButtonId, DeviceAddress, ReportFrame};
use crate::error::DriverError;

/// L2CAP PSM of the HID control channel.
pub const CONTROL_PSM: u16 = 0x11;

/// L2CAP PSM of the HID data (interrupt) channel.
pub const DATA_PSM: u16 = 0x13;

/// Length of one input report in report mode 0x31.
pub const REPORT_LEN: usize = 7;

/// Friendly names the remote advertises. A scan candidate is accepted
/// only on an exact match.
pub const KNOWN_MODELS: &[&str] = &["Nintendo RVL-CNT-01", "Nintendo RVL-CNT-01-TR"];

pub fn is_known_model(name: &str) -> bool {
    KNOWN_MODELS.contains(&name)
}

/// Commands the driver sends over the data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Enable report mode 0x31: buttons + accelerometer.
    SetReportMode,
    /// Light one of the four LEDs (slot 1..=4).
    SetLed(u8),
    /// Rumble motor on/off.
    Rumble(bool),
}

impl Command {
    /// Raw bytes for this command.
    pub fn encode(self) -> Vec<u8> {
        match self {
            Command::SetReportMode => vec![0xA2, 0x12, 0x00, 0x31],
            Command::SetLed(slot) => vec![0xA2, 0x11, led_bit(slot)],
            Command::Rumble(true) => vec![0xA2, 0x10, 0x01],
            Command::Rumble(false) => vec![0xA2, 0x10, 0x00],
        }
    }
}

/// One-hot LED nibble. Out-of-range slots fall back to slot 1.
fn led_bit(slot: u8) -> u8 {
    match slot {
        2 => 0x20,
        3 => 0x40,
        4 => 0x80,
        _ => 0x10,
    }
}

/// Pairing payload sent on the control channel right after it opens:
/// the remote's own address bytes in reverse order.
pub fn pairing_payload(address: &DeviceAddress) -> [u8; 6] {
    let b = address.bytes();
    [b[5], b[4], b[3], b[2], b[1], b[0]]
}

/// Reinterpret one received frame. The only validation is the length;
/// everything else is taken at face value.
pub fn decode_report(bytes: &[u8]) -> Result<ReportFrame, DriverError> {
    if bytes.len() != REPORT_LEN {
        return Err(DriverError::Decode {
            expected: REPORT_LEN,
            got: bytes.len(),
        });
    }
    Ok(ReportFrame {
        report_id: bytes[0],
        reserved: bytes[1],
        buttons_a: bytes[2],
        buttons_b: bytes[3],
        accel: [bytes[4] as i8, bytes[5] as i8, bytes[6] as i8],
    })
}

/// Map a raw signed accelerometer byte onto `[0, 1)`.
///
/// Negative values wrap up by 256 before dividing by 256, so the result
/// is strictly below 1.0. The divisor is 256, not 255; this is the
/// device's established mapping, not a two's-complement cast over 255.
pub fn normalize_sample(raw: i8) -> f64 {
    let shifted = if raw < 0 {
        i16::from(raw) + 256
    } else {
        i16::from(raw)
    };
    f64::from(shifted) / 256.0
}

/// Button carried by a group-A byte (report byte 2). Exact match only: a
/// value that is the sum of two held bitmasks maps to no button, so
/// simultaneous presses within one group are not individually detected.
/// Inherited protocol limitation, kept as-is.
pub fn button_in_group_a(value: u8) -> Option<ButtonId> {
    match value {
        1 => Some(ButtonId::Left),
        2 => Some(ButtonId::Right),
        4 => Some(ButtonId::Down),
        8 => Some(ButtonId::Up),
        16 => Some(ButtonId::Plus),
        _ => None,
    }
}

/// Button carried by a group-B byte (report byte 3). Same exact-match
/// rule as group A.
pub fn button_in_group_b(value: u8) -> Option<ButtonId> {
    match value {
        1 => Some(ButtonId::Two),
        2 => Some(ButtonId::One),
        4 => Some(ButtonId::B),
        8 => Some(ButtonId::A),
        16 => Some(ButtonId::Minus),
        _ => None,
    }
}
