use serde::{Deserialize, Serialize};
use std::fmt;

/// The ten physical buttons of the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Left,
    Right,
    Up,
    Down,
    Plus,
    One,
    Two,
    A,
    B,
    Minus,
}

impl ButtonId {
    /// Every button, in a fixed order usable as an array index.
    pub const ALL: [ButtonId; 10] = [
        ButtonId::Left,
        ButtonId::Right,
        ButtonId::Up,
        ButtonId::Down,
        ButtonId::Plus,
        ButtonId::One,
        ButtonId::Two,
        ButtonId::A,
        ButtonId::B,
        ButtonId::Minus,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ButtonId::Left => "Left",
            ButtonId::Right => "Right",
            ButtonId::Up => "Up",
            ButtonId::Down => "Down",
            ButtonId::Plus => "Plus",
            ButtonId::One => "One",
            ButtonId::Two => "Two",
            ButtonId::A => "A",
            ButtonId::B => "B",
            ButtonId::Minus => "Minus",
        };
        f.write_str(name)
    }
}

/// Bluetooth device address in transmission order:
/// `AA:BB:CC:DD:EE:FF` is `[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub [u8; 6]);

impl DeviceAddress {
    pub fn bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// One decoded 7-byte input report.
///
/// Byte layout: `[0]` report id (ignored by this driver), `[1]` reserved,
/// `[2]` buttons group A, `[3]` buttons group B, `[4..=6]` raw signed
/// accelerometer samples x, y, z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportFrame {
    pub report_id: u8,
    pub reserved: u8,
    pub buttons_a: u8,
    pub buttons_b: u8,
    pub accel: [i8; 3],
}

/// A normalized accelerometer triple, every axis in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A motion event delivered to the client: the sample that passed the
/// sensitivity filter plus the session's frozen rest baseline. An axis
/// above its boundary means positive acceleration on that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReading {
    pub sample: MotionSample,
    pub boundary: MotionSample,
}

/// Accelerometer sensitivity: the relative tolerance a new sample must
/// exceed on every axis before it is surfaced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sensitivity {
    /// No filtering; every post-calibration sample is surfaced.
    Off,
    /// 0.1% tolerance.
    High,
    /// 1% tolerance.
    Medium,
    /// 10% tolerance.
    Low,
    /// Raw tolerance fraction, must be non-negative.
    Custom(f64),
}

impl Sensitivity {
    /// The tolerance fraction this setting stands for.
    pub fn fraction(self) -> f64 {
        match self {
            Sensitivity::Off => 0.0,
            Sensitivity::High => 0.001,
            Sensitivity::Medium => 0.01,
            Sensitivity::Low => 0.1,
            Sensitivity::Custom(s) => s.max(0.0),
        }
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Sensitivity::Off
    }
}

/// Connection lifecycle of the driver.
///
/// `Disconnected → Discovering → Discovered → Connected → Streaming →
/// Disconnected`. Transitions are surfaced as [`WiimoteEvent::Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Discovering,
    Discovered,
    Connected,
    Streaming,
}

/// Event stream delivered to the client.
///
/// For a given button, `ButtonPressed` always precedes its
/// `ButtonReleased`; events across different buttons carry no ordering
/// guarantee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WiimoteEvent {
    ButtonPressed(ButtonId),
    ButtonReleased(ButtonId),
    Motion(MotionReading),
    Status(ConnectionStatus),
}
