//! Joystick input report (report protocol, no report ID prefix on the wire).
//!
//! Layout (9 bytes):
//! ```text
//! Byte 0-1: X axis      (u16 LE, value - 1000, 0..=1000)
//! Byte 2-3: Y axis      (u16 LE)
//! Byte 4-5: X rotation  (u16 LE)
//! Byte 6-7: Y rotation  (u16 LE)
//! Byte 8:   Buttons 1-8 (bit 0 = button 1)
//! ```
//!
//! The report ID lives in the GATT Report Reference descriptor, so BLE
//! notifications carry only these 9 bytes.

use super::{JoystickCommand, AXIS_MAX, AXIS_MIN};

/// Number of axis fields in the report.
pub const AXIS_COUNT: usize = 4;
/// Width of one axis field (bits).
pub const AXIS_FIELD_BITS: usize = 16;
/// Number of one-bit button fields.
pub const BUTTON_COUNT: usize = 8;
/// Logical maximum of an encoded axis field.
pub const AXIS_LOGICAL_MAX: u16 = AXIS_MAX - AXIS_MIN;

/// Joystick report size in bytes.
pub const JOYSTICK_REPORT_SIZE: usize = (AXIS_COUNT * AXIS_FIELD_BITS + BUTTON_COUNT) / 8;

const BUTTONS_OFFSET: usize = AXIS_COUNT * AXIS_FIELD_BITS / 8;

/// A joystick command packed into the wire layout declared by the report map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodedReport([u8; JOYSTICK_REPORT_SIZE]);

impl EncodedReport {
    /// Pack `cmd` into the report layout. Out-of-range axes saturate.
    pub fn encode(cmd: &JoystickCommand) -> Self {
        let (cmd, _) = cmd.clamped();
        let mut bytes = [0u8; JOYSTICK_REPORT_SIZE];
        for (i, axis) in cmd.axes().iter().enumerate() {
            let offset = (axis - AXIS_MIN).to_le_bytes();
            bytes[i * 2..i * 2 + 2].copy_from_slice(&offset);
        }
        bytes[BUTTONS_OFFSET] = cmd.buttons;
        Self(bytes)
    }

    /// The raw report bytes, ready for a GATT notification.
    pub fn as_bytes(&self) -> &[u8; JOYSTICK_REPORT_SIZE] {
        &self.0
    }

    /// Serialise into a byte slice.
    /// Returns the number of bytes written, or 0 if `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < JOYSTICK_REPORT_SIZE {
            return 0;
        }
        buf[..JOYSTICK_REPORT_SIZE].copy_from_slice(&self.0);
        JOYSTICK_REPORT_SIZE
    }

    /// Parse a received report back into a command.
    ///
    /// Returns `None` when `data` is shorter than a report or an axis field
    /// exceeds the logical maximum.
    pub fn decode(data: &[u8]) -> Option<JoystickCommand> {
        if data.len() < JOYSTICK_REPORT_SIZE {
            return None;
        }
        let mut axes = [0u16; AXIS_COUNT];
        for (i, axis) in axes.iter_mut().enumerate() {
            let raw = u16::from_le_bytes([data[i * 2], data[i * 2 + 1]]);
            if raw > AXIS_LOGICAL_MAX {
                return None;
            }
            *axis = raw + AXIS_MIN;
        }
        Some(JoystickCommand::new(
            data[BUTTONS_OFFSET],
            axes[0],
            axes[1],
            axes[2],
            axes[3],
        ))
    }
}

impl From<&JoystickCommand> for EncodedReport {
    fn from(cmd: &JoystickCommand) -> Self {
        Self::encode(cmd)
    }
}

/// Free-function form of [`EncodedReport::encode`].
pub fn encode(cmd: &JoystickCommand) -> EncodedReport {
    EncodedReport::encode(cmd)
}
