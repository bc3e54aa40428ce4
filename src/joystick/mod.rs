//! Joystick command model, input report encoding and the HID report map.

pub mod descriptor;
pub mod report;


/// Lowest axis value a producer may send.
pub const AXIS_MIN: u16 = 1000;
/// Highest axis value a producer may send.
pub const AXIS_MAX: u16 = 2000;
/// Rest position of every axis.
pub const AXIS_CENTER: u16 = 1500;

/// One joystick sample as produced by the input side (e.g. an RC receiver).
///
/// Axis values are nominally in `AXIS_MIN..=AXIS_MAX`; bit `n` of `buttons`
/// is button `n + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickCommand {
    pub buttons: u8,
    pub x: u16,
    pub y: u16,
    pub x_rotation: u16,
    pub y_rotation: u16,
}

/// Which axes were saturated by [`JoystickCommand::clamped`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClampedAxes {
    pub x: bool,
    pub y: bool,
    pub x_rotation: bool,
    pub y_rotation: bool,
}

impl ClampedAxes {
    /// `true` if at least one axis was out of range.
    pub fn any(&self) -> bool {
        self.x || self.y || self.x_rotation || self.y_rotation
    }
}

impl JoystickCommand {
    pub const fn new(buttons: u8, x: u16, y: u16, x_rotation: u16, y_rotation: u16) -> Self {
        Self {
            buttons,
            x,
            y,
            x_rotation,
            y_rotation,
        }
    }

    /// All axes centred, no buttons pressed.
    pub const fn centered() -> Self {
        Self::new(0, AXIS_CENTER, AXIS_CENTER, AXIS_CENTER, AXIS_CENTER)
    }

    /// `true` if every axis lies in `AXIS_MIN..=AXIS_MAX`.
    pub fn is_in_range(&self) -> bool {
        self.axes().iter().all(|a| (AXIS_MIN..=AXIS_MAX).contains(a))
    }

    /// Saturate every axis into range, reporting which ones moved.
    pub fn clamped(&self) -> (Self, ClampedAxes) {
        let (x, cx) = clamp_axis(self.x);
        let (y, cy) = clamp_axis(self.y);
        let (x_rotation, cxr) = clamp_axis(self.x_rotation);
        let (y_rotation, cyr) = clamp_axis(self.y_rotation);
        (
            Self::new(self.buttons, x, y, x_rotation, y_rotation),
            ClampedAxes {
                x: cx,
                y: cy,
                x_rotation: cxr,
                y_rotation: cyr,
            },
        )
    }

    /// Whether button `n` (1-based, 1..=8) is pressed.
    pub fn is_pressed(&self, n: u8) -> bool {
        (1..=8).contains(&n) && self.buttons & (1 << (n - 1)) != 0
    }

    /// Axes in report order: X, Y, Rx, Ry.
    pub(crate) fn axes(&self) -> [u16; 4] {
        [self.x, self.y, self.x_rotation, self.y_rotation]
    }
}

impl Default for JoystickCommand {
    fn default() -> Self {
        Self::centered()
    }
}

fn clamp_axis(v: u16) -> (u16, bool) {
    let c = v.clamp(AXIS_MIN, AXIS_MAX);
    (c, c != v)
}
