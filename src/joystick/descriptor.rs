//! HID report map for the joystick input report.
//!
//! The map is a fixed template; the only variable item is the Report ID,
//! whose data byte is located by walking the template's HID items at
//! compile time rather than by a hard-coded index. The template is also
//! checked at compile time against the encoder's layout constants, so the
//! map and [`EncodedReport`](super::report::EncodedReport) cannot drift.

use super::report::{AXIS_COUNT, AXIS_FIELD_BITS, AXIS_LOGICAL_MAX, BUTTON_COUNT, JOYSTICK_REPORT_SIZE};

/// Report ID data placeholder in the template (patched by the builder).
const REPORT_ID_PLACEHOLDER: u8 = 0x00;

/// Joystick report map template.
///
/// Generic Desktop / Gamepad with 4 x 16-bit absolute axes (X, Y, Rx, Ry,
/// logical 0..=1000) followed by 8 one-bit buttons.
pub const JOYSTICK_REPORT_TEMPLATE: [u8; 54] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0xA1, 0x00, //   Collection (Physical)
    0x85, REPORT_ID_PLACEHOLDER, // Report ID
    //
    //   - Axes (4 x 16 bits) -
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x33, //     Usage (Rx)
    0x09, 0x34, //     Usage (Ry)
    0x16, 0x00, 0x00, // Logical Minimum (0)
    0x26, 0xE8, 0x03, // Logical Maximum (1000)
    0x36, 0x00, 0x00, // Physical Minimum (0)
    0x46, 0xE8, 0x03, // Physical Maximum (1000)
    0x75, 0x10, //     Report Size (16)
    0x95, 0x04, //     Report Count (4)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    //
    //   - Buttons (8 x 1 bit) -
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (1)
    0x29, 0x08, //     Usage Maximum (8)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x08, //     Report Count (8)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    //
    0xC0, //   End Collection
    0xC0, // End Collection
];

// Short-item tags (prefix with the size bits masked off).
const TAG_INPUT: u8 = 0x80;
const TAG_LOGICAL_MAXIMUM: u8 = 0x24;
const TAG_REPORT_SIZE: u8 = 0x74;
const TAG_REPORT_ID: u8 = 0x84;
const TAG_REPORT_COUNT: u8 = 0x94;
const LONG_ITEM: u8 = 0xFE;

const fn item_data_len(prefix: u8) -> usize {
    match prefix & 0x03 {
        3 => 4,
        n => n as usize,
    }
}

const fn item_value(map: &[u8], at: usize, len: usize) -> u32 {
    let mut v = 0u32;
    let mut i = 0;
    while i < len {
        v |= (map[at + i] as u32) << (8 * i);
        i += 1;
    }
    v
}

/// Byte offset of the data of the `nth` short item with `tag`, if any.
pub const fn find_item_data(map: &[u8], tag: u8, nth: usize) -> Option<usize> {
    let mut i = 0;
    let mut seen = 0;
    while i < map.len() {
        let prefix = map[i];
        if prefix == LONG_ITEM {
            if i + 1 >= map.len() {
                return None;
            }
            i += 3 + map[i + 1] as usize;
            continue;
        }
        let len = item_data_len(prefix);
        if prefix & 0xFC == tag && len > 0 && i + len < map.len() {
            if seen == nth {
                return Some(i + 1);
            }
            seen += 1;
        }
        i += 1 + len;
    }
    None
}

/// Total bit length of all Input main items in `map`.
pub const fn input_bits(map: &[u8]) -> usize {
    let mut i = 0;
    let mut size = 0usize;
    let mut count = 0usize;
    let mut total = 0usize;
    while i < map.len() {
        let prefix = map[i];
        if prefix == LONG_ITEM {
            if i + 1 >= map.len() {
                break;
            }
            i += 3 + map[i + 1] as usize;
            continue;
        }
        let len = item_data_len(prefix);
        if i + len >= map.len() {
            break;
        }
        match prefix & 0xFC {
            TAG_REPORT_SIZE => size = item_value(map, i + 1, len) as usize,
            TAG_REPORT_COUNT => count = item_value(map, i + 1, len) as usize,
            TAG_INPUT => total += size * count,
            _ => {}
        }
        i += 1 + len;
    }
    total
}

/// Offset of the Report ID data byte inside the template.
pub const REPORT_ID_OFFSET: usize = match find_item_data(&JOYSTICK_REPORT_TEMPLATE, TAG_REPORT_ID, 0) {
    Some(offset) => offset,
    None => panic!("joystick report map has no Report ID item"),
};

const AXIS_LOGICAL_MAX_OFFSET: usize =
    match find_item_data(&JOYSTICK_REPORT_TEMPLATE, TAG_LOGICAL_MAXIMUM, 0) {
        Some(offset) => offset,
        None => panic!("joystick report map has no Logical Maximum item"),
    };

const _: () = {
    assert!(JOYSTICK_REPORT_TEMPLATE[REPORT_ID_OFFSET] == REPORT_ID_PLACEHOLDER);
    assert!(input_bits(&JOYSTICK_REPORT_TEMPLATE) == JOYSTICK_REPORT_SIZE * 8);
    assert!(input_bits(&JOYSTICK_REPORT_TEMPLATE) == AXIS_COUNT * AXIS_FIELD_BITS + BUTTON_COUNT);
    assert!(
        item_value(&JOYSTICK_REPORT_TEMPLATE, AXIS_LOGICAL_MAX_OFFSET, 2)
            == AXIS_LOGICAL_MAX as u32
    );
};

/// Length of the report map in bytes.
pub const REPORT_MAP_LEN: usize = JOYSTICK_REPORT_TEMPLATE.len();

/// Report Reference descriptor type for an input report.
pub const REPORT_TYPE_INPUT: u8 = 0x01;

/// Why a report map could not be built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// Report ID 0 is reserved.
    ReservedReportId,
}

impl From<DescriptorError> for crate::error::Error {
    fn from(_: DescriptorError) -> Self {
        crate::error::Error::InvalidReportId
    }
}

/// The joystick report map with its report ID assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportDescriptor {
    bytes: [u8; REPORT_MAP_LEN],
}

impl ReportDescriptor {
    /// Build the report map for `report_id`.
    pub fn new(report_id: u8) -> Result<Self, DescriptorError> {
        if report_id == 0 {
            return Err(DescriptorError::ReservedReportId);
        }
        let mut bytes = JOYSTICK_REPORT_TEMPLATE;
        bytes[REPORT_ID_OFFSET] = report_id;
        Ok(Self { bytes })
    }

    pub fn report_id(&self) -> u8 {
        self.bytes[REPORT_ID_OFFSET]
    }

    /// Bytes served from the Report Map characteristic.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value of the Report Reference descriptor (0x2908) on the input report.
    pub fn report_reference(&self) -> [u8; 2] {
        [self.report_id(), REPORT_TYPE_INPUT]
    }
}
