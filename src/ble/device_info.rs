//! Static characteristic values for the Device Information and HID
//! services.

use crate::config::{
    HID_COUNTRY_CODE, HID_INFO_FLAGS, PNP_PRODUCT_ID, PNP_PRODUCT_VERSION, PNP_VENDOR_ID,
    PNP_VENDOR_ID_SOURCE,
};

/// bcdHID 1.11.
pub const HID_VERSION_BCD: u16 = 0x0111;

/// Protocol Mode characteristic value for report protocol.
pub const PROTOCOL_MODE_REPORT: u8 = 0x01;

/// PnP ID characteristic (0x2A50).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PnpId {
    pub vendor_id_source: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product_version: u16,
}

impl PnpId {
    pub const fn joystick() -> Self {
        Self {
            vendor_id_source: PNP_VENDOR_ID_SOURCE,
            vendor_id: PNP_VENDOR_ID,
            product_id: PNP_PRODUCT_ID,
            product_version: PNP_PRODUCT_VERSION,
        }
    }

    /// Little-endian wire form, 7 bytes.
    pub fn to_bytes(&self) -> [u8; 7] {
        let v = self.vendor_id.to_le_bytes();
        let p = self.product_id.to_le_bytes();
        let r = self.product_version.to_le_bytes();
        [self.vendor_id_source, v[0], v[1], p[0], p[1], r[0], r[1]]
    }
}

/// HID Information characteristic (0x2A4A): bcdHID, country code, flags.
pub fn hid_information() -> [u8; 4] {
    let v = HID_VERSION_BCD.to_le_bytes();
    [v[0], v[1], HID_COUNTRY_CODE, HID_INFO_FLAGS]
}

/// HID Control Point (0x2A4C) commands written by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlPoint {
    Suspend,
    ExitSuspend,
}

impl ControlPoint {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(ControlPoint::Suspend),
            0x01 => Some(ControlPoint::ExitSuspend),
            _ => None,
        }
    }
}
