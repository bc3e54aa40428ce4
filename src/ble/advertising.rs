//! Legacy advertising payloads for the joystick.
//!
//! Advertising data carries flags, the Generic HID appearance, the HID
//! service UUID and as much of the name as fits; the scan response carries
//! the name again with more room. Payloads are rebuilt from scratch on
//! every (re-)announce, so the service UUID is never listed twice.

use crate::config::{APPEARANCE_GENERIC_HID, DEFAULT_DEVICE_NAME, MAX_DEVICE_NAME_LEN};
use heapless::{String, Vec};

/// Maximum legacy advertising / scan response payload length.
pub const LEGACY_PAYLOAD_LEN: usize = 31;

/// HID service UUID (0x1812).
pub const HID_SERVICE_UUID16: u16 = 0x1812;

// AD types
const AD_FLAGS: u8 = 0x01;
#[cfg(test)]
const AD_INCOMPLETE_UUID16: u8 = 0x02;
const AD_COMPLETE_UUID16: u8 = 0x03;
const AD_SHORT_NAME: u8 = 0x08;
const AD_COMPLETE_NAME: u8 = 0x09;
const AD_APPEARANCE: u8 = 0x19;

/// LE General Discoverable, BR/EDR not supported.
const FLAGS_LE_GENERAL: u8 = 0x06;

pub type Payload = Vec<u8, LEGACY_PAYLOAD_LEN>;
pub type DeviceName = String<MAX_DEVICE_NAME_LEN>;

/// Normalise a user-supplied device name: truncate to `MAX_DEVICE_NAME_LEN`
/// bytes on a character boundary, falling back to the default name.
pub fn device_name(name: &str) -> DeviceName {
    let name = if name.is_empty() {
        DEFAULT_DEVICE_NAME
    } else {
        name
    };
    let mut out = String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Advertising data + scan response for one announce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvertisingPayload {
    adv_data: Payload,
    scan_data: Payload,
}

impl AdvertisingPayload {
    pub fn new(name: &str) -> Self {
        let mut adv_data = Payload::new();
        push_ad(&mut adv_data, AD_FLAGS, &[FLAGS_LE_GENERAL]);
        push_ad(&mut adv_data, AD_APPEARANCE, &APPEARANCE_GENERIC_HID.to_le_bytes());
        push_ad(&mut adv_data, AD_COMPLETE_UUID16, &HID_SERVICE_UUID16.to_le_bytes());
        push_name(&mut adv_data, name);

        let mut scan_data = Payload::new();
        push_name(&mut scan_data, name);

        Self { adv_data, scan_data }
    }

    pub fn adv_data(&self) -> &[u8] {
        &self.adv_data
    }

    pub fn scan_data(&self) -> &[u8] {
        &self.scan_data
    }
}

fn push_ad(buf: &mut Payload, ad_type: u8, data: &[u8]) -> bool {
    if buf.len() + 2 + data.len() > LEGACY_PAYLOAD_LEN {
        return false;
    }
    // Capacity checked above.
    let _ = buf.push(data.len() as u8 + 1);
    let _ = buf.push(ad_type);
    let _ = buf.extend_from_slice(data);
    true
}

/// Append the name, shortening it on a character boundary if needed.
fn push_name(buf: &mut Payload, name: &str) {
    let room = LEGACY_PAYLOAD_LEN.saturating_sub(buf.len() + 2);
    if name.len() <= room {
        push_ad(buf, AD_COMPLETE_NAME, name.as_bytes());
        return;
    }
    let mut cut = room;
    while cut > 0 && !name.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut > 0 {
        push_ad(buf, AD_SHORT_NAME, &name.as_bytes()[..cut]);
    }
}

// AD structure inspection, used to check the built payloads.

/// Iterate `(ad_type, data)` pairs, stopping at the first malformed entry.
#[cfg(test)]
fn for_each_ad(data: &[u8], mut f: impl FnMut(u8, &[u8]) -> bool) {
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 || i + len >= data.len() {
            break;
        }
        if !f(data[i + 1], &data[i + 2..i + 1 + len]) {
            break;
        }
        i += len + 1;
    }
}

/// Number of times `uuid` is listed in 16-bit service UUID structures.
#[cfg(test)]
pub(crate) fn count_service_uuid16(data: &[u8], uuid: u16) -> usize {
    let le = uuid.to_le_bytes();
    let mut count = 0;
    for_each_ad(data, |ad_type, payload| {
        if ad_type == AD_INCOMPLETE_UUID16 || ad_type == AD_COMPLETE_UUID16 {
            count += payload.chunks_exact(2).filter(|c| *c == le).count();
        }
        true
    });
    count
}

#[cfg(test)]
pub(crate) fn contains_hid_service_uuid(data: &[u8]) -> bool {
    count_service_uuid16(data, HID_SERVICE_UUID16) > 0
}

/// Appearance value, if advertised.
#[cfg(test)]
pub(crate) fn extract_appearance(data: &[u8]) -> Option<u16> {
    let mut found = None;
    for_each_ad(data, |ad_type, payload| {
        if ad_type == AD_APPEARANCE && payload.len() == 2 {
            found = Some(u16::from_le_bytes([payload[0], payload[1]]));
            return false;
        }
        true
    });
    found
}

/// Complete or shortened local name. `None` if absent or not UTF-8.
#[cfg(test)]
pub(crate) fn extract_device_name(data: &[u8]) -> Option<DeviceName> {
    let mut found = None;
    for_each_ad(data, |ad_type, payload| {
        if ad_type == AD_SHORT_NAME || ad_type == AD_COMPLETE_NAME {
            found = core::str::from_utf8(payload).ok().and_then(|name| {
                let mut out = DeviceName::new();
                out.push_str(name).ok().map(|()| out)
            });
            return false;
        }
        true
    });
    found
}
