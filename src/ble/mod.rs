//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - HID service (report map, input report, control
//!    point, protocol mode) plus the Device Information service.
//! 2. **Advertising** - connectable, scannable advertisement carrying the
//!    HID service UUID, the generic HID appearance and the device name.
//! 3. **Session control** - link-layer callbacks become [`LinkEvent`]s;
//!    the control task applies them and performs the resulting actions.
//! 4. **Report sender** - drains the command queue into input report
//!    notifications while a central is subscribed.
//!
//! The host-testable pieces (session, queue, advertising payload, link)
//! are shared with the library crate; `gatt`, `bonder` and `peripheral`
//! only exist in the firmware.
//!
//! [`LinkEvent`]: session::LinkEvent

pub mod advertising;
pub mod bonder;
pub mod device_info;
pub mod gatt;
pub mod link;
pub mod peripheral;
pub mod queue;
pub mod security;
pub mod sender;
pub mod session;
