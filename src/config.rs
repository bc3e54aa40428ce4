//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Joystick pipeline

/// Number of joystick commands buffered between producer and sender.
pub const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Upper bound on a single sender wait for the next command (seconds).
/// A timeout is a liveness tick, not an error.
pub const SENDER_WAIT_SECS: u64 = 10;

/// Link-layer / operator events buffered for the control loop.
pub const LINK_EVENT_CAPACITY: usize = 8;

/// Report ID assigned to the joystick input report.
pub const JOYSTICK_REPORT_ID: u8 = 1;

// BLE identity

/// Longest GAP device name we accept (bytes). Longer names are truncated.
pub const MAX_DEVICE_NAME_LEN: usize = 39;

/// Name used when `init` is given an empty string.
pub const DEFAULT_DEVICE_NAME: &str = "BLE Joystick";

/// GAP appearance: Generic HID.
pub const APPEARANCE_GENERIC_HID: u16 = 0x03C0;

/// Advertising interval range (in 0.625 ms units). 400 = 250 ms, 800 = 500 ms.
pub const ADV_INTERVAL_MIN: u32 = 400;
pub const ADV_INTERVAL_MAX: u32 = 800;

/// Delay before advertising is retried after the stack refused it (ms).
pub const ADV_RETRY_MS: u64 = 1000;

/// Static pass key reported to the stack when it asks for one.
pub const DEFAULT_PASS_KEY: u32 = 1307;

// Device Information service

/// Manufacturer Name String characteristic value.
pub const MANUFACTURER_NAME: &str = "Unknown";

/// PnP ID fields. Vendor ID source 0x02 = USB Implementer's Forum.
pub const PNP_VENDOR_ID_SOURCE: u8 = 0x02;
pub const PNP_VENDOR_ID: u16 = 0xE502;
pub const PNP_PRODUCT_ID: u16 = 0xA111;
pub const PNP_PRODUCT_VERSION: u16 = 0x0210;

/// HID Information: country code and flags (0x01 = remote wake).
pub const HID_COUNTRY_CODE: u8 = 0x00;
pub const HID_INFO_FLAGS: u8 = 0x01;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Pairing button → P0.11
//   Status LED     → P0.13

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Status LED blink half-period while advertising (ms).
pub const LED_BLINK_MS: u64 = 250;

/// The DK's LEDs light when the pin is driven low.
pub const LED_ACTIVE_LOW: bool = true;

/// Status LED re-evaluation period when the pattern is steady (ms).
pub const LED_POLL_MS: u64 = 100;

/// Period of the demo producer in the firmware (ms).
pub const DEMO_PERIOD_MS: u64 = 20;

/// Step applied to the X axis on every demo tick.
pub const DEMO_STEP: u16 = 10;
