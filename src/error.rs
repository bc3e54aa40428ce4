//! Unified error type for ble-joystick.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    /// `init` was called a second time.
    AlreadyInitialized,

    /// An operation needed the HID services, but `init` never completed.
    NotInitialized,

    // HID
    /// Report ID 0 is reserved by the HID class definition.
    InvalidReportId,

    // Concurrency
    /// The control loop is not draining its event channel.
    EventQueueFull,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// A GATT service or characteristic could not be registered.
    RegisterFailed,
    /// Characteristic notify failed.
    NotifyFailed,
    /// The link dropped while an operation was in flight.
    Disconnected,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
