//! Status LED logic: which pattern each session state shows.

use crate::ble::session::SessionState;

/// What the status LED shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedPattern {
    Off,
    /// Toggle every blink period.
    Blink,
    /// Short flash once every four blink periods.
    Flash,
    On,
}

/// LED pattern for a session state.
pub fn led_pattern(state: SessionState) -> LedPattern {
    match state {
        SessionState::Idle => LedPattern::Off,
        SessionState::Advertising => LedPattern::Blink,
        SessionState::Connected => LedPattern::Flash,
        SessionState::NotifyEnabled => LedPattern::On,
    }
}

/// LED level for `pattern` at blink period number `tick`.
pub fn led_level(pattern: LedPattern, tick: u32) -> bool {
    match pattern {
        LedPattern::Off => false,
        LedPattern::Blink => tick % 2 == 0,
        LedPattern::Flash => tick % 4 == 0,
        LedPattern::On => true,
    }
}
