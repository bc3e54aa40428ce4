//! Answers to the stack's pairing / security callbacks.
//!
//! The device has no display and no keypad, so every request is accepted
//! and the pass key is a fixed number. The policy only decides; the
//! firmware's security handler does the logging and forwards the
//! authentication outcome to the state machine.

use crate::ble::session::{LinkEvent, PeerAddress};
use crate::config::DEFAULT_PASS_KEY;

/// Highest value a six-digit pass key can take.
pub const PASS_KEY_MAX: u32 = 999_999;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityPolicy {
    pass_key: u32,
}

impl SecurityPolicy {
    /// Policy with a custom pass key. Values above six digits are reduced
    /// modulo one million, matching what a peer can type.
    pub const fn new(pass_key: u32) -> Self {
        Self {
            pass_key: pass_key % (PASS_KEY_MAX + 1),
        }
    }

    pub fn pass_key(&self) -> u32 {
        self.pass_key
    }

    /// The stack asks which pass key to use.
    pub fn on_pass_key_request(&self) -> u32 {
        self.pass_key
    }

    /// The stack shows a pass key; returns it as ASCII digits for display.
    /// The notified key is not stored: the key in use is the one installed
    /// at startup from [`SecurityPolicy::pass_key`].
    pub fn on_pass_key_notify(&self, pass_key: u32) -> [u8; 6] {
        pass_key_digits(pass_key)
    }

    /// A peer asked to start security. Always accepted.
    pub fn on_security_request(&self) -> bool {
        true
    }

    /// Numeric comparison. Accepted without user interaction.
    pub fn on_confirm_pin(&self, _pass_key: u32) -> bool {
        true
    }

    /// Convert an authentication outcome into a state machine event.
    pub fn on_auth_complete(&self, success: bool, peer: PeerAddress) -> LinkEvent {
        LinkEvent::AuthComplete { success, peer }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_KEY)
    }
}

/// Six zero-padded ASCII digits of `pass_key`.
pub fn pass_key_digits(pass_key: u32) -> [u8; 6] {
    let mut digits = [b'0'; 6];
    let mut v = pass_key % (PASS_KEY_MAX + 1);
    for d in digits.iter_mut().rev() {
        *d = b'0' + (v % 10) as u8;
        v /= 10;
    }
    digits
}

/// Parse six ASCII digits as delivered by the stack's display callback.
pub fn pass_key_from_digits(digits: &[u8; 6]) -> Option<u32> {
    digits.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u32)
    })
}
