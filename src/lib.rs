//! Host-testable library interface for ble-joystick.
//!
//! This module exposes the pure logic that runs identically on the
//! host and on the nRF52840: report encoding, the report map, the
//! connection state machine, the command queue and the report sender.
//!
//! Usage: `cargo test --lib` (unit) or `cargo test` (unit + integration)
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! This lib.rs provides a separate entry point for host-based testing.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod joystick;

// Internal module paths for the actual implementations
#[path = "ble/advertising.rs"]
mod ble_advertising_impl;
#[path = "ble/device_info.rs"]
mod ble_device_info_impl;
#[path = "ble/link.rs"]
mod ble_link_impl;
#[path = "ble/queue.rs"]
mod ble_queue_impl;
#[path = "ble/security.rs"]
mod ble_security_impl;
#[path = "ble/sender.rs"]
mod ble_sender_impl;
#[path = "ble/session.rs"]
mod ble_session_impl;

#[path = "ui/indicator_logic.rs"]
mod ui_indicator_logic_impl;

pub mod ble {
    pub mod advertising {
        pub use crate::ble_advertising_impl::*;
    }
    pub mod device_info {
        pub use crate::ble_device_info_impl::*;
    }
    pub mod link {
        pub use crate::ble_link_impl::*;
    }
    pub mod queue {
        pub use crate::ble_queue_impl::*;
    }
    pub mod security {
        pub use crate::ble_security_impl::*;
    }
    pub mod sender {
        pub use crate::ble_sender_impl::*;
    }
    pub mod session {
        pub use crate::ble_session_impl::*;
    }

    pub use link::{JoystickLink, PushOutcome, PushReceipt, Startup};
    pub use session::{Action, LinkEvent, SessionState};
}

pub mod ui {
    pub mod indicator_logic {
        pub use crate::ui_indicator_logic_impl::{led_level, led_pattern, LedPattern};
    }
}

pub use ble::JoystickLink;
pub use joystick::JoystickCommand;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::ble::advertising::*;
    use super::ble::device_info::*;
    use super::ble::security::*;
    use super::ble::session::*;
    use super::joystick::descriptor::{input_bits, ReportDescriptor, REPORT_ID_OFFSET};
    use super::joystick::report::{EncodedReport, AXIS_LOGICAL_MAX, JOYSTICK_REPORT_SIZE};
    use super::joystick::JoystickCommand;
    use super::ui::indicator_logic::*;
    use crate::ble_advertising_impl::{
        contains_hid_service_uuid, count_service_uuid16, extract_appearance, extract_device_name,
    };

    fn session_in(events: &[LinkEvent]) -> Session {
        let mut s = Session::new();
        for &e in events {
            s.handle(e);
        }
        s
    }

    const STREAMING: [LinkEvent; 3] = [
        LinkEvent::ServicesStarted,
        LinkEvent::Connected,
        LinkEvent::NotifySubscribe(true),
    ];

    // ════════════════════════════════════════════════════════════════════════
    // Encoder / Report Map Agreement
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn report_map_and_encoder_agree_on_size() {
        let desc = ReportDescriptor::new(1).unwrap();
        assert_eq!(input_bits(desc.as_bytes()), JOYSTICK_REPORT_SIZE * 8);
        assert_eq!(desc.as_bytes()[REPORT_ID_OFFSET], 1);
    }

    #[test]
    fn encoded_axes_never_exceed_logical_maximum() {
        for v in [0u16, 999, 1000, 1500, 2000, 2001, u16::MAX] {
            let report = EncodedReport::encode(&JoystickCommand::new(0, v, v, v, v));
            for i in 0..4 {
                let raw = u16::from_le_bytes([report.as_bytes()[i * 2], report.as_bytes()[i * 2 + 1]]);
                assert!(raw <= AXIS_LOGICAL_MAX);
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Session State Machine Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn session_starts_idle() {
        let s = Session::new();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.is_connected());
        assert!(!s.sender_running());
    }

    #[test]
    fn services_started_begins_advertising() {
        let mut s = Session::new();
        let t = s.handle(LinkEvent::ServicesStarted);
        assert_eq!(t.from, SessionState::Idle);
        assert_eq!(t.to, SessionState::Advertising);
        assert_eq!(t.actions.as_slice(), &[Action::StartAdvertising]);
    }

    #[test]
    fn connect_arms_notifications_but_defers_sender() {
        let mut s = session_in(&[LinkEvent::ServicesStarted]);
        let t = s.handle(LinkEvent::Connected);
        assert_eq!(t.to, SessionState::Connected);
        assert_eq!(t.actions.as_slice(), &[Action::ArmNotifications]);
        assert!(s.is_connected());
        assert!(!s.sender_running());
    }

    #[test]
    fn subscribe_flushes_then_starts_sender() {
        let mut s = session_in(&STREAMING[..2]);
        let t = s.handle(LinkEvent::NotifySubscribe(true));
        assert_eq!(t.to, SessionState::NotifyEnabled);
        assert_eq!(t.actions.as_slice(), &[Action::FlushQueue, Action::StartSender]);
        assert!(s.is_streaming());
    }

    #[test]
    fn repeated_subscribe_is_ignored() {
        let mut s = session_in(&STREAMING);
        let t = s.handle(LinkEvent::NotifySubscribe(true));
        assert!(!t.changed());
        assert!(t.actions.is_empty());
    }

    #[test]
    fn unsubscribe_stops_sender_and_keeps_link() {
        let mut s = session_in(&STREAMING);
        let t = s.handle(LinkEvent::NotifySubscribe(false));
        assert_eq!(t.to, SessionState::Connected);
        assert_eq!(t.actions.as_slice(), &[Action::StopSender, Action::FlushQueue]);
        assert!(s.is_connected());
        assert!(!s.sender_running());
    }

    #[test]
    fn disconnect_while_streaming_re_arms_advertising() {
        let mut s = session_in(&STREAMING);
        let t = s.handle(LinkEvent::Disconnected);
        assert_eq!(t.to, SessionState::Advertising);
        assert_eq!(
            t.actions.as_slice(),
            &[
                Action::DisarmNotifications,
                Action::StopSender,
                Action::FlushQueue,
                Action::StartAdvertising
            ]
        );
        assert!(!s.is_connected());
    }

    #[test]
    fn disconnect_before_subscribe_does_not_stop_sender() {
        let mut s = session_in(&STREAMING[..2]);
        let t = s.handle(LinkEvent::Disconnected);
        assert_eq!(t.to, SessionState::Advertising);
        assert!(!t.has(Action::StopSender));
        assert!(t.has(Action::StartAdvertising));
    }

    #[test]
    fn duplicate_disconnect_is_ignored() {
        let mut s = session_in(&STREAMING);
        s.handle(LinkEvent::Disconnected);
        let t = s.handle(LinkEvent::Disconnected);
        assert!(!t.changed());
        assert!(t.actions.is_empty());
    }

    #[test]
    fn failed_auth_drops_link_and_falls_back_to_advertising() {
        let mut s = session_in(&STREAMING);
        let t = s.handle(LinkEvent::AuthComplete {
            success: false,
            peer: PeerAddress([1, 2, 3, 4, 5, 6]),
        });
        assert_eq!(t.to, SessionState::Advertising);
        assert_eq!(t.actions[0], Action::DropLink);
        assert!(t.has(Action::StopSender));
        assert!(t.has(Action::StartAdvertising));
    }

    #[test]
    fn failed_auth_while_streaming_keeps_every_action() {
        let mut s = session_in(&STREAMING);
        let t = s.handle(LinkEvent::AuthComplete {
            success: false,
            peer: PeerAddress::default(),
        });
        assert_eq!(
            t.actions.as_slice(),
            &[
                Action::DropLink,
                Action::DisarmNotifications,
                Action::StopSender,
                Action::FlushQueue,
                Action::StartAdvertising,
            ]
        );
        assert!(t.actions.len() <= MAX_ACTIONS);
    }

    #[test]
    fn successful_auth_changes_nothing() {
        let mut s = session_in(&STREAMING[..2]);
        let t = s.handle(LinkEvent::AuthComplete {
            success: true,
            peer: PeerAddress::default(),
        });
        assert!(!t.changed());
        assert!(t.actions.is_empty());
    }

    #[test]
    fn advertising_failure_retries() {
        let mut s = session_in(&[LinkEvent::ServicesStarted]);
        let t = s.handle(LinkEvent::AdvertisingFailed);
        assert_eq!(t.to, SessionState::Advertising);
        assert_eq!(t.actions.as_slice(), &[Action::StartAdvertising]);
    }

    #[test]
    fn deactivate_pairing_withdraws_and_activate_restores() {
        let mut s = session_in(&[LinkEvent::ServicesStarted]);
        let t = s.handle(LinkEvent::DeactivatePairing);
        assert_eq!(t.to, SessionState::Idle);
        assert_eq!(t.actions.as_slice(), &[Action::StopAdvertising]);

        let t = s.handle(LinkEvent::DeactivatePairing);
        assert!(t.actions.is_empty());

        let t = s.handle(LinkEvent::ActivatePairing);
        assert_eq!(t.to, SessionState::Advertising);
        assert_eq!(t.actions.as_slice(), &[Action::StartAdvertising]);
    }

    #[test]
    fn activate_pairing_twice_is_equivalent_to_once() {
        let mut once = session_in(&[LinkEvent::ServicesStarted]);
        let mut twice = once.clone();
        once.handle(LinkEvent::ActivatePairing);
        twice.handle(LinkEvent::ActivatePairing);
        twice.handle(LinkEvent::ActivatePairing);
        assert_eq!(once, twice);
    }

    #[test]
    fn pairing_requests_never_tear_down_a_link() {
        let mut s = session_in(&STREAMING);
        for e in [LinkEvent::DeactivatePairing, LinkEvent::ActivatePairing] {
            let t = s.handle(e);
            assert!(!t.changed());
            assert!(t.actions.is_empty());
            assert!(s.is_streaming());
        }
    }

    #[test]
    fn activate_before_services_waits_for_services() {
        let mut s = Session::new();
        let t = s.handle(LinkEvent::ActivatePairing);
        assert_eq!(t.to, SessionState::Idle);
        assert!(t.actions.is_empty());
        let t = s.handle(LinkEvent::ServicesStarted);
        assert_eq!(t.to, SessionState::Advertising);
    }

    #[test]
    fn deactivate_before_services_keeps_idle_after_start() {
        let mut s = Session::new();
        s.handle(LinkEvent::DeactivatePairing);
        let t = s.handle(LinkEvent::ServicesStarted);
        assert_eq!(t.to, SessionState::Idle);
        assert!(t.actions.is_empty());
    }

    #[test]
    fn disconnect_after_deactivate_still_advertises() {
        let mut s = session_in(&STREAMING);
        s.handle(LinkEvent::DeactivatePairing);
        let t = s.handle(LinkEvent::Disconnected);
        assert_eq!(t.to, SessionState::Advertising);
        assert!(s.pairing_enabled());
    }

    #[test]
    fn events_out_of_order_are_ignored() {
        let mut s = Session::new();
        for e in [
            LinkEvent::NotifySubscribe(true),
            LinkEvent::NotifySubscribe(false),
            LinkEvent::Disconnected,
            LinkEvent::AdvertisingFailed,
        ] {
            let t = s.handle(e);
            assert!(!t.changed());
            assert!(t.actions.is_empty());
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Advertising Payload Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn advertising_payload_lists_hid_once_with_appearance() {
        let p = AdvertisingPayload::new("Joystick");
        assert_eq!(count_service_uuid16(p.adv_data(), HID_SERVICE_UUID16), 1);
        assert_eq!(extract_appearance(p.adv_data()), Some(0x03C0));
        assert_eq!(extract_device_name(p.adv_data()).as_deref(), Some("Joystick"));
        assert_eq!(extract_device_name(p.scan_data()).as_deref(), Some("Joystick"));
        assert!(p.adv_data().len() <= LEGACY_PAYLOAD_LEN);
    }

    #[test]
    fn rebuilt_payload_is_identical() {
        assert_eq!(AdvertisingPayload::new("Pad"), AdvertisingPayload::new("Pad"));
    }

    #[test]
    fn long_name_is_shortened_in_adv_data() {
        let name = device_name("ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopq");
        assert_eq!(name.len(), 39);
        let p = AdvertisingPayload::new(&name);
        assert_eq!(p.adv_data().len(), LEGACY_PAYLOAD_LEN);
        assert_eq!(
            extract_device_name(p.adv_data()).as_deref(),
            Some("ABCDEFGHIJKLMNOPQR")
        );
        assert_eq!(p.scan_data().len(), LEGACY_PAYLOAD_LEN);
        assert!(contains_hid_service_uuid(p.adv_data()));
    }

    #[test]
    fn non_ascii_name_is_advertised_as_utf8() {
        let p = AdvertisingPayload::new("Jöy");
        assert_eq!(extract_device_name(p.adv_data()).as_deref(), Some("Jöy"));
        assert_eq!(extract_device_name(p.scan_data()).as_deref(), Some("Jöy"));
    }

    #[test]
    fn shortened_name_keeps_multibyte_characters_whole() {
        // 17 ASCII bytes then 'é' straddles the 18-byte room in adv data.
        let long = format!("{}é{}", "a".repeat(17), "b".repeat(10));
        let p = AdvertisingPayload::new(&device_name(&long));
        assert_eq!(
            extract_device_name(p.adv_data()).as_deref(),
            Some("a".repeat(17).as_str())
        );
        assert_eq!(extract_device_name(p.scan_data()).as_deref(), Some(long.as_str()));
    }

    #[test]
    fn device_name_truncates_on_char_boundary() {
        // 38 ASCII bytes + a 2-byte character would overflow 39 bytes.
        let mut long = "a".repeat(38);
        long.push('é');
        let name = device_name(&long);
        assert_eq!(name.len(), 38);
        assert_eq!(device_name("").as_str(), crate::config::DEFAULT_DEVICE_NAME);
    }

    #[test]
    fn ad_walker_handles_malformed_lengths() {
        assert!(!contains_hid_service_uuid(&[0x00]));
        assert!(!contains_hid_service_uuid(&[0x05, 0x03, 0x12]));
        assert_eq!(extract_device_name(&[0x02, 0x01, 0x06]), None);
        // Truncated UTF-8 sequence in the name field.
        assert_eq!(extract_device_name(&[0x03, 0x09, b'J', 0xC3]), None);
        assert_eq!(extract_appearance(&[0x02, 0x19, 0xC0]), None);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Security / Device Information Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn default_policy_uses_static_pass_key_and_accepts_all() {
        let policy = SecurityPolicy::default();
        assert_eq!(policy.on_pass_key_request(), 1307);
        assert!(policy.on_security_request());
        assert!(policy.on_confirm_pin(123_456));
        assert_eq!(&policy.on_pass_key_notify(1307), b"001307");
    }

    #[test]
    fn notified_pass_key_is_rendered_but_not_adopted() {
        let policy = SecurityPolicy::default();
        assert_eq!(&policy.on_pass_key_notify(654_321), b"654321");
        assert_eq!(policy.pass_key(), 1307);
        assert_eq!(policy.on_pass_key_request(), 1307);
    }

    #[test]
    fn auth_outcome_becomes_link_event() {
        let peer = PeerAddress([0xAA; 6]);
        let policy = SecurityPolicy::new(42);
        assert_eq!(
            policy.on_auth_complete(false, peer),
            LinkEvent::AuthComplete {
                success: false,
                peer
            }
        );
    }

    #[test]
    fn pass_key_digits_parse_back() {
        assert_eq!(pass_key_from_digits(b"001307"), Some(1307));
        assert_eq!(pass_key_from_digits(b"999999"), Some(999_999));
        assert_eq!(pass_key_from_digits(b"12a456"), None);
        assert_eq!(SecurityPolicy::new(1_001_307).pass_key(), 1307);
    }

    #[test]
    fn pnp_id_wire_format() {
        assert_eq!(
            PnpId::joystick().to_bytes(),
            [0x02, 0x02, 0xE5, 0x11, 0xA1, 0x10, 0x02]
        );
    }

    #[test]
    fn hid_information_wire_format() {
        assert_eq!(hid_information(), [0x11, 0x01, 0x00, 0x01]);
        assert_eq!(ControlPoint::from_byte(0), Some(ControlPoint::Suspend));
        assert_eq!(ControlPoint::from_byte(1), Some(ControlPoint::ExitSuspend));
        assert_eq!(ControlPoint::from_byte(2), None);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Status LED Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn led_pattern_follows_session_state() {
        assert_eq!(led_pattern(SessionState::Idle), LedPattern::Off);
        assert_eq!(led_pattern(SessionState::Advertising), LedPattern::Blink);
        assert_eq!(led_pattern(SessionState::Connected), LedPattern::Flash);
        assert_eq!(led_pattern(SessionState::NotifyEnabled), LedPattern::On);
    }

    #[test]
    fn led_level_per_tick() {
        assert!(!led_level(LedPattern::Off, 0));
        assert!(led_level(LedPattern::On, 7));
        assert!(led_level(LedPattern::Blink, 0));
        assert!(!led_level(LedPattern::Blink, 1));
        assert!(led_level(LedPattern::Flash, 4));
        assert!(!led_level(LedPattern::Flash, 5));
    }
}
