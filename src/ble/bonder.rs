//! SoftDevice security handler.
//!
//! Pairing uses the fixed pass key from [`SecurityPolicy`]; the device
//! "displays" it to the log. The bond lives in RAM only, so a reset
//! forgets the host and it has to pair again.

use crate::ble::security::{pass_key_digits, pass_key_from_digits, SecurityPolicy};
use crate::ble::session::{LinkEvent, PeerAddress};
use crate::error::BleError;
use core::cell::{Cell, RefCell};
use defmt::{debug, info, warn};
use heapless::Vec;
use nrf_softdevice::ble::gatt_server::{get_sys_attrs, set_sys_attrs};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode};
use nrf_softdevice::raw;

/// CCCD state saved across reconnects of the bonded host.
const SYS_ATTRS_LEN: usize = 62;

#[derive(Clone, Copy)]
struct Peer {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
}

pub struct Bonder {
    policy: SecurityPolicy,
    on_auth: fn(LinkEvent),
    peer: Cell<Option<Peer>>,
    sys_attrs: RefCell<Vec<u8, SYS_ATTRS_LEN>>,
}

impl Bonder {
    /// `on_auth` receives the authentication outcome as a state machine
    /// event; it runs in SoftDevice event context and must not block.
    pub fn new(policy: SecurityPolicy, on_auth: fn(LinkEvent)) -> Self {
        Self {
            policy,
            on_auth,
            peer: Cell::new(None),
            sys_attrs: RefCell::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    fn is_bonded_peer(&self, conn: &Connection) -> bool {
        self.peer
            .get()
            .map(|peer| peer.peer_id.is_match(conn.peer_address()))
            .unwrap_or(false)
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        // No screen, but the static pass key is printed by `display_passkey`.
        IoCapabilities::DisplayOnly
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        self.policy.on_security_request()
    }

    fn display_passkey(&self, passkey: &[u8; 6]) {
        match pass_key_from_digits(passkey) {
            Some(key) => info!("Pairing pass key: {=u32}", key),
            None => warn!("Pairing pass key is not numeric"),
        }
    }

    fn on_security_update(&self, _conn: &Connection, security_mode: SecurityMode) {
        debug!("New security mode: {}", security_mode);
    }

    fn on_bonded(
        &self,
        conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        info!("Bonded with {}", conn.peer_address());
        self.sys_attrs.borrow_mut().clear();
        self.peer.set(Some(Peer {
            master_id,
            key,
            peer_id,
        }));

        let peer = PeerAddress(conn.peer_address().bytes());
        (self.on_auth)(self.policy.on_auth_complete(true, peer));
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.peer
            .get()
            .and_then(|peer| (peer.master_id == master_id).then_some(peer.key))
    }

    fn get_peripheral_key(&self, conn: &Connection) -> Option<(MasterId, EncryptionInfo)> {
        self.peer.get().and_then(|peer| {
            peer.peer_id
                .is_match(conn.peer_address())
                .then_some((peer.master_id, peer.key))
        })
    }

    fn save_sys_attrs(&self, conn: &Connection) {
        if !self.is_bonded_peer(conn) {
            return;
        }
        let mut attrs = self.sys_attrs.borrow_mut();
        attrs.clear();
        if attrs.resize(SYS_ATTRS_LEN, 0).is_err() {
            return;
        }
        match get_sys_attrs(conn, &mut attrs) {
            Ok(len) => attrs.truncate(len),
            Err(e) => {
                warn!("Could not save system attributes: {}", e);
                attrs.clear();
            }
        }
    }

    fn load_sys_attrs(&self, conn: &Connection) {
        let attrs = self.sys_attrs.borrow();
        let attrs = (self.is_bonded_peer(conn) && !attrs.is_empty()).then_some(attrs.as_slice());
        if let Err(e) = set_sys_attrs(conn, attrs) {
            warn!("Could not load system attributes: {}", e);
        }
    }
}

/// Install the static pass key used by `DisplayOnly` pairing.
///
/// Call once after the SoftDevice is enabled.
pub fn install_pass_key(policy: &SecurityPolicy) -> Result<(), BleError> {
    static mut PASS_KEY: [u8; 6] = [b'0'; 6];

    // SAFETY: written once during startup, before the SoftDevice can read it.
    let digits = unsafe {
        let key = &mut *core::ptr::addr_of_mut!(PASS_KEY);
        *key = pass_key_digits(policy.pass_key());
        key.as_ptr()
    };
    let opt = raw::ble_opt_t {
        gap_opt: raw::ble_gap_opt_t {
            passkey: raw::ble_gap_opt_passkey_t { p_passkey: digits },
        },
    };
    let ret = unsafe { raw::sd_ble_opt_set(raw::BLE_GAP_OPTS_BLE_GAP_OPT_PASSKEY, &opt) };
    if ret == raw::NRF_SUCCESS {
        Ok(())
    } else {
        Err(BleError::Raw(ret))
    }
}
