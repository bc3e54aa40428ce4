//! Peripheral role: the public joystick API and the tasks behind it.
//!
//! One [`JoystickLink`] lives in a static. Application code calls the
//! free functions below from any task; the control task owns the radio
//! (advertising and the GATT event loop) and the sender task owns the
//! input report notifications.

use crate::ble::advertising::AdvertisingPayload;
use crate::ble::bonder::Bonder;
use crate::ble::gatt::{CurrentConnection, GattNotifier, HidEvent, Server};
use crate::ble::link::{JoystickLink, PushOutcome, Startup};
use crate::ble::sender::ReportSender;
use crate::ble::session::{Action, LinkEvent, SessionState};
use crate::config::{ADV_INTERVAL_MAX, ADV_RETRY_MS, APPEARANCE_GENERIC_HID};
use crate::error::{BleError, Error};
use crate::joystick::descriptor::ReportDescriptor;
use core::mem;
use defmt::{debug, info, warn, Format};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::ble::peripheral::{self, ConnectableAdvertisement};
use nrf_softdevice::{raw, Config, Softdevice};

static LINK: JoystickLink<CriticalSectionRawMutex> = JoystickLink::new();
static CONNECTION: CurrentConnection = CurrentConnection::new();
static ADVERTISING: Signal<CriticalSectionRawMutex, Advertise> = Signal::new();

/// Requests from the control loop to the link-layer loop.
#[derive(Clone, Copy, PartialEq, Eq, Format)]
enum Advertise {
    Start,
    Stop,
}

// Public API

/// One-time startup. Register the GATT services from the returned
/// [`Startup`], then post [`LinkEvent::ServicesStarted`].
pub fn init(name: &str) -> Result<Startup, Error> {
    LINK.init(name)
}

pub fn activate_pairing() -> Result<(), Error> {
    LINK.activate_pairing()
}

pub fn deactivate_pairing() -> Result<(), Error> {
    LINK.deactivate_pairing()
}

pub fn pairing_enabled() -> bool {
    LINK.pairing_enabled()
}

pub fn is_connected() -> bool {
    LINK.is_connected()
}

pub fn state() -> SessionState {
    LINK.state()
}

/// Queue one joystick sample. Never blocks; drops the sample when no
/// central is subscribed or the queue is full.
pub fn push_joystick_command(
    buttons: u8,
    x: u16,
    y: u16,
    x_rotation: u16,
    y_rotation: u16,
) -> PushOutcome {
    let receipt = LINK.push_joystick_command(buttons, x, y, x_rotation, y_rotation);
    if receipt.clamped.any() {
        warn!("Axis out of range, clamped: {}", receipt.clamped);
    }
    if receipt.outcome == PushOutcome::QueueFull {
        warn!("Command queue full, sample dropped");
    }
    receipt.outcome
}

/// Hand an event to the control task from a SoftDevice callback. Drops
/// the event when the channel is full; lifecycle events from the
/// link-layer loop go through [`JoystickLink::post_async`] instead.
pub fn post(event: LinkEvent) {
    if LINK.post(event).is_err() {
        warn!("Link event dropped: {}", event);
    }
}

// SoftDevice setup

pub fn softdevice_config(name: &'static str) -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: name.as_ptr() as _,
            current_len: name.len() as u16,
            max_len: name.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        conn_gatts: Some(raw::ble_gatts_conn_cfg_t {
            hvn_tx_queue_size: 4,
        }),
        ..Default::default()
    }
}

/// Register the GATT services. On failure the device keeps running
/// without them.
pub fn start_services(sd: &mut Softdevice, descriptor: &ReportDescriptor) -> Result<Server, Error> {
    Server::new(sd, descriptor).map_err(|e| {
        warn!("GATT registration failed: {}", e);
        Error::Ble(BleError::RegisterFailed)
    })
}

/// GAP appearance characteristic: generic HID.
pub fn set_appearance(_sd: &Softdevice) -> Result<(), BleError> {
    let ret = unsafe { raw::sd_ble_gap_appearance_set(APPEARANCE_GENERIC_HID) };
    if ret == raw::NRF_SUCCESS {
        Ok(())
    } else {
        Err(BleError::Raw(ret))
    }
}

// Tasks

/// Apply link events and own the radio. Never returns.
pub async fn control_task(
    sd: &'static Softdevice,
    server: &'static Server,
    bonder: &'static Bonder,
    payload: &'static AdvertisingPayload,
) -> ! {
    match select(event_loop(), link_layer(sd, server, bonder, payload)).await {
        Either::First(never) => never,
        Either::Second(never) => never,
    }
}

/// Drain the command queue into notifications whenever a central is
/// subscribed. Never returns.
pub async fn sender_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    let mut sender = ReportSender::new(&LINK, GattNotifier::new(sd, server, &CONNECTION));
    loop {
        let stats = sender.run_once().await;
        info!("Report sender stopped: {}", stats);
    }
}

async fn event_loop() -> ! {
    loop {
        let event = LINK.next_event().await;
        let t = LINK.apply(event);
        if t.changed() {
            info!("Session {} -> {} ({})", t.from, t.to, event);
        } else {
            debug!("Session stays {} ({})", t.to, event);
        }
        for action in t.actions.iter() {
            perform(*action);
        }
    }
}

fn perform(action: Action) {
    match action {
        Action::StartAdvertising => ADVERTISING.signal(Advertise::Start),
        Action::StopAdvertising => ADVERTISING.signal(Advertise::Stop),
        Action::DropLink => {
            if let Some(conn) = CONNECTION.get() {
                if conn.disconnect().is_err() {
                    debug!("Link already down");
                }
            }
        }
        // Queue flushes and sender start/stop already happened inside `apply`.
        Action::ArmNotifications
        | Action::DisarmNotifications
        | Action::StartSender
        | Action::StopSender
        | Action::FlushQueue => debug!("Action: {}", action),
    }
}

async fn wait_for_stop() {
    while ADVERTISING.wait().await != Advertise::Stop {}
}

async fn link_layer(
    sd: &'static Softdevice,
    server: &'static Server,
    bonder: &'static Bonder,
    payload: &'static AdvertisingPayload,
) -> ! {
    let config = peripheral::Config {
        interval: ADV_INTERVAL_MAX,
        ..Default::default()
    };

    loop {
        while ADVERTISING.wait().await != Advertise::Start {}

        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: payload.adv_data(),
            scan_data: payload.scan_data(),
        };
        info!("Advertising");

        let advertised = select(
            peripheral::advertise_pairable(sd, adv, &config, bonder),
            wait_for_stop(),
        )
        .await;
        let conn = match advertised {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(e)) => {
                warn!("Advertising failed: {}", e);
                Timer::after(Duration::from_millis(ADV_RETRY_MS)).await;
                LINK.post_async(LinkEvent::AdvertisingFailed).await;
                continue;
            }
            Either::Second(()) => {
                info!("Advertising stopped");
                continue;
            }
        };

        info!("Connected to {}", conn.peer_address());
        CONNECTION.set(Some(conn.clone()));
        LINK.post_async(LinkEvent::Connected).await;

        let reason = gatt_server::run(&conn, server, |event| match event {
            HidEvent::InputReportCccdWrite { notifications } => {
                post(LinkEvent::NotifySubscribe(notifications))
            }
            HidEvent::ControlPoint(cp) => info!("HID control point: {}", cp),
            HidEvent::ProtocolMode(mode) => debug!("Protocol mode write: {=u8}", mode),
        })
        .await;

        CONNECTION.set(None);
        info!("Disconnected: {}", reason);
        LINK.post_async(LinkEvent::Disconnected).await;
    }
}
