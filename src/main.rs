//! ble-joystick - BLE HID-over-GATT joystick for nRF52840.
//!
//! Advertises as a generic HID device, accepts one central and streams
//! joystick input reports to it. Commands come from
//! [`ble::peripheral::push_joystick_command`]; this firmware feeds it with
//! a demo X-axis sweep.
//!
//! Tasks:
//! - `softdevice_task`: runs the SoftDevice event loop
//! - `control_task`: session state machine, advertising and GATT events
//! - `sender_task`: queue to input report notifications
//! - `button_task` / `led_task`: pairing toggle and status LED

#![no_std]
#![no_main]

mod ble;
mod config;
mod error;
mod joystick;
mod ui;

use ble::advertising::{AdvertisingPayload, DeviceName};
use ble::bonder::{install_pass_key, Bonder};
use ble::gatt::Server;
use ble::peripheral;
use ble::security::SecurityPolicy;
use ble::session::LinkEvent;
use config::{DEFAULT_DEVICE_NAME, DEMO_PERIOD_MS, DEMO_STEP};
use defmt::{error, info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pin, Pull};
use embassy_nrf::interrupt::Priority;
use embassy_time::{Duration, Ticker};
use joystick::{AXIS_CENTER, AXIS_MAX, AXIS_MIN};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn control_task(
    sd: &'static Softdevice,
    server: &'static Server,
    bonder: &'static Bonder,
    payload: &'static AdvertisingPayload,
) -> ! {
    peripheral::control_task(sd, server, bonder, payload).await
}

#[embassy_executor::task]
async fn sender_task(sd: &'static Softdevice, server: &'static Server) -> ! {
    peripheral::sender_task(sd, server).await
}

#[embassy_executor::task]
async fn button_task(pin: AnyPin) -> ! {
    ui::buttons::pairing_button_task(Input::new(pin, Pull::Up)).await
}

#[embassy_executor::task]
async fn led_task(pin: AnyPin) -> ! {
    ui::indicator::status_led_task(Output::new(pin, Level::High, OutputDrive::Standard)).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ble-joystick starting");

    // The SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    let startup = unwrap!(peripheral::init(DEFAULT_DEVICE_NAME));

    static NAME: StaticCell<DeviceName> = StaticCell::new();
    let name: &'static DeviceName = NAME.init(startup.name);

    let sd = Softdevice::enable(&peripheral::softdevice_config(name.as_str()));

    static SERVER: StaticCell<Server> = StaticCell::new();
    let server: &'static Server = match peripheral::start_services(sd, &startup.descriptor) {
        Ok(server) => SERVER.init(server),
        Err(e) => {
            error!("HID services not started: {}", e);
            let sd: &'static Softdevice = sd;
            unwrap!(spawner.spawn(softdevice_task(sd)));
            return;
        }
    };

    let policy = SecurityPolicy::default();
    unwrap!(install_pass_key(&policy));
    unwrap!(peripheral::set_appearance(sd));

    static BONDER: StaticCell<Bonder> = StaticCell::new();
    let bonder: &'static Bonder = BONDER.init(Bonder::new(policy, peripheral::post));

    static PAYLOAD: StaticCell<AdvertisingPayload> = StaticCell::new();
    let payload: &'static AdvertisingPayload = PAYLOAD.init(AdvertisingPayload::new(name.as_str()));

    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(control_task(sd, server, bonder, payload)));
    unwrap!(spawner.spawn(sender_task(sd, server)));
    unwrap!(spawner.spawn(button_task(p.P0_11.degrade())));
    unwrap!(spawner.spawn(led_task(p.P0_13.degrade())));

    peripheral::post(LinkEvent::ServicesStarted);
    info!("Services started as \"{}\"", name.as_str());

    // Demo producer: sweep X while the other axes rest at centre.
    let mut ticker = Ticker::every(Duration::from_millis(DEMO_PERIOD_MS));
    let mut x = AXIS_MIN;
    loop {
        ticker.next().await;
        if !peripheral::is_connected() {
            continue;
        }
        peripheral::push_joystick_command(0, x, AXIS_CENTER, AXIS_CENTER, AXIS_CENTER);
        x = if x >= AXIS_MAX { AXIS_MIN } else { x + DEMO_STEP };
    }
}
