//! GATT server: HID service and Device Information service.
//!
//! Characteristics are registered once at startup through the
//! SoftDevice's `ServiceBuilder`; only the handles are kept.

use crate::ble::device_info::{hid_information, ControlPoint, PnpId, PROTOCOL_MODE_REPORT};
use crate::ble::sender::NotificationChannel;
use crate::config::MANUFACTURER_NAME;
use crate::error::BleError;
use crate::joystick::descriptor::ReportDescriptor;
use crate::joystick::report::EncodedReport;
use crate::joystick::JoystickCommand;
use core::cell::RefCell;
use defmt::{debug, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, NotifyValueError, RegisterError, Service, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

const HID_SERVICE: u16 = 0x1812;
const HID_INFORMATION: u16 = 0x2A4A;
const REPORT_MAP: u16 = 0x2A4B;
const HID_CONTROL_POINT: u16 = 0x2A4C;
const HID_REPORT: u16 = 0x2A4D;
const PROTOCOL_MODE: u16 = 0x2A4E;
const REPORT_REFERENCE: u16 = 0x2908;

const DEVICE_INFORMATION: u16 = 0x180A;
const MANUFACTURER_NAME_STRING: u16 = 0x2A29;
const PNP_ID: u16 = 0x2A50;

/// Writes from the central that the control task cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Format)]
pub enum HidEvent {
    InputReportCccdWrite { notifications: bool },
    ControlPoint(ControlPoint),
    ProtocolMode(u8),
}

#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Format)]
pub struct HidService {
    hid_info: u16,
    report_map: u16,
    control_point: u16,
    protocol_mode: u16,
    pub input_report: u16,
    input_report_cccd: u16,
    input_report_reference: u16,
}

impl HidService {
    pub fn new(sd: &mut Softdevice, descriptor: &ReportDescriptor) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(HID_SERVICE))?;

        let hid_info = sb
            .add_characteristic(
                Uuid::new_16(HID_INFORMATION),
                Attribute::new(hid_information()).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        let report_map = sb
            .add_characteristic(
                Uuid::new_16(REPORT_MAP),
                Attribute::new(descriptor.as_bytes()).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        let control_point = sb
            .add_characteristic(
                Uuid::new_16(HID_CONTROL_POINT),
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = sb
            .add_characteristic(
                Uuid::new_16(PROTOCOL_MODE),
                Attribute::new([PROTOCOL_MODE_REPORT]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        // Hosts that read before the first notification see a centred stick.
        let idle = EncodedReport::encode(&JoystickCommand::centered());
        let mut input = sb.add_characteristic(
            Uuid::new_16(HID_REPORT),
            Attribute::new(*idle.as_bytes()).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        let input_reference = input.add_descriptor(
            Uuid::new_16(REPORT_REFERENCE),
            Attribute::new(descriptor.report_reference()).security(SecurityMode::JustWorks),
        )?;
        let input = input.build();

        let _service_handle = sb.build();

        Ok(Self {
            hid_info: hid_info.value_handle,
            report_map: report_map.value_handle,
            control_point: control_point.value_handle,
            protocol_mode: protocol_mode.value_handle,
            input_report: input.value_handle,
            input_report_cccd: input.cccd_handle,
            input_report_reference: input_reference.handle(),
        })
    }
}

impl Service for HidService {
    type Event = HidEvent;

    fn on_write(&self, handle: u16, data: &[u8]) -> Option<Self::Event> {
        let first = *data.first()?;
        if handle == self.input_report_cccd {
            Some(HidEvent::InputReportCccdWrite {
                notifications: first & 0x01 != 0,
            })
        } else if handle == self.control_point {
            ControlPoint::from_byte(first).map(HidEvent::ControlPoint)
        } else if handle == self.protocol_mode {
            Some(HidEvent::ProtocolMode(first))
        } else {
            None
        }
    }
}

pub struct DeviceInformationService {}

impl DeviceInformationService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(DEVICE_INFORMATION))?;

        sb.add_characteristic(
            Uuid::new_16(MANUFACTURER_NAME_STRING),
            Attribute::new(MANUFACTURER_NAME),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.add_characteristic(
            Uuid::new_16(PNP_ID),
            Attribute::new(PnpId::joystick().to_bytes()),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let _service_handle = sb.build();
        Ok(Self {})
    }
}

pub struct Server {
    _dis: DeviceInformationService,
    pub hid: HidService,
}

impl Server {
    pub fn new(sd: &mut Softdevice, descriptor: &ReportDescriptor) -> Result<Self, RegisterError> {
        let dis = DeviceInformationService::new(sd)?;
        let hid = HidService::new(sd, descriptor)?;
        debug!("HID service handles: {}", hid);
        Ok(Self { _dis: dis, hid })
    }
}

impl gatt_server::Server for Server {
    type Event = HidEvent;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        self.hid.on_write(handle, data)
    }
}

/// The central currently linked to the device, if any.
pub struct CurrentConnection {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<Connection>>>,
}

impl CurrentConnection {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn set(&self, conn: Option<Connection>) {
        self.inner.lock(|c| *c.borrow_mut() = conn);
    }

    pub fn get(&self) -> Option<Connection> {
        self.inner.lock(|c| c.borrow().clone())
    }
}

/// Sends encoded reports as input report notifications.
pub struct GattNotifier<'a> {
    sd: &'a Softdevice,
    handle: u16,
    conn: &'a CurrentConnection,
}

impl<'a> GattNotifier<'a> {
    pub fn new(sd: &'a Softdevice, server: &Server, conn: &'a CurrentConnection) -> Self {
        Self {
            sd,
            handle: server.hid.input_report,
            conn,
        }
    }
}

impl NotificationChannel for GattNotifier<'_> {
    type Error = BleError;

    fn notify(&mut self, report: &EncodedReport) -> Result<(), BleError> {
        // Keep the readable value in step with what was last notified.
        gatt_server::set_value(self.sd, self.handle, report.as_bytes())
            .map_err(|_| BleError::NotifyFailed)?;
        let conn = self.conn.get().ok_or(BleError::Disconnected)?;
        gatt_server::notify_value(&conn, self.handle, report.as_bytes()).map_err(|e| match e {
            NotifyValueError::Disconnected => BleError::Disconnected,
            NotifyValueError::Raw(raw) => BleError::Raw(raw as u32),
        })
    }
}
