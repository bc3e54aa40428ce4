//! Single authority over the joystick link.
//!
//! `JoystickLink` owns the session state machine, the command queue and
//! the event channel. Session transitions, queue flushes and the report
//! sender's check-and-send all run under one blocking mutex, so a report
//! can never leave after notifications were revoked, and no queued
//! command survives into the next session.
//!
//! Link-layer callbacks only [`post`](JoystickLink::post) events (async
//! contexts use [`post_async`](JoystickLink::post_async)); the
//! control loop takes them with [`next_event`](JoystickLink::next_event)
//! and applies them with [`apply`](JoystickLink::apply).

use core::cell::RefCell;

use crate::ble::advertising::{device_name, DeviceName};
use crate::ble::queue::CommandQueue;
use crate::ble::session::{Action, LinkEvent, Session, SessionState, Transition};
use crate::config::{COMMAND_QUEUE_CAPACITY, JOYSTICK_REPORT_ID, LINK_EVENT_CAPACITY};
use crate::error::Error;
use crate::joystick::descriptor::ReportDescriptor;
use crate::joystick::report::EncodedReport;
use crate::joystick::{ClampedAxes, JoystickCommand};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

/// What happened to a pushed command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushOutcome {
    /// Queued for the sender.
    Queued,
    /// No subscribed central; the command was discarded.
    NotStreaming,
    /// Queue full; the command was discarded and the queue kept as is.
    QueueFull,
}

/// Result of [`JoystickLink::push_command`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PushReceipt {
    pub outcome: PushOutcome,
    /// Axes that were saturated into range before queueing.
    pub clamped: ClampedAxes,
}

/// Everything the firmware needs to register services after `init`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Startup {
    pub name: DeviceName,
    pub descriptor: ReportDescriptor,
}

struct Shared {
    session: Session,
    initialized: bool,
}

pub struct JoystickLink<M: RawMutex> {
    shared: Mutex<M, RefCell<Shared>>,
    queue: CommandQueue<M, COMMAND_QUEUE_CAPACITY>,
    events: Channel<M, LinkEvent, LINK_EVENT_CAPACITY>,
    sender_wake: Signal<M, ()>,
}

impl<M: RawMutex> JoystickLink<M> {
    pub const fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared {
                session: Session::new(),
                initialized: false,
            })),
            queue: CommandQueue::new(),
            events: Channel::new(),
            sender_wake: Signal::new(),
        }
    }

    /// One-time startup: normalise the device name and build the report map.
    ///
    /// The caller registers GATT services from the returned [`Startup`] and
    /// then posts [`LinkEvent::ServicesStarted`].
    pub fn init(&self, name: &str) -> Result<Startup, Error> {
        let descriptor = ReportDescriptor::new(JOYSTICK_REPORT_ID)?;
        self.shared.lock(|s| {
            let mut s = s.borrow_mut();
            if s.initialized {
                return Err(Error::AlreadyInitialized);
            }
            s.initialized = true;
            Ok(())
        })?;
        Ok(Startup {
            name: device_name(name),
            descriptor,
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.lock(|s| s.borrow().initialized)
    }

    // Producer side

    /// Queue a joystick sample for transmission. Never blocks.
    pub fn push_joystick_command(
        &self,
        buttons: u8,
        x: u16,
        y: u16,
        x_rotation: u16,
        y_rotation: u16,
    ) -> PushReceipt {
        self.push_command(JoystickCommand::new(buttons, x, y, x_rotation, y_rotation))
    }

    /// Queue `cmd`, saturating out-of-range axes first.
    pub fn push_command(&self, cmd: JoystickCommand) -> PushReceipt {
        let (cmd, clamped) = cmd.clamped();
        let outcome = self.shared.lock(|s| {
            if s.borrow().session.state() != SessionState::NotifyEnabled {
                return PushOutcome::NotStreaming;
            }
            match self.queue.push(cmd) {
                Ok(()) => PushOutcome::Queued,
                Err(_) => PushOutcome::QueueFull,
            }
        });
        PushReceipt { outcome, clamped }
    }

    // Control side

    /// Hand an event to the control loop. Safe from callbacks.
    pub fn post(&self, event: LinkEvent) -> Result<(), Error> {
        self.events
            .try_send(event)
            .map_err(|_| Error::EventQueueFull)
    }

    /// Hand an event to the control loop, waiting for room if the channel
    /// is full. Used for connection lifecycle events, which must not be lost.
    pub async fn post_async(&self, event: LinkEvent) {
        self.events.send(event).await
    }

    pub async fn next_event(&self) -> LinkEvent {
        self.events.receive().await
    }

    /// Run one transition. Queue flushes and sender start/stop happen
    /// atomically with the state change; the remaining actions are left
    /// to the caller.
    pub fn apply(&self, event: LinkEvent) -> Transition {
        let t = self.shared.lock(|s| {
            let t = s.borrow_mut().session.handle(event);
            if t.has(Action::FlushQueue) {
                self.queue.clear();
            }
            t
        });
        if t.has(Action::StartSender) || t.has(Action::StopSender) {
            self.sender_wake.signal(());
        }
        t
    }

    /// Re-announce the HID service. Idempotent.
    pub fn activate_pairing(&self) -> Result<(), Error> {
        self.require_init()?;
        self.post(LinkEvent::ActivatePairing)
    }

    /// Withdraw the advertisement without dropping a live link. Idempotent.
    pub fn deactivate_pairing(&self) -> Result<(), Error> {
        self.require_init()?;
        self.post(LinkEvent::DeactivatePairing)
    }

    fn require_init(&self) -> Result<(), Error> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    // Queries

    pub fn is_connected(&self) -> bool {
        self.shared.lock(|s| s.borrow().session.is_connected())
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock(|s| s.borrow().session.state())
    }

    pub fn sender_running(&self) -> bool {
        self.shared.lock(|s| s.borrow().session.sender_running())
    }

    pub fn pairing_enabled(&self) -> bool {
        self.shared.lock(|s| s.borrow().session.pairing_enabled())
    }

    pub fn queue(&self) -> &CommandQueue<M, COMMAND_QUEUE_CAPACITY> {
        &self.queue
    }

    // Sender side

    /// Wait until the sender is started.
    pub async fn wait_for_sender_start(&self) {
        while !self.sender_running() {
            self.sender_wake.wait().await;
        }
    }

    /// Resolves when the sender was started or stopped since the last call.
    pub async fn sender_state_changed(&self) {
        self.sender_wake.wait().await
    }

    /// Encode `cmd` and pass it to `send` while streaming, under the same
    /// lock that guards transitions. Returns `None` if not streaming.
    pub fn notify_if_streaming<E>(
        &self,
        cmd: &JoystickCommand,
        send: impl FnOnce(&EncodedReport) -> Result<(), E>,
    ) -> Option<Result<(), E>> {
        let report = EncodedReport::encode(cmd);
        self.shared.lock(|s| {
            if s.borrow().session.is_streaming() {
                Some(send(&report))
            } else {
                None
            }
        })
    }
}

impl<M: RawMutex> Default for JoystickLink<M> {
    fn default() -> Self {
        Self::new()
    }
}
