//! Connection lifecycle state machine for the single HID peripheral link.
//!
//! Pure logic: every link-layer callback and operator request is turned
//! into a [`LinkEvent`], and [`Session::handle`] answers with the new
//! state plus the side effects the caller must perform. Nothing here
//! touches the radio, which keeps the transitions host-testable.

use heapless::Vec;

/// Where the peripheral is in its connection lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Not advertising and no link. Initial state.
    Idle,
    /// Discoverable and connectable, waiting for a central.
    Advertising,
    /// Link established, notifications not yet subscribed.
    Connected,
    /// The central subscribed to input reports; reports may be sent.
    NotifyEnabled,
}

impl SessionState {
    pub fn is_linked(self) -> bool {
        matches!(self, SessionState::Connected | SessionState::NotifyEnabled)
    }
}

/// BLE address of the peer that finished an authentication attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress(pub [u8; 6]);

/// Inputs to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// GATT services are registered and the report map is published.
    ServicesStarted,
    /// A central connected.
    Connected,
    /// The link dropped (any reason).
    Disconnected,
    /// The central wrote the input report CCCD.
    NotifySubscribe(bool),
    /// Pairing / bonding finished.
    AuthComplete { success: bool, peer: PeerAddress },
    /// The stack refused to start advertising.
    AdvertisingFailed,
    /// Operator asked to (re-)announce the HID service.
    ActivatePairing,
    /// Operator asked to withdraw the advertisement.
    DeactivatePairing,
}

/// Side effects requested by a transition, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    StartAdvertising,
    StopAdvertising,
    /// Allow CCCD writes from the new central to take effect.
    ArmNotifications,
    /// Forget the CCCD state of the departed central.
    DisarmNotifications,
    StartSender,
    StopSender,
    /// Discard queued commands so none cross a session boundary.
    FlushQueue,
    /// Actively disconnect the current central.
    DropLink,
}

/// Upper bound on actions a single transition can request.
pub const MAX_ACTIONS: usize = 6;

/// Outcome of feeding one event to the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: SessionState,
    pub to: SessionState,
    pub actions: Vec<Action, MAX_ACTIONS>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self {
            from: state,
            to: state,
            actions: Vec::new(),
        }
    }

    /// `true` if the state changed.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    pub fn has(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    fn push(&mut self, action: Action) {
        let pushed = self.actions.push(action);
        debug_assert!(pushed.is_ok(), "transition exceeds MAX_ACTIONS");
    }
}

/// The state machine. One instance per device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    sender_running: bool,
    services_started: bool,
    pairing_enabled: bool,
}

impl Session {
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
            sender_running: false,
            services_started: false,
            pairing_enabled: true,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_linked()
    }

    /// Whether the report sender is in its Running state.
    pub fn sender_running(&self) -> bool {
        self.sender_running
    }

    /// Whether the operator currently wants the device discoverable.
    pub fn pairing_enabled(&self) -> bool {
        self.pairing_enabled
    }

    /// Reports may leave the device only in this condition.
    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::NotifyEnabled && self.sender_running
    }

    /// Apply `event` and return the resulting transition.
    pub fn handle(&mut self, event: LinkEvent) -> Transition {
        use SessionState::*;

        let mut t = Transition::stay(self.state);
        match (self.state, event) {
            (Idle, LinkEvent::ServicesStarted) => {
                self.services_started = true;
                if self.pairing_enabled {
                    t.to = Advertising;
                    t.push(Action::StartAdvertising);
                }
            }
            (_, LinkEvent::ServicesStarted) => self.services_started = true,

            // A connection that raced a withdrawal from Idle is still a real link.
            (Idle | Advertising, LinkEvent::Connected) => {
                t.to = Connected;
                t.push(Action::ArmNotifications);
            }

            (Connected, LinkEvent::NotifySubscribe(true)) => {
                t.to = NotifyEnabled;
                t.push(Action::FlushQueue);
                t.push(Action::StartSender);
            }
            (NotifyEnabled, LinkEvent::NotifySubscribe(false)) => {
                t.to = Connected;
                self.stop_sender(&mut t);
                t.push(Action::FlushQueue);
            }

            (Connected | NotifyEnabled, LinkEvent::Disconnected) => self.tear_down(&mut t),

            (Connected | NotifyEnabled, LinkEvent::AuthComplete { success: false, .. }) => {
                t.push(Action::DropLink);
                self.tear_down(&mut t);
            }

            (Advertising, LinkEvent::AdvertisingFailed) => t.push(Action::StartAdvertising),

            (_, LinkEvent::ActivatePairing) => {
                self.pairing_enabled = true;
                match self.state {
                    Idle if self.services_started => {
                        t.to = Advertising;
                        t.push(Action::StartAdvertising);
                    }
                    Advertising => t.push(Action::StartAdvertising),
                    _ => {}
                }
            }
            (_, LinkEvent::DeactivatePairing) => {
                self.pairing_enabled = false;
                if self.state == Advertising {
                    t.to = Idle;
                    t.push(Action::StopAdvertising);
                }
            }

            _ => {}
        }

        self.state = t.to;
        if t.has(Action::StartSender) {
            self.sender_running = true;
        }
        t
    }

    fn stop_sender(&mut self, t: &mut Transition) {
        if self.sender_running {
            self.sender_running = false;
            t.push(Action::StopSender);
        }
    }

    fn tear_down(&mut self, t: &mut Transition) {
        t.to = SessionState::Advertising;
        t.push(Action::DisarmNotifications);
        self.stop_sender(t);
        t.push(Action::FlushQueue);
        self.pairing_enabled = true;
        t.push(Action::StartAdvertising);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
