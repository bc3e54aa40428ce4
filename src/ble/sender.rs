//! Report sender: drains the command queue into input report notifications.
//!
//! The sender runs only between the state machine's `StartSender` and
//! `StopSender` actions. Each wait on the queue is bounded, so a timeout
//! doubles as a liveness tick; a stop request also wakes the wait early.

use crate::ble::link::JoystickLink;
use crate::config::SENDER_WAIT_SECS;
use crate::joystick::report::EncodedReport;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

/// Where encoded reports go (a GATT characteristic on the target, a
/// recorder in tests).
///
/// `notify` is called while the link's lock is held and must not block.
pub trait NotificationChannel {
    type Error;

    fn notify(&mut self, report: &EncodedReport) -> Result<(), Self::Error>;
}

/// Counters for one Running period of the sender.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SenderStats {
    /// Notifications accepted by the channel.
    pub sent: u32,
    /// Notifications the channel rejected.
    pub failed: u32,
    /// Commands taken from the queue after streaming had stopped.
    pub discarded: u32,
    /// Waits that ended without a command.
    pub ticks: u32,
}

pub struct ReportSender<'a, M: RawMutex, C: NotificationChannel> {
    link: &'a JoystickLink<M>,
    channel: C,
    wait: Duration,
}

impl<'a, M: RawMutex, C: NotificationChannel> ReportSender<'a, M, C> {
    pub fn new(link: &'a JoystickLink<M>, channel: C) -> Self {
        Self {
            link,
            channel,
            wait: Duration::from_secs(SENDER_WAIT_SECS),
        }
    }

    /// Override the bounded queue wait.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Wait for `StartSender`, then drain until `StopSender`.
    pub async fn run_once(&mut self) -> SenderStats {
        self.link.wait_for_sender_start().await;
        self.drain().await
    }

    /// Send queued commands in FIFO order until the sender is stopped.
    ///
    /// Returns immediately if the sender is not Running.
    pub async fn drain(&mut self) -> SenderStats {
        let mut stats = SenderStats::default();
        let link = self.link;

        while link.sender_running() {
            let popped = select(link.queue().pop(self.wait), link.sender_state_changed()).await;
            match popped {
                Either::First(Some(cmd)) => {
                    let channel = &mut self.channel;
                    match link.notify_if_streaming(&cmd, |report| channel.notify(report)) {
                        Some(Ok(())) => stats.sent += 1,
                        Some(Err(_)) => stats.failed += 1,
                        None => stats.discarded += 1,
                    }
                }
                Either::First(None) => stats.ticks += 1,
                // Start/stop changed; the loop condition re-checks.
                Either::Second(()) => {}
            }
        }
        stats
    }
}
