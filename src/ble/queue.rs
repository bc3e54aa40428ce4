//! Bounded FIFO between the joystick producer and the report sender.
//!
//! `push` never blocks and is safe from interrupt context; when the
//! queue is full the newest command is rejected and the queued ones are
//! kept.

use crate::joystick::JoystickCommand;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};

/// Returned by [`CommandQueue::push`] when the command was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull(pub JoystickCommand);

pub struct CommandQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, JoystickCommand, N>,
}

impl<M: RawMutex, const N: usize> CommandQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue `cmd` without waiting.
    pub fn push(&self, cmd: JoystickCommand) -> Result<(), QueueFull> {
        self.channel.try_send(cmd).map_err(|_| QueueFull(cmd))
    }

    /// Wait up to `timeout` for the oldest command.
    pub async fn pop(&self, timeout: Duration) -> Option<JoystickCommand> {
        with_timeout(timeout, self.channel.receive()).await.ok()
    }

    /// Take the oldest command if one is queued.
    pub fn try_pop(&self) -> Option<JoystickCommand> {
        self.channel.try_receive().ok()
    }

    /// Drop everything queued. Returns how many commands were discarded.
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.channel.try_receive().is_ok() {
            dropped += 1;
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, const N: usize> Default for CommandQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
