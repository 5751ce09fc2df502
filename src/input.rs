//! Input handoff between the event-polling thread and the simulation
//!
//! The poller pushes raw events into a bounded queue; the simulation drains it
//! without blocking at the start of every tick. When the queue is full the
//! newest event is dropped, which at worst coalesces a burst of repeated key
//! presses into fewer ones.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use crate::consts::INPUT_QUEUE_CAPACITY;

/// Movement keys whose intent stays alive for a short hold window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Left,
    Right,
    Up,
}

/// A discrete input event consumed by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Key-down for a movement key (re-sent by key repeat while held)
    Key(MoveKey),
    /// Fire a projectile
    Fire,
    /// Cycle the blood colour mode
    ToggleBloodColor,
    /// Start round from the menu, pause/unpause, or leave the game-over screen
    Advance,
    /// Viewport size changed
    Resize { width: u16, height: u16 },
}

/// Producer half, owned by the input thread
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: SyncSender<InputEvent>,
}

impl InputSender {
    /// Queue an event without blocking. Returns false if it was dropped.
    pub fn send(&self, event: InputEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::trace!("Input queue full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half, owned by the simulation thread
#[derive(Debug)]
pub struct InputQueue {
    rx: Receiver<InputEvent>,
}

impl InputQueue {
    /// Create a queue with the default capacity
    pub fn channel() -> (InputSender, InputQueue) {
        Self::bounded(INPUT_QUEUE_CAPACITY)
    }

    pub fn bounded(capacity: usize) -> (InputSender, InputQueue) {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        (InputSender { tx }, InputQueue { rx })
    }

    /// Take every event buffered since the last drain
    pub fn drain(&self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}
