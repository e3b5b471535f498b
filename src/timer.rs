//! Cancellable one-shot timers, one worker thread per logical slot.
//!
//! The controller owns exactly four slots: one hold timer per button and one
//! sleep deadline. Arming a slot replaces any pending deadline, so a slot can
//! never accumulate stale timers the way ad hoc timer threads would.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::event::Event;

const COMMAND_CHANNEL_CAPACITY: usize = 16;

enum Command {
    Arm { after: Duration, event: Event },
    Cancel,
    Shutdown,
}

/// A single cancellable timer slot. When the armed deadline elapses the slot
/// delivers its event into the main channel; re-arming or cancelling before
/// that discards the pending deadline.
pub struct TimerSlot {
    tx: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new(events: Sender<Event>) -> Self {
        let (tx, rx) = bounded(COMMAND_CHANNEL_CAPACITY);
        let handle = thread::spawn(move || run(rx, events));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Schedule `event` for delivery after `after`, replacing any pending
    /// deadline on this slot.
    pub fn arm(&self, after: Duration, event: Event) {
        let _ = self.tx.send(Command::Arm { after, event });
    }

    /// Discard the pending deadline, if any.
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(rx: Receiver<Command>, events: Sender<Event>) {
    let mut pending: Option<(Instant, Event)> = None;
    loop {
        let command = match pending {
            None => match rx.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            },
            Some((deadline, event)) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => {
                        pending = None;
                        if events.send(event).is_err() {
                            return;
                        }
                        None
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        };
        match command {
            Some(Command::Arm { after, event }) => {
                pending = Some((Instant::now() + after, event));
            }
            Some(Command::Cancel) => pending = None,
            Some(Command::Shutdown) => return,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Button;
    use crossbeam_channel::unbounded;

    fn hold_event(generation: u64) -> Event {
        Event::HoldElapsed {
            button: Button::A,
            generation,
        }
    }

    #[test]
    fn armed_slot_fires_after_deadline() {
        let (tx, rx) = unbounded();
        let slot = TimerSlot::new(tx);
        slot.arm(Duration::from_millis(20), hold_event(1));
        let event = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("timer fired");
        assert_eq!(event, hold_event(1));
    }

    #[test]
    fn cancel_discards_pending_deadline() {
        let (tx, rx) = unbounded();
        let slot = TimerSlot::new(tx);
        slot.arm(Duration::from_millis(30), hold_event(1));
        slot.cancel();
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn rearm_replaces_the_pending_deadline() {
        let (tx, rx) = unbounded();
        let slot = TimerSlot::new(tx);
        slot.arm(Duration::from_millis(30), hold_event(1));
        slot.arm(Duration::from_millis(120), hold_event(2));
        // The first deadline must not fire.
        assert!(rx.recv_timeout(Duration::from_millis(70)).is_err());
        let event = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("replacement deadline fired");
        assert_eq!(event, hold_event(2));
    }

    #[test]
    fn drop_stops_the_worker_without_firing() {
        let (tx, rx) = unbounded();
        let slot = TimerSlot::new(tx);
        slot.arm(Duration::from_secs(60), hold_event(1));
        drop(slot);
        assert!(rx.try_recv().is_err());
    }
}
