//! The central event type routed over one bounded channel into the main loop.
//!
//! Producers: the button input source, the per-button gesture timer slots,
//! the sleep-deadline slot, and the decoder watcher threads. The loop owns
//! all mutable controller state, so every event is handled to completion
//! before the next one.

use crate::gesture::Button;

/// Max pending events before producers block.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A raw press edge from the input source.
    ButtonDown(Button),
    /// A raw release edge from the input source.
    ButtonUp(Button),
    /// A gesture timer slot fired; only honored if `generation` still matches
    /// the button's current press cycle.
    HoldElapsed { button: Button, generation: u64 },
    /// A decoder watcher observed the subprocess exit. `code` is `None` when
    /// the decoder was killed by a signal or no status was available.
    DecoderExited { generation: u64, code: Option<i32> },
    /// The sleep deadline fired; only honored if `generation` is still armed.
    SleepElapsed { generation: u64 },
    /// Orderly teardown requested.
    Shutdown,
}
