//! Press/hold disambiguation for the three panel buttons.
//!
//! A press arms that button's timer slot. If the slot fires before release
//! the cycle becomes a hold, and the slot is re-armed so `Hold` repeats at
//! the same cadence until release. A release before the first fire yields a
//! single `Press`; a release after any fire yields nothing.

use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;

use crate::display::Display;
use crate::event::Event;
use crate::timer::TimerSlot;

/// Physical panel buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    C,
}

impl Button {
    pub fn index(self) -> usize {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::C => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::C => "C",
        }
    }
}

/// A classified button interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Press(Button),
    Hold(Button),
}

#[derive(Default)]
struct ButtonState {
    pressed: bool,
    hold_fired: bool,
    generation: u64,
}

/// Converts raw press/release edges into gestures using one retrigger timer
/// slot per button. This layer cannot fail: timers are cancelled on every
/// release even if they already fired, and stale fires are dropped by
/// generation.
pub struct GestureDetector {
    buttons: [ButtonState; 3],
    timers: [TimerSlot; 3],
    hold: Duration,
    display: Arc<dyn Display>,
}

impl GestureDetector {
    pub fn new(hold: Duration, display: Arc<dyn Display>, events: Sender<Event>) -> Self {
        let timers = [
            TimerSlot::new(events.clone()),
            TimerSlot::new(events.clone()),
            TimerSlot::new(events),
        ];
        Self {
            buttons: [
                ButtonState::default(),
                ButtonState::default(),
                ButtonState::default(),
            ],
            timers,
            hold,
            display,
        }
    }

    /// A press edge: light the indicator and arm the hold timer. The input
    /// source guarantees a button cannot press again before its release.
    pub fn on_press(&mut self, button: Button) {
        let state = &mut self.buttons[button.index()];
        state.pressed = true;
        state.hold_fired = false;
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        self.display.button_light(Some(button));
        self.timers[button.index()].arm(self.hold, Event::HoldElapsed { button, generation });
    }

    /// A release edge: cancel the timer, clear the indicator, and emit
    /// `Press` iff no hold fired during this cycle.
    pub fn on_release(&mut self, button: Button) -> Option<Gesture> {
        self.timers[button.index()].cancel();
        self.display.button_light(None);
        let state = &mut self.buttons[button.index()];
        if !state.pressed {
            return None;
        }
        state.pressed = false;
        if state.hold_fired {
            None
        } else {
            Some(Gesture::Press(button))
        }
    }

    /// A timer fire routed back from the event loop. Stale fires (the button
    /// released, or a newer press cycle armed) emit nothing.
    pub fn on_hold_elapsed(&mut self, button: Button, generation: u64) -> Option<Gesture> {
        let state = &mut self.buttons[button.index()];
        if !state.pressed || state.generation != generation {
            return None;
        }
        state.hold_fired = true;
        self.timers[button.index()].arm(self.hold, Event::HoldElapsed { button, generation });
        Some(Gesture::Hold(button))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::RecordingDisplay;
    use crossbeam_channel::unbounded;

    const SHORT_HOLD: Duration = Duration::from_millis(30);

    fn detector() -> (
        GestureDetector,
        crossbeam_channel::Receiver<Event>,
        Arc<RecordingDisplay>,
    ) {
        let (tx, rx) = unbounded();
        let display = Arc::new(RecordingDisplay::new());
        let detector = GestureDetector::new(SHORT_HOLD, display.clone(), tx);
        (detector, rx, display)
    }

    #[test]
    fn short_press_yields_exactly_one_press() {
        let (mut detector, rx, _display) = detector();
        detector.on_press(Button::B);
        assert_eq!(
            detector.on_release(Button::B),
            Some(Gesture::Press(Button::B))
        );
        // The cancelled timer never delivers a fire for this cycle; if a
        // stale one slips through anyway it must classify as nothing.
        while let Ok(event) = rx.recv_timeout(Duration::from_millis(80)) {
            if let Event::HoldElapsed { button, generation } = event {
                assert_eq!(detector.on_hold_elapsed(button, generation), None);
            }
        }
    }

    #[test]
    fn held_button_repeats_hold_and_suppresses_press() {
        let (mut detector, rx, _display) = detector();
        detector.on_press(Button::A);

        let mut holds = 0;
        for _ in 0..2 {
            match rx.recv_timeout(Duration::from_millis(500)) {
                Ok(Event::HoldElapsed { button, generation }) => {
                    assert_eq!(button, Button::A);
                    assert_eq!(
                        detector.on_hold_elapsed(button, generation),
                        Some(Gesture::Hold(Button::A))
                    );
                    holds += 1;
                }
                other => panic!("expected hold fire, got {other:?}"),
            }
        }
        assert_eq!(holds, 2, "hold must repeat while the button stays down");

        // A hold-terminated release produces no trailing press.
        assert_eq!(detector.on_release(Button::A), None);
    }

    #[test]
    fn stale_fire_from_prior_cycle_is_dropped() {
        let (mut detector, rx, _display) = detector();
        detector.on_press(Button::C);
        let stale = match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Event::HoldElapsed { generation, .. }) => generation,
            other => panic!("expected hold fire, got {other:?}"),
        };
        // New press cycle before the loop got to the fire.
        detector.on_release(Button::C);
        detector.on_press(Button::C);
        assert_eq!(detector.on_hold_elapsed(Button::C, stale), None);
        assert_eq!(
            detector.on_release(Button::C),
            Some(Gesture::Press(Button::C))
        );
    }

    #[test]
    fn indicator_follows_press_and_release() {
        let (mut detector, _rx, display) = detector();
        detector.on_press(Button::A);
        detector.on_release(Button::A);
        let frames = display.take();
        assert_eq!(frames, vec!["light:A".to_string(), "light:off".to_string()]);
    }

    #[test]
    fn buttons_are_independent() {
        let (mut detector, rx, _display) = detector();
        detector.on_press(Button::A);
        detector.on_press(Button::B);
        assert_eq!(
            detector.on_release(Button::B),
            Some(Gesture::Press(Button::B))
        );
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(Event::HoldElapsed { button, generation }) => {
                assert_eq!(button, Button::A);
                assert_eq!(
                    detector.on_hold_elapsed(button, generation),
                    Some(Gesture::Hold(Button::A))
                );
            }
            other => panic!("expected hold fire for A, got {other:?}"),
        }
        assert_eq!(detector.on_release(Button::A), None);
    }
}
