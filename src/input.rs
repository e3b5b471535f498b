//! Keyboard stand-in for the appliance buttons, driven over stdin. The GPIO
//! edge driver feeds the same down/up events on real hardware; this reader
//! exists so the controller can be exercised on a workstation.
//!
//! Lowercase `a`/`b`/`c` taps a button, uppercase holds it for longer than
//! the hold threshold, `q` shuts the controller down.

use crossbeam_channel::Sender;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::event::Event;
use crate::gesture::Button;
use crate::log_debug;

pub fn spawn_stdin_input(events: Sender<Event>, hold: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log_debug(&format!("input: stdin read failed: {err}"));
                    break;
                }
            };
            let keep_going = match line.trim() {
                "a" => tap(&events, Button::A),
                "b" => tap(&events, Button::B),
                "c" => tap(&events, Button::C),
                "A" => press_and_hold(&events, Button::A, hold),
                "B" => press_and_hold(&events, Button::B, hold),
                "C" => press_and_hold(&events, Button::C, hold),
                "q" => {
                    let _ = events.send(Event::Shutdown);
                    false
                }
                "" => true,
                other => {
                    log_debug(&format!("input: ignoring {other:?}"));
                    true
                }
            };
            if !keep_going {
                break;
            }
        }
    })
}

fn tap(events: &Sender<Event>, button: Button) -> bool {
    events.send(Event::ButtonDown(button)).is_ok()
        && events.send(Event::ButtonUp(button)).is_ok()
}

/// Keep the button down past the hold threshold so exactly one hold fires
/// before release.
fn press_and_hold(events: &Sender<Event>, button: Button, hold: Duration) -> bool {
    if events.send(Event::ButtonDown(button)).is_err() {
        return false;
    }
    thread::sleep(hold + hold / 4);
    events.send(Event::ButtonUp(button)).is_ok()
}
