//! The three-state control surface: player, options list, sleep list.
//!
//! Presses mean different things per state, holds always navigate: from the
//! player a held B opens the options, from anywhere else a hold bails back
//! to the player. The sleep deadline carries a generation so a re-armed or
//! cancelled timer cannot power the box off with a stale fire.

use anyhow::Result;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::bluetooth::Bluetooth;
use crate::display::Display;
use crate::event::Event;
use crate::gesture::Button;
use crate::log_debug;
use crate::player::Player;
use crate::power::SystemPower;
use crate::timer::TimerSlot;

const OPTION_LABELS: [&str; 6] = ["MENU", "SLiP", "PAIR", "RSET", "HALT", "BACK"];
/// Options cursor left on SLiP after a sleep choice, so the list reopens
/// where the operator just was.
const OPTION_SLEEP_INDEX: usize = 1;

const SLEEP_LABELS: [&str; 7] = ["10mn", "20mn", "30mn", "1H", "2H", "4H", "CANC"];
const SLEEP_MINUTES: [u64; 6] = [10, 20, 30, 60, 120, 240];
/// The sleep list opens on "1H".
const SLEEP_DEFAULT_INDEX: usize = 3;

/// Whether the run loop should keep going after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum MenuState {
    Player,
    Options { cursor: usize },
    Sleep { cursor: usize },
}

pub struct Menu {
    state: MenuState,
    display: Arc<dyn Display>,
    bluetooth: Arc<dyn Bluetooth>,
    power: Arc<dyn SystemPower>,
    deadline: TimerSlot,
    deadline_generation: u64,
    armed_deadline: Option<u64>,
}

impl Menu {
    pub fn new(
        display: Arc<dyn Display>,
        bluetooth: Arc<dyn Bluetooth>,
        power: Arc<dyn SystemPower>,
        events: Sender<Event>,
    ) -> Self {
        Self {
            state: MenuState::Player,
            display,
            bluetooth,
            power,
            deadline: TimerSlot::new(events),
            deadline_generation: 0,
            armed_deadline: None,
        }
    }

    /// A short press. In the player state the buttons drive playback; in a
    /// list, A/C move the cursor and B executes the selection.
    pub fn press(&mut self, player: &mut Player, button: Button) -> Result<Flow> {
        match self.state {
            MenuState::Player => {
                match button {
                    Button::A => player.previous()?,
                    Button::B => player.toggle_pause_resume()?,
                    Button::C => player.next()?,
                }
                Ok(Flow::Continue)
            }
            MenuState::Options { cursor } => match button {
                Button::A => {
                    self.state = MenuState::Options {
                        cursor: step_back(cursor, OPTION_LABELS.len()),
                    };
                    self.show(player);
                    Ok(Flow::Continue)
                }
                Button::C => {
                    self.state = MenuState::Options {
                        cursor: (cursor + 1) % OPTION_LABELS.len(),
                    };
                    self.show(player);
                    Ok(Flow::Continue)
                }
                Button::B => self.exec_option(player, cursor),
            },
            MenuState::Sleep { cursor } => match button {
                Button::A => {
                    self.state = MenuState::Sleep {
                        cursor: step_back(cursor, SLEEP_LABELS.len()),
                    };
                    self.show(player);
                    Ok(Flow::Continue)
                }
                Button::C => {
                    self.state = MenuState::Sleep {
                        cursor: (cursor + 1) % SLEEP_LABELS.len(),
                    };
                    self.show(player);
                    Ok(Flow::Continue)
                }
                Button::B => {
                    self.exec_sleep(player, cursor);
                    Ok(Flow::Continue)
                }
            },
        }
    }

    /// A hold (fires repeatedly while the button stays down). In the player
    /// state A/C skip whole albums and B opens the options list; in any
    /// list a hold escapes back to the player.
    pub fn hold(&mut self, player: &mut Player, button: Button) -> Result<Flow> {
        match self.state {
            MenuState::Player => match button {
                Button::A => player.previous_album()?,
                Button::C => player.next_album()?,
                Button::B => {
                    self.state = MenuState::Options { cursor: 0 };
                    self.show(player);
                }
            },
            MenuState::Options { .. } | MenuState::Sleep { .. } => {
                self.go_to_player(player);
            }
        }
        Ok(Flow::Continue)
    }

    fn exec_option(&mut self, player: &mut Player, cursor: usize) -> Result<Flow> {
        match OPTION_LABELS[cursor] {
            "MENU" | "BACK" => {
                self.go_to_player(player);
                Ok(Flow::Continue)
            }
            "SLiP" => {
                self.state = MenuState::Sleep {
                    cursor: SLEEP_DEFAULT_INDEX,
                };
                self.show(player);
                Ok(Flow::Continue)
            }
            "PAIR" => {
                // Pairing scans for tens of seconds; run it off the loop.
                // No state change, the options list stays up.
                let bluetooth = self.bluetooth.clone();
                thread::spawn(move || bluetooth.autopair());
                Ok(Flow::Continue)
            }
            "RSET" => self.shutdown(true),
            "HALT" => self.shutdown(false),
            other => {
                log_debug(&format!("menu: unmapped option {other}"));
                Ok(Flow::Continue)
            }
        }
    }

    fn exec_sleep(&mut self, player: &mut Player, cursor: usize) {
        if let Some(&minutes) = SLEEP_MINUTES.get(cursor) {
            self.deadline_generation += 1;
            let generation = self.deadline_generation;
            self.armed_deadline = Some(generation);
            self.deadline.arm(
                Duration::from_secs(minutes * 60),
                Event::SleepElapsed { generation },
            );
            log_debug(&format!("menu: sleep armed for {minutes} minutes"));
        } else {
            self.armed_deadline = None;
            self.deadline.cancel();
            log_debug("menu: sleep cancelled");
        }
        self.state = MenuState::Options {
            cursor: OPTION_SLEEP_INDEX,
        };
        self.show(player);
    }

    fn shutdown(&mut self, reboot: bool) -> Result<Flow> {
        self.display.clear();
        let outcome = if reboot {
            self.power.reboot()
        } else {
            self.power.power_off()
        };
        if let Err(err) = outcome {
            log_debug(&format!("power: request failed: {err:#}"));
        }
        Ok(Flow::Exit)
    }

    fn go_to_player(&mut self, player: &Player) {
        self.state = MenuState::Player;
        self.show(player);
    }

    /// Redraw for the current state: the pager in the player state, the
    /// selected label in a list.
    pub fn show(&self, player: &Player) {
        match self.state {
            MenuState::Player => player.show(),
            MenuState::Options { cursor } => self.display.text(OPTION_LABELS[cursor]),
            MenuState::Sleep { cursor } => self.display.text(SLEEP_LABELS[cursor]),
        }
    }

    /// A sleep deadline fired. Only the most recently armed, still-armed
    /// deadline powers the box off.
    pub fn handle_sleep_elapsed(&mut self, generation: u64) -> Result<Flow> {
        if self.armed_deadline != Some(generation) {
            return Ok(Flow::Continue);
        }
        self.armed_deadline = None;
        log_debug("menu: sleep deadline reached, powering off");
        self.shutdown(false)
    }
}

fn step_back(cursor: usize, len: usize) -> usize {
    (cursor + len - 1) % len
}
