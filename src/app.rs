//! Controller assembly and the single-threaded run loop. Every mutable
//! piece of state lives on this loop; the other threads (timers, decoder
//! watchers, the input reader) only send events into its channel.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::bluetooth::{Bluetooth, BluetoothCtl, NullBluetooth};
use crate::config::AppConfig;
use crate::display::{ConsoleDisplay, Display};
use crate::event::{Event, EVENT_CHANNEL_CAPACITY};
use crate::gesture::GestureDetector;
use crate::input::spawn_stdin_input;
use crate::library::Library;
use crate::menu::{Flow, Menu};
use crate::player::Player;
use crate::power::{NullPower, ShutdownCommand, SystemPower};
use crate::{log_debug, log_debug_content};

/// How long a blocked `recv` may hide a pending SIGINT/SIGTERM.
const SIGNAL_POLL: Duration = Duration::from_millis(100);

static TERMINATE_RECEIVED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_terminate(_signal: libc::c_int) {
    TERMINATE_RECEIVED.store(true, Ordering::SeqCst);
}

fn install_terminate_handler() {
    // SAFETY: the handler only stores to an atomic, which is
    // async-signal-safe.
    unsafe {
        let handler = handle_terminate as *const () as libc::sighandler_t;
        if libc::signal(libc::SIGINT, handler) == libc::SIG_ERR {
            log_debug("controller: failed to install SIGINT handler");
        }
        if libc::signal(libc::SIGTERM, handler) == libc::SIG_ERR {
            log_debug("controller: failed to install SIGTERM handler");
        }
    }
}

fn take_terminate() -> bool {
    TERMINATE_RECEIVED.swap(false, Ordering::SeqCst)
}

pub fn run(config: &AppConfig) -> Result<()> {
    let (events_tx, events_rx) = bounded::<Event>(EVENT_CHANNEL_CAPACITY);

    let display: Arc<dyn Display> = Arc::new(ConsoleDisplay);
    let bluetooth: Arc<dyn Bluetooth> = if config.no_bluetooth {
        Arc::new(NullBluetooth)
    } else {
        Arc::new(BluetoothCtl::new(config))
    };
    let power: Arc<dyn SystemPower> = if config.no_power {
        Arc::new(NullPower)
    } else {
        Arc::new(ShutdownCommand)
    };

    match bluetooth.autoconnect() {
        Some(device) => {
            log_debug_content(&format!("bluetooth: connected to {device}"));
            tracing::info!("audio sink connected");
        }
        None => tracing::warn!("no audio sink connected at startup"),
    }

    let library = Library::scan(&config.music_dir)
        .with_context(|| format!("scanning {}", config.music_dir.display()))?;
    tracing::info!(albums = library.len(), "library scanned");

    let mut player = Player::new(
        library,
        config.decoder_argv()?,
        config.audio_sink.clone(),
        display.clone(),
        bluetooth.clone(),
        events_tx.clone(),
    );
    let mut menu = Menu::new(
        display.clone(),
        bluetooth,
        power,
        events_tx.clone(),
    );
    let mut gestures = GestureDetector::new(
        Duration::from_millis(config.hold_ms),
        display.clone(),
        events_tx.clone(),
    );

    install_terminate_handler();
    // Detached on purpose: the reader blocks in stdin and ends with the
    // process.
    let _input = spawn_stdin_input(events_tx, Duration::from_millis(config.hold_ms));

    menu.show(&player);
    tracing::info!("controller ready");
    let outcome = run_loop(&events_rx, &mut player, &mut menu, &mut gestures);

    player.stop();
    display.clear();
    tracing::info!("controller stopped");
    outcome
}

fn run_loop(
    events: &Receiver<Event>,
    player: &mut Player,
    menu: &mut Menu,
    gestures: &mut GestureDetector,
) -> Result<()> {
    loop {
        if take_terminate() {
            tracing::info!("terminate signal received");
            return Ok(());
        }
        let event = match events.recv_timeout(SIGNAL_POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };
        if dispatch(event, player, menu, gestures) == Flow::Exit {
            return Ok(());
        }
    }
}

/// Route one event. Handler errors (a decoder that fails to spawn, a power
/// request that fails) are logged and absorbed; only an explicit exit flow
/// stops the loop.
fn dispatch(
    event: Event,
    player: &mut Player,
    menu: &mut Menu,
    gestures: &mut GestureDetector,
) -> Flow {
    match event {
        Event::ButtonDown(button) => {
            gestures.on_press(button);
            Flow::Continue
        }
        Event::ButtonUp(button) => match gestures.on_release(button) {
            Some(crate::gesture::Gesture::Press(button)) => {
                absorb(menu.press(player, button))
            }
            _ => Flow::Continue,
        },
        Event::HoldElapsed { button, generation } => {
            match gestures.on_hold_elapsed(button, generation) {
                Some(crate::gesture::Gesture::Hold(button)) => {
                    absorb(menu.hold(player, button))
                }
                _ => Flow::Continue,
            }
        }
        Event::DecoderExited { generation, code } => {
            absorb_unit(player.handle_decoder_exit(generation, code));
            Flow::Continue
        }
        Event::SleepElapsed { generation } => absorb(menu.handle_sleep_elapsed(generation)),
        Event::Shutdown => Flow::Exit,
    }
}

fn absorb(result: Result<Flow>) -> Flow {
    match result {
        Ok(flow) => flow,
        Err(err) => {
            log_debug(&format!("controller: action failed: {err:#}"));
            tracing::warn!("action failed");
            Flow::Continue
        }
    }
}

fn absorb_unit(result: Result<()>) {
    if let Err(err) = result {
        log_debug(&format!("controller: decoder handling failed: {err:#}"));
        tracing::warn!("decoder handling failed");
    }
}
