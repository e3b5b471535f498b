//! Playback supervision: the album/track cursor, the decoder subprocess,
//! and the failure-driven reconnect path.
//!
//! At most one decoder is alive at any instant: `play` interrupts the
//! predecessor before spawning, and every spawn gets a fresh generation so
//! reports from replaced decoders are inert. A clean exit advances the
//! cursor; a nonzero exit is treated as a lost wireless link and answered
//! with a reconnect, never a track skip.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::Sender;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;

use crate::bluetooth::Bluetooth;
use crate::display::Display;
use crate::event::Event;
use crate::library::{Cursor, Library};
use crate::{log_debug, log_debug_content};

/// Control signals sent to the live decoder by pid.
#[derive(Debug, Clone, Copy)]
enum DecoderSignal {
    Interrupt,
    Suspend,
    Resume,
}

fn send_decoder_signal(pid: u32, signal: DecoderSignal) {
    #[cfg(unix)]
    unsafe {
        let signo = match signal {
            DecoderSignal::Interrupt => libc::SIGINT,
            DecoderSignal::Suspend => libc::SIGSTOP,
            DecoderSignal::Resume => libc::SIGCONT,
        };
        if libc::kill(pid as i32, signo) != 0 {
            log_debug(&format!(
                "player: failed to send signal {signo} to pid {pid}: {}",
                io::Error::last_os_error()
            ));
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        let _ = signal;
        log_debug("player: decoder signals unsupported on this platform");
    }
}

pub struct Player {
    library: Library,
    cursor: Cursor,
    playing: bool,
    decoder_pid: Option<u32>,
    generation: u64,
    decoder_argv: Vec<String>,
    audio_sink: String,
    display: Arc<dyn Display>,
    bluetooth: Arc<dyn Bluetooth>,
    events: Sender<Event>,
}

impl Player {
    pub fn new(
        library: Library,
        decoder_argv: Vec<String>,
        audio_sink: String,
        display: Arc<dyn Display>,
        bluetooth: Arc<dyn Bluetooth>,
        events: Sender<Event>,
    ) -> Self {
        Self {
            library,
            cursor: Cursor::START,
            playing: false,
            decoder_pid: None,
            generation: 0,
            decoder_argv,
            audio_sink,
            display,
            bluetooth,
            events,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stop any live decoder, then start one for the cursor track (or the
    /// override path). The stop is ordered before the spawn so two decoders
    /// are never alive together. Spawn failure abandons the attempt with the
    /// cursor unchanged; the controller keeps running.
    pub fn play(&mut self, track_override: Option<&Path>) -> Result<()> {
        self.stop();
        let path: PathBuf = match track_override {
            Some(path) => path.to_path_buf(),
            None => self.library.track(self.cursor).to_path_buf(),
        };
        let mut child = self.spawn_decoder(&path)?;
        self.decoder_pid = Some(child.id());
        self.playing = true;
        self.generation += 1;
        let generation = self.generation;
        log_debug_content(&format!("player: playing {}", path.display()));
        self.show();

        let events = self.events.clone();
        thread::spawn(move || {
            let code = match child.wait() {
                Ok(status) => status.code(),
                Err(err) => {
                    log_debug(&format!("player: decoder wait failed: {err}"));
                    None
                }
            };
            let _ = events.send(Event::DecoderExited { generation, code });
        });
        Ok(())
    }

    fn spawn_decoder(&self, path: &Path) -> Result<Child> {
        let (program, args) = self
            .decoder_argv
            .split_first()
            .ok_or_else(|| anyhow!("decoder command is empty"))?;
        Command::new(program)
            .args(args)
            .arg("-a")
            .arg(&self.audio_sink)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn decoder {program}"))
    }

    /// Interrupt the live decoder, if any, and invalidate its watcher.
    pub fn stop(&mut self) {
        self.playing = false;
        self.generation += 1;
        if let Some(pid) = self.decoder_pid.take() {
            send_decoder_signal(pid, DecoderSignal::Interrupt);
        }
    }

    /// Suspend the decoder without touching the cursor.
    pub fn pause(&mut self) {
        if let Some(pid) = self.decoder_pid {
            send_decoder_signal(pid, DecoderSignal::Suspend);
        }
        self.playing = false;
        self.show();
    }

    pub fn resume(&mut self) {
        if let Some(pid) = self.decoder_pid {
            send_decoder_signal(pid, DecoderSignal::Resume);
        }
        self.playing = true;
        self.show();
    }

    pub fn toggle_pause_resume(&mut self) -> Result<()> {
        if self.decoder_pid.is_none() {
            self.play(None)
        } else if self.playing {
            self.pause();
            Ok(())
        } else {
            self.resume();
            Ok(())
        }
    }

    pub fn previous(&mut self) -> Result<()> {
        self.cursor = self.cursor.previous(&self.library);
        self.play(None)
    }

    pub fn next(&mut self) -> Result<()> {
        self.cursor = self.cursor.next(&self.library);
        self.play(None)
    }

    pub fn previous_album(&mut self) -> Result<()> {
        self.cursor = self.cursor.previous_album(&self.library);
        self.play(None)
    }

    pub fn next_album(&mut self) -> Result<()> {
        self.cursor = self.cursor.next_album(&self.library);
        self.play(None)
    }

    /// Refresh the pager for the current cursor and playing flag.
    pub fn show(&self) {
        self.display
            .pager(self.cursor.album, self.cursor.track, self.playing);
    }

    /// Route a watcher report. Stale generations belong to decoders this
    /// supervisor already replaced and are dropped; a missing exit code
    /// means the decoder was signalled (our own stop included) and is not
    /// a failure.
    pub fn handle_decoder_exit(&mut self, generation: u64, code: Option<i32>) -> Result<()> {
        if generation != self.generation {
            return Ok(());
        }
        match code {
            Some(0) => {
                self.decoder_pid = None;
                log_debug("player: track finished, advancing");
                self.next()
            }
            Some(code) => {
                self.decoder_pid = None;
                self.playing = false;
                log_debug(&format!(
                    "player: decoder exited with code {code}; reconnecting sink"
                ));
                self.display.text("ERR");
                if let Some(device) = self.bluetooth.reconnect() {
                    log_debug_content(&format!("bluetooth: reconnected to {device}"));
                    self.display.text("OK");
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}
