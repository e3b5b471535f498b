//! Wireless sink control via the `bluetoothctl` text channel.
//!
//! Each operation runs one scripted child: commands are written to its
//! stdin with a settle delay apiece, stdin is closed to end the session,
//! and device addresses are scraped out of the combined output. The rest
//! of the controller only sees the four-method `Bluetooth` trait.

use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::Duration;

use crate::config::AppConfig;
use crate::lock_or_recover;
use crate::{log_debug, log_debug_content};

/// Bluetooth MAC address as reported by the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pairing control channel consumed by the player's failure path and
/// the options menu. `reconnect` and `autoconnect` are safe to call
/// repeatedly.
pub trait Bluetooth: Send + Sync {
    /// Currently connected sink, if any.
    fn info(&self) -> Option<DeviceId>;
    /// Connect to any known device, with a bounded number of passes.
    fn autoconnect(&self) -> Option<DeviceId>;
    /// Disconnect, then reconnect to the same device or fall back to
    /// `autoconnect`.
    fn reconnect(&self) -> Option<DeviceId>;
    /// Best-effort pairing of a newly scanned device.
    fn autopair(&self);
}

/// Adapter used against a wired sink (`--no-bluetooth`).
pub struct NullBluetooth;

impl Bluetooth for NullBluetooth {
    fn info(&self) -> Option<DeviceId> {
        None
    }

    fn autoconnect(&self) -> Option<DeviceId> {
        None
    }

    fn reconnect(&self) -> Option<DeviceId> {
        None
    }

    fn autopair(&self) {}
}

/// Autoconnect walks the paired list this many times before giving up.
const AUTOCONNECT_PASSES: u32 = 3;
const CONNECT_SETTLE: Duration = Duration::from_secs(2);
const DISCONNECT_SETTLE: Duration = Duration::from_secs(1);
const SCAN_SETTLE: Duration = Duration::from_secs(5);
const TRUST_SETTLE: Duration = Duration::from_secs(20);

pub struct BluetoothCtl {
    ctl_cmd: String,
    current: Mutex<Option<DeviceId>>,
    asoundrc: PathBuf,
}

impl BluetoothCtl {
    pub fn new(config: &AppConfig) -> Self {
        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            ctl_cmd: config.bluetoothctl_cmd.clone(),
            current: Mutex::new(None),
            asoundrc: home.join(".asoundrc"),
        }
    }

    /// Run one scripted session. Each command gets its settle delay before
    /// the next is written; closing stdin ends the session.
    fn exec(&self, commands: &[(String, Duration)]) -> Result<String> {
        let mut child = Command::new(&self.ctl_cmd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.ctl_cmd))?;
        if let Some(mut stdin) = child.stdin.take() {
            for (command, settle) in commands {
                if writeln!(stdin, "{command}").is_err() {
                    break;
                }
                let _ = stdin.flush();
                if !settle.is_zero() {
                    thread::sleep(*settle);
                }
            }
        }
        let output = child
            .wait_with_output()
            .context("waiting for control channel")?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn set_current(&self, device: Option<DeviceId>) {
        *lock_or_recover(&self.current, "bluetooth current device") = device;
    }

    fn current(&self) -> Option<DeviceId> {
        lock_or_recover(&self.current, "bluetooth current device").clone()
    }

    /// Rewrite the ALSA routing config so decoder output follows the sink.
    /// Only connect success calls this; storing the device never does.
    pub fn configure_audio_route(&self, device: &DeviceId) -> Result<()> {
        write_audio_route(&self.asoundrc, device)
    }

    pub fn paired_devices(&self) -> Vec<DeviceId> {
        match self.exec(&[("paired-devices".to_string(), Duration::ZERO)]) {
            Ok(output) => parse_devices(&output),
            Err(err) => {
                log_debug(&format!("bluetooth: paired-devices failed: {err:#}"));
                Vec::new()
            }
        }
    }

    pub fn scan(&self, settle: Duration) -> Vec<DeviceId> {
        match self.exec(&[("scan on".to_string(), settle)]) {
            Ok(output) => parse_devices(&output),
            Err(err) => {
                log_debug(&format!("bluetooth: scan failed: {err:#}"));
                Vec::new()
            }
        }
    }

    pub fn connect(&self, device: &DeviceId) -> Option<DeviceId> {
        self.connect_with(device, CONNECT_SETTLE)
    }

    fn connect_with(&self, device: &DeviceId, settle: Duration) -> Option<DeviceId> {
        let output = match self.exec(&[(format!("connect {device}"), settle)]) {
            Ok(output) => output,
            Err(err) => {
                log_debug(&format!("bluetooth: connect failed: {err:#}"));
                return None;
            }
        };
        if !output.contains("Connection successful") {
            return None;
        }
        if let Err(err) = self.configure_audio_route(device) {
            log_debug(&format!("bluetooth: audio route update failed: {err:#}"));
        }
        self.set_current(Some(device.clone()));
        log_debug_content(&format!("bluetooth: connected to {device}"));
        Some(device.clone())
    }

    pub fn disconnect(&self) -> bool {
        let command = match self.current() {
            Some(device) => format!("disconnect {device}"),
            None => "disconnect".to_string(),
        };
        let ok = self
            .exec(&[(command, DISCONNECT_SETTLE)])
            .map(|output| output.contains("Successful disconnected"))
            .unwrap_or(false);
        self.set_current(None);
        ok
    }

    pub fn pair(&self, device: &DeviceId) -> Option<DeviceId> {
        let output = match self.exec(&[
            ("scan on".to_string(), Duration::ZERO),
            (format!("trust {device}"), TRUST_SETTLE),
            (format!("pair {device}"), Duration::from_secs(2)),
        ]) {
            Ok(output) => output,
            Err(err) => {
                log_debug(&format!("bluetooth: pair failed: {err:#}"));
                return None;
            }
        };
        let trusted = output.contains("trust succeeded");
        let paired = output.contains("Pairing successful")
            || output.contains("Failed to pair: org.bluez.Error.AlreadyExists");
        if trusted && paired {
            self.connect(device)
        } else {
            log_debug(&format!("bluetooth: pair refused (trust={trusted}, pair={paired})"));
            None
        }
    }

}

impl Bluetooth for BluetoothCtl {
    fn info(&self) -> Option<DeviceId> {
        let output = match self.exec(&[("info".to_string(), Duration::ZERO)]) {
            Ok(output) => output,
            Err(err) => {
                log_debug(&format!("bluetooth: info failed: {err:#}"));
                return None;
            }
        };
        let device = parse_devices(&output).into_iter().next();
        self.set_current(device.clone());
        device
    }

    fn autoconnect(&self) -> Option<DeviceId> {
        if let Some(device) = self.info() {
            log_debug_content(&format!("bluetooth: already connected to {device}"));
            return Some(device);
        }
        let paired = self.paired_devices();
        if paired.is_empty() {
            log_debug("bluetooth: no paired devices");
            return None;
        }
        let mut settle = CONNECT_SETTLE;
        for pass in 0..AUTOCONNECT_PASSES {
            for device in &paired {
                if let Some(connected) = self.connect_with(device, settle) {
                    return Some(connected);
                }
            }
            log_debug(&format!("bluetooth: autoconnect pass {} failed", pass + 1));
            settle = settle.saturating_mul(2);
        }
        None
    }

    fn reconnect(&self) -> Option<DeviceId> {
        let device = self.info();
        self.disconnect();
        match device {
            Some(device) => self.connect(&device),
            None => self.autoconnect(),
        }
    }

    fn autopair(&self) {
        let known = self.paired_devices();
        let fresh = self
            .scan(SCAN_SETTLE)
            .into_iter()
            .find(|device| !known.contains(device));
        match fresh {
            Some(device) => {
                if self.pair(&device).is_none() {
                    log_debug("bluetooth: autopair could not pair the scanned device");
                }
            }
            None => log_debug("bluetooth: autopair found no new devices"),
        }
    }
}

fn device_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Device ([0-9A-F:]+)").expect("device pattern"))
}

/// Extract device addresses in first-seen order, deduplicated.
pub(crate) fn parse_devices(output: &str) -> Vec<DeviceId> {
    let mut devices: Vec<DeviceId> = Vec::new();
    for captures in device_pattern().captures_iter(output) {
        let device = DeviceId(captures[1].to_string());
        if !devices.contains(&device) {
            devices.push(device);
        }
    }
    devices
}

fn write_audio_route(path: &Path, device: &DeviceId) -> Result<()> {
    let contents = format!(
        "defaults.bluealsa.interface \"hci0\"\n\
         defaults.bluealsa.device \"{device}\"\n\
         defaults.bluealsa.profile \"a2dp\"\n"
    );
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices_from_control_output() {
        let output = "\
[bluetooth]# paired-devices
Device 78:44:05:96:3D:EE JBL Flip
Device AA:BB:CC:DD:EE:FF Kitchen Speaker
Device 78:44:05:96:3D:EE JBL Flip
";
        let devices = parse_devices(output);
        assert_eq!(
            devices,
            vec![
                DeviceId("78:44:05:96:3D:EE".to_string()),
                DeviceId("AA:BB:CC:DD:EE:FF".to_string()),
            ]
        );
    }

    #[test]
    fn parse_ignores_prompt_noise() {
        assert!(parse_devices("[bluetooth]# info\nNo default controller available\n").is_empty());
    }

    #[test]
    fn audio_route_file_names_the_device() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("asoundrc");
        let device = DeviceId("78:44:05:96:3D:EE".to_string());
        write_audio_route(&path, &device).expect("write route");
        let contents = std::fs::read_to_string(&path).expect("read route");
        assert!(contents.contains("defaults.bluealsa.device \"78:44:05:96:3D:EE\""));
        assert!(contents.contains("a2dp"));
    }

    #[test]
    fn null_adapter_reports_no_sink() {
        let bluetooth = NullBluetooth;
        assert_eq!(bluetooth.info(), None);
        assert_eq!(bluetooth.reconnect(), None);
        bluetooth.autopair();
    }
}
