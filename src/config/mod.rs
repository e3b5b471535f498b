use clap::Parser;
use std::path::PathBuf;

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

pub use defaults::{DEFAULT_AUDIO_SINK, DEFAULT_HOLD_MS, MAX_HOLD_MS, MIN_HOLD_MS};

use defaults::default_decoder_cmd;

/// Runtime configuration, collected from CLI flags and environment.
#[derive(Debug, Parser, Clone)]
#[command(about = "jukeboxd appliance controller", author, version)]
pub struct AppConfig {
    /// Root directory scanned for albums (one directory per album)
    #[arg(long = "music-dir", env = "JUKEBOXD_MUSIC_DIR", default_value = "music")]
    pub music_dir: PathBuf,

    /// Decoder command line; the sink flag and track path are appended
    #[arg(long = "decoder-cmd", default_value_t = default_decoder_cmd())]
    pub decoder_cmd: String,

    /// ALSA device name passed to the decoder with `-a`
    #[arg(long = "audio-sink", default_value = DEFAULT_AUDIO_SINK)]
    pub audio_sink: String,

    /// Milliseconds a button must stay down to count as a hold
    #[arg(long = "hold-ms", default_value_t = DEFAULT_HOLD_MS)]
    pub hold_ms: u64,

    /// Control binary driven for pairing and reconnects
    #[arg(long = "bluetoothctl-cmd", default_value = "bluetoothctl")]
    pub bluetoothctl_cmd: String,

    /// Run without a wireless sink (reconnects become no-ops)
    #[arg(long = "no-bluetooth")]
    pub no_bluetooth: bool,

    /// Log power actions instead of invoking shutdown(8)
    #[arg(long = "no-power")]
    pub no_power: bool,

    /// Print the scanned album list and exit
    #[arg(long = "list-albums")]
    pub list_albums: bool,

    /// Enable debug logging to a temp file
    #[arg(long = "logs", env = "JUKEBOXD_LOGS")]
    pub logs: bool,

    /// Disable all file logging, overriding --logs
    #[arg(long = "no-logs", env = "JUKEBOXD_NO_LOGS")]
    pub no_logs: bool,

    /// Include track paths and device addresses in debug logs
    #[arg(long = "log-content", env = "JUKEBOXD_LOG_CONTENT")]
    pub log_content: bool,
}
