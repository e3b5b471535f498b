use anyhow::{bail, Context, Result};
use clap::Parser;

use super::defaults::{MAX_HOLD_MS, MIN_HOLD_MS};
use super::AppConfig;

impl AppConfig {
    /// Parse CLI arguments and validate them in one step.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate settings and normalize paths. Checks that do not touch the
    /// filesystem come first so flag errors surface even without a music
    /// directory in place.
    pub fn validate(&mut self) -> Result<()> {
        if !(MIN_HOLD_MS..=MAX_HOLD_MS).contains(&self.hold_ms) {
            bail!(
                "--hold-ms must be between {MIN_HOLD_MS} and {MAX_HOLD_MS}, got {}",
                self.hold_ms
            );
        }

        self.decoder_argv()?;

        if self.audio_sink.is_empty() || self.audio_sink.contains(char::is_whitespace) {
            bail!("--audio-sink must be a single non-empty device name");
        }

        if !self.no_bluetooth && self.bluetoothctl_cmd.trim().is_empty() {
            bail!("--bluetoothctl-cmd must not be empty (or pass --no-bluetooth)");
        }

        if !self.music_dir.is_dir() {
            bail!(
                "music directory {} does not exist or is not a directory",
                self.music_dir.display()
            );
        }
        self.music_dir = self
            .music_dir
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", self.music_dir.display()))?;

        Ok(())
    }

    /// Split the decoder command into argv words.
    pub fn decoder_argv(&self) -> Result<Vec<String>> {
        let argv = shell_words::split(&self.decoder_cmd)
            .with_context(|| format!("invalid --decoder-cmd {:?}", self.decoder_cmd))?;
        if argv.is_empty() {
            bail!("--decoder-cmd must name a program");
        }
        Ok(argv)
    }
}
