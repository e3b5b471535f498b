//! OS power control behind a trait so menu actions and the sleep deadline
//! stay testable.

use anyhow::{Context, Result};
use crate::log_debug;
use std::process::Command;

pub trait SystemPower: Send + Sync {
    fn power_off(&self) -> Result<()>;
    fn reboot(&self) -> Result<()>;
}

/// Spawns the system shutdown command. Best-effort: the caller exits the
/// control loop whether or not the spawn worked.
pub struct ShutdownCommand;

impl SystemPower for ShutdownCommand {
    fn power_off(&self) -> Result<()> {
        Command::new("shutdown")
            .arg("now")
            .spawn()
            .context("spawning shutdown")?;
        Ok(())
    }

    fn reboot(&self) -> Result<()> {
        Command::new("shutdown")
            .args(["-r", "now"])
            .spawn()
            .context("spawning shutdown -r")?;
        Ok(())
    }
}

/// Logs power actions instead of invoking them (`--no-power`, tests).
pub struct NullPower;

impl SystemPower for NullPower {
    fn power_off(&self) -> Result<()> {
        log_debug("power: power-off (dry run)");
        Ok(())
    }

    fn reboot(&self) -> Result<()> {
        log_debug("power: reboot (dry run)");
        Ok(())
    }
}
