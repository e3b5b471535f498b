use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TELEMETRY_INIT: OnceLock<()> = OnceLock::new();

pub(crate) fn telemetry_log_path() -> PathBuf {
    env::var("JUKEBOXD_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("jukeboxd_trace.jsonl"))
}

/// Install a JSON tracing subscriber writing to the trace file when logging
/// is enabled. Startup, playback, and shutdown milestones go through here.
pub fn init_telemetry(config: &AppConfig) {
    let enabled = config.logs && !config.no_logs;
    if !enabled {
        return;
    }

    let _ = TELEMETRY_INIT.get_or_init(|| {
        let path = telemetry_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
