pub(crate) fn default_decoder_cmd() -> String {
    "mpg123 --quiet".to_string()
}

pub const DEFAULT_AUDIO_SINK: &str = "bluealsa";

pub const DEFAULT_HOLD_MS: u64 = 1000;
pub const MIN_HOLD_MS: u64 = 100;
pub const MAX_HOLD_MS: u64 = 10_000;
