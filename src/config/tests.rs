use super::*;
use clap::Parser;

fn config(args: &[&str]) -> AppConfig {
    let mut argv = vec!["jukeboxd"];
    argv.extend_from_slice(args);
    AppConfig::parse_from(argv)
}

#[test]
fn defaults_parse() {
    let config = config(&[]);
    assert_eq!(config.decoder_cmd, "mpg123 --quiet");
    assert_eq!(config.audio_sink, "bluealsa");
    assert_eq!(config.hold_ms, DEFAULT_HOLD_MS);
    assert!(!config.no_bluetooth);
}

#[test]
fn hold_ms_bounds_are_enforced() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_arg = dir.path().to_str().expect("utf8 path");

    let mut too_short = config(&["--music-dir", dir_arg, "--hold-ms", "50"]);
    assert!(too_short.validate().is_err());

    let mut too_long = config(&["--music-dir", dir_arg, "--hold-ms", "60000"]);
    assert!(too_long.validate().is_err());

    let mut in_range = config(&["--music-dir", dir_arg, "--hold-ms", "250"]);
    assert!(in_range.validate().is_ok());
}

#[test]
fn hold_ms_is_checked_before_the_music_dir() {
    let mut config = config(&["--music-dir", "/no/such/dir", "--hold-ms", "1"]);
    let err = config.validate().expect_err("must reject");
    assert!(err.to_string().contains("--hold-ms"), "got: {err}");
}

#[test]
fn decoder_cmd_must_be_parseable_and_nonempty() {
    let empty = config(&["--decoder-cmd", ""]);
    assert!(empty.decoder_argv().is_err());

    let unbalanced = config(&["--decoder-cmd", "mpg123 --quiet 'oops"]);
    assert!(unbalanced.decoder_argv().is_err());

    let argv = config(&[]).decoder_argv().expect("default argv");
    assert_eq!(argv, vec!["mpg123".to_string(), "--quiet".to_string()]);
}

#[test]
fn audio_sink_rejects_whitespace() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_arg = dir.path().to_str().expect("utf8 path");
    let mut config = config(&["--music-dir", dir_arg, "--audio-sink", "blue alsa"]);
    assert!(config.validate().is_err());
}

#[test]
fn missing_music_dir_is_rejected() {
    let mut config = config(&["--music-dir", "/no/such/dir"]);
    let err = config.validate().expect_err("must reject");
    assert!(err.to_string().contains("music directory"), "got: {err}");
}

#[test]
fn empty_bluetoothctl_cmd_needs_no_bluetooth() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_arg = dir.path().to_str().expect("utf8 path");

    let mut rejected = config(&["--music-dir", dir_arg, "--bluetoothctl-cmd", ""]);
    assert!(rejected.validate().is_err());

    let mut allowed = config(&[
        "--music-dir",
        dir_arg,
        "--bluetoothctl-cmd",
        "",
        "--no-bluetooth",
    ]);
    assert!(allowed.validate().is_ok());
}
