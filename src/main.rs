use anyhow::Result;

use jukeboxd::config::AppConfig;
use jukeboxd::library::Library;
use jukeboxd::{app, init_logging, init_telemetry, log_file_path, log_panic};

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_logging(&config);
    init_telemetry(&config);
    std::panic::set_hook(Box::new(|info| log_panic(info)));

    if config.list_albums {
        let library = Library::scan(&config.music_dir)?;
        for (index, album) in library.albums().iter().enumerate() {
            println!(
                "{:02} {} ({} tracks)",
                index + 1,
                album.dir.display(),
                album.tracks.len()
            );
        }
        return Ok(());
    }

    if config.logs && !config.no_logs {
        eprintln!("logging to {}", log_file_path().display());
    }

    app::run(&config)
}
