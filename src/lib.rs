pub mod app;
pub mod bluetooth;
pub mod config;
pub mod display;
pub mod event;
pub mod gesture;
pub mod input;
pub mod library;
mod lock;
mod logging;
pub mod menu;
pub mod player;
pub mod power;
mod telemetry;
pub mod timer;

pub(crate) use lock::lock_or_recover;
pub use logging::{init_logging, log_debug, log_debug_content, log_file_path, log_panic};
pub use telemetry::init_telemetry;
