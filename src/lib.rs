pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod logging;
pub mod matching;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{CycleOutcome, Monitor, MonitorSettings};
pub use utils::error::{AppError, FetchError};

pub type Result<T> = std::result::Result<T, AppError>;
