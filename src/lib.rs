pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::BookingConfig;

pub use adapters::{ChromiumLauncher, HttpPageSource};
pub use core::booking::{BookingFlow, BookingSettings};
pub use core::countdown::{CancelToken, LogCountdown};
pub use core::monitor::{MonitorLoop, MonitorSettings, PollOutcome};
pub use utils::error::{BookingError, Result};
