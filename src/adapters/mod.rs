// Adapters layer: concrete implementations of the domain ports.

pub mod chromium;
pub mod http;

pub use chromium::{BrowserOptions, ChromiumLauncher, ChromiumSession};
pub use http::HttpPageSource;
