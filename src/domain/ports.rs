use crate::domain::model::WaitPhase;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Raw response of the availability page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// GET the url. Transport failures map to `UnreachablePage`; any HTTP
    /// status is returned as is.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Starts isolated browser sessions. One session per booking attempt.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// A single browser page. Element operations fail with `ElementNotFound`
/// when the selector matches nothing within the adapter's timeout; other
/// automation failures surface as `Browser`.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Check the radio/checkbox matched by a CSS selector.
    async fn check(&mut self, selector: &str) -> Result<()>;
    /// Check the first element with the given ARIA role ("radio", "checkbox").
    async fn check_role(&mut self, role: &str) -> Result<()>;
    async fn fill(&mut self, selector: &str, text: &str) -> Result<()>;
    async fn select(&mut self, selector: &str, value: &str) -> Result<()>;
    async fn is_visible(&mut self, selector: &str) -> Result<bool>;
    /// Click the element with the given role and accessible name. The click
    /// fires at most once, even when its result is lost to a navigation.
    async fn click(&mut self, role: &str, name: &str) -> Result<()>;
    /// Tear down the page and the browser behind it. Fails with `Browser`
    /// when the browser process does not exit.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Receives the remaining time of every wait, once per tick.
pub trait CountdownObserver: Send + Sync {
    fn on_tick(&self, phase: WaitPhase, remaining: Duration);
}
