//! Chromium-backed browser sessions using chromiumoxide.
//!
//! Every session launches its own browser process so that no cookies or
//! form state leak between booking attempts. Element operations are done
//! with small scripts evaluated in the page, each waiting up to the action
//! timeout for its element to appear.

use crate::core::countdown::deadline_after;
use crate::domain::ports::{BrowserLauncher, BrowserSession};
use crate::utils::error::{BookingError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub action_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            chromium_path: None,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
        }
    }
}

/// Locate a Chromium binary: explicit path, `PITCH_BOOKER_CHROMIUM`, then PATH.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        tracing::warn!("Configured chromium_path {} does not exist", path.display());
    }

    if let Ok(p) = std::env::var("PITCH_BOOKER_CHROMIUM") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let mut builder = BrowserConfig::builder();
        if !self.options.headless {
            builder = builder.with_head();
        }
        // 找不到時交給 chromiumoxide 自己的預設搜尋
        if let Some(path) = find_chromium(self.options.chromium_path.as_ref()) {
            tracing::debug!("Using Chromium at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .arg("--no-first-run")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .build()
            .map_err(|e| BookingError::browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BookingError::browser(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BookingError::browser(format!("failed to open page: {e}")));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser: Some(browser),
            page,
            handler: handler_task,
            action_timeout: self.options.action_timeout,
        }))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    action_timeout: Duration,
}

impl ChromiumSession {
    async fn eval_bool(&self, script: &str) -> Result<bool> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BookingError::browser(format!("script failed: {e}")))?;
        result
            .into_value::<bool>()
            .map_err(|e| BookingError::browser(format!("unexpected script result: {e:?}")))
    }

    /// Re-run `script` until it yields true or `timeout` passes. Errors while
    /// a navigation is in flight count as "not yet", so `script` must only read
    /// the page.
    async fn poll_until(&self, script: &str, timeout: Duration) -> bool {
        let deadline = deadline_after(Instant::now(), timeout);
        loop {
            if let Ok(true) = self.eval_bool(script).await {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_STEP).await;
        }
    }

    async fn wait_for(&self, selector: &str) -> Result<()> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        if self.poll_until(&script, self.action_timeout).await {
            Ok(())
        } else {
            Err(BookingError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    /// Run an element script once the element exists; `false` from the
    /// script means the element was not usable.
    async fn act(&self, selector: &str, script: String) -> Result<()> {
        self.wait_for(selector).await?;
        if self.eval_bool(&script).await? {
            Ok(())
        } else {
            Err(BookingError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    /// After a click: wait for the old document to go away and the new one
    /// to finish loading. Clicks that do not navigate just time out.
    async fn settle_after_click(&self) {
        let left = self
            .poll_until("window.__pitchBookerMarker !== true", self.action_timeout)
            .await;
        if !left {
            tracing::debug!("No navigation after click");
            return;
        }
        if !self
            .poll_until("document.readyState === 'complete'", self.action_timeout)
            .await
        {
            tracing::debug!("Page did not finish loading in time");
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let started = Instant::now();
        match tokio::time::timeout(self.action_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;
                tracing::debug!("Loaded {} in {:?}", url, started.elapsed());
                Ok(())
            }
            Ok(Err(e)) => Err(BookingError::browser(format!("navigation failed: {e}"))),
            Err(_) => Err(BookingError::browser(format!(
                "navigation timed out after {:?}",
                self.action_timeout
            ))),
        }
    }

    async fn check(&mut self, selector: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                if (!el.checked) el.click();
                return el.checked === true;
            }})()"#,
            sel = js_string(selector)
        );
        self.act(selector, script).await
    }

    async fn check_role(&mut self, role: &str) -> Result<()> {
        let selector = role_selector(role)?;
        self.check(&selector).await
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.focus();
                el.value = {val};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            val = js_string(text)
        );
        self.act(selector, script).await
    }

    async fn select(&mut self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el || ![...el.options].some(o => o.value === {val})) return false;
                el.value = {val};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            val = js_string(value)
        );
        self.wait_for(selector).await?;
        if self.eval_bool(&script).await? {
            Ok(())
        } else {
            Err(BookingError::ElementNotFound {
                selector: format!("{selector} option '{value}'"),
            })
        }
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                return style.display !== 'none'
                    && style.visibility !== 'hidden'
                    && el.getClientRects().length > 0;
            }})()"#,
            sel = js_string(selector)
        );
        self.eval_bool(&script).await
    }

    async fn click(&mut self, role: &str, name: &str) -> Result<()> {
        let find = find_by_name_script(role, name)?;
        let not_found = || BookingError::ElementNotFound {
            selector: format!("{role} \"{name}\""),
        };

        if !self
            .poll_until(&format!("{find} !== undefined"), self.action_timeout)
            .await
        {
            return Err(not_found());
        }

        // 只點一次；點擊會送出表單，不能重試
        let script = format!(
            r#"(() => {{
                const el = {find};
                if (!el) return false;
                window.__pitchBookerMarker = true;
                el.click();
                return true;
            }})()"#
        );
        match self.eval_bool(&script).await {
            Ok(true) => {}
            Ok(false) => return Err(not_found()),
            Err(e) => tracing::debug!("Click result lost, assuming navigation: {}", e),
        }

        self.settle_after_click().await;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let mut me = self;
        if let Err(e) = me.page.clone().close().await {
            tracing::debug!("Page close command failed: {e}");
        }

        if let Some(mut browser) = me.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close command failed: {e}");
            }
            browser
                .wait()
                .await
                .map_err(|e| BookingError::browser(format!("browser did not exit: {e}")))?;
        }
        me.handler.abort();
        tracing::debug!("Browser session closed");
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Browser 本身在 drop 時會終止子行程
        self.handler.abort();
    }
}

/// CSS selector for elements with an ARIA role.
fn role_selector(role: &str) -> Result<String> {
    let selector = match role {
        "radio" => r#"input[type="radio"], [role="radio"]"#,
        "checkbox" => r#"input[type="checkbox"], [role="checkbox"]"#,
        "button" => {
            r#"button, input[type="submit"], input[type="button"], [role="button"]"#
        }
        "link" => "a[href], [role=\"link\"]",
        other => {
            return Err(BookingError::browser(format!("unsupported role: {other}")));
        }
    };
    Ok(selector.to_string())
}

/// Expression yielding the first element with `role` whose label contains
/// `name` (case-insensitive), or `undefined`. Reads the page only.
fn find_by_name_script(role: &str, name: &str) -> Result<String> {
    let candidates = role_selector(role)?;
    Ok(format!(
        r#"[...document.querySelectorAll({sel})].find(e => {{
                const label = (e.innerText || e.value || e.getAttribute('aria-label') || '');
                return label.trim().toLowerCase().includes({name}.toLowerCase());
            }})"#,
        sel = js_string(&candidates),
        name = js_string(name)
    ))
}

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(js_string(r#"input[name="iban"]"#), r#""input[name=\"iban\"]""#);
        assert_eq!(js_string("a'b\n"), r#""a'b\n""#);
    }

    #[test]
    fn test_role_selector() {
        assert!(role_selector("radio").unwrap().contains(r#"input[type="radio"]"#));
        assert!(role_selector("button").unwrap().starts_with("button"));
        assert!(role_selector("slider").is_err());
    }

    #[test]
    fn test_find_by_name_script_has_no_side_effects() {
        let find = find_by_name_script("button", "kostenpflichtig buchen").unwrap();
        assert!(find.contains(r#""kostenpflichtig buchen".toLowerCase()"#));
        assert!(!find.contains(".click()"));
        assert!(!find.contains("__pitchBookerMarker"));
        assert!(find_by_name_script("slider", "x").is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_ignored() {
        let missing = PathBuf::from("/definitely/not/here/chrome");
        if let Some(found) = find_chromium(Some(&missing)) {
            assert_ne!(found, missing);
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_fill_and_read_back_on_data_url() {
        let launcher = ChromiumLauncher::new(BrowserOptions {
            headless: true,
            ..BrowserOptions::default()
        });
        let mut session = launcher.launch().await.expect("launch");
        session
            .navigate(r#"data:text/html,<input name="Vorname"><input name="hidden" style="display:none">"#)
            .await
            .expect("navigate");

        session
            .fill(r#"input[name="Vorname"]"#, "Erika")
            .await
            .expect("fill");
        assert!(session.is_visible(r#"input[name="Vorname"]"#).await.unwrap());
        assert!(!session.is_visible(r#"input[name="hidden"]"#).await.unwrap());

        session.close().await.expect("close");
    }
}
