use crate::core::CountdownObserver;
use crate::domain::model::WaitPhase;
use crate::utils::error::{BookingError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Granularity of the progress callback.
pub const TICK: Duration = Duration::from_secs(1);

/// Fallback horizon when a deadline would overflow the clock (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + wait`, saturating at a far-future instant instead of panicking.
pub fn deadline_after(start: Instant, wait: Duration) -> Instant {
    start
        .checked_add(wait)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// Shared stop signal, checked at every wait.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            // 先註冊再檢查旗標，避免漏掉 notify_waiters
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BookingError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Wait `total`, reporting the remaining time every tick.
pub async fn countdown(
    total: Duration,
    phase: WaitPhase,
    observer: &dyn CountdownObserver,
    cancel: &CancelToken,
) -> Result<()> {
    wait_until(deadline_after(Instant::now(), total), phase, observer, cancel).await
}

/// Wait until `deadline`. Returns `Cancelled` as soon as the token trips;
/// a deadline in the past returns immediately.
pub async fn wait_until(
    deadline: Instant,
    phase: WaitPhase,
    observer: &dyn CountdownObserver,
    cancel: &CancelToken,
) -> Result<()> {
    loop {
        cancel.check()?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(());
        }
        observer.on_tick(phase, remaining);

        tokio::select! {
            _ = tokio::time::sleep(remaining.min(TICK)) => {}
            _ = cancel.cancelled() => return Err(BookingError::Cancelled),
        }
    }
}

/// Reports countdowns through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCountdown;

impl CountdownObserver for LogCountdown {
    fn on_tick(&self, phase: WaitPhase, remaining: Duration) {
        let secs = remaining.as_secs_f64().ceil() as u64;
        match phase {
            WaitPhase::Review => {
                tracing::info!("⏳ Booking will be performed in {:03} seconds", secs)
            }
            WaitPhase::NextPoll => tracing::debug!("🔁 Trying again in {} seconds", secs),
            WaitPhase::Grace => tracing::debug!("👀 Closing browser in {} seconds", secs),
        }
    }
}
