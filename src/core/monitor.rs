use crate::core::booking::BookingFlow;
use crate::core::countdown::{deadline_after, wait_until, CancelToken};
use crate::core::parser::fetch_availability;
use crate::core::resolver::resolve_desired;
use crate::core::{BrowserLauncher, CountdownObserver, PageSource};
use crate::domain::model::{AvailabilityMap, BookingReceipt, BookingTarget, DesiredSlot, WaitPhase};
use crate::utils::error::{BookingError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub source_url: String,
    pub desired: DesiredSlot,
    pub poll_interval: Duration,
}

/// Result of a single poll.
#[derive(Debug)]
pub enum PollOutcome {
    Found(BookingTarget),
    /// The slot is not bookable yet; the error says why.
    NotYet(BookingError),
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Found(target) => write!(f, "{} is bookable: {}", target, target.link),
            PollOutcome::NotYet(reason) => write!(f, "not bookable yet: {}", reason),
        }
    }
}

pub struct MonitorLoop<P: PageSource, L: BrowserLauncher> {
    source: P,
    flow: BookingFlow<L>,
    settings: MonitorSettings,
    observer: Arc<dyn CountdownObserver>,
}

impl<P: PageSource, L: BrowserLauncher> MonitorLoop<P, L> {
    pub fn new(
        source: P,
        flow: BookingFlow<L>,
        settings: MonitorSettings,
        observer: Arc<dyn CountdownObserver>,
    ) -> Self {
        Self {
            source,
            flow,
            settings,
            observer,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Fetch, parse and resolve once.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        match self.fetch_and_resolve().await {
            Ok(target) => Ok(PollOutcome::Found(target)),
            Err(e) if e.is_transient() => Ok(PollOutcome::NotYet(e)),
            Err(e) => Err(e),
        }
    }

    async fn fetch_and_resolve(&self) -> Result<BookingTarget> {
        let map = fetch_availability(&self.source, &self.settings.source_url).await?;
        log_availability(&map);
        resolve_desired(&map, &self.settings.desired)
    }

    /// Poll until the desired slot shows up, then book it once.
    ///
    /// Returns the booking flow's result; a failed booking is not retried.
    pub async fn run(&self, cancel: &CancelToken) -> Result<BookingReceipt> {
        tracing::info!(
            "🔍 Watching {} for {} every {}s",
            self.settings.source_url,
            self.settings.desired,
            self.settings.poll_interval.as_secs()
        );

        let mut attempt: u64 = 0;
        loop {
            cancel.check()?;
            attempt += 1;
            let started = Instant::now();

            match self.poll_once().await? {
                PollOutcome::Found(target) => {
                    tracing::info!("🎯 Attempt {}: found {} -> {}", attempt, target, target.link);
                    return self.flow.execute(target, cancel).await;
                }
                PollOutcome::NotYet(reason) => log_not_yet(attempt, &reason),
            }

            wait_until(
                deadline_after(started, self.settings.poll_interval),
                WaitPhase::NextPoll,
                self.observer.as_ref(),
                cancel,
            )
            .await?;
        }
    }
}

fn log_availability(map: &AvailabilityMap) {
    for day in map.days() {
        tracing::debug!("Available slots on {}: {}", day.day, day.slots.len());
        for line in day.summary_lines() {
            tracing::debug!("  {}", line);
        }
    }
}

/// Status line per cause; the retry policy itself does not distinguish them.
fn log_not_yet(attempt: u64, reason: &BookingError) {
    match reason {
        BookingError::UnreachablePage { status, reason, .. } => tracing::info!(
            "📡 Attempt {}: overview page unreachable ({}, status {:?})",
            attempt,
            reason,
            status
        ),
        BookingError::UnparseableSchedule { .. } => {
            tracing::info!("📭 Attempt {}: no schedule published", attempt)
        }
        BookingError::SlotUnavailable {
            day,
            time_slot,
            cause,
        } => tracing::info!(
            "⏸️ Attempt {}: {} {} not available yet ({})",
            attempt,
            day,
            time_slot,
            cause
        ),
        other => tracing::info!("Attempt {}: {}", attempt, other),
    }
}
