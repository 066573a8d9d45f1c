//! Booking flow: three pages of the reservation site, driven in a fresh
//! browser session.
//!
//! ```text
//! SelectSlot ──▶ FillForm ──▶ Confirm ──(review window)──▶ Booked
//! ```
//!
//! Any stage that does not find the control it expects fails with
//! `FormMismatch`. The session is closed on every exit path.

use crate::core::countdown::{countdown, deadline_after, wait_until, CancelToken};
use crate::core::form::FormFiller;
use crate::core::{BrowserLauncher, BrowserSession, CountdownObserver};
use crate::domain::model::{
    BookingProfile, BookingReceipt, BookingStage, BookingTarget, ReviewWindow, WaitPhase,
};
use crate::utils::error::{BookingError, Result};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const CONTINUE_BUTTON: &str = "weiter zur Buchung";
pub const SUBMIT_BUTTON: &str = "verbindlich anmelden";
pub const PAY_BUTTON: &str = "kostenpflichtig buchen";
pub const TERMS_CHECKBOX: &str = r#"input[name="BuchBed"]"#;

/// How long the confirmation page stays open after booking.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy)]
pub struct BookingSettings {
    pub review_window: ReviewWindow,
    pub grace_period: Duration,
}

impl BookingSettings {
    pub fn new(review_window: ReviewWindow) -> Self {
        Self {
            review_window,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}

pub struct BookingFlow<L: BrowserLauncher> {
    launcher: L,
    profile: BookingProfile,
    settings: BookingSettings,
    observer: Arc<dyn CountdownObserver>,
}

impl<L: BrowserLauncher> BookingFlow<L> {
    pub fn new(
        launcher: L,
        profile: BookingProfile,
        settings: BookingSettings,
        observer: Arc<dyn CountdownObserver>,
    ) -> Self {
        Self {
            launcher,
            profile,
            settings,
            observer,
        }
    }

    /// Book `target` in a new browser session.
    pub async fn execute(&self, target: BookingTarget, cancel: &CancelToken) -> Result<BookingReceipt> {
        tracing::info!("🌐 Opening browser for {}", target);
        let mut session = self.launcher.launch().await?;

        let outcome = self.drive(session.as_mut(), &target, cancel).await;

        if outcome.is_ok() {
            // 讓使用者看到確認頁面；此時已完成預約，取消只會提早關閉
            let _ = countdown(
                self.settings.grace_period,
                WaitPhase::Grace,
                self.observer.as_ref(),
                cancel,
            )
            .await;
        }

        match (outcome, session.close().await) {
            (Ok(booked_at), Ok(())) => Ok(BookingReceipt { target, booked_at }),
            (Ok(booked_at), Err(e)) => {
                tracing::warn!("⚠️ Booking done but browser did not close cleanly: {}", e);
                Ok(BookingReceipt { target, booked_at })
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!("⚠️ Failed to close browser after error: {}", close_err);
                Err(e)
            }
        }
    }

    /// Run the stages in order; returns the time the final action fired.
    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        target: &BookingTarget,
        cancel: &CancelToken,
    ) -> Result<DateTime<Local>> {
        let mut stage = BookingStage::SelectSlot;
        let mut booked_at = None;

        loop {
            tracing::debug!("Booking stage: {}", stage);
            let next = match stage {
                BookingStage::SelectSlot => {
                    cancel.check()?;
                    self.select_slot(session, target).await
                }
                BookingStage::FillForm => {
                    cancel.check()?;
                    self.fill_form(session).await
                }
                BookingStage::Confirm => match self.confirm(session, cancel).await {
                    Ok(at) => {
                        booked_at = Some(at);
                        Ok(BookingStage::Booked)
                    }
                    Err(e) => Err(e),
                },
                BookingStage::Booked => {
                    return booked_at.ok_or_else(|| {
                        BookingError::browser("reached Booked without a confirmation")
                    });
                }
            };
            stage = next.map_err(|e| e.in_stage(stage))?;
        }
    }

    /// Page 1: a single radio button confirming date and time.
    async fn select_slot(
        &self,
        session: &mut dyn BrowserSession,
        target: &BookingTarget,
    ) -> Result<BookingStage> {
        session.navigate(&target.link).await?;
        // 新時段只提前一週開放，因此頁面上只會有一個日期可選
        session.check_role("radio").await?;
        session.click("button", CONTINUE_BUTTON).await?;
        Ok(BookingStage::FillForm)
    }

    /// Page 2: occupants, bank account, terms.
    async fn fill_form(&self, session: &mut dyn BrowserSession) -> Result<BookingStage> {
        let mut filler = FormFiller::new(session);
        filler.fill_personal_details(&self.profile.person1, None).await?;
        filler.fill_personal_details(&self.profile.person2, Some(2)).await?;
        filler.fill_bank_details(&self.profile.banking).await?;

        session.check(TERMS_CHECKBOX).await?;
        session.click("button", SUBMIT_BUTTON).await?;
        Ok(BookingStage::Confirm)
    }

    /// Page 3: confirm the data, wait out the review window, then pay.
    async fn confirm(
        &self,
        session: &mut dyn BrowserSession,
        cancel: &CancelToken,
    ) -> Result<DateTime<Local>> {
        let entered = Instant::now();
        session.check_role("checkbox").await?;

        let review = self.settings.review_window.duration();
        tracing::info!(
            "📝 Form submitted, booking in {} seconds (Ctrl-C to abort)",
            review.as_secs()
        );
        wait_until(
            deadline_after(entered, review),
            WaitPhase::Review,
            self.observer.as_ref(),
            cancel,
        )
        .await?;

        session.click("button", PAY_BUTTON).await?;
        let booked_at = Local::now();
        tracing::info!("✅ Booking confirmed at {}", booked_at.format("%H:%M:%S"));
        Ok(booked_at)
    }
}
