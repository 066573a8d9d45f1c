use crate::domain::model::BookingStage;
use std::fmt;
use thiserror::Error;

/// Why a desired slot could not be resolved. Diagnostic only: the monitor
/// loop retries all causes the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableCause {
    DayMissing,
    TimeMissing,
    NoFields,
}

impl fmt::Display for UnavailableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnavailableCause::DayMissing => "day not listed",
            UnavailableCause::TimeMissing => "time not listed",
            UnavailableCause::NoFields => "no free field",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Availability page unreachable: {url} ({reason})")]
    UnreachablePage {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Schedule could not be parsed: {reason}")]
    UnparseableSchedule { reason: String },

    #[error("No slot available on {day} at {time_slot} ({cause})")]
    SlotUnavailable {
        day: String,
        time_slot: String,
        cause: UnavailableCause,
    },

    #[error("Booking page did not match in stage {stage}: {detail}")]
    FormMismatch { stage: BookingStage, detail: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Browser automation failed: {message}")]
    Browser { message: String },

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation failed:\n{}", .errors.join("\n"))]
    ValidationError { errors: Vec<String> },

    #[error("Run cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Schedule,
    Booking,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BookingError {
    pub fn browser(message: impl Into<String>) -> Self {
        BookingError::Browser {
            message: message.into(),
        }
    }

    pub fn form_mismatch(stage: BookingStage, detail: impl Into<String>) -> Self {
        BookingError::FormMismatch {
            stage,
            detail: detail.into(),
        }
    }

    /// 將瀏覽器層的「找不到元素」轉為所在階段的 FormMismatch
    pub fn in_stage(self, stage: BookingStage) -> Self {
        match self {
            BookingError::ElementNotFound { selector } => {
                BookingError::form_mismatch(stage, format!("missing element {selector}"))
            }
            other => other,
        }
    }

    /// 「尚未開放」類錯誤：監控迴圈等待下一輪即可
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BookingError::UnreachablePage { .. }
                | BookingError::UnparseableSchedule { .. }
                | BookingError::SlotUnavailable { .. }
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BookingError::UnreachablePage { .. } | BookingError::HttpError(_) => {
                ErrorCategory::Network
            }
            BookingError::UnparseableSchedule { .. } | BookingError::SlotUnavailable { .. } => {
                ErrorCategory::Schedule
            }
            BookingError::FormMismatch { .. }
            | BookingError::ElementNotFound { .. }
            | BookingError::Browser { .. } => ErrorCategory::Booking,
            BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::ValidationError { .. }
            | BookingError::SerializationError(_) => ErrorCategory::Configuration,
            BookingError::IoError(_) | BookingError::Cancelled => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BookingError::UnreachablePage { .. }
            | BookingError::UnparseableSchedule { .. }
            | BookingError::SlotUnavailable { .. }
            | BookingError::Cancelled => ErrorSeverity::Low,
            BookingError::HttpError(_) => ErrorSeverity::Medium,
            BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::ValidationError { .. }
            | BookingError::SerializationError(_) => ErrorSeverity::High,
            BookingError::FormMismatch { .. }
            | BookingError::ElementNotFound { .. }
            | BookingError::Browser { .. }
            | BookingError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BookingError::UnreachablePage { .. } | BookingError::HttpError(_) => {
                "Check the slots_overview_url and your network connection"
            }
            BookingError::UnparseableSchedule { .. } | BookingError::SlotUnavailable { .. } => {
                "Keep polling; the slot has not been released yet"
            }
            BookingError::FormMismatch { .. } | BookingError::ElementNotFound { .. } => {
                "The booking site changed or lost sync; check the booking manually and rerun"
            }
            BookingError::Browser { .. } => {
                "Make sure Chromium is installed or set browser.chromium_path"
            }
            BookingError::ConfigError { .. }
            | BookingError::InvalidConfigValueError { .. }
            | BookingError::ValidationError { .. }
            | BookingError::SerializationError(_) => "Fix the booking profile and rerun",
            BookingError::IoError(_) => "Check file paths and permissions",
            BookingError::Cancelled => "Rerun to resume monitoring",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BookingError::FormMismatch { stage, .. } => format!(
                "Booking aborted during {}: the page did not look as expected",
                stage
            ),
            BookingError::Browser { .. } => "The browser session failed".to_string(),
            BookingError::Cancelled => "Stopped before a booking was made".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
