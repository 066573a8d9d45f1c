use crate::adapters::chromium::{BrowserOptions, DEFAULT_ACTION_TIMEOUT};
use crate::adapters::http::DEFAULT_TIMEOUT;
use crate::core::booking::{BookingSettings, DEFAULT_GRACE_PERIOD};
use crate::core::monitor::MonitorSettings;
use crate::domain::model::{BankAccount, BookingProfile, DesiredSlot, Person, ReviewWindow};
use crate::utils::error::{BookingError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_person, validate_range, validate_url, validate_weekday,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Booking profile: who books what, where and when.
///
/// Layout follows the site's data needs; the same keys work as TOML or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    pub slots_overview_url: String,
    pub desired_day: String,
    pub desired_start_time: i64,
    #[serde(default = "default_duration_h")]
    pub desired_duration_h: i64,
    #[serde(default)]
    pub double_booking: bool,
    pub request_refresh_interval_s: i64,
    pub review_time_s: i64,
    pub person1: Person,
    pub person2: Person,
    pub banking: BankAccount,
    #[serde(default)]
    pub browser: BrowserSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSection {
    #[serde(default)]
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub action_timeout_ms: Option<u64>,
    pub confirmation_grace_s: Option<u64>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: false,
            chromium_path: None,
            action_timeout_ms: None,
            confirmation_grace_s: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpSection {
    pub timeout_s: Option<u64>,
}

/// Upper bound for every configured wait or timeout, in seconds.
pub const MAX_WAIT_S: i64 = 86_400;

fn default_duration_h() -> i64 {
    1
}

impl BookingConfig {
    /// 依副檔名載入 TOML 或 JSON 設定檔
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BookingError::IoError)?;
        let is_json = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BookingError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(serde_json::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${IBAN})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BookingError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Every problem found in the profile. Empty means valid.
    pub fn collect_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut push = |result: Result<()>| {
            if let Err(e) = result {
                problems.push(e.to_string());
            }
        };

        push(validate_url("slots_overview_url", &self.slots_overview_url));
        push(validate_weekday("desired_day", &self.desired_day).map(|_| ()));
        push(validate_range("desired_start_time", self.desired_start_time, 8, 22));
        push(validate_range("desired_duration_h", self.desired_duration_h, 1, 14));
        push(self.poll_interval().map(|_| ()));
        push(self.review_window().map(|_| ()));
        push(self.grace_period().map(|_| ()));
        push(self.action_timeout().map(|_| ()));
        push(self.checked_http_timeout().map(|_| ()));
        push(validate_non_empty_string("banking.iban", &self.banking.iban));
        push(validate_non_empty_string("banking.bic", &self.banking.bic));

        problems.extend(validate_person("person1", &self.person1));
        problems.extend(validate_person("person2", &self.person2));
        problems
    }

    pub fn desired_slot(&self) -> Result<DesiredSlot> {
        let day = validate_weekday("desired_day", &self.desired_day)?;
        let hour = u8::try_from(self.desired_start_time)
            .ok()
            .filter(|h| *h < 24)
            .ok_or_else(|| BookingError::InvalidConfigValueError {
                field: "desired_start_time".to_string(),
                value: self.desired_start_time.to_string(),
                reason: "Must be an hour of the day".to_string(),
            })?;
        Ok(DesiredSlot::new(day, hour))
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        positive_secs("request_refresh_interval_s", self.request_refresh_interval_s, 1)
    }

    pub fn grace_period(&self) -> Result<Duration> {
        match self.browser.confirmation_grace_s {
            Some(secs) => bounded_secs("browser.confirmation_grace_s", secs, 0),
            None => Ok(DEFAULT_GRACE_PERIOD),
        }
    }

    pub fn action_timeout(&self) -> Result<Duration> {
        match self.browser.action_timeout_ms {
            Some(ms) => {
                bounded_secs("browser.action_timeout_ms", ms.div_ceil(1000), 0)?;
                Ok(Duration::from_millis(ms))
            }
            None => Ok(DEFAULT_ACTION_TIMEOUT),
        }
    }

    fn checked_http_timeout(&self) -> Result<Duration> {
        match self.http.timeout_s {
            Some(secs) => bounded_secs("http.timeout_s", secs, 1),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn review_window(&self) -> Result<ReviewWindow> {
        let secs = positive_secs("review_time_s", self.review_time_s, 0)?;
        Ok(ReviewWindow::from_secs(secs.as_secs()))
    }

    pub fn monitor_settings(&self) -> Result<MonitorSettings> {
        Ok(MonitorSettings {
            source_url: self.slots_overview_url.clone(),
            desired: self.desired_slot()?,
            poll_interval: self.poll_interval()?,
        })
    }

    pub fn booking_settings(&self) -> Result<BookingSettings> {
        Ok(BookingSettings::new(self.review_window()?).with_grace_period(self.grace_period()?))
    }

    pub fn booking_profile(&self) -> BookingProfile {
        BookingProfile {
            person1: self.person1.clone(),
            person2: self.person2.clone(),
            banking: self.banking.clone(),
        }
    }

    pub fn browser_options(&self) -> Result<BrowserOptions> {
        Ok(BrowserOptions {
            headless: self.browser.headless,
            chromium_path: self.browser.chromium_path.clone(),
            action_timeout: self.action_timeout()?,
        })
    }

    /// Falls back to the default when the configured value is out of range.
    pub fn http_timeout(&self) -> Duration {
        self.checked_http_timeout().unwrap_or(DEFAULT_TIMEOUT)
    }
}

fn positive_secs(field: &str, value: i64, min: i64) -> Result<Duration> {
    if value < min || value > MAX_WAIT_S {
        return Err(BookingError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("Must be between {} and {} seconds", min, MAX_WAIT_S),
        });
    }
    Ok(Duration::from_secs(value as u64))
}

fn bounded_secs(field: &str, value: u64, min: i64) -> Result<Duration> {
    let value = i64::try_from(value).unwrap_or(i64::MAX);
    positive_secs(field, value, min)
}

impl Validate for BookingConfig {
    fn validate(&self) -> Result<()> {
        let errors = self.collect_problems();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BookingError::ValidationError { errors })
        }
    }
}
