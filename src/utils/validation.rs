use crate::domain::model::{Person, Weekday, PERSON_STATUSES};
use crate::utils::error::{BookingError, Result};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BookingError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_weekday(field_name: &str, value: &str) -> Result<Weekday> {
    value
        .parse::<Weekday>()
        .map_err(|_| BookingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!(
                "Must be one of {}",
                Weekday::ALL
                    .iter()
                    .map(|d| d.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex")
    })
}

fn birthdate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("valid birthdate regex"))
}

/// 檢查個人資料，回傳所有問題（而非遇到第一個就停）
pub fn validate_person(label: &str, person: &Person) -> Vec<String> {
    let mut errors = Vec::new();

    if person.first_name.is_empty() || !person.first_name.chars().all(char::is_alphabetic) {
        errors.push(format!(
            "{label}: invalid first name '{}'. First name should only contain alphabetic characters.",
            person.first_name
        ));
    }

    if person.last_name.is_empty() || !person.last_name.chars().all(char::is_alphabetic) {
        errors.push(format!(
            "{label}: invalid last name '{}'. Last name should only contain alphabetic characters.",
            person.last_name
        ));
    }

    if person.postal_code.len() != 5 || !person.postal_code.chars().all(|c| c.is_ascii_digit()) {
        errors.push(format!(
            "{label}: invalid postal code '{}'. It must be a 5-digit number.",
            person.postal_code
        ));
    }

    if !email_regex().is_match(&person.email) {
        errors.push(format!("{label}: invalid email address '{}'", person.email));
    }

    if !PERSON_STATUSES.iter().any(|(code, _)| *code == person.status) {
        let allowed = PERSON_STATUSES
            .iter()
            .map(|(code, meaning)| format!("{code} ({meaning})"))
            .collect::<Vec<_>>()
            .join(", ");
        errors.push(format!(
            "{label}: invalid status '{}'. Must be one of {allowed}.",
            person.status
        ));
    }

    let digits: String = person
        .phone
        .chars()
        .filter(|c| *c != ' ' && *c != '+')
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        errors.push(format!(
            "{label}: invalid phone number '{}'. It must contain only digits.",
            person.phone
        ));
    }

    if !birthdate_regex().is_match(&person.birthdate) {
        errors.push(format!(
            "{label}: invalid birthdate '{}'. It should be in the format dd.mm.yyyy.",
            person.birthdate
        ));
    }

    errors
}
