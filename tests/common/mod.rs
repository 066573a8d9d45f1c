#![allow(dead_code)]

use async_trait::async_trait;
use pitch_booker::core::{BrowserLauncher, BrowserSession, FetchedPage, PageSource};
use pitch_booker::domain::model::{BankAccount, BookingProfile, Person};
use pitch_booker::{BookingError, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// What the fake browser was asked to do, in order.
#[derive(Debug, Default)]
pub struct BrowserLog {
    pub ops: Vec<(Instant, String)>,
    pub launches: usize,
    pub closed: usize,
}

impl BrowserLog {
    pub fn op_names(&self) -> Vec<String> {
        self.ops.iter().map(|(_, op)| op.clone()).collect()
    }

    pub fn time_of(&self, op: &str) -> Option<Instant> {
        self.ops.iter().find(|(_, o)| o == op).map(|(at, _)| *at)
    }

    pub fn contains(&self, op: &str) -> bool {
        self.ops.iter().any(|(_, o)| o == op)
    }
}

/// In-memory browser. Every selector exists unless listed in `missing`.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pub log: Arc<Mutex<BrowserLog>>,
    pub missing: Arc<HashSet<String>>,
    pub birthdate_visible: bool,
    pub fail_launch: bool,
    pub fail_close: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            birthdate_visible: true,
            ..Default::default()
        }
    }

    pub fn with_missing(mut self, selector: &str) -> Self {
        let mut missing = (*self.missing).clone();
        missing.insert(selector.to_string());
        self.missing = Arc::new(missing);
        self
    }

    pub fn without_birthdate(mut self) -> Self {
        self.birthdate_visible = false;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_launch {
            return Err(BookingError::browser("no chromium in test"));
        }
        self.log.lock().unwrap().launches += 1;
        Ok(Box::new(FakeSession {
            log: self.log.clone(),
            missing: self.missing.clone(),
            birthdate_visible: self.birthdate_visible,
            fail_close: self.fail_close,
        }))
    }
}

pub struct FakeSession {
    log: Arc<Mutex<BrowserLog>>,
    missing: Arc<HashSet<String>>,
    birthdate_visible: bool,
    fail_close: bool,
}

impl FakeSession {
    fn record(&self, key: &str, op: String) -> Result<()> {
        if self.missing.contains(key) {
            return Err(BookingError::ElementNotFound {
                selector: key.to_string(),
            });
        }
        self.log.lock().unwrap().ops.push((Instant::now(), op));
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.record(url, format!("navigate {url}"))
    }

    async fn check(&mut self, selector: &str) -> Result<()> {
        self.record(selector, format!("check {selector}"))
    }

    async fn check_role(&mut self, role: &str) -> Result<()> {
        self.record(role, format!("check_role {role}"))
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<()> {
        self.record(selector, format!("fill {selector}={text}"))
    }

    async fn select(&mut self, selector: &str, value: &str) -> Result<()> {
        self.record(selector, format!("select {selector}={value}"))
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        Ok(!selector.contains("Geburtsdatum") || self.birthdate_visible)
    }

    async fn click(&mut self, role: &str, name: &str) -> Result<()> {
        self.record(name, format!("click {role} {name}"))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.lock().unwrap().closed += 1;
        if self.fail_close {
            return Err(BookingError::browser("browser did not exit"));
        }
        Ok(())
    }
}

/// Serves the queued pages in order, then repeats the last one.
pub struct ScriptedSource {
    pages: Mutex<VecDeque<FetchedPage>>,
    pub fetched_at: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    pub fn new(pages: Vec<FetchedPage>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            fetched_at: Mutex::new(Vec::new()),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched_at.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch(&self, _url: &str) -> Result<FetchedPage> {
        self.fetched_at.lock().unwrap().push(Instant::now());
        let mut pages = self.pages.lock().unwrap();
        let page = if pages.len() > 1 {
            pages.pop_front()
        } else {
            pages.front().cloned()
        };
        page.ok_or_else(|| BookingError::UnparseableSchedule {
            reason: "no page scripted".to_string(),
        })
    }
}

pub fn page(status: u16, body: impl Into<String>) -> FetchedPage {
    FetchedPage {
        status,
        body: body.into(),
    }
}

pub fn cell(time: &str, field: &str, href: &str) -> String {
    format!(
        r#"<div class="date bookable"><a href="{href}"><strong class="time">{time}</strong><span class="detail">{field}</span></a></div>"#
    )
}

pub fn day_header(day: &str) -> String {
    format!(r#"<div class="table-row"><div class="table-head column-1">{day}</div></div>"#)
}

pub fn slot_row(cells: &[String]) -> String {
    format!(r#"<div class="table-row">{}</div>"#, cells.join(""))
}

pub fn overview(rows: &[String]) -> String {
    format!(
        r#"<html><body><div class="table"><div class="table-body-group">{}</div></div></body></html>"#,
        rows.join("")
    )
}

pub fn person(first_name: &str) -> Person {
    Person {
        gender: "female".to_string(),
        first_name: first_name.to_string(),
        last_name: "Mustermann".to_string(),
        address: "Hauptstraße 1".to_string(),
        city: "Dresden".to_string(),
        postal_code: "01069".to_string(),
        status: "S-TU".to_string(),
        student_number: "4711".to_string(),
        email: "erika@example.org".to_string(),
        phone: "+49 351 123456".to_string(),
        birthdate: "01.02.2000".to_string(),
    }
}

pub fn profile() -> BookingProfile {
    BookingProfile {
        person1: person("Erika"),
        person2: person("Max"),
        banking: BankAccount {
            iban: "DE02120300000000202051".to_string(),
            bic: "BYLADEM1001".to_string(),
        },
    }
}
