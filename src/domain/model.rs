use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Day names as rendered by the booking site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Montag,
    Dienstag,
    Mittwoch,
    Donnerstag,
    Freitag,
    Samstag,
    Sonntag,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Montag,
        Weekday::Dienstag,
        Weekday::Mittwoch,
        Weekday::Donnerstag,
        Weekday::Freitag,
        Weekday::Samstag,
        Weekday::Sonntag,
    ];

    /// The overview page lists this day before the first day header.
    pub const FIRST: Weekday = Weekday::Montag;

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Montag => "Montag",
            Weekday::Dienstag => "Dienstag",
            Weekday::Mittwoch => "Mittwoch",
            Weekday::Donnerstag => "Donnerstag",
            Weekday::Freitag => "Freitag",
            Weekday::Samstag => "Samstag",
            Weekday::Sonntag => "Sonntag",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        Weekday::ALL
            .iter()
            .copied()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown day: {trimmed}"))
    }
}

/// Format the one-hour label the overview page uses for a start hour.
/// E.g. 8 -> "08:00-09:00".
pub fn time_slot_label(hour: u8) -> String {
    format!("{:02}:00-{:02}:00", hour, u16::from(hour) + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredSlot {
    pub day: Weekday,
    pub hour: u8,
}

impl DesiredSlot {
    pub fn new(day: Weekday, hour: u8) -> Self {
        Self { day, hour }
    }

    pub fn time_slot_label(&self) -> String {
        time_slot_label(self.hour)
    }
}

impl fmt::Display for DesiredSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.time_slot_label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldLink {
    pub field: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub label: String,
    pub fields: Vec<FieldLink>,
}

impl TimeSlot {
    pub fn first_field(&self) -> Option<&FieldLink> {
        self.fields.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub day: String,
    pub slots: Vec<TimeSlot>,
}

impl DaySchedule {
    pub fn slot(&self, label: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| s.label == label)
    }

    /// One line per time slot, e.g. "15:00-16:00 (Feld 3 & 1)".
    pub fn summary_lines(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| {
                let fields = slot
                    .fields
                    .iter()
                    .map(|f| f.field.as_str())
                    .collect::<Vec<_>>()
                    .join(" & ");
                format!("{} (Feld {})", slot.label, fields)
            })
            .collect()
    }
}

/// day -> time slot -> field -> booking link, all in the order the overview
/// page listed them. Built fresh on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityMap {
    days: Vec<DaySchedule>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_days(days: Vec<DaySchedule>) -> Self {
        Self { days }
    }

    /// Insert a bookable cell. An already known field keeps its position and
    /// takes the newer link.
    pub fn insert(&mut self, day: &str, label: &str, field: &str, link: &str) {
        let day_idx = match self.days.iter().position(|d| d.day == day) {
            Some(idx) => idx,
            None => {
                self.days.push(DaySchedule {
                    day: day.to_string(),
                    slots: Vec::new(),
                });
                self.days.len() - 1
            }
        };
        let schedule = &mut self.days[day_idx];

        let slot_idx = match schedule.slots.iter().position(|s| s.label == label) {
            Some(idx) => idx,
            None => {
                schedule.slots.push(TimeSlot {
                    label: label.to_string(),
                    fields: Vec::new(),
                });
                schedule.slots.len() - 1
            }
        };
        let slot = &mut schedule.slots[slot_idx];

        match slot.fields.iter_mut().find(|f| f.field == field) {
            Some(existing) => existing.link = link.to_string(),
            None => slot.fields.push(FieldLink {
                field: field.to_string(),
                link: link.to_string(),
            }),
        }
    }

    pub fn day(&self, day: &str) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.day == day)
    }

    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of distinct (day, time slot) pairs.
    pub fn slot_count(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }
}

/// The link chosen for a desired slot. Consumed by the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingTarget {
    pub day: String,
    pub time_slot: String,
    pub field: String,
    pub link: String,
}

impl fmt::Display for BookingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (Feld {})", self.day, self.time_slot, self.field)
    }
}

/// Delay between filling the form and the irrevocable confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewWindow(Duration);

impl ReviewWindow {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BookingStage {
    SelectSlot,
    FillForm,
    Confirm,
    Booked,
}

impl fmt::Display for BookingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BookingStage::SelectSlot => "SelectSlot",
            BookingStage::FillForm => "FillForm",
            BookingStage::Confirm => "Confirm",
            BookingStage::Booked => "Booked",
        };
        f.write_str(name)
    }
}

/// Which wait a countdown tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    NextPoll,
    Review,
    Grace,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitPhase::NextPoll => "next poll",
            WaitPhase::Review => "review window",
            WaitPhase::Grace => "confirmation screen",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed booking.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub target: BookingTarget,
    pub booked_at: DateTime<Local>,
}

/// Accepted values of the site's `Statusorig` dropdown.
pub const PERSON_STATUSES: [(&str, &str); 3] = [
    ("S-TU", "Student"),
    ("TU-Alumni", "Registered Alumni"),
    ("extern", "External"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub status: String,
    pub student_number: String,
    pub email: String,
    pub phone: String,
    pub birthdate: String,
}

impl Person {
    /// Radio button id of the site's gender field.
    pub fn gender_code(&self) -> &'static str {
        match self.gender.to_lowercase().as_str() {
            "male" => "maennlich",
            "female" => "weiblich",
            // keine Angabe
            _ => "ska",
        }
    }

    /// Value of the combined "Ort" input.
    pub fn postal_city(&self) -> String {
        format!("{} {}", self.postal_code, self.city)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub iban: String,
    pub bic: String,
}

/// Occupant and payment data entered on the reservation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingProfile {
    pub person1: Person,
    pub person2: Person,
    pub banking: BankAccount,
}
