use crate::domain::model::{time_slot_label, AvailabilityMap, BookingTarget, DesiredSlot};
use crate::utils::error::{BookingError, Result, UnavailableCause};

/// Pick the booking link for `day` at `hour`: the first field the overview
/// listed for that time slot. No ranking between fields.
pub fn resolve(map: &AvailabilityMap, day: &str, hour: u8) -> Result<BookingTarget> {
    let label = time_slot_label(hour);
    let unavailable = |cause| BookingError::SlotUnavailable {
        day: day.to_string(),
        time_slot: label.clone(),
        cause,
    };

    let schedule = map
        .day(day)
        .ok_or_else(|| unavailable(UnavailableCause::DayMissing))?;
    let slot = schedule
        .slot(&label)
        .ok_or_else(|| unavailable(UnavailableCause::TimeMissing))?;
    let first = slot
        .first_field()
        .ok_or_else(|| unavailable(UnavailableCause::NoFields))?;

    Ok(BookingTarget {
        day: schedule.day.clone(),
        time_slot: slot.label.clone(),
        field: first.field.clone(),
        link: first.link.clone(),
    })
}

pub fn resolve_desired(map: &AvailabilityMap, desired: &DesiredSlot) -> Result<BookingTarget> {
    resolve(map, desired.day.as_str(), desired.hour)
}
