//! Availability overview parsing.
//!
//! The overview page renders a `div.table-body-group` holding a flat list of
//! `div.table-row`s. A row is either a day header (`div.table-head.column-1`)
//! or a row of slot cells, where every free cell is a `div.date.bookable`
//! containing a link with the time (`strong.time`) and the field label
//! (`span.detail`, e.g. "Feld 3").

use crate::core::PageSource;
use crate::domain::model::{AvailabilityMap, Weekday};
use crate::utils::error::{BookingError, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

struct ScheduleSelectors {
    body_group: Selector,
    row: Selector,
    day_header: Selector,
    bookable: Selector,
    link: Selector,
    time: Selector,
    detail: Selector,
}

fn selectors() -> &'static ScheduleSelectors {
    static SELECTORS: OnceLock<ScheduleSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector");
        ScheduleSelectors {
            body_group: parse("div.table-body-group"),
            row: parse("div.table-row"),
            day_header: parse("div.table-head.column-1"),
            bookable: parse("div.date.bookable"),
            link: parse("a"),
            time: parse("strong.time"),
            detail: parse("span.detail"),
        }
    })
}

/// Field id from a cell label: its trailing character ("Feld 3" -> "3").
///
/// Only works while the site numbers its fields with a single digit. Any
/// change to the label format has to be handled here.
pub fn field_id_from_label(label: &str) -> Option<String> {
    label.trim().chars().last().map(String::from)
}

/// Fetch the overview page and parse it.
pub async fn fetch_availability(source: &dyn PageSource, url: &str) -> Result<AvailabilityMap> {
    let page = source.fetch(url).await?;

    tracing::debug!("Overview response status: {}", page.status);

    if !page.is_success() {
        return Err(BookingError::UnreachablePage {
            url: url.to_string(),
            status: Some(page.status),
            reason: format!("HTTP {}", page.status),
        });
    }

    parse_schedule(&page.body)
}

/// Build an [`AvailabilityMap`] from overview markup.
pub fn parse_schedule(markup: &str) -> Result<AvailabilityMap> {
    let sel = selectors();
    let document = Html::parse_document(markup);

    // 沒有任何空檔時網站可能根本不輸出表格
    let group = document
        .select(&sel.body_group)
        .next()
        .ok_or_else(|| BookingError::UnparseableSchedule {
            reason: "could not find table containing time slots".to_string(),
        })?;

    let mut map = AvailabilityMap::new();
    // 第一個日期不在表格內，預設為星期一
    let mut current_day = Weekday::FIRST.as_str().to_string();

    for row in group.select(&sel.row) {
        if let Some(header) = row.select(&sel.day_header).next() {
            current_day = element_text(&header);
            continue;
        }

        let mut cells = 0usize;
        for cell in row.select(&sel.bookable) {
            if let Some((label, field, link)) = read_cell(&cell) {
                map.insert(&current_day, &label, &field, &link);
                cells += 1;
            }
        }

        if cells > 0 {
            tracing::debug!("Available slots on {}: {}", current_day, cells);
        }
    }

    Ok(map)
}

/// (time slot label, field id, booking link) of one bookable cell.
fn read_cell(cell: &ElementRef<'_>) -> Option<(String, String, String)> {
    let sel = selectors();
    let link = cell.select(&sel.link).next()?;

    let href = link.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let label = element_text(&link.select(&sel.time).next()?);
    let field = field_id_from_label(&element_text(&link.select(&sel.detail).next()?))?;

    Some((label, field, href.to_string()))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
