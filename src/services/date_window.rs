use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{DateMode, DateRange};

/// Days searched when a relative label is not recognised
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Concrete UTC window, day-bounded (00:00:00 to 23:59:59)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    fn from_days(start: NaiveDate, end: NaiveDate) -> Self {
        let end = end.max(start);
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Self {
            start: Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&end.and_time(last_second)),
        }
    }

    /// Provider wire format `YYYY-MM-DDTHH:MM:SS`
    pub fn start_iso(&self) -> String {
        format_iso(&self.start)
    }

    pub fn end_iso(&self) -> String {
        format_iso(&self.end)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Resolves a date preference against the current UTC day.
pub fn resolve_date_window(range: &DateRange) -> Option<DateWindow> {
    resolve_date_window_on(range, Utc::now().date_naive())
}

/// Resolves a date preference against an explicit "today".
///
/// Returns `None` when an explicit range has no parseable start date.
pub fn resolve_date_window_on(range: &DateRange, today: NaiveDate) -> Option<DateWindow> {
    let (start, end) = match range.mode {
        DateMode::Explicit => {
            let start = parse_date(range.start_date.as_deref())?;
            let end = parse_date(range.end_date.as_deref()).unwrap_or(start);
            (start, end)
        }
        DateMode::Relative => {
            let label = range.label.as_deref().unwrap_or_default().to_lowercase();
            relative_days(&label, today)
        }
    };

    Some(DateWindow::from_days(start, end))
}

fn relative_days(label: &str, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = i64::from(today.weekday().num_days_from_monday());

    if label.contains("today") {
        (today, today)
    } else if label.contains("next week") {
        // On a Monday this jumps a full week rather than zero days
        let until_monday = match 7 - weekday {
            0 => 7,
            days => days,
        };
        let start = today + Duration::days(until_monday);
        (start, start + Duration::days(6))
    } else if label.contains("this week") {
        (today, today + Duration::days((6 - weekday).max(0)))
    } else if label.contains("next month") {
        let (year, month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        match month_bounds(year, month) {
            Some(bounds) => bounds,
            None => default_window(today),
        }
    } else if label.contains("this month") {
        match month_bounds(today.year(), today.month()) {
            Some((_, last)) => (today, last),
            None => default_window(today),
        }
    } else {
        default_window(today)
    }
}

fn default_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(DEFAULT_WINDOW_DAYS))
}

/// First and last calendar day of a month
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first.pred_opt()?))
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    // Accept full ISO timestamps by keeping the date part
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
