//! Month partitioning into 7-day windows and the report ranges built on them.
//!
//! Windows are anchored on the first day of the month, not on a weekday:
//! window 1 is days 1-7, window 2 is days 8-14 and so on, the last one
//! clamped to the month's final day.

pub mod selector;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Marker shown in place of a date that could not be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

const DISPLAY_FORMAT: &str = "%Y/%m/%d";

// ─── Week windows ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub week_number: u32,
    pub start:       NaiveDate,
    pub end:         NaiveDate,
}

impl WeekRange {
    /// Number of days covered, 1 to 7.
    pub fn len_days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Payload handed to whoever listens for selection changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedWeek {
    pub year:        i32,
    pub month:       u32,
    pub week_number: u32,
    pub start_date:  String,
    pub end_date:    String,
}

impl SelectedWeek {
    /// The dates behind the formatted strings.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(&self.start_date, DISPLAY_FORMAT).ok()?;
        let end   = NaiveDate::parse_from_str(&self.end_date, DISPLAY_FORMAT).ok()?;
        Some((start, end))
    }
}

/// Splits `(year, month)` into consecutive windows of at most 7 days.
///
/// Months outside 1-12 roll over into the neighbouring years (`month = 13`
/// is January of `year + 1`, `month = 0` is December of `year - 1`). Years
/// that chrono cannot represent yield an empty list.
pub fn compute_weeks(year: i32, month: u32) -> Vec<WeekRange> {
    let Some((first, last)) = month_span(year, month) else {
        tracing::debug!(year, month, "month outside the representable range");
        return Vec::new();
    };

    let mut weeks  = Vec::new();
    let mut cursor = first;
    let mut number = 1;
    while cursor <= last {
        let end = (cursor + Duration::days(6)).min(last);
        weeks.push(WeekRange { week_number: number, start: cursor, end });
        number += 1;
        match cursor.checked_add_signed(Duration::days(7)) {
            Some(next) => cursor = next,
            None       => break,
        }
    }
    weeks
}

/// Looks up a window by number and turns it into the listener payload.
pub fn select_week(weeks: &[WeekRange], week_number: u32) -> Option<SelectedWeek> {
    let w = weeks.iter().find(|w| w.week_number == week_number)?;
    Some(SelectedWeek {
        year:        w.start.year(),
        month:       w.start.month(),
        week_number: w.week_number,
        start_date:  format_date(w.start),
        end_date:    format_date(w.end),
    })
}

// ─── Formatting ───────────────────────────────────────────────────────────────

/// `YYYY/MM/DD`, zero padded.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// Formats a date coming from outside (API payloads, user input).
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and RFC 3339 timestamps; anything else
/// becomes [`INVALID_DATE`].
pub fn format_date_str(raw: &str) -> String {
    parse_loose(raw).map(format_date).unwrap_or_else(|| INVALID_DATE.to_owned())
}

fn parse_loose(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%d", DISPLAY_FORMAT]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

// ─── Month helpers ────────────────────────────────────────────────────────────

/// Brings an arbitrary month number back into 1-12, carrying into the year.
pub fn normalize_month(year: i32, month: i64) -> Option<(i32, u32)> {
    let total = i64::from(year) * 12 + (month - 1);
    let y     = i32::try_from(total.div_euclid(12)).ok()?;
    let m     = total.rem_euclid(12) as u32 + 1;
    Some((y, m))
}

/// First and last day of the month, after rollover.
pub fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let (y, m) = normalize_month(year, i64::from(month))?;
    let first  = NaiveDate::from_ymd_opt(y, m, 1)?;
    let next   = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    let last = match next {
        Some(n) => n.pred_opt()?,
        // December of the last representable year
        None    => NaiveDate::from_ymd_opt(y, 12, 31)?,
    };
    Some((first, last))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    month_span(year, month).map(|(_, last)| last.day()).unwrap_or(0)
}

pub fn month_name(m: u32) -> &'static str {
    match m {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "???",
    }
}

// ─── Report ranges ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub fn next(self) -> Self {
        match self {
            Period::Week  => Period::Month,
            Period::Month => Period::Year,
            Period::Year  => Period::Week,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Week  => "Week",
            Period::Month => "Month",
            Period::Year  => "Year",
        }
    }
}

/// Inclusive date range the dashboard statistics are requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRange {
    pub period:      Period,
    pub start:       NaiveDate,
    pub end:         NaiveDate,
    pub week_number: Option<u32>,
}

impl ReportRange {
    pub fn week(sel: &SelectedWeek) -> Option<Self> {
        let (start, end) = sel.span()?;
        Some(Self { period: Period::Week, start, end, week_number: Some(sel.week_number) })
    }

    pub fn month(year: i32, month: u32) -> Option<Self> {
        let (start, end) = month_span(year, month)?;
        Some(Self { period: Period::Month, start, end, week_number: None })
    }

    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            period:      Period::Year,
            start:       NaiveDate::from_ymd_opt(year, 1, 1)?,
            end:         NaiveDate::from_ymd_opt(year, 12, 31)?,
            week_number: None,
        })
    }

    /// Builds the range for `period` around the current selection.
    pub fn for_selection(period: Period, sel: &SelectedWeek) -> Option<Self> {
        match period {
            Period::Week  => Self::week(sel),
            Period::Month => Self::month(sel.year, sel.month),
            Period::Year  => Self::year(sel.year),
        }
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while({
            let end = self.end;
            move |d| *d <= end
        })
    }

    pub fn label(&self) -> String {
        match self.period {
            Period::Week => format!(
                "Week {} · {} - {}",
                self.week_number.unwrap_or(1),
                format_date(self.start),
                format_date(self.end),
            ),
            Period::Month => format!("{} {}", month_name(self.start.month()), self.start.year()),
            Period::Year  => self.start.year().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn leap_february_ends_with_single_day() {
        let weeks = compute_weeks(2024, 2);
        assert_eq!(weeks.len(), 5);
        let last = weeks.last().unwrap();
        assert_eq!(last.week_number, 5);
        assert_eq!(last.start, ymd(2024, 2, 29));
        assert_eq!(last.end, ymd(2024, 2, 29));
        assert_eq!(last.len_days(), 1);
    }

    #[test]
    fn common_february_is_four_full_weeks() {
        let weeks = compute_weeks(2023, 2);
        assert_eq!(weeks.len(), 4);
        assert!(weeks.iter().all(|w| w.len_days() == 7));
        assert_eq!(weeks[3].end, ymd(2023, 2, 28));
    }

    #[test]
    fn january_ends_with_three_days() {
        let weeks = compute_weeks(2024, 1);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[4].start, ymd(2024, 1, 29));
        assert_eq!(weeks[4].end, ymd(2024, 1, 31));
    }

    #[test]
    fn partitions_cover_every_month_without_gaps() {
        for year in [1900, 1999, 2000, 2023, 2024, 2100] {
            for month in 1..=12 {
                let weeks = compute_weeks(year, month);
                let (first, last) = month_span(year, month).unwrap();
                let days = days_in_month(year, month);

                assert_eq!(weeks.first().unwrap().start, first);
                assert_eq!(weeks.last().unwrap().end, last);
                assert_eq!(weeks.len() as u32, days.div_ceil(7));

                for (i, w) in weeks.iter().enumerate() {
                    assert_eq!(w.week_number, i as u32 + 1);
                    assert!(w.start <= w.end);
                    assert!(w.end <= last);
                    assert!(w.len_days() <= 7);
                }
                for pair in weeks.windows(2) {
                    assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
                }
            }
        }
    }

    #[test]
    fn recomputing_gives_identical_results() {
        assert_eq!(compute_weeks(2025, 8), compute_weeks(2025, 8));
    }

    #[test]
    fn out_of_range_month_rolls_over() {
        assert_eq!(compute_weeks(2024, 13), compute_weeks(2025, 1));
        assert_eq!(compute_weeks(2024, 0), compute_weeks(2023, 12));
        assert_eq!(normalize_month(2024, 25), Some((2026, 1)));
        assert_eq!(normalize_month(2024, -1), Some((2023, 11)));
    }

    #[test]
    fn unrepresentable_year_gives_no_windows() {
        assert!(compute_weeks(i32::MAX, 1).is_empty());
        assert_eq!(days_in_month(i32::MAX, 1), 0);
    }

    #[test]
    fn format_date_zero_pads() {
        assert_eq!(format_date(ymd(2024, 1, 5)), "2024/01/05");
        assert_eq!(format_date(ymd(987, 11, 30)), "0987/11/30");
    }

    #[test]
    fn format_date_str_accepts_api_shapes_and_marks_garbage() {
        assert_eq!(format_date_str("2024-01-05"), "2024/01/05");
        assert_eq!(format_date_str("2024/01/05"), "2024/01/05");
        assert_eq!(format_date_str("2024-01-05T23:10:00+07:00"), "2024/01/05");
        assert_eq!(format_date_str("NaN"), INVALID_DATE);
        assert_eq!(format_date_str("2024-02-30"), INVALID_DATE);
        assert_eq!(format_date_str(""), INVALID_DATE);
    }

    #[test]
    fn select_week_builds_payload() {
        let weeks = compute_weeks(2024, 1);
        let sel   = select_week(&weeks, 2).unwrap();
        assert_eq!(sel, SelectedWeek {
            year: 2024, month: 1, week_number: 2,
            start_date: "2024/01/08".into(),
            end_date:   "2024/01/14".into(),
        });
        assert_eq!(sel.span(), Some((ymd(2024, 1, 8), ymd(2024, 1, 14))));
    }

    #[test]
    fn select_week_missing_number_is_none() {
        let weeks = compute_weeks(2023, 2);
        assert!(select_week(&weeks, 5).is_none());
        assert!(select_week(&weeks, 0).is_none());
    }

    #[test]
    fn selected_week_serializes_camel_case() {
        let sel  = select_week(&compute_weeks(2024, 2), 5).unwrap();
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(json["weekNumber"], 5);
        assert_eq!(json["startDate"], "2024/02/29");
        assert_eq!(json["endDate"], "2024/02/29");
    }

    #[test]
    fn report_ranges_per_period() {
        let sel = select_week(&compute_weeks(2024, 2), 3).unwrap();

        let w = ReportRange::for_selection(Period::Week, &sel).unwrap();
        assert_eq!((w.start, w.end), (ymd(2024, 2, 15), ymd(2024, 2, 21)));
        assert_eq!(w.label(), "Week 3 · 2024/02/15 - 2024/02/21");

        let m = ReportRange::for_selection(Period::Month, &sel).unwrap();
        assert_eq!((m.start, m.end), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(m.num_days(), 29);
        assert_eq!(m.label(), "February 2024");

        let y = ReportRange::for_selection(Period::Year, &sel).unwrap();
        assert_eq!(y.num_days(), 366);
        assert_eq!(y.days().count(), 366);
        assert_eq!(y.label(), "2024");
    }

    #[test]
    fn period_cycles() {
        assert_eq!(Period::Week.next().next().next(), Period::Week);
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "???");
    }
}
