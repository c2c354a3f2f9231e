//! Dashboard statistics: chart data assembly and the background fetcher.

pub mod worker;

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::api::models::{DailyStat, DashboardStats};
use crate::calendar::{month_name, ReportRange};

/// Ranges longer than this are charted per month instead of per day.
const DAILY_LIMIT: i64 = 31;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label:    String,
    pub bookings: u64,
    pub revenue:  f64,
}

/// One entry per day of `range`, zero where the backend reported nothing.
/// Entries outside the range are dropped; duplicates are summed.
pub fn daily_series(range: &ReportRange, daily: &[DailyStat]) -> Vec<(NaiveDate, u64, f64)> {
    let mut by_day: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for d in daily.iter().filter(|d| range.start <= d.date && d.date <= range.end) {
        let e = by_day.entry(d.date).or_default();
        e.0 += d.bookings;
        e.1 += d.revenue;
    }
    range.days()
        .map(|day| {
            let (b, r) = by_day.get(&day).copied().unwrap_or_default();
            (day, b, r)
        })
        .collect()
}

/// Bars for the chart: per day for up to a month, per month beyond that.
pub fn chart_points(range: &ReportRange, stats: &DashboardStats) -> Vec<ChartPoint> {
    let series = daily_series(range, &stats.daily);
    if range.num_days() <= DAILY_LIMIT {
        return series.into_iter()
            .map(|(day, bookings, revenue)| ChartPoint {
                label: day.format("%d").to_string(),
                bookings, revenue,
            })
            .collect();
    }

    let mut points: Vec<ChartPoint> = Vec::new();
    let mut current: Option<(i32, u32)> = None;
    for (day, bookings, revenue) in series {
        let key = (day.year(), day.month());
        if current != Some(key) {
            current = Some(key);
            points.push(ChartPoint {
                label: month_name(day.month())[..3].to_owned(),
                bookings: 0,
                revenue: 0.0,
            });
        }
        if let Some(p) = points.last_mut() {
            p.bookings += bookings;
            p.revenue  += revenue;
        }
    }
    points
}

pub fn cancellation_rate(stats: &DashboardStats) -> f64 {
    if stats.total_bookings == 0 {
        0.0
    } else {
        stats.cancelled_bookings as f64 / stats.total_bookings as f64
    }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Rounded to whole units; negative and non-finite amounts show as 0.
pub fn money(amount: f64) -> String {
    if amount.is_finite() && amount > 0.0 {
        thousands(amount.round() as u64)
    } else {
        "0".to_owned()
    }
}

pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}
