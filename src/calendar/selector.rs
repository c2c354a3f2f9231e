//! Year / month / week selection state.
//!
//! Every setter returns `Some(SelectedWeek)` when the effective selection
//! changed and `None` otherwise, so the caller emits exactly one event per
//! change. Changing the year or the month recomputes the windows and goes
//! back to week 1.

use chrono::{Datelike, Local, NaiveDate};

use super::{compute_weeks, normalize_month, select_week, SelectedWeek, WeekRange};

pub const DEFAULT_PAST_YEARS:   u32 = 10;
pub const DEFAULT_FUTURE_YEARS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub past:   u32,
    pub future: u32,
}

impl Default for YearBounds {
    fn default() -> Self {
        Self { past: DEFAULT_PAST_YEARS, future: DEFAULT_FUTURE_YEARS }
    }
}

#[derive(Debug, Clone)]
pub struct WeekSelector {
    year:        i32,
    month:       u32,
    week_number: u32,
    weeks:       Vec<WeekRange>,
    anchor_year: i32,
    bounds:      YearBounds,
}

impl WeekSelector {
    pub fn new(year: i32, month: u32, bounds: YearBounds) -> Self {
        let (year, month) = normalize_month(year, i64::from(month)).unwrap_or((year, 1));
        Self {
            year, month,
            week_number: 1,
            weeks:       compute_weeks(year, month),
            anchor_year: year,
            bounds,
        }
    }

    /// Starts on the current local month, week 1.
    pub fn today(bounds: YearBounds) -> Self {
        let today = Local::now().date_naive();
        Self::new(today.year(), today.month(), bounds)
    }

    pub fn year(&self)        -> i32          { self.year }
    pub fn month(&self)       -> u32          { self.month }
    pub fn week_number(&self) -> u32          { self.week_number }
    pub fn weeks(&self)       -> &[WeekRange] { &self.weeks }

    /// The payload for the current state; used for the initial emission.
    pub fn current(&self) -> Option<SelectedWeek> {
        select_week(&self.weeks, self.week_number)
    }

    pub fn current_range(&self) -> Option<&WeekRange> {
        self.weeks.iter().find(|w| w.week_number == self.week_number)
    }

    /// Years offered in the year dropdown.
    pub fn year_options(&self) -> Vec<i32> {
        let lo = self.anchor_year.saturating_sub_unsigned(self.bounds.past);
        let hi = self.anchor_year.saturating_add_unsigned(self.bounds.future);
        (lo..=hi).collect()
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    pub fn set_year(&mut self, year: i32) -> Option<SelectedWeek> {
        self.set_year_month(year, i64::from(self.month))
    }

    /// Months outside 1-12 carry into the year.
    pub fn set_month(&mut self, month: u32) -> Option<SelectedWeek> {
        self.set_year_month(self.year, i64::from(month))
    }

    pub fn set_week(&mut self, week_number: u32) -> Option<SelectedWeek> {
        if week_number == self.week_number {
            return None;
        }
        let sel = select_week(&self.weeks, week_number)?;
        self.week_number = week_number;
        Some(sel)
    }

    fn set_year_month(&mut self, year: i32, month: i64) -> Option<SelectedWeek> {
        let (year, month) = normalize_month(year, month)?;
        if (year, month) == (self.year, self.month) {
            return None;
        }
        let weeks = compute_weeks(year, month);
        if weeks.is_empty() {
            tracing::warn!(year, month, "ignoring unrepresentable month");
            return None;
        }
        self.year        = year;
        self.month       = month;
        self.weeks       = weeks;
        self.week_number = 1;
        tracing::debug!(year, month, weeks = self.weeks.len(), "recomputed weeks");
        self.current()
    }

    // ── Keyboard stepping ─────────────────────────────────────────────────────

    /// Moves within the offered years, stopping at either end.
    pub fn step_year(&mut self, delta: i32) -> Option<SelectedWeek> {
        let opts   = self.year_options();
        let (lo, hi) = (*opts.first()?, *opts.last()?);
        let target = self.year.saturating_add(delta).clamp(lo, hi);
        self.set_year(target)
    }

    /// Wraps December ↔ January without touching the year.
    pub fn step_month(&mut self, delta: i32) -> Option<SelectedWeek> {
        let m = (self.month as i32 - 1 + delta).rem_euclid(12) as u32 + 1;
        self.set_month(m)
    }

    /// Stops at the first and last window.
    pub fn step_week(&mut self, delta: i32) -> Option<SelectedWeek> {
        let last   = self.weeks.len() as i64;
        let target = (i64::from(self.week_number) + i64::from(delta)).clamp(1, last.max(1));
        self.set_week(target as u32)
    }

    /// Jumps to the window holding `date`.
    pub fn jump_to(&mut self, date: NaiveDate) -> Option<SelectedWeek> {
        let month_event = self.set_year_month(date.year(), i64::from(date.month()));
        let target = self.weeks.iter().find(|w| w.contains(date)).map(|w| w.week_number)?;
        self.set_week(target).or(month_event)
    }
}
