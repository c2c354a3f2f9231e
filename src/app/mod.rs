use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::{
    api::models::DashboardStats,
    calendar::{selector::WeekSelector, Period, ReportRange, SelectedWeek},
    stats::worker::{StatsEvent, StatsWorker},
    theme::Theme,
    ui::draw,
};

// ─── Focus model ──────────────────────────────────────────────────────────────

/// Which of the three dropdowns the arrow keys change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Year,
    Month,
    Week,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Year  => Focus::Month,
            Focus::Month => Focus::Week,
            Focus::Week  => Focus::Year,
        }
    }

    fn prev(self) -> Self {
        self.next().next()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsView {
    Idle,
    Unconfigured,
    Loading(ReportRange),
    Ready { range: ReportRange, stats: DashboardStats },
    Failed { range: ReportRange, message: String },
}

/// What a key press asks the async side to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Nothing,
    /// The selection changed; notify and maybe refetch.
    Selected(SelectedWeek),
    /// Same selection, different report period.
    PeriodChanged,
    Refresh,
}

// ─── App state ────────────────────────────────────────────────────────────────

pub struct App {
    pub theme:        Theme,
    pub theme_idx:    usize,
    pub selector:     WeekSelector,
    pub period:       Period,
    pub focus:        Focus,
    pub show_help:    bool,
    pub stats:        StatsView,
    /// Last payload sent to the listener.
    pub last_emitted: Option<SelectedWeek>,
    /// Range last handed to the stats worker.
    pub requested:    Option<ReportRange>,
    pub status:       String,
    pub running:      bool,
    pub worker:       Option<StatsWorker>,
}

impl App {
    pub fn new(theme: Theme, selector: WeekSelector, period: Period) -> Self {
        let idx = Theme::all_themes().iter().position(|t| t.name == theme.name).unwrap_or(0);
        Self {
            theme_idx: idx,
            theme, selector, period,
            focus:        Focus::Week,
            show_help:    false,
            stats:        StatsView::Idle,
            last_emitted: None,
            requested:    None,
            status:       String::new(),
            running:      true,
            worker:       None,
        }
    }

    pub fn attach_stats_worker(&mut self, w: StatsWorker) { self.worker = Some(w); }

    /// Range the dashboard should currently show.
    pub fn report_range(&self) -> Option<ReportRange> {
        let sel = self.selector.current()?;
        ReportRange::for_selection(self.period, &sel)
    }

    // ── TUI loop ──────────────────────────────────────────────────────────────

    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend  = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;

        let result = self.event_loop(&mut term).await;

        disable_raw_mode()?;
        execute!(term.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        term.show_cursor()?;
        result
    }

    async fn event_loop(
        &mut self,
        term: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        self.mount().await;

        let tick = std::time::Duration::from_millis(50);
        while self.running {
            term.draw(|f| draw(f, self))?;

            let pending = self.worker.as_ref().map(StatsWorker::drain).unwrap_or_default();
            for ev in pending { self.on_stats_event(ev); }

            if event::poll(tick)? {
                if let Event::Key(key) = event::read()? {
                    self.on_key(key).await;
                }
            }
        }

        if let Some(ref w) = self.worker { w.shutdown().await; }
        Ok(())
    }

    /// The listener hears about the initial selection once.
    pub async fn mount(&mut self) {
        if let Some(sel) = self.selector.current() {
            self.emit(sel).await;
        }
    }

    pub fn on_stats_event(&mut self, ev: StatsEvent) {
        let range = match &ev {
            StatsEvent::Loading(range)
            | StatsEvent::Loaded { range, .. }
            | StatsEvent::Failed { range, .. } => Some(range),
            StatsEvent::Unconfigured => None,
        };
        if let Some(range) = range {
            if self.requested.as_ref() != Some(range) {
                tracing::debug!(range = %range.label(), "dropping stale stats event");
                return;
            }
        }

        self.stats = match ev {
            StatsEvent::Loading(range) => {
                self.status = format!("⟳ Loading {}…", range.label());
                StatsView::Loading(range)
            }
            StatsEvent::Loaded { range, stats } => {
                self.status = format!("✓ {}", range.label());
                StatsView::Ready { range, stats }
            }
            StatsEvent::Failed { range, message } => {
                self.status = format!("✗ {message}");
                StatsView::Failed { range, message }
            }
            StatsEvent::Unconfigured => {
                self.status = "No [api] section in config.toml".into();
                StatsView::Unconfigured
            }
        };
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    async fn on_key(&mut self, key: KeyEvent) {
        match self.handle_key(key) {
            Action::Nothing       => {}
            Action::Selected(sel) => self.emit(sel).await,
            Action::PeriodChanged => self.request_stats().await,
            Action::Refresh       => {
                if let Some(ref w) = self.worker { w.refresh().await; }
            }
        }
    }

    /// Applies a key to the local state.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return Action::Nothing;
        }

        let changed = match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.running = false;
                None
            }
            (KeyCode::Char('?'), _) => { self.show_help = true; None }
            (KeyCode::Tab, _)       => { self.focus = self.focus.next(); None }
            (KeyCode::BackTab, _)   => { self.focus = self.focus.prev(); None }

            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => self.step_focused(1),
            (KeyCode::Left, _)  | (KeyCode::Char('h'), _) => self.step_focused(-1),
            (KeyCode::Down, _)  | (KeyCode::Char('j'), _) => self.selector.step_week(1),
            (KeyCode::Up, _)    | (KeyCode::Char('k'), _) => self.selector.step_week(-1),
            (KeyCode::Char(']'), _) => self.selector.step_month(1),
            (KeyCode::Char('['), _) => self.selector.step_month(-1),
            (KeyCode::Char(c @ '1'..='7'), _) => self.selector.set_week(c as u32 - '0' as u32),
            (KeyCode::Char('t'), _) => self.selector.jump_to(Local::now().date_naive()),

            (KeyCode::Char('p'), _) => {
                self.period = self.period.next();
                return Action::PeriodChanged;
            }
            (KeyCode::Char('r'), _) => return Action::Refresh,
            (KeyCode::Char('T'), _) => {
                let themes = Theme::all_themes();
                self.theme_idx = (self.theme_idx + 1) % themes.len();
                self.theme     = themes[self.theme_idx].clone();
                if let Err(e) = self.theme.save() {
                    tracing::warn!("saving theme: {e}");
                }
                None
            }
            _ => None,
        };

        changed.map(Action::Selected).unwrap_or(Action::Nothing)
    }

    fn step_focused(&mut self, delta: i32) -> Option<SelectedWeek> {
        match self.focus {
            Focus::Year  => self.selector.step_year(delta),
            Focus::Month => self.selector.step_month(delta),
            Focus::Week  => self.selector.step_week(delta),
        }
    }

    // ── Listener side ─────────────────────────────────────────────────────────

    async fn emit(&mut self, sel: SelectedWeek) {
        tracing::info!(
            year = sel.year, month = sel.month, week = sel.week_number,
            start = %sel.start_date, end = %sel.end_date,
            "selection changed",
        );
        self.last_emitted = Some(sel);
        self.request_stats().await;
    }

    /// Hands the current range to the worker unless it is already the one
    /// being shown.
    async fn request_stats(&mut self) {
        let Some(range) = self.report_range() else { return };
        if self.requested.as_ref() == Some(&range) {
            return;
        }
        self.requested = Some(range.clone());
        if let Some(ref w) = self.worker { w.fetch(range).await; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::selector::YearBounds;
    use crate::calendar::{compute_weeks, select_week};

    fn app(year: i32, month: u32) -> App {
        App::new(Theme::default(), WeekSelector::new(year, month, YearBounds::default()), Period::Week)
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn month_change_resets_week_and_reports_february_week_one() {
        let mut a = app(2024, 1);
        press(&mut a, KeyCode::Down);
        press(&mut a, KeyCode::Down);
        assert_eq!(a.selector.week_number(), 3);

        a.focus = Focus::Month;
        let Action::Selected(sel) = press(&mut a, KeyCode::Right) else { panic!("no event") };
        assert_eq!((sel.year, sel.month, sel.week_number), (2024, 2, 1));
        assert_eq!(sel.start_date, "2024/02/01");
        assert_eq!(sel.end_date, "2024/02/07");
    }

    #[test]
    fn week_keys_stop_at_the_edges() {
        let mut a = app(2023, 2);
        assert_eq!(press(&mut a, KeyCode::Up), Action::Nothing);
        for _ in 0..3 { press(&mut a, KeyCode::Char('j')); }
        assert_eq!(a.selector.week_number(), 4);
        assert_eq!(press(&mut a, KeyCode::Char('j')), Action::Nothing);
        assert_eq!(press(&mut a, KeyCode::Char('5')), Action::Nothing);
    }

    #[test]
    fn number_keys_pick_a_week() {
        let mut a = app(2024, 2);
        let Action::Selected(sel) = press(&mut a, KeyCode::Char('5')) else { panic!("no event") };
        assert_eq!(sel.start_date, "2024/02/29");
        assert_eq!(sel.end_date, "2024/02/29");
    }

    #[test]
    fn tab_cycles_focus_and_year_steps() {
        let mut a = app(2024, 5);
        press(&mut a, KeyCode::Tab);
        assert_eq!(a.focus, Focus::Year);
        let Action::Selected(sel) = press(&mut a, KeyCode::Left) else { panic!("no event") };
        assert_eq!((sel.year, sel.month), (2023, 5));
        press(&mut a, KeyCode::BackTab);
        assert_eq!(a.focus, Focus::Week);
    }

    #[test]
    fn period_key_changes_report_range_only() {
        let mut a = app(2024, 2);
        assert_eq!(press(&mut a, KeyCode::Char('p')), Action::PeriodChanged);
        assert_eq!(a.period, Period::Month);
        assert_eq!(a.report_range(), ReportRange::month(2024, 2));
        assert_eq!(a.selector.week_number(), 1);
    }

    #[test]
    fn help_swallows_keys_until_closed() {
        let mut a = app(2024, 2);
        press(&mut a, KeyCode::Char('?'));
        assert!(a.show_help);
        assert_eq!(press(&mut a, KeyCode::Down), Action::Nothing);
        assert_eq!(a.selector.week_number(), 1);
        press(&mut a, KeyCode::Esc);
        assert!(!a.show_help);
        assert!(a.running);
        press(&mut a, KeyCode::Char('q'));
        assert!(!a.running);
    }

    #[tokio::test]
    async fn same_range_is_not_requested_twice() {
        let mut a = app(2024, 2);
        a.period = Period::Month;
        let sel = a.selector.current().unwrap();
        a.emit(sel).await;
        let first = a.requested.clone();
        assert_eq!(first, ReportRange::month(2024, 2));

        let Action::Selected(sel) = press(&mut a, KeyCode::Down) else { panic!("no event") };
        a.emit(sel.clone()).await;
        assert_eq!(a.requested, first);
        assert_eq!(a.last_emitted, Some(sel));
    }

    #[test]
    fn stats_events_update_view_and_status() {
        let mut a = app(2024, 2);
        let range = a.report_range().unwrap();
        a.requested = Some(range.clone());
        a.on_stats_event(StatsEvent::Failed { range: range.clone(), message: "boom".into() });
        assert_eq!(a.status, "✗ boom");
        a.on_stats_event(StatsEvent::Loaded { range, stats: DashboardStats::default() });
        assert!(matches!(a.stats, StatsView::Ready { .. }));
    }

    #[tokio::test]
    async fn mount_emits_week_one_and_requests_its_range() {
        let mut a = app(2024, 1);
        a.mount().await;
        assert_eq!(a.last_emitted, a.selector.current());
        let week_one = select_week(&compute_weeks(2024, 1), 1).unwrap();
        assert_eq!(a.requested, ReportRange::week(&week_one));
    }

    #[tokio::test]
    async fn stats_for_a_range_already_left_are_dropped() {
        let mut a = app(2024, 1);
        a.mount().await;
        let week_one = a.requested.clone().unwrap();

        let Action::Selected(sel) = press(&mut a, KeyCode::Down) else { panic!("no event") };
        a.emit(sel).await;
        let week_two = a.requested.clone().unwrap();
        assert_ne!(week_one, week_two);

        let stale = DashboardStats { total_bookings: 99, ..DashboardStats::default() };
        a.on_stats_event(StatsEvent::Loaded { range: week_one.clone(), stats: stale });
        a.on_stats_event(StatsEvent::Failed { range: week_one, message: "late".into() });
        assert_eq!(a.stats, StatsView::Idle);

        a.on_stats_event(StatsEvent::Loading(week_two.clone()));
        assert_eq!(a.stats, StatsView::Loading(week_two));

        a.on_stats_event(StatsEvent::Unconfigured);
        assert_eq!(a.stats, StatsView::Unconfigured);
    }
}
