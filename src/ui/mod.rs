use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, StatsView};
use crate::calendar::{format_date, month_name};
use crate::stats::{cancellation_rate, chart_points, money, percent, thousands};

// ─── Root draw ────────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.bg()).fg(app.theme.fg())),
        area,
    );

    // Layout: [ content | status_bar(1) ]
    let root = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)]).split(area);

    // Content: [ selector column(40) | dashboard ]
    let cols = Layout::default().direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(0)]).split(root[0]);

    // Left: [ dropdowns(6) | week list ]
    let left = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(0)]).split(cols[0]);

    // Right: [ cards(9) | chart ]
    let right = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)]).split(cols[1]);

    draw_selectors(f, app, left[0]);
    draw_weeks(f, app, left[1]);
    draw_cards(f, app, right[0]);
    draw_chart(f, app, right[1]);
    draw_statusbar(f, app, root[1]);

    if app.show_help { draw_help(f, area, app); }
}

fn panel<'a>(app: &App, title: String, focused: bool) -> Block<'a> {
    let t = &app.theme;
    Block::default()
        .title(Title::from(Line::from(Span::styled(
            title,
            Style::default().fg(t.accent()).add_modifier(Modifier::BOLD),
        ))))
        .borders(Borders::ALL)
        .border_type(t.border_type())
        .border_style(Style::default().fg(if focused { t.border_active() } else { t.border() }))
        .style(Style::default().bg(t.bg()))
}

// ─── Year / month / week dropdowns ────────────────────────────────────────────

fn draw_selectors(f: &mut Frame, app: &App, area: Rect) {
    let t   = &app.theme;
    let sel = &app.selector;
    let (sel_bg, sel_fg) = t.selected_highlight();

    let row = |label: &str, value: String, focus: Focus| -> Line<'static> {
        let active = app.focus == focus;
        let value_style = if active {
            Style::default().bg(sel_bg).fg(sel_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg())
        };
        Line::from(vec![
            Span::styled(format!(" {label:<7}"), Style::default().fg(t.fg_dim())),
            Span::styled(if active { "◀ " } else { "  " }, Style::default().fg(t.accent())),
            Span::styled(value, value_style),
            Span::styled(if active { " ▶" } else { "" }, Style::default().fg(t.accent())),
        ])
    };

    let weeks = sel.weeks().len();
    let lines = vec![
        row("Year",  sel.year().to_string(), Focus::Year),
        row("Month", month_name(sel.month()).to_owned(), Focus::Month),
        row("Week",  format!("{} of {weeks}", sel.week_number()), Focus::Week),
        Line::from(vec![
            Span::styled(" Period   ", Style::default().fg(t.fg_dim())),
            Span::styled(app.period.label(), Style::default().fg(t.accent())),
        ]),
    ];

    f.render_widget(
        Paragraph::new(lines).block(panel(app, " Range ".into(), true)),
        area,
    );
}

// ─── Week windows of the month ────────────────────────────────────────────────

fn draw_weeks(f: &mut Frame, app: &App, area: Rect) {
    let t   = &app.theme;
    let sel = &app.selector;
    let title = format!(" {} {} ", month_name(sel.month()), sel.year());
    let shown = sel.current_range().map(|r| r.week_number);

    let items: Vec<ListItem> = sel.weeks().iter().map(|w| {
        let current  = shown == Some(w.week_number);
        let (bg, fg) = t.selected_highlight();
        let style    = if current {
            Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg())
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!(" W{} ", w.week_number), Style::default().fg(t.accent())),
            Span::styled(format!("{} - {}", format_date(w.start), format_date(w.end)), style),
            Span::styled(format!("  {}d", w.len_days()), Style::default().fg(t.fg_dim())),
        ]))
    }).collect();

    let mut state = ListState::default();
    state.select(shown.map(|n| n.saturating_sub(1) as usize));
    f.render_stateful_widget(
        List::new(items).block(panel(app, title, false)).highlight_symbol("▶"),
        area,
        &mut state,
    );
}

// ─── Summary cards ────────────────────────────────────────────────────────────

fn draw_cards(f: &mut Frame, app: &App, area: Rect) {
    let t   = &app.theme;
    let dim = Style::default().fg(t.fg_dim());
    let fg  = Style::default().fg(t.fg()).add_modifier(Modifier::BOLD);

    let title = app.report_range()
        .map(|r| format!(" ● {} ", r.label()))
        .unwrap_or_else(|| " ● Dashboard ".into());

    let lines: Vec<Line> = match &app.stats {
        StatsView::Idle => vec![Line::from(Span::styled("  Waiting for a selection…", dim))],
        StatsView::Unconfigured => vec![
            Line::from(Span::styled("  No API configured.", dim)),
            Line::from(Span::styled("  Add an [api] section with base_url to config.toml.", dim)),
        ],
        StatsView::Loading(range) => vec![
            Line::from(Span::styled(format!("  Loading {}…", range.label()), dim)),
        ],
        StatsView::Failed { message, .. } => vec![
            Line::from(Span::styled("  Could not load statistics", Style::default().fg(t.error()))),
            Line::from(Span::styled(format!("  {message}"), dim)),
            Line::from(Span::styled("  r: retry", dim)),
        ],
        StatsView::Ready { stats, .. } => {
            let rating = stats.average_rating
                .map(|r| format!("{r:.1} ★"))
                .unwrap_or_else(|| "–".into());
            let card = |label: &str, value: String, style: Style| Line::from(vec![
                Span::styled(format!("  {label:<14}"), dim),
                Span::styled(value, style),
            ]);
            vec![
                Line::from(""),
                card("Bookings",  thousands(stats.total_bookings), fg),
                card("Cancelled", format!(
                    "{}  ({})",
                    thousands(stats.cancelled_bookings),
                    percent(cancellation_rate(stats)),
                ), Style::default().fg(t.warning())),
                card("Revenue",   money(stats.total_revenue), Style::default().fg(t.revenue())),
                card("Occupancy", percent(stats.occupancy_rate), fg),
                card("Rating",    rating, fg),
            ]
        }
    };

    f.render_widget(Paragraph::new(lines).block(panel(app, title, false)), area);
}

// ─── Bookings chart ───────────────────────────────────────────────────────────

fn draw_chart(f: &mut Frame, app: &App, area: Rect) {
    let t     = &app.theme;
    let block = panel(app, " Bookings ".into(), false);

    let StatsView::Ready { range, stats } = &app.stats else {
        f.render_widget(block, area);
        return;
    };

    let points = chart_points(range, stats);
    let data: Vec<(&str, u64)> = points.iter().map(|p| (p.label.as_str(), p.bookings)).collect();

    let inner     = block.inner(area);
    let slot      = (inner.width as usize / data.len().max(1)).max(1);
    let bar_width = slot.saturating_sub(1).clamp(1, 6) as u16;

    f.render_widget(
        BarChart::default()
            .block(block)
            .data(data.as_slice())
            .bar_width(bar_width)
            .bar_gap(1)
            .bar_style(Style::default().fg(t.bookings()))
            .value_style(Style::default().fg(t.bg()).bg(t.bookings()))
            .label_style(Style::default().fg(t.fg_dim())),
        area,
    );
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_statusbar(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let focus = match app.focus {
        Focus::Year  => " YEAR ",
        Focus::Month => " MONTH ",
        Focus::Week  => " WEEK ",
    };
    let bar = Paragraph::new(Line::from(vec![
        Span::styled(focus, Style::default().bg(t.accent()).fg(t.bg()).add_modifier(Modifier::BOLD)),
        Span::styled(
            "  Tab:field  h/l:change  j/k:week  [/]:month  p:period  t:today  r:reload  ?:help  q:quit",
            Style::default().fg(t.fg_dim()),
        ),
        Span::styled(
            format!("  {}", app.status),
            Style::default().fg(t.fg_dim()).add_modifier(Modifier::ITALIC),
        ),
    ])).style(Style::default().bg(t.bar_bg()));
    f.render_widget(bar, area);
}

// ─── Help overlay ────────────────────────────────────────────────────────────

fn draw_help(f: &mut Frame, area: Rect, app: &App) {
    let t    = &app.theme;
    let rect = centered(64, 70, area);
    f.render_widget(Clear, rect);

    let block = Block::default()
        .title(Title::from(Line::from(Span::styled(
            " Keyboard Shortcuts ",
            Style::default().fg(t.accent()).add_modifier(Modifier::BOLD),
        ))))
        .borders(Borders::ALL)
        .border_type(t.border_type())
        .border_style(Style::default().fg(t.border_active()))
        .style(Style::default().bg(t.popup_bg()));

    let accent = Style::default().fg(t.accent()).add_modifier(Modifier::BOLD);
    let dim    = Style::default().fg(t.fg_dim());
    let lines  = vec![
        Line::from(""),
        Line::from(Span::styled("  Range", accent)),
        Line::from(Span::styled("  Tab / Shift+Tab    Focus year, month or week", dim)),
        Line::from(Span::styled("  h/l  ←/→           Change the focused field", dim)),
        Line::from(Span::styled("  j/k  ↓/↑           Next / previous week", dim)),
        Line::from(Span::styled("  1-7                Jump to week", dim)),
        Line::from(Span::styled("  [ / ]              Previous / next month", dim)),
        Line::from(Span::styled("  t                  This month, week of today", dim)),
        Line::from(""),
        Line::from(Span::styled("  Dashboard", accent)),
        Line::from(Span::styled("  p                  Cycle week / month / year totals", dim)),
        Line::from(Span::styled("  r                  Reload statistics", dim)),
        Line::from(Span::styled("  Reloads every 5 minutes when an API is configured", dim)),
        Line::from(""),
        Line::from(Span::styled("  General", accent)),
        Line::from(Span::styled("  T                  Next theme", dim)),
        Line::from(Span::styled("  ?  Esc             Close help", dim)),
        Line::from(Span::styled("  q                  Quit", dim)),
    ];

    f.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().fg(t.fg()))
            .wrap(Wrap { trim: false }),
        rect,
    );
}

// ─── Utilities ────────────────────────────────────────────────────────────────

fn centered(pct_x: u16, pct_y: u16, r: Rect) -> Rect {
    let vert = Layout::default().direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ]).split(r);
    Layout::default().direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ]).split(vert[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{DailyStat, DashboardStats};
    use crate::app::App;
    use crate::calendar::selector::{WeekSelector, YearBounds};
    use crate::calendar::{Period, ReportRange};
    use crate::theme::Theme;
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut term = Terminal::new(TestBackend::new(120, 30)).unwrap();
        term.draw(|f| draw(f, app)).unwrap();
        let buf = term.backend().buffer().clone();
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    fn app() -> App {
        App::new(Theme::default(), WeekSelector::new(2024, 2, YearBounds::default()), Period::Week)
    }

    #[test]
    fn lists_every_window_of_the_month() {
        let out = render(&app());
        assert!(out.contains("February 2024"));
        assert!(out.contains("2024/02/01 - 2024/02/07"));
        assert!(out.contains("2024/02/29 - 2024/02/29"));
        assert!(out.contains("1 of 5"));
    }

    #[test]
    fn shows_loaded_statistics() {
        let mut a = app();
        a.period = Period::Month;
        let range = ReportRange::month(2024, 2).unwrap();
        a.stats = StatsView::Ready {
            range,
            stats: DashboardStats {
                total_bookings: 1200,
                cancelled_bookings: 12,
                total_revenue: 48_500_000.0,
                occupancy_rate: 0.5,
                average_rating: Some(4.6),
                daily: vec![DailyStat {
                    date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                    bookings: 3,
                    revenue: 100.0,
                }],
            },
        };
        let out = render(&a);
        assert!(out.contains("1,200"));
        assert!(out.contains("48,500,000"));
        assert!(out.contains("1.0%"));
        assert!(out.contains("50.0%"));
        assert!(out.contains("4.6"));
    }

    #[test]
    fn help_overlay_renders() {
        let mut a = app();
        a.show_help = true;
        assert!(render(&a).contains("Keyboard Shortcuts"));
    }
}
