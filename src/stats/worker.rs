//! Background statistics fetcher. Tokio task that loads dashboard stats for
//! the selected range and refreshes them every 5 min.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Duration;

use crate::api::models::DashboardStats;
use crate::api::ApiClient;
use crate::calendar::ReportRange;

const REFRESH_EVERY: Duration = Duration::from_secs(300);

// ─── Channel types ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StatsCommand {
    Fetch(ReportRange),
    /// Fetch the last requested range again.
    Refresh,
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum StatsEvent {
    Loading(ReportRange),
    Loaded { range: ReportRange, stats: DashboardStats },
    Failed { range: ReportRange, message: String },
    /// No `[api]` section; the dashboard can only show the calendar.
    Unconfigured,
}

// ─── Worker handle ────────────────────────────────────────────────────────────

pub struct StatsWorker {
    pub cmd_tx:   mpsc::Sender<StatsCommand>,
    pub event_rx: Arc<Mutex<mpsc::Receiver<StatsEvent>>>,
}

impl StatsWorker {
    pub fn spawn(client: Option<ApiClient>, homestay_id: Option<String>) -> Self {
        let (cmd_tx,   mut cmd_rx)   = mpsc::channel::<StatsCommand>(32);
        let (event_tx,     event_rx) = mpsc::channel::<StatsEvent>(64);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(REFRESH_EVERY);
            interval.tick().await; // discard first immediate tick

            let mut last: Option<ReportRange> = None;

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        let Some(cmd) = cmd else { break };
                        match take_latest(cmd, &mut cmd_rx) {
                            StatsCommand::Shutdown     => break,
                            StatsCommand::Fetch(range) => last = Some(range),
                            StatsCommand::Refresh      => {}
                        }
                    }
                    _ = interval.tick() => {}
                }

                let Some(range) = last.clone() else { continue };
                match client {
                    Some(ref c) => fetch(c, range, homestay_id.as_deref(), &event_tx).await,
                    None        => { let _ = event_tx.send(StatsEvent::Unconfigured).await; }
                }
            }

            tracing::info!("Stats worker stopped");
        });

        StatsWorker { cmd_tx, event_rx: Arc::new(Mutex::new(event_rx)) }
    }

    pub async fn fetch(&self, range: ReportRange) {
        let _ = self.cmd_tx.send(StatsCommand::Fetch(range)).await;
    }
    pub async fn refresh(&self)  { let _ = self.cmd_tx.send(StatsCommand::Refresh).await; }
    pub async fn shutdown(&self) { let _ = self.cmd_tx.send(StatsCommand::Shutdown).await; }

    /// Everything the worker has emitted since the last call.
    pub fn drain(&self) -> Vec<StatsEvent> {
        let mut buf = Vec::new();
        if let Ok(mut rx) = self.event_rx.try_lock() {
            while let Ok(ev) = rx.try_recv() { buf.push(ev); }
        }
        buf
    }
}

/// Collapses a burst of queued commands: shutdown wins, otherwise the most
/// recent fetch, otherwise a refresh.
fn take_latest(first: StatsCommand, rx: &mut mpsc::Receiver<StatsCommand>) -> StatsCommand {
    let mut latest = first;
    while let Ok(next) = rx.try_recv() {
        latest = match (latest, next) {
            (StatsCommand::Shutdown, _) | (_, StatsCommand::Shutdown) => StatsCommand::Shutdown,
            (StatsCommand::Fetch(r), StatsCommand::Refresh)          => StatsCommand::Fetch(r),
            (_, next)                                                 => next,
        };
    }
    latest
}

async fn fetch(
    client:      &ApiClient,
    range:       ReportRange,
    homestay_id: Option<&str>,
    tx:          &mpsc::Sender<StatsEvent>,
) {
    let _ = tx.send(StatsEvent::Loading(range.clone())).await;
    tracing::info!(range = %range.label(), "fetching dashboard stats");

    match client.dashboard_stats(&range, homestay_id).await {
        Ok(stats) => {
            tracing::info!(bookings = stats.total_bookings, "dashboard stats loaded");
            let _ = tx.send(StatsEvent::Loaded { range, stats }).await;
        }
        Err(e) => {
            tracing::warn!("dashboard_stats({}): {e}", range.label());
            let _ = tx.send(StatsEvent::Failed { range, message: e.to_string() }).await;
        }
    }
}
