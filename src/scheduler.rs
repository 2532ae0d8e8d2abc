use chrono::{Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::monitor::StockMonitor;

/// A check that fires once a day at a fixed local time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// Parses `HH:MM`.
    pub fn parse(value: &str) -> Option<Self> {
        NaiveTime::parse_from_str(value.trim(), "%H:%M").ok().map(Self::new)
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// The first due instant strictly after `now`: today if the time of day
    /// is still ahead, otherwise tomorrow.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.at);
        if today > now {
            today
        } else {
            today + chrono::Duration::days(1)
        }
    }
}

/// Runs until Ctrl-C. Returns false without checking anything when email is
/// not configured, true once stopped by the user.
pub async fn run_scheduler(
    monitor: &StockMonitor,
    schedule: DailySchedule,
    poll_interval: Duration,
) -> bool {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    run_with(
        monitor,
        schedule,
        poll_interval,
        || Local::now().naive_local(),
        shutdown,
    )
    .await
}

pub async fn run_with<C, S>(
    monitor: &StockMonitor,
    schedule: DailySchedule,
    poll_interval: Duration,
    mut clock: C,
    shutdown: S,
) -> bool
where
    C: FnMut() -> NaiveDateTime,
    S: Future,
{
    if let Err(e) = monitor.notifier().check_configured() {
        tracing::error!("{}", e);
        tracing::error!("Please set FROM_EMAIL and EMAIL_PASSWORD environment variables");
        return false;
    }

    let mut next_due = schedule.next_after(clock());
    tracing::info!(
        next_run = %next_due,
        "Scheduler set up - will check daily at {}",
        schedule.at().format("%H:%M")
    );
    tracing::info!("Press Ctrl+C to stop the monitor");

    tracing::info!("Running initial stock check...");
    monitor.run_daily_check().await;

    let mut ticker = tokio::time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Monitor stopped by user");
                return true;
            }
            _ = ticker.tick() => {
                let now = clock();
                if now >= next_due {
                    if !monitor.run_daily_check().await {
                        tracing::warn!("Scheduled check failed, next try at the scheduled time");
                    }
                    next_due = schedule.next_after(now);
                    tracing::info!(next_run = %next_due, "Next stock check scheduled");
                }
            }
        }
    }
}
