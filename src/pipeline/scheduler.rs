// src/pipeline/scheduler.rs - Fires the forecast run once a day

use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use super::ForecastRun;

/// Runs the daily evaluation at a fixed local wall-clock time
pub struct DailyScheduler {
    run: Arc<ForecastRun>,
    at: NaiveTime,
}

impl DailyScheduler {
    pub fn new(run: Arc<ForecastRun>, at: NaiveTime) -> Self {
        Self { run, at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// Run until ctrl-c
    pub async fn start(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` completes. A run already in progress finishes
    /// before the loop exits.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("⏰ Scheduler started, daily evaluation at {}", self.at.format("%H:%M"));
        tokio::pin!(shutdown);

        loop {
            let now = Local::now().naive_local();
            let next = next_run_after(now, self.at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!("Next evaluation at {}", next.format("%Y-%m-%d %H:%M"));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let summary = self.run.run_daily().await;
                    if summary.actual.is_none() {
                        info!("No evaluation performed for {:?}", summary.date);
                    }
                }
                _ = &mut shutdown => {
                    info!("🛑 Scheduler received shutdown signal");
                    break;
                }
            }
        }
    }
}

/// First occurrence of `at` strictly after `now`
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today_at = now.date().and_time(at);
    if today_at > now {
        today_at
    } else {
        today_at + Duration::days(1)
    }
}
