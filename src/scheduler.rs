use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::mailbot::MailBot;
use crate::models::Classification;
use crate::notify::Dispatch;
use crate::source::ImageSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total_runs: u64,
    pub failed_runs: u64,
    pub last: Option<Classification>,
}

/// Triggers a run on a fixed cadence and hands each result to the dispatch table.
///
/// A failed run is logged and skipped; the next tick runs as usual.
pub struct Scheduler<S> {
    bot: MailBot<S>,
    dispatch: Dispatch,
    interval: Duration,
    stats: RunStats,
}

impl<S: ImageSource> Scheduler<S> {
    pub fn new(bot: MailBot<S>, dispatch: Dispatch, interval: Duration) -> Self {
        Self {
            bot,
            dispatch,
            interval,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run once and dispatch the outcome. Errors are returned, not logged.
    pub async fn tick(&self) -> Result<Classification> {
        let classification = self.bot.run_once().await?;
        self.dispatch.dispatch(classification);
        Ok(classification)
    }

    /// Tick every interval until `shutdown` resolves. A run in flight when
    /// shutdown fires is abandoned.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        log::info!(
            "polling {} every {:?}",
            self.bot.source().describe(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }

            let outcome = tokio::select! {
                result = self.tick() => Some(result),
                _ = &mut shutdown => None,
            };
            match outcome {
                Some(result) => self.record(result),
                None => {
                    log::info!("shutdown requested during a run; abandoning it");
                    break;
                }
            }
        }

        log::info!(
            "scheduler stopped after {} runs ({} failed)",
            self.stats.total_runs,
            self.stats.failed_runs
        );
    }

    fn record(&mut self, result: Result<Classification>) {
        self.stats.total_runs += 1;
        match result {
            Ok(classification) => self.stats.last = Some(classification),
            Err(e) => {
                self.stats.failed_runs += 1;
                log::error!("run {} failed: {}", self.stats.total_runs, e);
            }
        }
    }
}
