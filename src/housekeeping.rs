use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::platform::EventPlatform;

pub mod error_log;
pub mod faults;
pub mod uptime;

pub use self::error_log::ErrorLog;
pub use self::faults::{FaultReporter, install_panic_hook};
pub use self::uptime::{UptimeLedger, UptimeReport};

/// Discord rejects message content longer than this many characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Posts the periodic uptime and error report to the log channel.
pub struct Housekeeper {
    platform: Arc<dyn EventPlatform>,
    channel_id: String,
    error_log: ErrorLog,
    ledger: UptimeLedger,
    online_since: Instant,
    interval: Duration,
}

impl Housekeeper {
    pub fn new(
        platform: Arc<dyn EventPlatform>,
        channel_id: impl Into<String>,
        error_log: ErrorLog,
        target_uptime_days: u64,
        online_since: Instant,
        interval: Duration,
    ) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
            error_log,
            ledger: UptimeLedger::new(target_uptime_days),
            online_since,
            interval,
        }
    }

    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = self.report().await {
                error!("failed to post error log: {err:#}");
            }
        }
    }

    pub async fn report(&mut self) -> Result<()> {
        let log_text = self
            .error_log
            .read()
            .await
            .with_context(|| format!("failed to read {}", self.error_log.path().display()))?;

        let current_days = self.online_since.elapsed().as_secs() / SECONDS_PER_DAY;
        let report = self.ledger.record(current_days);
        let content = render_report(&report, &log_text);

        for chunk in split_message(&content, MAX_MESSAGE_CHARS) {
            self.platform.send_message(&self.channel_id, &chunk).await?;
        }

        self.error_log.clear().await.context("failed to clear error log")?;
        self.ledger.carry_forward(&report);
        info!(
            "posted error report: uptime {} day(s), downtime {} day(s)",
            report.current_uptime_days, report.total_downtime_days
        );
        Ok(())
    }
}

pub fn render_report(report: &UptimeReport, log_text: &str) -> String {
    format!("{report}\n\nWeekly error report:\n{log_text}")
}

/// Splits `content` into pieces of at most `limit` characters, preferring
/// line boundaries.
pub fn split_message(content: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in content.split_inclusive('\n') {
        let line_chars = line.chars().count();
        if current_chars + line_chars > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if line_chars > limit {
            let mut piece = String::new();
            let mut piece_chars = 0;
            for ch in line.chars() {
                if piece_chars == limit {
                    chunks.push(std::mem::take(&mut piece));
                    piece_chars = 0;
                }
                piece.push(ch);
                piece_chars += 1;
            }
            current = piece;
            current_chars = piece_chars;
        } else {
            current.push_str(line);
            current_chars += line_chars;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
