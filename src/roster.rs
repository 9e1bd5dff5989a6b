use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::platform::{EventPlatform, SubscriberPage};
use crate::store::{EventRecord, EventRecords, EventStatus, StateStore};
use crate::utils::retry::{Attempt, RetryPolicy, retry_after};

const RESTART_DELAY: Duration = Duration::from_secs(5);

pub mod publisher;
pub mod reconcile;
pub mod render;

use self::publisher::Publisher;
use self::reconcile::reconcile;

#[derive(Debug, Clone, Copy)]
pub struct RosterSettings {
    pub debounce_threshold: u32,
    /// Pause after each processed event.
    pub event_delay: Duration,
    /// Pause between ticks while events are being tracked.
    pub active_tick_delay: Duration,
    /// Pause between ticks while nothing is tracked.
    pub idle_tick_delay: Duration,
    pub retry: RetryPolicy,
}

impl From<&Config> for RosterSettings {
    fn from(config: &Config) -> Self {
        let polling = &config.polling;
        Self {
            debounce_threshold: polling.debounce_threshold,
            event_delay: polling.event_delay(),
            active_tick_delay: polling.active_tick_delay(),
            idle_tick_delay: polling.idle_tick_delay(),
            retry: polling
                .max_rate_limit_retries
                .map_or_else(RetryPolicy::unbounded, RetryPolicy::bounded),
        }
    }
}

/// State owned by one run of the poll loop.
#[derive(Debug, Default)]
pub struct RosterSession {
    pub events: EventRecords,
}

impl RosterSession {
    pub fn new(events: EventRecords) -> Self {
        Self { events }
    }

    pub fn next_tick_delay(&self, settings: &RosterSettings) -> Duration {
        if self.events.is_empty() {
            settings.idle_tick_delay
        } else {
            settings.active_tick_delay
        }
    }
}

pub struct RosterCore {
    platform: Arc<dyn EventPlatform>,
    publisher: Publisher,
    store: StateStore,
    settings: RosterSettings,
}

impl RosterCore {
    pub fn new(
        platform: Arc<dyn EventPlatform>,
        roster_channel_id: &str,
        store: StateStore,
        settings: RosterSettings,
    ) -> Self {
        Self {
            publisher: Publisher::new(platform.clone(), roster_channel_id),
            platform,
            store,
            settings,
        }
    }

    /// Loads stored state and polls until the process exits.
    pub async fn start(&self) {
        let mut session = RosterSession::new(self.store.load().await);
        info!(
            "roster poller started with {} tracked event(s)",
            session.events.len()
        );

        loop {
            if let Err(err) = self.tick(&mut session).await {
                error!("roster update failed: {err}");
            }
            tokio::time::sleep(session.next_tick_delay(&self.settings)).await;
        }
    }

    /// Runs the poller in its own task and restarts it from the state file
    /// after a panic. The panic hook has already reported the panic.
    pub async fn supervise(self: Arc<Self>) {
        loop {
            let core = self.clone();
            match tokio::spawn(async move { core.start().await }).await {
                Ok(()) => return,
                Err(join_err) if join_err.is_panic() => {
                    warn!(
                        "roster poller panicked, restarting in {}s",
                        RESTART_DELAY.as_secs()
                    );
                }
                Err(join_err) => {
                    error!("roster poller task was cancelled: {join_err}");
                    return;
                }
            }
            tokio::time::sleep(RESTART_DELAY).await;
        }
    }

    /// One poll, reconcile, publish and persist pass.
    pub async fn tick(&self, session: &mut RosterSession) -> Result<()> {
        let events = self.platform.list_events().await?;
        info!("fetched {} event(s)", events.len());

        let event_delay = if events.is_empty() {
            Duration::ZERO
        } else {
            self.settings.event_delay
        };

        let fetched: HashSet<&str> = events.iter().map(|event| event.id.as_str()).collect();
        let removed: Vec<String> = session
            .events
            .keys()
            .filter(|id| !fetched.contains(id.as_str()))
            .cloned()
            .collect();

        for event_id in removed {
            if let Some(mut record) = session.events.remove(&event_id) {
                info!("event {event_id} '{}' is gone, closing roster", record.event_name);
                record.event_status = EventStatus::Past;
                self.publisher.finalize(&record).await;
            }
        }

        for event in &events {
            info!("processing event {}: '{}'", event.id, event.name);
            let usernames = self.fetch_roster(&event.id).await;

            let record = session
                .events
                .entry(event.id.clone())
                .or_insert_with(|| EventRecord::new(&event.name));
            record.rename(&event.name);

            let changes = reconcile(
                record,
                &usernames,
                self.settings.debounce_threshold,
                Utc::now().timestamp_millis(),
            );
            if !changes.is_empty() {
                info!(
                    "event {}: {} joined, {} returned, {} deregistered",
                    event.id,
                    changes.added.len(),
                    changes.resubscribed.len(),
                    changes.deregistered.len()
                );
            }
            record.event_status = EventStatus::from(event.status);

            if let Err(err) = self.publisher.publish(record).await {
                error!("failed to publish roster for event {}: {err}", event.id);
            }

            tokio::time::sleep(event_delay).await;
        }

        if let Err(err) = self.store.save(&session.events).await {
            error!("failed to save state: {err}");
        }
        info!("update completed");
        Ok(())
    }

    /// Current subscriber usernames; failures degrade to an empty roster so
    /// the debounce decides what happens to existing subscribers.
    async fn fetch_roster(&self, event_id: &str) -> Vec<String> {
        let platform = &self.platform;
        let outcome = retry_after(self.settings.retry, || async move {
            match platform.list_subscribers(event_id).await {
                Ok(SubscriberPage::RateLimited(wait)) => Attempt::RetryAfter(wait),
                other => Attempt::Ready(other),
            }
        })
        .await;

        match outcome {
            Ok(Ok(SubscriberPage::Users(usernames))) => usernames,
            Ok(Ok(SubscriberPage::Malformed(body))) => {
                error!("subscriber listing for event {event_id} is not an array: {body}");
                Vec::new()
            }
            Ok(Ok(SubscriberPage::RateLimited(_))) => Vec::new(),
            Ok(Err(err)) => {
                error!("failed to fetch subscribed users for event {event_id}: {err}");
                Vec::new()
            }
            Err(err) => {
                error!("subscriber listing for event {event_id}: {err}");
                Vec::new()
            }
        }
    }
}
