use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{EventRecords, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    #[serde(default)]
    event_data: EventRecords,
}

/// JSON file holding the event records between restarts.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored records; a missing or unreadable file yields an empty map.
    pub async fn load(&self) -> EventRecords {
        match self.try_load().await {
            Ok(events) => {
                info!(
                    "loaded {} event record(s) from {}",
                    events.len(),
                    self.path.display()
                );
                events
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    "no state file at {}, starting with empty state",
                    self.path.display()
                );
                EventRecords::new()
            }
            Err(err) => {
                error!("failed to load state from {}: {err}", self.path.display());
                EventRecords::new()
            }
        }
    }

    pub async fn try_load(&self) -> Result<EventRecords, StoreError> {
        let raw = tokio::fs::read(&self.path).await?;
        let state: StateFile = serde_json::from_slice(&raw)?;
        Ok(state.event_data)
    }

    pub async fn save(&self, events: &EventRecords) -> Result<(), StoreError> {
        let state = StateFile {
            event_data: events.clone(),
        };
        let raw = serde_json::to_vec_pretty(&state)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!(
            "saved {} event record(s) to {}",
            events.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::StateStore;
    use crate::store::{EventRecord, EventRecords, EventStatus, Subscription};

    fn sample_state() -> EventRecords {
        let mut cup = EventRecord::new("Winter Cup");
        cup.message_id = Some("1113151362507755600".to_string());
        cup.event_status = EventStatus::Upcoming;
        cup.subscribed_users.insert("zoe", Subscription::new(30));
        cup.subscribed_users.insert(
            "alice",
            Subscription {
                timestamp: 10,
                api_check_counter: 4,
            },
        );
        cup.unsubscribed_users.insert("bob", 20);

        let mut league = EventRecord::new("League Night");
        league.event_status = EventStatus::Happening;
        league.subscribed_users.insert("carol", Subscription::new(40));

        let mut state = EventRecords::new();
        state.insert("1001".to_string(), cup);
        state.insert("1002".to_string(), league);
        state
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        let store = StateStore::new(dir.path().join("data.json"));
        let state = sample_state();

        store.save(&state).await.expect("save");
        let loaded = store.try_load().await.expect("load");

        assert_eq!(loaded, state);
        let order: Vec<_> = loaded["1001"].subscribed_users.names().collect();
        assert_eq!(order, vec!["zoe", "alice"]);
        assert!(loaded["1002"].unsubscribed_users.is_empty());
    }

    #[tokio::test]
    async fn saved_file_wraps_records_in_event_data() {
        let dir = TempDir::new().expect("temp dir");
        let store = StateStore::new(dir.path().join("data.json"));

        store.save(&sample_state()).await.expect("save");
        let raw = std::fs::read_to_string(store.path()).expect("read");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");

        assert!(value["eventData"]["1001"]["subscribedUsers"].is_array());
        assert_eq!(value["eventData"]["1001"]["unsubscribedUsers"][0][0], "bob");
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let store = StateStore::new(dir.path().join("absent.json"));

        let err = store.try_load().await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{ \"eventData\": ").expect("write");
        let store = StateStore::new(path);

        let err = store.try_load().await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn file_without_event_data_loads_empty() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{}").expect("write");

        let loaded = StateStore::new(path).try_load().await.expect("load");
        assert!(loaded.is_empty());
    }
}
