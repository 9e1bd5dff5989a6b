use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Event records keyed by scheduled-event id.
pub type EventRecords = BTreeMap<String, EventRecord>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    #[serde(alias = "(upcoming)")]
    Upcoming,
    #[serde(alias = "(currently happening)")]
    Happening,
    #[serde(alias = "(past event)")]
    Past,
}

impl EventStatus {
    pub fn label(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "(upcoming)",
            EventStatus::Happening => "(currently happening)",
            EventStatus::Past => "(past event)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// First time the user was seen subscribed, epoch milliseconds.
    pub timestamp: i64,
    /// Consecutive polls the user has been missing from the fetched roster.
    #[serde(default)]
    pub api_check_counter: u32,
}

impl Subscription {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            api_check_counter: 0,
        }
    }
}

/// Username-keyed mapping that keeps first-insertion order.
///
/// Serialized as a list of `[name, value]` pairs so the order and the string
/// keys survive a JSON round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster<V>(Vec<(String, V)>);

impl<V> Default for Roster<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Roster<V> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.position(name).map(|idx| &self.0[idx].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.position(name).map(|idx| &mut self.0[idx].1)
    }

    /// Inserts or replaces; a replaced entry keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.0[idx].1, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.position(name).map(|idx| self.0.remove(idx).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.0.iter_mut().map(|(name, value)| (name.as_str(), value))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(existing, _)| existing == name)
    }
}

impl<V> FromIterator<(String, V)> for Roster<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut roster = Roster::default();
        for (name, value) in iter {
            roster.insert(name, value);
        }
        roster
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub event_name: String,
    pub event_message: String,
    #[serde(default)]
    pub event_status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub subscribed_users: Roster<Subscription>,
    #[serde(default)]
    pub unsubscribed_users: Roster<i64>,
}

impl EventRecord {
    pub fn new(event_name: &str) -> Self {
        Self {
            event_name: event_name.to_string(),
            event_message: display_prefix(event_name),
            event_status: EventStatus::default(),
            message_id: None,
            subscribed_users: Roster::default(),
            unsubscribed_users: Roster::default(),
        }
    }

    /// Follows a rename on the remote side. Returns true when the name changed.
    pub fn rename(&mut self, event_name: &str) -> bool {
        if self.event_name == event_name {
            return false;
        }
        self.event_name = event_name.to_string();
        self.event_message = display_prefix(event_name);
        true
    }
}

fn display_prefix(event_name: &str) -> String {
    format!("**Registered players for {event_name}** ")
}
