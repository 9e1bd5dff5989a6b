use std::collections::HashSet;

use crate::platform::RemoteEventStatus;
use crate::store::{EventRecord, EventStatus, Subscription};

impl From<RemoteEventStatus> for EventStatus {
    fn from(status: RemoteEventStatus) -> Self {
        match status {
            RemoteEventStatus::Completed => EventStatus::Past,
            RemoteEventStatus::Active => EventStatus::Happening,
            _ => EventStatus::Upcoming,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RosterChanges {
    pub added: Vec<String>,
    pub resubscribed: Vec<String>,
    pub deregistered: Vec<String>,
}

impl RosterChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.resubscribed.is_empty() && self.deregistered.is_empty()
    }
}

/// Folds one poll's usernames into the record.
///
/// Present users get their miss counter cleared; absent ones accumulate
/// misses and are demoted once the counter reaches `threshold`.
pub fn reconcile(
    record: &mut EventRecord,
    current: &[String],
    threshold: u32,
    now_ms: i64,
) -> RosterChanges {
    let mut changes = RosterChanges::default();
    let present: HashSet<&str> = current.iter().map(String::as_str).collect();

    for username in current {
        match record.subscribed_users.get_mut(username) {
            Some(subscription) => subscription.api_check_counter = 0,
            None => {
                record
                    .subscribed_users
                    .insert(username.clone(), Subscription::new(now_ms));
                changes.added.push(username.clone());
            }
        }
        if record.unsubscribed_users.remove(username).is_some() {
            changes.resubscribed.push(username.clone());
        }
    }

    for (username, subscription) in record.subscribed_users.iter_mut() {
        if !present.contains(username) {
            subscription.api_check_counter += 1;
            if subscription.api_check_counter >= threshold {
                changes.deregistered.push(username.to_string());
            }
        }
    }

    for username in &changes.deregistered {
        record.subscribed_users.remove(username);
        record.unsubscribed_users.insert(username.clone(), now_ms);
    }

    changes
}
