use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{EventPlatform, RemoteEvent, RemoteEventStatus, SubscriberPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel_id: String,
    pub message_id: String,
    pub content: String,
}

/// In-memory platform: scripted events and rosters, recorded messages.
#[derive(Default)]
pub struct MockPlatform {
    events: Mutex<Vec<RemoteEvent>>,
    rosters: Mutex<HashMap<String, VecDeque<SubscriberPage>>>,
    sent: Mutex<Vec<PostedMessage>>,
    edited: Mutex<Vec<PostedMessage>>,
    deleted_messages: Mutex<HashSet<String>>,
    subscriber_calls: AtomicU64,
    fail_event_listing: Mutex<bool>,
    panic_next_listing: AtomicBool,
    next_message_id: AtomicU64,
}

pub fn event(id: &str, name: &str, status: RemoteEventStatus) -> RemoteEvent {
    RemoteEvent {
        id: id.to_string(),
        name: name.to_string(),
        status,
    }
}

pub fn users(names: &[&str]) -> SubscriberPage {
    SubscriberPage::Users(names.iter().map(|name| name.to_string()).collect())
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicU64::new(5000),
            ..Default::default()
        }
    }

    pub fn set_events(&self, events: Vec<RemoteEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn fail_event_listing(&self, fail: bool) {
        *self.fail_event_listing.lock().unwrap() = fail;
    }

    /// The next event listing panics instead of answering.
    pub fn panic_next_listing(&self) {
        self.panic_next_listing.store(true, Ordering::SeqCst);
    }

    /// Queues responses for an event; the last one repeats once the queue drains.
    pub fn push_roster(&self, event_id: &str, page: SubscriberPage) {
        self.rosters
            .lock()
            .unwrap()
            .entry(event_id.to_string())
            .or_default()
            .push_back(page);
    }

    pub fn set_roster(&self, event_id: &str, page: SubscriberPage) {
        self.rosters
            .lock()
            .unwrap()
            .insert(event_id.to_string(), VecDeque::from([page]));
    }

    pub fn delete_message(&self, message_id: &str) {
        self.deleted_messages
            .lock()
            .unwrap()
            .insert(message_id.to_string());
    }

    pub fn sent(&self) -> Vec<PostedMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn edited(&self) -> Vec<PostedMessage> {
        self.edited.lock().unwrap().clone()
    }

    pub fn subscriber_calls(&self) -> u64 {
        self.subscriber_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPlatform for MockPlatform {
    async fn list_events(&self) -> Result<Vec<RemoteEvent>> {
        if self.panic_next_listing.swap(false, Ordering::SeqCst) {
            panic!("event listing blew up");
        }
        if *self.fail_event_listing.lock().unwrap() {
            return Err(anyhow!("gateway unavailable"));
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn list_subscribers(&self, event_id: &str) -> Result<SubscriberPage> {
        self.subscriber_calls.fetch_add(1, Ordering::SeqCst);
        let mut rosters = self.rosters.lock().unwrap();
        let Some(queue) = rosters.get_mut(event_id) else {
            return Ok(SubscriberPage::Users(Vec::new()));
        };
        let page = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        page.ok_or_else(|| anyhow!("no roster scripted for {event_id}"))
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<String> {
        let message_id = self
            .next_message_id
            .fetch_add(1, Ordering::SeqCst)
            .to_string();
        self.sent.lock().unwrap().push(PostedMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.clone(),
            content: content.to_string(),
        });
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<()> {
        if self.deleted_messages.lock().unwrap().contains(message_id) {
            return Err(anyhow!("Unknown Message"));
        }
        self.edited.lock().unwrap().push(PostedMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}
