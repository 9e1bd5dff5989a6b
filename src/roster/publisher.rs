use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::render::render_roster;
use crate::platform::EventPlatform;
use crate::store::EventRecord;

/// Keeps one roster message per event in the roster channel.
#[derive(Clone)]
pub struct Publisher {
    platform: Arc<dyn EventPlatform>,
    channel_id: String,
}

impl Publisher {
    pub fn new(platform: Arc<dyn EventPlatform>, channel_id: impl Into<String>) -> Self {
        Self {
            platform,
            channel_id: channel_id.into(),
        }
    }

    /// Edits the event's message, or posts a new one when there is none or
    /// the old one can no longer be edited. Records the id of a new message.
    pub async fn publish(&self, record: &mut EventRecord) -> Result<()> {
        let content = render_roster(record);

        if let Some(message_id) = record.message_id.as_deref() {
            match self
                .platform
                .edit_message(&self.channel_id, message_id, &content)
                .await
            {
                Ok(()) => {
                    debug!("updated roster message {message_id}");
                    return Ok(());
                }
                Err(err) => {
                    warn!("failed to edit roster message {message_id}, posting a new one: {err}");
                }
            }
        }

        let message_id = self
            .platform
            .send_message(&self.channel_id, &content)
            .await?;
        info!(
            "posted roster message {message_id} for '{}'",
            record.event_name
        );
        record.message_id = Some(message_id);
        Ok(())
    }

    /// Last update for an event that disappeared upstream. Only an existing
    /// message is touched.
    pub async fn finalize(&self, record: &EventRecord) {
        let Some(message_id) = record.message_id.as_deref() else {
            debug!(
                "event '{}' ended without a roster message",
                record.event_name
            );
            return;
        };

        let content = render_roster(record);
        if let Err(err) = self
            .platform
            .edit_message(&self.channel_id, message_id, &content)
            .await
        {
            error!("failed to finalize roster message {message_id}: {err}");
        }
    }
}
