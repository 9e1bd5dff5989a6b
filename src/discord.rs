use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::{debug, error, info};

use serenity::all::{
    ChannelId, Client as SerenityClient, Context as SerenityContext, CreateMessage, EditMessage,
    EventHandler as SerenityEventHandler, GatewayIntents, GuildId, Http, MessageId, Ready,
    ScheduledEventStatus,
};
use tokio::sync::{Mutex as AsyncMutex, RwLock, oneshot};
use tokio::time::Instant;

use crate::config::Config;
use crate::platform::{EventPlatform, RemoteEvent, RemoteEventStatus, SubscriberPage};

const INITIAL_LOGIN_RETRY_SECONDS: u64 = 2;
const MAX_LOGIN_RETRY_SECONDS: u64 = 300;
const READY_TIMEOUT_SECONDS: u64 = 30;

/// Identity reported by the gateway once the bot is connected.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub user_id: u64,
    pub name: String,
    pub online_since: Instant,
}

impl BotIdentity {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

pub struct DiscordClient {
    config: Arc<Config>,
    guild_id: GuildId,
    login_state: AsyncMutex<DiscordLoginState>,
    http: RwLock<Option<Arc<Http>>>,
    rest: reqwest::Client,
}

#[derive(Default)]
struct DiscordLoginState {
    identity: Option<BotIdentity>,
    gateway_task: Option<tokio::task::JoinHandle<()>>,
}

struct ReadySignalHandler {
    ready_sender: AsyncMutex<Option<oneshot::Sender<(Arc<Http>, BotIdentity)>>>,
}

#[serenity::async_trait]
impl SerenityEventHandler for ReadySignalHandler {
    async fn ready(&self, ctx: SerenityContext, ready: Ready) {
        info!(
            "discord gateway ready as {} ({})",
            ready.user.name, ready.user.id
        );
        if let Some(sender) = self.ready_sender.lock().await.take() {
            let identity = BotIdentity {
                user_id: ready.user.id.get(),
                name: ready.user.name.clone(),
                online_since: Instant::now(),
            };
            let _ = sender.send((ctx.http.clone(), identity));
        }
    }
}

impl From<ScheduledEventStatus> for RemoteEventStatus {
    fn from(status: ScheduledEventStatus) -> Self {
        RemoteEventStatus::from_code(u8::from(status))
    }
}

fn parse_snowflake(kind: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| anyhow!("invalid {kind} id: {value}"))
}

fn subscribers_url(api_base_url: &str, guild_id: GuildId, event_id: &str) -> String {
    format!(
        "{}/guilds/{}/scheduled-events/{}/users",
        api_base_url.trim_end_matches('/'),
        guild_id,
        event_id
    )
}

impl DiscordClient {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("initializing discord client");
        let guild_id = GuildId::new(parse_snowflake("guild", &config.discord.guild_id)?);
        Ok(Self {
            config,
            guild_id,
            login_state: AsyncMutex::new(DiscordLoginState::default()),
            http: RwLock::new(None),
            rest: reqwest::Client::new(),
        })
    }

    pub async fn login(&self) -> Result<BotIdentity> {
        let mut state = self.login_state.lock().await;
        if let Some(identity) = &state.identity {
            return Ok(identity.clone());
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let event_handler = ReadySignalHandler {
            ready_sender: AsyncMutex::new(Some(ready_tx)),
        };

        let mut gateway_client =
            SerenityClient::builder(&self.config.discord.bot_token, GatewayIntents::GUILDS)
                .event_handler(event_handler)
                .await
                .map_err(|err| anyhow!("failed to build discord gateway client: {err}"))?;

        let gateway_task = tokio::spawn(async move {
            if let Err(err) = gateway_client.start().await {
                error!("discord gateway stopped: {err}");
            }
        });

        match tokio::time::timeout(Duration::from_secs(READY_TIMEOUT_SECONDS), ready_rx).await {
            Ok(Ok((http, identity))) => {
                *self.http.write().await = Some(http);
                state.identity = Some(identity.clone());
                state.gateway_task = Some(gateway_task);
                info!("discord bot login succeeded and gateway is connected");
                Ok(identity)
            }
            Ok(Err(_)) => {
                gateway_task.abort();
                Err(anyhow!("discord gateway exited before receiving Ready event"))
            }
            Err(_) => {
                gateway_task.abort();
                Err(anyhow!("timed out waiting for discord Ready event"))
            }
        }
    }

    /// Logs in, retrying with exponential backoff until the gateway is ready.
    pub async fn start(&self) -> BotIdentity {
        let mut retry_seconds = INITIAL_LOGIN_RETRY_SECONDS;

        loop {
            match self.login().await {
                Ok(identity) => {
                    info!("discord client is ready");
                    return identity;
                }
                Err(err) => {
                    error!(
                        "failed to start discord client: {err}. retrying in {} seconds",
                        retry_seconds
                    );
                    tokio::time::sleep(Duration::from_secs(retry_seconds)).await;
                    retry_seconds = (retry_seconds * 2).min(MAX_LOGIN_RETRY_SECONDS);
                }
            }
        }
    }

    pub async fn stop(&self) {
        let mut state = self.login_state.lock().await;
        if let Some(gateway_task) = state.gateway_task.take() {
            gateway_task.abort();
            match gateway_task.await {
                Ok(()) => info!("discord gateway task exited"),
                Err(join_err) if join_err.is_cancelled() => info!("discord gateway task aborted"),
                Err(join_err) => error!("discord gateway task join error: {join_err}"),
            }
        }
        state.identity = None;
        *self.http.write().await = None;
        info!("discord client stopped");
    }

    async fn http(&self) -> Result<Arc<Http>> {
        self.http
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow!("discord http client not available"))
    }
}

#[async_trait]
impl EventPlatform for DiscordClient {
    async fn list_events(&self) -> Result<Vec<RemoteEvent>> {
        let http = self.http().await?;
        let events = http
            .get_scheduled_events(self.guild_id, false)
            .await
            .map_err(|e| anyhow!("failed to fetch scheduled events: {}", e))?;

        Ok(events
            .into_iter()
            .map(|event| RemoteEvent {
                id: event.id.to_string(),
                name: event.name,
                status: RemoteEventStatus::from(event.status),
            })
            .collect())
    }

    async fn list_subscribers(&self, event_id: &str) -> Result<SubscriberPage> {
        let url = subscribers_url(&self.config.discord.api_base_url, self.guild_id, event_id);
        debug!("fetching subscribers from {}", url);

        let response = self
            .rest
            .get(&url)
            .header(AUTHORIZATION, format!("Bot {}", self.config.discord.bot_token))
            .send()
            .await
            .map_err(|e| anyhow!("subscriber request for event {} failed: {}", event_id, e))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| anyhow!("subscriber response for event {} ({}) was not JSON: {}", event_id, status, e))?;

        Ok(SubscriberPage::from_json(body))
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<String> {
        let http = self.http().await?;
        let channel = ChannelId::new(parse_snowflake("channel", channel_id)?);

        let message = channel
            .send_message(&*http, CreateMessage::new().content(content))
            .await
            .map_err(|e| anyhow!("direct message send failed: {}", e))?;

        info!("sent message directly to channel {}, message_id={}", channel_id, message.id);
        Ok(message.id.to_string())
    }

    async fn edit_message(&self, channel_id: &str, message_id: &str, content: &str) -> Result<()> {
        let http = self.http().await?;
        let channel = ChannelId::new(parse_snowflake("channel", channel_id)?);
        let message_id = MessageId::new(parse_snowflake("message", message_id)?);

        let message = channel
            .edit_message(&*http, message_id, EditMessage::new().content(content))
            .await
            .map_err(|e| anyhow!("direct message edit failed: {}", e))?;

        debug!("edited message in channel {}, message_id={}", channel_id, message.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serenity::all::{GuildId, ScheduledEventStatus};

    use super::{BotIdentity, parse_snowflake, subscribers_url};
    use crate::platform::RemoteEventStatus;

    #[test]
    fn subscribers_url_targets_event_users() {
        let url = subscribers_url(
            "https://discord.com/api/v9/",
            GuildId::new(199916140183420928),
            "1200000000000000000",
        );

        assert_eq!(
            url,
            "https://discord.com/api/v9/guilds/199916140183420928/scheduled-events/1200000000000000000/users"
        );
    }

    #[test]
    fn parse_snowflake_rejects_garbage() {
        assert_eq!(parse_snowflake("channel", " 42 ").unwrap(), 42);
        assert!(parse_snowflake("channel", "0").is_err());
        assert!(parse_snowflake("message", "mock:1").is_err());
    }

    #[test]
    fn serenity_status_maps_to_remote_status() {
        assert_eq!(
            RemoteEventStatus::from(ScheduledEventStatus::Active),
            RemoteEventStatus::Active
        );
        assert_eq!(
            RemoteEventStatus::from(ScheduledEventStatus::Completed),
            RemoteEventStatus::Completed
        );
        assert_eq!(
            RemoteEventStatus::from(ScheduledEventStatus::Canceled),
            RemoteEventStatus::Canceled
        );
    }

    #[test]
    fn identity_mentions_by_user_id() {
        let identity = BotIdentity {
            user_id: 1113151362507755000,
            name: "WinterBot".to_string(),
            online_since: tokio::time::Instant::now(),
        };
        assert_eq!(identity.mention(), "<@1113151362507755000>");
    }
}
