use std::panic::PanicHookInfo;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::platform::EventPlatform;
use crate::utils;

/// Forwards process-level faults to the operator channel.
pub struct FaultReporter {
    platform: Arc<dyn EventPlatform>,
    channel_id: String,
    receiver: mpsc::UnboundedReceiver<String>,
}

#[derive(Clone)]
pub struct FaultSender(mpsc::UnboundedSender<String>);

impl FaultSender {
    pub fn report(&self, description: impl Into<String>) {
        if self.0.send(description.into()).is_err() {
            warn!("fault reporter is gone, dropping fault notice");
        }
    }
}

impl FaultReporter {
    pub fn new(platform: Arc<dyn EventPlatform>, channel_id: impl Into<String>) -> (Self, FaultSender) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                platform,
                channel_id: channel_id.into(),
                receiver,
            },
            FaultSender(sender),
        )
    }

    pub async fn run(mut self) {
        while let Some(description) = self.receiver.recv().await {
            let notice = fault_notice(&utils::timestamp(), &description);
            if let Err(err) = self.platform.send_message(&self.channel_id, &notice).await {
                error!("failed to report fault to log channel: {err}");
            }
        }
    }
}

/// Logs panics and hands them to the reporter; the default hook still runs.
pub fn install_panic_hook(sender: FaultSender) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let description = describe_panic(info);
        error!("uncaught panic: {description}");
        sender.report(description);
        default_hook(info);
    }));
}

fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    match info.location() {
        Some(location) => format!("{message} at {}:{}", location.file(), location.line()),
        None => message,
    }
}

pub fn fault_notice(timestamp: &str, description: &str) -> String {
    format!("[{timestamp}] Uncaught panic: {description}")
}
