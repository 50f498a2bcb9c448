use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::filter::{self, Verdict};
use crate::gotify::{DeliveryResult, OutboundPayload, PushSender};
use crate::names;
use crate::platform::InboundMessage;
use crate::template::{self, TemplateVars};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Dropped silently: config incomplete, sender not monitored, or blank text
    Skipped,
    /// Rejected by keyword rules
    Filtered,
    Delivered,
    Failed(DeliveryResult),
    /// Unexpected failure inside the pipeline
    Aborted,
}

/// The forwarding pipeline. Holds the read-only configuration and the shared
/// push client; safe to share across concurrent message handlers.
pub struct Forwarder {
    pub config: Config,
    sender: Arc<dyn PushSender>,
}

impl Forwarder {
    pub fn new(config: Config, sender: Arc<dyn PushSender>) -> Self {
        if filter::is_config_valid(&config) {
            info!("Gotify forwarder initialized");
        } else {
            warn!("Gotify server, token or monitored users not configured; messages will not be forwarded");
        }
        Self { config, sender }
    }

    pub fn sender(&self) -> &dyn PushSender {
        self.sender.as_ref()
    }

    /// Entry point for every inbound message. Never fails: any error or
    /// panic in the pipeline is logged and the message is dropped.
    pub async fn on_message(&self, message: &InboundMessage) -> ForwardOutcome {
        match AssertUnwindSafe(self.process(message)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("Error while forwarding message: {:#}", e);
                ForwardOutcome::Aborted
            }
            Err(_) => {
                error!(
                    "Panic while forwarding message from {}",
                    message.sender_id
                );
                ForwardOutcome::Aborted
            }
        }
    }

    async fn process(&self, message: &InboundMessage) -> Result<ForwardOutcome> {
        match filter::evaluate(&self.config, &message.sender_id, &message.text) {
            Verdict::Forward => {}
            Verdict::Filtered => {
                if self.config.enable_logging {
                    info!(
                        "Message from {} blocked by keyword filter",
                        message.sender_id
                    );
                }
                return Ok(ForwardOutcome::Filtered);
            }
            Verdict::ConfigInvalid | Verdict::NotMonitored | Verdict::EmptyMessage => {
                return Ok(ForwardOutcome::Skipped);
            }
        }

        let payload = self.build_payload(message);

        match self.sender.send(&payload).await {
            DeliveryResult::Success => {
                if self.config.enable_logging {
                    info!("Forwarded message from {} to Gotify", message.sender_id);
                }
                Ok(ForwardOutcome::Delivered)
            }
            failure => {
                error!(
                    "Failed to forward message from {}: {}",
                    message.sender_id, failure
                );
                Ok(ForwardOutcome::Failed(failure))
            }
        }
    }

    /// Render the configured templates for `message`.
    pub fn build_payload(&self, message: &InboundMessage) -> OutboundPayload {
        let vars = TemplateVars {
            sender_name: names::resolve(message),
            user_id: message.sender_id.clone(),
            message_content: message.text.clone(),
            timestamp: template::now_timestamp(),
            platform: message.platform.clone(),
        };

        let templates = &self.config.message_template;
        let (title, body) =
            template::render(&templates.title_template, &templates.message_template, &vars);

        OutboundPayload {
            title,
            message: body,
            priority: self.config.gotify_priority,
        }
    }

    /// Close the shared push client. No sends succeed afterwards.
    pub async fn shutdown(&self) {
        self.sender.close().await;
        info!("Gotify forwarder stopped");
    }
}
