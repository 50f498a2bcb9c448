use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{debug, info, warn};

use crate::commands::{self, Command};
use crate::forwarder::Forwarder;
use crate::platform::{Attributes, InboundMessage, RawPayload};

pub const PLATFORM: &str = "telegram";

impl Attributes for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn attr(&self, name: &str) -> Option<RawPayload> {
        match name {
            "id" => Some(RawPayload::from(self.id.0)),
            "is_bot" => Some(RawPayload::from(self.is_bot)),
            "first_name" => Some(RawPayload::from(self.first_name.as_str())),
            "last_name" => self.last_name.as_deref().map(RawPayload::from),
            "username" => self.username.as_deref().map(RawPayload::from),
            "language_code" => self.language_code.as_deref().map(RawPayload::from),
            _ => None,
        }
    }
}

/// Build a platform-neutral message. Returns `None` for messages without a
/// sender (channel posts).
pub fn inbound_from_message(msg: &Message) -> Option<InboundMessage> {
    let user = msg.from.as_ref()?;
    let text = msg.text().or_else(|| msg.caption()).unwrap_or_default();

    let raw_message = match serde_json::to_value(msg) {
        Ok(value) => Some(RawPayload::Value(value)),
        Err(e) => {
            debug!("Could not serialize Telegram message: {}", e);
            None
        }
    };

    Some(InboundMessage {
        platform: PLATFORM.to_string(),
        sender_id: user.id.0.to_string(),
        sender_name: user.first_name.clone(),
        sender: Some(RawPayload::Object(Arc::new(user.clone()))),
        raw_message,
        text: text.to_string(),
    })
}

/// Run the Telegram bot platform until Ctrl-C
pub async fn run(forwarder: Arc<Forwarder>, bot_token: &str) -> Result<()> {
    let bot = Bot::new(bot_token);

    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![forwarder])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, forwarder: Arc<Forwarder>) -> ResponseResult<()> {
    let incoming = match inbound_from_message(&msg) {
        Some(incoming) => incoming,
        None => return Ok(()),
    };

    if let Some(command) = Command::parse(&incoming.text) {
        info!(
            "Telegram command {:?} from {}",
            command, incoming.sender_id
        );
        let reply = commands::run(&forwarder, command, &incoming).await;
        bot.send_message(msg.chat.id, reply).await?;
        return Ok(());
    }

    forwarder.on_message(&incoming).await;
    Ok(())
}
