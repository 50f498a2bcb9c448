//! Best-effort display names for message senders.
//!
//! The platform hint wins when present. Otherwise a platform-specific probe
//! reads the raw sender and message records, and anything it cannot find
//! falls through to an id-based name. Probes only ever return `Option`.

use crate::platform::{InboundMessage, RawPayload};

pub const UNKNOWN_USER: &str = "未知用户";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlatformKind {
    Telegram,
    Qq,
    Wechat,
    Other,
}

impl PlatformKind {
    fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase();
        if tag == "telegram" {
            PlatformKind::Telegram
        } else if tag == "aiocqhttp" || tag.contains("qq") {
            PlatformKind::Qq
        } else if tag.contains("wechat") || tag.contains("wecom") {
            PlatformKind::Wechat
        } else {
            PlatformKind::Other
        }
    }
}

/// Resolve a human-readable name for the sender of `message`. Never empty.
pub fn resolve(message: &InboundMessage) -> String {
    let hint = message.sender_name.trim();
    if !hint.is_empty() {
        return message.sender_name.clone();
    }

    let probed = match PlatformKind::from_tag(&message.platform) {
        PlatformKind::Telegram => telegram_name(message),
        PlatformKind::Qq => qq_name(message),
        PlatformKind::Wechat => wechat_name(message),
        PlatformKind::Other => None,
    };

    probed.unwrap_or_else(|| fallback_name(&message.sender_id))
}

fn fallback_name(sender_id: &str) -> String {
    if sender_id.trim().is_empty() {
        UNKNOWN_USER.to_string()
    } else {
        format!("用户_{}", sender_id)
    }
}

/// Locate the Telegram "from" user record: `from` or `from_user` on the raw
/// message, then the sender record itself.
pub fn telegram_from_user(message: &InboundMessage) -> Option<RawPayload> {
    message
        .raw_message
        .as_ref()
        .and_then(|raw| raw.field("from").or_else(|| raw.field("from_user")))
        .or_else(|| message.sender.clone())
}

fn telegram_name(message: &InboundMessage) -> Option<String> {
    let user = telegram_from_user(message)?;
    telegram_user_name(&user)
}

/// `first_name [last_name]`, else `@username`.
fn telegram_user_name(user: &RawPayload) -> Option<String> {
    if let Some(first) = user.text("first_name") {
        let full = match user.text("last_name") {
            Some(last) => format!("{} {}", first.trim(), last.trim()),
            None => first.trim().to_string(),
        };
        return Some(full);
    }
    user.text("username")
        .map(|username| format!("@{}", username.trim()))
}

fn qq_name(message: &InboundMessage) -> Option<String> {
    let from_record = message.sender.as_ref().and_then(|sender| {
        ["nickname", "card", "title"]
            .iter()
            .find_map(|key| sender.text(key))
    });
    from_record.or_else(|| {
        let id = message.sender_id.trim();
        (!id.is_empty()).then(|| format!("QQ_{}", id))
    })
}

fn wechat_name(message: &InboundMessage) -> Option<String> {
    let from_record = message.sender.as_ref().and_then(|sender| {
        sender
            .text("nickname")
            .or_else(|| sender.text("remark"))
    });
    from_record.or_else(|| {
        let raw = message.raw_message.as_ref()?;
        raw.text("sender_name").or_else(|| raw.text("nickname"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(platform: &str, sender_id: &str, sender_name: &str) -> InboundMessage {
        InboundMessage {
            platform: platform.to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            text: "hello".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_hint_wins() {
        let msg = message("telegram", "42", "Alice");
        assert_eq!(resolve(&msg), "Alice");
    }

    #[test]
    fn test_whitespace_hint_is_not_a_name() {
        let mut msg = message("telegram", "42", "  ");
        msg.raw_message = Some(RawPayload::from(json!({
            "from": { "first_name": "Alice", "last_name": "Liddell" }
        })));
        assert_eq!(resolve(&msg), "Alice Liddell");
    }

    #[test]
    fn test_telegram_first_name_only() {
        let mut msg = message("Telegram", "42", "");
        msg.raw_message = Some(RawPayload::from(json!({
            "from_user": { "first_name": "Alice" }
        })));
        assert_eq!(resolve(&msg), "Alice");
    }

    #[test]
    fn test_telegram_username() {
        let mut msg = message("telegram", "42", "");
        msg.sender = Some(RawPayload::from(json!({ "username": "alice_l" })));
        assert_eq!(resolve(&msg), "@alice_l");
    }

    #[test]
    fn test_telegram_nothing_usable() {
        let mut msg = message("telegram", "42", "");
        msg.raw_message = Some(RawPayload::from(json!({ "from": "not a map" })));
        assert_eq!(resolve(&msg), "用户_42");
    }

    #[test]
    fn test_qq_priority_order() {
        let mut msg = message("aiocqhttp", "10001", "");
        msg.sender = Some(RawPayload::from(json!({
            "nickname": "",
            "card": "群名片",
            "title": "头衔"
        })));
        assert_eq!(resolve(&msg), "群名片");
    }

    #[test]
    fn test_qq_id_fallback() {
        let msg = message("qq_official", "10001", "");
        assert_eq!(resolve(&msg), "QQ_10001");
    }

    #[test]
    fn test_wechat_remark_then_raw_map() {
        let mut msg = message("gewechat", "wxid_1", "");
        msg.sender = Some(RawPayload::from(json!({ "remark": "老王" })));
        assert_eq!(resolve(&msg), "老王");

        let mut msg = message("gewechat", "wxid_1", "");
        msg.raw_message = Some(RawPayload::from(json!({ "sender_name": "小李" })));
        assert_eq!(resolve(&msg), "小李");
    }

    #[test]
    fn test_unknown_platform_falls_back_to_id() {
        let msg = message("discord", "777", "");
        assert_eq!(resolve(&msg), "用户_777");
    }

    #[test]
    fn test_no_id_is_unknown_user() {
        let msg = message("discord", "", " ");
        assert_eq!(resolve(&msg), UNKNOWN_USER);
    }
}
