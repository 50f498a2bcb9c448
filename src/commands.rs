//! Replies for the `/gotify_test`, `/gotify_status` and `/gotify_debug`
//! chat commands. Every function returns reply text; failures are reported
//! in the text rather than as errors.

use tracing::error;

use crate::config::Config;
use crate::filter;
use crate::forwarder::Forwarder;
use crate::gotify::{DeliveryResult, OutboundPayload, PushSender};
use crate::names;
use crate::platform::{InboundMessage, RawPayload};
use crate::template;

pub const DEBUG_OUTPUT_LIMIT: usize = 4000;
const TRUNCATION_MARKER: &str = "\n...(输出已截断)";

const SENDER_FIELDS: &[&str] = &[
    "id",
    "user_id",
    "nickname",
    "card",
    "title",
    "remark",
    "first_name",
    "last_name",
    "username",
];

const MESSAGE_FIELDS: &[&str] = &[
    "message_id",
    "chat",
    "date",
    "text",
    "sender_name",
    "nickname",
];

const FROM_USER_FIELDS: &[&str] = &["id", "is_bot", "first_name", "last_name", "username"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Test,
    Status,
    Debug,
}

impl Command {
    /// Parse `/gotify_test`, `/gotify_status`, `/gotify_debug`, optionally
    /// addressed as `/cmd@botname` and followed by arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "gotify_test" => Some(Command::Test),
            "gotify_status" => Some(Command::Status),
            "gotify_debug" => Some(Command::Debug),
            _ => None,
        }
    }
}

pub async fn run(forwarder: &Forwarder, command: Command, message: &InboundMessage) -> String {
    match command {
        Command::Test => test(forwarder, message).await,
        Command::Status => status(&forwarder.config),
        Command::Debug => debug(message),
    }
}

/// Send a fixed test notification and report the outcome.
pub async fn test(forwarder: &Forwarder, message: &InboundMessage) -> String {
    if !filter::is_config_valid(&forwarder.config) {
        return "❌ Gotify 配置不完整，请检查配置".to_string();
    }

    let payload = OutboundPayload {
        title: "Gotify 转发插件测试".to_string(),
        message: format!(
            "测试消息发送成功！\n时间：{}\n发送者：{}",
            template::now_timestamp(),
            names::resolve(message)
        ),
        priority: 5,
    };

    match forwarder.sender().send(&payload).await {
        DeliveryResult::Success => "✅ Gotify 测试消息发送成功！".to_string(),
        failure => {
            error!("Gotify test notification failed: {}", failure);
            "❌ Gotify 测试消息发送失败，请检查配置和网络连接".to_string()
        }
    }
}

pub fn status(config: &Config) -> String {
    let mut lines = vec![
        "📊 Gotify 转发插件状态".to_string(),
        "=".repeat(30),
    ];

    let server = config.server();
    lines.push(format!(
        "🌐 Gotify 服务器：{}",
        if server.is_empty() { "未配置" } else { server }
    ));
    lines.push(format!(
        "🔑 Token 状态：{}",
        if config.token().is_empty() { "未配置" } else { "已配置" }
    ));
    lines.push(format!("👥 监听用户数量：{}", config.monitored_users.len()));
    if !config.monitored_users.is_empty() {
        lines.push(format!(
            "📝 监听用户列表：{}",
            config.monitored_users.join(", ")
        ));
    }

    let rules = &config.filter_keywords;
    if rules.enable_filter {
        lines.push("🔍 关键词过滤：已启用".to_string());
        if !rules.include_keywords.is_empty() {
            lines.push(format!(
                "   ✅ 包含关键词：{}",
                rules.include_keywords.join(", ")
            ));
        }
        if !rules.exclude_keywords.is_empty() {
            lines.push(format!(
                "   ❌ 排除关键词：{}",
                rules.exclude_keywords.join(", ")
            ));
        }
    } else {
        lines.push("🔍 关键词过滤：已禁用".to_string());
    }

    lines.push(format!("📊 消息优先级：{}", config.gotify_priority));
    lines.push(format!(
        "📝 详细日志：{}",
        if config.enable_logging { "已启用" } else { "已禁用" }
    ));

    lines.join("\n")
}

/// Diagnostic dump of what the pipeline sees for `message`.
pub fn debug(message: &InboundMessage) -> String {
    let mut lines = vec!["🔧 Gotify 转发插件调试信息".to_string(), "=".repeat(30)];

    lines.push(format!("平台：{}", or_missing(&message.platform)));
    lines.push(format!("发送者 ID：{}", or_missing(&message.sender_id)));
    lines.push(format!("平台提供的名称：{}", or_missing(&message.sender_name)));
    lines.push(format!("解析后的名称：{}", names::resolve(message)));

    lines.push(String::new());
    lines.push("[发送者原始数据]".to_string());
    describe_payload(&mut lines, message.sender.as_ref(), SENDER_FIELDS);

    lines.push(String::new());
    lines.push("[消息原始数据]".to_string());
    describe_payload(&mut lines, message.raw_message.as_ref(), MESSAGE_FIELDS);

    if message.platform.eq_ignore_ascii_case("telegram") {
        lines.push(String::new());
        lines.push("[Telegram from_user]".to_string());
        match names::telegram_from_user(message) {
            Some(user) => push_fields(&mut lines, &user, FROM_USER_FIELDS),
            None => lines.push("  ⚠️ 错误：未找到 from_user 记录".to_string()),
        }
    }

    truncate(lines.join("\n"), DEBUG_OUTPUT_LIMIT)
}

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        "(空)"
    } else {
        value
    }
}

fn describe_payload(lines: &mut Vec<String>, payload: Option<&RawPayload>, fields: &[&str]) {
    match payload {
        Some(payload) => {
            lines.push(format!("  类型：{}", payload.shape()));
            push_fields(lines, payload, fields);
        }
        None => lines.push("  ⚠️ 错误：没有可用的原始数据".to_string()),
    }
}

fn push_fields(lines: &mut Vec<String>, payload: &RawPayload, fields: &[&str]) {
    let mut found = 0;
    for name in fields {
        if let Some(value) = payload.field(name) {
            let rendered = value.as_text().unwrap_or_else(|| value.shape());
            lines.push(format!("  {} = {}", name, rendered));
            found += 1;
        }
    }
    if found == 0 {
        lines.push("  ⚠️ 错误：未读取到任何已知字段".to_string());
    }
}

/// Cut `text` to at most `limit` characters, appending a marker when cut.
fn truncate(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, FilterRules};
    use crate::forwarder::tests::{message, RecordingSender};
    use serde_json::json;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/gotify_test"), Some(Command::Test));
        assert_eq!(Command::parse("/gotify_status@my_bot"), Some(Command::Status));
        assert_eq!(Command::parse("/gotify_debug extra args"), Some(Command::Debug));
        assert_eq!(Command::parse("gotify_test"), None);
        assert_eq!(Command::parse("/start"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn test_command_rejects_incomplete_config() {
        let sender = RecordingSender::new(DeliveryResult::Success);
        let fwd = Forwarder::new(test_config("", "tok", &["42"]), sender.clone());

        let reply = test(&fwd, &message("42", "Alice", "/gotify_test")).await;
        assert_eq!(reply, "❌ Gotify 配置不完整，请检查配置");
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_command_sends_fixed_payload() {
        let sender = RecordingSender::new(DeliveryResult::Success);
        let fwd = Forwarder::new(
            test_config("https://g.example", "tok", &["42"]),
            sender.clone(),
        );

        let reply = run(&fwd, Command::Test, &message("7", "Carol", "/gotify_test")).await;
        assert_eq!(reply, "✅ Gotify 测试消息发送成功！");

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Gotify 转发插件测试");
        assert!(sent[0].message.ends_with("发送者：Carol"));
        assert_eq!(sent[0].priority, 5);
    }

    #[tokio::test]
    async fn test_command_reports_failure() {
        let sender = RecordingSender::new(DeliveryResult::TransportError("refused".into()));
        let fwd = Forwarder::new(test_config("https://g.example", "tok", &["42"]), sender);

        let reply = test(&fwd, &message("42", "Alice", "/gotify_test")).await;
        assert!(reply.starts_with("❌"));
    }

    #[test]
    fn test_status_unconfigured() {
        let out = status(&test_config("", "", &[]));
        assert!(out.contains("🌐 Gotify 服务器：未配置"));
        assert!(out.contains("🔑 Token 状态：未配置"));
        assert!(out.contains("👥 监听用户数量：0"));
        assert!(!out.contains("监听用户列表"));
        assert!(out.contains("🔍 关键词过滤：已禁用"));
        assert!(out.contains("📊 消息优先级：5"));
        assert!(out.contains("📝 详细日志：已启用"));
    }

    #[test]
    fn test_status_configured_hides_token() {
        let mut config = test_config("https://g.example", "secret-token", &["42", "43"]);
        config.filter_keywords = FilterRules {
            enable_filter: true,
            include_keywords: vec!["urgent".into()],
            exclude_keywords: vec!["spam".into(), "ad".into()],
        };
        config.enable_logging = false;

        let out = status(&config);
        assert!(out.contains("🌐 Gotify 服务器：https://g.example"));
        assert!(out.contains("🔑 Token 状态：已配置"));
        assert!(!out.contains("secret-token"));
        assert!(out.contains("👥 监听用户数量：2"));
        assert!(out.contains("📝 监听用户列表：42, 43"));
        assert!(out.contains("🔍 关键词过滤：已启用"));
        assert!(out.contains("   ✅ 包含关键词：urgent"));
        assert!(out.contains("   ❌ 排除关键词：spam, ad"));
        assert!(out.contains("📝 详细日志：已禁用"));
    }

    #[test]
    fn test_debug_telegram_dump() {
        let mut msg = message("42", "", "/gotify_debug");
        msg.raw_message = Some(RawPayload::from(json!({
            "message_id": 9,
            "from": { "id": 42, "is_bot": false, "first_name": "Alice", "username": "alice" }
        })));

        let out = debug(&msg);
        assert!(out.contains("平台：telegram"));
        assert!(out.contains("发送者 ID：42"));
        assert!(out.contains("平台提供的名称：(空)"));
        assert!(out.contains("解析后的名称：Alice"));
        assert!(out.contains("  message_id = 9"));
        assert!(out.contains("[Telegram from_user]"));
        assert!(out.contains("  first_name = Alice"));
        assert!(out.contains("  is_bot = false"));
        // no raw sender record attached
        assert!(out.contains("没有可用的原始数据"));
    }

    #[test]
    fn test_debug_missing_from_user_is_reported() {
        let msg = message("42", "Alice", "/gotify_debug");
        let out = debug(&msg);
        assert!(out.contains("未找到 from_user 记录"));
    }

    #[test]
    fn test_debug_output_truncated() {
        let mut msg = message("42", "Alice", "/gotify_debug");
        msg.raw_message = Some(RawPayload::from(json!({ "text": "字".repeat(5000) })));

        let out = debug(&msg);
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            out.chars().count(),
            DEBUG_OUTPUT_LIMIT + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("short".to_string(), 10), "short");
    }

    #[tokio::test]
    async fn test_run_dispatches_status() {
        let fwd = Forwarder::new(
            test_config("https://g.example", "tok", &["42"]),
            RecordingSender::new(DeliveryResult::Success),
        );
        let reply = run(&fwd, Command::Status, &message("42", "Alice", "/gotify_status")).await;
        assert!(reply.starts_with("📊 Gotify 转发插件状态"));
    }
}
