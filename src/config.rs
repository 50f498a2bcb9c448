use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

pub const DEFAULT_TITLE_TEMPLATE: &str = "来自 {sender_name} 的消息";
pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "发送者：{sender_name}\n时间：{timestamp}\n内容：{message_content}";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub gotify_server: String,
    #[serde(default)]
    pub gotify_token: String,
    /// Sender ids allowed to be forwarded. Integers in the file are kept as
    /// their decimal string form.
    #[serde(default, deserialize_with = "deserialize_user_ids")]
    pub monitored_users: Vec<String>,
    #[serde(default = "default_priority")]
    pub gotify_priority: i64,
    #[serde(default = "default_enable_logging")]
    pub enable_logging: bool,
    #[serde(default)]
    pub filter_keywords: FilterRules,
    #[serde(default)]
    pub message_template: TemplateConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilterRules {
    #[serde(default)]
    pub enable_filter: bool,
    #[serde(default)]
    pub include_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplateConfig {
    #[serde(default = "default_title_template")]
    pub title_template: String,
    #[serde(default = "default_message_template")]
    pub message_template: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            title_template: default_title_template(),
            message_template: default_message_template(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserId {
    Int(i64),
    Text(String),
}

fn deserialize_user_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<UserId> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|id| match id {
            UserId::Int(n) => n.to_string(),
            UserId::Text(s) => s,
        })
        .collect())
}

fn default_priority() -> i64 {
    5
}

fn default_enable_logging() -> bool {
    true
}

fn default_title_template() -> String {
    DEFAULT_TITLE_TEMPLATE.to_string()
}

fn default_message_template() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Gotify server with surrounding whitespace removed; empty when unset.
    pub fn server(&self) -> &str {
        self.gotify_server.trim()
    }

    pub fn token(&self) -> &str {
        self.gotify_token.trim()
    }
}

#[cfg(test)]
pub(crate) fn test_config(server: &str, token: &str, users: &[&str]) -> Config {
    Config {
        gotify_server: server.to_string(),
        gotify_token: token.to_string(),
        monitored_users: users.iter().map(|u| u.to_string()).collect(),
        gotify_priority: default_priority(),
        enable_logging: true,
        filter_keywords: FilterRules::default(),
        message_template: TemplateConfig::default(),
        telegram: TelegramConfig {
            bot_token: "test-bot-token".to_string(),
        },
    }
}
