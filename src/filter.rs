use crate::config::{Config, FilterRules};

/// Why a message was or was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    /// Server, token or monitored list missing
    ConfigInvalid,
    NotMonitored,
    /// Blank text; dropped without a log line
    EmptyMessage,
    /// Rejected by the keyword rules
    Filtered,
}

pub fn is_config_valid(config: &Config) -> bool {
    !config.server().is_empty() && !config.token().is_empty() && !config.monitored_users.is_empty()
}

pub fn is_monitored_user(config: &Config, sender_id: &str) -> bool {
    config.monitored_users.iter().any(|id| id == sender_id)
}

/// Keyword gate. Exclude matches win over include matches; a non-empty
/// include list requires at least one hit. Disabled rules accept everything.
pub fn passes_keywords(rules: &FilterRules, text: &str) -> bool {
    if !rules.enable_filter {
        return true;
    }

    let text = text.to_lowercase();

    if rules
        .exclude_keywords
        .iter()
        .any(|kw| text.contains(&kw.to_lowercase()))
    {
        return false;
    }

    if rules.include_keywords.is_empty() {
        return true;
    }

    rules
        .include_keywords
        .iter()
        .any(|kw| text.contains(&kw.to_lowercase()))
}

/// Run every gate in order, stopping at the first failure.
pub fn evaluate(config: &Config, sender_id: &str, text: &str) -> Verdict {
    if !is_config_valid(config) {
        return Verdict::ConfigInvalid;
    }
    if !is_monitored_user(config, sender_id) {
        return Verdict::NotMonitored;
    }
    if text.trim().is_empty() {
        return Verdict::EmptyMessage;
    }
    if !passes_keywords(&config.filter_keywords, text) {
        return Verdict::Filtered;
    }
    Verdict::Forward
}

#[allow(dead_code)]
pub fn should_forward(config: &Config, sender_id: &str, text: &str) -> bool {
    evaluate(config, sender_id, text) == Verdict::Forward
}
