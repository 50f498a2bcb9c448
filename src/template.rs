//! `{name}` placeholder substitution for notification titles and bodies.

use thiserror::Error;
use tracing::error;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown template variable '{0}'")]
    UnknownVariable(String),

    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),

    #[error("unmatched '}}' at byte {0}")]
    Unmatched(usize),
}

/// Per-message values available to templates.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub sender_name: String,
    pub user_id: String,
    pub message_content: String,
    pub timestamp: String,
    pub platform: String,
}

impl TemplateVars {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "sender_name" => Some(&self.sender_name),
            "user_id" => Some(&self.user_id),
            "message_content" => Some(&self.message_content),
            "timestamp" => Some(&self.timestamp),
            "platform" => Some(&self.platform),
            _ => None,
        }
    }
}

/// Current local time in the template timestamp format.
pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Substitute every `{name}` in `template`. `{{` and `}}` are literal braces.
pub fn substitute(template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(pos));
                }
                let value = vars
                    .lookup(name.trim())
                    .ok_or(TemplateError::UnknownVariable(name))?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::Unmatched(pos));
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

pub fn fallback_title(sender_name: &str) -> String {
    format!("来自 {} 的消息", sender_name)
}

pub fn fallback_body(vars: &TemplateVars) -> String {
    format!(
        "发送者：{}\n时间：{}\n内容：{}",
        vars.sender_name, vars.timestamp, vars.message_content
    )
}

/// Render both templates. If either fails, both are replaced by the fixed
/// fallback pair so delivery can go ahead.
pub fn render(title_template: &str, body_template: &str, vars: &TemplateVars) -> (String, String) {
    let rendered = substitute(title_template, vars)
        .and_then(|title| substitute(body_template, vars).map(|body| (title, body)));

    match rendered {
        Ok(pair) => pair,
        Err(e) => {
            error!("Template rendering failed, using fallback format: {}", e);
            (fallback_title(&vars.sender_name), fallback_body(vars))
        }
    }
}
