// Logging utilities
// Structured logging with JSON and human-readable formats, plus secret masking.
//
// Call sites tag messages with `[PHASE: ...]` and `[STEP: ...]`; the formatters below lift those
// tags out of the message text into their own fields.

use log::Level;
use serde_json::{json, Map, Value};

/// Mask sensitive data in logs (tokens, user ids).
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Mask an `Authorization` header value (`Bearer <token>`), keeping the scheme visible.
pub fn mask_bearer_token(header_value: &str) -> String {
    let trimmed = header_value.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.split_once(' ') {
        Some((scheme, _)) => format!("{} ***", scheme),
        None => "***".to_string(),
    }
}

/// `[PHASE: ...]` / `[STEP: ...]` tags pulled out of a log message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogMetadata {
    pub phase: Option<String>,
    pub step: Option<String>,
    pub message: String,
}

/// Remove the first `[<tag>: value]` from `message`, returning the value and the remaining text.
fn take_tag(message: &str, tag: &str) -> (Option<String>, String) {
    let opener = format!("[{}:", tag);
    let Some(start) = message.find(&opener) else {
        return (None, message.to_string());
    };
    let Some(len) = message[start..].find(']') else {
        return (None, message.to_string());
    };
    let value = message[start + opener.len()..start + len].trim().to_string();
    let rest = format!("{} {}", &message[..start], &message[start + len + 1..]);
    (Some(value), rest.trim().to_string())
}

pub fn parse_log_metadata(message: &str) -> LogMetadata {
    let (phase, rest) = take_tag(message, "PHASE");
    let (step, rest) = take_tag(&rest, "STEP");
    LogMetadata {
        phase,
        step,
        message: rest,
    }
}

/// One JSON object per line for the structured log file.
pub fn format_json_log(timestamp: &str, level: Level, target: &str, meta: &LogMetadata) -> String {
    let mut entry = Map::new();
    entry.insert("timestamp".into(), json!(timestamp));
    entry.insert("level".into(), json!(level.as_str()));
    entry.insert("target".into(), json!(target));
    entry.insert("message".into(), json!(meta.message));
    if let Some(phase) = &meta.phase {
        entry.insert("phase".into(), json!(phase));
    }
    if let Some(step) = &meta.step {
        entry.insert("step".into(), json!(step));
    }
    serde_json::to_string(&Value::Object(entry)).unwrap_or_else(|_| "{}".to_string())
}

/// `[ts] [LEVEL] [PHASE: p] [STEP: s] [target] message`
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    meta: &LogMetadata,
) -> String {
    let mut line = format!("[{}] [{}]", timestamp, level.as_str());
    if let Some(phase) = &meta.phase {
        line.push_str(&format!(" [PHASE: {}]", phase));
    }
    if let Some(step) = &meta.step {
        line.push_str(&format!(" [STEP: {}]", step));
    }
    line.push_str(&format!(" [{}] {}", target, meta.message));
    line
}
