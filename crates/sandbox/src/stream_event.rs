// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StreamEvent`: the sum type emitted while parsing an agent's stdout as a
//! stream-JSON event stream (spec.md §4.5, §6, §9 Design Notes: "Stream-JSON
//! parsing maps to a line-buffered reader that drops unparseable lines and
//! tags each emitted event with a sum type").
//!
//! Event shapes consumed are a superset of
//! `{type, message?.content[], tool, input, is_error, error.message}`
//! (spec.md §6); unknown `type` values are ignored, matching the agent
//! CLI's own forward-compatibility stance.

use serde::Deserialize;

/// One parsed line of the agent's stream-JSON stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Text(String),
    Thinking(String),
    Tool { tool: String, input: serde_json::Value },
    ToolResult { content: serde_json::Value, is_error: bool },
    Error(String),
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
    #[serde(default)]
    content: Option<serde_json::Value>,
    #[serde(default)]
    is_error: Option<bool>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    content: Vec<RawContentBlock>,
}

#[derive(Debug, Deserialize)]
struct RawContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    message: Option<String>,
}

/// Parses one line of stdout into a [`StreamEvent`]. Returns `None` for
/// blank or unparsable lines, or a recognized `type` whose fields are
/// missing the data needed to build an event — both are silently dropped
/// by the caller (spec.md §4.5).
pub fn parse_stream_line(line: &str) -> Option<StreamEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let raw: RawEvent = serde_json::from_str(trimmed).ok()?;
    match raw.kind.as_str() {
        "text" => {
            let text = message_text(&raw.message)?;
            Some(StreamEvent::Text(text))
        }
        "thinking" => {
            let thinking = message_thinking(&raw.message)?;
            Some(StreamEvent::Thinking(thinking))
        }
        "tool" => Some(StreamEvent::Tool {
            tool: raw.tool?,
            input: raw.input.unwrap_or(serde_json::Value::Null),
        }),
        "tool_result" => Some(StreamEvent::ToolResult {
            content: raw.content.unwrap_or(serde_json::Value::Null),
            is_error: raw.is_error.unwrap_or(false),
        }),
        "error" => {
            let message = raw
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string());
            Some(StreamEvent::Error(message))
        }
        _ => None,
    }
}

fn message_text(message: &Option<RawMessage>) -> Option<String> {
    let blocks = &message.as_ref()?.content;
    let joined: String = blocks
        .iter()
        .filter(|b| b.kind == "text")
        .filter_map(|b| b.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn message_thinking(message: &Option<RawMessage>) -> Option<String> {
    let blocks = &message.as_ref()?.content;
    let joined: String = blocks
        .iter()
        .filter(|b| b.kind == "thinking")
        .filter_map(|b| b.thinking.as_deref())
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
#[path = "stream_event_tests.rs"]
mod tests;
