// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Squash commit message formatting (spec.md §4.6.5): subject truncation
//! and 72-column body word-wrap. Pure, no I/O.

const SUBJECT_MAX: usize = 72;
const BODY_WRAP_WIDTH: usize = 72;

/// Fields substituted into the squash commit's body template.
pub struct CommitFields<'a> {
    pub panic_message: &'a str,
    pub panic_location: &'a str,
    pub bug_description: &'a str,
    pub fix_description: &'a str,
    pub failing_seed: i64,
    pub why_simulator_missed: &'a str,
}

/// Truncates `s` to `max` characters, appending `...` if it was longer.
/// Operates on `char`s, not bytes, so multi-byte UTF-8 is never split.
pub fn truncate_subject(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let truncated: String = s.chars().take(keep).collect();
    format!("{truncated}...")
}

/// Wraps `text` at `width` columns on word boundaries. A single word
/// longer than `width` is emitted unbroken on its own line.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        lines.push(current);
    }
    lines.join("\n")
}

/// Builds the full squash commit message (spec.md §4.6.5):
/// ```text
/// fix: <panic_message>
///
/// Location: <panic_location>
/// Bug: <bug_description>
/// Fix: <fix_description>
///
/// Failing seed: <failing_seed>
/// Simulator: <why_simulator_missed>
/// ```
/// with the subject truncated to 72 characters and the body word-wrapped
/// at 72 columns.
pub fn build_commit_message(fields: &CommitFields<'_>) -> String {
    let subject = truncate_subject(&format!("fix: {}", fields.panic_message), SUBJECT_MAX);
    let body = format!(
        "Location: {}\nBug: {}\nFix: {}\n\nFailing seed: {}\nSimulator: {}",
        fields.panic_location,
        fields.bug_description,
        fields.fix_description,
        fields.failing_seed,
        fields.why_simulator_missed,
    );
    let wrapped_body = wrap_text(&body, BODY_WRAP_WIDTH);
    format!("{subject}\n\n{wrapped_body}")
}

#[cfg(test)]
#[path = "commit_message_tests.rs"]
mod tests;
