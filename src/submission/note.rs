use chrono::{DateTime, SecondsFormat, Utc};

use super::normalize::normalize;
use super::{value_text, Submission};

/// Placeholder written for empty values.
pub const EMPTY_CELL: &str = "_";
/// Inline marker that replaces embedded newlines inside a table cell.
pub const LINE_BREAK: &str = "<br/>";

/// Header of an audit note. The date is the only input that is not
/// derived from the submission itself.
#[derive(Debug, Clone)]
pub struct NoteHeader<'a> {
    pub label: &'a str,
    pub date: Option<DateTime<Utc>>,
}

/// Render a submission as a Markdown note: a header block followed by a
/// `Field | Value` table with one row per key, in submission order.
pub fn format_note(submission: &Submission, header: &NoteHeader<'_>) -> String {
    let contact = normalize(submission);
    let mut lines: Vec<String> = Vec::with_capacity(submission.len() + 10);

    lines.push(format!("📌 **{}**", header.label));
    lines.push(String::new());
    lines.push(format!("**Name:** {}", contact.full_name()).trim().to_string());
    if !contact.email.is_empty() {
        lines.push(format!("**Email:** {}", contact.email));
    }
    if !contact.phone.is_empty() {
        lines.push(format!("**Phone:** {}", contact.phone));
    }
    if let Some(date) = header.date {
        lines.push(format!(
            "**Date:** {}",
            date.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
    }
    lines.push(String::new());
    lines.push("### Full Answers".to_string());
    lines.push(String::new());
    lines.push("| Field | Value |".to_string());
    lines.push("|------:|:------|".to_string());

    for (key, value) in submission.iter() {
        let text = value_text(value);
        let cell = if text.is_empty() {
            EMPTY_CELL.to_string()
        } else {
            escape_cell(&text)
        };
        lines.push(format!("| {} | {} |", code_span(&escape_cell(key)), cell));
    }

    lines.join("\n")
}

/// Wrap text in a code span whose fence is longer than any backtick run
/// inside it.
fn code_span(text: &str) -> String {
    let longest_run = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    if longest_run == 0 {
        return format!("`{text}`");
    }
    let fence = "`".repeat(longest_run + 1);
    format!("{fence} {text} {fence}")
}

/// Keep a cell on one table row: newlines become `<br/>`, pipes are escaped.
fn escape_cell(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', LINE_BREAK)
        .replace('|', "\\|")
}
