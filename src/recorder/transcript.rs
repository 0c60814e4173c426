//! Transcript generation
//!
//! Renders the persisted JSONL log into a human-readable markdown document:
//! optional session metadata up top, then one section per event with its
//! timestamp, an embedded screenshot reference and the action string, in
//! log order.

use super::{EventRecord, SessionMeta};
use std::io::Write;
use std::path::Path;

const PROMPT: &str =
    "Given the screenshot as below. What's the next step that you will do to help with the task?";

/// Assemble the transcript body.
pub fn render(records: &[EventRecord], meta: &SessionMeta) -> String {
    let mut md = String::new();

    match &meta.title {
        Some(title) => md.push_str(&format!("# {title}\n\n")),
        None => md.push_str("# Recorded session\n\n"),
    }
    if let Some(description) = &meta.description {
        md.push_str(&format!("**Description:** {description}\n\n"));
    }

    for record in records {
        md.push_str(&format!("### {}\n\n", record.timestamp));
        md.push_str(&format!("**Input:**\n\n{PROMPT}\n\n"));
        md.push_str(&format!(
            "<img src=\"{}\" width=\"50%\" height=\"50%\">\n\n",
            record.screenshot
        ));
        md.push_str(&format!("**Output:**\n\n{}\n\n", record.action));
    }

    md
}

pub fn write_transcript(
    path: &Path,
    records: &[EventRecord],
    meta: &SessionMeta,
) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(render(records, meta).as_bytes())
}
