//! CLI presentation: text and json formatters per command.

use crate::catalog::ExampleCatalog;
use crate::session::{LoadingState, SessionSnapshot};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

/// Committed spec written next to the generated app
pub const SPEC_FILE_NAME: &str = "spec.md";
/// Generated single-file app
pub const CODE_FILE_NAME: &str = "index.html";

/// Progress line for a busy state, `None` otherwise
pub fn progress_message(state: LoadingState) -> Option<&'static str> {
    match state {
        LoadingState::LoadingSpec => Some("Our busy bees are watching the video..."),
        LoadingState::LoadingCode => Some("Building your super fun game!"),
        LoadingState::Ready | LoadingState::Error => None,
    }
}

pub fn format_progress_line(state: LoadingState) -> Option<String> {
    progress_message(state).map(|msg| format!("{} {}", "::".cyan().bold(), msg))
}

pub fn format_snapshot_text(snapshot: &SessionSnapshot, written_to: Option<&Path>) -> String {
    let mut output = format!(
        "{}\n",
        format!("Session {} ({})", snapshot.session_id, snapshot.state).bold()
    );
    output.push_str(&format!("Video: {}\n", snapshot.content_basis));
    output.push_str(&format!(
        "Spec: {} chars, Code: {} chars\n",
        snapshot.spec.len(),
        snapshot.code.len()
    ));
    if let Some(dir) = written_to {
        output.push_str(&format!(
            "Wrote {} and {}\n",
            dir.join(SPEC_FILE_NAME).display(),
            dir.join(CODE_FILE_NAME).display()
        ));
    }
    output.trim_end().to_string()
}

pub fn format_snapshot_json(snapshot: &SessionSnapshot, written_to: Option<&Path>) -> String {
    let out = json!({
        "session": snapshot,
        "written_to": written_to.map(|p| p.display().to_string()),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_unchanged(format: &str) -> String {
    if format == "json" {
        json!({ "outcome": "unchanged" }).to_string()
    } else {
        "Spec unchanged; nothing to regenerate.".to_string()
    }
}

pub fn format_examples_text(catalog: &ExampleCatalog) -> String {
    if catalog.is_empty() {
        return "No examples found.\n\nSet catalog.path in config or pass --catalog.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Title", "Subject", "Ages", "Grade", "URL", "Seeded"]);
    for example in catalog.examples() {
        let seeded = if example.seed().is_some() { "yes" } else { "no" };
        table.add_row(vec![
            example.title.as_str(),
            example.subject.as_str(),
            example.age_range.as_str(),
            example.grade.as_str(),
            example.url.as_str(),
            seeded,
        ]);
    }
    format!("{}\n\nTotal: {} example(s)", table, catalog.len())
}

pub fn format_examples_json(catalog: &ExampleCatalog) -> String {
    let examples: Vec<_> = catalog
        .examples()
        .iter()
        .map(|example| {
            json!({
                "title": example.title,
                "url": example.url,
                "subject": example.subject,
                "channel": example.channel,
                "age_range": example.age_range,
                "grade": example.grade,
                "seeded": example.seed().is_some(),
            })
        })
        .collect();
    let out = json!({ "examples": examples, "total": catalog.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
