//! CLI domain: parse, route, output, and presentation only.
//! No generation logic; a single route table dispatches to the session host.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_examples_json, format_examples_text, format_progress_line, format_snapshot_json,
    format_snapshot_text, format_unchanged, progress_message, CODE_FILE_NAME, SPEC_FILE_NAME,
};
pub use route::RunContext;
