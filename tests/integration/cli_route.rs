//! Integration tests for CLI routing against a scripted generation service

use crate::integration::test_utils::{code_reply, spec_reply, ScriptedService};
use reelcraft::cli::{map_error, Commands, RunContext, CODE_FILE_NAME, SPEC_FILE_NAME};
use reelcraft::config::ReelcraftConfig;
use reelcraft::error::{ApiError, ServiceError};
use reelcraft::prompts::SPEC_ADDENDUM;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {
        "title": "Skip Counting",
        "url": "https://www.youtube.com/watch?v=skip",
        "subject": "Math",
        "grade": "2",
        "spec": "Build a skip counting game.",
        "code": "<html>skip</html>"
    }
]"#;

fn context(workspace: &Path, service: &Arc<ScriptedService>) -> RunContext {
    std::fs::write(workspace.join("examples.json"), CATALOG).unwrap();
    let mut config = ReelcraftConfig::default();
    config.catalog.path = Some(PathBuf::from("examples.json"));
    RunContext::from_config(workspace.to_path_buf(), config)
        .unwrap()
        .with_service(service.clone())
}

fn generate(url: &str, format: &str) -> Commands {
    Commands::Generate {
        video_url: url.to_string(),
        out: PathBuf::from("out"),
        format: format.to_string(),
    }
}

#[test]
fn test_generate_writes_spec_and_app() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    service.reply(spec_reply("Pop the bubbles in order."));
    service.reply(code_reply("<html>bubbles</html>"));
    let ctx = context(workspace.path(), &service);

    let output = ctx
        .execute(&generate("https://youtu.be/bubbles", "text"))
        .unwrap();
    assert!(output.contains("ready"));

    let out = workspace.path().join("out");
    let spec = std::fs::read_to_string(out.join(SPEC_FILE_NAME)).unwrap();
    let code = std::fs::read_to_string(out.join(CODE_FILE_NAME)).unwrap();
    assert_eq!(spec, format!("Pop the bubbles in order.{}", SPEC_ADDENDUM));
    assert_eq!(code, "\n<html>bubbles</html>\n");
    assert_eq!(service.call_count(), 2);
}

#[test]
fn test_generate_catalog_video_makes_no_calls() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    let ctx = context(workspace.path(), &service);

    let output = ctx
        .execute(&generate("https://www.youtube.com/watch?v=skip", "json"))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["session"]["state"], "ready");
    assert_eq!(value["session"]["code"], "<html>skip</html>");
    assert_eq!(service.call_count(), 0);
}

#[test]
fn test_code_failure_keeps_spec_on_disk() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    service.reply(spec_reply("Sort the leaves."));
    service.reply(Err(ServiceError::NoCandidate));
    let ctx = context(workspace.path(), &service);

    let err = ctx
        .execute(&generate("https://youtu.be/leaves", "text"))
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed { .. }));
    let shown = map_error(&err);
    assert!(shown.starts_with("Our robots got a little stuck"));
    assert!(shown.contains("No candidates returned"));

    let out = workspace.path().join("out");
    assert!(out.join(SPEC_FILE_NAME).exists());
    assert!(!out.join(CODE_FILE_NAME).exists());
}

#[test]
fn test_regenerate_from_edited_spec() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    service.reply(code_reply("<html>v2</html>"));
    let ctx = context(workspace.path(), &service);

    let previous = workspace.path().join("previous");
    std::fs::create_dir_all(&previous).unwrap();
    std::fs::write(previous.join(SPEC_FILE_NAME), "First spec.").unwrap();
    std::fs::write(previous.join(CODE_FILE_NAME), "<html>v1</html>").unwrap();
    std::fs::write(workspace.path().join("edited.md"), "Second spec.").unwrap();

    let output = ctx
        .execute(&Commands::Regenerate {
            from: PathBuf::from("previous"),
            spec_file: PathBuf::from("edited.md"),
            video: Some("https://youtu.be/original".to_string()),
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("https://youtu.be/original"));

    assert_eq!(
        std::fs::read_to_string(previous.join(SPEC_FILE_NAME)).unwrap(),
        "Second spec."
    );
    assert_eq!(
        std::fs::read_to_string(previous.join(CODE_FILE_NAME)).unwrap(),
        "\n<html>v2</html>\n"
    );
    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Second spec.");
    assert!(requests[0].video_reference.is_none());
}

#[test]
fn test_failed_regenerate_removes_code_built_from_old_spec() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    service.reply(Err(ServiceError::NoCandidate));
    let ctx = context(workspace.path(), &service);

    let previous = workspace.path().join("previous");
    std::fs::create_dir_all(&previous).unwrap();
    std::fs::write(previous.join(SPEC_FILE_NAME), "First spec.").unwrap();
    std::fs::write(previous.join(CODE_FILE_NAME), "<html>v1</html>").unwrap();
    std::fs::write(workspace.path().join("edited.md"), "Second spec.").unwrap();

    let regenerate = Commands::Regenerate {
        from: PathBuf::from("previous"),
        spec_file: PathBuf::from("edited.md"),
        video: None,
        format: "text".to_string(),
    };
    let err = ctx.execute(&regenerate).unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed { .. }));

    assert_eq!(
        std::fs::read_to_string(previous.join(SPEC_FILE_NAME)).unwrap(),
        "Second spec."
    );
    assert!(!previous.join(CODE_FILE_NAME).exists());

    // Without a code file the directory can no longer seed a Ready session.
    let err = ctx.execute(&regenerate).unwrap_err();
    assert!(matches!(err, ApiError::IoError(_)));
    assert_eq!(service.call_count(), 1);
}

#[test]
fn test_failed_generate_into_existing_out_removes_old_code() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    service.reply(spec_reply("Trace the letters."));
    service.reply(Ok("no fences at all".to_string()));
    let ctx = context(workspace.path(), &service);

    let out = workspace.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(out.join(SPEC_FILE_NAME), "An older spec.").unwrap();
    std::fs::write(out.join(CODE_FILE_NAME), "<html>older</html>").unwrap();

    let err = ctx
        .execute(&generate("https://youtu.be/letters", "text"))
        .unwrap_err();
    assert!(matches!(err, ApiError::GenerationFailed { .. }));

    let spec = std::fs::read_to_string(out.join(SPEC_FILE_NAME)).unwrap();
    assert_eq!(spec, format!("Trace the letters.{}", SPEC_ADDENDUM));
    assert!(!out.join(CODE_FILE_NAME).exists());
}

#[test]
fn test_regenerate_unchanged_spec_is_a_no_op() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    let ctx = context(workspace.path(), &service);

    let previous = workspace.path().join("previous");
    std::fs::create_dir_all(&previous).unwrap();
    std::fs::write(previous.join(SPEC_FILE_NAME), "Same spec.").unwrap();
    std::fs::write(previous.join(CODE_FILE_NAME), "<html>v1</html>").unwrap();
    std::fs::write(workspace.path().join("edited.md"), "\nSame spec.\n\n").unwrap();

    let output = ctx
        .execute(&Commands::Regenerate {
            from: previous.clone(),
            spec_file: workspace.path().join("edited.md"),
            video: None,
            format: "text".to_string(),
        })
        .unwrap();
    assert_eq!(output, "Spec unchanged; nothing to regenerate.");
    assert_eq!(service.call_count(), 0);
    assert_eq!(
        std::fs::read_to_string(previous.join(CODE_FILE_NAME)).unwrap(),
        "<html>v1</html>"
    );
}

#[test]
fn test_regenerate_requires_previous_artifacts() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    let ctx = context(workspace.path(), &service);
    std::fs::write(workspace.path().join("edited.md"), "Spec.").unwrap();

    let err = ctx
        .execute(&Commands::Regenerate {
            from: PathBuf::from("missing"),
            spec_file: PathBuf::from("edited.md"),
            video: None,
            format: "text".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::IoError(_)));
}

#[test]
fn test_examples_lists_catalog() {
    let workspace = TempDir::new().unwrap();
    let service = Arc::new(ScriptedService::new());
    let ctx = context(workspace.path(), &service);

    let output = ctx
        .execute(&Commands::Examples {
            catalog: None,
            format: "json".to_string(),
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["total"], 1);
    assert_eq!(value["examples"][0]["title"], "Skip Counting");
    assert_eq!(value["examples"][0]["seeded"], true);
}
