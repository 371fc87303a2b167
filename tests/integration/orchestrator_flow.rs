//! Integration tests for the generation orchestrator with calls held in flight

use crate::integration::test_utils::{code_reply, spec_reply, ScriptedService};
use reelcraft::config::GenerationConfig;
use reelcraft::edit::EditSession;
use reelcraft::error::{ServiceError, SessionError};
use reelcraft::orchestrator::{GenerationOrchestrator, RegenerateOutcome};
use reelcraft::prompts::SPEC_ADDENDUM;
use reelcraft::session::{ContentBasis, LoadingState, Seed, SessionId, Stage};
use std::sync::Arc;

fn orchestrator(service: &Arc<ScriptedService>, seed: Option<Seed>) -> Arc<GenerationOrchestrator> {
    Arc::new(GenerationOrchestrator::new(
        SessionId(1),
        ContentBasis::new("https://www.youtube.com/watch?v=planets"),
        seed,
        service.clone(),
        &GenerationConfig::default(),
    ))
}

#[tokio::test]
async fn test_states_progress_through_both_stages() {
    let service = Arc::new(ScriptedService::new());
    let spec_gate = service.reply_when_opened(spec_reply("Match the planets."));
    let code_gate = service.reply_when_opened(code_reply("<main>planets</main>"));
    let orch = orchestrator(&service, None);

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.start().await }
    });

    service.wait_for_calls(1).await;
    assert_eq!(orch.state(), LoadingState::LoadingSpec);
    assert!(orch.is_busy());

    spec_gate.open();
    service.wait_for_calls(2).await;
    let snapshot = orch.snapshot();
    assert_eq!(snapshot.state, LoadingState::LoadingCode);
    assert_eq!(snapshot.spec, format!("Match the planets.{}", SPEC_ADDENDUM));
    assert!(snapshot.code.is_empty());

    code_gate.open();
    let snapshot = task.await.unwrap().unwrap();
    assert_eq!(snapshot.state, LoadingState::Ready);
    assert_eq!(snapshot.code, "\n<main>planets</main>\n");
    assert!(!orch.is_busy());

    let requests = service.requests();
    assert_eq!(
        requests[0].video_reference.as_deref(),
        Some("https://www.youtube.com/watch?v=planets")
    );
    assert_eq!(requests[1].prompt, snapshot.spec);
}

#[tokio::test]
async fn test_calls_during_flight_are_rejected_as_busy() {
    let service = Arc::new(ScriptedService::new());
    let spec_gate = service.reply_when_opened(spec_reply("Spec."));
    service.reply(code_reply("<p>done</p>"));
    let orch = orchestrator(&service, None);

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.start().await }
    });
    service.wait_for_calls(1).await;
    let before = orch.snapshot();

    assert_eq!(orch.start().await.unwrap_err(), SessionError::Busy);
    assert_eq!(orch.retry().await.unwrap_err(), SessionError::Busy);
    assert_eq!(
        orch.regenerate_code_from_edited_spec("Different")
            .await
            .unwrap_err(),
        SessionError::Busy
    );
    assert_eq!(orch.edit_code("<p>hand</p>").unwrap_err(), SessionError::Busy);
    assert_eq!(orch.snapshot(), before);
    assert_eq!(service.call_count(), 1);

    spec_gate.open();
    let snapshot = task.await.unwrap().unwrap();
    assert_eq!(snapshot.state, LoadingState::Ready);
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_edited_spec_is_committed_before_code_call_resolves() {
    let service = Arc::new(ScriptedService::new());
    let code_gate = service.reply_when_opened(code_reply("<p>new</p>"));
    let orch = orchestrator(&service, Seed::new("Old spec.", "<p>old</p>"));
    orch.start().await.unwrap();
    assert_eq!(service.call_count(), 0);

    let mut updates = orch.subscribe();
    let task = tokio::spawn({
        let orch = orch.clone();
        async move {
            let mut edit = EditSession::begin(&orch);
            edit.set_draft("  New spec with spaces  ");
            edit.commit().await
        }
    });

    service.wait_for_calls(1).await;
    let snapshot = orch.snapshot();
    assert_eq!(snapshot.state, LoadingState::LoadingCode);
    assert_eq!(snapshot.spec, "  New spec with spaces  ");
    assert!(snapshot.code.is_empty());
    assert!(updates.has_changed().unwrap());
    assert_eq!(
        updates.borrow_and_update().state,
        LoadingState::LoadingCode
    );

    code_gate.open();
    let outcome = task.await.unwrap().unwrap();
    let RegenerateOutcome::Completed(snapshot) = outcome else {
        panic!("edited spec should have regenerated code");
    };
    assert_eq!(snapshot.state, LoadingState::Ready);
    assert_eq!(snapshot.spec, "  New spec with spaces  ");
    assert_eq!(snapshot.code, "\n<p>new</p>\n");

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "  New spec with spaces  ");
    assert!(requests[0].video_reference.is_none());
}

#[tokio::test]
async fn test_abandoned_result_is_discarded() {
    let service = Arc::new(ScriptedService::new());
    let spec_gate = service.reply_when_opened(spec_reply("Late spec."));
    let orch = orchestrator(&service, None);

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.start().await }
    });
    service.wait_for_calls(1).await;

    orch.abandon();
    let after_abandon = orch.snapshot();
    spec_gate.open();

    assert_eq!(task.await.unwrap().unwrap_err(), SessionError::Abandoned);
    assert_eq!(orch.snapshot(), after_abandon);
    assert!(orch.snapshot().spec.is_empty());
    // The code stage never ran.
    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn test_safety_block_is_reported_with_friendly_message() {
    let service = Arc::new(ScriptedService::new());
    service.reply(Err(ServiceError::SafetyFinish("SAFETY".to_string())));
    let orch = orchestrator(&service, None);

    let snapshot = orch.start().await.unwrap();
    assert_eq!(snapshot.state, LoadingState::Error);
    let report = snapshot.error.unwrap();
    assert_eq!(report.stage, Stage::Spec);
    assert!(report.safety_blocked);
    assert!(report.message.contains("safety filters"));
    assert!(report.detail.contains("SAFETY"));
}

#[tokio::test]
async fn test_edit_after_code_failure_recovers() {
    let service = Arc::new(ScriptedService::new());
    service.reply(spec_reply("Draw shapes."));
    service.reply(Ok("I forgot the fences".to_string()));
    service.reply(code_reply("<svg></svg>"));
    let orch = orchestrator(&service, None);

    let failed = orch.start().await.unwrap();
    assert_eq!(failed.state, LoadingState::Error);
    assert_eq!(failed.error.as_ref().unwrap().stage, Stage::Code);
    assert!(!failed.spec.is_empty());

    let outcome = orch
        .regenerate_code_from_edited_spec("Draw shapes, bigger.")
        .await
        .unwrap();
    let RegenerateOutcome::Completed(snapshot) = outcome else {
        panic!("edit from Error should regenerate");
    };
    assert_eq!(snapshot.state, LoadingState::Ready);
    assert!(snapshot.error.is_none());
    assert_eq!(service.call_count(), 3);
}
