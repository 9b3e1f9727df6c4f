// Integration tests for the text path of the assistant loop: submission,
// model call, interpretation, and the deferred effects.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use common::{harness, harness_with_data, ScriptedModel};
use fenceline_core::assistant::{NOT_CONFIGURED_MESSAGE, PROCESSING_ERROR_MESSAGE};
use fenceline_core::{
    AssistantError, ChatRole, DataStore, NewCustomer, SnapshotSource, SpeechCapabilities, TurnPhase,
};

#[tokio::test(start_paused = true)]
async fn test_turn_adds_one_user_and_one_assistant_message() {
    let model = ScriptedModel::replying(&[r#"{"text": "You have one pending quote."}"#]);
    let mut h = harness(Some(model.clone()), SpeechCapabilities::none());
    assert_eq!(h.assistant.messages().len(), 1, "greeting only");

    h.assistant.submit_utterance("How many quotes are pending?").unwrap();
    assert_eq!(h.assistant.messages().len(), 2);
    assert_eq!(h.assistant.messages()[1].role, ChatRole::User);
    assert!(h.assistant.state().loading);
    assert_eq!(h.assistant.phase(), TurnPhase::AwaitingModel);

    assert!(h.assistant.finish_turn().await);

    let messages = h.assistant.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, ChatRole::Assistant);
    assert_eq!(messages[2].content, "You have one pending quote.");
    assert!(!h.assistant.state().loading);
    assert_eq!(h.assistant.phase(), TurnPhase::Idle);
    assert_eq!(model.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_prompt_carries_snapshot_and_utterance() {
    let model = ScriptedModel::replying(&[r#"{"text": "ok"}"#]);
    let mut h = harness(Some(model.clone()), SpeechCapabilities::none());

    h.assistant.run_turn("  Who is Lisa Wilson?  ").await.unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Lisa Wilson"));
    assert!(prompts[0].contains("/schedule"));
    assert!(prompts[0].ends_with("\"Who is Lisa Wilson?\""));
    assert_eq!(h.assistant.messages()[1].content, "Who is Lisa Wilson?");
}

#[tokio::test(start_paused = true)]
async fn test_each_turn_reads_the_latest_data() {
    let model = ScriptedModel::replying(&[r#"{"text": "first"}"#, r#"{"text": "second"}"#]);
    let store = Arc::new(DataStore::placeholder());
    let mut h = harness_with_data(
        Some(model.clone()),
        SpeechCapabilities::none(),
        Arc::clone(&store) as Arc<dyn SnapshotSource>,
    );

    h.assistant.run_turn("who are my customers").await.unwrap();
    store.add_customer(NewCustomer {
        name: "Dana Reyes".to_string(),
        email: "dana@reyes.example".to_string(),
        ..NewCustomer::default()
    });
    h.assistant.run_turn("who are my customers now").await.unwrap();

    let prompts = model.prompts();
    assert!(!prompts[0].contains("Dana Reyes"));
    assert!(prompts[1].contains("Dana Reyes"));
    assert!(prompts[1].contains("\"totalCustomers\": 5"));
}

#[tokio::test(start_paused = true)]
async fn test_blank_input_is_ignored() {
    let model = ScriptedModel::replying(&[]);
    let mut h = harness(Some(model.clone()), SpeechCapabilities::none());

    h.assistant.set_input("   \t ");
    assert!(!h.assistant.can_submit());
    assert!(matches!(
        h.assistant.submit(),
        Err(AssistantError::EmptyUtterance)
    ));
    assert!(matches!(
        h.assistant.submit_utterance(""),
        Err(AssistantError::EmptyUtterance)
    ));

    assert_eq!(h.assistant.messages().len(), 1);
    assert!(!h.assistant.state().loading);
    assert_eq!(model.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_enter_submits_and_shift_enter_does_not() {
    let model = ScriptedModel::replying(&[r#"{"text": "ok"}"#]);
    let mut h = harness(Some(model.clone()), SpeechCapabilities::none());

    h.assistant.set_input("first line");
    h.assistant.handle_enter(true).unwrap();
    assert_eq!(h.assistant.input(), "first line\n");
    assert_eq!(h.assistant.messages().len(), 1);

    h.assistant.handle_enter(false).unwrap();
    assert_eq!(h.assistant.input(), "");
    assert_eq!(h.assistant.messages().len(), 2);
    h.assistant.finish_turn().await;
    assert_eq!(model.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submission_rejected_while_awaiting_model() {
    let gate = Arc::new(Notify::new());
    let model = ScriptedModel::gated(r#"{"text": "done"}"#, Arc::clone(&gate));
    let mut h = harness(Some(model.clone()), SpeechCapabilities::none());

    h.assistant.submit_utterance("first").unwrap();
    tokio::task::yield_now().await;
    assert!(h.assistant.is_awaiting_model());
    assert!(!h.assistant.turn_ready());

    h.assistant.set_input("second");
    assert!(!h.assistant.can_submit());
    assert!(matches!(
        h.assistant.submit(),
        Err(AssistantError::TurnInFlight)
    ));
    assert_eq!(h.assistant.messages().len(), 2);
    assert_eq!(h.assistant.input(), "second", "rejected input is kept");

    gate.notify_one();
    h.assistant.finish_turn().await;

    assert_eq!(h.assistant.messages().len(), 3);
    assert_eq!(h.assistant.messages()[2].content, "done");
    assert_eq!(model.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_fires_after_delay() {
    let model = ScriptedModel::replying(&[r#"{"navigation": "quotes", "text": "ok"}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("open my quotes").await.unwrap();
    assert_eq!(h.assistant.messages().last().unwrap().content, "ok");
    assert!(h.navigator.paths().is_empty(), "must not navigate synchronously");
    assert!(h.assistant.has_pending_navigation());

    tokio::time::sleep(Duration::from_millis(1400)).await;
    assert!(h.navigator.paths().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.navigator.paths(), vec!["/quotes".to_string()]);
    assert!(!h.assistant.has_pending_navigation());
}

#[tokio::test(start_paused = true)]
async fn test_text_reply_never_navigates() {
    let model = ScriptedModel::replying(&[r#"{"text": "Here are your stats."}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("stats please").await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(h.navigator.paths().is_empty());
    assert_eq!(
        h.assistant.messages().last().unwrap().content,
        "Here are your stats."
    );
}

#[tokio::test(start_paused = true)]
async fn test_highlight_is_handed_off_to_navigation_target() {
    let model =
        ScriptedModel::replying(&[r#"{"navigation": "/customers", "toHighlight": "C002"}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());
    let mut same_view = h.highlights.subscribe();

    h.assistant.run_turn("show me Sarah").await.unwrap();
    assert_eq!(
        h.assistant.messages().last().unwrap().content,
        "Sure, taking you to the customers page."
    );
    assert_eq!(h.handoff.peek(), None, "written only when navigating");

    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        h.navigator.visits(),
        vec![("/customers".to_string(), Some("C002".to_string()))]
    );
    assert_eq!(h.handoff.take().as_deref(), Some("C002"));
    assert_eq!(h.handoff.take(), None);
    assert!(same_view.try_recv().is_err(), "no broadcast when navigating");
}

#[tokio::test(start_paused = true)]
async fn test_highlight_is_broadcast_without_navigation() {
    let model = ScriptedModel::replying(&[r#"{"text": "That's Sarah.", "toHighlight": "C002"}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());
    let mut same_view = h.highlights.subscribe();

    h.assistant.run_turn("who is my biggest client?").await.unwrap();

    assert_eq!(same_view.try_recv().unwrap().id, "C002");
    assert_eq!(h.handoff.peek(), None);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.navigator.paths().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unstructured_reply_is_shown_verbatim() {
    let model = ScriptedModel::replying(&["Sure thing!"]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("thanks").await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(h.assistant.messages().last().unwrap().content, "Sure thing!");
    assert!(h.navigator.paths().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_model_failure_becomes_transcript_message() {
    let model = ScriptedModel::failing("connection refused");
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("hello").await.unwrap();

    let messages = h.assistant.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, ChatRole::Assistant);
    assert_eq!(messages[2].content, PROCESSING_ERROR_MESSAGE);
    assert!(!h.assistant.state().loading);

    // Still usable afterwards
    h.assistant.run_turn("hello again").await.unwrap();
    assert_eq!(h.assistant.messages().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_assistant_refuses_submissions() {
    let mut h = harness(None, SpeechCapabilities::none());

    assert!(!h.assistant.is_configured());
    assert_eq!(h.assistant.messages().len(), 1);
    assert_eq!(h.assistant.messages()[0].content, NOT_CONFIGURED_MESSAGE);

    h.assistant.set_input("hello");
    assert!(!h.assistant.can_submit());
    assert!(matches!(
        h.assistant.submit(),
        Err(AssistantError::NotConfigured)
    ));
    assert_eq!(h.assistant.messages().len(), 1);
    assert_eq!(h.assistant.input(), "hello");
}

#[tokio::test(start_paused = true)]
async fn test_new_turn_cancels_pending_navigation() {
    let model = ScriptedModel::replying(&[
        r#"{"navigation": "/quotes", "text": "Opening quotes."}"#,
        r#"{"text": "Actually, here is the answer."}"#,
    ]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("open quotes").await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    h.assistant.run_turn("never mind").await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.navigator.paths().is_empty());
    assert_eq!(h.assistant.messages().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_navigation() {
    let model = ScriptedModel::replying(&[r#"{"navigation": "/schedule"}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.run_turn("what's on tomorrow").await.unwrap();
    h.assistant.shutdown();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.navigator.paths().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_closing_panel_keeps_transcript() {
    let model = ScriptedModel::replying(&[r#"{"text": "ok"}"#]);
    let mut h = harness(Some(model), SpeechCapabilities::none());

    h.assistant.open();
    h.assistant.run_turn("hi").await.unwrap();
    h.assistant.close();
    assert!(!h.assistant.state().open);
    h.assistant.open();
    assert_eq!(h.assistant.messages().len(), 3);
}
