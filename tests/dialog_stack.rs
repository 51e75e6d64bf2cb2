//! Contract tests for the dialog stack: depth accounting, teardown order,
//! replacement, registry failures, and mid-conversation persistence.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use palaver::activity::Activity;
use palaver::dialogs::{
    Dialog, DialogContext, DialogReason, DialogRegistry, DialogTurnResult, DialogTurnStatus,
    WaterfallDialog, WaterfallStepContext,
};
use palaver::state::{DialogInstance, DialogState};
use palaver::turn::{RecordingTransport, TurnContext};
use palaver::{PalaverError, Result};

/// Dialog that optionally begins a child, then waits; resuming keeps it
/// waiting so frames stay put until explicitly ended. Cancellation order is
/// recorded through the cleanup hook.
struct TrackingDialog {
    id: String,
    child: Option<String>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl TrackingDialog {
    fn new(id: &str, child: Option<&str>, cancelled: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            id: id.to_string(),
            child: child.map(str::to_string),
            cancelled,
        }
    }
}

#[async_trait]
impl Dialog for TrackingDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        match &self.child {
            Some(child) => dc.begin_dialog(child, None).await,
            None => Ok(DialogTurnResult::waiting()),
        }
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        dc.end_dialog(Some(Value::from(self.id.clone()))).await
    }

    async fn resume_dialog(
        &self,
        _dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        Ok(DialogTurnResult::waiting())
    }

    async fn end_dialog(
        &self,
        _turn: &mut TurnContext,
        _instance: &mut DialogInstance,
        reason: DialogReason,
    ) -> Result<()> {
        if reason == DialogReason::CancelCalled {
            if let Ok(mut cancelled) = self.cancelled.lock() {
                cancelled.push(self.id.clone());
            }
        }
        Ok(())
    }
}

fn three_level_registry(cancelled: Arc<Mutex<Vec<String>>>) -> DialogRegistry {
    let mut registry = DialogRegistry::new();
    registry
        .add(TrackingDialog::new("a", Some("b"), cancelled.clone()))
        .unwrap();
    registry
        .add(TrackingDialog::new("b", Some("c"), cancelled.clone()))
        .unwrap();
    registry
        .add(TrackingDialog::new("c", None, cancelled))
        .unwrap();
    registry
}

fn turn(text: &str) -> TurnContext {
    TurnContext::new(
        Arc::new(RecordingTransport::new()),
        Activity::message(text),
    )
}

#[tokio::test]
async fn test_begin_and_end_change_depth_by_exactly_one() {
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let mut registry = DialogRegistry::new();
    registry
        .add(TrackingDialog::new("c", None, cancelled))
        .unwrap();
    let mut state = DialogState::new();
    let mut t = turn("hi");
    let mut dc = DialogContext::new(&registry, &mut t, &mut state.stack);

    assert_eq!(dc.depth(), 0);
    dc.begin_dialog("c", None).await.unwrap();
    assert_eq!(dc.depth(), 1);
    dc.begin_dialog("c", None).await.unwrap();
    assert_eq!(dc.depth(), 2);

    dc.end_dialog(None).await.unwrap();
    assert_eq!(dc.depth(), 1);
    dc.end_dialog(None).await.unwrap();
    assert_eq!(dc.depth(), 0);
}

#[tokio::test]
async fn test_nested_begin_builds_three_frames() {
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let registry = three_level_registry(cancelled);
    let mut state = DialogState::new();

    let mut t = turn("hi");
    let result = registry.run_turn(&mut t, &mut state, "a").await.unwrap();
    assert_eq!(result.status, DialogTurnStatus::Waiting);
    assert_eq!(state.depth(), 3);
    // Index 0 is the top: the innermost dialog.
    let ids: Vec<&str> = state.stack.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, ["c", "b", "a"]);
}

#[tokio::test]
async fn test_cancel_all_tears_down_top_to_bottom() {
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let registry = three_level_registry(cancelled.clone());
    let mut state = DialogState::new();

    let mut t = turn("hi");
    registry.run_turn(&mut t, &mut state, "a").await.unwrap();
    assert_eq!(state.depth(), 3);

    let mut t = turn("/cancel");
    let mut dc = DialogContext::new(&registry, &mut t, &mut state.stack);
    let result = dc.cancel_all_dialogs().await.unwrap();

    assert_eq!(result.status, DialogTurnStatus::Cancelled);
    assert_eq!(cancelled.lock().unwrap().as_slice(), ["c", "b", "a"]);
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_replace_dialog_keeps_depth() {
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let registry = three_level_registry(cancelled);
    let mut state = DialogState::new();

    let mut t = turn("hi");
    registry.run_turn(&mut t, &mut state, "a").await.unwrap();
    let depth_before = state.depth();

    let mut t = turn("again");
    let mut dc = DialogContext::new(&registry, &mut t, &mut state.stack);
    let result = dc.replace_dialog("c", None).await.unwrap();
    assert_eq!(result.status, DialogTurnStatus::Waiting);
    assert_eq!(state.depth(), depth_before);
    assert_eq!(state.stack[0].id, "c");
}

#[tokio::test]
async fn test_unregistered_frame_is_fatal_and_leaves_stack() {
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let mut registry = DialogRegistry::new();
    registry
        .add(TrackingDialog::new("c", None, cancelled))
        .unwrap();

    // A persisted frame whose id no longer resolves (e.g. after a deploy
    // that dropped a dialog).
    let mut state = DialogState::new();
    state.stack.push(DialogInstance::new("ghost"));

    let mut t = turn("hi");
    let err = registry.run_turn(&mut t, &mut state, "c").await.unwrap_err();
    assert!(matches!(err, PalaverError::DialogNotFound(id) if id == "ghost"));
    // The failed turn committed nothing.
    assert_eq!(state.depth(), 1);
    assert_eq!(state.stack[0].id, "ghost");
}

fn wait_step<'s>(
    _step: &'s mut WaterfallStepContext<'_, '_>,
) -> futures::future::BoxFuture<'s, Result<DialogTurnResult>> {
    Box::pin(async move { Ok(DialogTurnResult::waiting()) })
}

fn capture_then_finish<'s>(
    step: &'s mut WaterfallStepContext<'_, '_>,
) -> futures::future::BoxFuture<'s, Result<DialogTurnResult>> {
    Box::pin(async move {
        let reply = step.result.clone();
        step.dc.end_dialog(reply).await
    })
}

/// The persisted stack must survive a full serialize/deserialize cycle
/// between turns, exactly as a real store would put it through.
#[tokio::test]
async fn test_state_round_trips_between_turns() {
    let mut registry = DialogRegistry::new();
    registry
        .add(
            WaterfallDialog::new("survey")
                .step(wait_step)
                .step(wait_step)
                .step(capture_then_finish),
        )
        .unwrap();

    let mut state = DialogState::new();
    let mut t = turn("start");
    registry.run_turn(&mut t, &mut state, "survey").await.unwrap();

    for text in ["first reply", "second reply"] {
        // Simulate the host's store boundary.
        let json = serde_json::to_string(&state).unwrap();
        state = serde_json::from_str(&json).unwrap();

        let mut t = turn(text);
        let result = registry.run_turn(&mut t, &mut state, "survey").await.unwrap();
        if text == "second reply" {
            assert_eq!(result.status, DialogTurnStatus::Complete);
            assert_eq!(result.result, Some(Value::from("second reply")));
        } else {
            assert_eq!(result.status, DialogTurnStatus::Waiting);
        }
    }
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_reprompt_on_empty_stack_is_a_no_op() {
    let registry = DialogRegistry::new();
    let mut state = DialogState::new();
    let mut t = turn("hi");
    let mut dc = DialogContext::new(&registry, &mut t, &mut state.stack);
    dc.reprompt_dialog().await.unwrap();
}
