// src/dialogs/waterfall.rs
// Multi-step dialogs with a persisted step cursor

//! A waterfall is an ordered list of step functions executed one per turn.
//! The frame's state carries `options`, `stepIndex`, and a `values` bag the
//! steps share; `stepIndex` never decreases within one lifetime of the
//! dialog. A step advances by calling [`WaterfallStepContext::next`] exactly
//! once; calling it twice in one activation is a programming defect and
//! fails the turn.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::context::DialogContext;
use super::{Dialog, DialogReason, DialogTurnResult};
use crate::activity::ActivityType;
use crate::error::{PalaverError, Result};
use crate::prompts::PromptOptions;
use crate::state::StateMap;

const OPTIONS_KEY: &str = "options";
const STEP_INDEX_KEY: &str = "stepIndex";
const VALUES_KEY: &str = "values";
const INSTANCE_ID_KEY: &str = "instanceId";

/// A stored step function. Steps are plain function values captured at
/// construction; non-capturing `fn` items coerce directly.
pub type WaterfallStep = Box<
    dyn for<'s, 'c, 't> Fn(
            &'s mut WaterfallStepContext<'c, 't>,
        ) -> BoxFuture<'s, Result<DialogTurnResult>>
        + Send
        + Sync,
>;

/// Context handed to each step activation.
pub struct WaterfallStepContext<'c, 't> {
    waterfall: &'c WaterfallDialog,
    /// Stack operations for the step: begin children, prompt, end early.
    pub dc: &'c mut DialogContext<'t>,
    /// 0-based index of this step.
    pub index: usize,
    /// Why the step is running.
    pub reason: DialogReason,
    /// Options the waterfall was begun with.
    pub options: Option<Value>,
    /// Result forwarded from the previous step or a completed child dialog.
    pub result: Option<Value>,
    /// Shared value bag persisted across steps.
    pub values: StateMap,
    next_called: bool,
}

impl WaterfallStepContext<'_, '_> {
    /// Read a shared value set by an earlier step.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store a shared value for later steps.
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Begin a prompt dialog from this step.
    pub async fn prompt(&mut self, id: &str, options: PromptOptions) -> Result<DialogTurnResult> {
        self.flush_values();
        self.dc.prompt(id, options).await
    }

    /// Advance to the next step, forwarding `result` to it. May be called
    /// at most once per step activation.
    pub async fn next(&mut self, result: Option<Value>) -> Result<DialogTurnResult> {
        if self.next_called {
            return Err(PalaverError::Misuse(format!(
                "next() called twice within step {} of dialog '{}'",
                self.index,
                self.waterfall.id()
            )));
        }
        self.next_called = true;
        self.flush_values();
        self.waterfall
            .run_step(self.dc, self.index + 1, DialogReason::NextCalled, result)
            .await
    }

    /// Persist the value bag back into the waterfall's own frame.
    fn flush_values(&mut self) {
        if let Some(instance) = self.dc.find_instance_mut(self.waterfall.id()) {
            instance.state.insert(
                VALUES_KEY.to_string(),
                Value::Object(self.values.clone()),
            );
        }
    }
}

/// A dialog built from an ordered list of step functions.
pub struct WaterfallDialog {
    id: String,
    steps: Vec<WaterfallStep>,
}

impl WaterfallDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step. Steps run in the order they were added.
    pub fn step<F>(mut self, step: F) -> Self
    where
        F: for<'s, 'c, 't> Fn(
                &'s mut WaterfallStepContext<'c, 't>,
            ) -> BoxFuture<'s, Result<DialogTurnResult>>
            + Send
            + Sync
            + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    async fn run_step(
        &self,
        dc: &mut DialogContext<'_>,
        index: usize,
        reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        if index >= self.steps.len() {
            // Past the last step the waterfall ends itself, forwarding the
            // last result to its parent.
            return dc.end_dialog(result).await;
        }

        let (options, values) = {
            let instance = dc.find_instance_mut(&self.id).ok_or_else(|| {
                PalaverError::Other(format!("waterfall '{}' has no frame on the stack", self.id))
            })?;
            instance
                .state
                .insert(STEP_INDEX_KEY.to_string(), Value::from(index));
            let options = instance
                .state
                .get(OPTIONS_KEY)
                .cloned()
                .filter(|v| !v.is_null());
            let values = match instance.state.get(VALUES_KEY) {
                Some(Value::Object(map)) => map.clone(),
                _ => StateMap::new(),
            };
            (options, values)
        };

        debug!(dialog_id = %self.id, step = index, reason = %reason, "running waterfall step");
        let mut step = WaterfallStepContext {
            waterfall: self,
            dc,
            index,
            reason,
            options,
            result,
            values,
            next_called: false,
        };
        let turn_result = (self.steps[index])(&mut step).await?;

        // Steps that advanced (or prompted) already flushed; otherwise keep
        // whatever the step wrote into the bag.
        if !step.next_called {
            step.flush_values();
        }
        Ok(turn_result)
    }
}

#[async_trait]
impl Dialog for WaterfallDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("waterfall '{}' began without a frame", self.id))
            })?;
            instance.state.insert(
                OPTIONS_KEY.to_string(),
                options.unwrap_or(Value::Null),
            );
            instance
                .state
                .insert(STEP_INDEX_KEY.to_string(), Value::from(0));
            let mut values = StateMap::new();
            values.insert(
                INSTANCE_ID_KEY.to_string(),
                Value::from(Uuid::new_v4().to_string()),
            );
            instance
                .state
                .insert(VALUES_KEY.to_string(), Value::Object(values));
        }
        self.run_step(dc, 0, DialogReason::BeginCalled, None).await
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        // Only message activities drive the waterfall forward.
        if dc.turn.activity().activity_type != ActivityType::Message {
            return Ok(DialogTurnResult::waiting());
        }
        let text = dc.turn.activity().text.clone();
        self.resume_dialog(dc, DialogReason::ContinueCalled, text.map(Value::from))
            .await
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let index = dc
            .find_instance_mut(&self.id)
            .and_then(|i| i.state.get(STEP_INDEX_KEY))
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        self.run_step(dc, index + 1, reason, result).await
    }
}
