// src/dialogs/component.rs
// Reusable sub-conversations behind a single outer frame

//! A component dialog wraps an independent registry and dialog stack and
//! collapses them into one frame of the outer stack. The inner stack lives
//! under a private key of the outer frame's state and is never visible to
//! the outer stack; outer and inner only meet through this dialog's
//! begin/continue/resume/end hooks.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::context::DialogContext;
use super::registry::DialogRegistry;
use super::{Dialog, DialogReason, DialogTurnResult, DialogTurnStatus};
use crate::error::{PalaverError, Result};
use crate::state::DialogInstance;
use crate::turn::TurnContext;

const DIALOG_STATE_KEY: &str = "dialogState";

/// A dialog that encapsulates its own nested stack of dialogs.
pub struct ComponentDialog {
    id: String,
    dialogs: DialogRegistry,
    initial_dialog_id: Option<String>,
}

impl ComponentDialog {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dialogs: DialogRegistry::new(),
            initial_dialog_id: None,
        }
    }

    /// Register a dialog on the inner registry. The first dialog added
    /// becomes the initial dialog unless [`with_initial`](Self::with_initial)
    /// overrides it.
    pub fn add_dialog(mut self, dialog: impl Dialog + 'static) -> Result<Self> {
        let id = dialog.id().to_string();
        self.dialogs.add(dialog)?;
        if self.initial_dialog_id.is_none() {
            self.initial_dialog_id = Some(id);
        }
        Ok(self)
    }

    /// Pick which inner dialog begins when the component does.
    pub fn with_initial(mut self, id: impl Into<String>) -> Self {
        self.initial_dialog_id = Some(id.into());
        self
    }

    fn initial_dialog_id(&self) -> Result<&str> {
        self.initial_dialog_id.as_deref().ok_or_else(|| {
            PalaverError::InvalidInput(format!("component '{}' has no dialogs", self.id))
        })
    }

    fn load_inner_stack(&self, instance: &DialogInstance) -> Result<Vec<DialogInstance>> {
        match instance.state.get(DIALOG_STATE_KEY) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(Vec::new()),
        }
    }

    fn store_inner_stack(
        &self,
        instance: &mut DialogInstance,
        inner_stack: &[DialogInstance],
    ) -> Result<()> {
        instance.state.insert(
            DIALOG_STATE_KEY.to_string(),
            serde_json::to_value(inner_stack)?,
        );
        Ok(())
    }

    /// Collapse: the inner stack finished, so end this frame on the outer
    /// stack, forwarding the inner result.
    async fn end_component(
        &self,
        dc: &mut DialogContext<'_>,
        result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        debug!(dialog_id = %self.id, "inner stack finished, collapsing component");
        dc.end_dialog(result).await
    }
}

#[async_trait]
impl Dialog for ComponentDialog {
    fn id(&self) -> &str {
        &self.id
    }

    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let initial = self.initial_dialog_id()?.to_string();
        let mut inner_stack: Vec<DialogInstance> = Vec::new();
        let turn_result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, &mut *dc.turn, &mut inner_stack);
            inner_dc.begin_dialog(&initial, options).await?
        };
        {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("component '{}' began without a frame", self.id))
            })?;
            self.store_inner_stack(instance, &inner_stack)?;
        }
        if turn_result.status == DialogTurnStatus::Waiting {
            Ok(DialogTurnResult::waiting())
        } else {
            self.end_component(dc, turn_result.result).await
        }
    }

    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        let mut inner_stack = {
            let instance = dc.active_instance().ok_or_else(|| {
                PalaverError::Other(format!("component '{}' continued without a frame", self.id))
            })?;
            self.load_inner_stack(instance)?
        };
        let turn_result = {
            let mut inner_dc = DialogContext::new(&self.dialogs, &mut *dc.turn, &mut inner_stack);
            inner_dc.continue_dialog().await?
        };
        {
            let instance = dc.active_instance_mut().ok_or_else(|| {
                PalaverError::Other(format!("component '{}' lost its frame", self.id))
            })?;
            self.store_inner_stack(instance, &inner_stack)?;
        }
        if turn_result.status == DialogTurnStatus::Waiting {
            Ok(DialogTurnResult::waiting())
        } else {
            self.end_component(dc, turn_result.result).await
        }
    }

    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        _result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        // A sibling pushed on top of this component ended. Re-prompt the
        // inner stack instead of collapsing prematurely.
        let mut inner_stack = {
            let instance = dc.active_instance().ok_or_else(|| {
                PalaverError::Other(format!("component '{}' resumed without a frame", self.id))
            })?;
            self.load_inner_stack(instance)?
        };
        {
            let mut inner_dc = DialogContext::new(&self.dialogs, &mut *dc.turn, &mut inner_stack);
            inner_dc.reprompt_dialog().await?;
        }
        if let Some(instance) = dc.active_instance_mut() {
            self.store_inner_stack(instance, &inner_stack)?;
        }
        Ok(DialogTurnResult::waiting())
    }

    async fn reprompt_dialog(
        &self,
        turn: &mut TurnContext,
        instance: &mut DialogInstance,
    ) -> Result<()> {
        let mut inner_stack = self.load_inner_stack(instance)?;
        {
            let mut inner_dc = DialogContext::new(&self.dialogs, turn, &mut inner_stack);
            inner_dc.reprompt_dialog().await?;
        }
        self.store_inner_stack(instance, &inner_stack)
    }

    async fn end_dialog(
        &self,
        turn: &mut TurnContext,
        instance: &mut DialogInstance,
        reason: DialogReason,
    ) -> Result<()> {
        // Cancellation tears the inner stack down before this frame goes.
        if reason == DialogReason::CancelCalled {
            let mut inner_stack = self.load_inner_stack(instance)?;
            {
                let mut inner_dc = DialogContext::new(&self.dialogs, turn, &mut inner_stack);
                inner_dc.cancel_all_dialogs().await?;
            }
            self.store_inner_stack(instance, &inner_stack)?;
        }
        Ok(())
    }
}
