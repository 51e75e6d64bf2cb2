// src/dialogs/context.rs
// Stack operations for one turn of one conversation

use serde_json::Value;
use tracing::debug;

use super::registry::DialogRegistry;
use super::{DialogReason, DialogTurnResult, DialogTurnStatus};
use crate::error::{PalaverError, Result};
use crate::prompts::PromptOptions;
use crate::state::DialogInstance;
use crate::turn::TurnContext;

/// Drives the persisted dialog stack for the duration of one turn.
///
/// All operations are synchronous with respect to the stack: any suspension
/// happens only inside invoked dialogs' I/O. Registry lookups happen before
/// any stack mutation, so a failed lookup aborts the operation with the
/// stack untouched.
pub struct DialogContext<'a> {
    dialogs: &'a DialogRegistry,
    pub turn: &'a mut TurnContext,
    stack: &'a mut Vec<DialogInstance>,
}

impl<'a> DialogContext<'a> {
    pub fn new(
        dialogs: &'a DialogRegistry,
        turn: &'a mut TurnContext,
        stack: &'a mut Vec<DialogInstance>,
    ) -> Self {
        Self {
            dialogs,
            turn,
            stack,
        }
    }

    /// The active (top) frame, if any. Index 0 is the top of the stack.
    pub fn active_instance(&self) -> Option<&DialogInstance> {
        self.stack.first()
    }

    /// Mutable access to the active frame's state, for the dialog that owns
    /// it.
    pub fn active_instance_mut(&mut self) -> Option<&mut DialogInstance> {
        self.stack.first_mut()
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Topmost frame belonging to the given dialog id. Lets a dialog reach
    /// its own frame after pushing children on top of it.
    pub(crate) fn find_instance_mut(&mut self, id: &str) -> Option<&mut DialogInstance> {
        self.stack.iter_mut().find(|i| i.id == id)
    }

    /// Push a new instance of the dialog registered under `id` and invoke
    /// its begin handler.
    pub async fn begin_dialog(
        &mut self,
        id: &str,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        let dialog = self
            .dialogs
            .find(id)
            .ok_or_else(|| PalaverError::DialogNotFound(id.to_string()))?;
        debug!(dialog_id = %id, depth = self.stack.len(), "beginning dialog");
        self.stack.insert(0, DialogInstance::new(id));
        dialog.begin_dialog(self, options).await
    }

    /// Begin a prompt dialog with typed options.
    pub async fn prompt(&mut self, id: &str, options: PromptOptions) -> Result<DialogTurnResult> {
        self.begin_dialog(id, Some(serde_json::to_value(options)?))
            .await
    }

    /// Route the inbound turn to the active dialog, or report an empty
    /// stack.
    pub async fn continue_dialog(&mut self) -> Result<DialogTurnResult> {
        let Some(instance) = self.stack.first() else {
            return Ok(DialogTurnResult::empty());
        };
        let id = instance.id.clone();
        let dialog = self
            .dialogs
            .find(&id)
            .ok_or_else(|| PalaverError::DialogNotFound(id.clone()))?;
        debug!(dialog_id = %id, "continuing dialog");
        dialog.continue_dialog(self).await
    }

    /// Pop the active frame and resume the parent with `result`. When the
    /// last frame pops, the turn completes with `result`.
    pub async fn end_dialog(&mut self, result: Option<Value>) -> Result<DialogTurnResult> {
        self.end_active_dialog(DialogReason::EndCalled).await?;
        match self.stack.first() {
            Some(instance) => {
                let id = instance.id.clone();
                let dialog = self
                    .dialogs
                    .find(&id)
                    .ok_or_else(|| PalaverError::DialogNotFound(id.clone()))?;
                debug!(dialog_id = %id, "resuming parent dialog");
                dialog
                    .resume_dialog(self, DialogReason::EndCalled, result)
                    .await
            }
            None => Ok(DialogTurnResult::complete(result)),
        }
    }

    /// Pop the active frame without its cleanup hook and immediately begin
    /// the dialog registered under `id` in its place. Supports loops and
    /// redirects without growing the stack.
    pub async fn replace_dialog(
        &mut self,
        id: &str,
        options: Option<Value>,
    ) -> Result<DialogTurnResult> {
        // Resolve before popping: a bad id must leave the stack untouched.
        if self.dialogs.find(id).is_none() {
            return Err(PalaverError::DialogNotFound(id.to_string()));
        }
        if !self.stack.is_empty() {
            self.stack.remove(0);
        }
        self.begin_dialog(id, options).await
    }

    /// Tear down the whole stack top-to-bottom, invoking each frame's
    /// cleanup hook with `CancelCalled`. No-op on an empty stack.
    pub async fn cancel_all_dialogs(&mut self) -> Result<DialogTurnResult> {
        if self.stack.is_empty() {
            return Ok(DialogTurnResult::empty());
        }
        debug!(depth = self.stack.len(), "cancelling all dialogs");
        while !self.stack.is_empty() {
            self.end_active_dialog(DialogReason::CancelCalled).await?;
        }
        Ok(DialogTurnResult::cancelled())
    }

    /// Ask the active dialog to re-send whatever it is waiting on.
    pub async fn reprompt_dialog(&mut self) -> Result<()> {
        if let Some(instance) = self.stack.first_mut() {
            let id = instance.id.clone();
            let dialog = self
                .dialogs
                .find(&id)
                .ok_or_else(|| PalaverError::DialogNotFound(id))?;
            dialog.reprompt_dialog(self.turn, instance).await?;
        }
        Ok(())
    }

    /// Invoke the active frame's cleanup hook, then pop it.
    async fn end_active_dialog(&mut self, reason: DialogReason) -> Result<()> {
        if let Some(instance) = self.stack.first_mut() {
            let id = instance.id.clone();
            if let Some(dialog) = self.dialogs.find(&id) {
                debug!(dialog_id = %id, ?reason, "ending dialog");
                dialog.end_dialog(self.turn, instance, reason).await?;
            }
            self.stack.remove(0);
        }
        Ok(())
    }
}
