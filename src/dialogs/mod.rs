// src/dialogs/mod.rs
// The dialog contract and the stack machinery built on top of it

//! Dialogs are named, stateful units implementing a small capability
//! interface (begin/continue/resume/reprompt/end). A [`DialogContext`]
//! drives one turn against the persisted stack; [`WaterfallDialog`] and
//! [`ComponentDialog`] compose richer conversations on top of the same
//! contract.

pub mod component;
pub mod context;
pub mod registry;
pub mod waterfall;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use component::ComponentDialog;
pub use context::DialogContext;
pub use registry::DialogRegistry;
pub use waterfall::{WaterfallDialog, WaterfallStep, WaterfallStepContext};

use crate::error::Result;
use crate::state::DialogInstance;
use crate::turn::TurnContext;

/// Where a turn left the stack after a top-level operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DialogTurnStatus {
    /// Stack is empty and nothing was started.
    Empty,
    /// The active dialog is waiting for the next inbound turn.
    Waiting,
    /// The last dialog on the stack completed; its result is available.
    Complete,
    /// The stack was cancelled and torn down.
    Cancelled,
}

/// Result of a stack operation or dialog method for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogTurnResult {
    pub status: DialogTurnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl DialogTurnResult {
    pub fn empty() -> Self {
        Self {
            status: DialogTurnStatus::Empty,
            result: None,
        }
    }

    /// End-of-turn: the active dialog keeps waiting.
    pub fn waiting() -> Self {
        Self {
            status: DialogTurnStatus::Waiting,
            result: None,
        }
    }

    pub fn complete(result: Option<Value>) -> Self {
        Self {
            status: DialogTurnStatus::Complete,
            result,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            status: DialogTurnStatus::Cancelled,
            result: None,
        }
    }
}

/// Why a dialog method is being invoked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DialogReason {
    /// A dialog was started via `begin_dialog`.
    BeginCalled,
    /// A dialog was continued with a new inbound turn.
    ContinueCalled,
    /// A dialog ended normally via `end_dialog`.
    EndCalled,
    /// A dialog was replaced on the stack.
    ReplaceCalled,
    /// The stack is being cancelled.
    CancelCalled,
    /// A waterfall step advanced via `next()`.
    NextCalled,
}

/// The polymorphic unit every dialog implements.
///
/// Implementations mutate only their own frame's state map; frames belonging
/// to other dialogs are off limits.
#[async_trait]
pub trait Dialog: Send + Sync {
    /// Registry key for this dialog.
    fn id(&self) -> &str;

    /// Called when the dialog is pushed onto the stack.
    async fn begin_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        options: Option<Value>,
    ) -> Result<DialogTurnResult>;

    /// Called when the dialog is the active frame and a new turn arrives.
    /// Default: end immediately, forwarding no result.
    async fn continue_dialog(&self, dc: &mut DialogContext<'_>) -> Result<DialogTurnResult> {
        dc.end_dialog(None).await
    }

    /// Called when a child dialog ended and this dialog is active again.
    /// Default: end as well, forwarding the child's result upward.
    async fn resume_dialog(
        &self,
        dc: &mut DialogContext<'_>,
        _reason: DialogReason,
        result: Option<Value>,
    ) -> Result<DialogTurnResult> {
        dc.end_dialog(result).await
    }

    /// Re-send whatever the dialog is waiting on. Default: nothing.
    async fn reprompt_dialog(
        &self,
        _turn: &mut TurnContext,
        _instance: &mut DialogInstance,
    ) -> Result<()> {
        Ok(())
    }

    /// Cleanup hook invoked when the dialog's frame is popped. Default:
    /// nothing.
    async fn end_dialog(
        &self,
        _turn: &mut TurnContext,
        _instance: &mut DialogInstance,
        _reason: DialogReason,
    ) -> Result<()> {
        Ok(())
    }
}
