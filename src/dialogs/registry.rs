// src/dialogs/registry.rs
// Name → dialog resolution, read-only after construction

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::context::DialogContext;
use super::{Dialog, DialogTurnResult, DialogTurnStatus};
use crate::error::{PalaverError, Result};
use crate::state::DialogState;
use crate::turn::TurnContext;

/// Pure name → behavior mapping for dialogs. Built once at startup, then
/// shared freely across conversations; nothing in here mutates at runtime.
#[derive(Default)]
pub struct DialogRegistry {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dialog under its id. Registering the same id twice is a
    /// programming error and fails.
    pub fn add(&mut self, dialog: impl Dialog + 'static) -> Result<()> {
        let id = dialog.id().to_string();
        if self.dialogs.contains_key(&id) {
            return Err(PalaverError::DuplicateDialog(id));
        }
        debug!(dialog_id = %id, "registered dialog");
        self.dialogs.insert(id, Arc::new(dialog));
        Ok(())
    }

    /// Resolve a dialog id to its behavior.
    pub fn find(&self, id: &str) -> Option<Arc<dyn Dialog>> {
        self.dialogs.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Canonical host entry point for one turn: continue whatever is on the
    /// stack, and if nothing is running begin `root_id`.
    pub async fn run_turn(
        &self,
        turn: &mut TurnContext,
        state: &mut DialogState,
        root_id: &str,
    ) -> Result<DialogTurnResult> {
        let mut dc = DialogContext::new(self, turn, &mut state.stack);
        let result = dc.continue_dialog().await?;
        if result.status == DialogTurnStatus::Empty {
            dc.begin_dialog(root_id, None).await
        } else {
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NullDialog {
        id: String,
    }

    #[async_trait]
    impl Dialog for NullDialog {
        fn id(&self) -> &str {
            &self.id
        }

        async fn begin_dialog(
            &self,
            dc: &mut DialogContext<'_>,
            _options: Option<Value>,
        ) -> Result<DialogTurnResult> {
            dc.end_dialog(None).await
        }
    }

    #[test]
    fn test_add_and_find() {
        let mut registry = DialogRegistry::new();
        registry
            .add(NullDialog {
                id: "noop".to_string(),
            })
            .unwrap();
        assert!(registry.find("noop").is_some());
        assert!(registry.find("other").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut registry = DialogRegistry::new();
        registry
            .add(NullDialog {
                id: "noop".to_string(),
            })
            .unwrap();
        let err = registry
            .add(NullDialog {
                id: "noop".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, PalaverError::DuplicateDialog(_)));
    }
}
