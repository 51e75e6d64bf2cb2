// src/state.rs
// Persisted dialog stack state and the storage collaborator boundary

//! [`DialogState`] is the only structure the engine asks the host to
//! persist. The host loads it once before a turn and saves it once after;
//! the engine never initiates storage I/O of its own. Everything reachable
//! from `DialogState` round-trips through serde unchanged.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;

/// Per-frame state bag. Keys are private to the dialog type that owns the
/// frame; no other dialog may read or write them.
pub type StateMap = serde_json::Map<String, Value>;

/// One persisted activation record for a running dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogInstance {
    /// Registry key resolving to the dialog's behavior.
    pub id: String,
    /// State bag exclusively owned by the dialog that created this frame.
    #[serde(default)]
    pub state: StateMap,
}

impl DialogInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: StateMap::new(),
        }
    }
}

/// The persisted dialog stack for one conversation. Index 0 is the
/// top/active frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogState {
    #[serde(default)]
    pub stack: Vec<DialogInstance>,
}

impl DialogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Storage collaborator: load-once/save-once per turn is the host's
/// contract. On a fatal turn error the host skips the save, leaving the
/// persisted stack exactly as it was before the failing operation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn load(&self, conversation_id: &str) -> Result<DialogState>;
    async fn save(&self, conversation_id: &str, state: &DialogState) -> Result<()>;
}

/// In-memory store keyed by conversation id. Suits tests and single-process
/// hosts; anything durable lives behind the same trait on the host side.
#[derive(Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<String, DialogState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn load(&self, conversation_id: &str) -> Result<DialogState> {
        let states = self.states.read().await;
        Ok(states.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn save(&self, conversation_id: &str, state: &DialogState) -> Result<()> {
        let mut states = self.states.write().await;
        states.insert(conversation_id.to_string(), state.clone());
        Ok(())
    }
}

/// File-backed store writing one JSON document per conversation. Used by
/// the REPL binary so conversations survive restarts.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        // Conversation ids come from the host; keep the file name tame.
        let safe: String = conversation_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn load(&self, conversation_id: &str) -> Result<DialogState> {
        let path = self.path_for(conversation_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no persisted state, starting fresh");
                Ok(DialogState::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, conversation_id: &str, state: &DialogState) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(conversation_id);
        let contents = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&path, contents).await?;
        Ok(())
    }
}
