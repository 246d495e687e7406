//! Collaborator seam between the engine and its host. The engine never
//! reaches for ambient state: every operation goes through an injected
//! [`HostBridge`], which keeps the engine host-agnostic and testable
//! without a live event bus.

use std::fmt;

use contracts::stat_doc::StatData;
use contracts::InjectionPrompt;
use serde_json::Value;

#[derive(Debug)]
pub enum HostError {
    /// The chat-scoped blob store failed to load or save.
    Store(String),
    /// The mirrored snapshot document could not be read or replaced.
    Document(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(detail) => write!(f, "blob store error: {detail}"),
            Self::Document(detail) => write!(f, "mirrored document error: {detail}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Narrow contracts the engine consumes from its host: a chat-scoped blob
/// store with whole-document semantics, a mirrored snapshot accessor scoped
/// to the latest turn, a fire-and-forget prompt-injection call, and a clock.
pub trait HostBridge {
    /// Raw persisted roster blob, `None` when nothing was ever written.
    /// Decoding (and fallback on undecodable blobs) is the engine's job.
    fn load_roster(&mut self) -> Result<Option<Value>, HostError>;

    /// Whole-document replace of the persisted roster blob.
    fn save_roster(&mut self, blob: &Value) -> Result<(), HostError>;

    /// Raw mirrored snapshot document from the latest turn.
    fn read_stat(&mut self) -> Result<Value, HostError>;

    /// Whole-document replace of the mirrored snapshot.
    fn replace_stat(&mut self, doc: &StatData) -> Result<(), HostError>;

    /// Hands profile tokens to the host for one-shot insertion into the next
    /// generation context. Delivery is not acknowledged.
    fn inject_prompts(&mut self, prompts: &[InjectionPrompt]);

    /// Milliseconds since the Unix epoch, used for `updated_at` stamps.
    fn now_ms(&mut self) -> i64;
}
