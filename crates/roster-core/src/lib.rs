//! Partner state engine: canonical roster store, weighted gacha draws, CSV
//! pool import, bidirectional reconciliation with the host's mirrored
//! snapshot, and the profile-injection queue.

pub mod engine;
pub mod gacha;
pub mod host;
pub mod pool_csv;
pub mod profile;
pub mod reconcile;
pub mod store;

pub use engine::{EngineError, PartnerEngine};
pub use host::{HostBridge, HostError};
