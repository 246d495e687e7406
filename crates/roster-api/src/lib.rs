//! Host adapter: SQLite-backed host collaborators, the `EngineApi` facade,
//! and an HTTP server exposing the roster operations to the presentation
//! layer.

mod persistence;
mod server;

use std::path::Path;

use contracts::{
    DrawResult, InjectionPrompt, NewPartnerInput, PartySlot, PoolRefreshResult, RosterSnapshot,
};
use roster_core::gacha::DrawKind;
use roster_core::{EngineError, PartnerEngine};
use serde_json::Value;

use persistence::SqliteHost;
pub use persistence::PersistenceError;
pub use server::{serve, ServerError};

/// One engine bound to one SQLite database. All operations run a full
/// read-modify-write cycle; serialization of concurrent callers is the
/// server's job.
#[derive(Debug)]
pub struct EngineApi {
    engine: PartnerEngine<SqliteHost>,
}

impl EngineApi {
    pub fn open(path: impl AsRef<Path>, seed: u64) -> Result<Self, PersistenceError> {
        let host = SqliteHost::open(path)?;
        Ok(Self {
            engine: PartnerEngine::new(host, seed),
        })
    }

    pub fn open_in_memory(seed: u64) -> Result<Self, PersistenceError> {
        let host = SqliteHost::open_in_memory()?;
        Ok(Self {
            engine: PartnerEngine::new(host, seed),
        })
    }

    pub fn snapshot(&mut self) -> Result<RosterSnapshot, EngineError> {
        self.engine.snapshot()
    }

    pub fn set_pool_csv_url(&mut self, url: &str) -> Result<(), EngineError> {
        self.engine.set_pool_csv_url(url)
    }

    pub fn pool_csv_url(&mut self) -> Result<String, EngineError> {
        self.engine.pool_csv_url()
    }

    pub fn install_pool_csv(&mut self, csv_text: &str) -> Result<PoolRefreshResult, EngineError> {
        self.engine.install_pool_csv(csv_text)
    }

    /// Fetches the configured CSV document once and installs the parsed
    /// pool. Fetch failures are reported in the result, not raised; only
    /// host collaborator failures propagate.
    pub async fn refresh_pool_from_csv(&mut self) -> Result<PoolRefreshResult, EngineError> {
        let url = self.engine.pool_csv_url()?;
        if url.is_empty() {
            return Ok(PoolRefreshResult {
                ok: false,
                message: "No pool CSV URL is configured.".to_string(),
                count: 0,
            });
        }

        let csv_text = match fetch_csv(&url).await {
            Ok(text) => text,
            Err(message) => {
                tracing::warn!(%url, %message, "pool CSV fetch failed");
                return Ok(PoolRefreshResult {
                    ok: false,
                    message,
                    count: 0,
                });
            }
        };

        self.engine.install_pool_csv(&csv_text)
    }

    pub fn draw_gacha(&mut self, kind: DrawKind) -> Result<DrawResult, EngineError> {
        self.engine.draw_gacha(kind)
    }

    pub fn pickup_by_name(&mut self, name: &str) -> Result<DrawResult, EngineError> {
        self.engine.pickup_by_name(name)
    }

    pub fn register_custom_partner(
        &mut self,
        input: &NewPartnerInput,
    ) -> Result<DrawResult, EngineError> {
        self.engine.register_custom_partner(input)
    }

    pub fn add_partner_to_party(
        &mut self,
        partner_id: &str,
        slot: Option<PartySlot>,
    ) -> Result<bool, EngineError> {
        self.engine.add_partner_to_party(partner_id, slot)
    }

    pub fn remove_partner_from_party(&mut self, id_or_slot: &str) -> Result<bool, EngineError> {
        self.engine.remove_partner_from_party(id_or_slot)
    }

    pub fn grant_sdp(&mut self, amount: i64) -> Result<i64, EngineError> {
        self.engine.grant_sdp(amount)
    }

    pub fn queue_brief_profile(&mut self, partner_id: &str) -> Result<(), EngineError> {
        self.engine.queue_brief_profile(partner_id)
    }

    pub fn sync_now(&mut self) -> Result<(), EngineError> {
        self.engine.sync_now()
    }

    pub fn apply_stat_update(&mut self, raw: &Value) -> Result<(), EngineError> {
        self.engine.apply_stat_update(raw)
    }

    pub fn note_user_message(&mut self, message: &str) -> Result<(), EngineError> {
        self.engine.note_user_message(message)
    }

    pub fn begin_generation(&mut self, dry_run: bool) -> Result<(), EngineError> {
        self.engine.begin_generation(dry_run)
    }

    pub fn chat_changed(&mut self) -> Result<(), EngineError> {
        self.engine.chat_changed()
    }

    /// Prompts queued by [`EngineApi::begin_generation`], removed on read.
    pub fn drain_pending_prompts(&mut self) -> Result<Vec<InjectionPrompt>, PersistenceError> {
        self.engine.host_mut().drain_pending_prompts()
    }
}

async fn fetch_csv(url: &str) -> Result<String, String> {
    let response = reqwest::get(url)
        .await
        .map_err(|err| format!("fetch failed: {err}"))?;
    if !response.status().is_success() {
        return Err(format!("fetch failed: status {}", response.status()));
    }
    response
        .text()
        .await
        .map_err(|err| format!("fetch failed: {err}"))
}
