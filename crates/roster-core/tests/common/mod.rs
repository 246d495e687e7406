#![allow(dead_code)]

use contracts::stat_doc::{parse_stat, StatData};
use contracts::InjectionPrompt;
use roster_core::{HostBridge, HostError, PartnerEngine};
use serde_json::Value;

/// In-memory stand-in for the host: one roster blob, one mirrored document,
/// recorded injections, and a monotonic clock.
pub struct MemoryHost {
    pub roster_blob: Option<Value>,
    pub stat_doc: Value,
    pub injected: Vec<InjectionPrompt>,
    pub clock: i64,
}

impl MemoryHost {
    pub fn with_sdp(sdp: i64) -> Self {
        let mut stat = StatData::default();
        stat.user.sdp = sdp;
        Self {
            roster_blob: None,
            stat_doc: serde_json::to_value(&stat).expect("stat encode"),
            injected: Vec::new(),
            clock: 1_000,
        }
    }

    pub fn stat(&self) -> StatData {
        parse_stat(&self.stat_doc).expect("stat decode")
    }
}

impl HostBridge for MemoryHost {
    fn load_roster(&mut self) -> Result<Option<Value>, HostError> {
        Ok(self.roster_blob.clone())
    }

    fn save_roster(&mut self, blob: &Value) -> Result<(), HostError> {
        self.roster_blob = Some(blob.clone());
        Ok(())
    }

    fn read_stat(&mut self) -> Result<Value, HostError> {
        Ok(self.stat_doc.clone())
    }

    fn replace_stat(&mut self, doc: &StatData) -> Result<(), HostError> {
        self.stat_doc = serde_json::to_value(doc)
            .map_err(|err| HostError::Document(err.to_string()))?;
        Ok(())
    }

    fn inject_prompts(&mut self, prompts: &[InjectionPrompt]) {
        self.injected.extend_from_slice(prompts);
    }

    fn now_ms(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

pub fn engine_with_sdp(sdp: i64, seed: u64) -> PartnerEngine<MemoryHost> {
    PartnerEngine::new(MemoryHost::with_sdp(sdp), seed)
}
