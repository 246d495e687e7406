//! The engine facade: every operation in the host-facing API surface plus
//! one explicit entry point per host event. Each mutating call runs a full
//! read → sanitize → mutate → write cycle against the persisted roster blob
//! and ends by pushing the canonical party view into the mirrored snapshot.

use std::fmt;

use contracts::normalize::{normalize_partner_id, try_normalize_class, try_normalize_grade};
use contracts::stat_doc::{parse_stat, StatData, StatParseError};
use contracts::{
    DrawCode, DrawResult, NewPartnerInput, OwnedPartnerSummary, PartnerDbState, PartySlot,
    PoolPartner, PoolRefreshResult, RosterSnapshot, SLOTS,
};
use serde_json::Value;

use crate::gacha::{
    draw_candidates, find_pool_by_name, is_duplicate_owned, pick_by_weight, DrawKind, DrawRng,
    COST_CUSTOM, COST_PICKUP,
};
use crate::host::{HostBridge, HostError};
use crate::pool_csv::parse_pool_csv;
use crate::profile::{
    build_profile_tokens, consume_brief_queue, enqueue_brief_profiles, find_mentioned_partners,
    make_injection_prompts,
};
use crate::reconcile::{add_to_party, apply_stat_to_store, apply_store_to_stat, remove_from_party};
use crate::store::{ensure, make_partner_record};

#[derive(Debug)]
pub enum EngineError {
    Host(HostError),
    Stat(StatParseError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(err) => write!(f, "host collaborator failed: {err}"),
            Self::Stat(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<HostError> for EngineError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

impl From<StatParseError> for EngineError {
    fn from(value: StatParseError) -> Self {
        Self::Stat(value)
    }
}

#[derive(Debug)]
pub struct PartnerEngine<H: HostBridge> {
    host: H,
    rng: DrawRng,
}

impl<H: HostBridge> PartnerEngine<H> {
    pub fn new(host: H, seed: u64) -> Self {
        Self {
            host,
            rng: DrawRng::new(seed),
        }
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // ---- store and snapshot plumbing ----

    fn ensure_store(&mut self) -> Result<PartnerDbState, EngineError> {
        let raw = self.host.load_roster()?;
        let now = self.host.now_ms();
        let (state, dirty) = ensure(raw, now);
        if dirty {
            self.write_store(&state)?;
        }
        Ok(state)
    }

    fn write_store(&mut self, state: &PartnerDbState) -> Result<(), EngineError> {
        let blob = serde_json::to_value(state)
            .map_err(|err| HostError::Store(format!("roster blob encode failed: {err}")))?;
        self.host.save_roster(&blob)?;
        Ok(())
    }

    fn read_stat(&mut self) -> Result<StatData, EngineError> {
        let raw = self.host.read_stat()?;
        Ok(parse_stat(&raw)?.repair())
    }

    fn push_store_to_stat(&mut self, state: &PartnerDbState) -> Result<(), EngineError> {
        let mut stat = self.read_stat()?;
        apply_store_to_stat(state, &mut stat);
        self.host.replace_stat(&stat)?;
        Ok(())
    }

    // ---- currency ledger on the mirrored document ----

    fn read_sdp(&mut self) -> Result<i64, EngineError> {
        Ok(self.read_stat()?.user.sdp)
    }

    /// Applies a signed delta to the balance, clamping at zero, and returns
    /// the new balance.
    pub fn grant_sdp(&mut self, amount: i64) -> Result<i64, EngineError> {
        let mut stat = self.read_stat()?;
        stat.user.sdp = (stat.user.sdp + amount).max(0);
        let balance = stat.user.sdp;
        self.host.replace_stat(&stat)?;
        Ok(balance)
    }

    /// Fails without mutation when the balance cannot cover the cost.
    fn spend_sdp(&mut self, cost: i64) -> Result<bool, EngineError> {
        if self.read_sdp()? < cost {
            return Ok(false);
        }
        self.grant_sdp(-cost)?;
        Ok(true)
    }

    // ---- presentation-facing operations ----

    pub fn snapshot(&mut self) -> Result<RosterSnapshot, EngineError> {
        let state = self.ensure_store()?;
        let stat = self.read_stat()?;

        let party_slots = SLOTS
            .into_iter()
            .map(|slot| (slot, stat.user.party_slots.get(slot).to_string()))
            .collect();

        let mut owned_partners: Vec<OwnedPartnerSummary> = state
            .partner_db
            .values()
            .map(|record| OwnedPartnerSummary {
                id: record.id.clone(),
                name: record.meta.name.clone(),
                grade: record.meta.grade,
                class: record.meta.class,
                job: record.meta.job.clone(),
                in_party: record.state.in_party,
                alive: record.state.alive,
                level: record.state.level,
            })
            .collect();
        owned_partners.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let mut pool: Vec<PoolPartner> = state.runtime.pool.values().cloned().collect();
        pool.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        Ok(RosterSnapshot {
            sdp: stat.user.sdp,
            owned_count: owned_partners.len(),
            in_party_count: owned_partners.iter().filter(|entry| entry.in_party).count(),
            pool_count: pool.len(),
            csv_url: state.runtime.csv_url.clone(),
            last_pool_sync_at: state.runtime.last_pool_sync_at,
            party_slots,
            user: stat.user,
            mission: stat.mission,
            pool,
            owned_partners,
        })
    }

    pub fn set_pool_csv_url(&mut self, url: &str) -> Result<(), EngineError> {
        let mut state = self.ensure_store()?;
        state.runtime.csv_url = url.trim().to_string();
        self.write_store(&state)
    }

    pub fn pool_csv_url(&mut self) -> Result<String, EngineError> {
        Ok(self.ensure_store()?.runtime.csv_url)
    }

    /// Replaces the imported pool from a fetched CSV document. Fetching is
    /// the adapter's job; an empty parse is reported, not thrown.
    pub fn install_pool_csv(&mut self, csv_text: &str) -> Result<PoolRefreshResult, EngineError> {
        let mut state = self.ensure_store()?;
        let pool = match parse_pool_csv(csv_text) {
            Ok(pool) => pool,
            Err(_) => {
                return Ok(PoolRefreshResult {
                    ok: false,
                    message: "CSV parse produced no entries.".to_string(),
                    count: 0,
                });
            }
        };
        let count = pool.len();
        state.runtime.pool = pool;
        state.runtime.last_pool_sync_at = self.host.now_ms();
        self.write_store(&state)?;
        Ok(PoolRefreshResult {
            ok: true,
            message: format!("Loaded {count} pool entries."),
            count,
        })
    }

    pub fn draw_gacha(&mut self, kind: DrawKind) -> Result<DrawResult, EngineError> {
        let cost = kind.cost();
        if !self.spend_sdp(cost)? {
            return Ok(DrawResult::failure(DrawCode::InsufficientSdp, "Not enough SDP."));
        }

        let state = self.ensure_store()?;
        let pool: Vec<&PoolPartner> = state.runtime.pool.values().collect();
        if pool.is_empty() {
            self.grant_sdp(cost)?;
            return Ok(DrawResult::failure(DrawCode::EmptyPool, "The draw pool is empty."));
        }

        let grade = pick_by_weight(kind.rate_table(), &mut self.rng);
        let candidates = draw_candidates(&pool, grade);
        let picked = pool[candidates[self.rng.pick_index(candidates.len())]].clone();

        self.finish_pool_registration(state, picked, cost)
    }

    pub fn pickup_by_name(&mut self, name: &str) -> Result<DrawResult, EngineError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Ok(DrawResult::failure(DrawCode::PickupNotFound, "Enter a name."));
        }

        if !self.spend_sdp(COST_PICKUP)? {
            return Ok(DrawResult::failure(DrawCode::InsufficientSdp, "Not enough SDP."));
        }

        let state = self.ensure_store()?;
        let Some(target) = find_pool_by_name(state.runtime.pool.values(), trimmed).cloned() else {
            self.grant_sdp(COST_PICKUP)?;
            return Ok(DrawResult::failure(
                DrawCode::PickupNotFound,
                "No partner with that name in the draw pool.",
            ));
        };

        self.finish_pool_registration(state, target, COST_PICKUP)
    }

    pub fn register_custom_partner(
        &mut self,
        input: &NewPartnerInput,
    ) -> Result<DrawResult, EngineError> {
        let id_source = if input.id.trim().is_empty() { &input.name } else { &input.id };
        let id = normalize_partner_id(id_source);
        if id.is_empty() || input.name.trim().is_empty() {
            return Ok(DrawResult::failure(
                DrawCode::CustomIdExists,
                "Check the partner name and id.",
            ));
        }

        // Strict normalization: invalid input is a user-facing rejection
        // here, never a silent fallback. No currency is touched yet.
        let Some(grade) = try_normalize_grade(&input.grade) else {
            return Ok(DrawResult::failure(
                DrawCode::InvalidGrade,
                "Invalid grade. Use one of: EX, S, A, B, C, D.",
            ));
        };
        let Some(class) = try_normalize_class(&input.class) else {
            return Ok(DrawResult::failure(
                DrawCode::InvalidClass,
                "Invalid class. Use one of: tank, dps, heal, support, allRound.",
            ));
        };

        let mut state = self.ensure_store()?;
        if find_pool_by_name(state.runtime.pool.values(), &input.name).is_some() {
            return Ok(DrawResult::failure(
                DrawCode::CustomNameExistsInPool,
                "That partner is already in the draw pool.",
            ));
        }
        if state.partner_db.contains_key(&id) {
            return Ok(DrawResult::failure(
                DrawCode::CustomIdExists,
                "That partner id already exists.",
            ));
        }

        if !self.spend_sdp(COST_CUSTOM)? {
            return Ok(DrawResult::failure(DrawCode::InsufficientSdp, "Not enough SDP."));
        }

        let now = self.host.now_ms();
        let record = make_partner_record(
            &NewPartnerInput {
                id: id.clone(),
                grade: grade.as_str().to_string(),
                class: class.as_str().to_string(),
                ..input.clone()
            },
            now,
        );
        let partner_id = record.id.clone();
        let partner_name = record.meta.name.clone();
        state.partner_db.insert(partner_id.clone(), record);
        enqueue_brief_profiles(&mut state, &[partner_id.clone()]);
        self.write_store(&state)?;
        self.push_store_to_stat(&state)?;

        Ok(DrawResult {
            ok: true,
            code: DrawCode::Ok,
            message: format!("{partner_name} registered as a custom partner."),
            spent: COST_CUSTOM,
            refund: 0,
            partner_id: Some(partner_id),
            partner_name: Some(partner_name),
            is_duplicate: Some(false),
        })
    }

    pub fn add_partner_to_party(
        &mut self,
        partner_id: &str,
        slot: Option<PartySlot>,
    ) -> Result<bool, EngineError> {
        let mut state = self.ensure_store()?;
        let now = self.host.now_ms();
        if !add_to_party(&mut state, partner_id, slot, now) {
            return Ok(false);
        }
        self.write_store(&state)?;
        self.push_store_to_stat(&state)?;
        Ok(true)
    }

    pub fn remove_partner_from_party(&mut self, id_or_slot: &str) -> Result<bool, EngineError> {
        let mut state = self.ensure_store()?;
        let now = self.host.now_ms();
        if !remove_from_party(&mut state, id_or_slot, now) {
            return Ok(false);
        }
        self.write_store(&state)?;
        self.push_store_to_stat(&state)?;
        Ok(true)
    }

    pub fn queue_brief_profile(&mut self, partner_id: &str) -> Result<(), EngineError> {
        let mut state = self.ensure_store()?;
        enqueue_brief_profiles(&mut state, &[partner_id.to_string()]);
        self.write_store(&state)
    }

    /// Forces a Store→External push of the canonical party view.
    pub fn sync_now(&mut self) -> Result<(), EngineError> {
        let state = self.ensure_store()?;
        self.push_store_to_stat(&state)
    }

    // ---- host event entry points ----

    /// The host finished updating the mirrored document: pull external edits
    /// into the store, then push the canonical view back out, in that order,
    /// so a push never discards an edit from the same cycle.
    pub fn apply_stat_update(&mut self, raw: &Value) -> Result<(), EngineError> {
        let mut state = self.ensure_store()?;
        let mut stat = parse_stat(raw)?.repair();
        let now = self.host.now_ms();
        apply_stat_to_store(&mut state, &stat, now);
        apply_store_to_stat(&state, &mut stat);
        self.host.replace_stat(&stat)?;
        self.write_store(&state)
    }

    /// A player-authored message was rendered: queue briefs for every owned,
    /// alive, out-of-party partner it mentions.
    pub fn note_user_message(&mut self, message: &str) -> Result<(), EngineError> {
        let mut state = self.ensure_store()?;
        let mentioned = find_mentioned_partners(&state, message);
        if mentioned.is_empty() {
            return Ok(());
        }
        enqueue_brief_profiles(&mut state, &mentioned);
        self.write_store(&state)
    }

    /// Generation is about to run: drain the queue, hand the composed tokens
    /// to the injection collaborator, and persist the cleared queue whether
    /// or not the injection is acknowledged. Dry runs are ignored.
    pub fn begin_generation(&mut self, dry_run: bool) -> Result<(), EngineError> {
        if dry_run {
            return Ok(());
        }
        let mut state = self.ensure_store()?;
        let brief_ids = consume_brief_queue(&mut state);
        let tokens = build_profile_tokens(&state, &brief_ids);
        if !tokens.is_empty() {
            let now = self.host.now_ms();
            let prompts = make_injection_prompts(&tokens, now);
            self.host.inject_prompts(&prompts);
        }
        self.write_store(&state)
    }

    /// The chat switched: re-derive the mirrored view from canonical state.
    pub fn chat_changed(&mut self) -> Result<(), EngineError> {
        self.sync_now()
    }

    // ---- gacha internals ----

    /// Shared tail of every pool-sourced acquisition: duplicate detection
    /// with half refund, or record creation, brief enqueue, persist, and
    /// mirror push. `spent` always reflects the nominal cost.
    fn finish_pool_registration(
        &mut self,
        mut state: PartnerDbState,
        entry: PoolPartner,
        cost: i64,
    ) -> Result<DrawResult, EngineError> {
        if is_duplicate_owned(&state, &entry) {
            let refund = cost / 2;
            self.grant_sdp(refund)?;
            return Ok(DrawResult {
                ok: true,
                code: DrawCode::Ok,
                message: format!("{} is a duplicate; {refund} SDP refunded.", entry.name),
                spent: cost,
                refund,
                partner_id: Some(entry.id),
                partner_name: Some(entry.name),
                is_duplicate: Some(true),
            });
        }

        let now = self.host.now_ms();
        let record = make_partner_record(
            &NewPartnerInput {
                id: entry.id.clone(),
                name: entry.name.clone(),
                grade: entry.grade.as_str().to_string(),
                class: entry.class.as_str().to_string(),
                job: entry.job.clone(),
                brief_key: Some(entry.brief_key.clone()),
                detail_key: Some(entry.detail_key.clone()),
                ..NewPartnerInput::default()
            },
            now,
        );
        let partner_id = record.id.clone();
        let partner_name = record.meta.name.clone();
        state.partner_db.insert(partner_id.clone(), record);
        enqueue_brief_profiles(&mut state, &[partner_id.clone()]);
        self.write_store(&state)?;
        self.push_store_to_stat(&state)?;

        Ok(DrawResult {
            ok: true,
            code: DrawCode::Ok,
            message: format!("{partner_name} joined the roster."),
            spent: cost,
            refund: 0,
            partner_id: Some(partner_id),
            partner_name: Some(partner_name),
            is_duplicate: Some(false),
        })
    }
}
