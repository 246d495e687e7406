//! Canonical partner store: seeding, tolerant decoding of the persisted
//! blob, defensive sanitation, and party-membership bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use contracts::normalize::{
    clamp_state, default_brief_key, default_detail_key, normalize_class, normalize_grade,
    normalize_partner_id,
};
use contracts::{
    NewPartnerInput, PartnerClass, PartnerDbState, PartnerGrade, PartnerMeta, PartnerRecord,
    PartnerState, PoolPartner, ProfileKeys, SLOTS,
};
use serde_json::Value;

pub const DEFAULT_JOB: &str = "unassigned";

/// Builds a canonical record from user- or pool-supplied fields. Grade and
/// class fall back leniently here; strict validation happens earlier, where
/// rejection is required.
pub fn make_partner_record(input: &NewPartnerInput, now_ms: i64) -> PartnerRecord {
    let id = normalize_partner_id(&input.id);
    let job = input.job.trim();
    PartnerRecord {
        meta: PartnerMeta {
            name: input.name.trim().to_string(),
            grade: normalize_grade(&input.grade, PartnerGrade::D),
            class: normalize_class(&input.class, PartnerClass::Support),
            job: if job.is_empty() { DEFAULT_JOB.to_string() } else { job.to_string() },
        },
        state: clamp_state(PartnerState {
            level: input.level.unwrap_or(1),
            affinity: input.affinity.unwrap_or(0),
            love_level: input.love_level.unwrap_or(0),
            fatigue: 0,
            alive: true,
            in_party: false,
        }),
        profile_keys: ProfileKeys {
            brief_key: input
                .brief_key
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| default_brief_key(&id)),
            detail_key: input
                .detail_key
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or_else(|| default_detail_key(&id)),
        },
        id,
        updated_at: now_ms,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolEntryInput<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub grade: &'a str,
    pub class: &'a str,
    pub job: &'a str,
    pub brief_key: Option<&'a str>,
    pub detail_key: Option<&'a str>,
}

/// Builds an importable pool entry; the id derives from the id field and
/// falls back to the display name.
pub fn make_pool_partner(input: PoolEntryInput<'_>) -> PoolPartner {
    let id_source = if input.id.trim().is_empty() { input.name } else { input.id };
    let id = normalize_partner_id(id_source);
    let name = input.name.trim();
    let job = input.job.trim();
    PoolPartner {
        name: if name.is_empty() { id.clone() } else { name.to_string() },
        grade: normalize_grade(input.grade, PartnerGrade::D),
        class: normalize_class(input.class, PartnerClass::Support),
        job: if job.is_empty() { DEFAULT_JOB.to_string() } else { job.to_string() },
        brief_key: input
            .brief_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_brief_key(&id)),
        detail_key: input
            .detail_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_detail_key(&id)),
        id,
    }
}

fn demo_pool() -> BTreeMap<String, PoolPartner> {
    let mut pool = BTreeMap::new();
    for (id, name, grade, class, job) in [
        ("luna", "Luna", "B", "support", "information broker"),
        ("rhea", "Rhea", "C", "heal", "field medic"),
    ] {
        let entry = make_pool_partner(PoolEntryInput {
            id,
            name,
            grade,
            class,
            job,
            ..PoolEntryInput::default()
        });
        pool.insert(entry.id.clone(), entry);
    }
    pool
}

/// Deterministic default: two demo partners, one already in the party, and a
/// matching demo pool.
pub fn default_state(now_ms: i64) -> PartnerDbState {
    let mut luna = make_partner_record(
        &NewPartnerInput {
            id: "luna".to_string(),
            name: "Luna".to_string(),
            grade: "B".to_string(),
            class: "support".to_string(),
            job: "information broker".to_string(),
            affinity: Some(15),
            ..NewPartnerInput::default()
        },
        now_ms,
    );
    luna.state.in_party = true;
    luna.state.fatigue = 20;

    let mut rhea = make_partner_record(
        &NewPartnerInput {
            id: "rhea".to_string(),
            name: "Rhea".to_string(),
            grade: "C".to_string(),
            class: "heal".to_string(),
            job: "field medic".to_string(),
            affinity: Some(-5),
            ..NewPartnerInput::default()
        },
        now_ms,
    );
    rhea.state.fatigue = 10;

    let mut partner_db = BTreeMap::new();
    partner_db.insert(luna.id.clone(), luna);
    partner_db.insert(rhea.id.clone(), rhea);

    let mut state = PartnerDbState::default();
    state.partner_db = partner_db;
    state.runtime.pool = demo_pool();
    state
}

/// Re-runs lenient normalization over every stored grade and class; repair
/// against externally corrupted blobs.
pub fn sanitize(state: &mut PartnerDbState) {
    for partner in state.partner_db.values_mut() {
        partner.meta.grade = normalize_grade(partner.meta.grade.as_str(), PartnerGrade::D);
        partner.meta.class = normalize_class(partner.meta.class.as_str(), PartnerClass::Support);
    }
    for entry in state.runtime.pool.values_mut() {
        entry.grade = normalize_grade(entry.grade.as_str(), PartnerGrade::D);
        entry.class = normalize_class(entry.class.as_str(), PartnerClass::Support);
    }
}

/// Decodes a persisted blob, falling back to the seeded default when the
/// blob is absent or undecodable, then guarantees a non-empty roster and
/// pool. Returns `true` when the caller must persist the result.
pub fn ensure(raw: Option<Value>, now_ms: i64) -> (PartnerDbState, bool) {
    let (mut state, mut dirty) = match raw {
        Some(value) => match serde_json::from_value::<PartnerDbState>(value) {
            Ok(decoded) => (decoded, false),
            // Corrupt blob: the recovered default must replace it on disk.
            Err(_) => (default_state(now_ms), true),
        },
        None => (default_state(now_ms), true),
    };
    sanitize(&mut state);

    if state.partner_db.is_empty() {
        return (default_state(now_ms), true);
    }
    if state.runtime.pool.is_empty() {
        state.runtime.pool = demo_pool();
        dirty = true;
    }
    (state, dirty)
}

/// Ids currently in the active party: in-party and alive, in store order,
/// capped at the slot count.
pub fn party_ids(state: &PartnerDbState) -> Vec<String> {
    state
        .partner_db
        .values()
        .filter(|partner| partner.state.in_party && partner.state.alive)
        .map(|partner| partner.id.clone())
        .take(SLOTS.len())
        .collect()
}

/// Rewrites every record's membership flag from the given party set, then
/// clamps and timestamps. Dead partners can never remain in the party.
pub fn update_in_party_flags(state: &mut PartnerDbState, party: &[String], now_ms: i64) {
    let party: BTreeSet<&str> = party.iter().map(String::as_str).collect();
    for partner in state.partner_db.values_mut() {
        partner.state.in_party = partner.state.alive && party.contains(partner.id.as_str());
        partner.state = clamp_state(partner.state);
        partner.updated_at = now_ms;
    }
}
