//! Cross-boundary contracts for the partner roster engine, its host adapter,
//! and the presentation layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod normalize;
pub mod serde_lenient;
pub mod stat_doc;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Fixed party positions mirrored into the external snapshot document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartySlot {
    Slot1,
    Slot2,
    Slot3,
}

pub const SLOTS: [PartySlot; 3] = [PartySlot::Slot1, PartySlot::Slot2, PartySlot::Slot3];

impl PartySlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slot1 => "Slot1",
            Self::Slot2 => "Slot2",
            Self::Slot3 => "Slot3",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Slot1 => 0,
            Self::Slot2 => 1,
            Self::Slot3 => 2,
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Slot1" => Some(Self::Slot1),
            "Slot2" => Some(Self::Slot2),
            "Slot3" => Some(Self::Slot3),
            _ => None,
        }
    }
}

/// Rarity tier, highest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartnerGrade {
    Ex,
    S,
    A,
    B,
    C,
    D,
}

pub const PARTNER_GRADES: [PartnerGrade; 6] = [
    PartnerGrade::Ex,
    PartnerGrade::S,
    PartnerGrade::A,
    PartnerGrade::B,
    PartnerGrade::C,
    PartnerGrade::D,
];

impl PartnerGrade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ex => "EX",
            Self::S => "S",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PartnerClass {
    Tank,
    Dps,
    Heal,
    Support,
    AllRound,
}

impl PartnerClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tank => "tank",
            Self::Dps => "dps",
            Self::Heal => "heal",
            Self::Support => "support",
            Self::AllRound => "allRound",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartnerMeta {
    pub name: String,
    pub grade: PartnerGrade,
    pub class: PartnerClass,
    pub job: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartnerState {
    pub level: i64,
    pub affinity: i64,
    pub love_level: i64,
    pub fatigue: i64,
    pub alive: bool,
    pub in_party: bool,
}

impl Default for PartnerState {
    fn default() -> Self {
        Self {
            level: 1,
            affinity: 0,
            love_level: 0,
            fatigue: 0,
            alive: true,
            in_party: false,
        }
    }
}

/// Opaque tokens standing in for long-form profile text injected into the
/// generation context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProfileKeys {
    pub brief_key: String,
    pub detail_key: String,
}

/// A canonical owned partner; keyed by `id` in the roster store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartnerRecord {
    pub id: String,
    pub meta: PartnerMeta,
    pub state: PartnerState,
    pub profile_keys: ProfileKeys,
    pub updated_at: i64,
}

/// An importable, not-yet-owned draw candidate. Purely descriptive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolPartner {
    pub id: String,
    pub name: String,
    pub grade: PartnerGrade,
    pub class: PartnerClass,
    pub job: String,
    pub brief_key: String,
    pub detail_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RosterRuntime {
    #[serde(default)]
    pub brief_queue: Vec<String>,
    #[serde(default)]
    pub csv_url: String,
    #[serde(default)]
    pub pool: BTreeMap<String, PoolPartner>,
    #[serde(default)]
    pub last_pool_sync_at: i64,
}

/// The full persisted unit, round-tripped verbatim through the host's
/// chat-scoped blob store. The engine is its single owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PartnerDbState {
    #[serde(default)]
    pub partner_db: BTreeMap<String, PartnerRecord>,
    #[serde(default)]
    pub runtime: RosterRuntime,
}

/// User-supplied fields for custom registration; also used internally when
/// promoting a pool entry to an owned record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewPartnerInput {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub affinity: Option<i64>,
    #[serde(default)]
    pub love_level: Option<i64>,
    #[serde(default)]
    pub brief_key: Option<String>,
    #[serde(default)]
    pub detail_key: Option<String>,
}

/// Result-code taxonomy for every paid player-facing operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrawCode {
    Ok,
    InsufficientSdp,
    EmptyPool,
    PickupNotFound,
    CustomNameExistsInPool,
    CustomIdExists,
    InvalidGrade,
    InvalidClass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawResult {
    pub ok: bool,
    pub code: DrawCode,
    pub message: String,
    pub spent: i64,
    pub refund: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
}

impl DrawResult {
    pub fn failure(code: DrawCode, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code,
            message: message.into(),
            spent: 0,
            refund: 0,
            partner_id: None,
            partner_name: None,
            is_duplicate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolRefreshResult {
    pub ok: bool,
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnedPartnerSummary {
    pub id: String,
    pub name: String,
    pub grade: PartnerGrade,
    pub class: PartnerClass,
    pub job: String,
    pub in_party: bool,
    pub alive: bool,
    pub level: i64,
}

/// Everything the presentation layer needs to render the roster screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterSnapshot {
    pub sdp: i64,
    pub owned_count: usize,
    pub in_party_count: usize,
    pub pool_count: usize,
    pub csv_url: String,
    pub last_pool_sync_at: i64,
    pub party_slots: BTreeMap<PartySlot, String>,
    pub user: stat_doc::UserState,
    pub mission: stat_doc::MissionState,
    pub pool: Vec<PoolPartner>,
    pub owned_partners: Vec<OwnedPartnerSummary>,
}

/// One token handed to the host's prompt-injection collaborator; inserted
/// once into the next generation context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InjectionPrompt {
    pub id: String,
    pub role: String,
    pub content: String,
    pub should_scan: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    DocumentMalformed,
    FetchFailed,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}
