//! The externally-owned "stat" snapshot document mirrored into the latest
//! turn, and its two-stage validator: a strict serde parse into [`StatData`]
//! followed by a pure [`StatData::repair`] pass. The engine treats this
//! document as a view; the canonical roster always lives in
//! [`crate::PartnerDbState`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{carry_affinity, normalize_class, normalize_grade};
use crate::{serde_lenient, PartnerClass, PartnerGrade, PartySlot, SLOTS};

pub const MISSION_IDLE_WORLD: &str = "Central Hub";
pub const MISSION_IDLE_SUMMARY: &str = "Standing by";
pub const MISSION_ACTIVE_SUMMARY: &str = "Mission in progress";

#[derive(Debug)]
pub struct StatParseError(serde_json::Error);

impl fmt::Display for StatParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stat document malformed: {}", self.0)
    }
}

impl std::error::Error for StatParseError {}

/// Partner-shaped record embedded in one party slot of the mirrored
/// document. Grade and class stay raw strings at parse time; repair
/// canonicalizes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PartySlotData {
    #[serde(rename = "PartnerId")]
    pub partner_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Level", with = "serde_lenient::int")]
    pub level: i64,
    #[serde(rename = "Grade")]
    pub grade: String,
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "Job")]
    pub job: String,
    #[serde(rename = "Affinity", with = "serde_lenient::int")]
    pub affinity: i64,
    #[serde(rename = "LoveLevel", with = "serde_lenient::int")]
    pub love_level: i64,
    #[serde(rename = "Fatigue", with = "serde_lenient::int")]
    pub fatigue: i64,
    #[serde(rename = "Alive")]
    pub alive: bool,
}

/// A slot is either a partner-shaped record or the empty-string sentinel the
/// host writes for vacant slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SlotEntry {
    Filled(PartySlotData),
    Vacant(String),
}

impl SlotEntry {
    pub fn vacant() -> Self {
        Self::Vacant(String::new())
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Self::Vacant(_))
    }

    pub fn as_filled(&self) -> Option<&PartySlotData> {
        match self {
            Self::Filled(data) => Some(data),
            Self::Vacant(_) => None,
        }
    }
}

impl Default for SlotEntry {
    fn default() -> Self {
        Self::vacant()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PartySlotIds {
    #[serde(rename = "Slot1")]
    pub slot1: String,
    #[serde(rename = "Slot2")]
    pub slot2: String,
    #[serde(rename = "Slot3")]
    pub slot3: String,
}

impl PartySlotIds {
    pub fn get(&self, slot: PartySlot) -> &str {
        match slot {
            PartySlot::Slot1 => &self.slot1,
            PartySlot::Slot2 => &self.slot2,
            PartySlot::Slot3 => &self.slot3,
        }
    }

    pub fn set(&mut self, slot: PartySlot, id: impl Into<String>) {
        let target = match slot {
            PartySlot::Slot1 => &mut self.slot1,
            PartySlot::Slot2 => &mut self.slot2,
            PartySlot::Slot3 => &mut self.slot3,
        };
        *target = id.into();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PartySlotEntries {
    #[serde(rename = "Slot1")]
    pub slot1: SlotEntry,
    #[serde(rename = "Slot2")]
    pub slot2: SlotEntry,
    #[serde(rename = "Slot3")]
    pub slot3: SlotEntry,
}

impl PartySlotEntries {
    pub fn get(&self, slot: PartySlot) -> &SlotEntry {
        match slot {
            PartySlot::Slot1 => &self.slot1,
            PartySlot::Slot2 => &self.slot2,
            PartySlot::Slot3 => &self.slot3,
        }
    }

    pub fn set(&mut self, slot: PartySlot, entry: SlotEntry) {
        let target = match slot {
            PartySlot::Slot1 => &mut self.slot1,
            PartySlot::Slot2 => &mut self.slot2,
            PartySlot::Slot3 => &mut self.slot3,
        };
        *target = entry;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct InventoryItem {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Quantity", with = "serde_lenient::int")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct UserState {
    #[serde(rename = "Level", with = "serde_lenient::int")]
    pub level: i64,
    #[serde(rename = "Costume")]
    pub costume: String,
    #[serde(rename = "SDP", with = "serde_lenient::int")]
    pub sdp: i64,
    #[serde(rename = "Inventory")]
    pub inventory: BTreeMap<String, InventoryItem>,
    #[serde(rename = "PartySlots")]
    pub party_slots: PartySlotIds,
    #[serde(rename = "PartySlotData")]
    pub party_slot_data: PartySlotEntries,
    #[serde(rename = "_OwnedPartnerCount", with = "serde_lenient::int")]
    pub owned_partner_count: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    #[default]
    Normal,
    Eros,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MissionGrade {
    S,
    A,
    B,
    C,
    #[default]
    D,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MissionState {
    #[serde(rename = "OnMission")]
    pub on_mission: bool,
    #[serde(rename = "MissionType")]
    pub mission_type: MissionType,
    #[serde(rename = "MissionGrade")]
    pub mission_grade: MissionGrade,
    #[serde(rename = "WorldName")]
    pub world_name: String,
    #[serde(rename = "WorldSummaryAndObjective")]
    pub world_summary_and_objective: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StatData {
    #[serde(rename = "User")]
    pub user: UserState,
    #[serde(rename = "Mission")]
    pub mission: MissionState,
}

/// Strict parse of a raw host document. Numeric leniency is handled by the
/// field deserializers; a document that still fails here is malformed beyond
/// repair and the error propagates to the caller.
pub fn parse_stat(raw: &Value) -> Result<StatData, StatParseError> {
    serde_json::from_value(raw.clone()).map_err(StatParseError)
}

impl StatData {
    /// Pure repair pass: party slot dedup and left-packing, per-slot numeric
    /// carry and canonicalization, and mission defaults. Never touches the
    /// canonical partner store.
    pub fn repair(mut self) -> Self {
        let mut deduped: Vec<String> = Vec::new();
        for slot in SLOTS {
            let id = self.user.party_slots.get(slot).trim().to_string();
            if id.is_empty() || deduped.contains(&id) {
                continue;
            }
            deduped.push(id);
        }

        for (index, slot) in SLOTS.into_iter().enumerate() {
            let partner_id = deduped.get(index).cloned().unwrap_or_default();
            self.user.party_slots.set(slot, partner_id.clone());

            let entry = self.user.party_slot_data.get(slot).clone();
            let Some(data) = entry.as_filled() else {
                self.user.party_slot_data.set(slot, SlotEntry::vacant());
                continue;
            };
            if partner_id.is_empty() {
                self.user.party_slot_data.set(slot, SlotEntry::vacant());
                continue;
            }

            let (affinity, love_level) = carry_affinity(data.affinity, data.love_level);
            let repaired = PartySlotData {
                partner_id,
                name: data.name.clone(),
                level: data.level.max(1),
                grade: normalize_grade(&data.grade, PartnerGrade::D).as_str().to_string(),
                class: normalize_class(&data.class, PartnerClass::Support)
                    .as_str()
                    .to_string(),
                job: data.job.clone(),
                affinity,
                love_level,
                fatigue: data.fatigue.clamp(0, 100),
                alive: data.alive,
            };
            self.user.party_slot_data.set(slot, SlotEntry::Filled(repaired));
        }

        self.user.level = self.user.level.max(1);
        self.user.sdp = self.user.sdp.max(0);
        self.user.owned_partner_count = self.user.owned_partner_count.max(0);
        for item in self.user.inventory.values_mut() {
            item.quantity = item.quantity.max(0);
        }

        if !self.mission.on_mission {
            self.mission.mission_type = MissionType::Normal;
            self.mission.mission_grade = MissionGrade::D;
            self.mission.world_name = MISSION_IDLE_WORLD.to_string();
            self.mission.world_summary_and_objective = MISSION_IDLE_SUMMARY.to_string();
        } else {
            if self.mission.world_name.trim().is_empty() {
                self.mission.world_name = MISSION_IDLE_WORLD.to_string();
            }
            if self.mission.world_summary_and_objective.trim().is_empty() {
                self.mission.world_summary_and_objective = MISSION_ACTIVE_SUMMARY.to_string();
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filled(partner_id: &str, affinity: i64, love_level: i64) -> Value {
        json!({
            "PartnerId": partner_id,
            "Name": partner_id,
            "Level": 3,
            "Grade": "b",
            "Class": "healer",
            "Job": "scout",
            "Affinity": affinity,
            "LoveLevel": love_level,
            "Fatigue": 30,
            "Alive": true,
        })
    }

    #[test]
    fn duplicate_and_blank_slots_left_pack() {
        let raw = json!({
            "User": {
                "SDP": 500,
                "PartySlots": { "Slot1": "", "Slot2": "luna", "Slot3": "luna" },
                "PartySlotData": {
                    "Slot1": filled("luna", 0, 0),
                    "Slot2": "",
                    "Slot3": "",
                },
            },
        });
        let repaired = parse_stat(&raw).expect("parse").repair();
        assert_eq!(repaired.user.party_slots.get(PartySlot::Slot1), "luna");
        assert_eq!(repaired.user.party_slots.get(PartySlot::Slot2), "");
        assert_eq!(repaired.user.party_slots.get(PartySlot::Slot3), "");
        // Slot1 had data in place; the left-packed id is written onto it.
        let entry = repaired.user.party_slot_data.get(PartySlot::Slot1);
        assert_eq!(entry.as_filled().expect("filled").partner_id, "luna");
        assert!(repaired.user.party_slot_data.get(PartySlot::Slot2).is_vacant());
    }

    #[test]
    fn slot_data_is_carried_and_canonicalized() {
        let raw = json!({
            "User": {
                "PartySlots": { "Slot1": "aria", "Slot2": "", "Slot3": "" },
                "PartySlotData": { "Slot1": filled("aria", 230, 1), "Slot2": "", "Slot3": "" },
            },
        });
        let repaired = parse_stat(&raw).expect("parse").repair();
        let data = repaired
            .user
            .party_slot_data
            .get(PartySlot::Slot1)
            .as_filled()
            .expect("filled")
            .clone();
        assert_eq!(data.grade, "B");
        assert_eq!(data.class, "heal");
        assert_eq!(data.love_level, 3);
        assert_eq!(data.affinity, 30);
    }

    #[test]
    fn lenient_numbers_survive_parse() {
        let raw = json!({
            "User": { "Level": "4.7", "SDP": "1200" },
        });
        let repaired = parse_stat(&raw).expect("parse").repair();
        assert_eq!(repaired.user.level, 4);
        assert_eq!(repaired.user.sdp, 1200);
    }

    #[test]
    fn off_mission_resets_fixed_defaults() {
        let raw = json!({
            "Mission": {
                "OnMission": false,
                "MissionType": "eros",
                "MissionGrade": "S",
                "WorldName": "somewhere",
                "WorldSummaryAndObjective": "something",
            },
        });
        let repaired = parse_stat(&raw).expect("parse").repair();
        assert_eq!(repaired.mission.mission_type, MissionType::Normal);
        assert_eq!(repaired.mission.mission_grade, MissionGrade::D);
        assert_eq!(repaired.mission.world_name, MISSION_IDLE_WORLD);
        assert_eq!(repaired.mission.world_summary_and_objective, MISSION_IDLE_SUMMARY);
    }

    #[test]
    fn on_mission_fills_blank_world_fields_only() {
        let raw = json!({
            "Mission": {
                "OnMission": true,
                "MissionType": "eros",
                "MissionGrade": "A",
                "WorldName": "  ",
                "WorldSummaryAndObjective": "infiltrate the vault",
            },
        });
        let repaired = parse_stat(&raw).expect("parse").repair();
        assert_eq!(repaired.mission.mission_type, MissionType::Eros);
        assert_eq!(repaired.mission.mission_grade, MissionGrade::A);
        assert_eq!(repaired.mission.world_name, MISSION_IDLE_WORLD);
        assert_eq!(
            repaired.mission.world_summary_and_objective,
            "infiltrate the vault"
        );
    }

    #[test]
    fn default_document_round_trips() {
        let seeded = StatData::default().repair();
        let raw = serde_json::to_value(&seeded).expect("encode");
        let decoded = parse_stat(&raw).expect("parse").repair();
        assert_eq!(seeded, decoded);
    }
}
