//! Bidirectional reconciliation between the canonical store and the party
//! slots of the mirrored snapshot, plus party assignment.
//!
//! External→Store always runs before Store→External so stats edited outside
//! the engine flow in before the canonical view is pushed back out.

use contracts::normalize::{clamp_state, normalize_class, normalize_grade, normalize_partner_id};
use contracts::stat_doc::{PartySlotData, SlotEntry, StatData};
use contracts::{PartnerDbState, PartnerRecord, PartnerState, PartySlot, SLOTS};

use crate::store::{party_ids, update_in_party_flags};

pub fn slot_data_from_record(record: &PartnerRecord) -> PartySlotData {
    PartySlotData {
        partner_id: record.id.clone(),
        name: record.meta.name.clone(),
        level: record.state.level,
        grade: record.meta.grade.as_str().to_string(),
        class: record.meta.class.as_str().to_string(),
        job: record.meta.job.clone(),
        affinity: record.state.affinity,
        love_level: record.state.love_level,
        fatigue: record.state.fatigue,
        alive: record.state.alive,
    }
}

/// External→Store: the slot ids become the new party set (known, alive,
/// deduplicated, capped at the slot count), and non-empty slot data
/// overwrites each member's mutable state and non-blank meta fields.
/// External data wins on conflict for fields the user could have edited.
pub fn apply_stat_to_store(state: &mut PartnerDbState, stat: &StatData, now_ms: i64) {
    let mut party: Vec<String> = Vec::new();
    for slot in SLOTS {
        let id = stat.user.party_slots.get(slot).trim().to_string();
        if id.is_empty() || party.contains(&id) {
            continue;
        }
        let alive = state
            .partner_db
            .get(&id)
            .map(|record| record.state.alive)
            .unwrap_or(false);
        if alive && party.len() < SLOTS.len() {
            party.push(id);
        }
    }
    update_in_party_flags(state, &party, now_ms);

    for slot in SLOTS {
        let id = stat.user.party_slots.get(slot).trim().to_string();
        if id.is_empty() {
            continue;
        }
        let Some(record) = state.partner_db.get_mut(&id) else {
            continue;
        };
        let Some(data) = stat.user.party_slot_data.get(slot).as_filled() else {
            continue;
        };

        record.state = clamp_state(PartnerState {
            level: data.level,
            affinity: data.affinity,
            love_level: data.love_level,
            fatigue: data.fatigue,
            alive: data.alive,
            in_party: true,
        });
        let name = data.name.trim();
        if !name.is_empty() {
            record.meta.name = name.to_string();
        }
        record.meta.grade = normalize_grade(&data.grade, record.meta.grade);
        record.meta.class = normalize_class(&data.class, record.meta.class);
        let job = data.job.trim();
        if !job.is_empty() {
            record.meta.job = job.to_string();
        }
        record.updated_at = now_ms;
    }
}

/// Store→External: party members in store order fill the slots; vacant
/// positions are cleared; the owned-partner count is maintained for the
/// host's benefit.
pub fn apply_store_to_stat(state: &PartnerDbState, stat: &mut StatData) {
    let party = party_ids(state);
    for (index, slot) in SLOTS.into_iter().enumerate() {
        let id = party.get(index).cloned().unwrap_or_default();
        stat.user.party_slots.set(slot, id.clone());
        match state.partner_db.get(&id) {
            Some(record) if !id.is_empty() => {
                stat.user
                    .party_slot_data
                    .set(slot, SlotEntry::Filled(slot_data_from_record(record)));
            }
            _ => stat.user.party_slot_data.set(slot, SlotEntry::vacant()),
        }
    }
    stat.user.owned_partner_count = state.partner_db.len() as i64;
}

/// Places a partner into the party. With an explicit slot the partner is
/// moved there (vacating any slot it held); without one, the first empty
/// slot is used. Fails for unknown or dead partners and for a full party.
pub fn add_to_party(
    state: &mut PartnerDbState,
    partner_id: &str,
    preferred: Option<PartySlot>,
    now_ms: i64,
) -> bool {
    let id = normalize_partner_id(partner_id);
    let Some(record) = state.partner_db.get(&id) else {
        return false;
    };
    if !record.state.alive {
        return false;
    }

    let current = party_ids(state);
    let mut slot_map: [String; 3] = Default::default();
    for (index, member) in current.into_iter().enumerate() {
        slot_map[index] = member;
    }

    if let Some(slot) = preferred {
        for occupied in slot_map.iter_mut() {
            if *occupied == id {
                occupied.clear();
            }
        }
        slot_map[slot.index()] = id;
    } else if !slot_map.iter().any(|member| *member == id) {
        let Some(empty) = slot_map.iter_mut().find(|member| member.is_empty()) else {
            return false; // party full
        };
        *empty = id;
    }

    let party: Vec<String> = slot_map
        .into_iter()
        .filter(|member| !member.is_empty())
        .collect();
    update_in_party_flags(state, &party, now_ms);
    true
}

/// Clears one party membership by slot label or partner id. Returns `false`
/// when nothing matched.
pub fn remove_from_party(state: &mut PartnerDbState, id_or_slot: &str, now_ms: i64) -> bool {
    let token = id_or_slot.trim();
    let target = match PartySlot::from_label(token) {
        Some(slot) => party_ids(state).get(slot.index()).cloned().unwrap_or_default(),
        None => normalize_partner_id(token),
    };

    let Some(record) = state.partner_db.get_mut(&target) else {
        return false;
    };
    if !record.state.in_party {
        return false;
    }
    record.state.in_party = false;
    record.updated_at = now_ms;

    let remaining = party_ids(state);
    update_in_party_flags(state, &remaining, now_ms);
    true
}
