//! Party assignment and the two-way flow between the canonical store and
//! the mirrored snapshot document.

mod common;

use common::engine_with_sdp;
use contracts::stat_doc::{PartySlotData, SlotEntry, StatData};
use contracts::PartySlot;

fn filled(partner_id: &str, name: &str, affinity: i64, fatigue: i64, alive: bool) -> SlotEntry {
    SlotEntry::Filled(PartySlotData {
        partner_id: partner_id.to_string(),
        name: name.to_string(),
        level: 3,
        grade: "b".to_string(),
        class: "support".to_string(),
        job: String::new(),
        affinity,
        love_level: 0,
        fatigue,
        alive,
    })
}

#[test]
fn add_and_remove_round_trip() {
    let mut engine = engine_with_sdp(0, 1);
    assert!(engine.add_partner_to_party("rhea", None).expect("add"));

    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.in_party_count, 2);
    assert_eq!(snapshot.party_slots[&PartySlot::Slot1], "luna");
    assert_eq!(snapshot.party_slots[&PartySlot::Slot2], "rhea");

    // Removal by slot label; the survivor packs left.
    assert!(engine.remove_partner_from_party("Slot1").expect("remove"));
    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.in_party_count, 1);
    assert_eq!(snapshot.party_slots[&PartySlot::Slot1], "rhea");
    assert_eq!(snapshot.party_slots[&PartySlot::Slot2], "");

    // Removal by id.
    assert!(engine.remove_partner_from_party("rhea").expect("remove"));
    assert_eq!(engine.snapshot().expect("snapshot").in_party_count, 0);
}

#[test]
fn add_fails_for_unknown_and_repeated_remove() {
    let mut engine = engine_with_sdp(0, 1);
    assert!(!engine.add_partner_to_party("ghost", None).expect("add"));
    assert!(engine.remove_partner_from_party("luna").expect("remove"));
    assert!(!engine.remove_partner_from_party("luna").expect("remove"));
}

#[test]
fn external_slot_edits_flow_into_the_store() {
    let mut engine = engine_with_sdp(0, 1);

    let mut stat = StatData::default();
    stat.user.party_slots.set(PartySlot::Slot1, "luna");
    stat.user
        .party_slot_data
        .set(PartySlot::Slot1, filled("luna", " Luna Prime ", 120, 250, true));
    let raw = serde_json::to_value(&stat).expect("encode");
    engine.apply_stat_update(&raw).expect("update");

    let snapshot = engine.snapshot().expect("snapshot");
    let luna = snapshot
        .owned_partners
        .iter()
        .find(|p| p.id == "luna")
        .expect("luna");
    assert_eq!(luna.name, "Luna Prime");
    assert_eq!(luna.level, 3);

    // The engine pushed the repaired view back out: fatigue clamped, the
    // affinity overflow carried into a love level.
    let mirrored = engine.host_mut().stat();
    let slot1 = mirrored
        .user
        .party_slot_data
        .get(PartySlot::Slot1)
        .as_filled()
        .expect("slot1");
    assert_eq!(slot1.fatigue, 100);
    assert_eq!(slot1.affinity, 20);
    assert_eq!(slot1.love_level, 1);
}

#[test]
fn duplicate_slot_ids_are_packed_left() {
    let mut engine = engine_with_sdp(0, 1);

    let mut stat = StatData::default();
    stat.user.party_slots.set(PartySlot::Slot1, "luna");
    stat.user.party_slots.set(PartySlot::Slot2, "luna");
    stat.user.party_slots.set(PartySlot::Slot3, "rhea");
    let raw = serde_json::to_value(&stat).expect("encode");
    engine.apply_stat_update(&raw).expect("update");

    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.in_party_count, 2);
    assert_eq!(snapshot.party_slots[&PartySlot::Slot1], "luna");
    assert_eq!(snapshot.party_slots[&PartySlot::Slot2], "rhea");
    assert_eq!(snapshot.party_slots[&PartySlot::Slot3], "");
}

#[test]
fn death_in_the_snapshot_evicts_from_the_party() {
    let mut engine = engine_with_sdp(0, 1);

    let mut stat = StatData::default();
    stat.user.party_slots.set(PartySlot::Slot1, "luna");
    stat.user
        .party_slot_data
        .set(PartySlot::Slot1, filled("luna", "Luna", 0, 0, false));
    let raw = serde_json::to_value(&stat).expect("encode");
    engine.apply_stat_update(&raw).expect("update");

    let snapshot = engine.snapshot().expect("snapshot");
    let luna = snapshot
        .owned_partners
        .iter()
        .find(|p| p.id == "luna")
        .expect("luna");
    assert!(!luna.alive);
    assert!(!luna.in_party);
    assert_eq!(snapshot.party_slots[&PartySlot::Slot1], "");

    // Dead partners cannot be re-added.
    assert!(!engine.add_partner_to_party("luna", None).expect("add"));
}

#[test]
fn sync_maintains_the_owned_partner_count() {
    let mut engine = engine_with_sdp(0, 1);
    engine.sync_now().expect("sync");
    let mirrored = engine.host_mut().stat();
    assert_eq!(mirrored.user.owned_partner_count, 2);
    assert_eq!(mirrored.user.party_slots.get(PartySlot::Slot1), "luna");
    assert!(mirrored
        .user
        .party_slot_data
        .get(PartySlot::Slot2)
        .is_vacant());
}
