use super::*;

fn test_state() -> AppState {
    AppState::new(EngineApi::open_in_memory(11).expect("in-memory host"))
}

#[test]
fn slot_labels_parse_strictly() {
    assert_eq!(parse_slot(None).expect("none"), None);
    assert_eq!(parse_slot(Some("  ")).expect("blank"), None);
    assert_eq!(parse_slot(Some("Slot2")).expect("slot2"), Some(PartySlot::Slot2));
    assert!(parse_slot(Some("Slot9")).is_err());
}

#[tokio::test]
async fn snapshot_route_serves_the_seeded_roster() {
    let state = test_state();
    let Json(response) = get_snapshot(State(state)).await.expect("snapshot");
    assert_eq!(response.schema_version, SCHEMA_VERSION_V1);
    assert_eq!(response.snapshot.owned_count, 2);
}

#[tokio::test]
async fn party_routes_round_trip() {
    let state = test_state();

    let Json(added) = add_to_party(
        State(state.clone()),
        Json(PartyAddRequest {
            partner_id: "rhea".to_string(),
            slot: Some("Slot3".to_string()),
        }),
    )
    .await
    .expect("add");
    assert!(added.ok);

    let Json(removed) = remove_from_party(
        State(state.clone()),
        Json(PartyRemoveRequest {
            target: "rhea".to_string(),
        }),
    )
    .await
    .expect("remove");
    assert!(removed.ok);

    let Json(missed) = remove_from_party(
        State(state),
        Json(PartyRemoveRequest {
            target: "rhea".to_string(),
        }),
    )
    .await
    .expect("remove again");
    assert!(!missed.ok);
}

#[tokio::test]
async fn refresh_without_a_url_reports_failure() {
    let state = test_state();
    let Json(response) = refresh_pool(State(state)).await.expect("refresh");
    assert!(!response.result.ok);
    assert_eq!(response.result.count, 0);
}
