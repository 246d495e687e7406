//! Pool import through the engine facade: replacement semantics, localized
//! headers, quoted fields, and the failure report for unusable documents.

mod common;

use common::engine_with_sdp;

#[test]
fn import_replaces_the_seeded_pool() {
    let mut engine = engine_with_sdp(0, 1);
    let csv = "id,name,grade,class,job\n\
               aria,Aria,S,dps,pilot\n\
               bram,Bram,C,tank,porter\n";
    let refresh = engine.install_pool_csv(csv).expect("import");
    assert!(refresh.ok);
    assert_eq!(refresh.count, 2);

    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.pool_count, 2);
    assert!(snapshot.last_pool_sync_at > 0);
    let names: Vec<&str> = snapshot.pool.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Aria", "Bram"]);
}

#[test]
fn localized_headers_are_accepted() {
    let mut engine = engine_with_sdp(0, 1);
    let csv = "파트너명,등급,클래스,직업\nAria,S,dps,pilot\n";
    let refresh = engine.install_pool_csv(csv).expect("import");
    assert!(refresh.ok);
    assert_eq!(refresh.count, 1);

    let snapshot = engine.snapshot().expect("snapshot");
    let aria = snapshot.pool.iter().find(|p| p.id == "aria").expect("aria");
    assert_eq!(aria.name, "Aria");
    assert_eq!(aria.job, "pilot");
}

#[test]
fn quoted_fields_keep_embedded_commas() {
    let mut engine = engine_with_sdp(0, 1);
    let csv = "id,name,grade,class,job\nvera,\"Vera, the Swift\",A,dps,scout\n";
    let refresh = engine.install_pool_csv(csv).expect("import");
    assert!(refresh.ok);

    let snapshot = engine.snapshot().expect("snapshot");
    let vera = snapshot.pool.iter().find(|p| p.id == "vera").expect("vera");
    assert_eq!(vera.name, "Vera, the Swift");
}

#[test]
fn unusable_document_reports_without_clobbering() {
    let mut engine = engine_with_sdp(0, 1);
    let before = engine.snapshot().expect("snapshot").pool_count;

    let refresh = engine.install_pool_csv("not a csv document").expect("import");
    assert!(!refresh.ok);
    assert_eq!(refresh.count, 0);
    assert_eq!(engine.snapshot().expect("snapshot").pool_count, before);
}

#[test]
fn csv_url_round_trips_trimmed() {
    let mut engine = engine_with_sdp(0, 1);
    engine
        .set_pool_csv_url("  https://example.invalid/pool.csv  ")
        .expect("set url");
    assert_eq!(
        engine.pool_csv_url().expect("url"),
        "https://example.invalid/pool.csv"
    );
}
