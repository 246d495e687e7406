//! Mention scanning, the pending brief queue, and token composition at
//! generation start.

mod common;

use common::engine_with_sdp;

#[test]
fn mention_queues_a_brief_and_generation_injects_it() {
    let mut engine = engine_with_sdp(0, 1);
    engine
        .note_user_message("I should visit Rhea at the clinic today.")
        .expect("note");
    engine.begin_generation(false).expect("generate");

    let injected = &engine.host_mut().injected;
    let contents: Vec<&str> = injected.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["{{PARTNER_DETAIL_LUNA}}", "{{PARTNER_BRIEF_RHEA}}"]);
    assert!(injected.iter().all(|p| p.role == "system" && p.should_scan));
    assert!(injected.iter().all(|p| p.id.starts_with("partner_profile_")));
}

#[test]
fn queue_drains_after_one_generation() {
    let mut engine = engine_with_sdp(0, 1);
    engine.note_user_message("rhea?").expect("note");
    engine.begin_generation(false).expect("generate");
    engine.host_mut().injected.clear();

    // The brief was consumed; only the standing party detail remains.
    engine.begin_generation(false).expect("generate");
    let contents: Vec<&str> = engine
        .host_mut()
        .injected
        .iter()
        .map(|p| p.content.as_str())
        .collect();
    assert_eq!(contents, vec!["{{PARTNER_DETAIL_LUNA}}"]);
}

#[test]
fn dry_run_preserves_the_queue() {
    let mut engine = engine_with_sdp(0, 1);
    engine.note_user_message("Rhea!").expect("note");
    engine.begin_generation(true).expect("dry run");
    assert!(engine.host_mut().injected.is_empty());

    engine.begin_generation(false).expect("generate");
    assert!(engine
        .host_mut()
        .injected
        .iter()
        .any(|p| p.content == "{{PARTNER_BRIEF_RHEA}}"));
}

#[test]
fn party_members_are_never_briefed() {
    let mut engine = engine_with_sdp(0, 1);
    engine.note_user_message("Luna and Rhea").expect("note");
    engine.queue_brief_profile("luna").expect("queue");
    engine.begin_generation(false).expect("generate");

    let contents: Vec<&str> = engine
        .host_mut()
        .injected
        .iter()
        .map(|p| p.content.as_str())
        .collect();
    assert!(contents.contains(&"{{PARTNER_BRIEF_RHEA}}"));
    assert!(!contents.contains(&"{{PARTNER_BRIEF_LUNA}}"));
    assert!(contents.contains(&"{{PARTNER_DETAIL_LUNA}}"));
}

#[test]
fn repeated_mentions_enqueue_once() {
    let mut engine = engine_with_sdp(0, 1);
    engine.note_user_message("rhea rhea rhea").expect("note");
    engine.note_user_message("Rhea again").expect("note");
    engine.begin_generation(false).expect("generate");

    let briefs = engine
        .host_mut()
        .injected
        .iter()
        .filter(|p| p.content == "{{PARTNER_BRIEF_RHEA}}")
        .count();
    assert_eq!(briefs, 1);
}
