//! Profile-injection queue: mention scanning on player messages, the pending
//! brief set, and token composition at generation start.

use contracts::normalize::normalize_partner_id;
use contracts::{InjectionPrompt, PartnerDbState};

use crate::store::party_ids;

/// Adds eligible ids to the pending brief queue. Partners already in the
/// party or not alive are skipped; repeats collapse (set semantics, order
/// preserved).
pub fn enqueue_brief_profiles(state: &mut PartnerDbState, ids: &[String]) {
    for raw in ids {
        let id = normalize_partner_id(raw);
        let Some(record) = state.partner_db.get(&id) else {
            continue;
        };
        if record.state.in_party || !record.state.alive {
            continue;
        }
        if !state.runtime.brief_queue.contains(&id) {
            state.runtime.brief_queue.push(id);
        }
    }
}

/// Drains the pending queue; the caller persists the cleared state whether
/// or not injection succeeds.
pub fn consume_brief_queue(state: &mut PartnerDbState) -> Vec<String> {
    std::mem::take(&mut state.runtime.brief_queue)
}

/// Case-insensitive substring scan of a player message against every owned
/// partner's id and display name. Candidates already in the party or dead
/// are not worth briefing and are skipped.
pub fn find_mentioned_partners(state: &PartnerDbState, message: &str) -> Vec<String> {
    let haystack = message.to_lowercase();
    let mut hits = Vec::new();
    for record in state.partner_db.values() {
        if record.state.in_party || !record.state.alive {
            continue;
        }
        let mentioned = [record.id.as_str(), record.meta.name.as_str()]
            .into_iter()
            .map(str::to_lowercase)
            .filter(|candidate| !candidate.is_empty())
            .any(|candidate| haystack.contains(&candidate));
        if mentioned && !hits.contains(&record.id) {
            hits.push(record.id.clone());
        }
    }
    hits
}

/// Tokens to inject: the detail token of every current party member (always
/// present for context) plus the brief token of every drained id that is
/// still alive and still outside the party, deduplicated in order.
pub fn build_profile_tokens(state: &PartnerDbState, brief_ids: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let push_unique = |token: &str, tokens: &mut Vec<String>| {
        let trimmed = token.trim();
        if !trimmed.is_empty() && !tokens.iter().any(|existing| existing == trimmed) {
            tokens.push(trimmed.to_string());
        }
    };

    for id in party_ids(state) {
        if let Some(record) = state.partner_db.get(&id) {
            push_unique(&record.profile_keys.detail_key, &mut tokens);
        }
    }
    for id in brief_ids {
        let Some(record) = state.partner_db.get(id) else {
            continue;
        };
        if record.state.in_party || !record.state.alive {
            continue;
        }
        push_unique(&record.profile_keys.brief_key, &mut tokens);
    }
    tokens
}

pub fn make_injection_prompts(tokens: &[String], now_ms: i64) -> Vec<InjectionPrompt> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| InjectionPrompt {
            id: format!("partner_profile_{now_ms}_{index}"),
            role: "system".to_string(),
            content: token.clone(),
            should_scan: true,
        })
        .collect()
}
