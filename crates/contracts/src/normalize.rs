//! Pure canonicalization of grades, classes, ids, names, and numeric partner
//! state. Everything here is total: lenient variants fall back, strict
//! variants report invalid input instead.

use crate::{PartnerClass, PartnerGrade, PartnerState, PARTNER_GRADES};

/// Strict grade normalization; `None` when the input is not one of the six
/// grades after trim + uppercase.
pub fn try_normalize_grade(raw: &str) -> Option<PartnerGrade> {
    let value = raw.trim().to_uppercase();
    PARTNER_GRADES
        .iter()
        .copied()
        .find(|grade| grade.as_str() == value)
}

pub fn normalize_grade(raw: &str, fallback: PartnerGrade) -> PartnerGrade {
    try_normalize_grade(raw).unwrap_or(fallback)
}

/// Strict class normalization; recognizes `healer` for heal and five
/// spellings of all-round.
pub fn try_normalize_class(raw: &str) -> Option<PartnerClass> {
    match raw.trim().to_lowercase().as_str() {
        "tank" => Some(PartnerClass::Tank),
        "dps" => Some(PartnerClass::Dps),
        "heal" | "healer" => Some(PartnerClass::Heal),
        "support" => Some(PartnerClass::Support),
        "allround" | "all_round" | "all-round" | "allrounder" | "all-rounder" => {
            Some(PartnerClass::AllRound)
        }
        _ => None,
    }
}

pub fn normalize_class(raw: &str, fallback: PartnerClass) -> PartnerClass {
    try_normalize_class(raw).unwrap_or(fallback)
}

/// Stable lowercase id token: whitespace collapses to `_`, everything outside
/// `[a-z0-9_]` is stripped.
pub fn normalize_partner_id(raw: &str) -> String {
    let mut id = String::with_capacity(raw.len());
    let mut pending_gap = false;
    for ch in raw.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            pending_gap = !id.is_empty();
            continue;
        }
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            if pending_gap {
                id.push('_');
                pending_gap = false;
            }
            id.push(ch);
        }
    }
    id
}

/// Case/whitespace-insensitive form used for duplicate detection by name.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn default_brief_key(id: &str) -> String {
    format!("{{{{PARTNER_BRIEF_{}}}}}", id.to_uppercase())
}

pub fn default_detail_key(id: &str) -> String {
    format!("{{{{PARTNER_DETAIL_{}}}}}", id.to_uppercase())
}

/// Carries accumulated affinity into love-level tiers and clamps every field
/// into its valid range. Love-level acts as a tier of accumulated affinity:
/// each full ±100 moves one tier, and once the ±5 tier cap is reached the
/// remainder stops carrying and is clamped to ±99.
pub fn clamp_state(state: PartnerState) -> PartnerState {
    let mut next = state;
    next.level = next.level.max(1);
    next.fatigue = next.fatigue.clamp(0, 100);
    next.love_level = next.love_level.clamp(-5, 5);
    while next.affinity >= 100 && next.love_level < 5 {
        next.affinity -= 100;
        next.love_level += 1;
    }
    while next.affinity <= -100 && next.love_level > -5 {
        next.affinity += 100;
        next.love_level -= 1;
    }
    next.affinity = next.affinity.clamp(-99, 99);
    if !next.alive {
        next.in_party = false;
    }
    next
}

/// Same carry applied to a bare affinity/love pair; used by the snapshot
/// validator where no full `PartnerState` exists.
pub fn carry_affinity(affinity: i64, love_level: i64) -> (i64, i64) {
    let mut affinity = affinity;
    let mut love_level = love_level.clamp(-5, 5);
    while affinity >= 100 && love_level < 5 {
        affinity -= 100;
        love_level += 1;
    }
    while affinity <= -100 && love_level > -5 {
        affinity += 100;
        love_level -= 1;
    }
    (affinity.clamp(-99, 99), love_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_normalization_is_total() {
        assert_eq!(try_normalize_grade(" ex "), Some(PartnerGrade::Ex));
        assert_eq!(try_normalize_grade("s"), Some(PartnerGrade::S));
        assert_eq!(try_normalize_grade("SS"), None);
        assert_eq!(normalize_grade("??", PartnerGrade::D), PartnerGrade::D);
        assert_eq!(normalize_grade("", PartnerGrade::B), PartnerGrade::B);
    }

    #[test]
    fn class_accepts_aliases() {
        assert_eq!(try_normalize_class("Healer"), Some(PartnerClass::Heal));
        assert_eq!(try_normalize_class("ALL-ROUNDER"), Some(PartnerClass::AllRound));
        assert_eq!(try_normalize_class("all_round"), Some(PartnerClass::AllRound));
        assert_eq!(try_normalize_class("mage"), None);
        assert_eq!(
            normalize_class("mage", PartnerClass::Support),
            PartnerClass::Support
        );
    }

    #[test]
    fn partner_id_strips_and_collapses() {
        assert_eq!(normalize_partner_id("  Aria  Vel "), "aria_vel");
        assert_eq!(normalize_partner_id("Luna!"), "luna");
        assert_eq!(normalize_partner_id("K-9 Unit"), "k9_unit");
        assert_eq!(normalize_partner_id("聖女"), "");
    }

    #[test]
    fn clamp_carries_positive_affinity_into_love() {
        let state = PartnerState {
            affinity: 250,
            love_level: 3,
            ..PartnerState::default()
        };
        let clamped = clamp_state(state);
        assert_eq!(clamped.love_level, 5);
        assert_eq!(clamped.affinity, 50);
    }

    #[test]
    fn clamp_stops_carrying_at_tier_ceiling() {
        let state = PartnerState {
            affinity: 350,
            love_level: 4,
            ..PartnerState::default()
        };
        let clamped = clamp_state(state);
        assert_eq!(clamped.love_level, 5);
        // Remaining 250 cannot carry past the cap and clamps to 99.
        assert_eq!(clamped.affinity, 99);
    }

    #[test]
    fn clamp_carries_negative_affinity_to_floor() {
        let state = PartnerState {
            affinity: -250,
            love_level: -3,
            ..PartnerState::default()
        };
        let clamped = clamp_state(state);
        assert_eq!(clamped.love_level, -5);
        assert_eq!(clamped.affinity, -50);

        let floored = clamp_state(PartnerState {
            affinity: -900,
            love_level: -3,
            ..PartnerState::default()
        });
        assert_eq!(floored.love_level, -5);
        assert_eq!(floored.affinity, -99);
    }

    #[test]
    fn clamp_is_idempotent() {
        let state = PartnerState {
            level: 0,
            affinity: 431,
            love_level: -9,
            fatigue: 180,
            alive: false,
            in_party: true,
        };
        let once = clamp_state(state);
        let twice = clamp_state(once);
        assert_eq!(once, twice);
        assert!(!once.in_party);
        assert_eq!(once.level, 1);
        assert_eq!(once.fatigue, 100);
    }
}
