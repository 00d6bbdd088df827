//! C4: additive risk/trust scoring engine.
//!
//! Pure functions over the closed `Signals` struct — no I/O, no state,
//! deterministic by construction. Grounded on
//! `original_source/.../security/risk_scoring.py` and
//! `.../security/scam_database.py::get_red_flags`.

use crate::registry::red_flag;
use crate::types::{RedFlag, Signals};

/// Calculates the risk score (0-100, higher = more dangerous).
pub fn calculate_risk(signals: &Signals) -> u8 {
    let mut score: i32 = 0;

    if signals.is_known_scam {
        score += 80;
    }
    if signals.is_honeypot {
        score += 70;
    }
    if signals.unlimited_approval {
        score += 30;
    }
    if signals.set_approval_for_all {
        score += 25;
    }

    if signals.unverified_contract {
        score += 20;
    }
    if signals.has_selfdestruct {
        score += 20;
    }
    if signals.has_delegatecall {
        score += 15;
    }

    // Age bands are mutually exclusive — lowest matching band only.
    if let Some(age) = signals.contract_age_days {
        if age < 1 {
            score += 20;
        } else if age < 7 {
            score += 10;
        } else if age < 30 {
            score += 5;
        }
    }

    // Activity bands — single best-matching band.
    if signals.tx_count < 10 {
        score += 15;
    } else if signals.tx_count < 100 {
        score += 8;
    }

    // Value bands — single best-matching band.
    if signals.value_usd > 50_000.0 {
        score += 10;
    } else if signals.value_usd > 10_000.0 {
        score += 5;
    }

    match signals.function_risk.as_deref() {
        Some("high") => score += 15,
        Some("medium") => score += 5,
        _ => {}
    }

    if signals.trusted_contract {
        score -= 40;
    }
    if signals.verified_contract {
        score -= 10;
    }
    if signals.tx_count > 10_000 {
        score -= 5;
    }

    score.clamp(0, 100) as u8
}

/// Calculates the trust score (0-100, higher = more trustworthy).
pub fn calculate_trust(signals: &Signals) -> u8 {
    let mut score: i32 = 50;

    if signals.trusted_contract {
        score += 40;
    }
    if signals.verified_contract {
        score += 15;
    }

    if let Some(age) = signals.contract_age_days {
        if age > 365 {
            score += 10;
        } else if age < 7 {
            score -= 25;
        } else if age < 30 {
            score -= 10;
        }
    }

    if signals.tx_count > 10_000 {
        score += 10;
    } else if signals.tx_count < 10 {
        score -= 20;
    }

    if signals.is_known_scam {
        score -= 90;
    }
    if signals.unverified_contract {
        score -= 20;
    }
    if signals.has_selfdestruct {
        score -= 15;
    }

    score.clamp(0, 100) as u8
}

/// Risk level band — total function of the score, exhaustive and monotone.
pub fn risk_level(score: u8) -> &'static str {
    match score {
        0..=20 => "low",
        21..=50 => "medium",
        51..=75 => "high",
        _ => "critical",
    }
}

/// Trust level band — total function of the score, exhaustive and monotone.
pub fn trust_level(score: u8) -> &'static str {
    match score {
        80..=100 => "highly_trusted",
        60..=79 => "trusted",
        40..=59 => "caution",
        20..=39 => "suspicious",
        _ => "dangerous",
    }
}

pub fn risk_color(score: u8) -> &'static str {
    match score {
        0..=20 => "#10B981",
        21..=50 => "#F59E0B",
        51..=75 => "#EF4444",
        _ => "#991B1B",
    }
}

pub fn trust_color(score: u8) -> &'static str {
    match score {
        80..=100 => "#10B981",
        60..=79 => "#34D399",
        40..=59 => "#F59E0B",
        20..=39 => "#EF4444",
        _ => "#991B1B",
    }
}

/// Maps signals to user-facing red flags, descending by score; for age,
/// only the single worst applicable flag is emitted.
pub fn get_red_flags(signals: &Signals) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    let flag_map: &[(bool, &str)] = &[
        (signals.is_known_scam, "known_scam"),
        (signals.unlimited_approval, "unlimited_approval"),
        (signals.set_approval_for_all, "set_approval_for_all"),
        (signals.unverified_contract, "unverified_contract"),
        (signals.has_selfdestruct, "selfdestruct"),
        (signals.has_delegatecall, "delegatecall"),
        (signals.unknown_function, "unknown_function"),
    ];
    for (set, name) in flag_map {
        if *set {
            if let Some(f) = red_flag(name) {
                flags.push(f);
            }
        }
    }

    if let Some(age) = signals.contract_age_days {
        if age < 1 {
            if let Some(f) = red_flag("very_new_contract") {
                flags.push(f);
            }
        } else if age < 7 {
            if let Some(f) = red_flag("new_contract") {
                flags.push(f);
            }
        }
    }

    if signals.tx_count < 10 {
        if let Some(f) = red_flag("low_activity") {
            flags.push(f);
        }
    }

    flags.sort_by(|a, b| b.score.cmp(&a.score));
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest_helpers::*;

    #[test]
    fn risk_and_trust_are_always_clamped() {
        for s in all_signal_variants() {
            let r = calculate_risk(&s);
            let t = calculate_trust(&s);
            assert!(r <= 100);
            assert!(t <= 100);
        }
    }

    #[test]
    fn risk_level_is_exhaustive_and_monotone() {
        let mut prior = "low";
        let order = ["low", "medium", "high", "critical"];
        for score in 0..=100u8 {
            let level = risk_level(score);
            assert!(order.contains(&level));
            let prior_idx = order.iter().position(|x| *x == prior).unwrap();
            let cur_idx = order.iter().position(|x| *x == level).unwrap();
            assert!(cur_idx >= prior_idx);
            prior = level;
        }
    }

    #[test]
    fn known_scam_dominates_risk_score() {
        let mut s = Signals::default();
        s.is_known_scam = true;
        assert_eq!(calculate_risk(&s), 80);
    }

    #[test]
    fn unlimited_approval_to_scam_clamps_to_100() {
        let mut s = Signals::default();
        s.is_known_scam = true;
        s.unlimited_approval = true;
        s.set_approval_for_all = false;
        // 80 + 30 = 110, clamp to 100.
        assert_eq!(calculate_risk(&s), 100);
    }

    #[test]
    fn known_scam_forces_zero_trust() {
        let mut s = Signals::default();
        s.is_known_scam = true;
        assert_eq!(calculate_trust(&s), 0);
    }

    #[test]
    fn trusted_contract_gives_highly_trusted_band() {
        let mut s = Signals::default();
        s.trusted_contract = true;
        s.verified_contract = true;
        let t = calculate_trust(&s);
        assert_eq!(t, 100);
        assert_eq!(trust_level(t), "highly_trusted");
    }

    #[test]
    fn age_bands_are_mutually_exclusive() {
        let mut s = Signals::default();
        s.contract_age_days = Some(0);
        assert_eq!(calculate_risk(&s), 20); // not 20+10+5
    }

    #[test]
    fn red_flags_sorted_descending_by_score() {
        let mut s = Signals::default();
        s.unverified_contract = true; // 20
        s.has_delegatecall = true; // 15
        s.is_known_scam = true; // 90
        let flags = get_red_flags(&s);
        for pair in flags.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(flags[0].score, 90);
    }

    mod proptest_helpers {
        use crate::types::Signals;

        pub fn all_signal_variants() -> Vec<Signals> {
            let mut out = Vec::new();
            for scam in [false, true] {
                for honeypot in [false, true] {
                    for unlimited in [false, true] {
                        for age in [None, Some(-1i64), Some(10), Some(400)] {
                            out.push(Signals {
                                is_known_scam: scam,
                                is_honeypot: honeypot,
                                unlimited_approval: unlimited,
                                contract_age_days: age,
                                tx_count: 5,
                                value_usd: 60_000.0,
                                trusted_contract: true,
                                verified_contract: true,
                                ..Signals::default()
                            });
                        }
                    }
                }
            }
            out
        }
    }
}
