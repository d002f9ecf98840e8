//! Scoring between investor preference vectors and listing/job attribute
//! vectors. Pure and deterministic: no store access, no clocks.

use agora_types::codes::{CountryCode, Industry};
use agora_types::models::InvestorProfile;

/// Default number of matches returned when the caller does not ask for a
/// specific limit.
pub const DEFAULT_LIMIT: usize = 6;

/// One candidate to rank: the parsed category tokens and country of a
/// listing or job. Works for both directions of the match.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub industries: Vec<Industry>,
    pub country: CountryCode,
}

/// Integer relevance of one candidate for one profile: two points per
/// shared industry, one more when the candidate's country is in the
/// profile's geographic focus.
pub fn score(profile: &InvestorProfile, candidate: &Candidate) -> u32 {
    let mut shared: Vec<Industry> = Vec::new();
    for industry in &candidate.industries {
        if profile.industries.contains(industry) && !shared.contains(industry) {
            shared.push(*industry);
        }
    }

    let mut total = shared.len() as u32 * 2;
    if profile.geo_focus.contains(&candidate.country) {
        total += 1;
    }
    total
}

/// Rank candidates for a profile. Candidates are expected in
/// creation-time-descending order; ties on score keep that order.
/// Zero-score candidates are dropped and the rest truncated to `limit`.
/// Returns `(input index, score)` pairs.
pub fn rank(profile: &InvestorProfile, candidates: &[Candidate], limit: usize) -> Vec<(usize, u32)> {
    let mut scored: Vec<(usize, u32)> = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| (index, score(profile, candidate)))
        .filter(|&(_, s)| s > 0)
        .collect();

    // Stable sort: equal scores stay in input order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn profile(industries: &[Industry], geo: &[&str]) -> InvestorProfile {
        InvestorProfile {
            user_id: Uuid::nil(),
            industries: industries.to_vec(),
            stages: vec![],
            geo_focus: geo.iter().map(|c| c.parse().unwrap()).collect(),
            updated_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    fn candidate(industries: &[Industry], country: &str) -> Candidate {
        Candidate {
            industries: industries.to_vec(),
            country: country.parse().unwrap(),
        }
    }

    #[test]
    fn industry_and_geo_overlap_scores_three() {
        let profile = profile(&[Industry::Fintech], &["FR"]);
        let fintech_fr = candidate(&[Industry::Fintech], "FR");
        let retail_de = candidate(&[Industry::Retail], "DE");

        assert_eq!(score(&profile, &fintech_fr), 3);
        assert_eq!(score(&profile, &retail_de), 0);

        let ranked = rank(&profile, &[retail_de, fintech_fr], DEFAULT_LIMIT);
        assert_eq!(ranked, vec![(1, 3)]);
    }

    #[test]
    fn geo_alone_is_worth_one() {
        let profile = profile(&[Industry::Fintech], &["FR"]);
        assert_eq!(score(&profile, &candidate(&[Industry::Retail], "FR")), 1);
    }

    #[test]
    fn duplicate_tokens_do_not_double_count() {
        let profile = profile(&[Industry::Fintech], &[]);
        let doubled = candidate(&[Industry::Fintech, Industry::Fintech], "DE");
        assert_eq!(score(&profile, &doubled), 2);
    }

    #[test]
    fn ranking_is_deterministic() {
        let profile = profile(&[Industry::Fintech, Industry::Saas], &["FR", "DE"]);
        let candidates = vec![
            candidate(&[Industry::Saas], "US"),
            candidate(&[Industry::Fintech, Industry::Saas], "FR"),
            candidate(&[Industry::Retail], "DE"),
            candidate(&[Industry::Fintech], "FR"),
        ];

        let first = rank(&profile, &candidates, DEFAULT_LIMIT);
        let second = rank(&profile, &candidates, DEFAULT_LIMIT);
        assert_eq!(first, second);
        assert_eq!(first, vec![(1, 5), (3, 3), (0, 2), (2, 1)]);
    }

    #[test]
    fn ties_keep_input_order() {
        let profile = profile(&[Industry::Fintech, Industry::Saas], &[]);
        let candidates = vec![
            candidate(&[Industry::Fintech], "FR"),
            candidate(&[Industry::Saas], "DE"),
        ];

        let ranked = rank(&profile, &candidates, DEFAULT_LIMIT);
        assert_eq!(ranked, vec![(0, 2), (1, 2)]);
    }

    #[test]
    fn results_are_truncated_to_limit() {
        let profile = profile(&[Industry::Fintech], &[]);
        let candidates: Vec<Candidate> =
            (0..10).map(|_| candidate(&[Industry::Fintech], "FR")).collect();

        assert_eq!(rank(&profile, &candidates, 3).len(), 3);
    }
}
