//! String and duration similarity primitives
//!
//! Shared by resolver scoring and duplicate detection.

use strsim::normalized_levenshtein;

/// Case-insensitive edit-distance ratio in [0, 1]
///
/// Empty input on either side scores 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    normalized_levenshtein(&a, &b)
}

/// Duration closeness banding in [0, 1]
///
/// ≤3 s → 1.0, ≤10 s → 0.5, otherwise 0.0
pub fn duration_similarity(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff <= 3.0 {
        1.0
    } else if diff <= 10.0 {
        0.5
    } else {
        0.0
    }
}

/// Score bonus for matching durations
///
/// ≤3 s → 20, ≤10 s → 15, ≤30 s → 10, otherwise 0. Unknown on either side
/// earns nothing.
pub fn duration_bonus(query: Option<f64>, candidate: Option<f64>) -> f64 {
    let (Some(query), Some(candidate)) = (query, candidate) else {
        return 0.0;
    };

    let diff = (query - candidate).abs();
    if diff <= 3.0 {
        20.0
    } else if diff <= 10.0 {
        15.0
    } else if diff <= 30.0 {
        10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(similarity("Lithium", "Lithium"), 1.0);
        assert_eq!(similarity("Lithium", "  LITHIUM "), 1.0);
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(similarity("", "Lithium"), 0.0);
        assert_eq!(similarity("Lithium", ""), 0.0);
        assert_eq!(similarity("   ", "   "), 0.0);
    }

    #[test]
    fn test_partial_similarity_in_range() {
        let s = similarity("Smells Like Teen Spirit", "Smells Like Teen Spirit (Remastered)");
        assert!(s > 0.5 && s < 1.0);
    }

    #[test]
    fn test_duration_banding() {
        assert_eq!(duration_similarity(200.0, 200.0), 1.0);
        assert_eq!(duration_similarity(200.0, 203.0), 1.0);
        assert_eq!(duration_similarity(200.0, 204.0), 0.5);
        assert_eq!(duration_similarity(200.0, 210.0), 0.5);
        assert_eq!(duration_similarity(200.0, 211.0), 0.0);
    }

    #[test]
    fn test_duration_bonus_tiers() {
        assert_eq!(duration_bonus(Some(200.0), Some(202.0)), 20.0);
        assert_eq!(duration_bonus(Some(200.0), Some(209.0)), 15.0);
        assert_eq!(duration_bonus(Some(200.0), Some(229.0)), 10.0);
        assert_eq!(duration_bonus(Some(200.0), Some(260.0)), 0.0);
        assert_eq!(duration_bonus(None, Some(200.0)), 0.0);
    }
}
