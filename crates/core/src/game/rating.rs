//! Age classification normalization.

use super::AgeRating;

/// Map a remote age-classification label onto [`AgeRating`].
///
/// Matching is case-insensitive. Long labels match by containment, short
/// codes ("E", "EC", "E10+", "T", "M", "AO") only as the whole label.
/// Anything absent or unrecognized maps to [`AgeRating::Everyone`].
pub fn classify(raw_label: Option<&str>) -> AgeRating {
    let Some(label) = raw_label else {
        return AgeRating::Everyone;
    };

    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return AgeRating::Everyone;
    }

    // "everyone 10+" contains "everyone", so it has to be tested first.
    if label.contains("everyone 10") || label == "e10+" || label == "e10" {
        return AgeRating::Everyone10Plus;
    }
    if label.contains("everyone") || label == "e" || label == "ec" {
        return AgeRating::Everyone;
    }
    if label.contains("teen") || label == "t" {
        return AgeRating::Teen;
    }
    if label.contains("mature") || label == "m" {
        return AgeRating::Mature;
    }
    if label.contains("adults only") || label == "ao" {
        return AgeRating::AdultsOnly;
    }

    AgeRating::Everyone
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_everyone_10_plus() {
        assert_eq!(classify(Some("Everyone 10+")), AgeRating::Everyone10Plus);
        assert_eq!(classify(Some("EVERYONE 10+")), AgeRating::Everyone10Plus);
        assert_eq!(classify(Some("e10+")), AgeRating::Everyone10Plus);
    }

    #[test]
    fn test_classify_order_sensitive() {
        // Contains both "everyone" and "10": the specific rule must win.
        assert_eq!(
            classify(Some("Rated Everyone 10 and up")),
            AgeRating::Everyone10Plus
        );
        assert_eq!(classify(Some("Everyone")), AgeRating::Everyone);
    }

    #[test]
    fn test_classify_long_labels() {
        assert_eq!(classify(Some("Teen")), AgeRating::Teen);
        assert_eq!(classify(Some("Mature")), AgeRating::Mature);
        assert_eq!(classify(Some("Adults Only")), AgeRating::AdultsOnly);
        assert_eq!(classify(Some("  mature 17+ ")), AgeRating::Mature);
    }

    #[test]
    fn test_classify_short_codes() {
        assert_eq!(classify(Some("E")), AgeRating::Everyone);
        assert_eq!(classify(Some("ec")), AgeRating::Everyone);
        assert_eq!(classify(Some("T")), AgeRating::Teen);
        assert_eq!(classify(Some("m")), AgeRating::Mature);
        assert_eq!(classify(Some("AO")), AgeRating::AdultsOnly);
    }

    #[test]
    fn test_classify_short_codes_do_not_match_substrings() {
        // "Rating Pending" contains both "t" and "m" but is not a short code.
        assert_eq!(classify(Some("Rating Pending")), AgeRating::Everyone);
    }

    #[test]
    fn test_classify_missing_or_unknown_defaults_to_everyone() {
        assert_eq!(classify(None), AgeRating::Everyone);
        assert_eq!(classify(Some("")), AgeRating::Everyone);
        assert_eq!(classify(Some("   ")), AgeRating::Everyone);
        assert_eq!(classify(Some("PEGI 18")), AgeRating::Everyone);
    }
}
