//! Normalization of remote records and the shared merge-and-persist path.

use chrono::NaiveDate;
use tracing::warn;

use super::CatalogEntry;
use crate::game::{
    classify, NormalizedGame, PLACEHOLDER_DESCRIPTION, PLACEHOLDER_IMAGE, UNKNOWN_LABEL,
};
use crate::metrics;
use crate::remote::RawRecord;
use crate::store::{GameStore, StoreError, UpsertOutcome};

/// Map a remote record onto the local schema, filling every fallback.
pub fn normalize_record(record: &RawRecord) -> NormalizedGame {
    let name = non_blank(Some(record.name.as_str()))
        .unwrap_or_else(|| format!("Game {}", record.id));

    NormalizedGame {
        external_id: record.id,
        name,
        slug: non_blank(record.slug.as_deref()),
        description: non_blank(record.description_text())
            .unwrap_or_else(|| PLACEHOLDER_DESCRIPTION.to_string()),
        background_image: non_blank(record.background_image.as_deref())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        release_date: record.released.as_deref().and_then(parse_release_date),
        rating: record.rating.map(|r| r.clamp(0.0, 5.0)),
        metacritic: record.metacritic.map(|m| m.min(100)),
        age_rating: classify(record.esrb_label()),
        esrb_label: non_blank(record.esrb_label()),
        website: non_blank(record.website.as_deref()),
        platforms: labels_or_unknown(record.platform_names()),
        genres: labels_or_unknown(record.genre_names()),
    }
}

/// Normalize and upsert one remote record.
pub fn persist_record(
    store: &dyn GameStore,
    record: &RawRecord,
) -> Result<UpsertOutcome, StoreError> {
    store.upsert_from_remote(&normalize_record(record))
}

/// Persist one remote record, returning it raw if the store refuses it.
pub fn merge_and_persist(store: &dyn GameStore, record: RawRecord) -> CatalogEntry {
    match persist_record(store, &record) {
        Ok(outcome) => CatalogEntry::Stored(outcome.game),
        Err(e) => {
            warn!(
                external_id = record.id,
                error = %e,
                "Failed to persist remote record, returning it unstored"
            );
            metrics::MERGE_FALLBACKS.inc();
            CatalogEntry::Remote(record)
        }
    }
}

fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn labels_or_unknown(labels: Vec<String>) -> Vec<String> {
    let labels: Vec<String> = labels
        .iter()
        .filter_map(|l| non_blank(Some(l.as_str())))
        .collect();
    if labels.is_empty() {
        vec![UNKNOWN_LABEL.to_string()]
    } else {
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::AgeRating;
    use crate::remote::{RawNamed, RawPlatformEntry};
    use crate::store::SqliteGameStore;
    use crate::testing::fixtures;
    use crate::testing::FailingStore;

    #[test]
    fn test_normalize_applies_fallbacks() {
        let game = normalize_record(&RawRecord::new(12, "   "));

        assert_eq!(game.external_id, 12);
        assert_eq!(game.name, "Game 12");
        assert_eq!(game.description, PLACEHOLDER_DESCRIPTION);
        assert_eq!(game.background_image, PLACEHOLDER_IMAGE);
        assert_eq!(game.platforms, vec![UNKNOWN_LABEL]);
        assert_eq!(game.genres, vec![UNKNOWN_LABEL]);
        assert_eq!(game.age_rating, AgeRating::Everyone);
        assert!(game.release_date.is_none());
    }

    #[test]
    fn test_normalize_full_record() {
        let mut record = RawRecord::new(3498, "Grand Theft Auto V");
        record.released = Some("2013-09-17".to_string());
        record.rating = Some(4.47);
        record.metacritic = Some(92);
        record.esrb_rating = Some(RawNamed {
            name: "Mature".to_string(),
        });
        record.description_raw = Some("Heists.".to_string());
        record.platforms = Some(vec![RawPlatformEntry {
            platform: RawNamed {
                name: "PC".to_string(),
            },
        }]);

        let game = normalize_record(&record);

        assert_eq!(game.release_date, NaiveDate::from_ymd_opt(2013, 9, 17));
        assert_eq!(game.age_rating, AgeRating::Mature);
        assert_eq!(game.esrb_label.as_deref(), Some("Mature"));
        assert_eq!(game.description, "Heists.");
        assert_eq!(game.platforms, vec!["PC"]);
        assert_eq!(game.genres, vec![UNKNOWN_LABEL]);
    }

    #[test]
    fn test_normalize_bad_date_and_out_of_range_scores() {
        let mut record = RawRecord::new(1, "X");
        record.released = Some("TBA".to_string());
        record.rating = Some(9.0);
        record.metacritic = Some(140);

        let game = normalize_record(&record);

        assert!(game.release_date.is_none());
        assert_eq!(game.rating, Some(5.0));
        assert_eq!(game.metacritic, Some(100));
    }

    #[test]
    fn test_merge_and_persist_stores_record() {
        let store = SqliteGameStore::in_memory().unwrap();
        let entry = merge_and_persist(&store, fixtures::raw_record(5, "Stardew Valley"));

        assert!(entry.is_stored());
        assert!(store.find_by_external_id(5).unwrap().is_some());
    }

    #[test]
    fn test_merge_and_persist_falls_back_to_raw() {
        let store = FailingStore::new();
        let record = fixtures::raw_record(5, "Stardew Valley");

        let entry = merge_and_persist(&store, record.clone());

        assert_eq!(entry, CatalogEntry::Remote(record));
    }
}
