//! Testing utilities and mock implementations.
//!
//! This module provides a mock remote catalog and a store that fails on
//! demand, so resolution and import can be tested without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use gamedex_core::testing::{fixtures, MockRemoteCatalog};
//!
//! let remote = MockRemoteCatalog::new();
//! remote.set_records(fixtures::raw_records(1..=40)).await;
//! remote.fail_detail_for(&[3]).await;
//!
//! // Use in a CacheAsideResolver or BulkImporter...
//! ```

mod failing_store;
mod mock_remote_catalog;

pub use failing_store::FailingStore;
pub use mock_remote_catalog::{MockRemoteCatalog, RecordedRemoteQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::ops::RangeInclusive;

    use crate::game::Game;
    use crate::remote::{RawNamed, RawPlatformEntry, RawRecord};
    use crate::store::GameStore;
    use crate::sync::merge::normalize_record;

    const GENRES: [&str; 4] = ["Action", "RPG", "Puzzle", "Strategy"];

    /// Create a listing-style record with reasonable defaults.
    pub fn raw_record(id: i64, name: &str) -> RawRecord {
        let mut record = RawRecord::new(id, name);
        record.slug = Some(name.to_lowercase().replace(' ', "-"));
        record.released = Some(format!("20{:02}-06-15", id % 25));
        // Higher ids rate lower so "popular" has a stable order
        record.rating = Some((5.0 - (id % 50) as f64 * 0.1).max(0.0));
        record.background_image = Some(format!("https://media.example/games/{}.jpg", id));
        record.platforms = Some(vec![RawPlatformEntry {
            platform: RawNamed {
                name: "PC".to_string(),
            },
        }]);
        record.genres = Some(vec![RawNamed {
            name: GENRES[(id as usize) % GENRES.len()].to_string(),
        }]);
        record
    }

    /// Create a record carrying an age classification label.
    pub fn rated_record(id: i64, name: &str, esrb_label: &str) -> RawRecord {
        let mut record = raw_record(id, name);
        record.esrb_rating = Some(RawNamed {
            name: esrb_label.to_string(),
        });
        record
    }

    /// Records with ids in `ids`, named "Game {id}".
    pub fn raw_records(ids: RangeInclusive<i64>) -> Vec<RawRecord> {
        ids.map(|id| raw_record(id, &format!("Game {}", id))).collect()
    }

    /// Store synced games with ids in `ids`, returning them in order.
    pub fn seed_store(store: &dyn GameStore, ids: RangeInclusive<i64>) -> Vec<Game> {
        raw_records(ids)
            .iter()
            .map(|record| {
                store
                    .upsert_from_remote(&normalize_record(record))
                    .expect("seed upsert")
                    .game
            })
            .collect()
    }
}
