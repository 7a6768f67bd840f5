pub mod config;
pub mod game;
pub mod metrics;
pub mod remote;
pub mod store;
pub mod sync;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    SanitizedConfig,
};
pub use game::{
    classify, AgeRating, CatalogStats, Game, GameFilter, GameOrdering, GameUpdate, NewGame,
    NormalizedGame, PageRequest, Paged,
};
pub use remote::{
    RawRecord, RawgClient, RawgConfig, RemoteCatalog, RemoteCatalogError, RemotePage,
};
pub use store::{
    GameStore, SqliteGameStore, StoreError, UpsertOutcome, WatchlistAdd, WatchlistStore,
};
pub use sync::{
    BulkImporter, CacheAsideResolver, CatalogEntry, CatalogQuery, ImportManager, ImportReport,
    ImportStatus, ImportStop, SyncError, SyncSettings,
};
