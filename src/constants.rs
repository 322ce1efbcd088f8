use crate::splits::SplitLabel;
use crate::types::EntityId;

/// Constants used by vocabulary construction.
pub mod vocab {
    use super::EntityId;

    /// Reserved id for padding and unused slots in both vocabularies.
    pub const SENTINEL_ID: EntityId = 0;
    /// Token stored at the sentinel id; never produced by parsing.
    pub const SENTINEL_TOKEN: &str = "";
}

/// Constants describing the split file format.
pub mod files {
    /// Separator between the relation token and each entity token.
    pub const FIELD_DELIMITER: char = '\t';
    /// Extension appended to each split stem (`train` -> `train.txt`).
    pub const SPLIT_FILE_EXTENSION: &str = "txt";
}

/// Constants describing the fixed-width encoded item layout.
pub mod item {
    /// Column holding the relation id.
    pub const RELATION_COLUMN: usize = 0;
    /// Columns that are not entity slots: relation, label, arity.
    pub const NON_ENTITY_COLUMNS: usize = 3;
    /// Label carried by the canonical positive row of a group.
    pub const POSITIVE_LABEL: u32 = 1;
    /// Label carried by every other row.
    pub const NEGATIVE_LABEL: u32 = 0;
}

/// Constants used by samplers and data loaders.
pub mod sampler {
    /// Offset mixed into per-example seed derivation.
    pub const EXAMPLE_SEED_OFFSET: u64 = 0x4859_5045_5245_4447;
    /// Offset mixed into per-epoch shuffle seed derivation.
    pub const SHUFFLE_SEED_OFFSET: u64 = 0xB4C3_5EED;
    /// Failure reason emitted when a prefetcher worker stops unexpectedly.
    pub const PREFETCHER_STOPPED_REASON: &str = "prefetcher stopped";
    /// Thread name prefix for data-loading workers.
    pub const WORKER_THREAD_PREFIX: &str = "hyperbatch-worker";
}

/// Defaults used by `LoaderConfig`.
pub mod loader {
    /// Default dataset directory holding `train.txt`, `valid.txt`, `test.txt`.
    pub const DEFAULT_DATA_DIR: &str = "data";
    /// Default number of training facts per batch.
    pub const DEFAULT_BATCH_SIZE: usize = 128;
    /// Default number of evaluation facts per batch.
    pub const DEFAULT_EVAL_BATCH_SIZE: usize = 8;
    /// Default corrupted rows generated per entity slot.
    pub const DEFAULT_NEGATIVE_RATIO: usize = 10;
}

/// Constants used by split handling.
pub mod splits {
    use super::SplitLabel;

    /// Canonical read order; vocabulary ids depend on it.
    pub const ALL_SPLITS: [SplitLabel; 3] =
        [SplitLabel::Train, SplitLabel::Validation, SplitLabel::Test];
}
