#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Batch collation and mask derivation.
pub mod collate;
/// Loader configuration types.
pub mod config;
/// Centralized constants used across vocabularies, samplers, and loaders.
pub mod constants;
/// Parsed lines, facts, and fixed-width encoded items.
pub mod data;
/// Fact encoding, known-facts filtering index, and incidence index.
pub mod encoding;
/// Reusable report runner shared by the demo binaries.
pub mod example_apps;
mod hash;
/// Row-count estimates for epochs and candidate sets.
pub mod heuristics;
/// Dataset loading and batch iteration.
pub mod loader;
/// Dataset statistics.
pub mod metrics;
/// Deterministic per-example randomness.
pub mod rng;
/// Negative sampling and evaluation candidate generation.
pub mod sampler;
/// Split labels and split file resolution.
pub mod splits;
/// Input transports used by the loader (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Entity and relation vocabularies.
pub mod vocab;

mod errors;

pub use collate::{Collate, EvalBatch, EvalCollator, MaskMatrix, TrainBatch, TrainCollator};
pub use config::{CandidateMode, LoaderConfig};
pub use data::{EncodedItem, Fact, RawFact, SplitFacts};
pub use encoding::{EncodedDataset, FactEncoder, IncidenceIndex, KnownFacts};
pub use errors::DatasetError;
pub use loader::{
    BatchPrefetcher, Batches, DataLoader, DatasetSplits, EvalLoader, HypergraphDataset,
    LoaderOptions, TrainLoader,
};
pub use metrics::{DatasetSummary, SplitSummary};
pub use rng::DeterministicRng;
pub use sampler::{EvalCandidateGenerator, EvalExample, ExampleDataset, TrainSampler};
pub use splits::{SplitFiles, SplitLabel};
pub use types::{Arity, EntityId, GroupLen, LineNumber, RelationId, Token};
pub use vocab::{Vocabularies, Vocabulary, VocabularyBuilder};
