use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use tracing::debug;

use crate::collate::{Collate, EvalCollator, TrainCollator};
use crate::config::{CandidateMode, LoaderConfig};
use crate::constants::sampler::{PREFETCHER_STOPPED_REASON, WORKER_THREAD_PREFIX};
use crate::data::SplitFacts;
use crate::encoding::{FactEncoder, IncidenceIndex, KnownFacts};
use crate::errors::DatasetError;
use crate::metrics::DatasetSummary;
use crate::rng::DeterministicRng;
use crate::sampler::{EvalCandidateGenerator, ExampleDataset, TrainSampler};
use crate::splits::{SplitFiles, SplitLabel};
use crate::vocab::{Vocabularies, VocabularyBuilder};

/// Batching options for one `DataLoader`.
#[derive(Clone, Copy, Debug)]
pub struct LoaderOptions {
    /// Examples per batch.
    pub batch_size: usize,
    /// Reorder examples each epoch.
    pub shuffle: bool,
    /// Global seed for example RNGs and shuffles.
    pub seed: Option<u64>,
    /// Size of the dedicated worker pool; `0` builds examples inline.
    pub workers: usize,
}

/// Vocabularies, encoded facts, and indexes loaded from the three split files.
///
/// Everything except the incidence index is held behind `Arc` so samplers and
/// workers share one immutable snapshot.
pub struct HypergraphDataset {
    config: LoaderConfig,
    vocab: Arc<Vocabularies>,
    facts: Arc<SplitFacts>,
    known: Arc<KnownFacts>,
    incidence: Arc<IncidenceIndex>,
}

impl HypergraphDataset {
    /// Read `train.txt`, `valid.txt`, `test.txt` from `config.data_dir`.
    pub fn load(config: LoaderConfig) -> Result<Self, DatasetError> {
        let files = SplitFiles::in_dir(&config.data_dir);
        Self::from_files(config, &files)
    }

    /// Two passes over `files`: vocabulary construction, then encoding.
    pub fn from_files(config: LoaderConfig, files: &SplitFiles) -> Result<Self, DatasetError> {
        config.validate()?;
        let vocab = VocabularyBuilder::from_files(files)?;
        let encoded = FactEncoder::from_files(&vocab, files)?;
        Ok(Self {
            config,
            vocab: Arc::new(vocab),
            facts: Arc::new(encoded.facts),
            known: Arc::new(encoded.known),
            incidence: Arc::new(encoded.incidence),
        })
    }

    /// Settings the dataset was loaded with.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Shared vocabularies.
    pub fn vocab(&self) -> &Arc<Vocabularies> {
        &self.vocab
    }

    /// Shared per-split facts.
    pub fn facts(&self) -> &Arc<SplitFacts> {
        &self.facts
    }

    /// Shared known-facts index used for filtering.
    pub fn known(&self) -> &Arc<KnownFacts> {
        &self.known
    }

    /// Shared entity incidence index over training facts.
    pub fn incidence(&self) -> &Arc<IncidenceIndex> {
        &self.incidence
    }

    /// Sampler over the training split with the configured negative ratio.
    pub fn train_sampler(&self) -> TrainSampler {
        TrainSampler::new(
            Arc::clone(&self.facts),
            &self.vocab,
            self.config.negative_ratio,
        )
    }

    /// Candidate generator for `split` in `mode`.
    pub fn eval_generator(&self, split: SplitLabel, mode: CandidateMode) -> EvalCandidateGenerator {
        EvalCandidateGenerator::new(
            Arc::clone(&self.facts),
            split,
            Arc::clone(&self.known),
            &self.vocab,
            mode,
        )
    }

    /// Training loader plus validation and test loaders in `config.eval_mode`.
    pub fn splits(&self) -> Result<DatasetSplits, DatasetError> {
        let max_arity = self.vocab.max_arity;
        let train = DataLoader::new(
            self.train_sampler(),
            TrainCollator::new(max_arity),
            LoaderOptions {
                batch_size: self.config.batch_size,
                shuffle: self.config.shuffle,
                seed: self.config.seed,
                workers: self.config.workers,
            },
        )?;
        let eval_options = LoaderOptions {
            batch_size: self.config.eval_batch_size,
            shuffle: false,
            seed: self.config.seed,
            workers: self.config.workers,
        };
        let valid = DataLoader::new(
            self.eval_generator(SplitLabel::Validation, self.config.eval_mode),
            EvalCollator::new(max_arity),
            eval_options,
        )?;
        let test = DataLoader::new(
            self.eval_generator(SplitLabel::Test, self.config.eval_mode),
            EvalCollator::new(max_arity),
            eval_options,
        )?;
        debug!(
            train_batches = train.len(),
            valid_batches = valid.len(),
            test_batches = test.len(),
            "data loaders ready"
        );
        Ok(DatasetSplits { train, valid, test })
    }

    /// Counts and arity histograms for reporting.
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::new(&self.vocab, &self.facts, &self.known, &self.incidence)
    }
}

/// Loader over training facts.
pub type TrainLoader = DataLoader<TrainSampler, TrainCollator>;
/// Loader over validation or test facts.
pub type EvalLoader = DataLoader<EvalCandidateGenerator, EvalCollator>;

/// The three loaders a training run consumes.
pub struct DatasetSplits {
    /// Shuffled (when configured) training batches.
    pub train: TrainLoader,
    /// Validation candidate batches.
    pub valid: EvalLoader,
    /// Test candidate batches.
    pub test: EvalLoader,
}

/// Groups example indices into batches and collates them.
pub struct DataLoader<D, C> {
    dataset: Arc<D>,
    collator: Arc<C>,
    options: LoaderOptions,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl<D, C> Clone for DataLoader<D, C> {
    fn clone(&self) -> Self {
        Self {
            dataset: Arc::clone(&self.dataset),
            collator: Arc::clone(&self.collator),
            options: self.options,
            pool: self.pool.clone(),
        }
    }
}

impl<D, C> DataLoader<D, C>
where
    D: ExampleDataset + 'static,
    C: Collate<Example = D::Example> + 'static,
    C::Batch: Send + 'static,
{
    /// Build the loader, spawning a worker pool when `options.workers > 0`.
    pub fn new(dataset: D, collator: C, options: LoaderOptions) -> Result<Self, DatasetError> {
        if options.batch_size == 0 {
            return Err(DatasetError::Configuration(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        let pool = if options.workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.workers)
                .thread_name(|idx| format!("{WORKER_THREAD_PREFIX}-{idx}"))
                .build()
                .map_err(|err| DatasetError::WorkerFailed(err.to_string()))?;
            Some(Arc::new(pool))
        } else {
            None
        };
        Ok(Self {
            dataset: Arc::new(dataset),
            collator: Arc::new(collator),
            options,
            pool,
        })
    }

    /// The indexed view being batched.
    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    /// Batching options in effect.
    pub fn options(&self) -> LoaderOptions {
        self.options
    }

    /// Number of examples.
    pub fn example_count(&self) -> usize {
        self.dataset.len()
    }

    /// Number of batches per epoch; the last batch may be short.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.options.batch_size)
    }

    /// True when there are no batches.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Example order for `epoch`: identity, or a seeded permutation when shuffling.
    pub fn epoch_order(&self, epoch: u64) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.options.shuffle {
            let mut rng = DeterministicRng::for_shuffle(self.options.seed, epoch);
            order.shuffle(&mut rng);
        }
        order
    }

    /// Build and collate the examples at `indices`.
    pub fn collate_indices(&self, epoch: u64, indices: &[usize]) -> Result<C::Batch, DatasetError> {
        let seed = self.options.seed;
        let build = |index: usize| {
            let mut rng = DeterministicRng::for_example(seed, epoch, index);
            self.dataset.example(index, &mut rng)
        };
        let examples = match &self.pool {
            Some(pool) => pool.install(|| {
                indices
                    .par_iter()
                    .map(|index| build(*index))
                    .collect::<Result<Vec<_>, _>>()
            })?,
            None => indices
                .iter()
                .map(|index| build(*index))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(self.collator.collate(examples))
    }

    /// Iterate over the batches of `epoch` in order.
    pub fn batches(&self, epoch: u64) -> Batches<'_, D, C> {
        Batches {
            loader: self,
            epoch,
            order: self.epoch_order(epoch),
            cursor: 0,
        }
    }

    /// Produce the batches of `epoch` on a background thread, keeping up to
    /// `capacity` of them queued.
    pub fn prefetch(&self, epoch: u64, capacity: usize) -> BatchPrefetcher<C::Batch> {
        let loader = self.clone();
        let order = self.epoch_order(epoch);
        let batch_size = self.options.batch_size;
        let mut chunks = order
            .chunks(batch_size)
            .map(<[usize]>::to_vec)
            .collect::<Vec<_>>()
            .into_iter();
        BatchPrefetcher::new(capacity, move || {
            chunks
                .next()
                .map(|indices| loader.collate_indices(epoch, &indices))
        })
    }
}

/// Iterator over one epoch of collated batches.
pub struct Batches<'a, D, C> {
    loader: &'a DataLoader<D, C>,
    epoch: u64,
    order: Vec<usize>,
    cursor: usize,
}

impl<D, C> Iterator for Batches<'_, D, C>
where
    D: ExampleDataset + 'static,
    C: Collate<Example = D::Example> + 'static,
    C::Batch: Send + 'static,
{
    type Item = Result<C::Batch, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.loader.options.batch_size).min(self.order.len());
        let indices = &self.order[self.cursor..end];
        self.cursor = end;
        Some(self.loader.collate_indices(self.epoch, indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .order
            .len()
            .saturating_sub(self.cursor)
            .div_ceil(self.loader.options.batch_size);
        (remaining, Some(remaining))
    }
}

impl<D, C> ExactSizeIterator for Batches<'_, D, C>
where
    D: ExampleDataset + 'static,
    C: Collate<Example = D::Example> + 'static,
    C::Batch: Send + 'static,
{
}

/// Background producer that fills a bounded queue with batches until the
/// epoch is exhausted.
pub struct BatchPrefetcher<T> {
    receiver: Option<mpsc::Receiver<Result<T, DatasetError>>>,
    handle: Option<thread::JoinHandle<()>>,
    stats: Arc<PrefetcherStats>,
}

#[derive(Default)]
/// Prefetcher runtime counters.
struct PrefetcherStats {
    queued: AtomicUsize,
    produced: AtomicUsize,
    errors: AtomicUsize,
    finished: AtomicBool,
}

impl<T: Send + 'static> BatchPrefetcher<T> {
    fn new<F>(capacity: usize, mut producer: F) -> Self
    where
        F: FnMut() -> Option<Result<T, DatasetError>> + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let stats = Arc::new(PrefetcherStats::default());
        let stats_thread = Arc::clone(&stats);
        let handle = thread::spawn(move || {
            while let Some(result) = producer() {
                if result.is_err() {
                    stats_thread.errors.fetch_add(1, Ordering::Relaxed);
                }
                // Counted before the send so a fast consumer never sees it underflow.
                stats_thread.queued.fetch_add(1, Ordering::Relaxed);
                if sender.send(result).is_err() {
                    stats_thread.queued.fetch_sub(1, Ordering::Relaxed);
                    return;
                }
                stats_thread.produced.fetch_add(1, Ordering::Relaxed);
            }
            stats_thread.finished.store(true, Ordering::Release);
        });
        Self {
            receiver: Some(receiver),
            handle: Some(handle),
            stats,
        }
    }

    /// Block until the next batch is ready; `None` once the epoch is done.
    pub fn next_batch(&self) -> Option<Result<T, DatasetError>> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(result) => {
                self.stats
                    .queued
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| {
                        Some(value.saturating_sub(1))
                    })
                    .ok();
                Some(result)
            }
            Err(_) if self.stats.finished.load(Ordering::Acquire) => None,
            Err(_) => Some(Err(DatasetError::WorkerFailed(
                PREFETCHER_STOPPED_REASON.to_string(),
            ))),
        }
    }

    /// Number of prefetched batches currently queued.
    pub fn queue_len(&self) -> usize {
        self.stats.queued.load(Ordering::Relaxed)
    }

    /// Total number of batches handed to the queue.
    pub fn produced_count(&self) -> usize {
        self.stats.produced.load(Ordering::Relaxed)
    }

    /// Total number of failed batches produced by the background worker.
    pub fn error_count(&self) -> usize {
        self.stats.errors.load(Ordering::Relaxed)
    }
}

impl<T: Send + 'static> Iterator for BatchPrefetcher<T> {
    type Item = Result<T, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.next_batch();
        if matches!(item, None | Some(Err(DatasetError::WorkerFailed(_)))) {
            self.receiver.take();
        }
        item
    }
}

impl<T> Drop for BatchPrefetcher<T> {
    fn drop(&mut self) {
        self.receiver.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drained_prefetcher_reports_an_empty_queue() {
        let mut remaining = 3usize;
        let prefetcher = BatchPrefetcher::new(1, move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            Some(if remaining == 1 {
                Err(DatasetError::EmptyVocabulary)
            } else {
                Ok(remaining)
            })
        });

        let mut seen = Vec::new();
        while let Some(result) = prefetcher.next_batch() {
            seen.push(result.ok());
        }

        assert_eq!(seen, vec![Some(2), None, Some(0)]);
        assert_eq!(prefetcher.queue_len(), 0);
        assert_eq!(prefetcher.produced_count(), 3);
        assert_eq!(prefetcher.error_count(), 1);
    }
}
