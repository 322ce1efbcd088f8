use rand::Rng;
use std::sync::Arc;

use crate::config::CandidateMode;
use crate::constants::item::POSITIVE_LABEL;
use crate::data::{EncodedItem, Fact, SplitFacts};
use crate::encoding::KnownFacts;
use crate::errors::DatasetError;
use crate::splits::SplitLabel;
use crate::types::{Arity, EntityId, GroupLen};
use crate::vocab::Vocabularies;

/// Indexed view that expands one fact into one per-example tensor.
///
/// Implementations only read shared snapshots, so any number of workers can
/// call `example` concurrently on disjoint indices.
pub trait ExampleDataset: Send + Sync {
    /// Per-example output handed to the collator.
    type Example: Send;

    /// Number of examples (facts) in the view.
    fn len(&self) -> usize;

    /// True when the view has no examples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build example `index`, drawing any randomness from `rng`.
    fn example<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<Self::Example, DatasetError>;
}

fn fact_at(facts: &[Fact], index: usize) -> Result<&Fact, DatasetError> {
    facts.get(index).ok_or(DatasetError::IndexOutOfRange {
        index,
        len: facts.len(),
    })
}

/// Expands a training fact into its positive row plus `r` corruptions per slot.
#[derive(Clone, Debug)]
pub struct TrainSampler {
    facts: Arc<SplitFacts>,
    max_arity: Arity,
    entity_bound: EntityId,
    negative_ratio: usize,
}

impl TrainSampler {
    /// Sampler over the training split drawing `negative_ratio` corruptions per slot.
    pub fn new(facts: Arc<SplitFacts>, vocab: &Vocabularies, negative_ratio: usize) -> Self {
        Self {
            facts,
            max_arity: vocab.max_arity,
            entity_bound: vocab.entities.id_bound(),
            negative_ratio,
        }
    }

    /// Corruptions drawn per entity slot.
    pub fn negative_ratio(&self) -> usize {
        self.negative_ratio
    }

    /// Row count `1 + r * a` produced for fact `index`.
    pub fn rows_for(&self, index: usize) -> Result<usize, DatasetError> {
        let fact = fact_at(self.facts.get(SplitLabel::Train), index)?;
        self.row_count(fact.arity())
    }

    fn row_count(&self, arity: usize) -> Result<usize, DatasetError> {
        self.negative_ratio
            .checked_mul(arity)
            .and_then(|negatives| negatives.checked_add(1))
            .ok_or(DatasetError::Capacity {
                what: "training rows per slot",
                len: self.negative_ratio,
                max: (usize::MAX - 1) / arity.max(1),
            })
    }

    /// Positive row (label `1`) followed by the corruptions of slot 0, slot 1, ...
    ///
    /// Each corruption replaces one slot with an entity drawn uniformly from
    /// `1..n`. Draws are not checked against known facts.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<Vec<EncodedItem>, DatasetError> {
        let fact = fact_at(self.facts.get(SplitLabel::Train), index)?;
        let arity = fact.arity();
        if self.negative_ratio > 0 && arity > 0 && self.entity_bound < 2 {
            return Err(DatasetError::EmptyVocabulary);
        }
        let row_count = self.row_count(arity)?;
        let positive = fact.encode(self.max_arity)?;

        let mut rows = Vec::with_capacity(row_count);
        rows.push(positive.clone().with_label(POSITIVE_LABEL));
        for slot in 0..arity {
            for _ in 0..self.negative_ratio {
                let mut corrupted = positive.clone();
                corrupted.set_entity(slot, rng.random_range(1..self.entity_bound));
                rows.push(corrupted);
            }
        }
        Ok(rows)
    }
}

impl ExampleDataset for TrainSampler {
    type Example = Vec<EncodedItem>;

    fn len(&self) -> usize {
        self.facts.len(SplitLabel::Train)
    }

    fn example<R: Rng + ?Sized>(
        &self,
        index: usize,
        rng: &mut R,
    ) -> Result<Self::Example, DatasetError> {
        self.sample(index, rng)
    }
}

/// Candidate rows for every slot of one evaluation fact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalExample {
    /// Slot groups concatenated in slot order; each starts with the positive.
    pub rows: Vec<EncodedItem>,
    /// Row count of each slot group, in the same order.
    pub group_lens: Vec<GroupLen>,
}

/// Expands an evaluation fact into ranking candidates for each entity slot.
#[derive(Clone, Debug)]
pub struct EvalCandidateGenerator {
    facts: Arc<SplitFacts>,
    split: SplitLabel,
    known: Arc<KnownFacts>,
    max_arity: Arity,
    entity_bound: EntityId,
    mode: CandidateMode,
}

impl EvalCandidateGenerator {
    /// Generator over `split` in `mode`.
    pub fn new(
        facts: Arc<SplitFacts>,
        split: SplitLabel,
        known: Arc<KnownFacts>,
        vocab: &Vocabularies,
        mode: CandidateMode,
    ) -> Self {
        Self {
            facts,
            split,
            known,
            max_arity: vocab.max_arity,
            entity_bound: vocab.entities.id_bound(),
            mode,
        }
    }

    /// Split the candidates are generated for.
    pub fn split(&self) -> SplitLabel {
        self.split
    }

    /// Raw or filtered candidate generation.
    pub fn mode(&self) -> CandidateMode {
        self.mode
    }

    /// One group per slot: the positive (label `1`) followed by substitutions
    /// in ascending entity id order.
    pub fn candidates(&self, index: usize) -> Result<EvalExample, DatasetError> {
        let fact = fact_at(self.facts.get(self.split), index)?;
        let positive = fact.encode(self.max_arity)?;
        let mut rows = Vec::new();
        let mut group_lens = Vec::with_capacity(fact.arity());
        for slot in 0..fact.arity() {
            let before = rows.len();
            self.extend_group(&mut rows, &positive, slot);
            group_lens.push(rows.len() - before);
        }
        Ok(EvalExample { rows, group_lens })
    }

    fn extend_group(&self, rows: &mut Vec<EncodedItem>, positive: &EncodedItem, slot: usize) {
        rows.push(positive.clone().with_label(POSITIVE_LABEL));
        let known = match self.mode {
            CandidateMode::Raw => None,
            CandidateMode::Filtered => self.known.completions(positive, slot),
        };
        rows.reserve(self.entity_bound.saturating_sub(1) as usize);
        for entity in 1..self.entity_bound {
            if known.is_some_and(|completions| completions.contains(&entity)) {
                continue;
            }
            let mut candidate = positive.clone();
            candidate.set_entity(slot, entity);
            rows.push(candidate);
        }
    }
}

impl ExampleDataset for EvalCandidateGenerator {
    type Example = EvalExample;

    fn len(&self) -> usize {
        self.facts.len(self.split)
    }

    fn example<R: Rng + ?Sized>(
        &self,
        index: usize,
        _rng: &mut R,
    ) -> Result<Self::Example, DatasetError> {
        self.candidates(index)
    }
}
