use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::{Fact, SplitFacts};
use crate::encoding::{IncidenceIndex, KnownFacts};
use crate::splits::{ALL_SPLITS, SplitLabel};
use crate::types::Arity;
use crate::vocab::Vocabularies;

/// Fact count and arity distribution of one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// Which split this describes.
    pub split: SplitLabel,
    /// Facts in the split, duplicates included.
    pub facts: usize,
    /// Arity -> number of facts with that arity.
    pub arity_histogram: BTreeMap<Arity, usize>,
}

/// Aggregate statistics of a loaded hypergraph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    /// Real entities (sentinel excluded).
    pub entities: usize,
    /// Real relations (sentinel excluded).
    pub relations: usize,
    /// Largest arity across all splits.
    pub max_arity: Arity,
    /// Per-split summaries in train, valid, test order.
    pub splits: Vec<SplitSummary>,
    /// Distinct facts across all splits.
    pub known_facts: usize,
    /// Entities appearing in at least one training fact.
    pub incident_entities: usize,
}

impl DatasetSummary {
    /// Summarize the encoded snapshot.
    pub fn new(
        vocab: &Vocabularies,
        facts: &SplitFacts,
        known: &KnownFacts,
        incidence: &IncidenceIndex,
    ) -> Self {
        let splits = ALL_SPLITS
            .into_iter()
            .map(|split| SplitSummary {
                split,
                facts: facts.len(split),
                arity_histogram: arity_histogram(facts.get(split)),
            })
            .collect();
        Self {
            entities: vocab.entity_count().saturating_sub(1),
            relations: vocab.relation_count().saturating_sub(1),
            max_arity: vocab.max_arity,
            splits,
            known_facts: known.len(),
            incident_entities: incidence.len(),
        }
    }

    /// Summary of `label`, if recorded.
    pub fn split(&self, label: SplitLabel) -> Option<&SplitSummary> {
        self.splits.iter().find(|summary| summary.split == label)
    }
}

/// Count facts per arity.
pub fn arity_histogram(facts: &[Fact]) -> BTreeMap<Arity, usize> {
    let mut histogram = BTreeMap::new();
    for fact in facts {
        *histogram.entry(fact.arity()).or_insert(0) += 1;
    }
    histogram
}
