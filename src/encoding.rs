use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::constants::item::NEGATIVE_LABEL;
use crate::constants::vocab::SENTINEL_ID;
use crate::data::{EncodedItem, Fact, RawFact, SplitFacts};
use crate::errors::DatasetError;
use crate::splits::{SplitFiles, SplitLabel};
use crate::transport::fs::LineStream;
use crate::types::{EntityId, LineNumber};
use crate::vocab::Vocabularies;

/// Lookup key for the entities completing a fact pattern at one slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CompletionKey {
    slot: usize,
    pattern: EncodedItem,
}

impl CompletionKey {
    fn new(item: &EncodedItem, slot: usize) -> Self {
        let mut pattern = item.canonical();
        pattern.set_entity(slot, SENTINEL_ID);
        Self { slot, pattern }
    }
}

/// Every fact of every split in canonical encoded form.
///
/// Alongside the plain set, each fact is indexed once per slot under its
/// pattern with that slot blanked, so filtered candidate generation can ask
/// "which entities complete this pattern" without hashing `n - 1` tuples.
#[derive(Clone, Debug, Default)]
pub struct KnownFacts {
    items: HashSet<EncodedItem>,
    completions: HashMap<CompletionKey, HashSet<EntityId>>,
}

impl KnownFacts {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the canonical form of `item`; returns false if already known.
    pub fn insert(&mut self, item: &EncodedItem) -> bool {
        let canonical = item.canonical();
        if self.items.contains(&canonical) {
            return false;
        }
        for slot in 0..canonical.arity() {
            self.completions
                .entry(CompletionKey::new(&canonical, slot))
                .or_default()
                .insert(canonical.entity(slot));
        }
        self.items.insert(canonical)
    }

    /// True if `item`, ignoring its label, is a known fact.
    pub fn contains(&self, item: &EncodedItem) -> bool {
        if item.label() == NEGATIVE_LABEL {
            return self.items.contains(item);
        }
        self.items.contains(&item.canonical())
    }

    /// Entities that turn `item` into a known fact when placed at `slot`.
    pub fn completions(&self, item: &EncodedItem, slot: usize) -> Option<&HashSet<EntityId>> {
        self.completions.get(&CompletionKey::new(item, slot))
    }

    /// Number of distinct known facts.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Known facts in canonical (label `0`) form.
    pub fn iter(&self) -> impl Iterator<Item = &EncodedItem> {
        self.items.iter()
    }
}

/// Entity -> training facts it participates in, in file order.
///
/// A fact naming the same entity twice is listed twice for that entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncidenceIndex {
    by_entity: HashMap<EntityId, Vec<Fact>>,
}

impl IncidenceIndex {
    /// Record `fact` under each of its entities.
    pub fn insert(&mut self, fact: &Fact) {
        for entity in fact.entities() {
            self.by_entity
                .entry(*entity)
                .or_default()
                .push(fact.clone());
        }
    }

    /// Facts incident to `entity`; empty for entities absent from training.
    pub fn facts(&self, entity: EntityId) -> &[Fact] {
        self.by_entity
            .get(&entity)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of incident facts, duplicates included.
    pub fn degree(&self, entity: EntityId) -> usize {
        self.facts(entity).len()
    }

    /// Number of entities with at least one incident training fact.
    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }

    /// Entities with their incident facts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &[Fact])> {
        self.by_entity
            .iter()
            .map(|(entity, facts)| (*entity, facts.as_slice()))
    }
}

/// Output of the encoding pass.
#[derive(Clone, Debug)]
pub struct EncodedDataset {
    /// Facts per split, in file order.
    pub facts: SplitFacts,
    /// Every fact from every split.
    pub known: KnownFacts,
    /// Training facts per entity.
    pub incidence: IncidenceIndex,
}

/// Second pass: maps tokens to ids and accumulates facts, known facts, incidence.
pub struct FactEncoder<'a> {
    vocab: &'a Vocabularies,
    facts: SplitFacts,
    known: KnownFacts,
    incidence: IncidenceIndex,
}

impl<'a> FactEncoder<'a> {
    /// Encoder resolving tokens against `vocab`.
    pub fn new(vocab: &'a Vocabularies) -> Self {
        Self {
            vocab,
            facts: SplitFacts::default(),
            known: KnownFacts::new(),
            incidence: IncidenceIndex::default(),
        }
    }

    /// Encode one parsed line of `split`.
    pub fn encode(
        &mut self,
        split: SplitLabel,
        line: LineNumber,
        raw: &RawFact<'_>,
    ) -> Result<(), DatasetError> {
        let relation =
            self.vocab
                .relations
                .id(raw.relation)
                .ok_or_else(|| DatasetError::UnknownToken {
                    split,
                    line,
                    token: raw.relation.to_string(),
                })?;
        let entities = raw
            .entities
            .iter()
            .map(|token| {
                self.vocab
                    .entities
                    .id(token)
                    .ok_or_else(|| DatasetError::UnknownToken {
                        split,
                        line,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<EntityId>, _>>()?;
        let fact = Fact::new(relation, entities);
        let item = fact.encode(self.vocab.max_arity)?;
        self.known.insert(&item);
        if split == SplitLabel::Train {
            self.incidence.insert(&fact);
        }
        self.facts.push(split, fact);
        Ok(())
    }

    /// Parse and encode every line of one split file.
    pub fn scan_file(
        &mut self,
        split: SplitLabel,
        stream: &LineStream,
    ) -> Result<(), DatasetError> {
        stream.for_each_line(|line_no, line| match RawFact::parse(split, line_no, line)? {
            Some(raw) => self.encode(split, line_no, &raw),
            None => Ok(()),
        })
    }

    /// Encode train, valid, test in that order.
    pub fn from_files(
        vocab: &'a Vocabularies,
        files: &SplitFiles,
    ) -> Result<EncodedDataset, DatasetError> {
        let mut encoder = Self::new(vocab);
        for (split, path) in files.iter() {
            encoder.scan_file(split, &LineStream::new(path))?;
        }
        Ok(encoder.finish())
    }

    /// Consume the encoder and return everything it built.
    pub fn finish(self) -> EncodedDataset {
        info!(
            train = self.facts.len(SplitLabel::Train),
            valid = self.facts.len(SplitLabel::Validation),
            test = self.facts.len(SplitLabel::Test),
            known = self.known.len(),
            incident_entities = self.incidence.len(),
            "facts encoded"
        );
        EncodedDataset {
            facts: self.facts,
            known: self.known,
            incidence: self.incidence,
        }
    }
}
