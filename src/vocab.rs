use indexmap::IndexSet;
use tracing::info;

use crate::constants::vocab::{SENTINEL_ID, SENTINEL_TOKEN};
use crate::data::RawFact;
use crate::errors::DatasetError;
use crate::splits::{SplitFiles, SplitLabel};
use crate::transport::fs::LineStream;
use crate::types::{Arity, Token};

/// Insertion-ordered token <-> id bijection with the sentinel at id `0`.
///
/// Backed by an `IndexSet`, which pairs a hash lookup (token -> id) with the
/// dense insertion-ordered sequence (id -> token).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: IndexSet<Token>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Vocabulary holding only the sentinel.
    pub fn new() -> Self {
        let mut tokens = IndexSet::new();
        tokens.insert(SENTINEL_TOKEN.to_string());
        Self { tokens }
    }

    /// Insert `token` if unseen and return its id.
    pub fn insert(&mut self, token: &str) -> Result<u32, DatasetError> {
        if let Some(id) = self.id(token) {
            return Ok(id);
        }
        if self.tokens.len() >= u32::MAX as usize {
            return Err(DatasetError::Capacity {
                what: "vocabulary",
                len: self.tokens.len() + 1,
                max: u32::MAX as usize,
            });
        }
        let (idx, _) = self.tokens.insert_full(token.to_string());
        Ok(idx as u32)
    }

    /// Id of a real token; the sentinel token has no real id.
    pub fn id(&self, token: &str) -> Option<u32> {
        if token == SENTINEL_TOKEN {
            return None;
        }
        self.tokens.get_index_of(token).map(|idx| idx as u32)
    }

    /// Token for a real id; `0` maps to no token.
    pub fn token(&self, id: u32) -> Option<&str> {
        if id == SENTINEL_ID {
            return None;
        }
        self.tokens.get_index(id as usize).map(String::as_str)
    }

    /// Size including the sentinel (`n` for entities, `N` for relations).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when no real token has been inserted.
    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    /// Exclusive upper bound of valid ids, as an id.
    pub fn id_bound(&self) -> u32 {
        self.tokens.len() as u32
    }

    /// Real tokens with their ids, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.tokens
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, token)| (idx as u32, token.as_str()))
    }
}

/// Entity and relation vocabularies plus the global maximum arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabularies {
    /// Entity tokens; id `0` is the sentinel.
    pub entities: Vocabulary,
    /// Relation tokens; id `0` is the sentinel.
    pub relations: Vocabulary,
    /// Largest arity seen in any split.
    pub max_arity: Arity,
}

impl Vocabularies {
    /// `n`: entity vocabulary size including the sentinel.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// `N`: relation vocabulary size including the sentinel.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Width of every encoded item (`m + 3`).
    pub fn item_width(&self) -> usize {
        self.max_arity + crate::constants::item::NON_ENTITY_COLUMNS
    }
}

/// First pass: collects tokens in first-seen order and the maximum arity.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    entities: Vocabulary,
    relations: Vocabulary,
    max_arity: Arity,
    lines: usize,
}

impl VocabularyBuilder {
    /// Builder with only the sentinel tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tokens of one fact.
    pub fn observe(&mut self, fact: &RawFact<'_>) -> Result<(), DatasetError> {
        self.relations.insert(fact.relation)?;
        for entity in &fact.entities {
            self.entities.insert(entity)?;
        }
        self.max_arity = self.max_arity.max(fact.arity());
        self.lines += 1;
        Ok(())
    }

    /// Parse and observe every line of one split file.
    pub fn scan_file(
        &mut self,
        split: SplitLabel,
        stream: &LineStream,
    ) -> Result<(), DatasetError> {
        stream.for_each_line(|line_no, line| match RawFact::parse(split, line_no, line)? {
            Some(fact) => self.observe(&fact),
            None => Ok(()),
        })
    }

    /// Scan train, valid, test in that order and build the vocabularies.
    pub fn from_files(files: &SplitFiles) -> Result<Vocabularies, DatasetError> {
        let mut builder = Self::new();
        for (split, path) in files.iter() {
            builder.scan_file(split, &LineStream::new(path))?;
        }
        Ok(builder.finish())
    }

    /// Freeze the observed tokens into vocabularies.
    pub fn finish(self) -> Vocabularies {
        info!(
            entities = self.entities.len() - 1,
            relations = self.relations.len() - 1,
            max_arity = self.max_arity,
            lines = self.lines,
            "vocabularies built"
        );
        Vocabularies {
            entities: self.entities,
            relations: self.relations,
            max_arity: self.max_arity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe_lines(lines: &[&str]) -> Vocabularies {
        let mut builder = VocabularyBuilder::new();
        for (idx, line) in lines.iter().enumerate() {
            if let Some(fact) = RawFact::parse(SplitLabel::Train, idx + 1, line).unwrap() {
                builder.observe(&fact).unwrap();
            }
        }
        builder.finish()
    }

    #[test]
    fn ids_follow_first_seen_order() {
        let vocab = observe_lines(&["r1\tA\tB", "r2\tA\tB\tC"]);
        assert_eq!(vocab.entities.id("A"), Some(1));
        assert_eq!(vocab.entities.id("B"), Some(2));
        assert_eq!(vocab.entities.id("C"), Some(3));
        assert_eq!(vocab.relations.id("r1"), Some(1));
        assert_eq!(vocab.relations.id("r2"), Some(2));
        assert_eq!(vocab.entity_count(), 4);
        assert_eq!(vocab.relation_count(), 3);
        assert_eq!(vocab.max_arity, 3);
        assert_eq!(vocab.item_width(), 6);
    }

    #[test]
    fn sentinel_maps_to_no_token() {
        let vocab = observe_lines(&["r1\tA"]);
        assert_eq!(vocab.entities.token(0), None);
        assert_eq!(vocab.relations.token(0), None);
        assert_eq!(vocab.entities.id(""), None);
        assert_eq!(vocab.entities.token(1), Some("A"));
        assert_eq!(vocab.entities.token(2), None);
    }

    #[test]
    fn tokens_round_trip_through_ids() {
        let vocab = observe_lines(&["r1\tA\tB\tC", "r2\tD\tA", "r1\tE"]);
        for (id, token) in vocab.entities.iter() {
            assert_eq!(vocab.entities.id(token), Some(id));
            assert_eq!(vocab.entities.token(id), Some(token));
        }
        let ids: Vec<u32> = vocab.entities.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn repeated_inserts_keep_the_first_id() {
        let mut vocab = Vocabulary::new();
        assert!(vocab.is_empty());
        assert_eq!(vocab.insert("x").unwrap(), 1);
        assert_eq!(vocab.insert("y").unwrap(), 2);
        assert_eq!(vocab.insert("x").unwrap(), 1);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id_bound(), 3);
        assert!(!vocab.is_empty());
    }
}
