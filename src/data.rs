use serde::{Deserialize, Serialize};

use crate::constants::files::FIELD_DELIMITER;
use crate::constants::item::{NEGATIVE_LABEL, NON_ENTITY_COLUMNS, RELATION_COLUMN};
use crate::errors::DatasetError;
use crate::splits::SplitLabel;
use crate::types::{Arity, EntityId, LineNumber, RelationId};

/// Tokens of one parsed split-file line, borrowed from the line buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFact<'a> {
    /// Relation token (first field).
    pub relation: &'a str,
    /// Entity tokens in order (remaining fields).
    pub entities: Vec<&'a str>,
}

impl<'a> RawFact<'a> {
    /// Parse `relation<TAB>entity_1<TAB>...<TAB>entity_k`.
    ///
    /// Surrounding whitespace is trimmed first. Blank lines yield `Ok(None)`.
    /// A line without entities or with an empty field is rejected.
    pub fn parse(
        split: SplitLabel,
        line: LineNumber,
        text: &'a str,
    ) -> Result<Option<Self>, DatasetError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let mut fields = trimmed.split(FIELD_DELIMITER);
        let Some(relation) = fields.next() else {
            return Ok(None);
        };
        let entities: Vec<&str> = fields.collect();
        if entities.is_empty() {
            return Err(DatasetError::MalformedLine {
                split,
                line,
                reason: format!("relation '{relation}' has no entities"),
            });
        }
        if let Some(slot) = entities.iter().position(|token| token.is_empty()) {
            return Err(DatasetError::MalformedLine {
                split,
                line,
                reason: format!("entity field {} is empty", slot + 1),
            });
        }
        Ok(Some(Self { relation, entities }))
    }

    /// Number of entity tokens on the line.
    pub fn arity(&self) -> Arity {
        self.entities.len()
    }
}

/// Unpadded fact tuple `(relation, entity_1, ..., entity_a)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    relation: RelationId,
    entities: Box<[EntityId]>,
}

impl Fact {
    /// Fact of `relation` over `entities`.
    pub fn new(relation: RelationId, entities: impl Into<Box<[EntityId]>>) -> Self {
        Self {
            relation,
            entities: entities.into(),
        }
    }

    /// Relation id.
    pub fn relation(&self) -> RelationId {
        self.relation
    }

    /// Entity ids in slot order.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Number of entities.
    pub fn arity(&self) -> Arity {
        self.entities.len()
    }

    /// `[relation, entity_1, ..., entity_a]` as a flat tuple.
    pub fn to_tuple(&self) -> Vec<u32> {
        let mut tuple = Vec::with_capacity(1 + self.entities.len());
        tuple.push(self.relation);
        tuple.extend_from_slice(&self.entities);
        tuple
    }

    /// Encode into a record of width `max_arity + 3` with label `0`.
    pub fn encode(&self, max_arity: Arity) -> Result<EncodedItem, DatasetError> {
        EncodedItem::new(self.relation, &self.entities, max_arity)
    }
}

/// Fixed-width record `[relation, e_1..e_m, label, arity]`.
///
/// Entity slots past the arity are zero. Slots are addressed zero-based, so
/// slot `s` lives in column `s + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedItem {
    values: Box<[u32]>,
}

impl EncodedItem {
    /// Build a record for `entities` padded out to `max_arity` slots.
    pub fn new(
        relation: RelationId,
        entities: &[EntityId],
        max_arity: Arity,
    ) -> Result<Self, DatasetError> {
        if entities.len() > max_arity {
            return Err(DatasetError::Capacity {
                what: "fact arity",
                len: entities.len(),
                max: max_arity,
            });
        }
        let arity = u32::try_from(entities.len()).map_err(|_| DatasetError::Capacity {
            what: "fact arity",
            len: entities.len(),
            max: u32::MAX as usize,
        })?;
        let mut values = vec![0_u32; max_arity + NON_ENTITY_COLUMNS];
        values[RELATION_COLUMN] = relation;
        values[1..=entities.len()].copy_from_slice(entities);
        values[max_arity + 1] = NEGATIVE_LABEL;
        values[max_arity + 2] = arity;
        Ok(Self {
            values: values.into_boxed_slice(),
        })
    }

    /// Total number of columns (`m + 3`).
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// Number of entity slots (`m`).
    pub fn max_arity(&self) -> Arity {
        self.values.len() - NON_ENTITY_COLUMNS
    }

    /// Relation column.
    pub fn relation(&self) -> RelationId {
        self.values[RELATION_COLUMN]
    }

    /// All `m` entity slots, padding included.
    pub fn entities(&self) -> &[EntityId] {
        &self.values[1..=self.max_arity()]
    }

    /// Entity in zero-based `slot`.
    pub fn entity(&self, slot: usize) -> EntityId {
        self.entities()[slot]
    }

    /// Overwrite the entity in zero-based `slot`.
    pub fn set_entity(&mut self, slot: usize, entity: EntityId) {
        self.values[slot + 1] = entity;
    }

    /// Label column (`1` positive, `0` otherwise).
    pub fn label(&self) -> u32 {
        self.values[self.max_arity() + 1]
    }

    /// Overwrite the label column.
    pub fn set_label(&mut self, label: u32) {
        let column = self.max_arity() + 1;
        self.values[column] = label;
    }

    /// Builder form of `set_label`.
    pub fn with_label(mut self, label: u32) -> Self {
        self.set_label(label);
        self
    }

    /// Arity as recorded in the trailing column.
    pub fn arity(&self) -> Arity {
        self.values[self.max_arity() + 2] as Arity
    }

    /// Copy with the label reset to `0`; the form stored in the known-facts set.
    pub fn canonical(&self) -> Self {
        self.clone().with_label(NEGATIVE_LABEL)
    }

    /// Unpadded fact this record encodes.
    pub fn fact(&self) -> Fact {
        let arity = self.arity().min(self.max_arity());
        Fact::new(self.relation(), &self.entities()[..arity])
    }

    /// The raw `[relation, e1..em, label, arity]` record.
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }
}

/// Encoded fact lists per split, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitFacts {
    train: Vec<Fact>,
    validation: Vec<Fact>,
    test: Vec<Fact>,
}

impl SplitFacts {
    /// Facts of `split`.
    pub fn get(&self, split: SplitLabel) -> &[Fact] {
        match split {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// Append `fact` to `split`.
    pub fn push(&mut self, split: SplitLabel, fact: Fact) {
        match split {
            SplitLabel::Train => self.train.push(fact),
            SplitLabel::Validation => self.validation.push(fact),
            SplitLabel::Test => self.test.push(fact),
        }
    }

    /// Number of facts in `split`.
    pub fn len(&self, split: SplitLabel) -> usize {
        self.get(split).len()
    }

    /// Total facts across all splits.
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::item::POSITIVE_LABEL;

    #[test]
    fn parse_splits_relation_and_entities() {
        let raw = RawFact::parse(SplitLabel::Train, 1, "r2\tA\tB\tC\n")
            .unwrap()
            .unwrap();
        assert_eq!(raw.relation, "r2");
        assert_eq!(raw.entities, vec!["A", "B", "C"]);
        assert_eq!(raw.arity(), 3);
    }

    #[test]
    fn parse_skips_blank_lines() {
        assert!(
            RawFact::parse(SplitLabel::Test, 4, "  \r\n")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn parse_rejects_lines_without_entities() {
        let err = RawFact::parse(SplitLabel::Validation, 7, "r1").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MalformedLine { split: SplitLabel::Validation, line: 7, .. }
        ));
    }

    #[test]
    fn parse_rejects_empty_entity_fields() {
        let err = RawFact::parse(SplitLabel::Train, 2, "r1\tA\t\tB").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MalformedLine { ref reason, .. } if reason.contains("field 2")
        ));
    }

    #[test]
    fn encoded_item_pads_beyond_arity() {
        let item = Fact::new(1, vec![1, 2]).encode(3).unwrap();
        assert_eq!(item.as_slice(), &[1, 1, 2, 0, 0, 2]);
        assert_eq!(item.width(), 6);
        assert_eq!(item.max_arity(), 3);
        assert_eq!(item.arity(), 2);
        assert_eq!(item.label(), 0);
        assert_eq!(item.fact(), Fact::new(1, vec![1, 2]));
    }

    #[test]
    fn encoded_item_rejects_arity_beyond_width() {
        let err = Fact::new(1, vec![1, 2, 3]).encode(2).unwrap_err();
        assert!(matches!(err, DatasetError::Capacity { len: 3, max: 2, .. }));
    }

    #[test]
    fn canonical_clears_label_only() {
        let mut item = Fact::new(2, vec![1, 2, 3]).encode(3).unwrap();
        item.set_label(POSITIVE_LABEL);
        item.set_entity(1, 9);
        let canonical = item.canonical();
        assert_eq!(canonical.label(), 0);
        assert_eq!(canonical.entities(), &[1, 9, 3]);
    }

    #[test]
    fn split_facts_track_each_split() {
        let mut facts = SplitFacts::default();
        facts.push(SplitLabel::Train, Fact::new(1, vec![1]));
        facts.push(SplitLabel::Test, Fact::new(1, vec![2]));
        facts.push(SplitLabel::Test, Fact::new(1, vec![3]));
        assert_eq!(facts.len(SplitLabel::Train), 1);
        assert_eq!(facts.len(SplitLabel::Validation), 0);
        assert_eq!(facts.len(SplitLabel::Test), 2);
        assert_eq!(facts.total(), 3);
        assert_eq!(Fact::new(1, vec![2]).to_tuple(), vec![1, 2]);
    }
}
