use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::data::EncodedItem;
use crate::sampler::EvalExample;
use crate::types::{Arity, EntityId, GroupLen, RelationId};

/// Merges per-example outputs into one model-ready batch.
pub trait Collate: Send + Sync {
    /// Per-example input.
    type Example;
    /// Collated output.
    type Batch;

    /// Concatenate `examples` in order and derive the batch columns.
    fn collate(&self, examples: Vec<Self::Example>) -> Self::Batch;
}

/// Dense row-major `rows x cols` float matrix.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl MaskMatrix {
    fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count (`m`).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One row of the mask.
    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// Value at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    /// Row-major values.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.values[row * self.cols..(row + 1) * self.cols]
    }
}

/// Column-wise batch handed to the model.
///
/// Serialized with the short keys the model side expects: `r`, `e`, `l`, `o`, `z`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainBatch {
    /// Relation id per row.
    #[serde(rename = "r")]
    pub relations: Vec<RelationId>,
    /// `m` columns of entity ids, one per slot, zero past each row's arity.
    #[serde(rename = "e")]
    pub entities: Vec<Vec<EntityId>>,
    /// `1` for positives, `0` otherwise.
    #[serde(rename = "l")]
    pub labels: Vec<u32>,
    /// `1.0` in the first `arity` columns of each row.
    #[serde(rename = "o")]
    pub active_mask: MaskMatrix,
    /// Complement of `active_mask`.
    #[serde(rename = "z")]
    pub padding_mask: MaskMatrix,
}

impl TrainBatch {
    /// Build the columns from concatenated rows of width `max_arity + 3`.
    pub fn from_rows(rows: &[EncodedItem], max_arity: Arity) -> Self {
        let count = rows.len();
        let mut relations = Vec::with_capacity(count);
        let mut entities = vec![Vec::with_capacity(count); max_arity];
        let mut labels = Vec::with_capacity(count);
        let mut active_mask = MaskMatrix::filled(count, max_arity, 0.0);
        let mut padding_mask = MaskMatrix::filled(count, max_arity, 1.0);

        for (idx, row) in rows.iter().enumerate() {
            relations.push(row.relation());
            for (slot, column) in entities.iter_mut().enumerate() {
                column.push(row.entities().get(slot).copied().unwrap_or_default());
            }
            labels.push(row.label());
            let arity = row.arity().min(max_arity);
            active_mask.row_mut(idx)[..arity].fill(1.0);
            padding_mask.row_mut(idx)[..arity].fill(0.0);
        }

        Self {
            relations,
            entities,
            labels,
            active_mask,
            padding_mask,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// True when the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

/// Evaluation batch: the train columns plus per-group row counts under `L`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalBatch {
    /// Row columns shared with the train layout.
    #[serde(flatten)]
    pub columns: TrainBatch,
    /// Rows per (example, slot) group, in row order.
    #[serde(rename = "L")]
    pub group_lens: Vec<GroupLen>,
}

impl EvalBatch {
    /// Row ranges of each (example, slot) group; row `start` is the positive.
    pub fn groups(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.group_lens
            .iter()
            .map(|len| {
                let range = start..start + len;
                start += len;
                range
            })
            .collect()
    }

    /// Total rows across all groups.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the batch has no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Collator for `TrainSampler` outputs.
#[derive(Clone, Copy, Debug)]
pub struct TrainCollator {
    max_arity: Arity,
}

impl TrainCollator {
    /// Collator producing `max_arity`-wide masks.
    pub fn new(max_arity: Arity) -> Self {
        Self { max_arity }
    }
}

impl Collate for TrainCollator {
    type Example = Vec<EncodedItem>;
    type Batch = TrainBatch;

    fn collate(&self, examples: Vec<Self::Example>) -> Self::Batch {
        let rows: Vec<EncodedItem> = examples.into_iter().flatten().collect();
        TrainBatch::from_rows(&rows, self.max_arity)
    }
}

/// Collator for `EvalCandidateGenerator` outputs.
#[derive(Clone, Copy, Debug)]
pub struct EvalCollator {
    max_arity: Arity,
}

impl EvalCollator {
    /// Collator producing `max_arity`-wide masks.
    pub fn new(max_arity: Arity) -> Self {
        Self { max_arity }
    }
}

impl Collate for EvalCollator {
    type Example = EvalExample;
    type Batch = EvalBatch;

    fn collate(&self, examples: Vec<Self::Example>) -> Self::Batch {
        let mut rows = Vec::new();
        let mut group_lens = Vec::new();
        for example in examples {
            rows.extend(example.rows);
            group_lens.extend(example.group_lens);
        }
        EvalBatch {
            columns: TrainBatch::from_rows(&rows, self.max_arity),
            group_lens,
        }
    }
}
