use crate::data::Fact;

/// Rows one training epoch produces: `sum(1 + r * arity)`.
pub fn train_rows_per_epoch(facts: &[Fact], negative_ratio: usize) -> u128 {
    facts
        .iter()
        .map(|fact| 1 + (negative_ratio as u128) * fact.arity() as u128)
        .sum()
}

/// Rows raw-mode evaluation produces: `sum(arity * n)`.
///
/// Each slot group holds the positive plus `n - 1` substitutions. Filtered
/// evaluation never exceeds this.
pub fn raw_eval_rows(facts: &[Fact], entity_count: usize) -> u128 {
    facts
        .iter()
        .map(|fact| fact.arity() as u128 * entity_count as u128)
        .sum()
}

/// Render `value` with thousands separators.
pub fn format_u128_with_commas(value: u128) -> String {
    let raw = value.to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    grouped_reversed.chars().rev().collect()
}
