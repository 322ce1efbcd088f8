/// Dense id assigned to an entity token (`0` is the padding sentinel).
/// Example: `3` for the third distinct entity seen across `train.txt`, `valid.txt`, `test.txt`
pub type EntityId = u32;
/// Dense id assigned to a relation token (`0` is the padding sentinel).
/// Example: `1` for the first relation seen in `train.txt`
pub type RelationId = u32;
/// Raw vocabulary token exactly as it appears in a split file.
/// Examples: `/m/02mjmr`, `people.person.nationality`
pub type Token = String;
/// Number of entities a fact relates.
/// Example: `3` for `r2\tA\tB\tC`
pub type Arity = usize;
/// Number of candidate rows belonging to one (example, entity slot) group.
/// Example: `4` for a positive plus three surviving filtered candidates
pub type GroupLen = usize;
/// One-based source line number used in parse diagnostics.
pub type LineNumber = usize;
