use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub use crate::constants::splits::ALL_SPLITS;
use crate::constants::files::SPLIT_FILE_EXTENSION;

/// Logical dataset partitions, one file each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitLabel {
    /// Training split (`train.txt`); the only split feeding the incidence index.
    Train,
    /// Validation split (`valid.txt`).
    Validation,
    /// Test split (`test.txt`).
    Test,
}

impl SplitLabel {
    /// File stem used on disk for this split.
    pub const fn file_stem(self) -> &'static str {
        match self {
            SplitLabel::Train => "train",
            SplitLabel::Validation => "valid",
            SplitLabel::Test => "test",
        }
    }
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Resolved paths of the three split files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitFiles {
    /// Path of `train.txt`.
    pub train: PathBuf,
    /// Path of `valid.txt`.
    pub validation: PathBuf,
    /// Path of `test.txt`.
    pub test: PathBuf,
}

impl SplitFiles {
    /// Resolve `train.txt`, `valid.txt`, and `test.txt` under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let file = |label: SplitLabel| {
            dir.join(format!("{}.{}", label.file_stem(), SPLIT_FILE_EXTENSION))
        };
        Self {
            train: file(SplitLabel::Train),
            validation: file(SplitLabel::Validation),
            test: file(SplitLabel::Test),
        }
    }

    /// Path for one split.
    pub fn path(&self, label: SplitLabel) -> &Path {
        match label {
            SplitLabel::Train => &self.train,
            SplitLabel::Validation => &self.validation,
            SplitLabel::Test => &self.test,
        }
    }

    /// Splits paired with their paths in canonical read order.
    pub fn iter(&self) -> impl Iterator<Item = (SplitLabel, &Path)> {
        ALL_SPLITS.into_iter().map(move |label| (label, self.path(label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_resolve_in_canonical_order() {
        let files = SplitFiles::in_dir("/data/jf17k");
        let resolved: Vec<(SplitLabel, PathBuf)> = files
            .iter()
            .map(|(label, path)| (label, path.to_path_buf()))
            .collect();
        assert_eq!(
            resolved,
            vec![
                (SplitLabel::Train, PathBuf::from("/data/jf17k/train.txt")),
                (SplitLabel::Validation, PathBuf::from("/data/jf17k/valid.txt")),
                (SplitLabel::Test, PathBuf::from("/data/jf17k/test.txt")),
            ]
        );
    }

    #[test]
    fn labels_display_as_file_stems() {
        assert_eq!(SplitLabel::Validation.to_string(), "valid");
    }
}
