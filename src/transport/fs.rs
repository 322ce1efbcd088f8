use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::DatasetError;
use crate::types::LineNumber;

/// Filesystem transport that streams one split file line by line.
pub struct LineStream {
    path: PathBuf,
}

impl LineStream {
    /// Create a stream over the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this stream reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Visit every line with its one-based line number.
    ///
    /// Opening or reading failures are fatal and carry the file path.
    pub fn for_each_line<F>(&self, mut visit: F) -> Result<(), DatasetError>
    where
        F: FnMut(LineNumber, &str) -> Result<(), DatasetError>,
    {
        let file = File::open(&self.path).map_err(|source| DatasetError::Io {
            path: self.path.clone(),
            source,
        })?;
        let reader = BufReader::new(file);
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| DatasetError::Io {
                path: self.path.clone(),
                source,
            })?;
            visit(idx + 1, &line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn visits_lines_with_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.txt");
        fs::write(&path, "r1\tA\tB\nr2\tC\n").unwrap();

        let mut seen = Vec::new();
        LineStream::new(&path)
            .for_each_line(|line_no, line| {
                seen.push((line_no, line.to_string()));
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![(1, "r1\tA\tB".to_string()), (2, "r2\tC".to_string())]
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let err = LineStream::new(&path)
            .for_each_line(|_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, DatasetError::Io { path: ref p, .. } if p == &path));
    }

    #[test]
    fn visitor_errors_stop_the_scan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "a\nb\nc\n").unwrap();
        let mut visited = 0;
        let err = LineStream::new(&path)
            .for_each_line(|_, _| {
                visited += 1;
                if visited == 2 {
                    return Err(DatasetError::EmptyVocabulary);
                }
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyVocabulary));
        assert_eq!(visited, 2);
    }
}
