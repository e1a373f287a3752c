//! Static word-vector table backend.
//!
//! Reads a word2vec/GloVe text-format file: an optional `count dims` header
//! line followed by one `token v1 v2 ... vN` row per line. The whole table
//! is loaded into memory at startup; lookups are map probes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{VectorSpace, VectorSpaceError};

pub struct WordTableSpace {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl WordTableSpace {
    /// Load a vector table from a text-format file.
    ///
    /// Fails on unreadable files, malformed rows, or rows whose
    /// dimensionality disagrees with the rest of the table.
    pub fn load(path: &Path) -> Result<Self, VectorSpaceError> {
        let file = File::open(path).map_err(|source| VectorSpaceError::TableIo {
            path: path.display().to_string(),
            source,
        })?;
        let reader = BufReader::new(file);

        let mut vectors: HashMap<String, Vec<f32>> = HashMap::new();
        let mut dimensions = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| VectorSpaceError::TableIo {
                path: path.display().to_string(),
                source,
            })?;
            let line_no = idx + 1;

            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let token = parts
                .next()
                .ok_or_else(|| VectorSpaceError::TableParse {
                    line: line_no,
                    reason: "missing token".to_string(),
                })?
                .to_string();
            let rest: Vec<&str> = parts.collect();

            // word2vec files start with a "vocab_size dims" header line
            if idx == 0 && rest.len() == 1 && token.parse::<usize>().is_ok() {
                if let Ok(declared) = rest[0].parse::<usize>() {
                    dimensions = declared;
                    continue;
                }
            }

            if rest.is_empty() {
                return Err(VectorSpaceError::TableParse {
                    line: line_no,
                    reason: format!("no vector components after token '{token}'"),
                });
            }

            let values = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|err| VectorSpaceError::TableParse {
                    line: line_no,
                    reason: format!("bad float: {err}"),
                })?;

            if dimensions == 0 {
                dimensions = values.len();
            } else if values.len() != dimensions {
                return Err(VectorSpaceError::DimensionMismatch {
                    line: line_no,
                    expected: dimensions,
                    got: values.len(),
                });
            }

            vectors.insert(token, values);
        }

        if vectors.is_empty() {
            return Err(VectorSpaceError::InitFailed(format!(
                "vector table {} contains no vectors",
                path.display()
            )));
        }

        log::info!(
            "loaded {} word vectors ({dimensions} dims) from {}",
            vectors.len(),
            path.display()
        );

        Ok(Self {
            vectors,
            dimensions,
        })
    }

    /// Build a table directly from (token, vector) pairs.
    pub fn from_entries(
        dimensions: usize,
        entries: impl IntoIterator<Item = (String, Vec<f32>)>,
    ) -> Self {
        Self {
            vectors: entries.into_iter().collect(),
            dimensions,
        }
    }

    /// Number of tokens in the table.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl VectorSpace for WordTableSpace {
    fn vector_of(&self, token: &str) -> Result<Option<Vec<f32>>, VectorSpaceError> {
        Ok(self.vectors.get(token).cloned())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_glove_format() {
        let file = write_table("king 0.5 0.25 -1.0\nqueen 0.4 0.3 -0.9\n");
        let space = WordTableSpace::load(file.path()).unwrap();

        assert_eq!(space.len(), 2);
        assert_eq!(space.dimensions(), 3);
        assert_eq!(
            space.vector_of("king").unwrap(),
            Some(vec![0.5, 0.25, -1.0])
        );
    }

    #[test]
    fn test_load_word2vec_header() {
        let file = write_table("2 3\nking 0.5 0.25 -1.0\nqueen 0.4 0.3 -0.9\n");
        let space = WordTableSpace::load(file.path()).unwrap();

        assert_eq!(space.len(), 2);
        assert_eq!(space.dimensions(), 3);
    }

    #[test]
    fn test_unknown_token_is_absent_not_error() {
        let file = write_table("king 0.5 0.25 -1.0\n");
        let space = WordTableSpace::load(file.path()).unwrap();

        assert_eq!(space.vector_of("jester").unwrap(), None);
    }

    #[test]
    fn test_malformed_float_is_fatal() {
        let file = write_table("king 0.5 oops -1.0\n");
        let result = WordTableSpace::load(file.path());
        assert!(matches!(
            result,
            Err(VectorSpaceError::TableParse { line: 1, .. })
        ));
    }

    #[test]
    fn test_inconsistent_dimensions_are_fatal() {
        let file = write_table("king 0.5 0.25 -1.0\nqueen 0.4 0.3\n");
        let result = WordTableSpace::load(file.path());
        assert!(matches!(
            result,
            Err(VectorSpaceError::DimensionMismatch {
                line: 2,
                expected: 3,
                got: 2,
            })
        ));
    }

    #[test]
    fn test_header_dimensions_bind_the_table() {
        let file = write_table("1 4\nking 0.5 0.25 -1.0\n");
        let result = WordTableSpace::load(file.path());
        assert!(matches!(
            result,
            Err(VectorSpaceError::DimensionMismatch {
                line: 2,
                expected: 4,
                got: 3,
            })
        ));
    }

    #[test]
    fn test_empty_table_is_fatal() {
        let file = write_table("");
        let result = WordTableSpace::load(file.path());
        assert!(matches!(result, Err(VectorSpaceError::InitFailed(_))));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = WordTableSpace::load(Path::new("/nonexistent/vectors.vec"));
        assert!(matches!(result, Err(VectorSpaceError::TableIo { .. })));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let file = write_table("king 1.0 0.0\n\nqueen 0.0 1.0\n");
        let space = WordTableSpace::load(file.path()).unwrap();
        assert_eq!(space.len(), 2);
    }
}
