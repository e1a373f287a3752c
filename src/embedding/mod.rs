//! Embedding lookup backends for item content vectors.
//!
//! Every backend answers a single question: "what is the vector for this
//! token?" The rest of the pipeline only sees the [`VectorSpace`] trait and
//! never branches on which backend is active.
//!
//! - `word_table`: a static word-vector file (word2vec/GloVe text format)
//!   loaded fully into memory. Unknown tokens are out of vocabulary.
//! - `sentence`: a local fastembed model with a per-token cache. Sub-word
//!   tokenization means every token resolves.
//!
//! The backend is selected once per run from the configuration; there is no
//! fallback from one backend to another.

mod sentence;
mod word_table;

pub use sentence::SentenceModelSpace;
pub use word_table::WordTableSpace;

use crate::config::EmbeddingBackend;

/// Errors from embedding backends.
///
/// Out-of-vocabulary tokens are *not* errors; `vector_of` returns
/// `Ok(None)` for those. Everything here is a genuine failure and aborts
/// the run.
#[derive(Debug, thiserror::Error)]
pub enum VectorSpaceError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    #[error("Failed to read vector table {path}: {source}")]
    TableIo {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed vector table at line {line}: {reason}")]
    TableParse { line: usize, reason: String },

    #[error("Dimension mismatch at line {line}: expected {expected}, got {got}")]
    DimensionMismatch {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("Embedding lookup failed: {0}")]
    LookupFailed(String),
}

/// A token-to-vector lookup with a fixed output dimensionality.
pub trait VectorSpace: Send + Sync {
    /// Look up the vector for a single token.
    ///
    /// Returns `Ok(None)` when the token is out of vocabulary. Any `Err`
    /// is a backend failure (I/O, poisoned state) and must propagate.
    fn vector_of(&self, token: &str) -> Result<Option<Vec<f32>>, VectorSpaceError>;

    /// Dimensionality of every vector this space produces.
    fn dimensions(&self) -> usize;
}

/// Open the backend named by the configuration.
///
/// Loading happens eagerly: a missing table file or a failed model download
/// aborts the run before any item is processed.
pub fn open_backend(backend: &EmbeddingBackend) -> Result<Box<dyn VectorSpace>, VectorSpaceError> {
    match backend {
        EmbeddingBackend::WordTable { path } => Ok(Box::new(WordTableSpace::load(path)?)),
        EmbeddingBackend::SentenceModel { model, cache_dir } => Ok(Box::new(
            SentenceModelSpace::new(model, cache_dir.clone())?,
        )),
    }
}

/// Element-wise mean of the resolved token vectors.
///
/// Tokens with no vector are silently dropped. Returns `None` (the empty
/// sentinel) when no token resolved at all; callers treat that as "no
/// embeddable content", which is different from a zero vector.
pub fn centroid(
    tokens: &[String],
    space: &dyn VectorSpace,
) -> Result<Option<Vec<f32>>, VectorSpaceError> {
    let mut sum: Vec<f32> = Vec::new();
    let mut resolved = 0usize;

    for token in tokens {
        let Some(vector) = space.vector_of(token)? else {
            continue;
        };
        if sum.is_empty() {
            sum = vector;
        } else {
            for (acc, value) in sum.iter_mut().zip(vector.iter()) {
                *acc += value;
            }
        }
        resolved += 1;
    }

    if resolved == 0 {
        return Ok(None);
    }

    let count = resolved as f32;
    for value in sum.iter_mut() {
        *value /= count;
    }
    Ok(Some(sum))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_word_space() -> WordTableSpace {
        WordTableSpace::from_entries(
            2,
            [
                ("dark".to_string(), vec![1.0, 0.0]),
                ("tower".to_string(), vec![0.0, 1.0]),
            ],
        )
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_centroid_is_mean_of_resolved_vectors() {
        let space = two_word_space();
        let centroid = centroid(&tokens(&["dark", "tower"]), &space).unwrap();
        assert_eq!(centroid, Some(vec![0.5, 0.5]));
    }

    #[test]
    fn test_centroid_drops_unknown_tokens() {
        let space = two_word_space();
        let centroid = centroid(&tokens(&["dark", "zzgibberish", "dark"]), &space).unwrap();
        // only the two "dark" occurrences contribute
        assert_eq!(centroid, Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_centroid_empty_sentinel_when_nothing_resolves() {
        let space = two_word_space();
        let centroid = centroid(&tokens(&["zz", "qq"]), &space).unwrap();
        assert_eq!(centroid, None);
    }

    #[test]
    fn test_centroid_of_empty_sequence() {
        let space = two_word_space();
        assert_eq!(centroid(&[], &space).unwrap(), None);
    }

    #[test]
    fn test_duplicate_tokens_weight_the_mean() {
        let space = two_word_space();
        let centroid = centroid(&tokens(&["dark", "dark", "tower"]), &space)
            .unwrap()
            .unwrap();
        assert!((centroid[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!((centroid[1] - 1.0 / 3.0).abs() < 1e-6);
    }
}
