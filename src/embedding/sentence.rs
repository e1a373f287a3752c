//! Sentence-model backend over fastembed.
//!
//! Embeds one token per lookup through a locally cached fastembed model.
//! Sub-word tokenization means any token produces a vector, so this backend
//! never reports out-of-vocabulary; repeated lookups hit an in-memory memo
//! cache instead of the model.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{InitOptions, TextEmbedding};

use super::{VectorSpace, VectorSpaceError};

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct SentenceModelSpace {
    model: Mutex<TextEmbedding>,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    model_name: String,
    dimensions: usize,
}

impl SentenceModelSpace {
    /// Create a sentence-model space with the given model name.
    ///
    /// The model is downloaded on first use and cached in the `models/`
    /// subdirectory of `cache_dir`.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self, VectorSpaceError> {
        let model_enum = Self::parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            VectorSpaceError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| VectorSpaceError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            cache: Mutex::new(HashMap::new()),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Get the model name.
    pub fn name(&self) -> &str {
        &self.model_name
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, VectorSpaceError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" | "allminiml6v2q" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q),
            "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
            "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15Q)
            }
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-base-en-v1.5-q" | "bgebaseenv15q" => Ok(fastembed::EmbeddingModel::BGEBaseENV15Q),
            _ => Err(VectorSpaceError::InvalidModel(format!(
                "Unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
                name
            ))),
        }
    }

    /// Probe the model to determine embedding dimensions.
    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, VectorSpaceError> {
        let test_embeddings = model.embed(vec!["test"], None).map_err(|e| {
            VectorSpaceError::InitFailed(format!("Failed to probe dimensions: {}", e))
        })?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| VectorSpaceError::InitFailed("Model returned no embedding".to_string()))
    }
}

impl VectorSpace for SentenceModelSpace {
    fn vector_of(&self, token: &str) -> Result<Option<Vec<f32>>, VectorSpaceError> {
        {
            let cache = self.cache.lock().map_err(|e| {
                VectorSpaceError::LookupFailed(format!("Failed to acquire cache lock: {}", e))
            })?;
            if let Some(vector) = cache.get(token) {
                return Ok(Some(vector.clone()));
            }
        }

        let mut model = self.model.lock().map_err(|e| {
            VectorSpaceError::LookupFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![token], None)
            .map_err(|e| VectorSpaceError::LookupFailed(e.to_string()))?;

        let vector = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VectorSpaceError::LookupFailed("No embedding returned".to_string()))?;

        self.cache
            .lock()
            .map_err(|e| {
                VectorSpaceError::LookupFailed(format!("Failed to acquire cache lock: {}", e))
            })?
            .insert(token.to_string(), vector.clone());

        Ok(Some(vector))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
