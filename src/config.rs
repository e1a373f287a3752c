//! Run configuration.
//!
//! Loaded from a YAML file which is created with defaults on first run.
//! Everything here is fixed for the duration of a run; nothing is
//! runtime-dynamic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_MIN_POSITIVE_RATING: f32 = 4.0;
const DEFAULT_NUM_RECS: usize = 10;
const DEFAULT_CONFIG_PATH: &str = "cbrec.yaml";

/// Output filename suffix when the description field is disabled.
const NO_DESCR_TAG: &str = "_no_descr";
/// Output filename suffix when only the description field is enabled.
const DESCR_ONLY_TAG: &str = "_descr_only";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one of use_tags and use_descr must be enabled")]
    NoTextFields,

    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),
}

/// Which embedding backend supplies token vectors. Closed set, selected
/// once per run; there is no fallback between backends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Static word-vector file in word2vec/GloVe text format.
    WordTable { path: PathBuf },
    /// Local fastembed sentence model.
    SentenceModel { model: String, cache_dir: PathBuf },
}

/// Which item text fields feed the content build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub tags: bool,
    pub descr: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Minimum rating for an item to count toward a user's profile.
    #[serde(default = "default_min_positive_rating")]
    pub min_positive_rating: f32,

    /// Number of recommendations emitted per user.
    #[serde(default = "default_num_recs")]
    pub num_recs: usize,

    /// Use the item tags/genres field.
    #[serde(default = "default_use_tags")]
    pub use_tags: bool,

    /// Use the item description field.
    #[serde(default)]
    pub use_descr: bool,

    #[serde(default = "default_ratings_path")]
    pub ratings: PathBuf,

    #[serde(default = "default_catalog_path")]
    pub catalog: PathBuf,

    #[serde(default = "default_tags_path")]
    pub tags: PathBuf,

    #[serde(default = "default_descr_path")]
    pub descriptions: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base name of the output file; the field-selection tag is appended.
    #[serde(default = "default_output_name")]
    pub output_name: String,

    #[serde(default = "default_backend")]
    pub backend: EmbeddingBackend,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            min_positive_rating: default_min_positive_rating(),
            num_recs: default_num_recs(),
            use_tags: default_use_tags(),
            use_descr: false,
            ratings: default_ratings_path(),
            catalog: default_catalog_path(),
            tags: default_tags_path(),
            descriptions: default_descr_path(),
            output_dir: default_output_dir(),
            output_name: default_output_name(),
            backend: default_backend(),
        }
    }
}

fn default_min_positive_rating() -> f32 {
    DEFAULT_MIN_POSITIVE_RATING
}

fn default_num_recs() -> usize {
    DEFAULT_NUM_RECS
}

fn default_use_tags() -> bool {
    true
}

fn default_ratings_path() -> PathBuf {
    PathBuf::from("datasets/ratings.csv")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("datasets/items.csv")
}

fn default_tags_path() -> PathBuf {
    PathBuf::from("datasets/items-tags.csv")
}

fn default_descr_path() -> PathBuf {
    PathBuf::from("datasets/items-descr.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("recs")
}

fn default_output_name() -> String {
    "word-table".to_string()
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::WordTable {
        path: PathBuf::from("datasets/word-vectors.vec"),
    }
}

impl RecommendConfig {
    /// The enabled text fields.
    ///
    /// Errors when neither field is enabled, the one fatal configuration
    /// state, checked before any item is processed.
    pub fn fields(&self) -> Result<FieldSelection, ConfigError> {
        if !self.use_tags && !self.use_descr {
            return Err(ConfigError::NoTextFields);
        }
        Ok(FieldSelection {
            tags: self.use_tags,
            descr: self.use_descr,
        })
    }

    /// Filename suffix encoding the field selection.
    pub fn field_tag(&self) -> &'static str {
        if !self.use_descr {
            NO_DESCR_TAG
        } else if !self.use_tags {
            DESCR_ONLY_TAG
        } else {
            ""
        }
    }

    /// Full path of the output recommendations file.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.csv", self.output_name, self.field_tag()))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recommend: RecommendConfig,
}

impl Config {
    /// Load the config file, creating it with defaults when missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            log::info!("creating default config at {}", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_yml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(self)?;
        std::fs::write(path, config_str).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
