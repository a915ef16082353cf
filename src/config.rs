/// Configuration module for lexgraph.
///
/// Pipeline settings come from an optional JSON file with per-field defaults.
/// Store connection settings come from the process environment and are
/// resolved before any input file is read.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::pipeline::builder::IdScheme;

// ── Environment keys ─────────────────────────────────────────────────

pub const ENV_STORE_URI: &str = "LEXGRAPH_STORE_URI";
pub const ENV_STORE_USER: &str = "LEXGRAPH_STORE_USER";
pub const ENV_STORE_PASSWORD: &str = "LEXGRAPH_STORE_PASSWORD";

// ── Default value functions ──────────────────────────────────────────

fn default_freq_path() -> PathBuf {
    PathBuf::from("InterCorp_v16ud_100k.csv")
}

fn default_words_path() -> PathBuf {
    PathBuf::from("any_corp_AND_any_dict.tsv")
}

fn default_chars_lang() -> String {
    "zh".to_string()
}

fn default_text_id_lang() -> String {
    "zh".to_string()
}

fn default_chars_batch_size() -> usize {
    2000
}

fn default_lexicon_path() -> PathBuf {
    PathBuf::from("derinet-2-3.tsv")
}

fn default_lexicon_lang() -> String {
    "cs".to_string()
}

fn default_lexicon_batch_size() -> usize {
    5000
}

fn default_top_k() -> usize {
    75_000
}

fn default_progress_every() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub chars: CharsConfig,

    #[serde(default)]
    pub lexicon: LexiconConfig,

    /// Emit a progress line every this many built words.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    #[serde(default = "default_true")]
    pub create_constraints: bool,
}

/// Character-decomposition source: frequency table plus target word list.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CharsConfig {
    #[serde(default = "default_freq_path")]
    pub freq_path: PathBuf,

    #[serde(default = "default_words_path")]
    pub words_path: PathBuf,

    #[serde(default = "default_chars_lang")]
    pub lang: String,

    /// Language whose character ids are the bare text. Any other `lang`
    /// gets `lang:text` ids so runs in different languages never share units.
    #[serde(default = "default_text_id_lang")]
    pub text_id_lang: String,

    #[serde(default = "default_chars_batch_size")]
    pub batch_size: usize,
}

/// Segmented derivational lexicon source.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LexiconConfig {
    #[serde(default = "default_lexicon_path")]
    pub data_path: PathBuf,

    #[serde(default = "default_lexicon_lang")]
    pub lang: String,

    #[serde(default = "default_lexicon_batch_size")]
    pub batch_size: usize,

    /// Retention size: how many lexemes survive pruning.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            chars: CharsConfig::default(),
            lexicon: LexiconConfig::default(),
            progress_every: default_progress_every(),
            create_constraints: default_true(),
        }
    }
}

impl Default for CharsConfig {
    fn default() -> Self {
        Self {
            freq_path: default_freq_path(),
            words_path: default_words_path(),
            lang: default_chars_lang(),
            text_id_lang: default_text_id_lang(),
            batch_size: default_chars_batch_size(),
        }
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            data_path: default_lexicon_path(),
            lang: default_lexicon_lang(),
            batch_size: default_lexicon_batch_size(),
            top_k: default_top_k(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl CharsConfig {
    /// Unit id scheme for this run's characters.
    pub fn id_scheme(&self) -> IdScheme {
        if self.lang == self.text_id_lang {
            IdScheme::Text
        } else {
            IdScheme::TextWithLanguage
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults; an invalid one is an error.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("{} not found, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        let cfg: Config = serde_json::from_str(&data)
            .with_context(|| format!("invalid JSON in {}", config_path.display()))?;

        info!("Loaded configuration from {}", config_path.display());
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chars.batch_size > 0, "chars.batch_size must be positive");
        anyhow::ensure!(
            self.lexicon.batch_size > 0,
            "lexicon.batch_size must be positive"
        );
        anyhow::ensure!(self.lexicon.top_k > 0, "lexicon.top_k must be positive");
        anyhow::ensure!(self.progress_every > 0, "progress_every must be positive");
        anyhow::ensure!(!self.chars.lang.is_empty(), "chars.lang must not be empty");
        anyhow::ensure!(
            !self.lexicon.lang.is_empty(),
            "lexicon.lang must not be empty"
        );
        Ok(())
    }
}

// ── Store connection settings ────────────────────────────────────────

/// Where and as whom to connect to the graph store.
///
/// `user` and `password` are accepted for backends that authenticate; the
/// embedded SQLite store has no accounts and only reports the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl StoreConfig {
    /// Resolve the store settings through `lookup` (one call per key).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let uri = non_blank(ENV_STORE_URI).ok_or_else(|| {
            PipelineError::Configuration(format!("please set {ENV_STORE_URI}"))
        })?;
        let user = non_blank(ENV_STORE_USER);
        let password = non_blank(ENV_STORE_PASSWORD);

        if password.is_some() && user.is_none() {
            return Err(PipelineError::Configuration(format!(
                "{ENV_STORE_PASSWORD} is set but {ENV_STORE_USER} is not"
            )));
        }
        if user.is_some() && password.is_none() {
            warn!("{ENV_STORE_USER} is set without {ENV_STORE_PASSWORD}");
        }

        Ok(Self {
            uri: uri.trim().to_string(),
            user,
            password,
        })
    }

    /// Filesystem path of the embedded store, or `None` for an in-memory one.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        let location = self.uri.strip_prefix("sqlite://").unwrap_or(&self.uri);
        match location {
            ":memory:" | "sqlite::memory:" => None,
            path => Some(PathBuf::from(path)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
