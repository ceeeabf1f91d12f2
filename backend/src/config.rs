//! Pipeline configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file,
//! then `SOUL_SALES_*` environment variables (a `.env` file is honoured),
//! then command-line flags applied by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable overriding the target product.
pub const ENV_PRODUCT: &str = "SOUL_SALES_PRODUCT";
/// Environment variable overriding the output location.
pub const ENV_OUTPUT: &str = "SOUL_SALES_OUTPUT";
/// Environment variable overriding the source list (comma separated).
pub const ENV_SOURCES: &str = "SOUL_SALES_SOURCES";

const DEFAULT_SOURCES: [&str; 3] = [
    "data/daily_sales_data_0.csv",
    "data/daily_sales_data_1.csv",
    "data/daily_sales_data_2.csv",
];
const DEFAULT_OUTPUT: &str = "data/formatted_output.csv";
const DEFAULT_PRODUCT: &str = "pink morsel";
const DEFAULT_CURRENCY: &str = "$";

/// Configuration for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source tables, read in this order
    pub sources: Vec<PathBuf>,

    /// Where the normalized table is written
    pub output: PathBuf,

    /// Target product, compared case-insensitively
    pub product: String,

    /// Currency prefix stripped from prices
    pub currency_symbol: String,

    /// Source delimiter; auto-detected per source when unset
    pub delimiter: Option<char>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.into_iter().map(PathBuf::from).collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            product: DEFAULT_PRODUCT.to_string(),
            currency_symbol: DEFAULT_CURRENCY.to_string(),
            delimiter: None,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, overlaid with `path` if given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Apply `SOUL_SALES_*` overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(product) = lookup(ENV_PRODUCT) {
            self.product = product;
        }
        if let Some(output) = lookup(ENV_OUTPUT) {
            self.output = PathBuf::from(output);
        }
        if let Some(sources) = lookup(ENV_SOURCES) {
            self.sources = sources
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .collect();
        }
        self
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("no source tables configured".into()));
        }
        if self.product.is_empty() {
            return Err(ConfigError::Invalid("target product name is empty".into()));
        }
        if self.sources.iter().any(|s| same_location(s, &self.output)) {
            return Err(ConfigError::Invalid(format!(
                "output {} is also listed as a source",
                self.output.display()
            )));
        }
        if let Some(d) = self.delimiter {
            if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
                return Err(ConfigError::Invalid(format!("unusable delimiter {:?}", d)));
            }
        }
        Ok(())
    }
}

/// Whether two configured paths name the same file.
///
/// Existing files are compared by canonical path; otherwise both are made
/// absolute and `.`/`..` components are folded away.
fn same_location(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (a.canonicalize(), b.canonicalize()) {
        return a == b;
    }
    lexical_absolute(a) == lexical_absolute(b)
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
