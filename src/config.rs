//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/proctree/proctree.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `PROCTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{fields, Evaluation, IdGenerator, Properties, SequentialIds, UuidIds};

/// How new node ids are minted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Random v4 UUIDs
    #[default]
    Uuid,
    /// Counter starting at 1; reproducible output
    Sequential,
}

impl IdScheme {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            IdScheme::Uuid => Box::new(UuidIds),
            IdScheme::Sequential => Box::new(SequentialIds::new()),
        }
    }
}

impl std::str::FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uuid" => Ok(IdScheme::Uuid),
            "sequential" => Ok(IdScheme::Sequential),
            other => Err(format!("unknown id scheme: {other}")),
        }
    }
}

/// Default field maps used to seed the root, new children and new evaluations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Templates {
    pub root_properties: Properties,
    pub root_evaluations: Vec<Evaluation>,
    pub child_properties: Properties,
    pub evaluation: Evaluation,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            root_properties: fields([("test", "property")]),
            root_evaluations: vec![fields([("test", "evaluation")])],
            child_properties: fields([
                ("text", "default"),
                ("test", "content"),
                ("complex", "patterns"),
            ]),
            evaluation: fields([("evaluation", "template"), ("test", "points")]),
        }
    }
}

/// Raw templates for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTemplates {
    pub root_properties: Option<Properties>,
    pub root_evaluations: Option<Vec<Evaluation>>,
    pub child_properties: Option<Properties>,
    pub evaluation: Option<Evaluation>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub ids: Option<IdScheme>,
    pub short_id_len: Option<usize>,
    pub templates: RawTemplates,
}

impl Templates {
    /// Overlay whichever templates `raw` specifies; a template map is
    /// replaced as a whole, never merged key by key.
    fn merge(&self, raw: &RawTemplates) -> Self {
        Self {
            root_properties: raw
                .root_properties
                .clone()
                .unwrap_or_else(|| self.root_properties.clone()),
            root_evaluations: raw
                .root_evaluations
                .clone()
                .unwrap_or_else(|| self.root_evaluations.clone()),
            child_properties: raw
                .child_properties
                .clone()
                .unwrap_or_else(|| self.child_properties.clone()),
            evaluation: raw
                .evaluation
                .clone()
                .unwrap_or_else(|| self.evaluation.clone()),
        }
    }
}

/// Unified configuration for proctree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Id scheme for new nodes (default: uuid)
    pub ids: IdScheme,
    /// Hex digits shown when abbreviating ids (default: 8)
    pub short_id_len: usize,
    /// Field templates
    pub templates: Templates,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ids: IdScheme::default(),
            short_id_len: 8,
            templates: Templates::default(),
        }
    }
}

/// Get the XDG config directory for proctree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "proctree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("proctree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay a parsed file: scalars win if present, templates per map.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            ids: overlay.ids.unwrap_or(self.ids),
            short_id_len: overlay.short_id_len.unwrap_or(self.short_id_len),
            templates: self.templates.merge(&overlay.templates),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file, must exist if given
    pub fn load(config_file: Option<&Path>) -> ApplicationResult<Self> {
        Self::load_from(global_config_path().as_deref(), config_file, None)
    }

    /// Layered loading with every source injectable.
    ///
    /// A missing global file is skipped; a missing explicit file is an error.
    /// `env` replaces the process environment when given.
    pub fn load_from(
        global: Option<&Path>,
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> ApplicationResult<Self> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            debug!("loading config file: {}", path.display());
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current, env)?;

        if current.short_id_len == 0 {
            return Err(ApplicationError::Config {
                message: "short_id_len must be at least 1".into(),
            });
        }

        Ok(current)
    }

    /// Apply PROCTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(
        mut settings: Self,
        env: Option<Map<String, String>>,
    ) -> ApplicationResult<Self> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("PROCTREE")
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("ids") {
            settings.ids = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_string("short_id_len") {
            settings.short_id_len = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("PROCTREE_SHORT_ID_LEN: {e}"),
            })?;
        }

        Ok(settings)
    }

    /// Render settings as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}
