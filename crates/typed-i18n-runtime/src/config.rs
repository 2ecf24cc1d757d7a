use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RuntimeResult;

/// Runtime settings, usually the `[runtime]` table of `typed-i18n.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub default_locale: String,
    pub bundle_dir: Option<PathBuf>,
    pub base_name: String,
    /// Child locale to parent locale.
    pub fallbacks: BTreeMap<String, String>,
    pub truncation_fallbacks: bool,
    pub cache_capacity: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            bundle_dir: None,
            base_name: "messages".to_string(),
            fallbacks: BTreeMap::new(),
            truncation_fallbacks: false,
            cache_capacity: None,
        }
    }
}

impl RuntimeConfig {
    /// Makes a relative `bundle_dir` relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(dir) = &self.bundle_dir {
            if dir.is_relative() {
                self.bundle_dir = Some(base.join(dir));
            }
        }
    }
}

pub fn load_config(path: &Path) -> RuntimeResult<RuntimeConfig> {
    let contents = fs::read_to_string(path)?;
    let mut config: RuntimeConfig = toml::from_str(&contents)?;
    if let Some(parent) = path.parent() {
        config.resolve_paths(parent);
    }
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> RuntimeResult<RuntimeConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(RuntimeConfig::default())
    }
}
