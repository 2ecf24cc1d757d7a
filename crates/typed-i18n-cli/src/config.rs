use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use typed_i18n_runtime::RuntimeConfig;

use crate::error::CliError;

pub const DEFAULT_CONFIG: &str = "typed-i18n.toml";

/// Contents of `typed-i18n.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub codegen: CodegenConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    /// Declaration files or directories searched for `*.i18n.toml`.
    pub declarations: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub source_file: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            declarations: vec![PathBuf::from("i18n")],
            out_dir: PathBuf::from("src/generated"),
            source_file: "messages.rs".to_string(),
        }
    }
}

impl CliConfig {
    fn resolve_paths(&mut self, base: &Path) {
        for path in &mut self.codegen.declarations {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if self.codegen.out_dir.is_relative() {
            self.codegen.out_dir = base.join(&self.codegen.out_dir);
        }
        self.runtime.resolve_paths(base);
    }
}

/// Reads `path`; relative paths inside are taken relative to its directory.
pub fn load_config(path: &Path) -> Result<CliConfig, CliError> {
    let contents = fs::read_to_string(path)?;
    let mut config: CliConfig = toml::from_str(&contents)?;
    if let Some(parent) = path.parent() {
        config.resolve_paths(parent);
    }
    Ok(config)
}

pub fn load_config_or_default(path: &Path) -> Result<CliConfig, CliError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(CliConfig::default())
    }
}
