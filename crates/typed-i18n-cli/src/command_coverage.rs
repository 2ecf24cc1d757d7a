use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use typed_i18n_codegen::{GenerateError, Generator, MessageDeclaration};
use typed_i18n_runtime::{
    BundleSource, LanguageTag, RuntimeError, Selector, discover_bundles, parse_pattern,
};

use crate::config::load_config_or_default;
use crate::error::CliError;

#[derive(Debug, Error)]
pub enum CoverageCommandError {
    #[error("config error: {0}")]
    Config(#[from] CliError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CoverageOptions {
    pub declarations: Vec<PathBuf>,
    pub bundle_dir: PathBuf,
    /// Checks every key against this one bundle base name instead of each
    /// interface's own bundle.
    pub base_name: Option<String>,
    pub out_path: Option<PathBuf>,
    pub config_path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CoverageReport {
    pub total_messages: usize,
    pub locales: BTreeMap<String, LocaleCoverage>,
}

#[derive(Debug, Serialize)]
pub struct LocaleCoverage {
    pub present: usize,
    pub missing: usize,
    pub extra: usize,
    pub percent: f64,
    pub missing_keys: Vec<String>,
    /// Placeholders in bundle patterns that no declared argument binds.
    pub unbound_placeholders: Vec<UnboundPlaceholder>,
    pub invalid_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnboundPlaceholder {
    pub key: String,
    pub placeholder: String,
}

/// Compares declared keys with the bundles in `bundle_dir` and writes a JSON
/// report to `out_path`, or returns it for printing when no path is given.
pub fn run_coverage(options: &CoverageOptions) -> Result<CoverageReport, CoverageCommandError> {
    let config = load_config_or_default(&options.config_path)?;
    let declarations = if options.declarations.is_empty() {
        config.codegen.declarations.clone()
    } else {
        options.declarations.clone()
    };
    let mut generator = Generator::new();
    for path in declarations {
        generator = if path.is_dir() {
            generator.declaration_dir(path)
        } else {
            generator.declaration_file(path)
        };
    }
    let output = generator.generate()?;

    let mut expected: BTreeMap<String, Vec<&MessageDeclaration>> = BTreeMap::new();
    for interface in &output.interfaces {
        let base = options
            .base_name
            .clone()
            .unwrap_or_else(|| interface.bundle.clone());
        expected
            .entry(base)
            .or_default()
            .extend(interface.methods.iter());
    }

    let default_locale = LanguageTag::parse(&config.runtime.default_locale)
        .map_err(RuntimeError::from)?
        .normalized()
        .to_string();
    let mut found: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for base in expected.keys() {
        for file in discover_bundles(&options.bundle_dir, base)? {
            let locale = file
                .locale
                .as_ref()
                .map(|tag| tag.normalized().to_string())
                .unwrap_or_else(|| default_locale.clone());
            debug!(path = %file.path.display(), locale = %locale, "reading bundle");
            let entries = BundleSource::file(file.path.clone()).load()?;
            found.entry(locale).or_default().extend(entries);
        }
    }

    let declared: BTreeMap<&str, &MessageDeclaration> = expected
        .values()
        .flatten()
        .map(|declaration| (declaration.key.as_str(), *declaration))
        .collect();
    let total = declared.len();

    let mut locales = BTreeMap::new();
    for (locale, entries) in found {
        locales.insert(locale, locale_coverage(&declared, &entries));
    }
    let report = CoverageReport {
        total_messages: total,
        locales,
    };

    if let Some(out_path) = &options.out_path {
        let file = fs::File::create(out_path)?;
        serde_json::to_writer_pretty(file, &report)?;
        info!(path = %out_path.display(), locales = report.locales.len(), "wrote coverage report");
    }
    Ok(report)
}

fn locale_coverage(
    declared: &BTreeMap<&str, &MessageDeclaration>,
    entries: &BTreeMap<String, String>,
) -> LocaleCoverage {
    let mut missing_keys = Vec::new();
    let mut unbound_placeholders = BTreeSet::new();
    let mut invalid_patterns = Vec::new();
    let mut present = 0usize;

    for (key, declaration) in declared {
        let Some(raw) = entries.get(*key) else {
            missing_keys.push(key.to_string());
            continue;
        };
        present += 1;
        let Ok(pattern) = parse_pattern(raw) else {
            invalid_patterns.push(key.to_string());
            continue;
        };
        for selector in pattern.selectors() {
            let bound = match &selector {
                Selector::Name(name) => declaration
                    .params
                    .iter()
                    .any(|param| &param.binding == name),
                Selector::Index(index) => *index < declaration.params.len(),
            };
            if !bound {
                unbound_placeholders.insert(UnboundPlaceholder {
                    key: key.to_string(),
                    placeholder: selector.token(),
                });
            }
        }
    }

    let extra = entries
        .keys()
        .filter(|key| !declared.contains_key(key.as_str()))
        .count();
    let total = declared.len();
    let percent = if total == 0 {
        100.0
    } else {
        (present as f64 / total as f64) * 100.0
    };
    LocaleCoverage {
        present,
        missing: missing_keys.len(),
        extra,
        percent,
        missing_keys,
        unbound_placeholders: unbound_placeholders.into_iter().collect(),
        invalid_patterns,
    }
}
