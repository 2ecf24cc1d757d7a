use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use typed_i18n_codegen::{GenerateError, Generator};

use crate::config::load_config_or_default;
use crate::error::CliError;

#[derive(Debug, Error)]
pub enum GenerateCommandError {
    #[error("config error: {0}")]
    Config(#[from] CliError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("no declaration paths given and none configured")]
    NoDeclarations,
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub declarations: Vec<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub source_file: Option<String>,
    pub config_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub interfaces: usize,
    pub bundles: usize,
    pub warnings: usize,
    pub written: Vec<PathBuf>,
}

pub fn run_generate(options: &GenerateOptions) -> Result<GenerateSummary, GenerateCommandError> {
    let config = load_config_or_default(&options.config_path)?;
    let declarations = if options.declarations.is_empty() {
        config.codegen.declarations
    } else {
        options.declarations.clone()
    };
    if declarations.is_empty() {
        return Err(GenerateCommandError::NoDeclarations);
    }

    let mut generator = Generator::new();
    for path in declarations {
        generator = if path.is_dir() {
            generator.declaration_dir(path)
        } else {
            generator.declaration_file(path)
        };
    }
    let output = generator.generate()?;

    let out_dir = options
        .out_dir
        .clone()
        .unwrap_or(config.codegen.out_dir);
    let source_file = options
        .source_file
        .clone()
        .unwrap_or(config.codegen.source_file);
    let written = output.write_to(&out_dir, &source_file)?;
    info!(
        out_dir = %out_dir.display(),
        interfaces = output.interfaces.len(),
        changed = written.len(),
        "generate finished"
    );
    Ok(GenerateSummary {
        interfaces: output.interfaces.len(),
        bundles: output.bundles.len(),
        warnings: output.warnings.len(),
        written,
    })
}
