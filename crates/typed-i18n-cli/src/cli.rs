use std::path::PathBuf;

use thiserror::Error;

use crate::command_coverage::{CoverageCommandError, CoverageOptions, run_coverage};
use crate::command_generate::{GenerateCommandError, GenerateOptions, run_generate};
use crate::command_render::{RenderCommandError, RenderOptions, run_render};
use crate::config::DEFAULT_CONFIG;

#[derive(Debug, Error)]
pub enum CliAppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Generate(#[from] GenerateCommandError),
    #[error(transparent)]
    Coverage(#[from] CoverageCommandError),
    #[error(transparent)]
    Render(#[from] RenderCommandError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn run(args: Vec<String>) -> Result<(), CliAppError> {
    let mut args = args.into_iter();
    let command = args.next().ok_or_else(|| CliAppError::Usage(usage()))?;
    match command.as_str() {
        "generate" => {
            let options = parse_generate_options(args.collect())?;
            let summary = run_generate(&options)?;
            println!(
                "generated {} interface(s), {} bundle(s), {} warning(s); {} file(s) updated",
                summary.interfaces,
                summary.bundles,
                summary.warnings,
                summary.written.len()
            );
            Ok(())
        }
        "coverage" => {
            let options = parse_coverage_options(args.collect())?;
            let report = run_coverage(&options)?;
            if options.out_path.is_none() {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(())
        }
        "render" => {
            let options = parse_render_options(args.collect())?;
            println!("{}", run_render(&options)?);
            Ok(())
        }
        _ => Err(CliAppError::Usage(usage())),
    }
}

fn parse_generate_options(args: Vec<String>) -> Result<GenerateOptions, CliAppError> {
    let mut declarations = Vec::new();
    let mut out_dir = None;
    let mut source_file = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--decl" => declarations.push(PathBuf::from(next_value("--decl", &mut iter)?)),
            "--out" => out_dir = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--source" => source_file = Some(next_value("--source", &mut iter)?),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    Ok(GenerateOptions {
        declarations,
        out_dir,
        source_file,
        config_path,
    })
}

fn parse_coverage_options(args: Vec<String>) -> Result<CoverageOptions, CliAppError> {
    let mut declarations = Vec::new();
    let mut bundle_dir = None;
    let mut base_name = None;
    let mut out_path = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--decl" => declarations.push(PathBuf::from(next_value("--decl", &mut iter)?)),
            "--bundles" => bundle_dir = Some(PathBuf::from(next_value("--bundles", &mut iter)?)),
            "--base" => base_name = Some(next_value("--base", &mut iter)?),
            "--out" => out_path = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    let bundle_dir = bundle_dir.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(CoverageOptions {
        declarations,
        bundle_dir,
        base_name,
        out_path,
        config_path,
    })
}

fn parse_render_options(args: Vec<String>) -> Result<RenderOptions, CliAppError> {
    let mut locale = None;
    let mut key = None;
    let mut values = Vec::new();
    let mut bundle_dir = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--locale" => locale = Some(next_value("--locale", &mut iter)?),
            "--key" => key = Some(next_value("--key", &mut iter)?),
            "--arg" => values.push(next_value("--arg", &mut iter)?),
            "--bundles" => bundle_dir = Some(PathBuf::from(next_value("--bundles", &mut iter)?)),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }
    let locale = locale.ok_or_else(|| CliAppError::Usage(usage()))?;
    let key = key.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(RenderOptions {
        locale,
        key,
        args: values,
        bundle_dir,
        config_path,
    })
}

fn next_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String, CliAppError> {
    iter.next()
        .ok_or_else(|| CliAppError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn usage() -> String {
    "usage: typed-i18n-cli generate [--decl <path>...] [--out <dir>] [--source <file>] [--config <path>]\n       typed-i18n-cli coverage --bundles <dir> [--decl <path>...] [--base <name>] [--out <path>] [--config <path>]\n       typed-i18n-cli render --locale <tag> --key <key> [--arg name=value...] [--bundles <dir>] [--config <path>]".to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        CliAppError, parse_coverage_options, parse_generate_options, parse_render_options, run,
    };
    use std::path::PathBuf;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_repeated_declarations() {
        let options = parse_generate_options(args(&[
            "--decl", "a.i18n.toml", "--decl", "i18n", "--out", "gen",
        ]))
        .expect("options");
        assert_eq!(
            options.declarations,
            vec![PathBuf::from("a.i18n.toml"), PathBuf::from("i18n")]
        );
        assert_eq!(options.out_dir, Some(PathBuf::from("gen")));
        assert_eq!(options.config_path, PathBuf::from("typed-i18n.toml"));
    }

    #[test]
    fn coverage_requires_bundles() {
        let err = parse_coverage_options(args(&["--decl", "i18n"])).expect_err("usage");
        assert!(matches!(err, CliAppError::Usage(_)));
        let options = parse_coverage_options(args(&["--bundles", "b", "--base", "shop"]))
            .expect("options");
        assert_eq!(options.base_name.as_deref(), Some("shop"));
    }

    #[test]
    fn render_collects_arguments() {
        let options = parse_render_options(args(&[
            "--locale", "de", "--key", "k", "--arg", "a=1", "--arg", "b=x",
        ]))
        .expect("options");
        assert_eq!(options.args, vec!["a=1".to_string(), "b=x".to_string()]);
        let err = parse_render_options(args(&["--locale"])).expect_err("missing value");
        assert!(err.to_string().starts_with("--locale requires a value"));
    }

    #[test]
    fn unknown_command_prints_usage() {
        let err = run(args(&["publish"])).expect_err("usage");
        assert!(err.to_string().starts_with("usage: typed-i18n-cli"));
        assert!(matches!(run(Vec::new()), Err(CliAppError::Usage(_))));
    }
}
