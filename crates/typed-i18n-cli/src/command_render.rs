use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use typed_i18n_runtime::{Args, LanguageTag, LocaleRegistry, RuntimeError, Translator, Value};

use crate::config::load_config_or_default;
use crate::error::CliError;

#[derive(Debug, Error)]
pub enum RenderCommandError {
    #[error("config error: {0}")]
    Config(#[from] CliError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("no bundle directory configured; set [runtime] bundle_dir or pass --bundles")]
    NoBundleDir,
    #[error("invalid argument {0:?}, expected name=value")]
    InvalidArgument(String),
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub locale: String,
    pub key: String,
    pub args: Vec<String>,
    pub bundle_dir: Option<PathBuf>,
    pub config_path: PathBuf,
}

/// Renders one message as plain text using the configured runtime.
pub fn run_render(options: &RenderOptions) -> Result<String, RenderCommandError> {
    let mut config = load_config_or_default(&options.config_path)?.runtime;
    if let Some(dir) = &options.bundle_dir {
        config.bundle_dir = Some(dir.clone());
    }
    if config.bundle_dir.is_none() {
        return Err(RenderCommandError::NoBundleDir);
    }

    let registry = LocaleRegistry::from_config(&config)?;
    let mut translator = Translator::new(Arc::new(registry));
    if let Some(capacity) = config.cache_capacity {
        translator = translator.with_cache(capacity);
    }

    let mut args = Args::with_capacity(options.args.len());
    for raw in &options.args {
        let (name, value) = raw
            .split_once('=')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| RenderCommandError::InvalidArgument(raw.clone()))?;
        args.insert(name.trim(), parse_value(value));
    }

    let locale = LanguageTag::parse(&options.locale).map_err(RuntimeError::from)?;
    Ok(translator.render_plain(&options.key, &locale, &args)?)
}

/// Integers, then floats, then booleans; anything else is text.
fn parse_value(raw: &str) -> Value {
    if let Ok(value) = raw.parse::<i64>() {
        return Value::Int(value);
    }
    if let Ok(value) = raw.parse::<f64>() {
        if value.is_finite() {
            return Value::Float(value);
        }
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::Str(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderCommandError, RenderOptions, parse_value, run_render};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};
    use typed_i18n_runtime::{RuntimeError, Value};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("typed_i18n_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("dir");
        path
    }

    fn setup(name: &str) -> PathBuf {
        let root = temp_dir(name);
        fs::create_dir_all(root.join("bundles")).expect("bundles");
        fs::write(
            root.join("bundles/messages.properties"),
            "greeting=Hello, {name}!\nitems={n,choice,0#none|1#one|1<{n,number}}\n",
        )
        .expect("root bundle");
        fs::write(root.join("bundles/messages_fr.properties"), "greeting=Bonjour, {name} !\n")
            .expect("fr bundle");
        fs::write(
            root.join("typed-i18n.toml"),
            "[runtime]\nbundle_dir = \"bundles\"\ntruncation_fallbacks = true\ncache_capacity = 16\n",
        )
        .expect("config");
        root
    }

    fn options(root: &Path, locale: &str, key: &str, args: &[&str]) -> RenderOptions {
        RenderOptions {
            locale: locale.to_string(),
            key: key.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            bundle_dir: None,
            config_path: root.join("typed-i18n.toml"),
        }
    }

    #[test]
    fn renders_with_truncation_fallback() {
        let root = setup("render");
        let text = run_render(&options(&root, "fr-CA", "greeting", &["name=Zoé"])).expect("render");
        assert_eq!(text, "Bonjour, Zoé !");
        let items = run_render(&options(&root, "fr-CA", "items", &["n=2048"])).expect("items");
        assert_eq!(items, "2,048");
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn reports_missing_translation_and_bad_arguments() {
        let root = setup("render_errors");
        let err = run_render(&options(&root, "en", "absent", &[])).expect_err("missing");
        assert!(matches!(
            err,
            RenderCommandError::Runtime(RuntimeError::MissingTranslation { .. })
        ));
        let err = run_render(&options(&root, "en", "greeting", &["oops"])).expect_err("arg");
        assert!(matches!(err, RenderCommandError::InvalidArgument(_)));
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn parses_argument_values() {
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("1.5"), Value::Float(1.5));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("NaN"), Value::Str("NaN".to_string()));
        assert_eq!(parse_value("Ada"), Value::Str("Ada".to_string()));
    }
}
