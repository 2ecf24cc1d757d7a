use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::bundles::{BundleOutput, emit_bundles};
use crate::diagnostic::Diagnostic;
use crate::emit::emit_source;
use crate::error::GenerateError;
use crate::model::{DeclarationFile, InterfaceModel, SourcedInterface};
use crate::resolver::resolve_interfaces;

const DECLARATION_SUFFIX: &str = ".i18n.toml";

/// Everything produced by one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOutput {
    pub source: String,
    pub bundles: Vec<BundleOutput>,
    pub warnings: Vec<Diagnostic>,
    pub interfaces: Vec<InterfaceModel>,
}

impl GeneratedOutput {
    /// Writes the accessor source as `dir/source_file` and every bundle into
    /// `dir`. Files whose contents are already current are left untouched.
    /// Returns the paths actually written.
    pub fn write_to(&self, dir: &Path, source_file: &str) -> Result<Vec<PathBuf>, GenerateError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        let source_path = dir.join(source_file);
        if write_if_changed(&source_path, &self.source)? {
            written.push(source_path);
        }
        for bundle in &self.bundles {
            let path = dir.join(&bundle.file_name);
            if write_if_changed(&path, &bundle.contents)? {
                written.push(path);
            }
        }
        info!(
            dir = %dir.display(),
            written = written.len(),
            bundles = self.bundles.len(),
            "wrote generated artifacts"
        );
        Ok(written)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.interfaces
            .iter()
            .flat_map(|interface| interface.methods.iter())
            .map(|method| method.key.as_str())
    }
}

/// Collects declarations from files, directories and in-memory text, then
/// runs resolution and emission. Usable from a `build.rs`.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
    inline: Vec<(String, String)>,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaration_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Adds every `*.i18n.toml` below `path`.
    pub fn declaration_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }

    pub fn declarations(mut self, origin: impl Into<String>, text: impl Into<String>) -> Self {
        self.inline.push((origin.into(), text.into()));
        self
    }

    /// Paths of every declaration file this generator reads, sorted.
    pub fn declaration_paths(&self) -> Result<Vec<PathBuf>, GenerateError> {
        let mut paths = self.files.clone();
        paths.extend(collect_declaration_files(&self.dirs)?);
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    pub fn load(&self) -> Result<Vec<SourcedInterface>, GenerateError> {
        let mut interfaces = Vec::new();
        for path in self.declaration_paths()? {
            let text = fs::read_to_string(&path)?;
            let origin = path.display().to_string();
            debug!(path = %origin, "reading declarations");
            parse_into(&origin, &text, &mut interfaces)?;
        }
        for (origin, text) in &self.inline {
            parse_into(origin, text, &mut interfaces)?;
        }
        Ok(interfaces)
    }

    pub fn generate(&self) -> Result<GeneratedOutput, GenerateError> {
        generate(&self.load()?)
    }
}

fn parse_into(
    origin: &str,
    text: &str,
    interfaces: &mut Vec<SourcedInterface>,
) -> Result<(), GenerateError> {
    let file = DeclarationFile::parse(text).map_err(|source| GenerateError::Parse {
        origin: origin.to_string(),
        source,
    })?;
    interfaces.extend(
        file.interfaces
            .into_iter()
            .map(|interface| SourcedInterface::new(Some(origin), interface)),
    );
    Ok(())
}

/// Resolves `interfaces` and emits the accessor source and bundles.
pub fn generate(interfaces: &[SourcedInterface]) -> Result<GeneratedOutput, GenerateError> {
    let resolution = match resolve_interfaces(interfaces) {
        Ok(resolution) => resolution,
        Err(err) => {
            for declaration in err.declaration_errors() {
                warn!(code = declaration.code(), "{declaration}");
            }
            return Err(err);
        }
    };
    for warning in &resolution.warnings {
        warn!(code = %warning.code, "{warning}");
    }

    let source = emit_source(&resolution.interfaces);
    let bundles = emit_bundles(&resolution.interfaces);
    info!(
        interfaces = resolution.interfaces.len(),
        bundles = bundles.len(),
        warnings = resolution.warnings.len(),
        "generated message accessors"
    );
    Ok(GeneratedOutput {
        source,
        bundles,
        warnings: resolution.warnings,
        interfaces: resolution.interfaces,
    })
}

/// Recursively lists `*.i18n.toml` files under `roots`, sorted.
pub fn collect_declaration_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>, GenerateError> {
    let mut files = Vec::new();
    for root in roots {
        collect_inner(root, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_inner(root: &Path, files: &mut Vec<PathBuf>) -> Result<(), GenerateError> {
    if root.is_file() {
        if is_declaration_file(root) {
            files.push(root.to_path_buf());
        }
        return Ok(());
    }
    if should_skip_dir(root) {
        return Ok(());
    }
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_inner(&path, files)?;
        } else if is_declaration_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(DECLARATION_SUFFIX))
}

fn should_skip_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|name| name.to_str()),
        Some(".git") | Some("target") | Some("node_modules")
    )
}

fn write_if_changed(path: &Path, contents: &str) -> Result<bool, GenerateError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == contents) {
        return Ok(false);
    }
    fs::write(path, contents)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{Generator, collect_declaration_files};
    use crate::GenerateError;

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

    const SHOP: &str = r#"
[[interface]]
name = "Shop"
[[interface.method]]
name = "title"
key = "shop.title"
messages = { en = "Shop", de = "Laden" }
"#;

    #[test]
    fn collects_nested_declarations_and_skips_target() {
        let root = temp_dir("collect");
        fs::create_dir_all(root.join("nested")).expect("nested");
        fs::create_dir_all(root.join("target")).expect("target");
        fs::write(root.join("b.i18n.toml"), SHOP).expect("write");
        fs::write(root.join("nested/a.i18n.toml"), "").expect("write");
        fs::write(root.join("target/c.i18n.toml"), "").expect("write");
        fs::write(root.join("notes.toml"), "").expect("write");

        let files = collect_declaration_files(&[root.clone()]).expect("collect");
        assert_eq!(files, vec![root.join("b.i18n.toml"), root.join("nested/a.i18n.toml")]);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn generates_and_writes_only_changed_files() {
        let root = temp_dir("write");
        fs::write(root.join("shop.i18n.toml"), SHOP).expect("write");
        let output = Generator::new()
            .declaration_dir(&root)
            .generate()
            .expect("generate");
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["shop.title"]);

        let out = root.join("out");
        let written = output.write_to(&out, "messages.rs").expect("write");
        assert_eq!(written.len(), 3);
        assert!(out.join("shop_de.properties").is_file());
        assert!(out.join("shop_en.properties").is_file());
        let again = output.write_to(&out, "messages.rs").expect("rewrite");
        assert!(again.is_empty());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn parse_errors_name_the_origin() {
        let err = Generator::new()
            .declarations("broken.i18n.toml", "[[interface]\n")
            .generate()
            .expect_err("parse error");
        assert!(matches!(err, GenerateError::Parse { ref origin, .. } if origin == "broken.i18n.toml"));
    }
}
