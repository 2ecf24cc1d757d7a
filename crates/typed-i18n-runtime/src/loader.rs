use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;
use typed_i18n_core::LanguageTag;

use crate::error::RuntimeResult;
use crate::source::BundleFormat;

/// A bundle file found on disk. `locale` is `None` for the root bundle
/// (`<base>.<ext>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleFile {
    pub locale: Option<LanguageTag>,
    pub path: PathBuf,
    pub format: BundleFormat,
}

/// Lists `<base>.<ext>` and `<base>_<locale>.<ext>` files directly inside
/// `dir`, sorted by path. Files whose suffix is not a language tag are
/// skipped with a warning.
pub fn discover_bundles(dir: &Path, base_name: &str) -> RuntimeResult<Vec<BundleFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(format) = BundleFormat::from_path(&path) else {
            continue;
        };
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let locale = if stem == base_name {
            None
        } else if let Some(suffix) = stem
            .strip_prefix(base_name)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            match LanguageTag::parse(suffix) {
                Ok(tag) => Some(tag),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping bundle with invalid locale suffix");
                    continue;
                }
            }
        } else {
            continue;
        };

        files.push(BundleFile {
            locale,
            path,
            format,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use typed_i18n_core::LanguageTag;

    use super::discover_bundles;
    use crate::BundleFormat;

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("typed_i18n_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    #[test]
    fn finds_root_and_locale_bundles() {
        let root = temp_dir("discover");
        fs::write(root.join("messages.properties"), "a = root").expect("write");
        fs::write(root.join("messages_fr_FR.properties"), "a = fr").expect("write");
        fs::write(root.join("messages_de.json"), "{}").expect("write");
        fs::write(root.join("other_fr.properties"), "a = x").expect("write");
        fs::write(root.join("messages_fr.txt"), "a = x").expect("write");
        fs::write(root.join("messages_1.properties"), "a = x").expect("write");

        let files = discover_bundles(&root, "messages").expect("discover");
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].locale, None);
        assert_eq!(files[0].format, BundleFormat::Properties);
        assert_eq!(
            files[1].locale,
            Some(LanguageTag::parse("de").expect("tag"))
        );
        assert_eq!(files[1].format, BundleFormat::Json);
        assert_eq!(
            files[2].locale,
            Some(LanguageTag::parse("fr-FR").expect("tag"))
        );

        fs::remove_dir_all(&root).ok();
    }
}
