use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use typed_i18n_core::LanguageTag;

use crate::bundle::{Message, ResourceBundle};
use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::loader::discover_bundles;
use crate::source::BundleSource;

#[derive(Clone, Debug, Default)]
struct RegistryState {
    bundles: BTreeMap<LanguageTag, Arc<ResourceBundle>>,
    sources: BTreeMap<LanguageTag, BundleSource>,
    parents: BTreeMap<LanguageTag, LanguageTag>,
    default_locale: Option<LanguageTag>,
    truncation: bool,
    generation: u64,
}

impl RegistryState {
    fn default_locale(&self) -> RuntimeResult<&LanguageTag> {
        self.default_locale
            .as_ref()
            .ok_or(RuntimeError::NoDefaultLocale)
    }

    /// Declared parent, or the truncated tag when truncation is enabled.
    fn parent_of(&self, locale: &LanguageTag) -> Option<LanguageTag> {
        match self.parents.get(locale) {
            Some(parent) => Some(parent.clone()),
            None if self.truncation => locale.truncated(),
            None => None,
        }
    }

    /// Walks parents from `locale` and stops at the default locale, which
    /// always ends the chain.
    fn chain(&self, locale: &LanguageTag) -> RuntimeResult<Vec<LanguageTag>> {
        let default = self.default_locale()?;
        let mut chain = vec![locale.clone()];
        let mut current = locale.clone();
        while current != *default {
            let Some(parent) = self.parent_of(&current) else {
                break;
            };
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        if chain.last() != Some(default) {
            chain.push(default.clone());
        }
        Ok(chain)
    }

    fn would_cycle(&self, locale: &LanguageTag, parent: &LanguageTag) -> bool {
        let mut visited = Vec::new();
        let mut current = parent.clone();
        loop {
            if current == *locale {
                return true;
            }
            if visited.contains(&current) {
                return false;
            }
            let Some(next) = self.parent_of(&current) else {
                return false;
            };
            visited.push(current);
            current = next;
        }
    }

    /// Finds an edge that lies on a cycle. Every cycle contains at least
    /// one declared edge since truncation only shortens tags.
    fn find_cycle(&self) -> Option<(LanguageTag, LanguageTag)> {
        self.parents
            .iter()
            .find(|(locale, parent)| self.would_cycle(locale, parent))
            .map(|(locale, parent)| (locale.clone(), parent.clone()))
    }
}

/// A message found by [`LocaleRegistry::lookup`], tagged with the locale that
/// supplied it and the registry generation it was read from.
#[derive(Clone, Debug)]
pub struct ResolvedMessage {
    pub locale: LanguageTag,
    pub generation: u64,
    pub message: Arc<Message>,
}

/// Shared locale to bundle store with a fallback graph.
///
/// Readers work on an immutable snapshot. Every mutation clones the current
/// state, applies the change and swaps the new snapshot in under the write
/// lock, so a lookup never sees a half-applied update. A rejected mutation
/// leaves the state untouched.
#[derive(Debug, Default)]
pub struct LocaleRegistry {
    state: RwLock<Arc<RegistryState>>,
}

impl LocaleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from configuration: loads `bundle_dir`, sets the
    /// default locale, then applies configured fallbacks.
    pub fn from_config(config: &RuntimeConfig) -> RuntimeResult<Self> {
        let registry = Self::new();
        let default = LanguageTag::parse(&config.default_locale)?;
        if let Some(dir) = &config.bundle_dir {
            registry.load_directory(dir, &config.base_name, &default)?;
        }
        registry.set_default_locale(&default)?;
        for (child, parent) in &config.fallbacks {
            registry.set_fallback(&LanguageTag::parse(child)?, &LanguageTag::parse(parent)?)?;
        }
        if config.truncation_fallbacks {
            registry.set_truncation_fallbacks(true)?;
        }
        Ok(registry)
    }

    fn snapshot(&self) -> Arc<RegistryState> {
        Arc::clone(&self.state.read())
    }

    fn update<T>(&self, apply: impl FnOnce(&mut RegistryState) -> RuntimeResult<T>) -> RuntimeResult<T> {
        let mut guard = self.state.write();
        let mut next = RegistryState::clone(&guard);
        let output = apply(&mut next)?;
        next.generation += 1;
        *guard = Arc::new(next);
        Ok(output)
    }

    /// Loads `source` eagerly and attaches it to `locale`, replacing any
    /// previous bundle for exactly that locale. Fallback edges are untouched.
    pub fn register(&self, locale: &LanguageTag, source: BundleSource) -> RuntimeResult<()> {
        let bundle = ResourceBundle::from_source(locale.clone(), &source)?;
        let keys = bundle.len();
        self.update(|state| {
            state.bundles.insert(locale.clone(), Arc::new(bundle));
            state.sources.insert(locale.clone(), source);
            Ok(())
        })?;
        info!(locale = %locale, keys, "registered bundle");
        Ok(())
    }

    /// Attaches an already built bundle. It has no source, so `reload`
    /// leaves it as is.
    pub fn register_bundle(&self, bundle: ResourceBundle) -> RuntimeResult<()> {
        let locale = bundle.locale().clone();
        let keys = bundle.len();
        self.update(|state| {
            state.sources.remove(&locale);
            state.bundles.insert(locale.clone(), Arc::new(bundle));
            Ok(())
        })?;
        info!(locale = %locale, keys, "registered bundle");
        Ok(())
    }

    pub fn unregister(&self, locale: &LanguageTag) -> RuntimeResult<Option<Arc<ResourceBundle>>> {
        self.update(|state| {
            if state.default_locale.as_ref() == Some(locale) {
                return Err(RuntimeError::DefaultLocaleInUse(locale.clone()));
            }
            state.sources.remove(locale);
            Ok(state.bundles.remove(locale))
        })
    }

    /// Re-reads the file-backed source of `locale`. Returns `false` when
    /// nothing was swapped in: the bundle has no file-backed source, or it
    /// was registered again while the source was being read.
    pub fn reload(&self, locale: &LanguageTag) -> RuntimeResult<bool> {
        let snapshot = self.snapshot();
        if !snapshot.bundles.contains_key(locale) {
            return Err(RuntimeError::UnknownLocale(locale.clone()));
        }
        let Some(source) = snapshot.sources.get(locale).filter(|s| s.is_file_backed()) else {
            return Ok(false);
        };
        let bundle = ResourceBundle::from_source(locale.clone(), source)?;
        let keys = bundle.len();
        let swapped = self.install_reloaded(vec![(source.clone(), bundle)])?;
        if swapped == 0 {
            debug!(locale = %locale, "bundle replaced during reload; keeping newer registration");
            return Ok(false);
        }
        info!(locale = %locale, keys, "reloaded bundle");
        Ok(true)
    }

    /// Re-reads every file-backed source. All bundles are loaded before any
    /// is swapped in, so a failure leaves the registry unchanged.
    pub fn reload_all(&self) -> RuntimeResult<usize> {
        let snapshot = self.snapshot();
        let mut reloaded = Vec::new();
        for (locale, source) in &snapshot.sources {
            if source.is_file_backed() {
                let bundle = ResourceBundle::from_source(locale.clone(), source)?;
                reloaded.push((source.clone(), bundle));
            }
        }
        let count = self.install_reloaded(reloaded)?;
        info!(bundles = count, "reloaded file-backed bundles");
        Ok(count)
    }

    /// Swaps in bundles rebuilt from `source`, skipping any locale whose
    /// registered source changed since the rebuild started.
    fn install_reloaded(
        &self,
        reloaded: Vec<(BundleSource, ResourceBundle)>,
    ) -> RuntimeResult<usize> {
        self.update(|state| {
            let mut swapped = 0;
            for (source, bundle) in reloaded {
                if state.sources.get(bundle.locale()) == Some(&source) {
                    state.bundles.insert(bundle.locale().clone(), Arc::new(bundle));
                    swapped += 1;
                }
            }
            Ok(swapped)
        })
    }

    /// Registers every bundle file in `dir`. The root bundle is attached to
    /// `default_locale`, layered under `<base>_<default>` when both exist.
    pub fn load_directory(
        &self,
        dir: &Path,
        base_name: &str,
        default_locale: &LanguageTag,
    ) -> RuntimeResult<usize> {
        let files = discover_bundles(dir, base_name)?;
        let mut by_locale: BTreeMap<LanguageTag, Vec<BundleSource>> = BTreeMap::new();
        for file in &files {
            let locale = file.locale.clone().unwrap_or_else(|| default_locale.clone());
            let layers = by_locale.entry(locale).or_default();
            let source = BundleSource::file(file.path.clone());
            if file.locale.is_none() {
                layers.insert(0, source);
            } else {
                layers.push(source);
            }
        }

        let count = by_locale.len();
        for (locale, mut layers) in by_locale {
            let source = if layers.len() == 1 {
                layers.remove(0)
            } else {
                BundleSource::Layered(layers)
            };
            self.register(&locale, source)?;
        }
        debug!(dir = %dir.display(), base_name, count, "loaded bundle directory");
        Ok(count)
    }

    /// Adds the edge `locale -> parent`, replacing any previous parent of
    /// `locale`. Fails with `CyclicFallback` if `parent` already falls back
    /// to `locale`.
    pub fn set_fallback(&self, locale: &LanguageTag, parent: &LanguageTag) -> RuntimeResult<()> {
        self.update(|state| {
            if state.would_cycle(locale, parent) {
                return Err(RuntimeError::CyclicFallback {
                    locale: locale.clone(),
                    parent: parent.clone(),
                });
            }
            state.parents.insert(locale.clone(), parent.clone());
            Ok(())
        })?;
        debug!(locale = %locale, parent = %parent, "set fallback");
        Ok(())
    }

    pub fn remove_fallback(&self, locale: &LanguageTag) -> RuntimeResult<Option<LanguageTag>> {
        self.update(|state| Ok(state.parents.remove(locale)))
    }

    pub fn fallback_parent(&self, locale: &LanguageTag) -> Option<LanguageTag> {
        self.snapshot().parents.get(locale).cloned()
    }

    /// Opt-in language-only fallbacks. When enabled, a locale without a
    /// declared parent falls back to its truncated tag (`fr-FR` to `fr`,
    /// `zh-Hant-TW` to `zh-Hant`). Declared edges always take precedence.
    pub fn set_truncation_fallbacks(&self, enabled: bool) -> RuntimeResult<()> {
        self.update(|state| {
            state.truncation = enabled;
            if let Some((locale, parent)) = state.find_cycle() {
                return Err(RuntimeError::CyclicFallback { locale, parent });
            }
            Ok(())
        })?;
        debug!(enabled, "set truncation fallbacks");
        Ok(())
    }

    pub fn truncation_fallbacks(&self) -> bool {
        self.snapshot().truncation
    }

    /// The locale must already have a bundle.
    pub fn set_default_locale(&self, locale: &LanguageTag) -> RuntimeResult<()> {
        self.update(|state| {
            if !state.bundles.contains_key(locale) {
                return Err(RuntimeError::UnknownLocale(locale.clone()));
            }
            state.default_locale = Some(locale.clone());
            Ok(())
        })?;
        info!(locale = %locale, "set default locale");
        Ok(())
    }

    pub fn default_locale(&self) -> RuntimeResult<LanguageTag> {
        self.snapshot().default_locale().cloned()
    }

    /// The locales consulted for `locale`, in order: the locale itself, its
    /// ancestors up to the default locale, then the default locale.
    pub fn fallback_chain(&self, locale: &LanguageTag) -> RuntimeResult<Vec<LanguageTag>> {
        self.snapshot().chain(locale)
    }

    pub fn resolve(&self, locale: &LanguageTag, key: &str) -> RuntimeResult<Arc<Message>> {
        Ok(self.lookup(locale, key)?.message)
    }

    /// Like [`resolve`](Self::resolve), also reporting where the message was
    /// found and which generation of the registry answered.
    pub fn lookup(&self, locale: &LanguageTag, key: &str) -> RuntimeResult<ResolvedMessage> {
        let state = self.snapshot();
        let chain = state.chain(locale)?;
        for candidate in &chain {
            let Some(message) = state
                .bundles
                .get(candidate)
                .and_then(|bundle| bundle.get(key))
            else {
                continue;
            };
            if candidate != locale {
                debug!(key, requested = %locale, found = %candidate, "resolved through fallback");
            }
            return Ok(ResolvedMessage {
                locale: candidate.clone(),
                generation: state.generation,
                message: Arc::clone(message),
            });
        }
        Err(RuntimeError::MissingTranslation {
            key: key.to_string(),
            tried: chain,
        })
    }

    pub fn bundle(&self, locale: &LanguageTag) -> Option<Arc<ResourceBundle>> {
        self.snapshot().bundles.get(locale).cloned()
    }

    pub fn contains(&self, locale: &LanguageTag) -> bool {
        self.snapshot().bundles.contains_key(locale)
    }

    pub fn locales(&self) -> Vec<LanguageTag> {
        self.snapshot().bundles.keys().cloned().collect()
    }

    /// Bumped on every successful mutation.
    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }
}
