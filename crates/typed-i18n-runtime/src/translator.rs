use std::sync::Arc;

use tracing::trace;
use typed_i18n_core::{
    Args, LanguageTag, PlaceholderBridge, PlainTextBuilder, RichText, RichTextBuilder, TextBuilder,
    render,
};

use crate::cache::RenderCache;
use crate::error::RuntimeResult;
use crate::registry::LocaleRegistry;

/// Resolves a key through the registry and renders it with arguments.
///
/// The optional cache only stores [`RichText`] results and is skipped while
/// a placeholder bridge is present, since external placeholders may change
/// between calls.
#[derive(Debug)]
pub struct Translator {
    registry: Arc<LocaleRegistry>,
    bridge: PlaceholderBridge,
    cache: Option<RenderCache>,
}

impl Translator {
    pub fn new(registry: Arc<LocaleRegistry>) -> Self {
        Self {
            registry,
            bridge: PlaceholderBridge::Absent,
            cache: None,
        }
    }

    pub fn with_bridge(mut self, bridge: PlaceholderBridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(RenderCache::new(capacity));
        self
    }

    pub fn registry(&self) -> &Arc<LocaleRegistry> {
        &self.registry
    }

    pub fn bridge(&self) -> &PlaceholderBridge {
        &self.bridge
    }

    pub fn cache(&self) -> Option<&RenderCache> {
        self.cache.as_ref()
    }

    pub fn raw_pattern(&self, key: &str, locale: &LanguageTag) -> RuntimeResult<String> {
        let message = self.registry.resolve(locale, key)?;
        Ok(message.raw().to_string())
    }

    pub fn render(&self, key: &str, locale: &LanguageTag, args: &Args) -> RuntimeResult<RichText> {
        let resolved = self.registry.lookup(locale, key)?;
        let cache = self.cache.as_ref().filter(|_| !self.bridge.is_present());

        if let Some(cache) = cache {
            if let Some(hit) = cache.get(resolved.generation, locale, key, args) {
                trace!(key, locale = %locale, "render cache hit");
                return Ok(hit);
            }
        }

        let text = render(
            resolved.message.pattern(),
            locale,
            args,
            &self.bridge,
            RichTextBuilder::new(),
        )?;
        if let Some(cache) = cache {
            cache.insert(resolved.generation, locale, key, args, text.clone());
        }
        Ok(text)
    }

    /// One value per line of the rendered message.
    pub fn render_lines(
        &self,
        key: &str,
        locale: &LanguageTag,
        args: &Args,
    ) -> RuntimeResult<Vec<RichText>> {
        Ok(self.render(key, locale, args)?.lines())
    }

    pub fn render_plain(&self, key: &str, locale: &LanguageTag, args: &Args) -> RuntimeResult<String> {
        self.render_with(key, locale, args, PlainTextBuilder::new())
    }

    /// Renders into any [`TextBuilder`]; never cached.
    pub fn render_with<B: TextBuilder>(
        &self,
        key: &str,
        locale: &LanguageTag,
        args: &Args,
        builder: B,
    ) -> RuntimeResult<B::Output> {
        let message = self.registry.resolve(locale, key)?;
        Ok(render(message.pattern(), locale, args, &self.bridge, builder)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use typed_i18n_core::{
        Args, LanguageTag, PlaceholderBridge, RichText, StaticPlaceholders, Value,
    };

    use super::Translator;
    use crate::{BundleSource, LocaleRegistry, RuntimeError};

    fn tag(value: &str) -> LanguageTag {
        LanguageTag::parse(value).expect("tag")
    }

    fn translator() -> Translator {
        let registry = LocaleRegistry::new();
        registry
            .register(
                &tag("en"),
                BundleSource::entries([
                    ("greeting", "Hello, {name}!"),
                    ("motd", "<gold>Welcome</gold><newline>to {0}"),
                    ("server", "You are on <server>"),
                ]),
            )
            .expect("register");
        registry.set_default_locale(&tag("en")).expect("default");
        Translator::new(Arc::new(registry))
    }

    #[test]
    fn renders_named_argument() {
        let translator = translator();
        let args = Args::new().with("name", "Ada");
        let text = translator
            .render("greeting", &tag("en"), &args)
            .expect("render");
        assert_eq!(text, RichText::plain("Hello, Ada!"));
    }

    #[test]
    fn renders_lines_and_plain() {
        let translator = translator();
        let args = Args::new().with("place", "Lobby");
        let lines = translator
            .render_lines("motd", &tag("en"), &args)
            .expect("lines");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_plain(), "Welcome");
        assert_eq!(lines[1].to_plain(), "to Lobby");
        assert_eq!(
            translator
                .render_plain("motd", &tag("en"), &args)
                .expect("plain"),
            "Welcome\nto Lobby"
        );
    }

    #[test]
    fn bridge_resolves_external_tags() {
        let mut table = StaticPlaceholders::new();
        table.insert("server", "Survival");
        let translator = translator().with_bridge(PlaceholderBridge::present(table));
        let text = translator
            .render_plain("server", &tag("en"), &Args::new())
            .expect("render");
        assert_eq!(text, "You are on Survival");
    }

    #[test]
    fn absent_bridge_keeps_external_tags() {
        let translator = translator();
        let text = translator
            .render_plain("server", &tag("en"), &Args::new())
            .expect("render");
        assert_eq!(text, "You are on <server>");
    }

    #[test]
    fn missing_argument_fails() {
        let translator = translator();
        let err = translator
            .render("greeting", &tag("en"), &Args::new())
            .expect_err("unresolved");
        assert!(matches!(err, RuntimeError::UnresolvedPlaceholder(token) if token == "name"));
    }

    #[test]
    fn cache_is_invalidated_by_registration() {
        let translator = translator().with_cache(16);
        let args = Args::new().with("name", Value::from("Ada"));
        let first = translator
            .render("greeting", &tag("en"), &args)
            .expect("render");
        assert_eq!(translator.cache().map(|cache| cache.len()), Some(1));
        let second = translator
            .render("greeting", &tag("en"), &args)
            .expect("render");
        assert_eq!(first, second);

        translator
            .registry()
            .register(&tag("en"), BundleSource::entries([("greeting", "Hi {name}")]))
            .expect("register");
        let third = translator
            .render("greeting", &tag("en"), &args)
            .expect("render");
        assert_eq!(third, RichText::plain("Hi Ada"));
    }

    #[test]
    fn raw_pattern_follows_fallback() {
        let translator = translator();
        assert_eq!(
            translator
                .raw_pattern("greeting", &tag("de"))
                .expect("pattern"),
            "Hello, {name}!"
        );
    }
}
