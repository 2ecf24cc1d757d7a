// @generated by typed-i18n-codegen. Do not edit.

#[allow(unused_imports)]
use std::sync::Arc;
#[allow(unused_imports)]
use typed_i18n_runtime::{ArgType, Args, LanguageTag, RichText, RuntimeResult, Translator, Value};

/// Texts shown in the shop menu.
pub trait ShopMessages {
    /// Message `shop.footer`.
    fn footer(&self, locale: &LanguageTag) -> RuntimeResult<Vec<RichText>>;
    /// Message `shop.greeting`.
    fn greeting(&self, locale: &LanguageTag, player_name: &str) -> RuntimeResult<RichText>;
    /// Message `shop.items`.
    fn item_count(&self, locale: &LanguageTag, count: u32) -> RuntimeResult<String>;
}

/// Renders [`ShopMessages`] messages from bundle `shop`.
#[derive(Clone)]
pub struct ShopMessagesImpl {
    translator: Arc<Translator>,
}

impl ShopMessagesImpl {
    pub const BUNDLE: &'static str = "shop";
    pub const KEYS: &'static [&'static str] = &["shop.footer", "shop.greeting", "shop.items"];

    pub fn new(translator: Arc<Translator>) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }
}

impl ShopMessages for ShopMessagesImpl {
    fn footer(&self, locale: &LanguageTag) -> RuntimeResult<Vec<RichText>> {
        let args = Args::new();
        self.translator.render_lines("shop.footer", locale, &args)
    }

    fn greeting(&self, locale: &LanguageTag, player_name: &str) -> RuntimeResult<RichText> {
        let mut args = Args::with_capacity(1);
        args.bind("player_name", ArgType::Str, Value::from(player_name))?;
        self.translator.render("shop.greeting", locale, &args)
    }

    fn item_count(&self, locale: &LanguageTag, count: u32) -> RuntimeResult<String> {
        let mut args = Args::with_capacity(1);
        args.bind("n", ArgType::Int, Value::from(count))?;
        self.translator.render_plain("shop.items", locale, &args)
    }
}
