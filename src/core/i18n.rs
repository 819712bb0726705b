//! Localization - message catalogs and per-language translators.
//!
//! Catalogs are TOML files (one per language) bundled into the binary. Nested
//! tables are flattened to dotted keys, so `[ttt] turn = "..."` is looked up
//! as `ttt.turn`. Messages use named `{placeholders}`.

use crate::errors::{Error, Result};
use poise::serenity_prelude::Permissions;
use std::collections::HashMap;
use std::fmt::{Display, Write};
use std::sync::Arc;

const BUNDLED: [(&str, &str); 2] = [
    ("pt_BR", include_str!("../../locales/pt_BR.toml")),
    ("en_US", include_str!("../../locales/en_US.toml")),
];

/// How a list of items is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    /// "a, b and c"
    And,
    /// "a, b or c"
    Or,
}

/// All loaded catalogs, keyed by language tag.
#[derive(Debug)]
pub struct Catalogs {
    default_language: String,
    messages: HashMap<String, HashMap<String, String>>,
}

impl Catalogs {
    /// Loads the catalogs shipped with the bot.
    pub fn bundled(default_language: &str) -> Result<Self> {
        Self::from_sources(default_language, &BUNDLED)
    }

    /// Builds catalogs from `(language, toml source)` pairs.
    ///
    /// # Errors
    /// Fails when a source is not valid TOML or the default language is missing.
    pub fn from_sources(default_language: &str, sources: &[(&str, &str)]) -> Result<Self> {
        let mut messages = HashMap::new();
        for (language, source) in sources {
            let table: toml::Table = toml::from_str(source).map_err(|e| Error::Config {
                message: format!("Invalid catalog for {language}: {e}"),
            })?;
            let mut flat = HashMap::new();
            flatten_into(&mut flat, "", &table);
            messages.insert((*language).to_string(), flat);
        }

        if !messages.contains_key(default_language) {
            return Err(Error::Config {
                message: format!("No catalog for the default language {default_language}"),
            });
        }

        Ok(Self {
            default_language: default_language.to_string(),
            messages,
        })
    }

    /// The language used when nothing else is configured.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Available language tags, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        let mut languages: Vec<&str> = self.messages.keys().map(String::as_str).collect();
        languages.sort_unstable();
        languages
    }

    /// Maps user input such as `en`, `EN-us` or `pt_br` to a known language tag.
    #[must_use]
    pub fn normalize(&self, input: &str) -> Option<&str> {
        let wanted = input.trim().replace('-', "_").to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        self.languages().into_iter().find(|language| {
            let full = language.to_lowercase();
            let code = full.split('_').next().unwrap_or(&full);
            wanted == full || wanted == code
        })
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.messages
            .get(language)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.messages
                    .get(&self.default_language)
                    .and_then(|catalog| catalog.get(key))
            })
            .map(String::as_str)
    }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: &str, table: &toml::Table) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, &path, inner),
            toml::Value::String(text) => {
                out.insert(path, text.clone());
            }
            other => {
                out.insert(path, other.to_string());
            }
        }
    }
}

/// Replaces `{name}` placeholders with the matching argument.
///
/// Unknown placeholders are kept verbatim.
#[must_use]
pub fn format_message(template: &str, args: &[(&str, &(dyn Display + Sync))]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match args.iter().find(|(arg, _)| *arg == name) {
                    Some((_, value)) => {
                        let _ = write!(out, "{value}");
                    }
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Translates messages for one language.
#[derive(Debug, Clone)]
pub struct Translator {
    catalogs: Arc<Catalogs>,
    language: String,
}

impl Translator {
    /// Creates a translator; unknown languages fall back to the default.
    #[must_use]
    pub fn new(catalogs: Arc<Catalogs>, language: &str) -> Self {
        let language = catalogs
            .normalize(language)
            .unwrap_or_else(|| catalogs.default_language())
            .to_string();
        Self {
            catalogs,
            language,
        }
    }

    /// Language this translator renders.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Looks up a message without arguments; missing keys render as the key.
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    /// Looks up a message and fills its placeholders.
    #[must_use]
    pub fn f(&self, key: &str, args: &[(&str, &(dyn Display + Sync))]) -> String {
        format_message(self.lookup(key).unwrap_or(key), args)
    }

    /// Looks up an optional message.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.catalogs.lookup(&self.language, key)
    }

    /// Joins items the way the language does ("a, b e c").
    #[must_use]
    pub fn list<I, S>(&self, items: I, style: ListStyle) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<S> = items.into_iter().collect();
        let conjunction = match style {
            ListStyle::And => self.t("list.and"),
            ListStyle::Or => self.t("list.or"),
        };
        let serial_comma = self.lookup("list.serial_comma") == Some("true");

        match items.as_slice() {
            [] => String::new(),
            [only] => only.as_ref().to_string(),
            [first, second] => format!("{} {conjunction} {}", first.as_ref(), second.as_ref()),
            [init @ .., last] => {
                let head: Vec<&str> = init.iter().map(|item| item.as_ref()).collect();
                let comma = if serial_comma { "," } else { "" };
                format!(
                    "{}{comma} {conjunction} {}",
                    head.join(", "),
                    last.as_ref()
                )
            }
        }
    }

    /// Localized names of every permission set in `permissions`.
    #[must_use]
    pub fn permission_names(&self, permissions: Permissions) -> Vec<String> {
        permissions
            .iter_names()
            .map(|(flag, _)| {
                let key = format!("permissions.{}", flag.to_lowercase());
                self.lookup(&key)
                    .map_or_else(|| title_case(flag), ToString::to_string)
            })
            .collect()
    }
}

/// `SEND_TTS_MESSAGES` -> `Send Tts Messages`
fn title_case(flag: &str) -> String {
    flag.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_catalogs, test_translator};

    #[test]
    fn test_bundled_catalogs_share_keys() {
        let catalogs = test_catalogs();
        let pt = &catalogs.messages["pt_BR"];
        let en = &catalogs.messages["en_US"];

        let mut missing: Vec<&String> = pt.keys().filter(|k| !en.contains_key(*k)).collect();
        missing.extend(en.keys().filter(|k| !pt.contains_key(*k)));
        assert!(missing.is_empty(), "keys missing a translation: {missing:?}");
    }

    #[test]
    fn test_normalize_language() {
        let catalogs = test_catalogs();
        assert_eq!(catalogs.normalize("en"), Some("en_US"));
        assert_eq!(catalogs.normalize("EN-us"), Some("en_US"));
        assert_eq!(catalogs.normalize("pt_br"), Some("pt_BR"));
        assert_eq!(catalogs.normalize("pt"), Some("pt_BR"));
        assert_eq!(catalogs.normalize("fr"), None);
        assert_eq!(catalogs.normalize(""), None);
    }

    #[test]
    fn test_format_message_placeholders() {
        let name = "Kai";
        let count = 3;
        let text = format_message(
            "{name} has {count} {unknown}",
            &[("name", &name), ("count", &count)],
        );
        assert_eq!(text, "Kai has 3 {unknown}");
        assert_eq!(format_message("open { brace", &[]), "open { brace");
    }

    fn assert_send<F: std::future::Future + Send>(_: F) {}

    #[test]
    fn test_format_arguments_can_live_across_await() {
        let t = test_translator("en_US");
        let count = 3;
        assert_send(async move {
            let text = t.f("common.page", &[("current", &count), ("max", &async { 5 }.await)]);
            assert!(text.contains('3'));
        });
    }

    #[test]
    fn test_translator_falls_back() {
        let catalogs = Catalogs::from_sources(
            "pt_BR",
            &[
                ("pt_BR", "[greet]\nhello = \"Olá {who}\"\nonly = \"só\""),
                ("en_US", "[greet]\nhello = \"Hello {who}\""),
            ],
        );
        let catalogs = Arc::new(catalogs.unwrap_or_else(|e| panic!("{e}")));
        let en = Translator::new(Arc::clone(&catalogs), "en");

        assert_eq!(en.f("greet.hello", &[("who", &"you")]), "Hello you");
        assert_eq!(en.t("greet.only"), "só");
        assert_eq!(en.t("greet.nothing"), "greet.nothing");

        let unknown = Translator::new(catalogs, "xx");
        assert_eq!(unknown.language(), "pt_BR");
    }

    #[test]
    fn test_missing_default_language_is_error() {
        let result = Catalogs::from_sources("pt_BR", &[("en_US", "a = \"b\"")]);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_list_styles() {
        let pt = test_translator("pt_BR");
        assert_eq!(pt.list(["a", "b", "c"], ListStyle::And), "a, b e c");
        assert_eq!(pt.list(["a", "b"], ListStyle::Or), "a ou b");

        let en = test_translator("en_US");
        assert_eq!(en.list(["a", "b", "c"], ListStyle::And), "a, b, and c");
        assert_eq!(en.list(["a", "b", "c"], ListStyle::Or), "a, b, or c");
        assert_eq!(en.list(["only"], ListStyle::And), "only");
        assert_eq!(en.list(Vec::<String>::new(), ListStyle::And), "");
    }

    #[test]
    fn test_permission_names_are_localized() {
        let pt = test_translator("pt_BR");
        let names = pt.permission_names(Permissions::BAN_MEMBERS | Permissions::MANAGE_ROLES);
        assert!(names.contains(&"Banir membros".to_string()));
        assert!(names.contains(&"Gerenciar cargos".to_string()));
    }

    #[test]
    fn test_unknown_permission_is_title_cased() {
        assert_eq!(title_case("SEND_TTS_MESSAGES"), "Send Tts Messages");
    }
}
