//! Prefix matching for prefix commands.
//!
//! A guild's custom prefixes replace the configured defaults. Mentioning the
//! bot always works on top of these (poise handles mentions itself).

use crate::{bot::BotData, errors::Result};
use poise::serenity_prelude as serenity;

/// Splits a message into `(prefix, rest)` when it starts with one of the
/// prefixes active where it was sent.
pub async fn strip_prefix<'a>(
    _ctx: &'a serenity::Context,
    msg: &'a serenity::Message,
    data: &'a BotData,
) -> Result<Option<(&'a str, &'a str)>> {
    let prefixes = match msg.guild_id {
        Some(guild_id) => {
            data.settings
                .prefixes_for(guild_id.get(), &data.config.prefixes)
                .await?
        }
        None => data.config.prefixes.clone(),
    };

    Ok(match_prefix(&msg.content, &prefixes))
}

/// The longest prefix `content` starts with, split off the rest.
#[must_use]
pub fn match_prefix<'a>(content: &'a str, prefixes: &[String]) -> Option<(&'a str, &'a str)> {
    prefixes
        .iter()
        .filter(|prefix| content.starts_with(prefix.as_str()))
        .max_by_key(|prefix| prefix.len())
        .map(|prefix| content.split_at(prefix.len()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_longest_prefix_wins() {
        let list = prefixes(&["k", "k.", "kaibot "]);
        assert_eq!(match_prefix("k.ping", &list), Some(("k.", "ping")));
        assert_eq!(match_prefix("kaibot help ban", &list), Some(("kaibot ", "help ban")));
        assert_eq!(match_prefix("kping", &list), Some(("k", "ping")));
    }

    #[test]
    fn test_no_match() {
        let list = prefixes(&["k."]);
        assert_eq!(match_prefix("hello", &list), None);
        assert_eq!(match_prefix("K.ping", &list), None);
        assert_eq!(match_prefix("", &list), None);
    }

    #[tokio::test]
    async fn test_custom_prefixes_replace_defaults() {
        let store = crate::test_utils::setup_test_store().await.unwrap();
        let defaults = prefixes(&["k."]);
        store.add_prefix(7, "!").await.unwrap();

        let active = store.prefixes_for(7, &defaults).await.unwrap();
        assert_eq!(match_prefix("!ping", &active), Some(("!", "ping")));
        assert_eq!(match_prefix("k.ping", &active), None);
    }
}
