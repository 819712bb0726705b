//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggestions for the language of `lang` and the command name of `help`.

use crate::{bot::BotData, errors::Error};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for language tags.
///
/// Matches the partial input against every bundled catalog, ignoring case and
/// treating `-` like `_`.
pub async fn autocomplete_language(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let languages = ctx.data().catalogs.languages();
    matching(languages.into_iter().map(ToString::to_string), partial)
}

/// Provides autocomplete suggestions for command names, aliases included.
pub async fn autocomplete_command(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let names = ctx
        .framework()
        .options()
        .commands
        .iter()
        .filter(|command| !command.hide_in_help)
        .flat_map(|command| std::iter::once(&command.name).chain(&command.aliases))
        .cloned();
    matching(names, partial)
}

fn matching(candidates: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase().replace('-', "_");
    let mut found: Vec<String> = candidates
        .filter(|candidate| candidate.to_lowercase().contains(&partial))
        .collect();

    // Sort alphabetically for consistent UX
    found.sort();
    found.dedup();
    found.truncate(MAX_SUGGESTIONS);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_ignores_case_and_dashes() {
        let languages = ["pt_BR", "en_US"].map(String::from);
        assert_eq!(matching(languages.clone().into_iter(), "EN-"), vec!["en_US"]);
        assert_eq!(matching(languages.into_iter(), ""), vec!["en_US", "pt_BR"]);
    }

    #[test]
    fn test_matching_caps_suggestions() {
        let many = (0..40).map(|n| format!("cmd{n:02}"));
        assert_eq!(matching(many, "cmd").len(), MAX_SUGGESTIONS);
    }
}
