//! Localized help: every category with its commands, or the details of one
//! command.
//!
//! Descriptions come from the catalog key
//! `commands.<qualified name with dots>.description`, falling back to the
//! command's doc comment.

use super::CATEGORIES;
use crate::{
    bot::{BotData, Context, bot_author},
    core::i18n::Translator,
    errors::{Error, Result},
};
use poise::CreateReply;

type Command = poise::Command<BotData, Error>;

/// Finds a command by name or alias, descending into subcommands word by word.
#[must_use]
pub fn find_command<'a>(commands: &'a [Command], query: &str) -> Option<&'a Command> {
    let matches = |command: &&Command, word: &str| {
        command.name == word || command.aliases.iter().any(|alias| alias == word)
    };

    let mut words = query.split_whitespace();
    let first = words.next()?;
    let mut found = commands.iter().find(|c| matches(c, first))?;
    for word in words {
        found = found.subcommands.iter().find(|c| matches(c, word))?;
    }
    Some(found)
}

/// `<required> [optional]` parameter list.
#[must_use]
pub fn signature(command: &Command) -> String {
    command
        .parameters
        .iter()
        .map(|parameter| {
            if parameter.required {
                format!("<{}>", parameter.name)
            } else {
                format!("[{}]", parameter.name)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `qualified name <args>` without a trailing space for argument-less commands.
fn usage(command: &Command) -> String {
    let signature = signature(command);
    if signature.is_empty() {
        command.qualified_name.clone()
    } else {
        format!("{} {signature}", command.qualified_name)
    }
}

/// Localized description of a command.
#[must_use]
pub fn description(t: &Translator, command: &Command) -> String {
    let key = format!(
        "commands.{}.description",
        command.qualified_name.replace(' ', ".")
    );
    t.lookup(&key)
        .map(ToString::to_string)
        .or_else(|| command.description.clone())
        .unwrap_or_else(|| t.t("help.no_description"))
}

/// One help line; groups are marked with `*`.
fn command_line(t: &Translator, command: &Command) -> String {
    let marker = if command.subcommands.is_empty() { "" } else { "\\*" };
    format!("{marker}**{}** — {}", usage(command), description(t, command))
}

/// Sends the detailed help of one command.
pub async fn send_command_help(ctx: Context<'_>, command: &Command) -> Result<()> {
    let t = ctx.data().translator_for(ctx.guild_id()).await;
    let prefix = ctx.prefix();

    let mut embed = ctx
        .data()
        .embed()
        .author(bot_author(
            ctx,
            t.f("help.title_for", &[("bucket", &command.qualified_name)]),
        ))
        .description(description(&t, command))
        .field(t.t("help.usage"), format!("`{prefix}{}`", usage(command)), false);

    if !command.aliases.is_empty() {
        embed = embed.field(t.t("help.aliases"), command.aliases.join(", "), false);
    }
    if let Some((parent, _)) = command.qualified_name.rsplit_once(' ') {
        embed = embed.field(t.t("help.parent"), parent.to_string(), false);
    }

    let subcommands: Vec<String> = command
        .subcommands
        .iter()
        .filter(|sub| !sub.hide_in_help)
        .map(|sub| command_line(&t, sub))
        .collect();
    if !subcommands.is_empty() {
        let note = format!(
            "{}\n\n{}",
            t.f(
                "help.subcommand_more_info",
                &[("prefix", &prefix), ("group", &command.qualified_name)],
            ),
            t.t("help.groups_note"),
        );
        embed = embed
            .field(t.t("help.subcommands"), subcommands.join("\n"), false)
            .field("\u{200B}", note, false);
    }

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Sends the overview of every category.
async fn send_bot_help(ctx: Context<'_>) -> Result<()> {
    let t = ctx.data().translator_for(ctx.guild_id()).await;
    let commands = &ctx.framework().options().commands;

    let mut embed = ctx
        .data()
        .embed()
        .author(bot_author(ctx, t.t("help.title")))
        .description(t.t("help.all_commands"));

    for category in CATEGORIES {
        let lines: Vec<String> = commands
            .iter()
            .filter(|command| !command.hide_in_help)
            .filter(|command| command.category.as_deref() == Some(category))
            .map(|command| command_line(&t, command))
            .collect();
        if lines.is_empty() {
            continue;
        }
        embed = embed.field(
            t.t(&format!("categories.{category}")),
            lines.join("\n"),
            false,
        );
    }

    let prefix = ctx.prefix();
    let extra = format!(
        "{}\n\n{}",
        t.f("help.more_info", &[("prefix", &prefix)]),
        t.t("help.groups_note"),
    );
    embed = embed.field("\u{200B}", extra, false);

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{find_command, send_bot_help, send_command_help};
    use crate::{
        bot::{Context, translator},
        errors::Result,
    };
    use poise::CreateReply;

    /// Shows this message.
    #[poise::command(slash_command, prefix_command, category = "misc", aliases("ajuda"))]
    pub async fn help(
        ctx: Context<'_>,
        #[rest]
        #[autocomplete = "crate::bot::handlers::autocomplete::autocomplete_command"]
        command: Option<String>,
    ) -> Result<()> {
        let Some(query) = command else {
            return send_bot_help(ctx).await;
        };

        match find_command(&ctx.framework().options().commands, &query) {
            Some(found) => send_command_help(ctx, found).await,
            None => {
                let t = translator(ctx).await;
                let embed = ctx
                    .data()
                    .embed()
                    .description(t.f("help.command_not_found", &[("command", &query)]));
                ctx.send(CreateReply::default().embed(embed)).await?;
                Ok(())
            }
        }
    }
}

pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bot::framework::all_commands, test_utils::test_translator};

    #[test]
    fn test_find_command_by_alias_and_path() {
        let commands = all_commands();
        assert_eq!(find_command(&commands, "bi").map(|c| c.name.as_str()), Some("botinfo"));
        assert_eq!(
            find_command(&commands, "prefix rm").map(|c| c.qualified_name.as_str()),
            Some("prefix remove")
        );
        assert!(find_command(&commands, "prefix nope").is_none());
        assert!(find_command(&commands, "").is_none());
    }

    #[test]
    fn test_signature_marks_optional_arguments() {
        let commands = all_commands();
        let ban = find_command(&commands, "ban").map(signature);
        assert_eq!(ban.as_deref(), Some("<user> [reason]"));
        let ping = find_command(&commands, "ping").map(signature);
        assert_eq!(ping.as_deref(), Some(""));
    }

    #[test]
    fn test_every_command_is_described_in_both_languages() {
        fn check(t: &Translator, command: &Command) {
            let key = format!(
                "commands.{}.description",
                command.qualified_name.replace(' ', ".")
            );
            assert!(t.lookup(&key).is_some(), "{key} missing for {}", t.language());
            for sub in &command.subcommands {
                check(t, sub);
            }
        }

        for language in ["pt_BR", "en_US"] {
            let t = test_translator(language);
            for command in all_commands() {
                check(&t, &command);
            }
        }
    }

    #[test]
    fn test_group_lines_are_marked() {
        let t = test_translator("en_US");
        let commands = all_commands();
        let prefix = find_command(&commands, "prefix").map(|c| command_line(&t, c));
        assert_eq!(
            prefix.as_deref(),
            Some("\\***prefix** — Commands related to the server prefix.")
        );
        let ping = find_command(&commands, "ping").map(|c| command_line(&t, c));
        assert_eq!(
            ping.as_deref(),
            Some("**ping** — Sends the websocket latency and the response time.")
        );
    }
}
