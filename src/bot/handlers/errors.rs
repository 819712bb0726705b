//! Framework error handling.
//!
//! Expected failures (bad arguments, missing permissions, guild-only commands)
//! become localized replies. Anything else is logged, reported to the errors
//! log channel and answered with a generic message carrying the error text.

use crate::{
    bot::{BotData, Context, commands::help},
    core::{i18n::ListStyle, text::truncate},
    errors::Error,
};
use poise::{CreateReply, FrameworkError, serenity_prelude as serenity};
use std::num::ParseIntError;
use tracing::{error, warn};

/// Embed field values are capped by Discord
const FIELD_LIMIT: usize = 1024;

/// Entry point registered as the framework's `on_error`.
pub async fn on_error(error: FrameworkError<'_, BotData, Error>) {
    match error {
        FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        FrameworkError::Command { error, ctx, .. } => {
            report_command_error(ctx, &error).await;
        }
        FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let t = ctx.data().translator_for(ctx.guild_id()).await;
            let reply = match input {
                // Nothing left to parse: the argument is missing
                None => {
                    if let Err(e) = help::send_command_help(ctx, ctx.command()).await {
                        warn!("Failed to send help after a missing argument: {e}");
                    }
                    return;
                }
                Some(_) if error.downcast_ref::<ParseIntError>().is_some() => {
                    t.t("errors.invalid_number")
                }
                Some(input) => t.f("errors.invalid_argument", &[("argument", &input)]),
            };
            say(ctx, reply).await;
        }
        FrameworkError::SubcommandRequired { ctx, .. } => {
            if let Err(e) = help::send_command_help(ctx, ctx.command()).await {
                warn!("Failed to send help for a group without subcommand: {e}");
            }
        }
        FrameworkError::GuildOnly { ctx, .. } => {
            let t = ctx.data().translator_for(None).await;
            say(ctx, t.t("errors.guild_only")).await;
        }
        FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let t = ctx.data().translator_for(ctx.guild_id()).await;
            let names = missing_permissions
                .map(|permissions| t.permission_names(permissions))
                .unwrap_or_default();
            let permissions = t.list(names.iter().map(|n| format!("`{n}`")), ListStyle::And);
            say(
                ctx,
                t.f(
                    "errors.missing_user_permissions",
                    &[("permissions", &permissions)],
                ),
            )
            .await;
        }
        FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let t = ctx.data().translator_for(ctx.guild_id()).await;
            let names = t.permission_names(missing_permissions);
            let permissions = t.list(names.iter().map(|n| format!("`{n}`")), ListStyle::And);
            say(
                ctx,
                t.f(
                    "errors.missing_bot_permissions",
                    &[("permissions", &permissions)],
                ),
            )
            .await;
        }
        FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let t = ctx.data().translator_for(ctx.guild_id()).await;
            let seconds = format!("{:.1}", remaining_cooldown.as_secs_f32());
            say(ctx, t.f("errors.cooldown", &[("seconds", &seconds)])).await;
        }
        FrameworkError::UnknownCommand { .. } | FrameworkError::NotAnOwner { .. } => {}
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

async fn say(ctx: Context<'_>, text: String) {
    if let Err(e) = ctx.say(text).await {
        error!("Failed to send error message: {e}");
    }
}

/// Logs an unexpected command failure, mirrors it to the errors channel and
/// tells the user something went wrong.
async fn report_command_error(ctx: Context<'_>, error: &Error) {
    let command = ctx.command().qualified_name.clone();
    let invocation = ctx.id();
    error!("An error occurred in the command \"{command}\" (invocation {invocation}): {error:?}");

    let data = ctx.data();
    if let Some(channel_id) = data.config.log_channels.errors {
        let details = truncate(&format!("{error:?}"), FIELD_LIMIT - 8);
        let embed = data
            .embed()
            .title(format!("Erro no comando \"{command}\""))
            .description(format!("ID da invocação: {invocation}"))
            .field("\u{200B}", format!("```\n{details}\n```"), false);
        let sent = serenity::ChannelId::new(channel_id)
            .send_message(ctx, serenity::CreateMessage::new().embed(embed))
            .await;
        if let Err(e) = sent {
            warn!("Failed to report error to channel {channel_id}: {e}");
        }
    }

    let t = data.translator_for(ctx.guild_id()).await;
    let shown = format!("```\n{}\n```", truncate(&error.to_string(), 1500));
    let reply = CreateReply::default()
        .content(t.f("errors.generic", &[("error", &shown)]))
        .ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send error message: {e}");
    }
}
