//! Gateway events: ready banner, guild membership changes and command logging.

use crate::{
    bot::{BotData, Context},
    core::text::{escape_text, truncate},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::time::Instant;
use tracing::{debug, info, warn};

const BANNER: &str = r"
 _   __      _______  _____ _____
| | / /     (_) ___ \|  _  |_   _|
| |/ /  __ _ _| |_/ /| | | | | |
|    \ / _` | | ___ \| | | | | |
| |\  \ (_| | | |_/ /\ \_/ / | |
\_| \_/\__,_|_\____/  \___/  \_/";

/// Longest command content copied into a log embed
pub const LOGGED_CONTENT_LIMIT: usize = 850;

/// Dispatches the gateway events the bot reacts to.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            on_ready(data_about_bot, data);
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            if *is_new == Some(true) {
                info!("Joined guild {} [{}]", guild.name, guild.id);
                let embed = guild_embed(data, "Novo servidor", guild.owner_id)
                    .author(guild_author(&guild.name, guild.id, guild.icon_url()));
                send_log(ctx, data.config.log_channels.guilds, embed, None).await;
            }
        }
        serenity::FullEvent::GuildDelete { incomplete, full } => {
            // An unavailable guild is an outage, not a removal
            if incomplete.unavailable {
                debug!("Guild {} became unavailable", incomplete.id);
                return Ok(());
            }

            let deleted = data.settings.delete(incomplete.id.get()).await?;
            info!(
                "Removed from guild {} (settings deleted: {deleted})",
                incomplete.id
            );

            let embed = match full {
                Some(guild) => guild_embed(data, "Removido de um servidor", guild.owner_id)
                    .author(guild_author(&guild.name, guild.id, guild.icon_url())),
                None => data
                    .embed()
                    .title("Removido de um servidor")
                    .author(guild_author("?", incomplete.id, None)),
            };
            send_log(ctx, data.config.log_channels.guilds, embed, None).await;
        }
        _ => {}
    }
    Ok(())
}

fn on_ready(ready: &serenity::Ready, data: &BotData) {
    // Reconnects fire ready again; only the first one counts
    if data.started_at.set(Instant::now()).is_err() {
        info!("Reconnected as {}", ready.user.name);
        return;
    }

    for line in BANNER.lines().filter(|line| !line.is_empty()) {
        info!("{line}");
    }
    info!(
        "Logged in as {} | Guilds: {} | KaiBOT {}",
        ready.user.name,
        ready.guilds.len(),
        env!("CARGO_PKG_VERSION"),
    );
}

fn guild_author(
    name: &str,
    id: serenity::GuildId,
    icon: Option<String>,
) -> serenity::CreateEmbedAuthor {
    let author = serenity::CreateEmbedAuthor::new(format!("{name} [{id}]"));
    match icon {
        Some(url) => author.icon_url(url),
        None => author,
    }
}

fn guild_embed(data: &BotData, title: &str, owner_id: serenity::UserId) -> serenity::CreateEmbed {
    data.embed()
        .title(title)
        .description(format!("Dono: <@{owner_id}>"))
}

async fn send_log(
    ctx: impl serenity::CacheHttp,
    channel: Option<u64>,
    embed: serenity::CreateEmbed,
    attachment: Option<serenity::CreateAttachment>,
) {
    let Some(channel_id) = channel else {
        return;
    };

    let mut message = serenity::CreateMessage::new().embed(embed);
    if let Some(attachment) = attachment {
        message = message.add_file(attachment);
    }
    if let Err(e) = serenity::ChannelId::new(channel_id)
        .send_message(ctx, message)
        .await
    {
        warn!("Failed to send log message to channel {channel_id}: {e}");
    }
}

/// Runs before every command: logs it and mirrors it to the commands channel.
pub async fn log_command(ctx: Context<'_>) {
    let data = ctx.data();
    let command = ctx.command().qualified_name.clone();
    let author = ctx.author();
    let content = ctx.invocation_string();
    info!(
        "{} [{}] ran \"{command}\" in {}",
        author.tag(),
        author.id,
        ctx.guild_id()
            .map_or_else(|| "DM".to_string(), |id| id.to_string()),
    );

    if data.config.log_channels.commands.is_none() {
        return;
    }

    let location = guild_summary(ctx).unwrap_or_else(|| "_Executado em DM._".to_string());
    let escaped = escape_text(&content);
    let shown = truncate(&escaped, LOGGED_CONTENT_LIMIT);
    let attachment = (escaped.chars().count() > LOGGED_CONTENT_LIMIT).then(|| {
        serenity::CreateAttachment::bytes(escaped.clone().into_bytes(), "message_content.txt")
    });

    let mut author_line =
        serenity::CreateEmbedAuthor::new(format!("{} [{}]", author.tag(), author.id));
    if let Some(avatar) = author.avatar_url() {
        author_line = author_line.icon_url(avatar);
    }
    let embed = data
        .embed()
        .title(format!("Comando \"{command}\" executado."))
        .author(author_line)
        .field("Servidor", location, false)
        .field("Canal", format!("\\> ID: {}", ctx.channel_id()), false)
        .field(
            "Mensagem",
            format!("\\> Conteúdo: \"{shown}\"\n\\> ID: {}", ctx.id()),
            false,
        )
        .timestamp(serenity::Timestamp::now());

    send_log(ctx, data.config.log_channels.commands, embed, attachment).await;
}

/// `Nome / ID / Dono` lines for the guild a command ran in.
fn guild_summary(ctx: Context<'_>) -> Option<String> {
    let guild = ctx.guild()?;
    Some(format!(
        "\\> Nome: {}\n\\> ID: {}\n\\> Dono: <@{}>",
        guild.name, guild.id, guild.owner_id
    ))
}
