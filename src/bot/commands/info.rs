//! Information commands - avatars, user profiles and the oldest members.

use crate::{bot::Context, config::Badge, core::i18n::Translator, errors::Result};
use poise::serenity_prelude as serenity;

/// Lines per `oldmembers` page
const MEMBERS_PER_PAGE: usize = 10;
/// Members fetched per request, the API maximum
const MEMBERS_PER_REQUEST: u64 = 1000;

/// Avatar download links for each format, gif only for animated avatars.
fn avatar_links(user_id: u64, hash: &str, animated: bool) -> Vec<(&'static str, String)> {
    let formats: &[&'static str] = if animated {
        &["png", "jpg", "webp", "gif"]
    } else {
        &["png", "jpg", "webp"]
    };
    formats
        .iter()
        .map(|format| {
            (
                *format,
                format!("https://cdn.discordapp.com/avatars/{user_id}/{hash}.{format}?size=1024"),
            )
        })
        .collect()
}

/// Discord timestamp markup shown in the reader's timezone.
fn discord_time(timestamp: serenity::Timestamp) -> String {
    format!("<t:{}:f>", timestamp.unix_timestamp())
}

fn badge_line(t: &Translator, badge: Badge) -> String {
    match badge {
        Badge::Developer => format!("💻 {}", t.t("info.developer")),
        Badge::Translator => format!("📖 {}", t.t("info.translator")),
        Badge::Vip => format!("⭐ {}", t.t("info.vip")),
    }
}

/// `1º` - `name#0001`, with the author's own line marked.
fn member_lines(members: &[(u64, String)], author_id: u64, you: &str) -> Vec<String> {
    members
        .iter()
        .enumerate()
        .map(|(index, (user_id, tag))| {
            let marker = if *user_id == author_id {
                format!(" - {you}")
            } else {
                String::new()
            };
            format!("`{}º` — `{tag}`{marker}", index + 1)
        })
        .collect()
}

/// Every member of the guild, requested in pages.
async fn fetch_members(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
) -> Result<Vec<serenity::Member>> {
    let mut members = Vec::new();
    let mut after = None;
    loop {
        let batch = guild_id
            .members(ctx.http(), Some(MEMBERS_PER_REQUEST), after)
            .await?;
        let full = batch.len() as u64 == MEMBERS_PER_REQUEST;
        after = batch.last().map(|member| member.user.id);
        members.extend(batch);
        if !full {
            return Ok(members);
        }
    }
}

/// Embed showing a user's avatar with links to every format.
fn avatar_embed(
    ctx: Context<'_>,
    t: &Translator,
    user: &serenity::User,
) -> serenity::CreateEmbed {
    let name = user.tag();
    let author = serenity::CreateEmbedAuthor::new(t.f("info.avatar_of", &[("member", &name)]));
    let embed = ctx.data().embed().author(author);

    let Some(hash) = &user.avatar else {
        return embed.image(user.default_avatar_url());
    };
    let animated = hash.is_animated();
    let links = avatar_links(user.id.get(), &hash.to_string(), animated);
    let description = links
        .iter()
        .map(|(format, url)| format!("[{format}]({url})"))
        .collect::<Vec<_>>()
        .join(" | ");
    let shown = if animated { "gif" } else { "png" };
    let image = links
        .iter()
        .find(|(format, _)| *format == shown)
        .map_or_else(|| user.face(), |(_, url)| url.clone());
    embed.description(description).image(image)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{
        MEMBERS_PER_PAGE, avatar_embed, badge_line, discord_time, fetch_members, member_lines,
    };
    use crate::{
        bot::{Context, pagination, translator},
        core::i18n::ListStyle,
        errors::Result,
    };
    use futures::StreamExt;
    use poise::{CreateReply, serenity_prelude as serenity};
    use rand::seq::IndexedRandom;
    use std::{pin::pin, time::Duration};

    /// How long the permissions toggle stays active
    const TOGGLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Shows a user's avatar. The user doesn't need to be in the server.
    #[poise::command(prefix_command, category = "info", subcommands("avatar_random"))]
    pub async fn avatar(
        ctx: Context<'_>,
        #[description = "User whose avatar to show"] user: Option<serenity::User>,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let embed = avatar_embed(ctx, &t, user);
        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows a random avatar.
    #[poise::command(prefix_command, guild_only, rename = "random")]
    pub async fn avatar_random(ctx: Context<'_>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;
        let members = fetch_members(ctx, guild_id).await?;
        let Some(member) = members.choose(&mut rand::rng()) else {
            ctx.say(t.t("info.no_members")).await?;
            return Ok(());
        };
        let embed = avatar_embed(ctx, &t, &member.user);
        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows information about a user.
    #[poise::command(slash_command, prefix_command, category = "info", aliases("ui"))]
    pub async fn userinfo(
        ctx: Context<'_>,
        #[description = "User to look up"] user: Option<serenity::User>,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let data = ctx.data();
        let user = user.as_ref().unwrap_or_else(|| ctx.author());
        let member = match ctx.guild_id() {
            Some(guild_id) => guild_id.member(ctx, user.id).await.ok(),
            None => None,
        };

        let badges: Vec<String> = data
            .config
            .flags
            .badges_for(user.id.get())
            .into_iter()
            .map(|badge| badge_line(&t, badge))
            .collect();

        let mut info = data
            .embed()
            .author(serenity::CreateEmbedAuthor::new(user.tag()).icon_url(user.face()))
            .thumbnail(user.face())
            .field(t.t("info.created_at"), discord_time(user.created_at()), false);
        if !badges.is_empty() {
            info = info.description(badges.join("\n"));
        }

        let Some(member) = member else {
            ctx.send(CreateReply::default().embed(info)).await?;
            return Ok(());
        };

        if let Some(joined_at) = member.joined_at {
            info = info.field(t.t("info.joined_at"), discord_time(joined_at), false);
        }
        if let Some(premium_since) = member.premium_since {
            info = info.field(t.t("info.boosting_since"), discord_time(premium_since), false);
        }
        let roles = if member.roles.is_empty() {
            t.t("common.none_male")
        } else {
            member
                .roles
                .iter()
                .map(|role| format!("<@&{role}>"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        info = info.field(t.t("info.roles"), roles, false);

        let channel_id = ctx.channel_id();
        let permissions = ctx.guild().and_then(|guild| {
            guild
                .channels
                .get(&channel_id)
                .map(|channel| guild.user_permissions_in(channel, &member))
        });
        let Some(permissions) = permissions else {
            ctx.send(CreateReply::default().embed(info)).await?;
            return Ok(());
        };
        let names = t.list(t.permission_names(permissions), ListStyle::And);
        let perms = data
            .embed()
            .author(serenity::CreateEmbedAuthor::new(user.tag()).icon_url(user.face()))
            .field(t.t("info.permissions"), format!("```\n{names}\n```"), false);

        let toggle_id = format!("{}perms", ctx.id());
        let button = || {
            vec![serenity::CreateActionRow::Buttons(vec![
                serenity::CreateButton::new(&toggle_id)
                    .emoji('🛡')
                    .style(serenity::ButtonStyle::Secondary),
            ])]
        };
        let handle = ctx
            .send(CreateReply::default().embed(info.clone()).components(button()))
            .await?;

        let author_id = ctx.author().id;
        let mut showing_permissions = false;
        let filter_id = toggle_id.clone();
        let presses = serenity::ComponentInteractionCollector::new(ctx)
            .author_id(author_id)
            .filter(move |press| press.data.custom_id == filter_id)
            .timeout(TOGGLE_TIMEOUT)
            .stream();
        let mut presses = pin!(presses);
        while let Some(press) = presses.next().await {
            showing_permissions = !showing_permissions;
            let embed = if showing_permissions { perms.clone() } else { info.clone() };
            press
                .create_response(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new().embed(embed),
                    ),
                )
                .await?;
        }

        let embed = if showing_permissions { perms } else { info };
        handle
            .edit(ctx, CreateReply::default().embed(embed).components(Vec::new()))
            .await?;
        Ok(())
    }

    /// Shows the oldest members of the server.
    #[poise::command(slash_command, prefix_command, category = "info", guild_only)]
    pub async fn oldmembers(ctx: Context<'_>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;
        ctx.defer_or_broadcast().await?;

        let mut members = fetch_members(ctx, guild_id).await?;
        members.sort_by_key(|member| {
            member
                .joined_at
                .map_or(i64::MAX, |joined_at| joined_at.unix_timestamp())
        });
        let members: Vec<(u64, String)> = members
            .iter()
            .map(|member| (member.user.id.get(), member.user.tag()))
            .collect();

        let lines = member_lines(&members, ctx.author().id.get(), &t.t("common.you"));
        let pages = pagination::chunk_pages(&lines, MEMBERS_PER_PAGE);
        if pages.is_empty() {
            ctx.say(t.t("info.no_members")).await?;
            return Ok(());
        }

        let total = pages.len();
        let embeds: Vec<serenity::CreateEmbed> = pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let current = index + 1;
                ctx.data()
                    .embed()
                    .title(t.t("info.oldmembers_title"))
                    .description(page)
                    .footer(serenity::CreateEmbedFooter::new(t.f(
                        "common.page",
                        &[("current", &current), ("max", &total)],
                    )))
            })
            .collect();
        pagination::paginate(ctx, &embeds).await
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_translator;

    #[test]
    fn test_avatar_links_add_gif_when_animated() {
        let still = avatar_links(1, "abc", false);
        assert_eq!(still.len(), 3);
        assert_eq!(
            still[0].1,
            "https://cdn.discordapp.com/avatars/1/abc.png?size=1024"
        );

        let animated = avatar_links(1, "a_abc", true);
        assert_eq!(animated.last().map(|(format, _)| *format), Some("gif"));
    }

    #[test]
    fn test_member_lines_mark_the_author() {
        let members = vec![(1, "first#0001".to_string()), (2, "second#0002".to_string())];
        let lines = member_lines(&members, 2, "You");
        assert_eq!(lines[0], "`1º` — `first#0001`");
        assert_eq!(lines[1], "`2º` — `second#0002` - You");
    }

    #[test]
    fn test_badge_lines_are_localized() {
        let t = test_translator("pt_BR");
        assert!(badge_line(&t, Badge::Vip).starts_with("⭐ "));
        let t = test_translator("en_US");
        assert_eq!(badge_line(&t, Badge::Developer), "💻 Developer");
    }
}
