//! Moderation commands - purging, channel locks, bans, mutes and the guild's
//! language and prefixes.
//!
//! Every command here is guild-only. Commands acting on a member check the
//! role hierarchy for both the author and the bot before touching Discord.

use crate::{
    bot::Context,
    core::{
        i18n::Translator,
        moderation::{self, OverwriteBits, Rank},
        settings::{MAX_PREFIX_LEN, MAX_PREFIXES},
        text,
    },
    errors::{PrefixRejection, Result},
};
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// How long the purge report stays in the channel
const CLEAR_REPORT_TTL: Duration = Duration::from_secs(3);
/// Discord caps audit log reasons at this many characters
const AUDIT_REASON_LIMIT: usize = 512;

/// A fetched message reduced to what the purge filter needs.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: u64,
    author_id: u64,
    created_at: i64,
}

/// Picks up to `count` messages to purge, newest first.
///
/// Skips the invoking message, messages by other authors when `author_id` is
/// set and messages too old to bulk delete.
fn pick_messages(
    candidates: &[Candidate],
    skip: Option<u64>,
    author_id: Option<u64>,
    count: usize,
    now: i64,
) -> Vec<u64> {
    candidates
        .iter()
        .filter(|message| Some(message.id) != skip)
        .filter(|message| author_id.is_none_or(|author| message.author_id == author))
        .filter(|message| moderation::bulk_deletable(message.created_at, now))
        .take(count)
        .map(|message| message.id)
        .collect()
}

/// Reply explaining why a prefix change was refused.
fn rejection_message(t: &Translator, reason: PrefixRejection) -> String {
    match reason {
        PrefixRejection::Reserved => t.t("prefix.reserved"),
        PrefixRejection::TooLong => t.f("prefix.too_long", &[("max", &MAX_PREFIX_LEN)]),
        PrefixRejection::LimitReached => t.f("prefix.limit_reached", &[("max", &MAX_PREFIXES)]),
        PrefixRejection::Duplicate => t.t("prefix.duplicate"),
        PrefixRejection::NotInUse => t.t("prefix.not_in_use"),
    }
}

/// Where a member stands in the cached role hierarchy.
fn rank_of(ctx: Context<'_>, member: &serenity::Member) -> Rank {
    Rank {
        user_id: member.user.id.get(),
        top_role_position: member
            .highest_role_info(ctx.cache())
            .map_or(0, |(_, position)| position),
    }
}

/// The refusal to send when the author or the bot may not act on `target`.
async fn hierarchy_refusal(
    ctx: Context<'_>,
    t: &Translator,
    target: &serenity::Member,
) -> Result<Option<String>> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(None);
    };
    let cached_owner = ctx.guild().map(|guild| guild.owner_id);
    let owner_id = match cached_owner {
        Some(owner_id) => owner_id,
        None => guild_id.to_partial_guild(ctx).await?.owner_id,
    };
    let owner_id = owner_id.get();
    let target_rank = rank_of(ctx, target);
    let name = target.user.tag();

    if let Some(author) = ctx.author_member().await {
        if !moderation::can_modify(owner_id, rank_of(ctx, &author), target_rank) {
            return Ok(Some(member_reply(t, "moderation.you_cannot", &name, None)));
        }
    }

    let bot_id = ctx.cache().current_user().id;
    let bot = guild_id.member(ctx, bot_id).await?;
    if !moderation::can_modify(owner_id, rank_of(ctx, &bot), target_rank) {
        return Ok(Some(member_reply(t, "moderation.i_cannot", &name, None)));
    }
    Ok(None)
}

/// A reply naming a member, with markdown in the name and reason escaped.
fn member_reply(t: &Translator, key: &str, tag: &str, reason: Option<&str>) -> String {
    let member = text::escape_text(tag);
    match reason {
        Some(reason) => {
            let reason = text::escape_text(reason);
            t.f(key, &[("member", &member), ("reason", &reason)])
        }
        None => t.f(key, &[("member", &member)]),
    }
}

/// Messages to remove once the purge report has been read.
fn clear_leftovers(
    report: serenity::MessageId,
    invoking: Option<u64>,
) -> Vec<serenity::MessageId> {
    std::iter::once(report)
        .chain(invoking.map(serenity::MessageId::new))
        .collect()
}

/// Audit log reason `By {author} | Reason: {reason}`.
fn audit_reason(ctx: Context<'_>, t: &Translator, reason: &str) -> String {
    let author = ctx.author().tag();
    let line = t.f(
        "common.by_author_reason",
        &[("author", &author), ("reason", &reason)],
    );
    text::truncate(&line, AUDIT_REASON_LIMIT)
}

/// The guild's muted role, looked up by its localized name.
fn find_role(ctx: Context<'_>, name: &str) -> Option<serenity::RoleId> {
    ctx.guild().and_then(|guild| {
        guild
            .roles
            .values()
            .find(|role| role.name == name)
            .map(|role| role.id)
    })
}

/// Applies `compute` to the @everyone overwrite of the current channel.
///
/// Returns the key of the reply to send.
async fn set_lock(
    ctx: Context<'_>,
    compute: fn(Option<OverwriteBits>) -> std::result::Result<OverwriteBits, moderation::LockError>,
    done_key: &'static str,
) -> Result<&'static str> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(done_key);
    };
    let everyone = serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get()));
    let channel_id = ctx.channel_id();

    let existing = channel_id
        .to_channel(ctx)
        .await?
        .guild()
        .and_then(|channel| {
            channel
                .permission_overwrites
                .iter()
                .find(|overwrite| overwrite.kind == everyone)
                .map(|overwrite| OverwriteBits {
                    allow: overwrite.allow,
                    deny: overwrite.deny,
                })
        });

    match compute(existing) {
        Ok(bits) => {
            channel_id
                .create_permission(
                    ctx,
                    serenity::PermissionOverwrite {
                        allow: bits.allow,
                        deny: bits.deny,
                        kind: everyone,
                    },
                )
                .await?;
            Ok(done_key)
        }
        Err(moderation::LockError::AlreadyLocked) => Ok("moderation.already_locked"),
        Err(moderation::LockError::AlreadyUnlocked) => Ok("moderation.already_unlocked"),
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{
        CLEAR_REPORT_TTL, Candidate, audit_reason, clear_leftovers, find_role, hierarchy_refusal,
        member_reply, pick_messages, rejection_message, set_lock,
    };
    use crate::{
        bot::{Context, translator},
        core::{
            i18n::{ListStyle, Translator},
            moderation::{self, MAX_CLEAR, MIN_CLEAR},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::sync::Arc;
    use tracing::{info, warn};

    /// Deletes recent messages in the channel.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        aliases("purge"),
        required_permissions = "MANAGE_MESSAGES",
        required_bot_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn clear(
        ctx: Context<'_>,
        #[description = "How many messages to delete"] count: Option<u64>,
        #[description = "Only delete messages from this member"] member: Option<serenity::Member>,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let count = count.unwrap_or(u64::from(MAX_CLEAR));
        let Some(count) = u8::try_from(count)
            .ok()
            .filter(|count| moderation::clear_count_in_range(*count))
        else {
            ctx.say(t.f(
                "errors.not_in_range",
                &[("min", &MIN_CLEAR), ("max", &MAX_CLEAR)],
            ))
            .await?;
            return Ok(());
        };

        let invoking = match ctx {
            poise::Context::Prefix(prefix) => Some(prefix.msg.id.get()),
            poise::Context::Application(_) => None,
        };
        let channel_id = ctx.channel_id();
        let fetched = channel_id
            .messages(ctx, serenity::GetMessages::new().limit(MAX_CLEAR))
            .await?;
        let candidates: Vec<Candidate> = fetched
            .iter()
            .map(|message| Candidate {
                id: message.id.get(),
                author_id: message.author.id.get(),
                created_at: message.timestamp.unix_timestamp(),
            })
            .collect();
        let ids: Vec<serenity::MessageId> = pick_messages(
            &candidates,
            invoking,
            member.as_ref().map(|member| member.user.id.get()),
            usize::from(count),
            serenity::Timestamp::now().unix_timestamp(),
        )
        .into_iter()
        .map(serenity::MessageId::new)
        .collect();

        match ids.as_slice() {
            [] => {}
            [only] => channel_id.delete_message(ctx.http(), *only).await?,
            _ => channel_id.delete_messages(ctx.http(), &ids).await?,
        }
        info!("Deleted {} messages in channel {channel_id}", ids.len());

        let report = ctx
            .say(t.f("moderation.deleted_messages", &[("count", &ids.len())]))
            .await?
            .message()
            .await?
            .id;
        tokio::time::sleep(CLEAR_REPORT_TTL).await;
        for message_id in clear_leftovers(report, invoking) {
            if let Err(e) = channel_id.delete_message(ctx.http(), message_id).await {
                warn!("Failed to delete message {message_id} after purge: {e}");
            }
        }
        Ok(())
    }

    /// Locks the channel for @everyone.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "MANAGE_CHANNELS",
        required_bot_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn lock(ctx: Context<'_>) -> Result<()> {
        let key = set_lock(ctx, moderation::lock_overwrite, "moderation.locked").await?;
        ctx.say(translator(ctx).await.t(key)).await?;
        Ok(())
    }

    /// Unlocks the channel for @everyone.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "MANAGE_CHANNELS",
        required_bot_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn unlock(ctx: Context<'_>) -> Result<()> {
        let key = set_lock(ctx, moderation::unlock_overwrite, "moderation.unlocked").await?;
        ctx.say(translator(ctx).await.t(key)).await?;
        Ok(())
    }

    /// Bans a user, member of the server or not.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "BAN_MEMBERS",
        required_bot_permissions = "BAN_MEMBERS"
    )]
    pub async fn ban(
        ctx: Context<'_>,
        #[description = "User to ban"] user: serenity::User,
        #[rest]
        #[description = "Why the user is banned"]
        reason: Option<String>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;
        let reason = reason.unwrap_or_else(|| t.t("common.not_specified"));

        if let Ok(member) = guild_id.member(ctx, user.id).await {
            if let Some(refusal) = hierarchy_refusal(ctx, &t, &member).await? {
                ctx.say(refusal).await?;
                return Ok(());
            }
        }

        let audit = audit_reason(ctx, &t, &reason);
        guild_id
            .ban_with_reason(ctx.http(), user.id, 0, &audit)
            .await?;
        info!("{} banned {} from guild {guild_id}", ctx.author().id, user.id);

        let reply = member_reply(&t, "moderation.banned", &user.tag(), Some(&reason));
        ctx.say(reply).await?;
        Ok(())
    }

    /// Removes a user's ban.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "BAN_MEMBERS",
        required_bot_permissions = "BAN_MEMBERS"
    )]
    pub async fn unban(
        ctx: Context<'_>,
        #[description = "User to unban"] user: serenity::User,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;

        let reply = match guild_id.unban(ctx.http(), user.id).await {
            Ok(()) => member_reply(&t, "moderation.unbanned", &user.tag(), None),
            Err(serenity::Error::Http(e))
                if e.status_code().map(|status| status.as_u16()) == Some(404) =>
            {
                t.t("moderation.not_banned")
            }
            Err(e) => return Err(e.into()),
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Mutes a member, creating the muted role when needed.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "MANAGE_ROLES",
        required_bot_permissions = "MANAGE_ROLES | MANAGE_CHANNELS"
    )]
    pub async fn mute(
        ctx: Context<'_>,
        #[description = "Member to mute"] member: serenity::Member,
        #[rest]
        #[description = "Why the member is muted"]
        reason: Option<String>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;
        let reason = reason.unwrap_or_else(|| t.t("common.not_specified"));

        if let Some(refusal) = hierarchy_refusal(ctx, &t, &member).await? {
            ctx.say(refusal).await?;
            return Ok(());
        }

        let role_name = t.t("moderation.muted_role");
        let role_id = match find_role(ctx, &role_name) {
            Some(role_id) => role_id,
            None => create_muted_role(ctx, &t, guild_id, &role_name).await?,
        };

        let audit = audit_reason(ctx, &t, &reason);
        ctx.http()
            .add_member_role(guild_id, member.user.id, role_id, Some(&audit))
            .await?;

        let reply = member_reply(&t, "moderation.muted", &member.user.tag(), Some(&reason));
        ctx.say(reply).await?;
        Ok(())
    }

    /// Creates the muted role and denies its permissions in every channel.
    ///
    /// The channel overwrites are applied in the background.
    async fn create_muted_role(
        ctx: Context<'_>,
        t: &Translator,
        guild_id: serenity::GuildId,
        name: &str,
    ) -> Result<serenity::RoleId> {
        let role = guild_id
            .create_role(
                ctx,
                serenity::EditRole::new()
                    .name(name)
                    .colour(moderation::MUTED_ROLE_COLOUR)
                    .permissions(serenity::Permissions::empty())
                    .audit_log_reason(&t.t("moderation.creating_muted_role")),
            )
            .await?;
        info!("Created muted role {} in guild {guild_id}", role.id);

        let channels: Vec<serenity::ChannelId> =
            guild_id.channels(ctx.http()).await?.into_keys().collect();
        let http = Arc::clone(&ctx.serenity_context().http);
        let role_id = role.id;
        tokio::spawn(async move {
            let overwrite = serenity::PermissionOverwrite {
                allow: serenity::Permissions::empty(),
                deny: moderation::muted_denied_permissions(),
                kind: serenity::PermissionOverwriteType::Role(role_id),
            };
            for channel_id in channels {
                if let Err(e) = channel_id.create_permission(&*http, overwrite.clone()).await {
                    warn!("Failed to deny muted permissions in channel {channel_id}: {e}");
                }
            }
        });

        Ok(role_id)
    }

    /// Removes the muted role from a member.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        required_permissions = "MANAGE_ROLES",
        required_bot_permissions = "MANAGE_ROLES"
    )]
    pub async fn unmute(
        ctx: Context<'_>,
        #[description = "Member to unmute"] member: serenity::Member,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;

        if let Some(refusal) = hierarchy_refusal(ctx, &t, &member).await? {
            ctx.say(refusal).await?;
            return Ok(());
        }

        let role_name = t.t("moderation.muted_role");
        let Some(role_id) = find_role(ctx, &role_name) else {
            ctx.say(t.f("moderation.muted_role_not_found", &[("role", &role_name)]))
                .await?;
            return Ok(());
        };

        let author = ctx.author().tag();
        let audit = t.f("common.by_author", &[("author", &author)]);
        ctx.http()
            .remove_member_role(guild_id, member.user.id, role_id, Some(&audit))
            .await?;

        let reply = member_reply(&t, "moderation.unmuted", &member.user.tag(), None);
        ctx.say(reply).await?;
        Ok(())
    }

    /// Changes the server language.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "moderation",
        guild_only,
        aliases("setlang"),
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn lang(
        ctx: Context<'_>,
        #[description = "New language"]
        #[autocomplete = "crate::bot::handlers::autocomplete::autocomplete_language"]
        language: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let data = ctx.data();
        let t = translator(ctx).await;

        let Some(language) = data.catalogs.normalize(&language) else {
            let languages = t.list(
                data.catalogs.languages().iter().map(|l| format!("`{l}`")),
                ListStyle::Or,
            );
            ctx.say(t.f("language.choose", &[("languages", &languages)]))
                .await?;
            return Ok(());
        };

        if language == t.language() {
            ctx.say(t.t("language.already_in_use")).await?;
            return Ok(());
        }

        data.settings
            .set_language(guild_id.get(), language, data.catalogs.default_language())
            .await?;
        info!("Guild {guild_id} switched language to {language}");

        let t = Translator::new(Arc::clone(&data.catalogs), language);
        ctx.say(t.f("language.changed", &[("lang", &language)]))
            .await?;
        Ok(())
    }

    /// Commands related to the server prefix.
    #[poise::command(
        prefix_command,
        category = "moderation",
        guild_only,
        aliases("prefixo"),
        subcommands("prefix_add", "prefix_remove")
    )]
    pub async fn prefix(ctx: Context<'_>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let data = ctx.data();
        let t = translator(ctx).await;

        let prefixes = data
            .settings
            .prefixes_for(guild_id.get(), &data.config.prefixes)
            .await?;
        let bot_id = ctx.cache().current_user().id;
        let shown = std::iter::once(format!("<@{bot_id}>"))
            .chain(prefixes.iter().map(|prefix| format!("`{prefix}`")));
        let list = t.list(shown, ListStyle::And);
        ctx.say(t.f("prefix.list", &[("prefixes", &list)])).await?;
        Ok(())
    }

    /// Adds a prefix to the server.
    #[poise::command(
        prefix_command,
        guild_only,
        rename = "add",
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn prefix_add(
        ctx: Context<'_>,
        #[rest]
        #[description = "Prefix to add"]
        prefix: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;

        let reply = match ctx.data().settings.add_prefix(guild_id.get(), &prefix).await {
            Ok(_) => t.f("prefix.added", &[("prefix", &prefix)]),
            Err(Error::InvalidPrefix { reason, .. }) => rejection_message(&t, reason),
            Err(e) => return Err(e),
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Removes a prefix from the server.
    #[poise::command(
        prefix_command,
        guild_only,
        rename = "remove",
        aliases("rm"),
        required_permissions = "MANAGE_GUILD"
    )]
    pub async fn prefix_remove(
        ctx: Context<'_>,
        #[rest]
        #[description = "Prefix to remove"]
        prefix: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        let t = translator(ctx).await;

        let reply = match ctx
            .data()
            .settings
            .remove_prefix(guild_id.get(), &prefix)
            .await
        {
            Ok(_) => t.f("prefix.removed", &[("prefix", &prefix)]),
            Err(Error::InvalidPrefix { reason, .. }) => rejection_message(&t, reason),
            Err(e) => return Err(e),
        };
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_translator;

    const NOW: i64 = 1_700_000_000;

    fn candidate(id: u64, author_id: u64, age: i64) -> Candidate {
        Candidate {
            id,
            author_id,
            created_at: NOW - age,
        }
    }

    #[test]
    fn test_pick_messages_skips_invoking_message() {
        let candidates = [candidate(5, 1, 0), candidate(4, 2, 10), candidate(3, 1, 20)];
        assert_eq!(pick_messages(&candidates, Some(5), None, 2, NOW), vec![4, 3]);
    }

    #[test]
    fn test_pick_messages_filters_author_and_age() {
        let candidates = [
            candidate(5, 1, 0),
            candidate(4, 2, 10),
            candidate(3, 1, 20),
            candidate(2, 1, moderation::BULK_DELETE_MAX_AGE + 1),
        ];
        assert_eq!(pick_messages(&candidates, None, Some(1), 100, NOW), vec![5, 3]);
    }

    #[test]
    fn test_member_replies_escape_markdown() {
        let t = test_translator("en_US");
        assert_eq!(
            member_reply(&t, "moderation.banned", "bad**guy", Some("spam @everyone")),
            "**bad\\*\\*guy** banned for **spam @\u{200B}everyone**."
        );
        assert_eq!(
            member_reply(&t, "moderation.unmuted", "under_score", None),
            "**under\\_score** unmuted."
        );
    }

    #[test]
    fn test_clear_leftovers_include_invoking_message() {
        let report = serenity::MessageId::new(10);
        assert_eq!(
            clear_leftovers(report, Some(9)),
            vec![report, serenity::MessageId::new(9)]
        );
        assert_eq!(clear_leftovers(report, None), vec![report]);
    }

    #[test]
    fn test_rejection_messages_carry_limits() {
        let t = test_translator("en_US");
        assert_eq!(
            rejection_message(&t, PrefixRejection::TooLong),
            "The prefix can have at most 5 characters."
        );
        assert_eq!(
            rejection_message(&t, PrefixRejection::LimitReached),
            "The limit of 3 prefixes was reached."
        );
        assert_eq!(
            rejection_message(&t, PrefixRejection::NotInUse),
            "This prefix is not in use."
        );
    }
}
