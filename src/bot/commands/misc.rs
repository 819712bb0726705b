//! Miscellaneous commands - latency, privacy policy and bot information.

use crate::core::text::format_bytes;
use std::sync::PoisonError;
use std::time::Duration;

/// Memory and CPU use of this process, when the OS reports them.
fn process_usage(system: &std::sync::Mutex<sysinfo::System>) -> Option<(u64, f32)> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = system.lock().unwrap_or_else(PoisonError::into_inner);
    system.refresh_process(pid);
    let process = system.process(pid)?;
    Some((process.memory(), process.cpu_usage()))
}

/// Uptime rounded down to whole seconds, formatted like `1day 2h 3m 4s`.
fn format_uptime(uptime: Duration) -> String {
    humantime::format_duration(Duration::from_secs(uptime.as_secs())).to_string()
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_bytes, format_uptime, process_usage};
    use crate::{
        bot::{Context, bot_author, translator},
        errors::Result,
    };
    use poise::CreateReply;
    use std::time::Instant;

    /// Sends the websocket latency, the database latency and the response time.
    #[poise::command(slash_command, prefix_command, category = "misc")]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        let t = translator(ctx).await;
        let unknown = "NaN";
        let placeholder = t.f(
            "misc.ping",
            &[
                ("websocket", &unknown),
                ("database", &unknown),
                ("response", &unknown),
            ],
        );

        let start = Instant::now();
        let handle = ctx.say(placeholder).await?;
        let response = start.elapsed().as_millis();
        let database = ctx.data().settings.ping().await?.as_millis();
        let websocket = ctx.ping().await.as_millis();

        let content = t.f(
            "misc.ping",
            &[
                ("websocket", &websocket),
                ("database", &database),
                ("response", &response),
            ],
        );
        handle
            .edit(ctx, CreateReply::default().content(content))
            .await?;
        Ok(())
    }

    /// Privacy policy.
    #[poise::command(slash_command, prefix_command, category = "misc", aliases("privacidade"))]
    pub async fn privacy(ctx: Context<'_>) -> Result<()> {
        let t = translator(ctx).await;
        let data = ctx.data();

        let author = bot_author(ctx, t.t("misc.privacy_title"));
        let description = format!(
            "{}\n{}",
            t.f(
                "misc.privacy_link",
                &[("policy", &data.config.privacy_policy_url)]
            ),
            t.t("misc.privacy_disagree"),
        );

        ctx.send(CreateReply::default().embed(data.embed().author(author).description(description)))
            .await?;
        Ok(())
    }

    /// Information about me.
    #[poise::command(slash_command, prefix_command, category = "misc", aliases("bi"))]
    pub async fn botinfo(ctx: Context<'_>) -> Result<()> {
        let t = translator(ctx).await;
        let data = ctx.data();

        let uptime = data
            .started_at
            .get()
            .map_or_else(|| "?".to_string(), |start| format_uptime(start.elapsed()));
        let commands = ctx.framework().options().commands.len();
        let guilds = ctx.cache().guild_count();

        let stats = format!(
            "{}\n{}",
            t.f("misc.commands_count", &[("commands", &commands)]),
            t.f("misc.guilds_count", &[("guilds", &guilds)]),
        );
        let resources = match process_usage(&data.system_info) {
            Some((memory, cpu)) => {
                let memory = format_bytes(memory);
                let cpu = format!("{cpu:.1}");
                format!(
                    "{}\n{}",
                    t.f("misc.memory", &[("mem", &memory)]),
                    t.f("misc.cpu", &[("percent", &cpu)]),
                )
            }
            None => "?".to_string(),
        };

        let author = bot_author(ctx, t.t("misc.botinfo_title"));
        let embed = data
            .embed()
            .author(author)
            .field(t.t("misc.who_am_i_title"), t.t("misc.who_am_i"), false)
            .field(t.t("misc.online_for_title"), format!("{uptime}."), false)
            .field(t.t("misc.have_title"), stats, false)
            .field(t.t("misc.resources_title"), resources, false);

        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime_drops_subseconds() {
        assert_eq!(format_uptime(Duration::from_millis(3_723_900)), "1h 2m 3s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1day 1h 1m 1s");
    }

    #[test]
    fn test_process_usage_reports_memory() {
        let system = std::sync::Mutex::new(sysinfo::System::new());
        if let Some((memory, cpu)) = process_usage(&system) {
            assert!(memory > 0);
            assert!(cpu >= 0.0);
        }
    }
}
