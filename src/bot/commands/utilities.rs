//! Utility commands - dice, Brainfuck, Morse code, vaporwave text and
//! redirect resolution.

use crate::core::{redirects::Hop, text};

/// Characters of program output shown before it is cut
const OUTPUT_LIMIT: usize = 1900;

/// One line per hop; the first and last hops are highlighted.
fn format_hops(hops: &[Hop]) -> String {
    let last = hops.len().saturating_sub(1);
    hops.iter()
        .enumerate()
        .map(|(index, hop)| {
            let marker = if index == 0 || index == last { "🔷" } else { "🔹" };
            format!("{marker} `{}` - {}", hop.status, hop.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Program output as a code block, cut to fit in a message.
fn format_output(output: &str) -> String {
    text::code_block(&text::truncate(output, OUTPUT_LIMIT))
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_hops, format_output};
    use crate::{
        bot::{Context, translator},
        core::{brainfuck, redirects, text},
        errors::{Error, Result},
    };
    use poise::{CreateReply, serenity_prelude as serenity};
    use tracing::debug;

    /// Rolls a die.
    #[poise::command(slash_command, prefix_command, category = "utilities", aliases("dado"))]
    pub async fn roll(
        ctx: Context<'_>,
        #[description = "Number of sides"] sides: u64,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let reply = match text::roll_die(sides) {
            Some(result) => t.f("utilities.roll_result", &[("result", &result)]),
            None => t.t("utilities.roll_min_sides"),
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Runs a Brainfuck program.
    #[poise::command(slash_command, prefix_command, category = "utilities", aliases("brainfuck"))]
    pub async fn bf(
        ctx: Context<'_>,
        #[rest]
        #[description = "Program, optionally in a code block, followed by its input"]
        program: String,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let (code, input) = text::split_program(&program);
        let (code, input) = (code.to_string(), input.to_string());

        let run = tokio::task::spawn_blocking(move || brainfuck::run(&code, &input)).await?;
        let reply = match run {
            Ok(output) if output.is_empty() => t.t("utilities.bf_no_output"),
            Ok(output) => format_output(&output),
            Err(Error::StepLimitExceeded { limit }) => {
                debug!("Brainfuck program stopped after {limit} steps");
                t.f("utilities.bf_step_limit", &[("limit", &limit)])
            }
            Err(e) => return Err(e),
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Morse code converter.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "utilities",
        subcommands("morse_encode", "morse_decode"),
        subcommand_required
    )]
    pub async fn morse(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Converts text to Morse code.
    #[poise::command(slash_command, prefix_command, rename = "encode", aliases("e"))]
    pub async fn morse_encode(
        ctx: Context<'_>,
        #[rest]
        #[description = "Text to convert"]
        text: String,
    ) -> Result<()> {
        let encoded = super::text::morse_encode(&text);
        send_converted(ctx, &encoded).await
    }

    /// Converts Morse code to text.
    #[poise::command(slash_command, prefix_command, rename = "decode", aliases("d"))]
    pub async fn morse_decode(
        ctx: Context<'_>,
        #[rest]
        #[description = "Morse code to convert"]
        code: String,
    ) -> Result<()> {
        let decoded = super::text::morse_decode(&code);
        send_converted(ctx, &decoded).await
    }

    async fn send_converted(ctx: Context<'_>, converted: &str) -> Result<()> {
        let reply = if converted.is_empty() {
            translator(ctx).await.t("utilities.morse_empty")
        } else {
            format_output(converted)
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Ｖａｐｏｒｗａｖｅ text.
    #[poise::command(slash_command, prefix_command, category = "utilities")]
    pub async fn vaporwave(
        ctx: Context<'_>,
        #[rest]
        #[description = "Text to convert"]
        text: String,
    ) -> Result<()> {
        let converted = super::text::vaporwave(&text);
        ctx.say(super::text::truncate(&converted, 2000)).await?;
        Ok(())
    }

    /// Shows every redirect of a link.
    #[poise::command(slash_command, prefix_command, category = "utilities", aliases("redirects"))]
    pub async fn resolve(
        ctx: Context<'_>,
        #[description = "Link to follow"] link: String,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let Ok(url) = redirects::parse_link(&link) else {
            ctx.say(t.t("utilities.invalid_link")).await?;
            return Ok(());
        };

        ctx.defer_or_broadcast().await?;
        let chain = match redirects::resolve(&ctx.data().http_client, url).await {
            Ok(chain) => chain,
            Err(Error::Http(e)) => {
                debug!("Failed to resolve {link}: {e}");
                let error = e.without_url().to_string();
                ctx.say(t.f("utilities.resolve_failed", &[("error", &error)]))
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let mut embed = ctx
            .data()
            .embed()
            .title(t.t("utilities.redirects"))
            .description(format_hops(&chain.hops));
        if chain.truncated {
            let note = t.f("utilities.redirects_truncated", &[("max", &redirects::MAX_HOPS)]);
            embed = embed.footer(serenity::CreateEmbedFooter::new(note));
        }
        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(status: u16, url: &str) -> Hop {
        Hop {
            status,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_format_hops_highlights_ends() {
        let hops = [
            hop(301, "http://a.test/"),
            hop(302, "https://a.test/"),
            hop(200, "https://b.test/"),
        ];
        assert_eq!(
            format_hops(&hops),
            "🔷 `301` - http://a.test/\n🔹 `302` - https://a.test/\n🔷 `200` - https://b.test/"
        );
        assert_eq!(format_hops(&hops[..1]), "🔷 `301` - http://a.test/");
    }

    #[test]
    fn test_code_block_program_runs_whole() {
        let (code, input) = text::split_program("```bf\n++++++++[>+++++++++<-]>.\n```");
        assert_eq!(crate::core::brainfuck::run(code, input).ok().as_deref(), Some("H"));

        let (code, input) = text::split_program("`,. ,. ,.` kai");
        assert_eq!(crate::core::brainfuck::run(code, input).ok().as_deref(), Some("kai"));
    }

    #[test]
    fn test_format_output_is_capped() {
        let long = "a".repeat(3000);
        let formatted = format_output(&long);
        assert!(formatted.starts_with("```\n"));
        assert!(formatted.chars().count() < 2000);
    }
}
