//! Framework construction and client start-up.

use crate::{
    bot::{BotData, commands, handlers},
    errors::Result,
};
use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

type Command = poise::Command<BotData, crate::errors::Error>;

/// Every command the bot registers, in help order, with qualified names set.
#[must_use]
pub fn all_commands() -> Vec<Command> {
    let mut commands = vec![
        // Miscellaneous
        commands::ping(),
        commands::privacy(),
        commands::botinfo(),
        commands::help(),
        // Information
        commands::avatar(),
        commands::userinfo(),
        commands::oldmembers(),
        // Moderation
        commands::clear(),
        commands::lock(),
        commands::unlock(),
        commands::ban(),
        commands::unban(),
        commands::mute(),
        commands::unmute(),
        commands::lang(),
        commands::prefix(),
        // Fun
        commands::ttt(),
        commands::tttreact(),
        // Utilities
        commands::roll(),
        commands::bf(),
        commands::morse(),
        commands::vaporwave(),
        commands::resolve(),
    ];
    qualify(&mut commands, None);
    commands
}

/// Sets `qualified_name` to the full `parent child` path.
fn qualify(commands: &mut [Command], parent: Option<&str>) {
    for command in commands {
        if let Some(parent) = parent {
            command.qualified_name = format!("{parent} {}", command.name);
        }
        let name = command.qualified_name.clone();
        qualify(&mut command.subcommands, Some(&name));
    }
}

/// Gateway intents the bot needs: guild state, messages, reactions, members
/// and message content for prefix commands.
#[must_use]
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
}

/// Builds the framework and runs the client until it stops.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                stripped_dynamic_prefix: Some(|ctx, msg, data| {
                    Box::pin(handlers::prefix::strip_prefix(ctx, msg, data))
                }),
                mention_as_prefix: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(handlers::errors::on_error(error)),
            pre_command: |ctx| Box::pin(handlers::events::log_command(ctx)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents())
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}
