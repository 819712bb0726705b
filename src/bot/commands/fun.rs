//! Tic-tac-toe against another member, played with buttons (`ttt`) or with
//! reactions (`tttreact`).
//!
//! Both front-ends share the challenge rules and the registry of active
//! players in [`BotData`](crate::bot::BotData): the author plays X and moves
//! first. A game ends after 60 seconds without a valid move, and when the
//! channel moves on the board is sent again at the bottom.

use crate::{
    bot::Context,
    core::{
        i18n::Translator,
        tictactoe::{Board, Busy, Outcome, Player, Seats},
    },
    errors::Result,
};
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// Time without a valid move before the game ends
const GAME_TIMEOUT: Duration = Duration::from_secs(60);
/// Newer messages tolerated before the board is sent again
const ROLL_OVER_AFTER: u8 = 5;

const KEYCAPS: [&str; 9] = ["1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣"];

/// The board as emoji rows, free cells numbered with keycaps.
fn render_grid(board: &Board) -> String {
    board
        .cells()
        .chunks(3)
        .enumerate()
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(column, cell)| match cell {
                    Some(player) => player.symbol(),
                    None => KEYCAPS[row * 3 + column],
                })
                .collect::<Vec<_>>()
                .join("❕")
        })
        .collect::<Vec<_>>()
        .join("\n➖➕➖➕➖\n")
}

fn mention(user_id: u64) -> String {
    format!("<@{user_id}>")
}

/// Whose turn it is, who won, or draw.
fn status_line(t: &Translator, board: &Board, players: [u64; 2]) -> String {
    let player_of = |player: Player| mention(players[player.index()]);
    match board.outcome() {
        Some(Outcome::Winner(player)) => t.f("ttt.won", &[("player", &player_of(player))]),
        Some(Outcome::Draw) => t.t("ttt.draw"),
        None => t.f("ttt.turn", &[("player", &player_of(board.turn()))]),
    }
}

/// Board position of a keycap reaction.
fn keycap_position(emoji: &serenity::ReactionType) -> Option<usize> {
    match emoji {
        serenity::ReactionType::Unicode(name) => {
            KEYCAPS.iter().position(|keycap| *keycap == name.as_str())
        }
        _ => None,
    }
}

/// Board position of a reaction when it is the current player's keycap on
/// the live game message.
fn reaction_move(
    emoji: &serenity::ReactionType,
    (message_id, user_id): (serenity::MessageId, Option<serenity::UserId>),
    (game_message, player): (serenity::MessageId, serenity::UserId),
) -> Option<usize> {
    if message_id != game_message || user_id != Some(player) {
        return None;
    }
    keycap_position(emoji)
}

/// Board position encoded in a button ID `{prefix}-{position}`.
fn button_position(custom_id: &str, id_prefix: &str) -> Option<usize> {
    custom_id
        .strip_prefix(id_prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
        .filter(|position| *position < KEYCAPS.len())
}

fn unicode(emoji: &str) -> serenity::ReactionType {
    serenity::ReactionType::Unicode(emoji.to_string())
}

/// Three rows of three buttons; taken cells and finished games are disabled.
fn board_components(
    id_prefix: &str,
    board: &Board,
    finished: bool,
) -> Vec<serenity::CreateActionRow> {
    (0..3)
        .map(|row| {
            let buttons = (0..3)
                .map(|column| {
                    let position = row * 3 + column;
                    let button = serenity::CreateButton::new(format!("{id_prefix}-{position}"));
                    match board.cell(position) {
                        Some(player) => button
                            .emoji(unicode(player.symbol()))
                            .style(match player {
                                Player::X => serenity::ButtonStyle::Danger,
                                Player::O => serenity::ButtonStyle::Primary,
                            })
                            .disabled(true),
                        None => button
                            .emoji(unicode(KEYCAPS[position]))
                            .style(serenity::ButtonStyle::Secondary)
                            .disabled(finished),
                    }
                })
                .collect();
            serenity::CreateActionRow::Buttons(buttons)
        })
        .collect()
}

/// Validates a challenge and seats both players.
///
/// Sends the refusal and returns None when the game cannot start.
async fn seat_players<'a>(
    ctx: Context<'a>,
    t: &Translator,
    opponent: &serenity::User,
) -> Result<Option<Seats<'a>>> {
    let author = ctx.author();
    let refusal = if opponent.bot {
        t.t("ttt.opponent_is_bot")
    } else if opponent.id == author.id {
        t.t("ttt.against_yourself")
    } else {
        match ctx.data().games.try_seat(author.id.get(), opponent.id.get()) {
            Ok(seats) => return Ok(Some(seats)),
            Err(Busy::Author) => t.t("ttt.you_are_playing"),
            Err(Busy::Opponent) => {
                t.f("ttt.player_is_playing", &[("player", &mention(opponent.id.get()))])
            }
        }
    };
    ctx.say(refusal).await?;
    Ok(None)
}

/// Whether the channel moved on far enough to send the board again.
async fn buried(ctx: Context<'_>, message: &serenity::Message) -> Result<bool> {
    let newer = message
        .channel_id
        .messages(
            ctx,
            serenity::GetMessages::new()
                .after(message.id)
                .limit(ROLL_OVER_AFTER + 1),
        )
        .await?;
    Ok(newer.len() > usize::from(ROLL_OVER_AFTER))
}

/// Whether the bot may remove other members' reactions here.
fn bot_can_manage_messages(ctx: Context<'_>) -> bool {
    let bot_id = ctx.cache().current_user().id;
    let channel_id = ctx.channel_id();
    ctx.guild().is_some_and(|guild| {
        let Some(channel) = guild.channels.get(&channel_id) else {
            return false;
        };
        guild.members.get(&bot_id).is_some_and(|member| {
            guild
                .user_permissions_in(channel, member)
                .contains(serenity::Permissions::MANAGE_MESSAGES)
        })
    })
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{
        GAME_TIMEOUT, KEYCAPS, board_components, bot_can_manage_messages, button_position, buried,
        reaction_move, render_grid, seat_players, status_line,
    };
    use crate::{
        bot::{Context, translator},
        core::tictactoe::Board,
        errors::Result,
    };
    use futures::StreamExt;
    use poise::{CreateReply, serenity_prelude as serenity};
    use std::pin::pin;
    use tokio::time::{Instant, timeout_at};
    use tracing::{debug, warn};

    /// Plays tic-tac-toe with buttons.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "fun",
        guild_only,
        aliases("tictactoe", "jogodavelha", "jdv")
    )]
    pub async fn ttt(
        ctx: Context<'_>,
        #[description = "Member to play against"] opponent: serenity::Member,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let Some(_seats) = seat_players(ctx, &t, &opponent.user).await? else {
            return Ok(());
        };
        let players = [ctx.author().id.get(), opponent.user.id.get()];
        let mut board = Board::new();

        let footer = format!("❌ {} | ⭕ {}", ctx.author().tag(), opponent.user.tag());
        let embed = |board: &Board| {
            ctx.data()
                .embed()
                .title(t.t("ttt.title"))
                .description(status_line(&t, board, players))
                .footer(serenity::CreateEmbedFooter::new(&footer))
        };

        let id_prefix = format!("{}ttt", ctx.id());
        let filter_prefix = id_prefix.clone();
        let presses = serenity::ComponentInteractionCollector::new(ctx)
            .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
            .stream();
        let mut presses = pin!(presses);
        let handle = ctx
            .send(
                CreateReply::default()
                    .embed(embed(&board))
                    .components(board_components(&id_prefix, &board, false)),
            )
            .await?;
        let mut message = handle.into_message().await?;
        let mut deadline = Instant::now() + GAME_TIMEOUT;

        let finished = loop {
            let Ok(Some(press)) = timeout_at(deadline, presses.next()).await else {
                break false;
            };
            let Some(position) = button_position(&press.data.custom_id, &id_prefix) else {
                continue;
            };

            let presser = press.user.id.get();
            if !players.contains(&presser) {
                respond_ephemeral(ctx, &press, t.t("ttt.not_in_game")).await?;
                continue;
            }
            if presser != players[board.turn().index()] {
                respond_ephemeral(ctx, &press, t.t("ttt.not_your_turn")).await?;
                continue;
            }
            if let Err(e) = board.make_move(position) {
                debug!("Ignoring tic-tac-toe press: {e}");
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::Acknowledge,
                    )
                    .await?;
                continue;
            }
            deadline = Instant::now() + GAME_TIMEOUT;

            let over = board.outcome().is_some();
            let updated = embed(&board);
            let components = board_components(&id_prefix, &board, over);
            if buried(ctx, &message).await? {
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::Acknowledge,
                    )
                    .await?;
                message.delete(ctx).await?;
                message = ctx
                    .channel_id()
                    .send_message(
                        ctx,
                        serenity::CreateMessage::new()
                            .embed(updated)
                            .components(components),
                    )
                    .await?;
            } else {
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::UpdateMessage(
                            serenity::CreateInteractionResponseMessage::new()
                                .embed(updated)
                                .components(components),
                        ),
                    )
                    .await?;
            }
            if over {
                break true;
            }
        };

        if !finished {
            let timed_out = embed(&board).description(t.t("ttt.timeout"));
            message
                .edit(
                    ctx,
                    serenity::EditMessage::new()
                        .embed(timed_out)
                        .components(board_components(&id_prefix, &board, true)),
                )
                .await?;
        }
        Ok(())
    }

    async fn respond_ephemeral(
        ctx: Context<'_>,
        press: &serenity::ComponentInteraction,
        text: String,
    ) -> Result<()> {
        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(text)
                        .ephemeral(true),
                ),
            )
            .await?;
        Ok(())
    }

    /// Plays tic-tac-toe with reactions.
    #[poise::command(
        slash_command,
        prefix_command,
        category = "fun",
        guild_only,
        aliases("tttr"),
        required_bot_permissions = "ADD_REACTIONS"
    )]
    pub async fn tttreact(
        ctx: Context<'_>,
        #[description = "Member to play against"] opponent: serenity::Member,
    ) -> Result<()> {
        let t = translator(ctx).await;
        let Some(_seats) = seat_players(ctx, &t, &opponent.user).await? else {
            return Ok(());
        };
        let players = [ctx.author().id.get(), opponent.user.id.get()];
        let mut board = Board::new();

        let embed = |board: &Board, status: String| {
            ctx.data()
                .embed()
                .title(t.t("ttt.title"))
                .description(format!("{}\n\n{status}", render_grid(board)))
        };

        let reactions = serenity::ReactionCollector::new(ctx)
            .channel_id(ctx.channel_id())
            .filter(move |reaction| {
                reaction
                    .user_id
                    .is_some_and(|user_id| players.contains(&user_id.get()))
            })
            .stream();
        let mut reactions = pin!(reactions);
        let handle = ctx
            .send(CreateReply::default().embed(embed(&board, status_line(&t, &board, players))))
            .await?;
        let mut message = handle.into_message().await?;
        add_keycaps(ctx, &message, &board).await?;
        let can_manage = bot_can_manage_messages(ctx);
        let mut deadline = Instant::now() + GAME_TIMEOUT;

        let finished = loop {
            let Ok(Some(reaction)) = timeout_at(deadline, reactions.next()).await else {
                break false;
            };
            let player = serenity::UserId::new(players[board.turn().index()]);
            let Some(position) = reaction_move(
                &reaction.emoji,
                (reaction.message_id, reaction.user_id),
                (message.id, player),
            ) else {
                continue;
            };
            if let Err(e) = board.make_move(position) {
                debug!("Ignoring tic-tac-toe reaction: {e}");
                continue;
            }
            deadline = Instant::now() + GAME_TIMEOUT;

            if can_manage {
                if let Err(e) = message
                    .delete_reaction_emoji(ctx, reaction.emoji.clone())
                    .await
                {
                    warn!("Failed to clear used reaction: {e}");
                }
            }

            let updated = embed(&board, status_line(&t, &board, players));
            let over = board.outcome().is_some();
            if buried(ctx, &message).await? {
                message.delete(ctx).await?;
                message = ctx
                    .channel_id()
                    .send_message(ctx, serenity::CreateMessage::new().embed(updated))
                    .await?;
                if !over {
                    add_keycaps(ctx, &message, &board).await?;
                }
            } else {
                message
                    .edit(ctx, serenity::EditMessage::new().embed(updated))
                    .await?;
            }
            if over {
                break true;
            }
        };

        if !finished {
            message
                .edit(
                    ctx,
                    serenity::EditMessage::new().embed(embed(&board, t.t("ttt.timeout"))),
                )
                .await?;
        }
        if can_manage {
            if let Err(e) = message.delete_reactions(ctx).await {
                warn!("Failed to clear game reactions: {e}");
            }
        }
        Ok(())
    }

    /// Reacts with the keycap of every free cell.
    async fn add_keycaps(
        ctx: Context<'_>,
        message: &serenity::Message,
        board: &Board,
    ) -> Result<()> {
        for position in board.valid_moves() {
            let keycap = KEYCAPS[position - 1].to_string();
            message
                .react(ctx, serenity::ReactionType::Unicode(keycap))
                .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::test_translator;

    #[test]
    fn test_render_grid() {
        let mut board = Board::new();
        board.make_move(0).unwrap();
        board.make_move(4).unwrap();
        let grid = render_grid(&board);
        let rows: Vec<&str> = grid.split("\n➖➕➖➕➖\n").collect();
        assert_eq!(rows, vec!["❌❕2️⃣❕3️⃣", "4️⃣❕⭕❕6️⃣", "7️⃣❕8️⃣❕9️⃣"]);
    }

    #[test]
    fn test_status_line_follows_the_game() {
        let t = test_translator("en_US");
        let players = [10, 20];
        let mut board = Board::new();
        assert_eq!(status_line(&t, &board, players), "<@10>'s turn.");
        board.make_move(0).unwrap();
        assert_eq!(status_line(&t, &board, players), "<@20>'s turn.");
        for position in [3, 1, 4, 2] {
            board.make_move(position).unwrap();
        }
        assert_eq!(status_line(&t, &board, players), "<@10> won!");
    }

    #[test]
    fn test_keycap_position() {
        let keycap = serenity::ReactionType::Unicode("5️⃣".to_string());
        assert_eq!(keycap_position(&keycap), Some(4));
        let other = serenity::ReactionType::Unicode("👍".to_string());
        assert_eq!(keycap_position(&other), None);
    }

    #[test]
    fn test_reaction_move_needs_the_current_player_on_the_live_message() {
        let keycap = serenity::ReactionType::Unicode("3️⃣".to_string());
        let game = serenity::MessageId::new(100);
        let player = serenity::UserId::new(10);
        let other = serenity::UserId::new(20);

        assert_eq!(reaction_move(&keycap, (game, Some(player)), (game, player)), Some(2));
        assert_eq!(reaction_move(&keycap, (game, Some(other)), (game, player)), None);
        assert_eq!(reaction_move(&keycap, (game, None), (game, player)), None);
        let old_board = serenity::MessageId::new(99);
        assert_eq!(reaction_move(&keycap, (old_board, Some(player)), (game, player)), None);
    }

    #[test]
    fn test_button_position() {
        assert_eq!(button_position("42ttt-8", "42ttt"), Some(8));
        assert_eq!(button_position("42ttt-9", "42ttt"), None);
        assert_eq!(button_position("43ttt-1", "42ttt"), None);
        assert_eq!(button_position("42ttt1", "42ttt"), None);
    }

    #[test]
    fn test_board_components_have_three_rows() {
        let board = Board::new();
        assert_eq!(board_components("1ttt", &board, false).len(), 3);
    }
}
