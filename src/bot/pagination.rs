//! Button-driven paginator for embeds.

use crate::{bot::Context, errors::Result};
use futures::StreamExt;
use poise::{CreateReply, serenity_prelude as serenity};
use std::{pin::pin, time::Duration};

/// How long the page buttons stay active
const PAGINATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Splits `items` into pages of `per_page`; an empty list gives no pages.
#[must_use]
pub fn chunk_pages(items: &[String], per_page: usize) -> Vec<String> {
    items
        .chunks(per_page.max(1))
        .map(|chunk| chunk.join("\n"))
        .collect()
}

/// Index of the page after a press on `previous`/`next`, wrapping around.
#[must_use]
pub const fn turn_page(current: usize, total: usize, forward: bool) -> usize {
    if total == 0 {
        return 0;
    }
    if forward {
        (current + 1) % total
    } else if current == 0 {
        total - 1
    } else {
        current - 1
    }
}

/// Sends the first page with previous/next buttons and flips pages until
/// the buttons time out, then removes them.
pub async fn paginate(ctx: Context<'_>, pages: &[serenity::CreateEmbed]) -> Result<()> {
    let Some(first) = pages.first() else {
        return Ok(());
    };

    // Unique per invocation so concurrent paginators do not react to each other
    let ctx_id = ctx.id();
    let prev_button_id = format!("{ctx_id}prev");
    let next_button_id = format!("{ctx_id}next");

    let buttons = serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(&prev_button_id).emoji('◀'),
        serenity::CreateButton::new(&next_button_id).emoji('▶'),
    ]);
    let reply = CreateReply::default().embed(first.clone());
    let reply = if pages.len() > 1 {
        reply.components(vec![buttons])
    } else {
        reply
    };
    let handle = ctx.send(reply).await?;
    if pages.len() == 1 {
        return Ok(());
    }

    let mut current_page = 0;
    let id_prefix = ctx_id.to_string();
    let presses = serenity::ComponentInteractionCollector::new(ctx)
        .filter(move |press| press.data.custom_id.starts_with(&id_prefix))
        .timeout(PAGINATION_TIMEOUT)
        .stream();
    let mut presses = pin!(presses);
    while let Some(press) = presses.next().await {
        let forward = if press.data.custom_id == next_button_id {
            true
        } else if press.data.custom_id == prev_button_id {
            false
        } else {
            continue;
        };
        current_page = turn_page(current_page, pages.len(), forward);

        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(pages[current_page].clone()),
                ),
            )
            .await?;
    }

    handle
        .edit(
            ctx,
            CreateReply::default()
                .embed(pages[current_page].clone())
                .components(Vec::new()),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_pages() {
        let items: Vec<String> = (1..=23).map(|n| n.to_string()).collect();
        let pages = chunk_pages(&items, 10);
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with("1\n2"));
        assert_eq!(pages[2], "21\n22\n23");
        assert!(chunk_pages(&[], 10).is_empty());
    }

    #[test]
    fn test_turn_page_wraps() {
        assert_eq!(turn_page(0, 3, true), 1);
        assert_eq!(turn_page(2, 3, true), 0);
        assert_eq!(turn_page(0, 3, false), 2);
        assert_eq!(turn_page(1, 3, false), 0);
        assert_eq!(turn_page(0, 0, true), 0);
    }
}
