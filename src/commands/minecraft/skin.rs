use crate::{BaristaContext, Error};
use super::player::Player;

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Show a player's Java edition skin."),
    discard_spare_arguments
)]
pub async fn skin(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
    #[description = "Render the overlay (hat) layer."] overlay: Option<bool>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let player = match Player::lookup(&client, &player).await {
        Ok(player) => player,
        Err(ex) => {
            ctx.say(ex.to_string()).await?;
            return Ok(());
        }
    };

    let overlay = if overlay.unwrap_or(true) { "?overlay" } else { "" };
    let uuid = &player.id;
    let head = format!("https://crafatar.com/renders/head/{uuid}{overlay}");
    let skin = format!("https://crafatar.com/skins/{uuid}");
    let body = format!("https://crafatar.com/renders/body/{uuid}{overlay}");

    ctx.send(|m| {
        m.embed(|e| {
            e.author(|a| a.name(&player.name).icon_url(head).url(&skin))
                .thumbnail(skin.clone())
                .image(body)
                .footer(|f| {
                    f.text("Rendered by Crafatar")
                        .icon_url("https://crafatar.com/logo.png")
                })
        })
    })
    .await?;

    Ok(())
}
