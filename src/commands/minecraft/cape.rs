use std::borrow::Cow;

use base64::Engine;
use poise::serenity_prelude::AttachmentType;
use serde::Deserialize;
use tracing::error;

use crate::{BaristaContext, Error};
use super::player::Player;

#[poise::command(
    prefix_command,
    slash_command,
    subcommands("mojang", "optifine", "labymod", "mccapes", "fivezig"),
    description_localized("en-US", "Fetch a player's cape from various services."),
    discard_spare_arguments,
    identifying_name = "Cape"
)]
pub async fn cape(ctx: BaristaContext<'_>) -> Result<(), Error> {
    ctx.say("Pick a cape source: `mojang, optifine, labymod, mccapes, fivezig` - e.g. `mc cape mojang <player>`").await?;
    Ok(())
}

async fn resolve(ctx: &BaristaContext<'_>, client: &reqwest::Client, name: &str) -> Result<Option<Player>, Error> {
    match Player::lookup(client, name).await {
        Ok(player) => Ok(Some(player)),
        Err(ex) => {
            ctx.say(ex.to_string()).await?;
            Ok(None)
        }
    }
}

async fn send_cape_embed(ctx: &BaristaContext<'_>, name: &str, url: String) -> Result<(), Error> {
    let name = name.to_string();
    ctx.send(|m| m.embed(|e| e.author(|a| a.name(name).url(&url)).image(&url)))
        .await?;
    Ok(())
}

/// GET the URL and report whether the service has a cape there.
async fn cape_exists(client: &reqwest::Client, url: &str) -> Result<bool, Error> {
    let response = client.get(url).send().await?;
    match response.status() {
        status if status.is_success() => Ok(true),
        reqwest::StatusCode::NOT_FOUND => Ok(false),
        status => Err(format!("The cape service answered with {status}.").into()),
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("crafatar"),
    description_localized("en-US", "The player's official Minecraft cape."),
    discard_spare_arguments
)]
pub async fn mojang(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let Some(player) = resolve(&ctx, &client, &player).await? else {
        return Ok(());
    };

    let url = format!("https://crafatar.com/capes/{}", player.id);
    match cape_exists(&client, &url).await {
        Ok(true) => send_cape_embed(&ctx, &player.name, url).await?,
        Ok(false) => {
            ctx.say(format!("**{}** has no cape.", player.name)).await?;
        }
        Err(ex) => {
            error!("Failed to fetch a cape from Crafatar: {}", ex);
            ctx.say("Sorry, Crafatar isn't answering right now.").await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("of"),
    description_localized("en-US", "The player's OptiFine cape."),
    discard_spare_arguments
)]
pub async fn optifine(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let Some(player) = resolve(&ctx, &client, &player).await? else {
        return Ok(());
    };

    let url = format!("http://s.optifine.net/capes/{}.png", player.name);
    match cape_exists(&client, &url).await {
        Ok(true) => send_cape_embed(&ctx, &player.name, url).await?,
        Ok(false) => {
            ctx.say(format!("**{}** has no OptiFine cape.", player.name))
                .await?;
        }
        Err(ex) => {
            error!("Failed to fetch a cape from OptiFine: {}", ex);
            ctx.say("Sorry, OptiFine isn't answering right now.").await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "The player's LabyMod cape."),
    discard_spare_arguments
)]
pub async fn labymod(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let Some(player) = resolve(&ctx, &client, &player).await? else {
        return Ok(());
    };

    // LabyMod is the one service keyed by the dashed UUID.
    let url = format!("http://capes.labymod.net/capes/{}", player.dashed_uuid()?);
    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(ex) => {
            error!("Failed to fetch a cape from LabyMod: {}", ex);
            ctx.say("Sorry, LabyMod isn't answering right now.").await?;
            return Ok(());
        }
    };

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        ctx.say(format!("**{}** has no LabyMod cape.", player.name))
            .await?;
        return Ok(());
    }

    let bytes = response.bytes().await?;
    ctx.send(|m| {
        m.attachment(AttachmentType::Bytes {
            data: Cow::from(bytes.to_vec()),
            filename: format!("{}.png", player.name),
        })
    })
    .await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("minecraftcapes", "couk"),
    description_localized("en-US", "The player's MinecraftCapes cape."),
    discard_spare_arguments
)]
pub async fn mccapes(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let Some(player) = resolve(&ctx, &client, &player).await? else {
        return Ok(());
    };

    let check = format!("https://minecraftcapes.co.uk/getCape/{}", player.id);
    match cape_exists(&client, &check).await {
        Ok(true) => {
            let url = format!("https://minecraftcapes.net/profile/{}/cape", player.id);
            send_cape_embed(&ctx, &player.name, url).await?;
        }
        Ok(false) => {
            ctx.say(format!("**{}** has no MinecraftCapes cape.", player.name))
                .await?;
        }
        Err(ex) => {
            error!("Failed to fetch a cape from MinecraftCapes: {}", ex);
            ctx.say("Sorry, MinecraftCapes isn't answering right now.")
                .await?;
        }
    }

    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FiveZigTextures {
    #[serde(default)]
    cape: Option<String>,
    #[serde(default)]
    animated_cape: Option<String>,
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("5zig"),
    description_localized("en-US", "The player's 5zig cape, optionally the animated one."),
    discard_spare_arguments
)]
pub async fn fivezig(
    ctx: BaristaContext<'_>,
    #[description = "The player's username."] player: String,
    #[description = "Fetch the animated cape instead."] animated: Option<bool>,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let Some(player) = resolve(&ctx, &client, &player).await? else {
        return Ok(());
    };

    let url = format!("http://textures.5zig.net/textures/2/{}", player.id);
    let response = match client.get(&url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => {
            ctx.say(format!("**{}** has no 5zig cape.", player.name))
                .await?;
            return Ok(());
        }
        Ok(response) => response,
        Err(ex) => {
            error!("Failed to fetch a cape from 5zig: {}", ex);
            ctx.say("Sorry, 5zig isn't answering right now.").await?;
            return Ok(());
        }
    };

    let textures: FiveZigTextures = response.json().await.unwrap_or_default();
    let animated = animated.unwrap_or(false);
    let payload = if animated {
        textures.animated_cape
    } else {
        textures.cape
    };

    let Some(payload) = payload else {
        let kind = if animated { "animated 5zig" } else { "5zig" };
        ctx.say(format!("**{}** has no {kind} cape.", player.name))
            .await?;
        return Ok(());
    };

    let bytes = decode_texture(&payload)?;
    ctx.send(|m| {
        m.attachment(AttachmentType::Bytes {
            data: Cow::from(bytes),
            filename: format!("{}.png", player.name),
        })
    })
    .await?;

    Ok(())
}

/// 5zig wraps its base64 at 76 columns, so strip whitespace before decoding.
fn decode_texture(payload: &str) -> Result<Vec<u8>, Error> {
    let compact: String = payload.split_whitespace().collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_base64_decodes() {
        let bytes = decode_texture("aGVs\nbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn invalid_base64_is_an_error() {
        assert!(decode_texture("not base64 at all!").is_err());
    }
}
