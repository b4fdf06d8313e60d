mod music_commands;

use crate::{BaristaContext, Error};
use music_commands::*;

#[poise::command(prefix_command, slash_command,
    subcommands("help", "join", "leave", "play", "playlist", "pause", "now_playing", "skip", "stop", "queue", "volume", "shuffle"),
    description_localized("en-US", "Commands for playing music."),
    guild_only,
    identifying_name = "Music"
)]
pub async fn music(ctx: BaristaContext<'_>) -> Result<(), Error> {
    help(ctx).await
}
