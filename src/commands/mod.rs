pub mod bartender;
pub mod booru;
pub mod coffeetime;
pub mod jadict;
pub mod minecraft;
mod music;

use std::collections::HashSet;
use tracing::error;

use serenity::model::id::UserId;

use crate::{BaristaContext, Error};

#[poise::command(prefix_command, track_edits, slash_command)]
async fn help(
    ctx: BaristaContext<'_>,
    #[description = "The command requested for help"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), Error> {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
        .await?;
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, (), Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx } => {
            error!("Command `{}` failed: {}", ctx.command().name, error);
            if let Err(ex) = ctx.say("Sorry, something went wrong running that command.").await {
                error!("Failed to send error message: {}", ex);
            }
        }
        poise::FrameworkError::CooldownHit { remaining_cooldown, ctx } => {
            // Why round up when we can add one?
            if let Err(ex) = ctx.say(format!("This command is rate-limited, please try this again in {} seconds.", remaining_cooldown.as_secs() + 1)).await {
                error!("Failed to send rate-limit message: {}", ex);
            }
        }
        other => {
            if let Err(ex) = poise::builtins::on_error(other).await {
                error!("Failed to handle framework error: {}", ex);
            }
        }
    }
}

pub async fn get_framework(pref: &str, _app_id: UserId, owners: HashSet<UserId>) -> poise::FrameworkOptions<(), Error> {
    poise::FrameworkOptions {
        commands: vec![
            help(),
            coffeetime::time(),
            coffeetime::timeset(),
            coffeetime::timein(),
            coffeetime::timetools(),
            bartender::serve(),
            bartender::barset(),
            booru::booru(),
            booru::boorudeletecache(),
            jadict::jadict(),
            jadict::jasearch(),
            minecraft::minecraft(),
            music::music(),
        ],
        on_error: |error| Box::pin(on_error(error)),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some(pref.to_string()),
            mention_as_prefix: true,
            ..Default::default()
        },
        owners,
        ..Default::default()
    }
}
