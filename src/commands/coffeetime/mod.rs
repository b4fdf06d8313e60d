pub mod countries;
pub mod timezones;

use chrono::Utc;
use chrono_tz::Tz;
use serenity::model::user::User;
use tracing::warn;

use crate::services::storage::Storage;
use crate::{BaristaContext, Error};
use timezones::Resolution;

const TIMEZONE_PICKER: &str = "https://coffeebank.github.io/timezone-picker";

async fn storage(ctx: &BaristaContext<'_>) -> std::sync::Arc<Storage> {
    let data = ctx.discord().data.read().await;
    data.get::<Storage>().unwrap().clone()
}

async fn stored_zone(ctx: &BaristaContext<'_>, user_id: u64) -> Option<(String, Tz)> {
    let identifier = storage(ctx).await.user_timezone(user_id).await?;
    match timezones::parse_zone(&identifier) {
        Some(zone) => Some((identifier, zone)),
        None => {
            warn!("User {} has an unparseable timezone: {}", user_id, identifier);
            None
        }
    }
}

/// Run a free-text city name through the resolver. Returns the single
/// winning identifier, or sends the not-found/disambiguation response and
/// returns None.
async fn resolve_city(ctx: &BaristaContext<'_>, city: &str) -> Result<Option<String>, Error> {
    let candidates = timezones::resolve(city, timezones::catalog());
    match timezones::disambiguate(candidates) {
        Resolution::NoMatch => {
            ctx.say(format!(
                "I couldn't find a timezone for that city or region. :(\nTry one of the cities in this list: <{TIMEZONE_PICKER}>"
            ))
            .await?;
            Ok(None)
        }
        Resolution::Single(candidate) => Ok(Some(candidate.identifier)),
        Resolution::Ambiguous(candidates) => {
            let body = candidates
                .iter()
                .map(|c| c.identifier.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let pages = crate::util::pagify(&body, 500);

            ctx.send(|m| {
                // Discord caps a message at ten embeds.
                for page in pages.iter().take(10) {
                    m.embed(|e| {
                        e.title(format!(
                            "{} results... can you be more specific?\ne.g. `America/Los Angeles`",
                            candidates.len()
                        ))
                        .description(page)
                        .footer(|f| f.text(TIMEZONE_PICKER))
                    });
                }
                m
            })
            .await?;
            Ok(None)
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Show the current time for a user."),
    discard_spare_arguments
)]
pub async fn time(
    ctx: BaristaContext<'_>,
    #[description = "The user whose time to show."] user: Option<User>,
) -> Result<(), Error> {
    let author = ctx.author().clone();
    let target = user.unwrap_or_else(|| author.clone());

    let Some((identifier, zone)) = stored_zone(&ctx, target.id.0).await else {
        ctx.say(format!(
            "{} hasn't set their timezone yet. Try `timeset` to set it!",
            target.name
        ))
        .await?;
        return Ok(());
    };

    let now = Utc::now();
    let formatted = timezones::format_time_verbose(&now.with_timezone(&zone));

    let mut header = format!("The current time for {} is", target.name);
    let mut reminder = None;

    if target.id != author.id {
        match stored_zone(&ctx, author.id.0).await {
            Some((_, author_zone)) => {
                let comparison = timezones::compare(author_zone, zone, now);
                header.push_str(&format!(
                    " (**{}**)",
                    timezones::describe_difference(&comparison)
                ));
            }
            None => {
                reminder =
                    Some("You haven't set your timezone yet 👀 Use `timeset` to share your time!");
            }
        }
    }

    ctx.say(format!("{header}:\n>>> {formatted}, *{identifier}*"))
        .await?;
    if let Some(reminder) = reminder {
        ctx.say(reminder).await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Set your timezone by city name.")
)]
pub async fn timeset(
    ctx: BaristaContext<'_>,
    #[description = "The big city closest to you."]
    #[rest]
    city: String,
) -> Result<(), Error> {
    if let Some(identifier) = resolve_city(&ctx, &city).await? {
        storage(&ctx)
            .await
            .set_user_timezone(ctx.author().id.0, &identifier)
            .await?;
        ctx.say(format!("Successfully set your timezone to **{identifier}**!"))
            .await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Get the current time in a city.")
)]
pub async fn timein(
    ctx: BaristaContext<'_>,
    #[description = "The city or region to look up."]
    #[rest]
    city: String,
) -> Result<(), Error> {
    let Some(identifier) = resolve_city(&ctx, &city).await? else {
        return Ok(());
    };

    let Some(zone) = timezones::parse_zone(&identifier) else {
        ctx.say("That zone is in the catalog but I can't load it, sorry.")
            .await?;
        return Ok(());
    };

    let formatted = timezones::format_time_verbose(&Utc::now().with_timezone(&zone));
    ctx.say(format!(">>> {formatted}, *{identifier}*")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    subcommands("iso", "set", "user", "compare"),
    description_localized("en-US", "Timezone tools: country lookups and comparisons."),
    identifying_name = "Timetools"
)]
pub async fn timetools(_ctx: BaristaContext<'_>) -> Result<(), Error> {
    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "List the timezones of an ISO 3166 country code.")
)]
pub async fn iso(
    ctx: BaristaContext<'_>,
    #[description = "A two-letter country code, like US or JP."] code: String,
) -> Result<(), Error> {
    let code = code.trim().to_uppercase();
    match countries::zones_for_country(&code) {
        Some(zones) => {
            ctx.say(format!(
                "Supported timezones for **{code}:**\n{}\n**Use** `timein Continent/City` **to show the current time there.**",
                zones.join(", ")
            ))
            .await?;
        }
        None => {
            ctx.say(
                "That country code isn't supported.\nThe full list is here: \
                <https://en.wikipedia.org/wiki/List_of_ISO_3166_country_codes>\n\
                Use the two-letter code from the `Alpha-2 code` column.",
            )
            .await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    owners_only,
    description_localized("en-US", "Override a user's stored timezone.")
)]
pub async fn set(
    ctx: BaristaContext<'_>,
    #[description = "The user to edit."] user: User,
    #[description = "Their city or zone name."]
    #[rest]
    timezone_name: String,
) -> Result<(), Error> {
    if let Some(identifier) = resolve_city(&ctx, &timezone_name).await? {
        storage(&ctx)
            .await
            .set_user_timezone(user.id.0, &identifier)
            .await?;
        ctx.say(format!(
            "Successfully set {}'s timezone to **{identifier}**.",
            user.name
        ))
        .await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Show a user's stored timezone and current time.")
)]
pub async fn user(
    ctx: BaristaContext<'_>,
    #[description = "The user to look up."] user: User,
) -> Result<(), Error> {
    match stored_zone(&ctx, user.id.0).await {
        Some((identifier, zone)) => {
            let formatted = timezones::format_time_dated(&Utc::now().with_timezone(&zone));
            ctx.say(format!(
                "{}'s timezone is **{identifier}**.\nTheir time right now is {formatted}.",
                user.name
            ))
            .await?;
        }
        None => {
            ctx.say("That user hasn't set their timezone yet.").await?;
        }
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Compare your timezone with another user's.")
)]
pub async fn compare(
    ctx: BaristaContext<'_>,
    #[description = "The user to compare against."] user: User,
) -> Result<(), Error> {
    let Some((_, author_zone)) = stored_zone(&ctx, ctx.author().id.0).await else {
        ctx.say(format!(
            "You haven't set your timezone yet. Use `timeset Continent/City` first: <{TIMEZONE_PICKER}>"
        ))
        .await?;
        return Ok(());
    };

    let Some((_, other_zone)) = stored_zone(&ctx, user.id.0).await else {
        ctx.say("That user hasn't set their timezone yet.").await?;
        return Ok(());
    };

    let now = Utc::now();
    let comparison = timezones::compare(author_zone, other_zone, now);
    let other_time = timezones::format_time_short(&now.with_timezone(&other_zone));

    ctx.say(format!(
        "{}'s time is {other_time}, {}.",
        user.name,
        timezones::describe_difference(&comparison)
    ))
    .await?;

    Ok(())
}
