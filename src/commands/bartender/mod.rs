use std::collections::BTreeMap;

use crate::models::drink::Drink;
use crate::services::storage::Storage;
use crate::{BaristaContext, Error};

async fn storage(ctx: &BaristaContext<'_>) -> std::sync::Arc<Storage> {
    let data = ctx.discord().data.read().await;
    data.get::<Storage>().unwrap().clone()
}

fn menu_description(menu: &BTreeMap<String, Drink>) -> String {
    menu.iter()
        .map(|(name, drink)| format!("{}\u{2002}{}", drink.emoji, name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn serving_line(server_mention: &str, recipient: &str, name: &str, drink: &Drink) -> String {
    let intro = if drink.intro.is_empty() {
        name
    } else {
        &drink.intro
    };
    let body = if drink.body.is_empty() {
        String::new()
    } else {
        format!("\n\n{}", drink.body)
    };

    format!(
        "**{server_mention}** serves **{recipient}** a {intro} {}{body}",
        drink.emoji
    )
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("barserve"),
    description_localized("en-US", "Serve a drink to a user, or show the menu.")
)]
pub async fn serve(
    ctx: BaristaContext<'_>,
    #[description = "The drink to serve."] drink: Option<String>,
    #[description = "Who gets the drink."]
    #[rest]
    user: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().map(|id| id.0).unwrap_or_default();
    let menu = storage(&ctx).await.drinks(guild_id).await;

    if let (Some(drink_name), Some(recipient)) = (drink, user) {
        let Some(drink) = menu.get(&drink_name) else {
            ctx.say("Sorry, we don't serve that here! Use `serve` with no arguments to see the menu...")
                .await?;
            return Ok(());
        };

        let mention = format!("<@{}>", ctx.author().id.0);
        let description = serving_line(&mention, &recipient, &drink_name, drink);
        let thumbnail = drink.images.first().cloned();
        let footer = drink.footer.clone();

        ctx.send(|m| {
            m.embed(|e| {
                e.description(description);
                if let Some(thumbnail) = thumbnail {
                    e.thumbnail(thumbnail);
                }
                if !footer.is_empty() {
                    e.footer(|f| f.text(footer));
                }
                e
            })
        })
        .await?;
    } else {
        let description = menu_description(&menu);
        ctx.send(|m| {
            m.embed(|e| {
                e.title("Menu 🪧")
                    .description(description)
                    .footer(|f| f.text("Use `serve <drink> <user>` to order"))
            })
        })
        .await?;
    }

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("add", "remove"),
    description_localized("en-US", "Edit the drink menu."),
    identifying_name = "Barset"
)]
pub async fn barset(_ctx: BaristaContext<'_>) -> Result<(), Error> {
    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Add a drink to the menu.")
)]
pub async fn add(
    ctx: BaristaContext<'_>,
    #[description = "The name of the drink."] name: String,
    #[description = "An emoji for the menu line."] emoji: String,
    #[description = "A thumbnail image URL."] image_url: String,
    #[description = "How the drink is announced when served."]
    #[rest]
    intro: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().map(|id| id.0).unwrap_or_default();
    let drink = Drink {
        intro: intro.unwrap_or_else(|| name.clone()),
        body: String::new(),
        images: vec![image_url],
        emoji,
        footer: String::new(),
    };

    storage(&ctx).await.add_drink(guild_id, &name, drink).await?;
    ctx.say(format!("Added **{name}** to the menu. ✅")).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Take a drink off the menu.")
)]
pub async fn remove(
    ctx: BaristaContext<'_>,
    #[description = "The name of the drink."]
    #[rest]
    name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().map(|id| id.0).unwrap_or_default();

    if storage(&ctx).await.remove_drink(guild_id, &name).await? {
        ctx.say(format!("Took **{name}** off the menu. ✅")).await?;
    } else {
        ctx.say("That drink isn't on the menu.").await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::drink::default_menu;

    #[test]
    fn menu_lists_emoji_and_name_per_line() {
        let description = menu_description(&default_menu());
        let lines: Vec<&str> = description.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.contains("boba")));
        assert!(lines.iter().any(|l| l.contains("latte")));
    }

    #[test]
    fn serving_line_prefers_the_intro() {
        let menu = default_menu();
        let boba = &menu["boba"];
        let line = serving_line("<@1>", "moo", "boba", boba);
        assert!(line.contains("some very good bubble tea"));
        assert!(line.contains("<@1>"));
        assert!(line.contains("moo"));
    }

    #[test]
    fn serving_line_falls_back_to_the_name() {
        let menu = default_menu();
        let latte = &menu["latte"];
        let line = serving_line("<@1>", "moo", "latte", latte);
        assert!(line.contains("a latte ")); // no intro set
    }
}
