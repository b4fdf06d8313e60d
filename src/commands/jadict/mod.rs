pub mod jisho;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::error;

use crate::{BaristaContext, Error};

struct FallbackLink {
    name: &'static str,
    url: String,
}

/// Search links for the usual dictionary and translation sites, for when
/// Jisho has nothing (or is down).
fn fallback_links(text: &str) -> Vec<FallbackLink> {
    let encoded = utf8_percent_encode(text, NON_ALPHANUMERIC).to_string();
    vec![
        FallbackLink {
            name: "Jisho",
            url: format!("https://jisho.org/search/{encoded}"),
        },
        FallbackLink {
            name: "Wiktionary",
            url: format!("https://en.wiktionary.org/w/index.php?fulltext=0&search={encoded}"),
        },
        FallbackLink {
            name: "DeepL Translate",
            url: format!("https://deepl.com/translator#ja/en/{encoded}"),
        },
        FallbackLink {
            name: "Google Translate",
            url: format!("https://translate.google.com/?text={encoded}"),
        },
    ]
}

async fn send_fallback(ctx: &BaristaContext<'_>, text: &str, footer: &str) -> Result<(), Error> {
    let links = fallback_links(text);
    let title = text.to_string();
    let footer = footer.to_string();

    ctx.send(|m| {
        m.embed(|e| {
            e.title(title);
            for link in links {
                e.field(link.name, link.url, true);
            }
            if !footer.is_empty() {
                e.footer(|f| f.text(footer));
            }
            e
        })
    })
    .await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("jpdict", "jisho", "jishosearch"),
    description_localized(
        "en-US",
        "Search the Japanese dictionary. Romaji and Japanese work as-is; \"quote\" English words."
    )
)]
pub async fn jadict(
    ctx: BaristaContext<'_>,
    #[description = "The word to look up."]
    #[rest]
    text: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    let client = reqwest::Client::new();
    let response = match jisho::search(&client, &text).await {
        Ok(response) => response,
        Err(ex) => {
            error!("Failed to reach the Jisho API: {}", ex);
            return send_fallback(&ctx, &text, "Could not reach Jisho, try another source").await;
        }
    };

    if response.data.is_empty() {
        return send_fallback(&ctx, &text, "Nothing on Jisho, try another source").await;
    }

    let entries: Vec<_> = response.data.iter().take(jisho::PAGE_CAP).collect();
    let total = entries.len();

    ctx.send(|m| {
        for (index, entry) in entries.into_iter().enumerate() {
            let footer = [
                jisho::attribution_line(entry),
                format!("{}/{}", index + 1, total),
            ]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ・ ");

            m.embed(|e| {
                e.title(jisho::entry_title(entry))
                    .url(jisho::entry_url(entry))
                    .description(jisho::entry_description(entry));
                for (position, sense) in entry.senses.iter().enumerate() {
                    let (name, value) = jisho::sense_field(position, sense);
                    e.field(name, value, true);
                }
                e.footer(|f| f.text(footer))
            });
        }
        m
    })
    .await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("jpsearch"),
    description_localized("en-US", "Links to Japanese dictionary and translation sites.")
)]
pub async fn jasearch(
    ctx: BaristaContext<'_>,
    #[description = "The word to look up."]
    #[rest]
    text: String,
) -> Result<(), Error> {
    send_fallback(&ctx, &text, "").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_percent_encoded() {
        let links = fallback_links("東京 tower");
        assert_eq!(links.len(), 4);
        assert!(links[0].url.starts_with("https://jisho.org/search/%E6%9D%B1%E4%BA%AC%20tower"));
        assert!(links.iter().all(|link| !link.url.contains(' ')));
    }

    #[test]
    fn ascii_queries_pass_through() {
        let links = fallback_links("ramen");
        assert!(links[0].url.ends_with("/search/ramen"));
    }
}
