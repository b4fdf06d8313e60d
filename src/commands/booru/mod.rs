pub mod gelbooru;

use rand::seq::SliceRandom;
use regex::Regex;
use tracing::error;

use crate::models::config::Config;
use crate::services::storage::Storage;
use crate::{BaristaContext, BooruCache, Error};
use gelbooru::Post;

const EMBED_COLOR: u32 = 0xD7598B;
const EMBED_ICON: &str = "https://i.imgur.com/FeRu6Pw.png";

const RATINGS: [&str; 4] = [
    "rating:general",
    "rating:sensitive",
    "rating:questionable",
    "rating:explicit",
];

async fn channel_is_nsfw(ctx: &BaristaContext<'_>) -> bool {
    match ctx.channel_id().to_channel(ctx.discord()).await {
        Ok(channel) => channel.is_nsfw(),
        Err(_) => false,
    }
}

/// Pick a random post that hasn't been shown in this channel yet,
/// recording the pick in `seen`. When every candidate has been shown the
/// history collapses to its most recent entry and rotation starts over.
fn select_post(posts: &[Post], seen: &mut Vec<u64>) -> Option<Post> {
    if posts.is_empty() {
        return None;
    }

    if posts.iter().all(|post| seen.contains(&post.id)) {
        let last = seen.last().copied();
        seen.clear();
        seen.extend(last);
    }

    let pool: Vec<&Post> = if posts.len() > 1 {
        posts.iter().filter(|post| !seen.contains(&post.id)).collect()
    } else {
        posts.iter().collect()
    };

    let choice = (*pool.choose(&mut rand::thread_rng())?).clone();
    seen.push(choice.id);
    Some(choice)
}

#[poise::command(
    prefix_command,
    slash_command,
    aliases("gelbooru"),
    user_cooldown = "2",
    description_localized("en-US", "Search images on Gelbooru (separate tags with spaces).")
)]
pub async fn booru(
    ctx: BaristaContext<'_>,
    #[description = "Tags to search for, separated by spaces."]
    #[autocomplete = "autocomplete_tags"]
    #[rest]
    tags: String,
) -> Result<(), Error> {
    let nsfw = channel_is_nsfw(&ctx).await;
    let query = gelbooru::sanitize_query(&tags, nsfw);

    ctx.defer().await?;

    let (config, image_cache) = {
        let data = ctx.discord().data.read().await;
        (
            data.get::<Config>().unwrap().clone(),
            data.get::<BooruCache>().unwrap().clone(),
        )
    };

    let client = reqwest::Client::new();
    let tag_list = gelbooru::build_tag_list(&query);

    let posts = match gelbooru::fetch_posts(&client, &config, &tag_list).await {
        Ok(posts) => posts,
        Err(ex) => {
            error!("Failed to fetch posts from Gelbooru: {}", ex);
            ctx.say("Sorry, something went wrong talking to Gelbooru. Try again later?")
                .await?;
            return Ok(());
        }
    };

    let choice = {
        let channel = ctx.channel_id().0;
        let mut cache = image_cache.lock().await;
        let mut seen = cache.get(&channel).cloned().unwrap_or_default();
        let choice = select_post(&posts, &mut seen);
        cache.insert(channel, seen);
        choice
    };

    let Some(post) = choice else {
        let mut description = "💨 No results...".to_string();
        if !nsfw {
            description.push_str(" (safe mode)");
        }
        ctx.send(|m| m.embed(|e| e.colour(EMBED_COLOR).description(description)))
            .await?;
        return Ok(());
    };

    let image_url = gelbooru::preferred_image_url(&post).to_string();
    ctx.send(|m| {
        m.embed(|e| {
            e.colour(EMBED_COLOR)
                .author(|a| {
                    a.name("Post on Gelbooru")
                        .url(gelbooru::post_link(post.id))
                        .icon_url(EMBED_ICON)
                })
                .image(image_url);
            if !post.source.is_empty() {
                e.description(format!("[🔗 Post source]({})", post.source));
            }
            e.footer(|f| f.text(format!("⭐ {}", post.score)))
        })
    })
    .await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    owners_only,
    hide_in_help,
    description_localized("en-US", "Clear the cached Gelbooru tag suggestions.")
)]
pub async fn boorudeletecache(ctx: BaristaContext<'_>) -> Result<(), Error> {
    let storage = {
        let data = ctx.discord().data.read().await;
        data.get::<Storage>().unwrap().clone()
    };
    storage.clear_tag_cache().await?;
    ctx.say("Cleared the tag cache. ✅").await?;

    Ok(())
}

async fn grab_tags(ctx: &BaristaContext<'_>, query: &str) -> Result<Vec<String>, Error> {
    let query = query.to_lowercase();

    let (storage, config) = {
        let data = ctx.discord().data.read().await;
        (
            data.get::<Storage>().unwrap().clone(),
            data.get::<Config>().unwrap().clone(),
        )
    };

    if let Some(tags) = storage.cached_tags(&query).await {
        return Ok(tags);
    }

    let client = reqwest::Client::new();
    let tags = gelbooru::fetch_tags(&client, &config, &query).await?;
    if !tags.is_empty() {
        storage.cache_tags(&query, &tags).await?;
    }

    Ok(tags)
}

async fn autocomplete_tags(
    ctx: BaristaContext<'_>,
    partial: &str,
) -> impl Iterator<Item = String> {
    let current = partial.trim_start();
    let (previous, last) = match current.rsplit_once(' ') {
        Some((previous, last)) => (previous.trim().to_string(), last.trim().to_string()),
        None => (String::new(), current.trim().to_string()),
    };

    let mut excluded = last.starts_with('-');
    let last = last.trim_start_matches('-').to_string();
    let nsfw = channel_is_nsfw(&ctx).await;

    let mut results: Vec<String>;
    if last.is_empty() && !excluded {
        // Nothing typed yet, offer the syntax shortcuts.
        results = Vec::new();
        if !previous.contains("full_body") {
            results.push("full_body".to_string());
        }
        if !previous.contains('-') {
            results.push("-excluded_tag".to_string());
        }
        if !previous.contains("score") {
            results.push("score:>10".to_string());
            results.push("score:>100".to_string());
        }
        if nsfw && !previous.contains("rating") {
            results.extend(RATINGS.iter().map(|r| r.to_string()));
        }
    } else if last.to_lowercase().contains("rating") {
        if nsfw {
            let lowered = last.to_lowercase();
            let mut ratings: Vec<String> = RATINGS.iter().map(|r| r.to_string()).collect();
            if let Some(position) = ratings.iter().position(|r| r.starts_with(&lowered)) {
                let matched = ratings.remove(position);
                ratings.insert(0, matched);
            }
            results = ratings;
        } else {
            results = vec!["rating:general".to_string()];
            excluded = false;
        }
    } else if last.to_lowercase().contains("score") {
        excluded = false;
        results = vec![
            "score:>10".to_string(),
            "score:>100".to_string(),
            "score:>1000".to_string(),
        ];
        if Regex::new(r"^score:>[0-9]+$").unwrap().is_match(&last) {
            results.retain(|r| r != &last);
            results.insert(0, last.clone());
        }
    } else {
        match grab_tags(&ctx, &last).await {
            Ok(tags) => results = tags,
            Err(ex) => {
                error!("Failed to load Gelbooru tags: {}", ex);
                return vec!["error".to_string()].into_iter();
            }
        }
    }

    if excluded {
        results = results.iter().map(|r| format!("-{r}")).collect();
    }
    if !previous.is_empty() {
        results = results.iter().map(|r| format!("{previous} {r}")).collect();
    }

    results.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64) -> Post {
        Post {
            id,
            file_url: format!("https://x/{id}.png"),
            ..Default::default()
        }
    }

    #[test]
    fn select_post_skips_already_seen() {
        let posts = vec![post(1), post(2), post(3)];
        let mut seen = vec![1, 3];
        let choice = select_post(&posts, &mut seen).unwrap();
        assert_eq!(choice.id, 2);
        assert_eq!(seen, vec![1, 3, 2]);
    }

    #[test]
    fn select_post_resets_when_everything_was_seen() {
        let posts = vec![post(1), post(2)];
        let mut seen = vec![1, 2];
        let choice = select_post(&posts, &mut seen).unwrap();
        // History collapsed to the most recent entry, so only 1 is eligible.
        assert_eq!(choice.id, 1);
        assert_eq!(seen, vec![2, 1]);
    }

    #[test]
    fn select_post_with_no_posts() {
        let mut seen = Vec::new();
        assert!(select_post(&[], &mut seen).is_none());
        assert!(seen.is_empty());
    }

    #[test]
    fn single_post_repeats_rather_than_failing() {
        let posts = vec![post(9)];
        let mut seen = vec![9];
        let choice = select_post(&posts, &mut seen).unwrap();
        assert_eq!(choice.id, 9);
    }
}
