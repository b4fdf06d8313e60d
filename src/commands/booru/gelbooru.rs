use regex::Regex;
use serde::Deserialize;

use crate::models::config::Config;
use crate::Error;

const API_BASE: &str = "https://gelbooru.com/index.php";
const USER_AGENT: &str = concat!("barista/", env!("CARGO_PKG_VERSION"));

/// Extensions Discord will actually render inline.
const IMAGE_TYPES: [&str; 5] = [".png", ".jpeg", ".jpg", ".webp", ".gif"];
const TAG_BLACKLIST: [&str; 3] = ["shota", "guro", "video"];

#[derive(Debug, Default, Deserialize)]
pub struct PostList {
    #[serde(default)]
    pub post: Vec<Post>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub sample_url: String,
    #[serde(default)]
    pub width: u64,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TagList {
    #[serde(default)]
    pub tag: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Normalize the user's search text. Outside NSFW channels any rating
/// term is stripped and `rating:general` forced on.
pub fn sanitize_query(tags: &str, nsfw: bool) -> String {
    let mut tags = tags.trim().to_lowercase();
    if tags == "none" || tags == "error" {
        tags.clear();
    }

    if !nsfw {
        let rating = Regex::new(r" ?rating:[^ ]+").unwrap();
        tags = rating.replace_all(&tags, "").to_string();
        tags.push_str(" rating:general");
    }

    tags.trim().to_string()
}

/// Drop blacklisted tags from the query and negate them unconditionally.
pub fn build_tag_list(query: &str) -> Vec<String> {
    let mut tags: Vec<String> = query
        .split_whitespace()
        .filter(|tag| !TAG_BLACKLIST.contains(tag))
        .map(str::to_string)
        .collect();
    tags.extend(TAG_BLACKLIST.iter().map(|tag| format!("-{tag}")));
    tags
}

pub fn is_embeddable_image(url: &str) -> bool {
    IMAGE_TYPES.iter().any(|ext| url.ends_with(ext))
}

/// Full image below ~4.2 megapixels, the downscaled sample above.
pub fn preferred_image_url(post: &Post) -> &str {
    if post.width * post.height < 4_200_000 || post.sample_url.is_empty() {
        &post.file_url
    } else {
        &post.sample_url
    }
}

pub fn post_link(id: u64) -> String {
    format!("https://gelbooru.com/index.php?page=post&s=view&id={id}")
}

fn push_credentials<'a>(params: &mut Vec<(&'static str, &'a str)>, config: &'a Config) {
    if !config.gelbooru_api_key.is_empty() && !config.gelbooru_user_id.is_empty() {
        params.push(("api_key", &config.gelbooru_api_key));
        params.push(("user_id", &config.gelbooru_user_id));
    }
}

pub async fn fetch_posts(
    client: &reqwest::Client,
    config: &Config,
    tags: &[String],
) -> Result<Vec<Post>, Error> {
    let joined = tags.join(" ");
    let mut params: Vec<(&'static str, &str)> = vec![
        ("page", "dapi"),
        ("s", "post"),
        ("q", "index"),
        ("json", "1"),
        ("limit", "1000"),
        ("tags", &joined),
    ];
    push_credentials(&mut params, config);

    let url = reqwest::Url::parse_with_params(API_BASE, &params)?;
    let list: PostList = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .json()
        .await?;

    Ok(list
        .post
        .into_iter()
        .filter(|post| is_embeddable_image(&post.file_url))
        .collect())
}

/// Tag-name search for autocomplete, most used tags first.
pub async fn fetch_tags(
    client: &reqwest::Client,
    config: &Config,
    query: &str,
) -> Result<Vec<String>, Error> {
    let pattern = format!("%{query}%");
    let mut params: Vec<(&'static str, &str)> = vec![
        ("page", "dapi"),
        ("s", "tag"),
        ("q", "index"),
        ("json", "1"),
        ("sort", "desc"),
        ("order_by", "index_count"),
        ("name_pattern", &pattern),
    ];
    push_credentials(&mut params, config);

    let url = reqwest::Url::parse_with_params(API_BASE, &params)?;
    let list: TagList = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?
        .json()
        .await?;

    Ok(list
        .tag
        .into_iter()
        .take(20)
        .map(|tag| html_escape::decode_html_entities(&tag.name).to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_mode_forces_general_rating() {
        assert_eq!(
            sanitize_query("cat_ears rating:explicit", false),
            "cat_ears rating:general"
        );
        assert_eq!(sanitize_query("cat_ears", false), "cat_ears rating:general");
        assert_eq!(sanitize_query("", false), "rating:general");
    }

    #[test]
    fn nsfw_channels_keep_the_query_as_is() {
        assert_eq!(
            sanitize_query("cat_ears rating:explicit", true),
            "cat_ears rating:explicit"
        );
    }

    #[test]
    fn placeholder_queries_are_emptied() {
        assert_eq!(sanitize_query("None", true), "");
        assert_eq!(sanitize_query("error", true), "");
    }

    #[test]
    fn blacklisted_tags_are_dropped_and_negated() {
        let tags = build_tag_list("cat_ears guro score:>10");
        assert!(!tags.contains(&"guro".to_string()));
        assert!(tags.contains(&"cat_ears".to_string()));
        assert!(tags.contains(&"score:>10".to_string()));
        assert!(tags.contains(&"-guro".to_string()));
        assert!(tags.contains(&"-shota".to_string()));
        assert!(tags.contains(&"-video".to_string()));
    }

    #[test]
    fn only_embeddable_extensions_pass() {
        assert!(is_embeddable_image("https://x/y.png"));
        assert!(is_embeddable_image("https://x/y.gif"));
        assert!(!is_embeddable_image("https://x/y.mp4"));
        assert!(!is_embeddable_image("https://x/y.swf"));
    }

    #[test]
    fn large_posts_fall_back_to_the_sample() {
        let mut post = Post {
            id: 1,
            file_url: "https://x/full.png".to_string(),
            sample_url: "https://x/sample.jpg".to_string(),
            width: 3000,
            height: 2000,
            ..Default::default()
        };
        assert_eq!(preferred_image_url(&post), "https://x/sample.jpg");

        post.width = 1000;
        assert_eq!(preferred_image_url(&post), "https://x/full.png");

        post.width = 3000;
        post.sample_url.clear();
        assert_eq!(preferred_image_url(&post), "https://x/full.png");
    }
}
