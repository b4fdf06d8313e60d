use std::sync::Arc;

use serde::Deserialize;
use serenity::prelude::TypeMapKey;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub token: String,
    pub cmd_prefix: String,
    #[serde(default)]
    pub gelbooru_api_key: String,
    #[serde(default)]
    pub gelbooru_user_id: String,
    #[serde(default)]
    pub lavalink_ip: String,
    #[serde(default)]
    pub lavalink_password: String,
}

impl TypeMapKey for Config {
    type Value = Arc<Config>;
}
