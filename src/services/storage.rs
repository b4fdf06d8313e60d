use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use tokio::sync::RwLock;

use crate::models::drink::{default_menu, Drink};

/// Everything the bot persists, in one JSON file. Each write rewrites the
/// whole file; the data is tiny and every command invocation is
/// independent, so last write wins is all we need.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageData {
    #[serde(default)]
    users: HashMap<u64, UserSettings>,
    #[serde(default)]
    guilds: HashMap<u64, GuildSettings>,
    #[serde(default)]
    tag_cache: HashMap<String, String>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub usertime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSettings {
    #[serde(default = "default_menu")]
    pub drinks: BTreeMap<String, Drink>,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self {
            drinks: default_menu(),
        }
    }
}

pub struct Storage {
    path: PathBuf,
    data: RwLock<StorageData>,
}

impl TypeMapKey for Storage {
    type Value = Arc<Storage>;
}

impl Storage {
    pub async fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|ex| io::Error::new(io::ErrorKind::InvalidData, ex))?,
            Err(ex) if ex.kind() == io::ErrorKind::NotFound => StorageData::default(),
            Err(ex) => return Err(ex),
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    async fn save(&self, data: &StorageData) -> io::Result<()> {
        let text = serde_json::to_string_pretty(data)
            .map_err(|ex| io::Error::new(io::ErrorKind::InvalidData, ex))?;
        tokio::fs::write(&self.path, text).await
    }

    pub async fn user_timezone(&self, user_id: u64) -> Option<String> {
        self.data
            .read()
            .await
            .users
            .get(&user_id)
            .and_then(|settings| settings.usertime.clone())
    }

    pub async fn set_user_timezone(&self, user_id: u64, identifier: &str) -> io::Result<()> {
        let mut data = self.data.write().await;
        data.users.entry(user_id).or_default().usertime = Some(identifier.to_string());
        self.save(&data).await
    }

    /// Wipe everything stored for a user, for data-deletion requests.
    pub async fn delete_user_data(&self, user_id: u64) -> io::Result<()> {
        let mut data = self.data.write().await;
        data.users.remove(&user_id);
        self.save(&data).await
    }

    pub async fn drinks(&self, guild_id: u64) -> BTreeMap<String, Drink> {
        self.data
            .read()
            .await
            .guilds
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
            .drinks
    }

    pub async fn add_drink(&self, guild_id: u64, name: &str, drink: Drink) -> io::Result<()> {
        let mut data = self.data.write().await;
        data.guilds
            .entry(guild_id)
            .or_default()
            .drinks
            .insert(name.to_string(), drink);
        self.save(&data).await
    }

    /// Returns whether the drink was actually on the menu.
    pub async fn remove_drink(&self, guild_id: u64, name: &str) -> io::Result<bool> {
        let mut data = self.data.write().await;
        let removed = data
            .guilds
            .entry(guild_id)
            .or_default()
            .drinks
            .remove(name)
            .is_some();
        self.save(&data).await?;
        Ok(removed)
    }

    pub async fn cached_tags(&self, query: &str) -> Option<Vec<String>> {
        self.data
            .read()
            .await
            .tag_cache
            .get(query)
            .map(|joined| joined.split(' ').map(str::to_string).collect())
    }

    pub async fn cache_tags(&self, query: &str, tags: &[String]) -> io::Result<()> {
        let mut data = self.data.write().await;
        data.tag_cache.insert(query.to_string(), tags.join(" "));
        self.save(&data).await
    }

    pub async fn clear_tag_cache(&self) -> io::Result<()> {
        let mut data = self.data.write().await;
        data.tag_cache.clear();
        self.save(&data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_storage(dir: &tempfile::TempDir) -> Storage {
        Storage::load(dir.path().join("storage.json")).await.unwrap()
    }

    #[tokio::test]
    async fn timezone_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;

        assert_eq!(storage.user_timezone(1).await, None);
        storage.set_user_timezone(1, "Europe/Paris").await.unwrap();
        assert_eq!(
            storage.user_timezone(1).await,
            Some("Europe/Paris".to_string())
        );

        storage.delete_user_data(1).await.unwrap();
        assert_eq!(storage.user_timezone(1).await, None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;

        storage.set_user_timezone(1, "Asia/Tokyo").await.unwrap();
        storage.set_user_timezone(1, "Europe/Paris").await.unwrap();
        assert_eq!(
            storage.user_timezone(1).await,
            Some("Europe/Paris".to_string())
        );
    }

    #[tokio::test]
    async fn data_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        {
            let storage = Storage::load(&path).await.unwrap();
            storage.set_user_timezone(7, "Asia/Tokyo").await.unwrap();
            storage
                .add_drink(42, "matcha", Drink::default())
                .await
                .unwrap();
        }

        let storage = Storage::load(&path).await.unwrap();
        assert_eq!(
            storage.user_timezone(7).await,
            Some("Asia/Tokyo".to_string())
        );
        assert!(storage.drinks(42).await.contains_key("matcha"));
    }

    #[tokio::test]
    async fn guilds_start_with_the_default_menu() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;

        let menu = storage.drinks(123).await;
        assert!(menu.contains_key("latte"));
        assert!(menu.contains_key("boba"));

        assert!(storage.remove_drink(123, "latte").await.unwrap());
        assert!(!storage.drinks(123).await.contains_key("latte"));
        assert!(!storage.remove_drink(123, "latte").await.unwrap());
    }

    #[tokio::test]
    async fn tag_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;

        assert_eq!(storage.cached_tags("cat").await, None);
        let tags = vec!["cat_ears".to_string(), "cat_tail".to_string()];
        storage.cache_tags("cat", &tags).await.unwrap();
        assert_eq!(storage.cached_tags("cat").await, Some(tags));

        storage.clear_tag_cache().await.unwrap();
        assert_eq!(storage.cached_tags("cat").await, None);
    }
}
