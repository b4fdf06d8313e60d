use serde::Deserialize;
use uuid::Uuid;

use crate::Error;

const PROFILE_API: &str = "https://api.mojang.com/users/profiles/minecraft";

/// A resolved Mojang profile. The API hands the UUID back without dashes.
#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
}

impl Player {
    pub async fn lookup(client: &reqwest::Client, name: &str) -> Result<Player, Error> {
        let response = client
            .get(format!("{PROFILE_API}/{name}"))
            .send()
            .await
            .map_err(|_| "Could not reach the Mojang API, try again later.")?;

        if !response.status().is_success() {
            return Err(format!("Could not find **{name}** on Mojang's servers.").into());
        }

        response
            .json::<Player>()
            .await
            .map_err(|_| format!("Could not find **{name}** on Mojang's servers.").into())
    }

    /// Some cape services want the UUID in its canonical dashed form.
    pub fn dashed_uuid(&self) -> Result<String, Error> {
        Ok(Uuid::parse_str(&self.id)?.hyphenated().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashes_go_where_the_rfc_says() {
        let player = Player {
            id: "069a79f444e94726a5befca90e38aaf5".to_string(),
            name: "Notch".to_string(),
        };
        assert_eq!(
            player.dashed_uuid().unwrap(),
            "069a79f4-44e9-4726-a5be-fca90e38aaf5"
        );
    }

    #[test]
    fn garbage_uuids_are_an_error() {
        let player = Player {
            id: "not-a-uuid".to_string(),
            name: "x".to_string(),
        };
        assert!(player.dashed_uuid().is_err());
    }
}
