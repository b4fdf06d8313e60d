use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One menu item for the bartender commands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drink {
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub footer: String,
}

/// The menu every guild starts with.
pub fn default_menu() -> BTreeMap<String, Drink> {
    let mut menu = BTreeMap::new();
    menu.insert(
        "latte".to_string(),
        Drink {
            intro: String::new(),
            body: String::new(),
            images: vec!["https://source.unsplash.com/kSlL887znkE/600x400".to_string()],
            emoji: "☕".to_string(),
            footer: "Enjoy a quality hot coffee!".to_string(),
        },
    );
    menu.insert(
        "boba".to_string(),
        Drink {
            intro: "some very good bubble tea".to_string(),
            body: String::new(),
            images: vec!["https://source.unsplash.com/P_wPicZYoPI/600x400".to_string()],
            emoji: "🧋".to_string(),
            footer: "Share some quality boba with your friends!".to_string(),
        },
    );
    menu
}
