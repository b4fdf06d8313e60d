use serde::Deserialize;
use serde_json::Value;

use crate::Error;

const API_URL: &str = "https://jisho.org/api/v1/search/words";

/// Only the first few results get their own embed page.
pub const PAGE_CAP: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_common: bool,
    #[serde(default)]
    pub jlpt: Vec<String>,
    #[serde(default)]
    pub japanese: Vec<JapaneseForm>,
    #[serde(default)]
    pub senses: Vec<Sense>,
    // Values here are booleans except dbpedia, which may be a URL string.
    #[serde(default)]
    pub attribution: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct JapaneseForm {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub reading: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Sense {
    #[serde(default)]
    pub english_definitions: Vec<String>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
}

pub async fn search(client: &reqwest::Client, text: &str) -> Result<SearchResponse, Error> {
    let url = reqwest::Url::parse_with_params(API_URL, &[("keyword", text)])?;
    Ok(client.get(url).send().await?.json().await?)
}

/// "word (reading)" when both are present, otherwise whichever exists.
pub fn entry_title(entry: &Entry) -> String {
    let form = entry.japanese.first();
    let word = form.and_then(|f| f.word.as_deref());
    let reading = form.and_then(|f| f.reading.as_deref());

    match (word, reading) {
        (Some(word), Some(reading)) if word != reading => format!("{word} ({reading})"),
        (Some(word), _) => word.to_string(),
        (None, Some(reading)) => reading.to_string(),
        (None, None) => entry.slug.clone(),
    }
}

pub fn entry_url(entry: &Entry) -> String {
    format!("https://jisho.org/word/{}", entry.slug)
}

/// Alternate forms plus the common/JLPT badges, for the embed description.
pub fn entry_description(entry: &Entry) -> String {
    let mut parts = Vec::new();

    let alternates: Vec<String> = entry
        .japanese
        .iter()
        .skip(1)
        .map(|form| match (&form.word, &form.reading) {
            (Some(word), Some(reading)) if word != reading => format!("{word} ({reading})"),
            (Some(word), _) => word.clone(),
            (None, Some(reading)) => reading.clone(),
            (None, None) => String::new(),
        })
        .filter(|form| !form.is_empty())
        .collect();
    if !alternates.is_empty() {
        parts.push(format!("Also written as {}", alternates.join("、")));
    }

    if entry.is_common {
        parts.push("Common word".to_string());
    }
    parts.extend(entry.jlpt.iter().map(|level| level.replace("jlpt-", "JLPT ").to_uppercase()));

    parts.join(" ・ ")
}

/// One embed field per sense: parts of speech as the name, numbered
/// definitions as the value.
pub fn sense_field(index: usize, sense: &Sense) -> (String, String) {
    let name = if sense.parts_of_speech.is_empty() {
        format!("{}.", index + 1)
    } else {
        format!("{}. {}", index + 1, sense.parts_of_speech.join(", "))
    };
    (name, sense.english_definitions.join("; "))
}

pub fn attribution_line(entry: &Entry) -> String {
    let mut sources = Vec::new();
    for (key, label) in [
        ("jmdict", "JMdict"),
        ("jmnedict", "JMnedict"),
        ("dbpedia", "DBpedia"),
    ] {
        let value = &entry.attribution[key];
        // dbpedia reports its source URL instead of `true`.
        if value.as_bool().unwrap_or(false) || value.is_string() {
            sources.push(label);
        }
    }
    sources.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> Entry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn title_combines_word_and_reading() {
        let e = entry(r#"{"slug":"東京","japanese":[{"word":"東京","reading":"とうきょう"}]}"#);
        assert_eq!(entry_title(&e), "東京 (とうきょう)");
    }

    #[test]
    fn kana_only_entries_skip_the_parenthetical() {
        let e = entry(r#"{"slug":"らーめん","japanese":[{"reading":"らーめん"}]}"#);
        assert_eq!(entry_title(&e), "らーめん");

        let same = entry(r#"{"slug":"x","japanese":[{"word":"です","reading":"です"}]}"#);
        assert_eq!(entry_title(&same), "です");
    }

    #[test]
    fn senses_become_numbered_fields() {
        let e = entry(
            r#"{"slug":"x","senses":[
                {"english_definitions":["Tokyo","capital of Japan"],"parts_of_speech":["Noun"]},
                {"english_definitions":["place name"],"parts_of_speech":[]}
            ]}"#,
        );
        let (name, value) = sense_field(0, &e.senses[0]);
        assert_eq!(name, "1. Noun");
        assert_eq!(value, "Tokyo; capital of Japan");

        let (name, _) = sense_field(1, &e.senses[1]);
        assert_eq!(name, "2.");
    }

    #[test]
    fn attribution_handles_the_dbpedia_url() {
        let e = entry(
            r#"{"slug":"x","attribution":{"jmdict":true,"jmnedict":false,"dbpedia":"http://dbpedia.org/resource/Tokyo"}}"#,
        );
        assert_eq!(attribution_line(&e), "JMdict, DBpedia");

        let none = entry(r#"{"slug":"x"}"#);
        assert_eq!(attribution_line(&none), "");
    }

    #[test]
    fn description_carries_badges_and_alternates() {
        let e = entry(
            r#"{"slug":"x","is_common":true,"jlpt":["jlpt-n5"],
                "japanese":[{"word":"東京","reading":"とうきょう"},{"word":"東亰","reading":"とうきょう"}]}"#,
        );
        let description = entry_description(&e);
        assert!(description.contains("東亰"));
        assert!(description.contains("Common word"));
        assert!(description.contains("JLPT N5"));
    }
}
