/// Render a millisecond duration as h:mm:ss, or m:ss under an hour.
pub fn from_ms(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Split newline-delimited text into pages of at most `page_length`
/// characters, never breaking a line in half.
pub fn pagify(text: &str, page_length: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();

    for line in text.split('\n') {
        if !page.is_empty() && page.len() + line.len() + 1 > page_length {
            pages.push(std::mem::take(&mut page));
        }
        if !page.is_empty() {
            page.push('\n');
        }
        page.push_str(line);
    }

    if !page.is_empty() {
        pages.push(page);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ms_under_an_hour() {
        assert_eq!(from_ms(0), "0:00");
        assert_eq!(from_ms(61_000), "1:01");
        assert_eq!(from_ms(599_999), "9:59");
    }

    #[test]
    fn from_ms_with_hours() {
        assert_eq!(from_ms(3_600_000), "1:00:00");
        assert_eq!(from_ms(3_661_000), "1:01:01");
    }

    #[test]
    fn pagify_keeps_short_text_on_one_page() {
        assert_eq!(pagify("a\nb\nc", 500), vec!["a\nb\nc"]);
    }

    #[test]
    fn pagify_splits_on_line_boundaries() {
        let text = (0..10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let pages = pagify(&text, 20);
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| p.len() <= 20));
        assert_eq!(pages.join("\n"), text);
    }

    #[test]
    fn pagify_empty_text_has_no_pages() {
        assert!(pagify("", 500).is_empty());
    }
}
