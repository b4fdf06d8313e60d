use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;

/// Scores are 0-100; anything at or below this is considered noise.
/// Near-exact matches only, so "San Francisco" doesn't pick up some
/// unrelated zone sharing a substring.
const SCORE_CUTOFF: u8 = 98;

/// Hard cap on how many candidates a single query can produce.
const CANDIDATE_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneCandidate {
    pub identifier: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NoMatch,
    Single(TimezoneCandidate),
    Ambiguous(Vec<TimezoneCandidate>),
}

/// Every canonical zone identifier known to the tz database.
pub fn catalog() -> impl Iterator<Item = &'static str> {
    chrono_tz::TZ_VARIANTS.iter().map(|tz| tz.name())
}

pub fn parse_zone(identifier: &str) -> Option<Tz> {
    identifier.parse().ok()
}

/// Fuzzy-match a free-text city/region name against the zone catalog.
///
/// The query gets its spaces replaced with underscores to match the
/// catalog's naming convention, then both sides are folded to lowercase
/// words before scoring. Results come back in descending score order.
pub fn resolve<'a, I>(query: &str, catalog: I) -> Vec<TimezoneCandidate>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = normalize(&query.replace(' ', "_"));
    if query.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<TimezoneCandidate> = catalog
        .into_iter()
        .map(|identifier| TimezoneCandidate {
            score: partial_ratio(&query, &normalize(identifier)),
            identifier: identifier.to_string(),
        })
        .filter(|candidate| candidate.score > SCORE_CUTOFF)
        .collect();

    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(CANDIDATE_LIMIT);
    candidates
}

pub fn disambiguate(mut candidates: Vec<TimezoneCandidate>) -> Resolution {
    match candidates.len() {
        0 => Resolution::NoMatch,
        1 => Resolution::Single(candidates.remove(0)),
        _ => Resolution::Ambiguous(candidates),
    }
}

/// Lowercase and squash anything that isn't alphanumeric into single spaces.
fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Best-window substring alignment score between two strings, 0-100.
///
/// The shorter string is slid across the longer one and the best
/// normalized edit-distance similarity of any window wins.
fn partial_ratio(a: &str, b: &str) -> u8 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best = 0.0f64;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let score = strsim::normalized_levenshtein(short, &window);
        if score > best {
            best = score;
        }
        if best >= 1.0 {
            break;
        }
    }

    (best * 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeComparison {
    /// Absolute difference of the two UTC offsets, in hours. Fractional
    /// for the 30/45-minute zones.
    pub delta_hours: f64,
    /// True when the first zone's clock lags behind the second's.
    pub first_earlier: bool,
}

/// Compare two zones at a given instant. Offsets are looked up at that
/// instant, so daylight-saving transitions are accounted for.
pub fn compare(first: Tz, second: Tz, at: DateTime<Utc>) -> TimeComparison {
    let first_offset = utc_offset_hours(first, at);
    let second_offset = utc_offset_hours(second, at);

    TimeComparison {
        delta_hours: (first_offset - second_offset).abs(),
        first_earlier: first_offset < second_offset,
    }
}

fn utc_offset_hours(zone: Tz, at: DateTime<Utc>) -> f64 {
    let local = at.with_timezone(&zone);
    f64::from(local.offset().fix().local_minus_utc()) / 3600.0
}

/// Render the second zone's clock relative to the first's, e.g.
/// "3 hours later than you". Singular only for a delta of exactly one.
pub fn describe_difference(comparison: &TimeComparison) -> String {
    let amount = format!("{}", comparison.delta_hours);
    if amount == "0" {
        return "the same time as you".to_string();
    }

    let unit = if amount == "1" { "hour" } else { "hours" };
    let direction = if comparison.first_earlier {
        "later than you"
    } else {
        "earlier than you"
    };

    format!("{amount} {unit} {direction}")
}

/// The long time format: 24h clock, 12h clock, full date, zone and offset.
pub fn format_time_verbose(time: &DateTime<Tz>) -> String {
    time.format("**%H:%M** *(%I:%M %p)*\n**%A, %d %B %Y**\n*%Z (UTC %z)*")
        .to_string()
}

/// The one-line format used when listing someone else's time.
pub fn format_time_short(time: &DateTime<Tz>) -> String {
    time.format("**%H:%M %Z (UTC %z)**").to_string()
}

/// Like the short format, but with the date, for profile lookups.
pub fn format_time_dated(time: &DateTime<Tz>) -> String {
    time.format("**%H:%M** %d-%B-%Y **%Z (UTC %z)**").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_catalog() -> Vec<&'static str> {
        catalog().collect()
    }

    #[test]
    fn exact_identifier_scores_one_hundred() {
        let results = resolve("America/Los_Angeles", sample_catalog());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identifier, "America/Los_Angeles");
        assert_eq!(results[0].score, 100);
    }

    #[test]
    fn city_with_spaces_matches_underscored_zone() {
        let results = resolve("los angeles", sample_catalog());
        assert!(results
            .iter()
            .any(|c| c.identifier == "America/Los_Angeles" && c.score == 100));
    }

    #[test]
    fn every_catalog_entry_resolves_itself() {
        let all = sample_catalog();
        for identifier in catalog() {
            let results = resolve(identifier, all.clone());
            assert!(
                results
                    .iter()
                    .any(|c| c.identifier == identifier && c.score == 100),
                "{identifier} did not resolve to itself"
            );
        }
    }

    #[test]
    fn garbage_query_matches_nothing() {
        assert!(resolve("qqqqxxxxqqqq", sample_catalog()).is_empty());
        assert!(resolve("   ", sample_catalog()).is_empty());
    }

    #[test]
    fn results_are_sorted_by_descending_score() {
        let results = resolve("tokyo", sample_catalog());
        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn disambiguate_empty_is_no_match() {
        assert_eq!(disambiguate(Vec::new()), Resolution::NoMatch);
    }

    #[test]
    fn disambiguate_single_wraps_the_candidate() {
        let candidate = TimezoneCandidate {
            identifier: "Asia/Tokyo".to_string(),
            score: 100,
        };
        assert_eq!(
            disambiguate(vec![candidate.clone()]),
            Resolution::Single(candidate)
        );
    }

    #[test]
    fn disambiguate_many_preserves_order() {
        let first = TimezoneCandidate {
            identifier: "America/New_York".to_string(),
            score: 100,
        };
        let second = TimezoneCandidate {
            identifier: "America/North_Dakota/New_Salem".to_string(),
            score: 99,
        };
        match disambiguate(vec![first.clone(), second.clone()]) {
            Resolution::Ambiguous(list) => assert_eq!(list, vec![first, second]),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn zone_compared_to_itself_never_differs() {
        let at = Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap();
        for name in ["Asia/Tokyo", "Australia/Eucla", "America/Santiago"] {
            let zone = parse_zone(name).unwrap();
            let comparison = compare(zone, zone, at);
            assert_eq!(comparison.delta_hours, 0.0);
            assert_eq!(describe_difference(&comparison), "the same time as you");
        }
    }

    #[test]
    fn west_coast_trails_east_coast_by_three() {
        let la = parse_zone("America/Los_Angeles").unwrap();
        let ny = parse_zone("America/New_York").unwrap();
        // Mid-January, nowhere near a DST transition.
        let at = Utc.with_ymd_and_hms(2023, 1, 15, 12, 0, 0).unwrap();
        let comparison = compare(la, ny, at);
        assert_eq!(comparison.delta_hours, 3.0);
        assert!(comparison.first_earlier);
    }

    #[test]
    fn fractional_offsets_come_out_fractional() {
        let kathmandu = parse_zone("Asia/Kathmandu").unwrap();
        let utc_zone = parse_zone("UTC").unwrap();
        let at = Utc.with_ymd_and_hms(2023, 1, 15, 12, 0, 0).unwrap();
        let comparison = compare(utc_zone, kathmandu, at);
        assert_eq!(comparison.delta_hours, 5.75);
        assert_eq!(
            describe_difference(&comparison),
            "5.75 hours later than you"
        );
    }

    #[test]
    fn delta_of_exactly_one_is_singular() {
        let comparison = TimeComparison {
            delta_hours: 1.0,
            first_earlier: false,
        };
        assert_eq!(describe_difference(&comparison), "1 hour earlier than you");
    }

    #[test]
    fn other_deltas_are_plural() {
        let comparison = TimeComparison {
            delta_hours: 2.5,
            first_earlier: true,
        };
        assert_eq!(describe_difference(&comparison), "2.5 hours later than you");
    }

    #[test]
    fn dated_format_carries_the_date() {
        let zone = parse_zone("Asia/Tokyo").unwrap();
        let at = Utc
            .with_ymd_and_hms(2023, 1, 15, 3, 4, 0)
            .unwrap()
            .with_timezone(&zone);
        assert_eq!(
            format_time_dated(&at),
            "**12:04** 15-January-2023 **JST (UTC +0900)**"
        );
        assert_eq!(format_time_short(&at), "**12:04 JST (UTC +0900)**");
    }

    #[test]
    fn partial_ratio_finds_substrings() {
        assert_eq!(partial_ratio("tokyo", "asia tokyo"), 100);
        assert_eq!(partial_ratio("asia tokyo", "tokyo"), 100);
        assert!(partial_ratio("london", "asia tokyo") < 60);
    }

    #[test]
    fn unknown_zone_does_not_parse() {
        assert!(parse_zone("Atlantis/Underwater").is_none());
        assert!(parse_zone("Europe/Paris").is_some());
    }
}
