//! Tidies up the names riders see.

use regex::Regex;

lazy_static::lazy_static! {
    static ref EXCHANGE: Regex = Regex::new(r"(?i)(^|\W)exchange(\W|$)").unwrap();
    static ref DOWNTOWN_TYPO: Regex = Regex::new(r"(?i)(^|\W)downtwon(\W|$)").unwrap();
    static ref ENDS_WITH_VIA: Regex = Regex::new(r"(?i) via .*$").unwrap();
    static ref STARTS_WITH_TO: Regex = Regex::new(r"(?i)^.*\bto ").unwrap();
    static ref STARTS_WITH_NUMBER: Regex = Regex::new(r"^\d+\S*").unwrap();
    static ref STARTS_WITH_IMPL: Regex = Regex::new(r"(?i)^\(-IMPL-\)").unwrap();
    static ref BOUNDS: Regex = Regex::new(r"(?i)\((NB|SB|EB|WB)\)").unwrap();
    static ref BOUND_WORDS: Regex = Regex::new(r"(?i)\b(north|south|east|west)bound\b").unwrap();
    static ref AND: Regex = Regex::new(r"(?i)(^|\s)(and|&)(\s|$)").unwrap();
    static ref AT: Regex = Regex::new(r"(?i)(^|\s)at(\s|$)").unwrap();
    static ref SPACES: Regex = Regex::new(r"\s+").unwrap();

    static ref STREET_TYPES: Vec<(Regex, &'static str)> = [
        ("avenue", "Ave"),
        ("boulevard", "Blvd"),
        ("centre|center", "Ctr"),
        ("court", "Ct"),
        ("crescent", "Cres"),
        ("drive", "Dr"),
        ("highway", "Hwy"),
        ("lane", "Ln"),
        ("parkway", "Pkwy"),
        ("place", "Pl"),
        ("road", "Rd"),
        ("street", "St"),
        ("terrace", "Terr"),
    ]
    .into_iter()
    .map(|(words, short)| (word_regex(words), short))
    .collect();

    static ref NUMBERS: Vec<(Regex, &'static str)> = [
        ("first", "1st"),
        ("second", "2nd"),
        ("third", "3rd"),
        ("fourth", "4th"),
        ("fifth", "5th"),
        ("sixth", "6th"),
        ("seventh", "7th"),
        ("eighth", "8th"),
        ("ninth", "9th"),
        ("tenth", "10th"),
    ]
    .into_iter()
    .map(|(word, short)| (word_regex(word), short))
    .collect();
}

fn word_regex(words: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b({words})\b")).unwrap()
}

fn replace_words(x: &str, table: &[(Regex, &str)]) -> String {
    let mut x = x.to_string();
    for (re, short) in table {
        x = re.replace_all(&x, *short).into_owned();
    }
    x
}

/// Shortens street types, like "Avenue" to "Ave", and spelled-out ordinals, like "Fifth" to "5th".
pub fn clean_street_names(x: &str) -> String {
    replace_words(&replace_words(x, &STREET_TYPES), &NUMBERS)
}

pub fn clean_trip_headsign(headsign: &str) -> String {
    let mut x = if is_shouting(headsign) {
        headsign.to_lowercase()
    } else {
        headsign.to_string()
    };
    x = EXCHANGE.replace_all(&x, "${1}Exch${2}").into_owned();
    x = DOWNTOWN_TYPO.replace_all(&x, "${1}Downtown${2}").into_owned();
    x = ENDS_WITH_VIA.replace_all(&x, "").into_owned();
    x = STARTS_WITH_TO.replace_all(&x, "").into_owned();
    x = AND.replace_all(&x, "${1}&${3}").into_owned();
    x = STARTS_WITH_NUMBER.replace_all(&x, "").into_owned();
    clean_label(&clean_street_names(&x))
}

pub fn clean_stop_name(name: &str) -> String {
    let mut x = STARTS_WITH_IMPL.replace_all(name, "").into_owned();
    x = BOUNDS.replace_all(&x, "").into_owned();
    x = BOUND_WORDS.replace_all(&x, "").into_owned();
    x = AT.replace_all(&x, "${1}@${2}").into_owned();
    x = EXCHANGE.replace_all(&x, "${1}Exch${2}").into_owned();
    clean_label(&clean_street_names(&x))
}

pub fn clean_route_long_name(name: &str) -> String {
    clean_label(&clean_street_names(&name.replace('/', " / ")))
}

/// Collapses whitespace and capitalizes the first letter of every word.
pub fn clean_label(x: &str) -> String {
    SPACES
        .split(x.trim())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// No lowercase at all, and at least one real word. Short acronyms like NIC are left alone.
fn is_shouting(x: &str) -> bool {
    !x.chars().any(|c| c.is_lowercase())
        && x
            .split_whitespace()
            .any(|word| word.chars().filter(|c| c.is_alphabetic()).count() >= 4)
}
