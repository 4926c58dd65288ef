//! Canonical comparison keys for free-text golfer and tournament names.
//!
//! Keys are lower-case, contain only `[a-z0-9 ]` and single spaces. The tournament
//! profile additionally drops sponsor clauses and low-signal words, which must never
//! happen to a person's name.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProfile {
    Person,
    Tournament,
}

const LOW_SIGNAL_TOKENS: [&str; 7] = [
    "the",
    "tournament",
    "championship",
    "invitational",
    "open",
    "classic",
    "by",
];

/// Low-signal words that say nothing even when nothing else is left.
const FILLER_TOKENS: [&str; 4] = ["the", "tournament", "championship", "by"];

/// Words that start a sponsor clause when followed by "by".
const SPONSOR_LEADS: [&str; 3] = ["presented", "sponsored", "pres"];

pub fn normalize(name: &str, profile: NameProfile) -> String {
    match profile {
        NameProfile::Person => normalize_person(name),
        NameProfile::Tournament => normalize_tournament(name),
    }
}

pub fn normalize_person(name: &str) -> String {
    tokens(name).join(" ")
}

pub fn normalize_tournament(name: &str) -> String {
    let base = tokens(name);

    let sponsor_at = base
        .windows(2)
        .position(|w| SPONSOR_LEADS.contains(&w[0].as_str()) && w[1] == "by");
    let kept = match sponsor_at {
        Some(i) => &base[..i],
        None => &base[..],
    };

    let mut out: Vec<&str> = Vec::with_capacity(kept.len());
    for token in kept.iter().map(String::as_str) {
        if LOW_SIGNAL_TOKENS.contains(&token) {
            continue;
        }
        if token == "am" && out.last() == Some(&"pro") {
            out.pop();
            continue;
        }
        out.push(token);
    }

    // "The Open Championship" would vanish entirely, keep "open".
    if out.is_empty() {
        let named: Vec<&str> = kept
            .iter()
            .map(String::as_str)
            .filter(|t| !FILLER_TOKENS.contains(t))
            .collect();
        return if named.is_empty() {
            base.join(" ")
        } else {
            named.join(" ")
        };
    }
    out.join(" ")
}

fn tokens(name: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match fold(c) {
            Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => cleaned.push(c),
            // J.T. and O'Hair stay glued together
            Some('.') | Some('\'') | Some('\u{2019}') => {}
            _ => cleaned.push(' '),
        }
    }
    cleaned.split_whitespace().map(String::from).collect()
}

/// Folds the accented latin letters that show up in player names.
fn fold(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'å' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'ø' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(folded)
}
