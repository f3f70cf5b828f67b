//! Slug derivation
//!
//! A slug is lowercase ASCII alphanumerics separated by single hyphens.
//! Accented Latin letters are folded to their ASCII base first; any other
//! run of characters becomes one separator.

use regex::Regex;
use std::sync::LazyLock;

static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[^a-z0-9]+").unwrap_or_else(|e| panic!("invalid slug regex: {e}"))
});

/// Derives a slug from free text. May return an empty string.
pub fn slugify(source: &str) -> String {
    let mut folded = String::with_capacity(source.len());
    for c in source.chars().flat_map(char::to_lowercase) {
        match fold_latin(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }
    SEPARATOR_RUN
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Whether `s` is already in slug form.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty() && slugify(s) == s
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}
