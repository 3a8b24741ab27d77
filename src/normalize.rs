//! Text normalization applied to every key before it reaches the store.
//!
//! The pipeline is fixed: lowercase, fold accents, strip ASCII symbols, then
//! collapse separator runs. Each stage after lowercasing can be switched off
//! through [`NormalizeOptions`]. The output is not trimmed; the key builder
//! trims when it writes into a [`SpellingMap`](crate::SpellingMap).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Code points treated as word boundaries by the separator-collapsing stage,
/// in addition to anything `char::is_whitespace` accepts.
const EXOTIC_SEPARATORS: &[char] = &[
    '\u{0009}', // character tabulation
    '\u{000A}', // line feed
    '\u{000B}', // line tabulation
    '\u{000C}', // form feed
    '\u{000D}', // carriage return
    '\u{0020}', // space
    '\u{0021}', // exclamation mark
    '\u{0022}', // quotation mark
    '\u{0027}', // apostrophe
    '\u{0028}', // left parenthesis
    '\u{0029}', // right parenthesis
    '\u{002C}', // comma
    '\u{003A}', // colon
    '\u{003B}', // semicolon
    '\u{003F}', // question mark
    '\u{0085}', // next line
    '\u{00A0}', // no-break space
    '\u{00A7}', // section sign
    '\u{00B6}', // pilcrow
    '\u{00B7}', // interpunct
    '\u{01C3}', // latin letter retroflex click
    '\u{02D0}', // ipa triangular colon
    '\u{1680}', // ogham space mark
    '\u{2000}', // en quad
    '\u{2001}', // em quad
    '\u{2002}', // en space
    '\u{2003}', // em space
    '\u{2004}', // three-per-em space
    '\u{2005}', // four-per-em space
    '\u{2006}', // six-per-em space
    '\u{2007}', // figure space
    '\u{2008}', // punctuation space
    '\u{2009}', // thin space
    '\u{200A}', // hair space
    // U+2012 figure dash is deliberately absent: it appears inside words.
    '\u{2013}', // en dash
    '\u{2014}', // em dash
    '\u{2015}', // horizontal bar
    '\u{2022}', // bullet
    '\u{2025}', // two-dot leader
    '\u{2026}', // horizontal ellipsis
    '\u{2028}', // line separator
    '\u{2029}', // paragraph separator
    '\u{202F}', // narrow no-break space
    '\u{203C}', // double exclamation mark
    '\u{2047}', // double question mark
    '\u{2048}', // question exclamation mark
    '\u{2049}', // exclamation question mark
    '\u{205F}', // medium mathematical space
    '\u{2E0F}', // paragraphos
    '\u{3000}', // ideographic space
    '\u{3002}', // ideographic full stop
    '\u{303D}', // part alternation mark
    '\u{FE56}', // small question mark
    '\u{FE57}', // small exclamation mark
    '\u{FEFF}', // zero-width no-break space (byte order mark)
    '\u{FF01}', // full-width exclamation mark
    '\u{FF1A}', // full-width colon
    '\u{FF1F}', // full-width question mark
];

static SEPARATOR_SET: Lazy<HashSet<char>> =
    Lazy::new(|| EXOTIC_SEPARATORS.iter().copied().collect());

/// Toggles for the optional normalization stages. Lowercasing always runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub remove_non_alpha: bool,
    pub remove_accents: bool,
    pub clean_spaces: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_non_alpha: true,
            remove_accents: true,
            clean_spaces: true,
        }
    }
}

/// Runs the full pipeline over `text`. Total for any input; `""` maps to `""`.
#[must_use]
pub fn normalize(text: &str, options: &NormalizeOptions) -> String {
    let mut key = text.to_lowercase();
    if options.remove_accents {
        key = remove_accents(&key);
    }
    if options.remove_non_alpha {
        key = remove_non_alpha(&key);
    }
    if options.clean_spaces {
        key = clean_spaces(&key);
    }
    key
}

/// Folds accented Latin letters onto their base letter.
///
/// `æ` becomes `y` and `ß` becomes `b`; existing keys depend on that mapping.
/// Anything outside the table, including non-Latin scripts, is untouched.
#[must_use]
pub fn remove_accents(text: &str) -> String {
    text.chars().map(fold_accent).collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'ì' | 'í' => 'i',
        'ô' | 'ö' | 'õ' | 'ò' | 'ó' | 'ð' => 'o',
        'û' | 'ü' | 'ù' | 'ú' => 'u',
        'ç' => 'c',
        'ý' | 'ÿ' | 'æ' => 'y',
        'ß' => 'b',
        'ñ' => 'n',
        other => other,
    }
}

/// Replaces every ASCII character that is not a letter, digit or hyphen with
/// a space. Non-ASCII characters pass through.
#[must_use]
pub fn remove_non_alpha(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_alphanumeric() && c != '-' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Collapses every maximal run of separators into a single ASCII space.
#[must_use]
pub fn clean_spaces(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if is_separator(c) {
            if !in_run {
                output.push(' ');
                in_run = true;
            }
        } else {
            output.push(c);
            in_run = false;
        }
    }
    output
}

pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || SEPARATOR_SET.contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> String {
        normalize(text, &NormalizeOptions::default())
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(norm(" Vegetable, "), " vegetable ");
        assert_eq!(norm("vegetable."), "vegetable ");
    }

    #[test]
    fn folds_accents_before_stripping() {
        assert_eq!(norm("Crème Brûlée"), "creme brulee");
        assert_eq!(norm("Ñandú"), "nandu");
    }

    #[test]
    fn keeps_surprising_fold_targets() {
        assert_eq!(remove_accents("straße"), "strabe");
        assert_eq!(remove_accents("cæsar"), "cysar");
    }

    #[test]
    fn keeps_hyphens_and_digits() {
        assert_eq!(norm("Jean-Luc 2nd"), "jean-luc 2nd");
    }

    #[test]
    fn non_latin_scripts_survive() {
        assert_eq!(norm("浙江大学"), "浙江大学");
        assert_eq!(norm("저장 대학"), "저장 대학");
        assert_eq!(norm("Москва!"), "москва ");
    }

    #[test]
    fn collapses_exotic_separators() {
        assert_eq!(norm("a\u{3000}\u{2014}b"), "a b");
        assert_eq!(norm("東京。大阪"), "東京 大阪");
        assert_eq!(norm("•"), " ");
        assert_eq!(norm("\u{FEFF}Paris"), " paris");
        assert_eq!(norm(""), "");
    }

    #[test]
    fn stages_can_be_disabled() {
        let options = NormalizeOptions {
            remove_non_alpha: false,
            remove_accents: false,
            clean_spaces: false,
        };
        assert_eq!(normalize("Café, Bar", &options), "café, bar");

        let spaces_only = NormalizeOptions {
            remove_non_alpha: false,
            remove_accents: false,
            clean_spaces: true,
        };
        assert_eq!(normalize("Who?!  Me:", &spaces_only), "who me ");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: NormalizeOptions =
            serde_json::from_str(r#"{"remove_accents": false}"#).expect("valid options");
        assert!(!options.remove_accents);
        assert!(options.remove_non_alpha);
        assert!(options.clean_spaces);
    }
}
