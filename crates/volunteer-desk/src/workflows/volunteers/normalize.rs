//! Text normalization shared by every comparison the engines make.
//!
//! Backend values are typed by hand in admin forms, so the same phototype shows up as
//! `"2"`, `"Phototype 2"` or `"II"`, and ethnicities carry free-form sub-variants. All
//! comparisons go through [`fold`] first: lower case, no diacritics, single spaces.

use super::domain::{EthnicGroup, Phototype, Sex};

/// Lower-case `text`, strip diacritics and collapse whitespace.
pub fn fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_lowercase) {
        match ch {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => folded.push('a'),
            'ç' => folded.push('c'),
            'è' | 'é' | 'ê' | 'ë' => folded.push('e'),
            'ì' | 'í' | 'î' | 'ï' => folded.push('i'),
            'ñ' => folded.push('n'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => folded.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => folded.push('u'),
            'ý' | 'ÿ' => folded.push('y'),
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            'ß' => folded.push_str("ss"),
            other => folded.push(other),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map free-text sex values onto the canonical pair.
pub fn parse_sex(text: &str) -> Option<Sex> {
    let folded: String = fold(text).chars().filter(|ch| ch.is_alphabetic()).collect();

    match folded.as_str() {
        "m" | "h" | "homme" | "masculin" | "male" | "man" => Some(Sex::Masculine),
        "f" | "femme" | "feminin" | "female" | "woman" => Some(Sex::Feminine),
        value if value.starts_with("masc") || value.starts_with("homme") => Some(Sex::Masculine),
        value if value.starts_with("fem") => Some(Sex::Feminine),
        _ => None,
    }
}

/// Extract a phototype from text: first digit run, then Roman numerals.
pub fn parse_phototype(text: &str) -> Option<Phototype> {
    let digits: String = text
        .chars()
        .skip_while(|ch| !ch.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    if !digits.is_empty() {
        return digits.parse::<u8>().ok().and_then(Phototype::new);
    }

    fold(text)
        .split(|ch: char| !ch.is_ascii_alphabetic())
        .filter_map(|token| match token {
            "i" => Phototype::new(1),
            "ii" => Phototype::new(2),
            "iii" => Phototype::new(3),
            "iv" => Phototype::new(4),
            "v" => Phototype::new(5),
            "vi" => Phototype::new(6),
            _ => None,
        })
        .last()
}

// Checked in order: "caucasien" contains "asie" and "nord-africain" contains "afric".
const ETHNICITY_ALIASES: &[(&str, EthnicGroup)] = &[
    ("caucas", EthnicGroup::Caucasian),
    ("europ", EthnicGroup::Caucasian),
    ("blanc", EthnicGroup::Caucasian),
    ("white", EthnicGroup::Caucasian),
    ("maghreb", EthnicGroup::NorthAfrican),
    ("nord afric", EthnicGroup::NorthAfrican),
    ("north afric", EthnicGroup::NorthAfrican),
    ("antill", EthnicGroup::Caribbean),
    ("carib", EthnicGroup::Caribbean),
    ("afric", EthnicGroup::African),
    ("noir", EthnicGroup::African),
    ("black", EthnicGroup::African),
    ("moyen orient", EthnicGroup::MiddleEastern),
    ("middle east", EthnicGroup::MiddleEastern),
    ("indien", EthnicGroup::Indian),
    ("indian", EthnicGroup::Indian),
    ("asia", EthnicGroup::Asian),
    ("asie", EthnicGroup::Asian),
    ("hispan", EthnicGroup::Hispanic),
    ("latin", EthnicGroup::Hispanic),
    ("metis", EthnicGroup::Mixed),
    ("mixte", EthnicGroup::Mixed),
    ("mixed", EthnicGroup::Mixed),
];

/// Collapse an ethnicity label and its sub-variant onto a canonical category.
pub fn parse_ethnicity(text: &str) -> Option<EthnicGroup> {
    let folded = fold(&text.replace(['-', '_', '/'], " "));
    if folded.is_empty() {
        return None;
    }

    let category = ETHNICITY_ALIASES
        .iter()
        .find(|(needle, _)| folded.contains(needle))
        .map(|(_, group)| group.clone())
        .unwrap_or(EthnicGroup::Other(folded));
    Some(category)
}

/// Whether a habit questionnaire answer counts as "uses this product".
pub fn is_affirmative(text: &str) -> bool {
    matches!(
        fold(text).as_str(),
        "oui" | "o" | "yes" | "y" | "true" | "vrai" | "1" | "x"
    )
}

/// Split semicolon (or comma) separated lists such as group phototype constraints.
pub fn split_list(text: &str) -> Vec<String> {
    text.split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
