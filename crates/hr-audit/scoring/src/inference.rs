//! Name and address inference driven by the catalog lexicon.

use hr_audit_types::{Gender, Lexicon, SesLevel};

/// Confidence assigned to a lexicon hit.
pub const LEXICON_CONFIDENCE: f64 = 0.85;

/// Confidence a gender inference must exceed before a predicate acts on it.
pub const GENDER_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Split a full name into lowercase tokens.
pub fn name_tokens(full_name: &str) -> impl Iterator<Item = String> + '_ {
    full_name
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Infer gender from the first token of a name.
pub fn infer_gender(lexicon: &Lexicon, full_name: &str) -> (Gender, f64) {
    let Some(first) = name_tokens(full_name).next() else {
        return (Gender::Unknown, 0.0);
    };
    if lexicon.female_names.contains(&first) {
        (Gender::Female, LEXICON_CONFIDENCE)
    } else if lexicon.male_names.contains(&first) {
        (Gender::Male, LEXICON_CONFIDENCE)
    } else {
        (Gender::Unknown, 0.0)
    }
}

/// Whether any whole name token is a minority indicator.
///
/// Token matching, not substring matching: "Alice" does not match "ali".
pub fn is_minority_name(lexicon: &Lexicon, full_name: &str) -> bool {
    name_tokens(full_name).any(|t| lexicon.minority_tokens.contains(&t))
}

pub fn ses_level(lexicon: &Lexicon, postal_code: &str) -> SesLevel {
    let code = postal_code.trim();
    if lexicon.high_ses_postal_codes.contains(code) {
        SesLevel::High
    } else if lexicon.low_ses_postal_codes.contains(code) {
        SesLevel::Low
    } else {
        SesLevel::Medium
    }
}
