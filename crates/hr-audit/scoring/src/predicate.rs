//! Predicate interpreter.
//!
//! Every predicate is a pure function of the profile and the lexicon. Missing
//! fields make a predicate false rather than an error; the only profile fields
//! that are hard requirements are the ones the base score needs.

use crate::inference::{self, GENDER_CONFIDENCE_THRESHOLD};
use hr_audit_types::{CandidateProfile, Lexicon, Predicate};
use serde_json::Value;

pub fn evaluate(predicate: &Predicate, profile: &CandidateProfile, lexicon: &Lexicon) -> bool {
    match predicate {
        Predicate::Equals { field, value } => profile
            .get(field)
            .is_some_and(|actual| values_equal(actual, value)),

        Predicate::Truthy { field } => profile.is_truthy(field),

        Predicate::Present { field } => profile.contains(field),

        Predicate::TextContains { field, needles } => {
            let Some(text) = profile.text_field(field) else {
                return false;
            };
            let text = text.to_lowercase();
            needles.iter().any(|n| text.contains(&n.to_lowercase()))
        }

        Predicate::InferredGender { gender } => {
            let Some(name) = profile.str_field("name") else {
                return false;
            };
            let (inferred, confidence) = inference::infer_gender(lexicon, name);
            inferred == *gender && confidence > GENDER_CONFIDENCE_THRESHOLD
        }

        Predicate::MinorityName => profile
            .str_field("name")
            .is_some_and(|name| inference::is_minority_name(lexicon, name)),

        Predicate::YearsSinceExceeds { field, years } => profile
            .number_field(field)
            .is_some_and(|year| lexicon.reference_year as f64 - year > *years as f64),

        Predicate::SesLevelIs { field, level } => scalar_text(profile.get(field))
            .is_some_and(|code| inference::ses_level(lexicon, &code) == *level),

        Predicate::AnyItemInRange {
            field,
            item_field,
            min,
            max,
        } => profile
            .get(field)
            .and_then(Value::as_array)
            .is_some_and(|items| {
                items.iter().any(|item| {
                    item.get(item_field)
                        .and_then(Value::as_f64)
                        .is_some_and(|v| v >= *min && v <= *max)
                })
            }),

        Predicate::SetDifference { field, minus } => {
            match (profile.string_list(field), profile.string_list(minus)) {
                (Some(items), Some(removed)) if !items.is_empty() && !removed.is_empty() => {
                    items.iter().any(|i| !removed.contains(i))
                }
                _ => false,
            }
        }

        Predicate::NumberBelow {
            field,
            threshold,
            missing_as,
        } => {
            let value = if profile.contains(field) {
                profile.number_field(field)
            } else {
                *missing_as
            };
            value.is_some_and(|v| v < *threshold)
        }

        Predicate::ListLacks { field, value } => profile
            .string_list(field)
            .map_or(true, |items| !items.iter().any(|i| i.eq_ignore_ascii_case(value))),

        Predicate::ValueInList { field, list } => {
            match (profile.get(field), profile.get(list).and_then(Value::as_array)) {
                (Some(needle), Some(items)) => items.contains(needle),
                _ => false,
            }
        }

        Predicate::All { of } => of.iter().all(|p| evaluate(p, profile, lexicon)),

        Predicate::Any { of } => of.iter().any(|p| evaluate(p, profile, lexicon)),

        Predicate::Not { predicate } => !evaluate(predicate, profile, lexicon),
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
