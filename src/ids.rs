//! Local identifier generation: slugs, name tokens and the collision-free
//! identifier allocator.

use std::collections::HashMap;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::{Person, Qid};

/// Placeholder used when a label slugs down to nothing.
pub const EMPTY_SLUG: &str = "unknown";

/// Fold `value` into a lowercase ASCII token.
///
/// Accents are decomposed and dropped, runs of anything outside `[a-z0-9]`
/// collapse to a single `_`, and leading/trailing separators are stripped.
pub fn slugify_to_token(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;

    for ch in value.nfkd().filter(|c| !is_combining_mark(*c)) {
        for lower in ch.to_lowercase() {
            if lower.is_ascii_lowercase() || lower.is_ascii_digit() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(lower);
            } else {
                pending_sep = true;
            }
        }
    }

    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Last whitespace-separated word of a label, the given name in the
/// family-name-first convention of the source labels.
pub fn extract_given_name(label: &str) -> Option<&str> {
    label.split_whitespace().last()
}

/// Localisation key for a person's first name.
pub fn name_token(person: &Person, name_prefix: &str, fallback_prefix: &str) -> String {
    let label = person.primary_label.as_deref().map(str::trim).unwrap_or("");
    match extract_given_name(label) {
        Some(given) => format!("{}{}", name_prefix, slugify_to_token(given)),
        None => format!("{}{}", fallback_prefix, person.qid.lower()),
    }
}

/// Candidate identifier before collision handling.
fn candidate_id(person: &Person, id_prefix: &str) -> String {
    match person.primary_label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => format!("{}{}", id_prefix, slugify_to_token(label)),
        _ => format!("{}{}", id_prefix, person.qid.lower()),
    }
}

/// Maps external identifiers to local identifiers, injectively.
///
/// The first person to claim a candidate keeps it; later claimants get the
/// lowercased external identifier appended, then a counter if that is taken
/// too. Assignments never change.
#[derive(Debug, Default)]
pub struct IdAllocator {
    id_prefix: String,
    by_qid: HashMap<Qid, String>,
    by_id: HashMap<String, Qid>,
}

impl IdAllocator {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            by_qid: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Local identifier for `person`, allocating one on first use.
    pub fn id_for(&mut self, person: &Person) -> String {
        if let Some(existing) = self.by_qid.get(&person.qid) {
            return existing.clone();
        }

        let base = candidate_id(person, &self.id_prefix);
        let mut candidate = base.clone();
        let mut attempt = 0usize;
        while let Some(owner) = self.by_id.get(&candidate) {
            log::debug!(
                "Identifier {} already taken by {}, suffixing for {}",
                candidate,
                owner,
                person.qid
            );
            attempt += 1;
            candidate = if attempt == 1 {
                format!("{}_{}", base, person.qid.lower())
            } else {
                format!("{}_{}_{}", base, person.qid.lower(), attempt)
            };
        }

        self.by_qid.insert(person.qid.clone(), candidate.clone());
        self.by_id.insert(candidate.clone(), person.qid.clone());
        candidate
    }

    /// Previously allocated identifier, if any.
    #[cfg(test)]
    pub fn get(&self, qid: &Qid) -> Option<&str> {
        self.by_qid.get(qid).map(String::as_str)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_qid.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_qid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(qid: &str, label: Option<&str>) -> Person {
        Person {
            primary_label: label.map(String::from),
            ..Person::unknown(Qid::parse(qid).unwrap())
        }
    }

    #[test]
    fn test_slugify_folds_accents_and_separators() {
        assert_eq!(slugify_to_token("Ōuchi Morimi"), "ouchi_morimi");
        assert_eq!(slugify_to_token("  José -- María  "), "jose_maria");
        assert_eq!(slugify_to_token("Louis XI of France"), "louis_xi_of_france");
        assert_eq!(slugify_to_token("___"), "unknown");
        assert_eq!(slugify_to_token("大内盛見"), "unknown");
    }

    #[test]
    fn test_name_token_uses_last_word() {
        let p = named("Q1", Some("Ōuchi Morimi"));
        assert_eq!(name_token(&p, "name_", "name_q"), "name_morimi");
    }

    #[test]
    fn test_name_token_fallback_without_label() {
        let p = named("Q77", None);
        assert_eq!(name_token(&p, "name_", "name_q"), "name_qq77");

        let blank = named("Q78", Some("   "));
        assert_eq!(name_token(&blank, "name_", "name_q"), "name_qq78");
    }

    #[test]
    fn test_id_from_label_or_qid() {
        let mut alloc = IdAllocator::new("wd_");
        assert_eq!(alloc.id_for(&named("Q5", Some("Ōuchi Hiroyo"))), "wd_ouchi_hiroyo");
        assert_eq!(alloc.id_for(&named("Q6", None)), "wd_q6");
    }

    #[test]
    fn test_collision_is_suffixed() {
        let mut alloc = IdAllocator::new("wd_");
        let first = alloc.id_for(&named("Q10", Some("Minamoto no Yoshiie")));
        let second = alloc.id_for(&named("Q11", Some("Minamoto no Yoshiie")));
        assert_eq!(first, "wd_minamoto_no_yoshiie");
        assert_eq!(second, "wd_minamoto_no_yoshiie_q11");
        assert_ne!(first, second);
    }

    #[test]
    fn test_suffixed_id_already_taken() {
        let mut alloc = IdAllocator::new("wd_");
        let z = alloc.id_for(&named("Q12", Some("Taro Q11")));
        let x = alloc.id_for(&named("Q10", Some("Taro")));
        let y = alloc.id_for(&named("Q11", Some("Taro")));
        assert_eq!(z, "wd_taro_q11");
        assert_eq!(x, "wd_taro");
        assert_eq!(y, "wd_taro_q11_2");

        // Earlier owners keep their identifiers.
        assert_eq!(alloc.id_for(&named("Q12", Some("Taro Q11"))), z);
        assert_eq!(alloc.get(&Qid::parse("Q12").unwrap()), Some("wd_taro_q11"));
        assert_eq!(alloc.len(), 3);
    }

    #[test]
    fn test_repeat_returns_same_id() {
        let mut alloc = IdAllocator::new("wd_");
        let a = named("Q10", Some("Same Name"));
        let b = named("Q11", Some("Same Name"));
        let first_a = alloc.id_for(&a);
        let first_b = alloc.id_for(&b);
        assert_eq!(alloc.id_for(&a), first_a);
        assert_eq!(alloc.id_for(&b), first_b);
        assert_eq!(alloc.len(), 2);
        assert_eq!(alloc.get(&b.qid), Some(first_b.as_str()));
    }

    #[test]
    fn test_same_order_same_ids() {
        let people = vec![
            named("Q3", Some("Taro")),
            named("Q1", Some("Taro")),
            named("Q2", None),
            named("Q4", Some("Taro")),
        ];
        let run = |people: &[Person]| {
            let mut alloc = IdAllocator::new("wd_");
            people.iter().map(|p| alloc.id_for(p)).collect::<Vec<_>>()
        };
        assert_eq!(run(&people), run(&people));
        assert_eq!(run(&people), vec!["wd_taro", "wd_taro_q1", "wd_q2", "wd_taro_q4"]);
    }
}
