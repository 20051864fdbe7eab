//! Core value types: external identifiers, people and calendar dates.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DynastyError, Result};

fn qid_regex() -> &'static Regex {
    static QID: OnceLock<Regex> = OnceLock::new();
    QID.get_or_init(|| Regex::new(r"^Q\d+$").expect("Invalid regex pattern"))
}

/// Canonical Wikidata item identifier, e.g. `Q8081786`.
///
/// Ordering is lexicographic on the string form, so `Q10 < Q9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Qid(String);

impl Qid {
    /// Normalize and validate an identifier.
    ///
    /// Surrounding whitespace is trimmed and an entity URL such as
    /// `http://www.wikidata.org/entity/Q42` is reduced to its last segment.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let candidate = if trimmed.starts_with("http") {
            trimmed.rsplit('/').next().unwrap_or(trimmed)
        } else {
            trimmed
        };

        if !qid_regex().is_match(candidate) {
            return Err(DynastyError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase form used for fallback tokens and collision suffixes.
    pub fn lower(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Qid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Qid {
    type Error = DynastyError;

    fn try_from(value: String) -> Result<Self> {
        Qid::parse(&value)
    }
}

impl From<Qid> for String {
    fn from(qid: Qid) -> Self {
        qid.0
    }
}

/// Parse the date portion of an ISO timestamp (`YYYY-MM-DD...`).
///
/// Returns `None` for anything unparsable and for years before 1 AD.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10)?;
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    if date.year() <= 0 {
        return None;
    }
    Some(date)
}

/// Render a date as `year.month.day` without zero padding.
pub fn format_record_date(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.year(), date.month(), date.day())
}

/// An individual as known to the knowledge source. Immutable once fetched;
/// every field except `qid` may be unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub qid: Qid,
    /// Label in the primary language (drives identifiers and name tokens).
    pub primary_label: Option<String>,
    /// Label in the secondary language (comment line only).
    pub secondary_label: Option<String>,
    pub birth: Option<NaiveDate>,
    pub death: Option<NaiveDate>,
    pub father: Option<Qid>,
    pub mother: Option<Qid>,
    pub birthplace_label: Option<String>,
}

impl Person {
    /// A person about whom nothing is known.
    pub fn unknown(qid: Qid) -> Self {
        Self {
            qid,
            primary_label: None,
            secondary_label: None,
            birth: None,
            death: None,
            father: None,
            mother: None,
            birthplace_label: None,
        }
    }
}
