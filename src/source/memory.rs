use std::collections::HashMap;
use std::path::Path;
#[cfg(test)]
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::Deserialize;

use super::KnowledgeSource;
use crate::error::{DynastyError, Result};
use crate::model::{parse_iso_date, Person, Qid};

/// One person in a JSON fixture file.
#[derive(Debug, Clone, Deserialize)]
pub struct FixturePerson {
    pub qid: Qid,
    #[serde(default)]
    pub primary_label: Option<String>,
    #[serde(default)]
    pub secondary_label: Option<String>,
    /// ISO date string; unparsable values are treated as unknown.
    #[serde(default)]
    pub birth: Option<String>,
    #[serde(default)]
    pub death: Option<String>,
    #[serde(default)]
    pub father: Option<Qid>,
    #[serde(default)]
    pub mother: Option<Qid>,
    #[serde(default)]
    pub birthplace_label: Option<String>,
    #[serde(default)]
    pub children: Vec<Qid>,
}

/// Offline knowledge source backed by an in-memory map.
///
/// Test builds record every query it answers so callers can check how often
/// the network would have been hit.
#[derive(Default)]
pub struct MemorySource {
    people: HashMap<Qid, Person>,
    children: HashMap<Qid, Vec<Qid>>,
    #[cfg(test)]
    queries: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from fixture records.
    pub fn from_fixture(records: Vec<FixturePerson>) -> Self {
        let mut source = Self::new();
        for record in records {
            source.insert(record);
        }
        source
    }

    /// Load a JSON array of [`FixturePerson`] records.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let records: Vec<FixturePerson> = serde_json::from_str(&text).map_err(|e| {
            DynastyError::Parse(format!("Invalid fixture {}: {}", path.display(), e))
        })?;
        log::info!("Loaded {} fixture records from {}", records.len(), path.display());
        Ok(Self::from_fixture(records))
    }

    pub fn insert(&mut self, record: FixturePerson) {
        let date = |v: &Option<String>| -> Option<NaiveDate> { v.as_deref().and_then(parse_iso_date) };
        let person = Person {
            qid: record.qid.clone(),
            primary_label: record.primary_label,
            secondary_label: record.secondary_label,
            birth: date(&record.birth),
            death: date(&record.death),
            father: record.father,
            mother: record.mother,
            birthplace_label: record.birthplace_label,
        };
        if !record.children.is_empty() {
            self.children.insert(record.qid.clone(), record.children);
        }
        self.people.insert(record.qid, person);
    }

    /// Queries answered so far, as `person:<qid>` / `children:<qid>`.
    #[cfg(test)]
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// How many times `qid` was asked for its attributes.
    #[cfg(test)]
    pub fn person_query_count(&self, qid: &str) -> usize {
        let key = format!("person:{}", qid);
        self.queries.lock().unwrap().iter().filter(|q| **q == key).count()
    }

    #[cfg(test)]
    fn record(&self, kind: &str, qid: &Qid) {
        self.queries.lock().unwrap().push(format!("{}:{}", kind, qid));
    }

    #[cfg(not(test))]
    fn record(&self, _kind: &str, _qid: &Qid) {}
}

impl KnowledgeSource for MemorySource {
    async fn fetch_person(&self, qid: &Qid) -> Result<Person> {
        self.record("person", qid);
        self.people
            .get(qid)
            .cloned()
            .ok_or_else(|| DynastyError::Query(format!("No record for {}", qid)))
    }

    async fn fetch_children(&self, qid: &Qid) -> Result<Vec<Qid>> {
        self.record("children", qid);
        Ok(self.children.get(qid).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_fixture_and_query() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("family.json");
        fs::write(
            &path,
            r#"[
                {"qid": "Q1", "primary_label": "Ōuchi Hiroyo", "birth": "1325-01-01", "children": ["Q3", "Q2"]},
                {"qid": "Q2", "father": "Q1", "birth": "not a date"}
            ]"#,
        )
        .unwrap();

        let source = MemorySource::load(&path).unwrap();
        let q1 = Qid::parse("Q1").unwrap();
        let q2 = Qid::parse("Q2").unwrap();

        let person = source.fetch_person(&q1).await.unwrap();
        assert_eq!(person.primary_label.as_deref(), Some("Ōuchi Hiroyo"));
        assert_eq!(person.birth, NaiveDate::from_ymd_opt(1325, 1, 1));

        let child = source.fetch_person(&q2).await.unwrap();
        assert_eq!(child.birth, None);
        assert_eq!(child.father, Some(q1.clone()));

        let children = source.fetch_children(&q1).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(source.fetch_children(&q2).await.unwrap().is_empty());

        assert_eq!(source.person_query_count("Q1"), 1);
        assert_eq!(source.queries().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_person_is_query_error() {
        let source = MemorySource::new();
        let err = source.fetch_person(&Qid::parse("Q9").unwrap()).await.unwrap_err();
        assert!(matches!(err, DynastyError::Query(_)));
    }

    #[test]
    fn test_invalid_fixture_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"[{"qid": "not-a-qid"}]"#).unwrap();
        assert!(matches!(MemorySource::load(&path), Err(DynastyError::Parse(_))));
    }
}
