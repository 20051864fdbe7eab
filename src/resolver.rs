//! Person resolution with a run-scoped cache and request pacing.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use crate::model::{Person, Qid};
use crate::source::KnowledgeSource;

/// Every person resolved during a run, keyed by external identifier.
#[derive(Debug, Default, Clone)]
pub struct PersonDirectory {
    people: HashMap<Qid, Person>,
}

impl PersonDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, person: Person) {
        self.people.insert(person.qid.clone(), person);
    }

    pub fn get(&self, qid: &Qid) -> Option<&Person> {
        self.people.get(qid)
    }

    /// The resolved person, or an all-unknown record if `qid` was never resolved.
    pub fn person(&self, qid: &Qid) -> Cow<'_, Person> {
        match self.people.get(qid) {
            Some(person) => Cow::Borrowed(person),
            None => Cow::Owned(Person::unknown(qid.clone())),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, qid: &Qid) -> bool {
        self.people.contains_key(qid)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Resolves identifiers to people through a [`KnowledgeSource`].
///
/// Each distinct identifier is queried at most once per run. Source failures
/// never escape: a failed lookup yields [`Person::unknown`] and a failed
/// children lookup yields no children.
pub struct PersonResolver<S> {
    source: S,
    delay: Duration,
    directory: PersonDirectory,
    queries: usize,
}

impl<S: KnowledgeSource> PersonResolver<S> {
    /// Create a resolver that pauses `delay` before every outbound query
    pub fn new(source: S, delay: Duration) -> Self {
        Self {
            source,
            delay,
            directory: PersonDirectory::new(),
            queries: 0,
        }
    }

    /// Resolve `qid`, hitting the source only on a cache miss.
    pub async fn resolve(&mut self, qid: &Qid) -> Person {
        if let Some(person) = self.directory.get(qid) {
            log::debug!("Cache hit for {}", qid);
            return person.clone();
        }

        self.pace().await;
        let person = match self.source.fetch_person(qid).await {
            Ok(person) => person,
            Err(e) => {
                log::warn!("Lookup of {} failed, treating as unknown: {}", qid, e);
                Person::unknown(qid.clone())
            }
        };

        self.directory.insert(person.clone());
        person
    }

    /// Children of `qid`, sorted by identifier. Never cached.
    pub async fn fetch_children(&mut self, qid: &Qid) -> Vec<Qid> {
        self.pace().await;
        let mut children = match self.source.fetch_children(qid).await {
            Ok(children) => children,
            Err(e) => {
                log::warn!("Children lookup of {} failed, treating as childless: {}", qid, e);
                Vec::new()
            }
        };
        children.sort();
        children.dedup();
        children
    }

    async fn pace(&mut self) {
        self.queries += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Number of outbound queries issued so far.
    pub fn query_count(&self) -> usize {
        self.queries
    }

    pub fn directory(&self) -> &PersonDirectory {
        &self.directory
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DynastyError, Result};
    use crate::source::{FixturePerson, MemorySource};

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    fn fixture(id: &str, children: &[&str]) -> FixturePerson {
        FixturePerson {
            qid: qid(id),
            primary_label: Some(format!("Person {}", id)),
            secondary_label: None,
            birth: None,
            death: None,
            father: None,
            mother: None,
            birthplace_label: None,
            children: children.iter().map(|c| qid(c)).collect(),
        }
    }

    struct FailingSource;

    impl KnowledgeSource for FailingSource {
        async fn fetch_person(&self, qid: &Qid) -> Result<Person> {
            Err(DynastyError::Query(format!("boom {}", qid)))
        }

        async fn fetch_children(&self, qid: &Qid) -> Result<Vec<Qid>> {
            Err(DynastyError::Query(format!("boom {}", qid)))
        }
    }

    #[tokio::test]
    async fn test_resolve_caches() {
        let source = MemorySource::from_fixture(vec![fixture("Q1", &[])]);
        let mut resolver = PersonResolver::new(source, Duration::ZERO);

        let first = resolver.resolve(&qid("Q1")).await;
        let second = resolver.resolve(&qid("Q1")).await;

        assert_eq!(first, second);
        assert_eq!(resolver.source().person_query_count("Q1"), 1);
        assert_eq!(resolver.query_count(), 1);
        assert!(resolver.directory().contains(&qid("Q1")));
    }

    #[tokio::test]
    async fn test_failure_degrades_to_unknown_and_is_cached() {
        let mut resolver = PersonResolver::new(FailingSource, Duration::ZERO);
        let person = resolver.resolve(&qid("Q5")).await;
        assert_eq!(person, Person::unknown(qid("Q5")));

        resolver.resolve(&qid("Q5")).await;
        assert_eq!(resolver.query_count(), 1);
        assert!(resolver.fetch_children(&qid("Q5")).await.is_empty());
    }

    #[tokio::test]
    async fn test_children_sorted_and_not_cached() {
        let source = MemorySource::from_fixture(vec![fixture("Q1", &["Q30", "Q4", "Q200"])]);
        let mut resolver = PersonResolver::new(source, Duration::ZERO);

        let children = resolver.fetch_children(&qid("Q1")).await;
        assert_eq!(children, vec![qid("Q200"), qid("Q30"), qid("Q4")]);

        resolver.fetch_children(&qid("Q1")).await;
        assert_eq!(resolver.query_count(), 2);
    }

    #[tokio::test]
    async fn test_delay_applied_before_queries() {
        let source = MemorySource::from_fixture(vec![fixture("Q1", &[])]);
        let mut resolver = PersonResolver::new(source, Duration::from_millis(20));

        let start = std::time::Instant::now();
        resolver.resolve(&qid("Q1")).await;
        resolver.resolve(&qid("Q1")).await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[test]
    fn test_directory_person_fallback() {
        let dir = PersonDirectory::new();
        let person = dir.person(&qid("Q9"));
        assert_eq!(person.qid, qid("Q9"));
        assert!(person.primary_label.is_none());
        assert!(dir.is_empty());
    }
}
