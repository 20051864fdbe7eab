//! Patriline completion.

use std::collections::BTreeSet;

use super::GenealogyBuilder;
use crate::model::Qid;
use crate::source::KnowledgeSource;

impl<'a, S: KnowledgeSource> GenealogyBuilder<'a, S> {
    /// Pull missing fathers into `members`, up to `steps` generations.
    ///
    /// Liveness is deliberately not checked: a father dead before the cutoff
    /// is still emitted so the child's `father` link has a target. Returns
    /// the fathers that were added.
    pub(super) async fn ensure_fathers(
        &mut self,
        members: &mut BTreeSet<Qid>,
        steps: usize,
    ) -> BTreeSet<Qid> {
        let mut added = BTreeSet::new();
        let mut frontier: BTreeSet<Qid> = members.clone();

        for step in 0..steps {
            let mut next = BTreeSet::new();
            for qid in &frontier {
                let person = self.resolver.resolve(qid).await;
                if let Some(father) = person.father {
                    if members.insert(father.clone()) {
                        log::debug!("Completing patriline: {} is father of {}", father, qid);
                        added.insert(father.clone());
                        next.insert(father);
                    }
                }
            }
            if next.is_empty() {
                log::debug!("Patriline completion settled after {} step(s)", step + 1);
                break;
            }
            frontier = next;
        }

        added
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{collect_genealogy, GenealogyBuilder, TraversalOptions};
    use super::*;
    use crate::resolver::PersonResolver;
    use std::time::Duration;

    fn chain() -> Vec<crate::source::FixturePerson> {
        vec![
            person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), None),
            person("Q2", "Father", Some("1380-01-01"), Some("1430-01-01"), Some("Q3"), None),
            person("Q3", "Grandfather", Some("1350-01-01"), Some("1400-01-01"), Some("Q4"), None),
            person("Q4", "Great", Some("1320-01-01"), Some("1370-01-01"), None, None),
        ]
    }

    #[tokio::test]
    async fn test_ensure_fathers_ignores_liveness() {
        let mut resolver = PersonResolver::new(source(chain()), Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, TraversalOptions::default());
        let mut members = BTreeSet::from([qid("Q1")]);

        let added = builder.ensure_fathers(&mut members, 1).await;
        assert_eq!(added, BTreeSet::from([qid("Q2")]));
        assert_eq!(members, BTreeSet::from([qid("Q1"), qid("Q2")]));
    }

    #[tokio::test]
    async fn test_ensure_fathers_multiple_steps() {
        let mut resolver = PersonResolver::new(source(chain()), Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, TraversalOptions::default());
        let mut members = BTreeSet::from([qid("Q1")]);

        builder.ensure_fathers(&mut members, 2).await;
        assert_eq!(members, BTreeSet::from([qid("Q1"), qid("Q2"), qid("Q3")]));

        let mut members = BTreeSet::from([qid("Q1")]);
        builder.ensure_fathers(&mut members, 10).await;
        assert_eq!(members.len(), 4);
    }

    #[tokio::test]
    async fn test_ensure_fathers_disabled() {
        let mut resolver = PersonResolver::new(source(chain()), Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, TraversalOptions::default());
        let mut members = BTreeSet::from([qid("Q1")]);
        let added = builder.ensure_fathers(&mut members, 0).await;
        assert!(added.is_empty());
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn test_full_build_completes_dead_father() {
        let mut resolver = PersonResolver::new(source(chain()), Duration::ZERO);
        let opts = TraversalOptions {
            ancestor_depth: 6,
            descendant_depth: 0,
            ensure_fathers_depth: 1,
            ..TraversalOptions::default()
        };
        let g = collect_genealogy(&mut resolver, &qid("Q1"), opts).await;
        // Everyone above the root died before the cutoff; only Q2 is pulled back in.
        assert_eq!(g.ancestors, BTreeSet::from([qid("Q1")]));
        assert_eq!(g.completed_fathers, BTreeSet::from([qid("Q2")]));
        assert_eq!(g.members, BTreeSet::from([qid("Q1"), qid("Q2")]));
    }
}
