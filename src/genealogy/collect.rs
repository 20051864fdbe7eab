//! Depth-bounded ancestor and descendant walks.
//!
//! Both walks use an explicit stack instead of recursion but visit nodes in
//! the same depth-first pre-order a recursive walk would: father subtree
//! before mother subtree, each child's subtree before the next child.

use super::GenealogyBuilder;
use crate::liveness::is_alive_on;
use crate::model::Qid;
use crate::source::KnowledgeSource;

impl<'a, S: KnowledgeSource> GenealogyBuilder<'a, S> {
    /// Walk father/mother links upward from `root`.
    ///
    /// The root is included per `include_root`; deeper ancestors only if alive
    /// on the cutoff with a known birth date. Excluded ancestors are still
    /// expanded, and each identifier is expanded at most once.
    pub(super) async fn gather_ancestors(&mut self, root: &Qid, include_root: bool) {
        let max_depth = self.options.ancestor_depth;
        let cutoff = self.options.cutoff_date;
        let mut stack: Vec<(Qid, usize)> = vec![(root.clone(), 0)];

        while let Some((qid, depth)) = stack.pop() {
            if !self.visited_ancestors.insert(qid.clone()) {
                log::debug!("Ancestor {} already expanded", qid);
                continue;
            }
            let person = self.resolver.resolve(&qid).await;

            let included = if depth == 0 {
                include_root
            } else {
                is_alive_on(&person, cutoff, true)
            };
            log::debug!("Ancestor {} at depth {}: included={}", qid, depth, included);
            if included {
                self.ancestors.insert(qid.clone());
            }

            if depth >= max_depth {
                continue;
            }
            // Pushed in reverse so the father's line is walked first.
            if let Some(mother) = person.mother {
                stack.push((mother, depth + 1));
            }
            if let Some(father) = person.father {
                stack.push((father, depth + 1));
            }
        }
    }

    /// Walk child links downward from `root` for `depth_remaining` generations.
    ///
    /// A child is kept only if alive on the cutoff (birth requirement per
    /// options) and not already kept; only kept children are expanded further.
    pub(super) async fn gather_descendants(&mut self, root: &Qid, depth_remaining: usize) {
        if depth_remaining == 0 {
            return;
        }
        let cutoff = self.options.cutoff_date;
        let require_birth = self.options.descendants_require_birth;

        let children = self.resolver.fetch_children(root).await;
        // Each frame: pending children (reversed, so pop yields sorted order)
        // and the generations left below those children.
        let mut stack: Vec<(Vec<Qid>, usize)> = vec![(reversed(children), depth_remaining - 1)];

        while let Some((pending, remaining)) = stack.last_mut() {
            let Some(child_qid) = pending.pop() else {
                stack.pop();
                continue;
            };
            let remaining = *remaining;

            let child = self.resolver.resolve(&child_qid).await;
            if !is_alive_on(&child, cutoff, require_birth) {
                log::debug!("Descendant {} not alive on {}", child_qid, cutoff);
                continue;
            }
            if !self.descendants.insert(child_qid.clone()) {
                continue;
            }
            log::debug!("Descendant {} included", child_qid);

            if remaining > 0 {
                let grandchildren = self.resolver.fetch_children(&child_qid).await;
                stack.push((reversed(grandchildren), remaining - 1));
            }
        }
    }
}

fn reversed(mut items: Vec<Qid>) -> Vec<Qid> {
    items.reverse();
    items
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{GenealogyBuilder, TraversalOptions};
    use crate::resolver::PersonResolver;
    use std::collections::BTreeSet;
    use std::time::Duration;

    fn opts(ancestor_depth: usize, descendant_depth: usize) -> TraversalOptions {
        TraversalOptions {
            ancestor_depth,
            descendant_depth,
            ensure_fathers_depth: 0,
            ..TraversalOptions::default()
        }
    }

    #[tokio::test]
    async fn test_ancestors_filtered_but_traversed_through() {
        // Q1 root -> father Q2 (no birth date, excluded) -> father Q3 (alive on cutoff)
        let src = source(vec![
            person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), Some("Q4")),
            person("Q2", "Unknown Birth", None, None, Some("Q3"), None),
            person("Q3", "Old Grandfather", Some("1370-01-01"), Some("1450-01-01"), None, None),
            person("Q4", "Mother", Some("1395-01-01"), Some("1430-01-01"), None, None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(6, 0));
        builder.gather_ancestors(&qid("Q1"), true).await;

        assert_eq!(builder.ancestors, BTreeSet::from([qid("Q1"), qid("Q3")]));
        assert_eq!(builder.visited_ancestors().len(), 4);
    }

    #[tokio::test]
    async fn test_ancestor_visit_order_father_line_first() {
        let src = source(vec![
            person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), Some("Q3")),
            person("Q2", "Father", Some("1390-01-01"), None, Some("Q4"), None),
            person("Q3", "Mother", Some("1395-01-01"), None, None, None),
            person("Q4", "Grandfather", Some("1360-01-01"), None, None, None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        GenealogyBuilder::new(&mut resolver, opts(6, 0))
            .gather_ancestors(&qid("Q1"), true)
            .await;

        let order = resolver.source().queries();
        assert_eq!(order, vec!["person:Q1", "person:Q2", "person:Q4", "person:Q3"]);
    }

    #[tokio::test]
    async fn test_pedigree_collapse_expanded_once() {
        // Both parents share the same father Q9.
        let src = source(vec![
            person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), Some("Q3")),
            person("Q2", "Father", Some("1390-01-01"), None, Some("Q9"), None),
            person("Q3", "Mother", Some("1395-01-01"), None, Some("Q9"), None),
            person("Q9", "Shared", Some("1360-01-01"), None, None, None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(6, 0));
        builder.gather_ancestors(&qid("Q1"), true).await;
        assert!(builder.ancestors.contains(&qid("Q9")));
        drop(builder);

        assert_eq!(resolver.source().person_query_count("Q9"), 1);
        assert_eq!(resolver.query_count(), 4);
    }

    #[tokio::test]
    async fn test_ancestor_cycle_terminates() {
        let src = source(vec![
            person("Q1", "A", Some("1400-01-01"), None, Some("Q2"), None),
            person("Q2", "B", Some("1380-01-01"), None, Some("Q1"), None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(50, 0));
        builder.gather_ancestors(&qid("Q1"), true).await;
        assert_eq!(builder.visited_ancestors().len(), 2);
    }

    #[tokio::test]
    async fn test_ancestor_depth_bound() {
        let src = source(vec![
            person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), None),
            person("Q2", "Father", Some("1390-01-01"), None, Some("Q3"), None),
            person("Q3", "Grandfather", Some("1360-01-01"), None, Some("Q4"), None),
            person("Q4", "Great", Some("1330-01-01"), None, None, None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(1, 0));
        builder.gather_ancestors(&qid("Q1"), true).await;
        assert_eq!(builder.ancestors, BTreeSet::from([qid("Q1"), qid("Q2")]));
        drop(builder);
        assert_eq!(resolver.source().person_query_count("Q3"), 0);

        let src = source(vec![person("Q1", "Root", Some("1420-01-01"), None, Some("Q2"), None)]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(0, 0));
        builder.gather_ancestors(&qid("Q1"), false).await;
        assert!(builder.ancestors.is_empty());
        assert_eq!(builder.visited_ancestors().len(), 1);
    }

    #[tokio::test]
    async fn test_descendants_stop_at_excluded_child() {
        let src = source(vec![
            with_children(person("Q1", "Root", Some("1400-01-01"), None, None, None), &["Q3", "Q2"]),
            with_children(
                person("Q2", "Dead Son", Some("1420-01-01"), Some("1440-01-01"), Some("Q1"), None),
                &["Q20"],
            ),
            with_children(person("Q3", "Living Son", Some("1422-01-01"), None, Some("Q1"), None), &["Q30"]),
            person("Q20", "Grandson via dead", Some("1439-01-01"), None, Some("Q2"), None),
            person("Q30", "Grandson", Some("1441-01-01"), None, Some("Q3"), None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(0, 6));
        builder.gather_descendants(&qid("Q1"), 6).await;

        assert_eq!(builder.descendants, BTreeSet::from([qid("Q3"), qid("Q30")]));
        drop(builder);
        assert!(!resolver.source().queries().contains(&"children:Q2".to_string()));
    }

    #[tokio::test]
    async fn test_descendant_depth_counts_generations() {
        let src = source(vec![
            with_children(person("Q1", "Root", Some("1380-01-01"), None, None, None), &["Q2"]),
            with_children(person("Q2", "Son", Some("1400-01-01"), None, Some("Q1"), None), &["Q3"]),
            person("Q3", "Grandson", Some("1425-01-01"), None, Some("Q2"), None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(0, 1));
        builder.gather_descendants(&qid("Q1"), 1).await;
        assert_eq!(builder.descendants, BTreeSet::from([qid("Q2")]));
        drop(builder);
        // One generation: the son is never asked for children.
        assert_eq!(resolver.source().queries(), vec!["children:Q1", "person:Q2"]);
    }

    #[tokio::test]
    async fn test_descendant_order_and_birth_requirement() {
        let src = source(vec![
            with_children(person("Q1", "Root", Some("1380-01-01"), None, None, None), &["Q3", "Q2"]),
            with_children(person("Q2", "Son", Some("1400-01-01"), None, Some("Q1"), None), &["Q4"]),
            person("Q3", "Undated", None, None, Some("Q1"), None),
            person("Q4", "Grandson", Some("1425-01-01"), None, Some("Q2"), None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(0, 6));
        builder.gather_descendants(&qid("Q1"), 6).await;
        assert_eq!(builder.descendants, BTreeSet::from([qid("Q2"), qid("Q4")]));
        drop(builder);
        assert_eq!(
            resolver.source().queries(),
            vec!["children:Q1", "person:Q2", "children:Q2", "person:Q4", "children:Q4", "person:Q3"]
        );

        let src = source(vec![
            with_children(person("Q1", "Root", Some("1380-01-01"), None, None, None), &["Q3"]),
            person("Q3", "Undated", None, None, Some("Q1"), None),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let relaxed = TraversalOptions {
            descendants_require_birth: false,
            ..opts(0, 6)
        };
        let mut builder = GenealogyBuilder::new(&mut resolver, relaxed);
        builder.gather_descendants(&qid("Q1"), 6).await;
        assert_eq!(builder.descendants, BTreeSet::from([qid("Q3")]));
    }

    #[tokio::test]
    async fn test_descendant_reached_twice_kept_once() {
        let src = source(vec![
            with_children(person("Q1", "Root", Some("1380-01-01"), None, None, None), &["Q2", "Q3"]),
            with_children(person("Q2", "Son", Some("1400-01-01"), None, Some("Q1"), Some("Q3")), &["Q5"]),
            with_children(person("Q3", "Daughter", Some("1401-01-01"), None, Some("Q1"), None), &["Q5"]),
            person("Q5", "Grandchild", Some("1425-01-01"), None, Some("Q2"), Some("Q3")),
        ]);
        let mut resolver = PersonResolver::new(src, Duration::ZERO);
        let mut builder = GenealogyBuilder::new(&mut resolver, opts(0, 6));
        builder.gather_descendants(&qid("Q1"), 6).await;
        assert_eq!(builder.descendants.len(), 3);
        drop(builder);
        let children_of_q5 = resolver
            .source()
            .queries()
            .iter()
            .filter(|q| *q == "children:Q5")
            .count();
        assert_eq!(children_of_q5, 1);
    }
}
