//! Genealogy graph construction: ancestor and descendant collection around a
//! root person, patriline completion, and parents-first emission order.
//!
//! All sets are ordered by identifier so that traversal, and therefore local
//! identifier allocation, is reproducible across runs.

mod collect;
mod emit;
mod lineage;

pub use emit::emission_order;

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::config::TraversalConfig;
use crate::liveness::is_alive_on;
use crate::model::Qid;
use crate::resolver::PersonResolver;
use crate::source::KnowledgeSource;

/// Traversal bounds and inclusion policy for one run.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub cutoff_date: NaiveDate,
    /// Generations of ancestors to walk (0 = root only).
    pub ancestor_depth: usize,
    /// Generations of descendants to walk (0 = none).
    pub descendant_depth: usize,
    /// Extra patriline steps force-included after collection (0 disables).
    pub ensure_fathers_depth: usize,
    pub include_root_if_not_alive: bool,
    pub descendants_require_birth: bool,
}

impl From<&TraversalConfig> for TraversalOptions {
    fn from(config: &TraversalConfig) -> Self {
        Self {
            cutoff_date: config.cutoff_date,
            ancestor_depth: config.ancestor_depth,
            descendant_depth: config.descendant_depth,
            ensure_fathers_depth: config.ensure_fathers_depth,
            include_root_if_not_alive: config.include_root_if_not_alive,
            descendants_require_birth: config.descendants_require_birth,
        }
    }
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self::from(&TraversalConfig::default())
    }
}

/// Result of collection: who gets emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genealogy {
    pub root: Qid,
    /// Whether the root itself is part of the output.
    pub root_included: bool,
    /// Ancestor-side inclusions (contains the root when it is included).
    pub ancestors: BTreeSet<Qid>,
    pub descendants: BTreeSet<Qid>,
    /// Fathers force-included by lineage completion.
    pub completed_fathers: BTreeSet<Qid>,
    /// Final inclusion set: ancestors, descendants and completed fathers.
    pub members: BTreeSet<Qid>,
}

impl Genealogy {
    pub fn contains(&self, qid: &Qid) -> bool {
        self.members.contains(qid)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Identifiers to start emission from, in order: the root then sorted
    /// descendants when the root is included, otherwise sorted ancestors.
    pub fn emission_roots(&self) -> Vec<Qid> {
        if self.root_included {
            std::iter::once(self.root.clone())
                .chain(self.descendants.iter().cloned())
                .collect()
        } else {
            self.ancestors.iter().cloned().collect()
        }
    }
}

/// Traversal context owning the per-direction visited and inclusion sets.
pub struct GenealogyBuilder<'a, S> {
    resolver: &'a mut PersonResolver<S>,
    options: TraversalOptions,
    visited_ancestors: BTreeSet<Qid>,
    ancestors: BTreeSet<Qid>,
    descendants: BTreeSet<Qid>,
}

impl<'a, S: KnowledgeSource> GenealogyBuilder<'a, S> {
    pub fn new(resolver: &'a mut PersonResolver<S>, options: TraversalOptions) -> Self {
        Self {
            resolver,
            options,
            visited_ancestors: BTreeSet::new(),
            ancestors: BTreeSet::new(),
            descendants: BTreeSet::new(),
        }
    }

    /// Collect everyone to emit around `root`.
    pub async fn build(mut self, root: &Qid) -> Genealogy {
        let root_person = self.resolver.resolve(root).await;
        let root_alive = is_alive_on(&root_person, self.options.cutoff_date, false);
        let root_included = self.options.include_root_if_not_alive || root_alive;
        log::info!(
            "Root {} ({}) alive on {}: {}, included: {}",
            root,
            root_person.primary_label.as_deref().unwrap_or("?"),
            self.options.cutoff_date,
            root_alive,
            root_included
        );

        self.gather_ancestors(root, root_included).await;
        if root_included {
            let depth = self.options.descendant_depth;
            self.gather_descendants(root, depth).await;
        }

        let mut members: BTreeSet<Qid> = self.ancestors.union(&self.descendants).cloned().collect();
        let completed_fathers = self
            .ensure_fathers(&mut members, self.options.ensure_fathers_depth)
            .await;

        log::info!(
            "Collected {} ancestors, {} descendants, {} completed fathers ({} total)",
            self.ancestors.len(),
            self.descendants.len(),
            completed_fathers.len(),
            members.len()
        );

        Genealogy {
            root: root.clone(),
            root_included,
            ancestors: self.ancestors,
            descendants: self.descendants,
            completed_fathers,
            members,
        }
    }

    /// Identifiers whose ancestors have already been expanded.
    #[cfg(test)]
    pub fn visited_ancestors(&self) -> &BTreeSet<Qid> {
        &self.visited_ancestors
    }
}

/// Collect, pre-resolve everything emission will need, and return the set.
///
/// After this returns, every member and every member's father is present in
/// the resolver's directory, so emission and rendering issue no queries.
pub async fn collect_genealogy<S: KnowledgeSource>(
    resolver: &mut PersonResolver<S>,
    root: &Qid,
    options: TraversalOptions,
) -> Genealogy {
    let genealogy = GenealogyBuilder::new(resolver, options).build(root).await;

    for qid in &genealogy.members {
        let person = resolver.resolve(qid).await;
        if let Some(father) = &person.father {
            resolver.resolve(father).await;
        }
    }

    genealogy
}
