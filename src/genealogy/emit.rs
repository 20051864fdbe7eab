//! Parents-first emission order.

use std::collections::HashSet;

use super::Genealogy;
use crate::model::Qid;
use crate::resolver::PersonDirectory;

enum Visit {
    Enter(Qid),
    Emit(Qid),
}

/// Order in which members must be written so that every `father`/`mother`
/// reference to another member points backwards.
///
/// Starts from [`Genealogy::emission_roots`] and walks depth-first, father
/// before mother. Each member appears once; parent cycles in the data are
/// broken at the point where they close.
pub fn emission_order(genealogy: &Genealogy, people: &PersonDirectory) -> Vec<Qid> {
    let mut order = Vec::with_capacity(genealogy.len());
    let mut emitted: HashSet<Qid> = HashSet::new();
    let mut in_progress: HashSet<Qid> = HashSet::new();

    for start in genealogy.emission_roots() {
        let mut stack = vec![Visit::Enter(start)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(qid) => {
                    if emitted.contains(&qid) || !in_progress.insert(qid.clone()) {
                        continue;
                    }
                    let person = people.person(&qid);
                    stack.push(Visit::Emit(qid.clone()));
                    if let Some(mother) = person.mother.as_ref().filter(|m| genealogy.contains(m)) {
                        stack.push(Visit::Enter(mother.clone()));
                    }
                    if let Some(father) = person.father.as_ref().filter(|f| genealogy.contains(f)) {
                        stack.push(Visit::Enter(father.clone()));
                    }
                }
                Visit::Emit(qid) => {
                    in_progress.remove(&qid);
                    if emitted.insert(qid.clone()) {
                        order.push(qid);
                    }
                }
            }
        }
    }

    order
}
