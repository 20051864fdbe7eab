//! Family-tree graph in Graphviz DOT form.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::characters::CharacterFields;
use super::localisation::Localisations;

fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Labels and edges for a selection of characters
pub struct FamilyGraph<'a> {
    fields: &'a BTreeMap<String, CharacterFields>,
    localisations: &'a Localisations,
    dynasty_query: Option<&'a str>,
}

impl<'a> FamilyGraph<'a> {
    pub fn new(
        fields: &'a BTreeMap<String, CharacterFields>,
        localisations: &'a Localisations,
        dynasty_query: Option<&'a str>,
    ) -> Self {
        Self {
            fields,
            localisations,
            dynasty_query,
        }
    }

    /// Display label for a character: name, dynasty, then the identifier.
    ///
    /// The name is the localised name token (or the raw token), falling back
    /// to localisation keys derived from the identifier. The dynasty is the
    /// character's own, else the queried one, localised when possible.
    pub fn label_for(&self, cid: &str) -> String {
        let info = self.fields.get(cid);
        let loc = self.localisations;

        let name = info
            .and_then(|i| i.name.as_deref())
            .map(|n| loc.get(n).map(String::as_str).unwrap_or(n).to_string())
            .or_else(|| {
                [
                    cid.to_string(),
                    format!("{}_title", cid),
                    format!("{}_name", cid),
                    format!("{}_desc", cid),
                ]
                .iter()
                .find_map(|key| loc.get(key).cloned())
            });

        let dynasty_id = info
            .and_then(|i| i.dynasty.as_deref())
            .or(self.dynasty_query)
            .unwrap_or("");
        let dynasty = loc.get(dynasty_id).map(String::as_str).unwrap_or(dynasty_id);

        match (name, dynasty.is_empty()) {
            (Some(name), false) => format!("{} {}\n({})", name, dynasty, cid),
            (Some(name), true) => format!("{}\n({})", name, cid),
            (None, false) => format!("{} {}\n({})", dynasty, cid, cid),
            (None, true) => cid.to_string(),
        }
    }

    /// Render the selection as a DOT digraph.
    ///
    /// Each spouse pair gets a point-shaped marriage node with both spouses
    /// on the same rank. A child hangs off the marriage node of its parents
    /// when that pair is known, otherwise off its father.
    pub fn to_dot(&self, selected: &BTreeSet<String>) -> String {
        let mut out = String::new();
        out.push_str("// Dynasty tree\n");
        out.push_str("digraph {\n");
        out.push_str("  overlap=false;\n");
        out.push_str("  splines=true;\n");
        out.push_str("  nodesep=0.35;\n");
        out.push_str("  ranksep=0.8;\n");
        out.push_str("  node [shape=box];\n\n");

        for cid in selected {
            self.push_node(&mut out, cid);
        }

        let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();
        for cid in selected {
            let Some(info) = self.fields.get(cid) else {
                continue;
            };
            for spouse in &info.spouses {
                if !self.fields.contains_key(spouse) {
                    self.push_node(&mut out, spouse);
                }
                pairs.insert(ordered_pair(cid, spouse));
            }
        }

        let mut marriage_nodes = BTreeMap::new();
        for (i, (a, b)) in pairs.iter().enumerate() {
            let node = format!("marriage_{}_{}_{}", i, a, b);
            let _ = writeln!(
                out,
                "  \"{}\" [label=\"\", shape=point, width=0.01, height=0.01];",
                dot_escape(&node)
            );
            let _ = writeln!(out, "  subgraph rank_same_{} {{", i);
            out.push_str("    rank=same;\n");
            let _ = writeln!(out, "    \"{}\";", dot_escape(a));
            let _ = writeln!(out, "    \"{}\";", dot_escape(b));
            out.push_str("  }\n");
            for spouse in [a, b] {
                let _ = writeln!(
                    out,
                    "  \"{}\" -> \"{}\" [dir=none, constraint=true];",
                    dot_escape(spouse),
                    dot_escape(&node)
                );
            }
            marriage_nodes.insert((a.clone(), b.clone()), node);
        }

        for cid in selected {
            let Some(info) = self.fields.get(cid) else {
                continue;
            };
            if let (Some(father), Some(mother)) = (&info.father, &info.mother) {
                if let Some(node) = marriage_nodes.get(&ordered_pair(father, mother)) {
                    let _ = writeln!(out, "  \"{}\" -> \"{}\";", dot_escape(node), dot_escape(cid));
                    continue;
                }
            }
            if let Some(father) = &info.father {
                if !self.fields.contains_key(father) {
                    self.push_node(&mut out, father);
                }
                let _ = writeln!(out, "  \"{}\" -> \"{}\";", dot_escape(father), dot_escape(cid));
            }
        }

        out.push_str("}\n");
        log::debug!(
            "Built DOT graph: {} nodes, {} marriages",
            selected.len(),
            marriage_nodes.len()
        );
        out
    }

    fn push_node(&self, out: &mut String, cid: &str) {
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\"];",
            dot_escape(cid),
            dot_escape(&self.label_for(cid))
        );
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
