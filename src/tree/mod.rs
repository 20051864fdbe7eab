//! Family-tree visualisation of emitted character files.
//!
//! Reads a character file, selects one dynasty (plus its members' parents),
//! labels people through the game's localisation tables and renders the
//! result with Graphviz.

mod characters;
mod graph;
mod localisation;
mod render;

pub use characters::{
    expand_with_parents, extract_fields, load_characters, parse_characters, select_by_dynasty, CharacterFields,
};
pub use graph::FamilyGraph;
pub use localisation::{find_localisation_files, load_localisations, parse_localisation, Localisations};
pub use render::{open_in_viewer, render_graph, FORMATS};

use std::collections::BTreeMap;

/// DOT source for `dynasty`, or `None` when no character belongs to it.
pub fn dynasty_dot(chars: &BTreeMap<String, String>, dynasty: &str, localisations: &Localisations) -> Option<String> {
    let (selected, fields) = select_by_dynasty(chars, dynasty);
    if selected.is_empty() {
        return None;
    }
    let members = expand_with_parents(&selected, &fields);
    log::info!(
        "Selected {} characters for {} ({} with parents)",
        selected.len(),
        dynasty,
        members.len()
    );
    Some(FamilyGraph::new(&fields, localisations, Some(dynasty)).to_dot(&members))
}
