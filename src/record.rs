//! Character record rendering.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::config::{RecordConfig, TraversalConfig};
use crate::genealogy::{emission_order, Genealogy};
use crate::ids::{name_token, IdAllocator};
use crate::model::{format_record_date, Person, Qid};
use crate::resolver::PersonDirectory;

/// Pass-through tokens and prefixes for emitted records
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub name_prefix: String,
    pub name_fallback_prefix: String,
    pub culture: String,
    pub religion: String,
    pub dynasty: Option<String>,
    pub tag: Option<String>,
    /// Birth location token written for every person; when absent the
    /// source birthplace is left as a comment for manual mapping.
    pub birth_location: Option<String>,
    /// Death dates after this are omitted.
    pub cutoff_date: NaiveDate,
}

impl RecordOptions {
    pub fn from_config(record: &RecordConfig, traversal: &TraversalConfig) -> Self {
        Self {
            name_prefix: record.name_prefix.clone(),
            name_fallback_prefix: record.name_fallback_prefix.clone(),
            culture: record.culture.clone(),
            religion: record.religion.clone(),
            dynasty: record.dynasty.clone(),
            tag: record.tag.clone(),
            birth_location: record.birth_location.clone(),
            cutoff_date: traversal.cutoff_date,
        }
    }
}

/// Render one character block.
///
/// `father_id` is written whenever given; `mother_id` should only be given
/// when the mother is herself emitted.
pub fn render_character_entry(
    person: &Person,
    char_id: &str,
    father_id: Option<&str>,
    mother_id: Option<&str>,
    options: &RecordOptions,
) -> String {
    let mut header_comment = match &person.secondary_label {
        Some(label) => format!(" # {}", label),
        None => String::new(),
    };
    header_comment.push_str(&format!(" ({})", person.qid));

    let mut lines = Vec::new();
    lines.push(format!("    {} = {{{}", char_id, header_comment));
    lines.push(format!(
        "        first_name = {{ name = {} }}",
        name_token(person, &options.name_prefix, &options.name_fallback_prefix)
    ));
    lines.push(format!("        culture = {}", options.culture));
    lines.push(format!("        religion = {}", options.religion));

    if let Some(birth) = person.birth {
        lines.push(format!("        birth_date = {}", format_record_date(birth)));
    }
    if let Some(death) = person.death.filter(|d| *d <= options.cutoff_date) {
        lines.push(format!("        death_date = {}", format_record_date(death)));
    }

    if let Some(location) = &options.birth_location {
        lines.push(format!("        birth = {}", location));
    } else if let Some(place) = &person.birthplace_label {
        lines.push(format!("        # birth = <unmapped>  # source birthplace: {}", place));
    }

    if let Some(dynasty) = &options.dynasty {
        lines.push(format!("        dynasty = {}", dynasty));
    }
    if let Some(father) = father_id {
        lines.push(format!("        father = {}", father));
    }
    if let Some(mother) = mother_id {
        lines.push(format!("        mother = {}", mother));
    }
    if let Some(tag) = &options.tag {
        lines.push(format!("        tag = {}", tag));
    }

    lines.push("    }".to_string());
    lines.join("\n")
}

/// Render every member of `genealogy` in parents-first order.
///
/// Local identifiers are allocated in emission order. Entries are separated
/// by a blank line; an empty genealogy renders as an empty string.
pub fn render_genealogy(
    genealogy: &Genealogy,
    people: &PersonDirectory,
    allocator: &mut IdAllocator,
    options: &RecordOptions,
) -> String {
    let order = emission_order(genealogy, people);
    let entries: Vec<String> = order
        .iter()
        .map(|qid| render_member(qid, &genealogy.members, people, allocator, options))
        .collect();

    log::info!("Rendered {} character entries", entries.len());
    if entries.is_empty() {
        return String::new();
    }
    let mut out = entries.join("\n\n");
    out.push('\n');
    out
}

fn render_member(
    qid: &Qid,
    members: &BTreeSet<Qid>,
    people: &PersonDirectory,
    allocator: &mut IdAllocator,
    options: &RecordOptions,
) -> String {
    let person = people.person(qid);
    let char_id = allocator.id_for(&person);

    let father_id = person
        .father
        .as_ref()
        .map(|father| allocator.id_for(&people.person(father)));
    let mother_id = person
        .mother
        .as_ref()
        .filter(|mother| members.contains(*mother))
        .map(|mother| allocator.id_for(&people.person(mother)));

    render_character_entry(&person, &char_id, father_id.as_deref(), mother_id.as_deref(), options)
}
