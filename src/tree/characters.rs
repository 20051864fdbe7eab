//! Scanning of flat-file character records.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

/// Fields of one character block relevant to the family tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFields {
    pub name: Option<String>,
    pub dynasty: Option<String>,
    pub father: Option<String>,
    pub mother: Option<String>,
    pub spouses: Vec<String>,
}

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("Invalid regex pattern"))
        }
    };
}

static_regex!(top_level_block, r"(?m)^\s*([A-Za-z0-9_]+)\s*=\s*\{");
static_regex!(inner_block, r"\s*([A-Za-z0-9_]+)\s*=\s*\{");
static_regex!(quoted_name, r#"name\s*=\s*"([^"]+)""#);
static_regex!(quoted_first_name, r#"first_name\s*=\s*"([^"]+)""#);
static_regex!(bare_name, r"name\s*=\s*([A-Za-z0-9_]+)");
static_regex!(nested_first_name, r"first_name\s*=\s*\{[^}]*name\s*=\s*([A-Za-z0-9_]+)");
static_regex!(bare_first_name, r"first_name\s*=\s*([A-Za-z0-9_]+)");
static_regex!(dynasty_field, r#"dynasty\s*=\s*"?([A-Za-z0-9_]+)"?"#);
static_regex!(father_field, r"father\s*=\s*([A-Za-z0-9_]+)");
static_regex!(mother_field, r"mother\s*=\s*([A-Za-z0-9_]+)");
static_regex!(spouse_simple, r#"spouse\s*=\s*"?([A-Za-z0-9_]+)"?"#);
static_regex!(spouse_nested, r#"spouse\s*=\s*\{[^}]*?id\s*=\s*"?([A-Za-z0-9_]+)"?[^}]*\}"#);

/// Split `text` into `identifier = { ... }` blocks, matching braces.
///
/// Returns identifier -> block body (text after the opening brace, up to and
/// including the closing one). Later duplicates replace earlier ones.
fn scan_blocks(text: &str, opener: &Regex) -> BTreeMap<String, String> {
    let mut blocks = BTreeMap::new();
    let bytes = text.as_bytes();
    let mut pos = 0;

    while let Some(caps) = opener.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        let ident = caps[1].to_string();
        let body_start = whole.end();

        let mut depth = 1usize;
        let mut i = body_start;
        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            i += 1;
        }

        blocks.insert(ident, text[body_start..i].to_string());
        if i <= pos {
            break;
        }
        pos = i;
    }

    blocks
}

/// Parse a character file's text into identifier -> block body.
///
/// A file wrapping everything in a single `character_db = { ... }` block is
/// unwrapped to its inner entries.
pub fn parse_characters(text: &str) -> BTreeMap<String, String> {
    let blocks = scan_blocks(text, top_level_block());
    if blocks.len() == 1 {
        if let Some(db) = blocks.get("character_db") {
            let inner = scan_blocks(db, inner_block());
            if !inner.is_empty() {
                return inner;
            }
        }
    }
    blocks
}

/// Read and parse a character file.
pub fn load_characters(path: &Path) -> Result<BTreeMap<String, String>> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let chars = parse_characters(&text);
    log::info!("Parsed {} character blocks from {}", chars.len(), path.display());
    Ok(chars)
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].to_string())
}

/// Pull name, dynasty, parents and spouses out of a block body.
pub fn extract_fields(block: &str) -> CharacterFields {
    let name = first_capture(quoted_name(), block)
        .or_else(|| first_capture(quoted_first_name(), block))
        .or_else(|| first_capture(bare_name(), block))
        .or_else(|| first_capture(nested_first_name(), block))
        .or_else(|| first_capture(bare_first_name(), block));

    let mut seen = HashSet::new();
    let spouses = spouse_simple()
        .captures_iter(block)
        .chain(spouse_nested().captures_iter(block))
        .map(|c| c[1].to_string())
        .filter(|s| seen.insert(s.clone()))
        .collect();

    CharacterFields {
        name,
        dynasty: first_capture(dynasty_field(), block),
        father: first_capture(father_field(), block),
        mother: first_capture(mother_field(), block),
        spouses,
    }
}

/// Characters belonging to `dynasty`, plus the extracted fields of every block.
///
/// A character matches when its identifier equals the query, its `dynasty`
/// field equals it, or its block assigns `dynasty = <query>` explicitly.
pub fn select_by_dynasty(
    chars: &BTreeMap<String, String>,
    dynasty: &str,
) -> (BTreeSet<String>, BTreeMap<String, CharacterFields>) {
    let query = dynasty.trim();
    let explicit = Regex::new(&format!(r#"dynasty\s*=\s*"?{}"?"#, regex::escape(query))).ok();

    let mut fields = BTreeMap::new();
    let mut selected = BTreeSet::new();
    for (cid, block) in chars {
        let info = extract_fields(block);
        let matches = cid == query
            || info.dynasty.as_deref().map(str::trim) == Some(query)
            || explicit.as_ref().is_some_and(|re| re.is_match(block));
        if matches {
            selected.insert(cid.clone());
        }
        fields.insert(cid.clone(), info);
    }

    (selected, fields)
}

/// Widen a selection with each member's father and mother.
pub fn expand_with_parents(
    selected: &BTreeSet<String>,
    fields: &BTreeMap<String, CharacterFields>,
) -> BTreeSet<String> {
    let mut expanded = selected.clone();
    for cid in selected {
        if let Some(info) = fields.get(cid) {
            expanded.extend(info.father.iter().cloned());
            expanded.extend(info.mother.iter().cloned());
        }
    }
    expanded
}
