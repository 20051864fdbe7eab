//! Localisation tables from game and mod directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

/// Localisation key -> display string
pub type Localisations = HashMap<String, String>;

fn language_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*l_[a-zA-Z0-9_]+\s*:\s*$").expect("Invalid regex pattern"))
}

fn english_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*l_english\s*:\s*$").expect("Invalid regex pattern"))
}

fn entry_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*([A-Za-z0-9_\.]+)\s*:\s*\d*\s*"([^"]+)""#).expect("Invalid regex pattern"))
}

/// Localisation files below `root`: `.yml`, `.yaml` or `.txt` files inside a
/// directory whose path mentions `localization` or `localisation`.
pub fn find_localisation_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let in_loc_dir = path
            .parent()
            .map(|dir| dir.to_string_lossy().to_lowercase())
            .is_some_and(|dir| dir.contains("localization") || dir.contains("localisation"));
        if !in_loc_dir {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if matches!(extension.as_str(), "yml" | "yaml" | "txt") {
            files.push(path.to_path_buf());
        }
    }

    log::debug!("Found {} localisation files in {}", files.len(), root.display());
    files
}

fn parse_entries(lines: &str, stop_at_language: bool) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    for line in lines.lines() {
        if stop_at_language && language_header().is_match(line) {
            break;
        }
        if let Some(caps) = entry_line().captures(line) {
            entries.push((caps[1].to_string(), caps[2].to_string()));
        }
    }
    entries
}

/// Parse one localisation file's text.
///
/// Returns the entries and whether they are English. An English file (by
/// name or by an `l_english:` header) only contributes the lines of its
/// English block.
pub fn parse_localisation(file_name: &str, text: &str) -> (Vec<(String, String)>, bool) {
    if let Some(header) = english_header().find(text) {
        return (parse_entries(&text[header.end()..], true), true);
    }
    if file_name.to_lowercase().contains("l_english") {
        return (parse_entries(text, true), true);
    }
    (parse_entries(text, false), false)
}

/// Load localisations from the base game first, then the mod.
///
/// Keys already known are never replaced, so the mod only fills gaps. English
/// entries take precedence over entries of any other language.
pub fn load_localisations(mod_dir: Option<&Path>, base_game_dir: Option<&Path>) -> Localisations {
    let mut general = Localisations::new();
    let mut english = Localisations::new();

    for root in [base_game_dir, mod_dir].into_iter().flatten() {
        for path in find_localisation_files(root) {
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Skipping localisation file {}: {}", path.display(), e);
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();

            let (entries, is_english) = parse_localisation(&file_name, &text);
            let table = if is_english { &mut english } else { &mut general };
            for (key, value) in entries {
                table.entry(key).or_insert(value);
            }
        }
    }

    let total_english = english.len();
    general.extend(english);
    log::info!(
        "Loaded {} localisation keys ({} English)",
        general.len(),
        total_english
    );
    general
}
