//! Graphviz invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{DynastyError, Result};

/// Output formats accepted by the renderer
pub const FORMATS: &[&str] = &["png", "pdf", "svg", "jpg"];

/// Write `dot` to `<output>.gv` and, unless `dot_only`, render it with
/// Graphviz into `<output>.<format>`.
///
/// Returns the path of the file produced last (the DOT source when
/// `dot_only`, otherwise the rendered image).
///
/// # Arguments
/// * `engine` - Graphviz layout engine passed as `-K`
/// * `format` - one of [`FORMATS`]
pub fn render_graph(dot: &str, output: &Path, engine: &str, format: &str, dot_only: bool) -> Result<PathBuf> {
    if !FORMATS.contains(&format) {
        return Err(DynastyError::Render(format!("Unsupported output format: {}", format)));
    }

    let source = append_extension(output, "gv");
    if let Some(parent) = source.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&source, dot)?;
    log::info!("Wrote DOT source to {}", source.display());

    if dot_only {
        return Ok(source);
    }

    let target = append_extension(output, format);
    let result = Command::new("dot")
        .arg(format!("-K{}", engine))
        .arg(format!("-T{}", format))
        .arg("-o")
        .arg(&target)
        .arg(&source)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| DynastyError::Render(format!("Failed to start Graphviz `dot`: {}", e)))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(DynastyError::Render(format!(
            "Graphviz failed (exit={:?}): {}",
            result.status.code(),
            stderr.trim()
        )));
    }

    log::info!("Rendered {}", target.display());
    Ok(target)
}

/// `output` with `.ext` added, keeping any dots already in the file name.
fn append_extension(output: &Path, ext: &str) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(ext);
    output.with_file_name(name)
}

/// Open `path` with the desktop's default viewer, if `xdg-open` exists.
pub fn open_in_viewer(path: &Path) {
    match Command::new("xdg-open")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(_) => log::debug!("Opened {} with xdg-open", path.display()),
        Err(e) => log::warn!("Could not open {}: {}", path.display(), e),
    }
}
