use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;

/// File name up to its first '.', used as the sample name.
pub fn extract_filename(path: &Path) -> Option<&str> {
    let filename = path.file_name()?.to_str()?;
    match filename.find('.') {
        Some(0) | None => Some(filename),
        Some(idx) => Some(&filename[..idx]),
    }
}

/// Reads the list of sample files, one per line.
///
/// Blank lines and `#` comments are skipped. Relative paths are resolved
/// against the directory holding the list. Every sample must have its own
/// name under [`extract_filename`], since the name identifies it in the
/// count table.
pub fn read_fof(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read sample list {}", path.display()))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut samples = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        let sample = base.join(entry);
        let name = extract_filename(&sample)
            .with_context(|| format!("no sample name in '{entry}' on line {}", idx + 1))?;
        if let Some(prev) = first_seen.insert(name.to_string(), idx + 1) {
            bail!(
                "sample '{}' on line {} of {} repeats line {}",
                name,
                idx + 1,
                path.display(),
                prev
            );
        }
        samples.push(sample);
    }
    if samples.is_empty() {
        log::warn!("No samples listed in {}", path.display());
    }
    Ok(samples)
}
