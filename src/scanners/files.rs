//! File list helpers shared by detectors

use std::path::{Component, Path, PathBuf};

/// Directories whose contents never count as project sources
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "Pods", "Carthage", ".git", "build"];

/// True when any directory component of `path` is excluded
pub fn is_excluded(path: &Path) -> bool {
    let parent = match path.parent() {
        Some(p) => p,
        None => return false,
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .map(|n| EXCLUDED_DIRS.contains(&n))
            .unwrap_or(false),
        _ => false,
    })
}

/// Files whose name is one of `names`, skipping excluded directories
pub fn filter_by_file_name(files: &[PathBuf], names: &[&str]) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|f| !is_excluded(f))
        .filter(|f| {
            f.file_name()
                .and_then(|n| n.to_str())
                .map(|n| names.contains(&n))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Stable sort by number of path components, shallow paths first
pub fn sort_by_components(files: &mut [PathBuf]) {
    files.sort_by_key(|f| f.components().count());
}

pub fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Slash-separated display form; the empty path renders as `.`
pub fn path_str(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(n) => Some(n.to_string_lossy().to_string()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Parent directory, or the empty path for top-level files
pub fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
