use super::{FileMetadata, FileSystem, FileType};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Version-control internals never walked
const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
fn is_executable_mode(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable_mode(_meta: &fs::Metadata) -> bool {
    true
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).context(format!("Failed to get metadata for {:?}", path))?;

        let file_type = if meta.is_file() {
            FileType::File
        } else if meta.is_dir() {
            FileType::Directory
        } else {
            FileType::Symlink
        };

        Ok(FileMetadata {
            size: meta.len(),
            file_type,
            executable: is_executable_mode(&meta),
        })
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn list_files(&self, root: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            anyhow::bail!("Search directory is not a directory: {:?}", root);
        }

        let mut files = Vec::new();
        for result in WalkBuilder::new(root)
            .max_depth(Some(max_depth))
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                !(entry.file_type().is_some_and(|t| t.is_dir())
                    && VCS_DIRS.iter().any(|dir| entry.file_name() == *dir))
            })
            .build()
        {
            let entry = result.with_context(|| format!("Failed to walk {}", root.display()))?;

            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .context(format!("Walked outside of {:?}", root))?;
            files.push(relative.to_path_buf());
        }

        files.sort();
        Ok(files)
    }
}
