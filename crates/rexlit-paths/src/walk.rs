//! Recursive directory traversal (§4.3, §4.6): yields regular files under a
//! root, silently dropping symlinked entries whose resolved target escapes
//! the root rather than treating escape as an error or following it anyway.

use std::path::{Path, PathBuf};

use rexlit_common::error::Result;

/// Extension include/exclude filters applied during a walk. Extensions are
/// compared lowercased, without the leading dot.
#[derive(Debug, Clone, Default)]
pub struct ExtensionFilter {
    pub include: Option<Vec<String>>,
    pub exclude: Vec<String>,
}

impl ExtensionFilter {
    pub fn allows(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if self.exclude.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            return false;
        }
        match &self.include {
            Some(allowed) => allowed.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
            None => true,
        }
    }
}

/// Walk `root` recursively, returning the absolute paths of every regular
/// file that passes `filter`. Directories and files reached only through a
/// symlink whose resolved target falls outside `root` are dropped: neither
/// followed nor reported as an error.
pub fn walk_tree(root: &Path, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
    let canonical_root = root.canonicalize().map_err(rexlit_common::error::Error::Io)?;
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                continue;
            }
        };

        if entry.path_is_symlink() {
            match entry.path().canonicalize() {
                Ok(resolved) if resolved.starts_with(&canonical_root) => {
                    if resolved.is_file() && filter_allows(&resolved, filter) {
                        files.push(resolved);
                    }
                }
                Ok(resolved) => {
                    tracing::debug!(path = %resolved.display(), "dropping symlink escaping root");
                }
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), error = %err, "dropping unresolvable symlink");
                }
            }
            continue;
        }

        if entry.file_type().is_file() && filter_allows(entry.path(), filter) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn filter_allows(path: &Path, filter: &ExtensionFilter) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    filter.allows(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn walks_nested_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/one.txt"), b"1").unwrap();
        fs::write(dir.path().join("a/b/two.txt"), b"2").unwrap();

        let found = walk_tree(dir.path(), &ExtensionFilter::default()).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn extension_filter_include_and_exclude() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doc.pdf"), b"x").unwrap();
        fs::write(dir.path().join("note.txt"), b"x").unwrap();
        fs::write(dir.path().join("image.png"), b"x").unwrap();

        let include_only = ExtensionFilter {
            include: Some(vec!["pdf".to_string(), "txt".to_string()]),
            exclude: vec![],
        };
        let found = walk_tree(dir.path(), &include_only).unwrap();
        assert_eq!(found.len(), 2);

        let exclude_png = ExtensionFilter {
            include: None,
            exclude: vec!["png".to_string()],
        };
        let found = walk_tree(dir.path(), &exclude_png).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escaping_root_is_dropped_not_followed() {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"shh").unwrap();

        symlink(outside.path().join("secret.txt"), root.path().join("link.txt")).unwrap();
        fs::write(root.path().join("inside.txt"), b"ok").unwrap();

        let found = walk_tree(root.path(), &ExtensionFilter::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("inside.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_within_root_is_followed() {
        use std::os::unix::fs::symlink;

        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("real")).unwrap();
        fs::write(root.path().join("real/target.txt"), b"ok").unwrap();
        symlink(root.path().join("real/target.txt"), root.path().join("alias.txt")).unwrap();

        let found = walk_tree(root.path(), &ExtensionFilter::default()).unwrap();
        assert_eq!(found.len(), 2);
    }
}
