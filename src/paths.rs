use std::path::{Component, Path, PathBuf};

use crate::constants::{APP_DIR_NAME, DATA_DIR_ENV};

pub fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
}

pub fn documents_dir() -> Option<PathBuf> {
    dirs_home().map(|home| home.join("Documents"))
}

/// Where preferences and logs live. `SHARK_DATA_DIR` wins when set.
pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .filter(|value| !value.as_os_str().is_empty())
    {
        return Some(dir);
    }

    #[cfg(target_os = "macos")]
    {
        return dirs_home().map(|home| {
            home.join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME)
        });
    }

    #[cfg(target_os = "windows")]
    {
        return std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .map(|dir| dir.join(APP_DIR_NAME));
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|value| !value.is_empty()) {
            return Some(PathBuf::from(xdg).join(APP_DIR_NAME));
        }
        dirs_home().map(|home| home.join(".local").join("share").join(APP_DIR_NAME))
    }
}

/// Resolves `.` and `..` lexically, without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// True when `file` sits directly inside `folder`. Sibling folders that only
/// share a name prefix do not count.
pub fn is_directly_inside(file: &Path, folder: &Path) -> bool {
    let file = normalize_lexically(file);
    let folder = normalize_lexically(folder);
    file.parent().map(|parent| parent == folder).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_children_are_inside() {
        assert!(is_directly_inside(
            Path::new("/a/SharkSpace/w.code-workspace"),
            Path::new("/a/SharkSpace"),
        ));
        assert!(is_directly_inside(
            Path::new("/a/SharkSpace/w.code-workspace"),
            Path::new("/a/SharkSpace/"),
        ));
        assert!(is_directly_inside(
            Path::new("/a/./SharkSpace/w.code-workspace"),
            Path::new("/a/b/../SharkSpace"),
        ));
    }

    #[test]
    fn prefix_siblings_and_nested_files_are_outside() {
        assert!(!is_directly_inside(
            Path::new("/a/SharkSpace2/w.code-workspace"),
            Path::new("/a/SharkSpace"),
        ));
        assert!(!is_directly_inside(
            Path::new("/a/SharkSpace/nested/w.code-workspace"),
            Path::new("/a/SharkSpace"),
        ));
    }
}
