use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// An entry of the workspace list, pointing at one `.code-workspace` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub file_path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Workspace {
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self::with_created_at(name, file_path, OffsetDateTime::now_utc())
    }

    pub fn with_created_at(
        name: impl Into<String>,
        file_path: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            file_path: file_path.into(),
            created_at,
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}

/// A project directory listed in a workspace file.
///
/// `exists_on_disk` and `is_git_repository` hit the filesystem on every call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Folder {
    pub fn new(path: impl Into<String>, display_name: Option<String>) -> Self {
        let path = path.into();
        Self {
            name: last_path_component(&path),
            path,
            display_name,
        }
    }

    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn exists_on_disk(&self) -> bool {
        Path::new(&self.path).is_dir()
    }

    pub fn is_git_repository(&self) -> bool {
        self.exists_on_disk() && Path::new(&self.path).join(".git").is_dir()
    }
}

pub(crate) fn last_path_component(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn folder_name_is_last_path_component() {
        let folder = Folder::new("/Users/me/code/shark", None);
        assert_eq!(folder.name, "shark");
        assert_eq!(folder.label(), "shark");

        let named = Folder::new("/Users/me/code/shark", Some("Shark App".to_string()));
        assert_eq!(named.label(), "Shark App");
    }

    #[test]
    fn existence_flags_reflect_live_filesystem_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("later");
        let folder = Folder::new(path.display().to_string(), None);
        assert!(!folder.exists_on_disk());
        assert!(!folder.is_git_repository());

        fs::create_dir(&path).unwrap();
        assert!(folder.exists_on_disk());
        assert!(!folder.is_git_repository());

        fs::create_dir(path.join(".git")).unwrap();
        assert!(folder.is_git_repository());
    }

    #[test]
    fn git_file_is_not_a_repository_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".git"), "gitdir: elsewhere").unwrap();
        let folder = Folder::new(dir.path().display().to_string(), None);
        assert!(folder.exists_on_disk());
        assert!(!folder.is_git_repository());
    }

    #[test]
    fn workspace_serializes_with_camel_case_keys() {
        let workspace = Workspace::new("Demo", "/tmp/demo.code-workspace");
        let value = serde_json::to_value(&workspace).unwrap();
        assert_eq!(value["filePath"], "/tmp/demo.code-workspace");
        assert!(value["createdAt"].is_string());
        assert!(value["id"].is_string());

        let decoded: Workspace = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, workspace);
    }

    #[test]
    fn fresh_workspaces_get_distinct_ids() {
        let a = Workspace::new("A", "/tmp/a.code-workspace");
        let b = Workspace::new("A", "/tmp/a.code-workspace");
        assert_ne!(a.id, b.id);
    }
}
