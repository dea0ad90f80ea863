use std::path::Path;

use crate::models::{Folder, Workspace};
use crate::workspace_file::{FolderEntry, WorkspaceFile};

/// Builds a workspace record for `file_path`. The name defaults to the file's
/// base name without extension.
pub fn to_workspace(_file: &WorkspaceFile, file_path: &str, name: Option<&str>) -> Workspace {
    let name = name
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| workspace_name_from_path(file_path));
    Workspace::new(name, file_path)
}

pub fn to_folders(file: &WorkspaceFile) -> Vec<Folder> {
    file.folders
        .iter()
        .map(|entry| Folder::new(entry.path.clone(), entry.name.clone()))
        .collect()
}

/// Replaces the file's folder list wholesale.
pub fn update_folders(file: &WorkspaceFile, folders: &[Folder]) -> WorkspaceFile {
    let mut updated = file.clone();
    updated.folders = folders
        .iter()
        .map(|folder| FolderEntry::new(folder.path.clone(), folder.display_name.clone()))
        .collect();
    updated
}

pub fn workspace_name_from_path(file_path: &str) -> String {
    let path = Path::new(file_path);
    path.file_stem()
        .map(|value| value.to_string_lossy().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| file_path.to_string())
}
