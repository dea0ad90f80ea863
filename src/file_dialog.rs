use std::path::{Path, PathBuf};

use crate::constants::WORKSPACE_FILE_EXTENSION;

/// Native dialogs used to choose workspace files and project folders. Every
/// method returns an empty result when the user cancels.
pub trait FilePicker: Send + Sync {
    fn pick_workspace_file(&self) -> Option<PathBuf>;
    /// The returned path always carries the `.code-workspace` extension.
    fn pick_save_location(&self, default_name: &str) -> Option<PathBuf>;
    fn pick_folders(&self) -> Vec<PathBuf>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFilePicker;

impl FilePicker for NativeFilePicker {
    fn pick_workspace_file(&self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Import Workspace File")
            .add_filter("Workspace", &[WORKSPACE_FILE_EXTENSION, "json"])
            .pick_file()
    }

    fn pick_save_location(&self, default_name: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Create New Workspace File")
            .set_file_name(format!("{default_name}.{WORKSPACE_FILE_EXTENSION}"))
            .save_file()
            .map(|path| enforce_workspace_extension(&path))
    }

    fn pick_folders(&self) -> Vec<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Select Folders")
            .pick_folders()
            .unwrap_or_default()
    }
}

pub fn enforce_workspace_extension(path: &Path) -> PathBuf {
    if path
        .extension()
        .map(|extension| extension == WORKSPACE_FILE_EXTENSION)
        .unwrap_or(false)
    {
        return path.to_path_buf();
    }
    path.with_extension(WORKSPACE_FILE_EXTENSION)
}
