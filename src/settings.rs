use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{
    DEFAULT_SETTINGS_FOLDER_NAME, SETTINGS_FOLDER_PATH_KEY, WORKSPACE_FILE_EXTENSION,
};
use crate::error::{Result, SharkError};
use crate::fs_access::WorkspaceFs;
use crate::paths;
use crate::store::{self, KeyValueStore};

/// User-configurable location of the managed workspace folder.
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
    fs: Arc<dyn WorkspaceFs>,
    default_folder: PathBuf,
}

impl Settings {
    pub fn new(store: Arc<dyn KeyValueStore>, fs: Arc<dyn WorkspaceFs>) -> Self {
        Self::with_default_folder(store, fs, default_settings_folder_path())
    }

    pub fn with_default_folder(
        store: Arc<dyn KeyValueStore>,
        fs: Arc<dyn WorkspaceFs>,
        default_folder: PathBuf,
    ) -> Self {
        Self {
            store,
            fs,
            default_folder,
        }
    }

    pub fn default_folder(&self) -> &Path {
        &self.default_folder
    }

    pub fn settings_folder_path(&self) -> PathBuf {
        match store::get_typed::<String>(self.store.as_ref(), SETTINGS_FOLDER_PATH_KEY) {
            Ok(Some(saved)) if !saved.trim().is_empty() => PathBuf::from(saved.trim()),
            Ok(_) => self.default_folder.clone(),
            Err(error) => {
                tracing::warn!(%error, "ignoring unreadable settings folder preference");
                self.default_folder.clone()
            }
        }
    }

    /// An empty path resets to the default folder.
    pub fn set_settings_folder_path(&self, path: &str) -> Result<PathBuf> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            self.store.remove(SETTINGS_FOLDER_PATH_KEY)?;
            return Ok(self.default_folder.clone());
        }

        let candidate = PathBuf::from(trimmed);
        if !candidate.is_absolute() {
            return Err(SharkError::Invalid(format!(
                "settings folder must be an absolute path, got \"{trimmed}\""
            )));
        }

        let normalized = paths::normalize_lexically(&candidate);
        store::set_typed(
            self.store.as_ref(),
            SETTINGS_FOLDER_PATH_KEY,
            &normalized.display().to_string(),
        )?;
        Ok(normalized)
    }

    pub fn ensure_settings_folder(&self) -> Result<PathBuf> {
        let folder = self.settings_folder_path();
        if !self.fs.is_dir(&folder) {
            self.fs
                .create_dir_all(&folder)
                .map_err(|error| SharkError::io(&folder, error))?;
            tracing::info!(folder = %folder.display(), "created settings folder");
        }
        Ok(folder)
    }

    /// `base.code-workspace`, or `base-N.code-workspace` with the first unused N.
    pub fn generate_workspace_filename(&self, base_name: &str) -> String {
        let folder = self.settings_folder_path();
        let mut filename = format!("{base_name}.{WORKSPACE_FILE_EXTENSION}");
        let mut counter = 1;
        while self.fs.exists(&folder.join(&filename)) {
            filename = format!("{base_name}-{counter}.{WORKSPACE_FILE_EXTENSION}");
            counter += 1;
        }
        filename
    }

    pub fn new_workspace_path(&self, base_name: &str) -> Result<PathBuf> {
        let folder = self.ensure_settings_folder()?;
        Ok(folder.join(self.generate_workspace_filename(base_name)))
    }
}

pub fn default_settings_folder_path() -> PathBuf {
    paths::documents_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(DEFAULT_SETTINGS_FOLDER_NAME)
}
