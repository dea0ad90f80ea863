use std::path::Path;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::constants::{WORKSPACES_KEY, WORKSPACE_FILE_EXTENSION};
use crate::derivation;
use crate::error::Result;
use crate::fs_access::WorkspaceFs;
use crate::models::Workspace;
use crate::paths;
use crate::store::{self, KeyValueStore};
use crate::workspace_file;

/// Owns the authoritative workspace list and keeps the persisted slot in sync
/// with it.
pub struct WorkspaceRegistry {
    store: Arc<dyn KeyValueStore>,
    fs: Arc<dyn WorkspaceFs>,
    workspaces: Vec<Workspace>,
}

impl WorkspaceRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, fs: Arc<dyn WorkspaceFs>) -> Self {
        Self {
            store,
            fs,
            workspaces: Vec::new(),
        }
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn find(&self, id: Uuid) -> Option<&Workspace> {
        self.workspaces.iter().find(|workspace| workspace.id == id)
    }

    pub fn contains_path(&self, file_path: &str) -> bool {
        self.workspaces
            .iter()
            .any(|workspace| workspace.file_path == file_path)
    }

    /// Restores the persisted list, scanning `settings_folder` when the slot
    /// is missing or unreadable.
    pub fn load(&mut self, settings_folder: &Path) {
        if !self.restore_saved() {
            self.scan(settings_folder);
        }
    }

    /// Restores the persisted list without touching the settings folder.
    /// Returns false (leaving the list empty) when the slot is missing or
    /// unreadable.
    pub fn restore_saved(&mut self) -> bool {
        match store::get_typed::<Vec<Workspace>>(self.store.as_ref(), WORKSPACES_KEY) {
            Ok(Some(saved)) => {
                tracing::info!(count = saved.len(), "restored saved workspaces");
                self.workspaces = saved;
                true
            }
            Ok(None) => {
                tracing::info!("no saved workspaces");
                self.workspaces.clear();
                false
            }
            Err(error) => {
                tracing::warn!(%error, "saved workspaces are unreadable");
                self.workspaces.clear();
                false
            }
        }
    }

    /// Replaces the list with the workspace files found in `settings_folder`.
    pub fn scan(&mut self, settings_folder: &Path) -> &[Workspace] {
        self.workspaces = scan_folder(self.fs.as_ref(), settings_folder);
        self.persist_logged();
        &self.workspaces
    }

    /// Merges a fresh scan into the current list. Scanned files that are not
    /// yet known are appended; known files directly inside `settings_folder`
    /// that have disappeared are dropped. Entries living elsewhere are never
    /// dropped here.
    pub fn reconcile(&mut self, settings_folder: &Path) -> &[Workspace] {
        let scanned = scan_folder(self.fs.as_ref(), settings_folder);
        let before = self.workspaces.len();

        let mut merged = self.workspaces.clone();
        let mut added = 0usize;
        for workspace in scanned {
            if !merged
                .iter()
                .any(|existing| existing.file_path == workspace.file_path)
            {
                merged.push(workspace);
                added += 1;
            }
        }

        let fs = self.fs.as_ref();
        merged.retain(|workspace| {
            let path = workspace.path();
            fs.exists(path) || !paths::is_directly_inside(path, settings_folder)
        });

        sort_newest_first(&mut merged);
        let removed = before + added - merged.len();
        tracing::info!(added, removed, total = merged.len(), "reconciled workspaces");

        self.workspaces = merged;
        self.persist_logged();
        &self.workspaces
    }

    /// Appends `workspace` unless one with the same file path is already
    /// known. Returns whether it was added.
    pub fn add(&mut self, workspace: Workspace) -> Result<bool> {
        if self.contains_path(&workspace.file_path) {
            return Ok(false);
        }

        let mut next = self.workspaces.clone();
        next.push(workspace);
        self.commit(next)?;
        Ok(true)
    }

    /// Drops the entry with the same id. The backing file is left alone.
    pub fn remove(&mut self, workspace: &Workspace) -> Result<Option<Workspace>> {
        let Some(index) = self
            .workspaces
            .iter()
            .position(|existing| existing.id == workspace.id)
        else {
            return Ok(None);
        };

        let mut next = self.workspaces.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(Some(removed))
    }

    /// Replaces the entry with the same id in place.
    pub fn update(&mut self, workspace: Workspace) -> Result<bool> {
        let Some(index) = self
            .workspaces
            .iter()
            .position(|existing| existing.id == workspace.id)
        else {
            return Ok(false);
        };

        let mut next = self.workspaces.clone();
        next[index] = workspace;
        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: Vec<Workspace>) -> Result<()> {
        store::set_typed(self.store.as_ref(), WORKSPACES_KEY, &next)?;
        self.workspaces = next;
        Ok(())
    }

    fn persist_logged(&self) {
        if let Err(error) = store::set_typed(self.store.as_ref(), WORKSPACES_KEY, &self.workspaces)
        {
            tracing::warn!(%error, "failed to persist workspace list");
        }
    }
}

/// Workspace records for every parseable `.code-workspace` file directly
/// inside `folder`, newest first. Unreadable folders yield nothing.
pub fn scan_folder(fs: &dyn WorkspaceFs, folder: &Path) -> Vec<Workspace> {
    let entries = match fs.list_dir(folder) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(folder = %folder.display(), %error, "settings folder is not readable");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for path in entries {
        if !has_workspace_extension(&path) {
            continue;
        }

        let file = match workspace_file::load(fs, &path) {
            Ok(file) => file,
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "skipping invalid workspace file");
                continue;
            }
        };

        let created_at = fs
            .created_at(&path)
            .map(OffsetDateTime::from)
            .unwrap_or_else(|_| OffsetDateTime::now_utc());
        let mut workspace = derivation::to_workspace(&file, &path.display().to_string(), None);
        workspace.created_at = created_at;
        found.push(workspace);
    }

    sort_newest_first(&mut found);
    found
}

pub fn has_workspace_extension(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension == WORKSPACE_FILE_EXTENSION)
        .unwrap_or(false)
}

fn sort_newest_first(workspaces: &mut [Workspace]) {
    workspaces.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
