use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::authorization::{AuthorizationStatus, Capability, PermissionGate};
use crate::constants::{APP_DIR_NAME, DEFAULT_WORKSPACE_BASE_NAME, PREFERENCES_FILE};
use crate::derivation;
use crate::error::{Result, SharkError};
use crate::file_dialog::{FilePicker, NativeFilePicker};
use crate::fs_access::{LocalFs, WorkspaceFs};
use crate::launcher::{self, NativeLauncher, ProcessLauncher};
use crate::models::{Folder, Workspace};
use crate::paths;
use crate::registry::WorkspaceRegistry;
use crate::settings::Settings;
use crate::store::{JsonFileStore, KeyValueStore};
use crate::workspace_file::{self, WorkspaceFile};

/// Collaborators the application context is assembled from.
pub struct AppServices {
    pub store: Arc<dyn KeyValueStore>,
    pub fs: Arc<dyn WorkspaceFs>,
    pub gate: Arc<PermissionGate>,
    pub picker: Box<dyn FilePicker>,
    pub launcher: Box<dyn ProcessLauncher>,
    pub default_settings_folder: Option<PathBuf>,
}

impl AppServices {
    /// Preferences in the app data directory, the local filesystem, probed
    /// permissions and native dialogs/launchers.
    pub fn native() -> Self {
        let data_dir = paths::app_data_dir().unwrap_or_else(|| std::env::temp_dir().join(APP_DIR_NAME));
        Self {
            store: Arc::new(JsonFileStore::new(data_dir.join(PREFERENCES_FILE))),
            fs: Arc::new(LocalFs::new()),
            gate: Arc::new(PermissionGate::probe()),
            picker: Box::new(NativeFilePicker),
            launcher: Box::new(NativeLauncher),
            default_settings_folder: None,
        }
    }
}

/// Everything the presentation layer talks to. Mutations go through `&mut`
/// so there is a single owner of the workspace list.
pub struct AppContext {
    fs: Arc<dyn WorkspaceFs>,
    settings: Settings,
    registry: WorkspaceRegistry,
    gate: Arc<PermissionGate>,
    picker: Box<dyn FilePicker>,
    launcher: Box<dyn ProcessLauncher>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceListResponse {
    pub request_id: String,
    pub ok: bool,
    pub settings_folder: String,
    pub workspaces: Vec<Workspace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Workspace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRow {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub exists_on_disk: bool,
    pub is_git_repository: bool,
}

impl From<&Folder> for FolderRow {
    fn from(folder: &Folder) -> Self {
        Self {
            name: folder.name.clone(),
            path: folder.path.clone(),
            display_name: folder.display_name.clone(),
            exists_on_disk: folder.exists_on_disk(),
            is_git_repository: folder.is_git_repository(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldersResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Uuid>,
    pub folders: Vec<FolderRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResponse {
    pub request_id: String,
    pub ok: bool,
    pub launched: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub request_id: String,
    pub ok: bool,
    pub settings_folder: String,
    pub default_settings_folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn request_id() -> String {
    Uuid::new_v4().to_string()
}

fn user_message(action: &str, error: &SharkError) -> String {
    tracing::warn!(action, %error, "command failed");
    format!("Failed to {action}: {error}")
}

impl WorkspaceResponse {
    fn success(workspace: Workspace) -> Self {
        Self {
            request_id: request_id(),
            ok: true,
            workspace: Some(workspace),
            file_deleted: None,
            cancelled: None,
            error: None,
        }
    }

    fn cancelled() -> Self {
        Self {
            request_id: request_id(),
            ok: false,
            workspace: None,
            file_deleted: None,
            cancelled: Some(true),
            error: None,
        }
    }

    fn failure(action: &str, error: &SharkError) -> Self {
        Self {
            request_id: request_id(),
            ok: false,
            workspace: None,
            file_deleted: None,
            cancelled: None,
            error: Some(user_message(action, error)),
        }
    }
}

impl FoldersResponse {
    fn success(workspace_id: Uuid, folders: &[Folder]) -> Self {
        Self {
            request_id: request_id(),
            ok: true,
            workspace_id: Some(workspace_id),
            folders: folders.iter().map(FolderRow::from).collect(),
            cancelled: None,
            error: None,
        }
    }

    fn cancelled(workspace_id: Uuid) -> Self {
        Self {
            request_id: request_id(),
            ok: false,
            workspace_id: Some(workspace_id),
            folders: Vec::new(),
            cancelled: Some(true),
            error: None,
        }
    }

    fn failure(workspace_id: Uuid, action: &str, error: &SharkError) -> Self {
        Self {
            request_id: request_id(),
            ok: false,
            workspace_id: Some(workspace_id),
            folders: Vec::new(),
            cancelled: None,
            error: Some(user_message(action, error)),
        }
    }
}

impl LaunchResponse {
    fn from_result(action: &str, result: Result<Vec<String>>) -> Self {
        match result {
            Ok(launched) => Self {
                request_id: request_id(),
                ok: true,
                launched,
                error: None,
            },
            Err(error) => Self {
                request_id: request_id(),
                ok: false,
                launched: Vec::new(),
                error: Some(user_message(action, &error)),
            },
        }
    }
}

impl AppContext {
    /// Builds the context and restores the workspace list. The settings folder
    /// is scanned as a fallback only when file access is already granted.
    pub fn init(services: AppServices) -> Self {
        let AppServices {
            store,
            fs,
            gate,
            picker,
            launcher,
            default_settings_folder,
        } = services;

        let settings = match default_settings_folder {
            Some(folder) => Settings::with_default_folder(store.clone(), fs.clone(), folder),
            None => Settings::new(store.clone(), fs.clone()),
        };
        let mut registry = WorkspaceRegistry::new(store, fs.clone());
        if gate.status(Capability::FileSystemAccess) == AuthorizationStatus::Authorized {
            registry.load(&settings.settings_folder_path());
        } else {
            registry.restore_saved();
        }

        Self {
            fs,
            settings,
            registry,
            gate,
            picker,
            launcher,
        }
    }

    /// Startup refresh: merges the settings folder into the restored list when
    /// file access is already granted. Never blocks on a permission prompt.
    pub fn bootstrap(&mut self) {
        if self.gate.status(Capability::FileSystemAccess) != AuthorizationStatus::Authorized {
            tracing::info!("file access not granted yet; skipping startup refresh");
            return;
        }
        let settings_folder = self.settings.settings_folder_path();
        self.registry.reconcile(&settings_folder);
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &WorkspaceRegistry {
        &self.registry
    }

    fn require_file_access(&self) -> Result<()> {
        self.gate.require_or_err(Capability::FileSystemAccess)
    }

    fn workspace_by_id(&self, id: Uuid) -> Result<Workspace> {
        self.registry
            .find(id)
            .cloned()
            .ok_or_else(|| SharkError::NotFound(id.to_string()))
    }

    fn is_managed(&self, workspace: &Workspace) -> bool {
        paths::is_directly_inside(workspace.path(), &self.settings.settings_folder_path())
    }

    fn read_folders(&self, workspace: &Workspace) -> Result<Vec<Folder>> {
        let file = workspace_file::load(self.fs.as_ref(), workspace.path())?;
        Ok(derivation::to_folders(&file))
    }

    /// Rewrites the workspace file's folder list, keeping its other content.
    fn write_folders(&self, workspace: &Workspace, folders: &[Folder]) -> Result<()> {
        let path = workspace.path();
        let existing = if self.fs.exists(path) {
            workspace_file::load(self.fs.as_ref(), path)?
        } else {
            WorkspaceFile::empty()
        };
        let updated = derivation::update_folders(&existing, folders);
        workspace_file::save(self.fs.as_ref(), path, &updated)
    }

    fn folders_or_empty(&self, workspace: &Workspace) -> Result<Vec<Folder>> {
        if self.fs.exists(workspace.path()) {
            self.read_folders(workspace)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn workspace_list(&self) -> WorkspaceListResponse {
        WorkspaceListResponse {
            request_id: request_id(),
            ok: true,
            settings_folder: self.settings.settings_folder_path().display().to_string(),
            workspaces: self.registry.workspaces().to_vec(),
            error: None,
        }
    }

    pub fn workspace_refresh(&mut self) -> WorkspaceListResponse {
        let settings_folder = self.settings.settings_folder_path();
        if let Err(error) = self.require_file_access() {
            return WorkspaceListResponse {
                request_id: request_id(),
                ok: false,
                settings_folder: settings_folder.display().to_string(),
                workspaces: self.registry.workspaces().to_vec(),
                error: Some(user_message("refresh workspaces", &error)),
            };
        }

        self.registry.reconcile(&settings_folder);
        self.workspace_list()
    }

    /// Creates an empty workspace file in the settings folder and adds it.
    pub fn workspace_create(&mut self, name: Option<&str>) -> WorkspaceResponse {
        match self.create_in_settings_folder(name) {
            Ok(workspace) => WorkspaceResponse::success(workspace),
            Err(error) => WorkspaceResponse::failure("create workspace", &error),
        }
    }

    fn create_in_settings_folder(&mut self, name: Option<&str>) -> Result<Workspace> {
        self.require_file_access()?;
        let name = name.map(str::trim).filter(|value| !value.is_empty());
        let base_name = name
            .map(sanitize_file_stem)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKSPACE_BASE_NAME.to_string());
        let path = self.settings.new_workspace_path(&base_name)?;
        self.create_at(&path, name)
    }

    /// Asks for a save location, then creates an empty workspace file there.
    pub fn workspace_create_with_dialog(&mut self, name: Option<&str>) -> WorkspaceResponse {
        if let Err(error) = self.require_file_access() {
            return WorkspaceResponse::failure("create workspace", &error);
        }
        let default_name = name
            .map(sanitize_file_stem)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_WORKSPACE_BASE_NAME.to_string());
        let Some(path) = self.picker.pick_save_location(&default_name) else {
            return WorkspaceResponse::cancelled();
        };

        match self.create_at(&path, name) {
            Ok(workspace) => WorkspaceResponse::success(workspace),
            Err(error) => WorkspaceResponse::failure("create workspace", &error),
        }
    }

    /// Listed paths are refused before anything is written.
    fn create_at(&mut self, path: &Path, name: Option<&str>) -> Result<Workspace> {
        let file_path = path.display().to_string();
        if self.registry.contains_path(&file_path) {
            return Err(SharkError::Duplicate(file_path));
        }

        let file = WorkspaceFile::empty();
        workspace_file::save(self.fs.as_ref(), path, &file)?;
        let workspace = derivation::to_workspace(&file, &file_path, name);
        if !self.registry.add(workspace.clone())? {
            return Err(SharkError::Duplicate(file_path));
        }
        tracing::info!(path = %workspace.file_path, "created workspace");
        Ok(workspace)
    }

    /// Adopts an existing workspace file, asking for one when `path` is `None`.
    pub fn workspace_import(&mut self, path: Option<PathBuf>) -> WorkspaceResponse {
        if let Err(error) = self.require_file_access() {
            return WorkspaceResponse::failure("import workspace", &error);
        }
        let Some(path) = path.or_else(|| self.picker.pick_workspace_file()) else {
            return WorkspaceResponse::cancelled();
        };

        match self.import_path(&path) {
            Ok(workspace) => WorkspaceResponse::success(workspace),
            Err(error) => WorkspaceResponse::failure("import workspace", &error),
        }
    }

    fn import_path(&mut self, path: &Path) -> Result<Workspace> {
        let file = workspace_file::load(self.fs.as_ref(), path)?;
        let file_path = path.display().to_string();
        if self.registry.contains_path(&file_path) {
            return Err(SharkError::Duplicate(file_path));
        }

        let workspace = derivation::to_workspace(&file, &file_path, None);
        self.registry.add(workspace.clone())?;
        tracing::info!(path = %file_path, "imported workspace");
        Ok(workspace)
    }

    pub fn workspace_rename(&mut self, id: Uuid, name: &str) -> WorkspaceResponse {
        match self.rename(id, name) {
            Ok(workspace) => WorkspaceResponse::success(workspace),
            Err(error) => WorkspaceResponse::failure("rename workspace", &error),
        }
    }

    fn rename(&mut self, id: Uuid, name: &str) -> Result<Workspace> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SharkError::Invalid("workspace name cannot be empty".to_string()));
        }
        let mut workspace = self.workspace_by_id(id)?;
        workspace.name = trimmed.to_string();
        self.registry.update(workspace.clone())?;
        Ok(workspace)
    }

    /// Drops the workspace from the list. Its file is deleted only when it
    /// lives directly in the settings folder.
    pub fn workspace_remove(&mut self, id: Uuid) -> WorkspaceResponse {
        let workspace = match self.workspace_by_id(id) {
            Ok(workspace) => workspace,
            Err(error) => return WorkspaceResponse::failure("remove workspace", &error),
        };
        let managed = self.is_managed(&workspace);
        if managed {
            if let Err(error) = self.require_file_access() {
                return WorkspaceResponse::failure("remove workspace", &error);
            }
        }

        if let Err(error) = self.registry.remove(&workspace) {
            return WorkspaceResponse::failure("remove workspace", &error);
        }

        let mut file_deleted = false;
        if managed {
            match self.fs.remove_file(workspace.path()) {
                Ok(()) => file_deleted = true,
                Err(error) => tracing::warn!(
                    path = %workspace.file_path,
                    %error,
                    "could not delete workspace file"
                ),
            }
        }

        let mut response = WorkspaceResponse::success(workspace);
        response.file_deleted = Some(file_deleted);
        response
    }

    pub fn workspace_open(&self, id: Uuid) -> LaunchResponse {
        let result = self.workspace_by_id(id).and_then(|workspace| {
            if launcher::open_workspace(self.launcher.as_ref(), &workspace) {
                Ok(vec![workspace.file_path])
            } else {
                Err(SharkError::io(
                    workspace.path(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "workspace file is missing"),
                ))
            }
        });
        LaunchResponse::from_result("open workspace", result)
    }

    pub fn workspace_reveal(&self, id: Uuid) -> LaunchResponse {
        let result = self.workspace_by_id(id).map(|workspace| {
            self.launcher.reveal_in_file_manager(workspace.path());
            vec![workspace.file_path]
        });
        LaunchResponse::from_result("reveal workspace", result)
    }

    pub fn workspace_open_git_repositories(&self, id: Uuid) -> LaunchResponse {
        let result = self.require_file_access().and_then(|()| {
            let workspace = self.workspace_by_id(id)?;
            let folders = self.read_folders(&workspace)?;
            Ok(launcher::open_git_repositories(
                self.launcher.as_ref(),
                &folders,
            ))
        });
        LaunchResponse::from_result("open repositories", result)
    }

    /// Folders of the workspace's file. An unreadable file yields no folders.
    pub fn folders_load(&self, id: Uuid) -> FoldersResponse {
        let workspace = match self
            .require_file_access()
            .and_then(|()| self.workspace_by_id(id))
        {
            Ok(workspace) => workspace,
            Err(error) => return FoldersResponse::failure(id, "load folders", &error),
        };

        match self.read_folders(&workspace) {
            Ok(folders) => FoldersResponse::success(id, &folders),
            Err(error) => {
                tracing::warn!(path = %workspace.file_path, %error, "showing no folders");
                FoldersResponse::success(id, &[])
            }
        }
    }

    /// Appends folders not already listed (by path), asking for them when
    /// `paths` is `None`, and saves the file.
    pub fn folders_add(&mut self, id: Uuid, paths: Option<Vec<PathBuf>>) -> FoldersResponse {
        let workspace = match self
            .require_file_access()
            .and_then(|()| self.workspace_by_id(id))
        {
            Ok(workspace) => workspace,
            Err(error) => return FoldersResponse::failure(id, "add folders", &error),
        };

        let selected = paths.unwrap_or_else(|| self.picker.pick_folders());
        if selected.is_empty() {
            return FoldersResponse::cancelled(id);
        }

        let result = self.folders_or_empty(&workspace).and_then(|mut folders| {
            for path in selected {
                let path = path.display().to_string();
                if folders.iter().any(|folder| folder.path == path) {
                    continue;
                }
                folders.push(Folder::new(path, None));
            }
            self.write_folders(&workspace, &folders)?;
            Ok(folders)
        });

        match result {
            Ok(folders) => FoldersResponse::success(id, &folders),
            Err(error) => FoldersResponse::failure(id, "add folders", &error),
        }
    }

    pub fn folders_remove(&mut self, id: Uuid, path: &str) -> FoldersResponse {
        let result = self
            .require_file_access()
            .and_then(|()| self.workspace_by_id(id))
            .and_then(|workspace| {
                let mut folders = self.folders_or_empty(&workspace)?;
                folders.retain(|folder| folder.path != path);
                self.write_folders(&workspace, &folders)?;
                Ok(folders)
            });

        match result {
            Ok(folders) => FoldersResponse::success(id, &folders),
            Err(error) => FoldersResponse::failure(id, "remove folder", &error),
        }
    }

    /// Writes `folders` back as the workspace's complete folder list.
    pub fn folders_save(&mut self, id: Uuid, folders: &[Folder]) -> FoldersResponse {
        let result = self
            .require_file_access()
            .and_then(|()| self.workspace_by_id(id))
            .and_then(|workspace| self.write_folders(&workspace, folders));

        match result {
            Ok(()) => FoldersResponse::success(id, folders),
            Err(error) => FoldersResponse::failure(id, "save folders", &error),
        }
    }

    pub fn settings_get(&self) -> SettingsResponse {
        SettingsResponse {
            request_id: request_id(),
            ok: true,
            settings_folder: self.settings.settings_folder_path().display().to_string(),
            default_settings_folder: self.settings.default_folder().display().to_string(),
            error: None,
        }
    }

    /// Points the registry at a new settings folder and reconciles against it.
    pub fn settings_update_folder(&mut self, path: &str) -> SettingsResponse {
        let result = self
            .require_file_access()
            .and_then(|()| self.settings.set_settings_folder_path(path))
            .and_then(|_| self.settings.ensure_settings_folder());

        match result {
            Ok(folder) => {
                self.registry.reconcile(&folder);
                self.settings_get()
            }
            Err(error) => {
                let mut response = self.settings_get();
                response.ok = false;
                response.error = Some(user_message("update settings folder", &error));
                response
            }
        }
    }
}

/// Keeps a user-supplied name usable as a file stem.
fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '\0' => '-',
            other => other,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::tests::RecordingLauncher;
    use crate::store::MemoryStore;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct ScriptedPicker {
        workspace_file: Mutex<Option<PathBuf>>,
        save_location: Mutex<Option<PathBuf>>,
        folders: Mutex<Vec<PathBuf>>,
    }

    impl FilePicker for ScriptedPicker {
        fn pick_workspace_file(&self) -> Option<PathBuf> {
            self.workspace_file.lock().unwrap().take()
        }

        fn pick_save_location(&self, _default_name: &str) -> Option<PathBuf> {
            self.save_location
                .lock()
                .unwrap()
                .take()
                .map(|path| crate::file_dialog::enforce_workspace_extension(&path))
        }

        fn pick_folders(&self) -> Vec<PathBuf> {
            std::mem::take(&mut *self.folders.lock().unwrap())
        }
    }

    struct Harness {
        dir: TempDir,
        ctx: AppContext,
    }

    impl Harness {
        fn space(&self) -> PathBuf {
            self.dir.path().join("SharkSpace")
        }
    }

    fn harness_with(picker: ScriptedPicker, file_access: AuthorizationStatus) -> Harness {
        let dir = tempdir().unwrap();
        let gate = Arc::new(PermissionGate::new());
        gate.set_status(Capability::FileSystemAccess, file_access);
        let ctx = AppContext::init(AppServices {
            store: Arc::new(MemoryStore::new()),
            fs: Arc::new(LocalFs::new()),
            gate,
            picker: Box::new(picker),
            launcher: Box::new(RecordingLauncher::default()),
            default_settings_folder: Some(dir.path().join("SharkSpace")),
        });
        Harness { dir, ctx }
    }

    fn harness() -> Harness {
        harness_with(ScriptedPicker::default(), AuthorizationStatus::Authorized)
    }

    #[test]
    fn create_writes_empty_file_in_settings_folder() {
        let mut h = harness();
        let response = h.ctx.workspace_create(None);
        assert!(response.ok, "{:?}", response.error);

        let workspace = response.workspace.unwrap();
        assert_eq!(workspace.name, "workspace");
        let path = h.space().join("workspace.code-workspace");
        assert_eq!(workspace.file_path, path.display().to_string());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"folders\": []\n}\n"
        );

        let second = h.ctx.workspace_create(Some("Team/App")).workspace.unwrap();
        assert_eq!(second.name, "Team/App");
        assert!(second.file_path.ends_with("Team-App.code-workspace"));
        assert_eq!(h.ctx.workspace_list().workspaces.len(), 2);
    }

    #[test]
    fn create_with_dialog_enforces_extension() {
        let picker = ScriptedPicker::default();
        let dir = tempdir().unwrap();
        *picker.save_location.lock().unwrap() = Some(dir.path().join("picked.json"));
        let mut h = harness_with(picker, AuthorizationStatus::Authorized);

        let response = h.ctx.workspace_create_with_dialog(None);
        assert!(response.ok, "{:?}", response.error);
        assert!(dir.path().join("picked.code-workspace").is_file());

        let cancelled = h.ctx.workspace_create_with_dialog(None);
        assert_eq!(cancelled.cancelled, Some(true));
    }

    #[test]
    fn denied_access_aborts_without_state_change() {
        let mut h = harness_with(ScriptedPicker::default(), AuthorizationStatus::Denied);
        let response = h.ctx.workspace_create(None);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("file system access"));
        assert!(h.ctx.workspace_list().workspaces.is_empty());
        assert!(!h.space().exists());
    }

    #[test]
    fn import_rejects_duplicates_and_bad_files() {
        let mut h = harness();
        let outside = h.dir.path().join("outside.code-workspace");
        fs::write(&outside, r#"{"folders": [{"path": "/tmp/x"}]}"#).unwrap();

        let first = h.ctx.workspace_import(Some(outside.clone()));
        assert!(first.ok);
        assert_eq!(first.workspace.unwrap().name, "outside");

        let again = h.ctx.workspace_import(Some(outside));
        assert!(!again.ok);
        assert!(again.error.unwrap().contains("already exists"));

        let broken = h.dir.path().join("broken.code-workspace");
        fs::write(&broken, "{").unwrap();
        let response = h.ctx.workspace_import(Some(broken));
        assert!(!response.ok);
        assert_eq!(h.ctx.workspace_list().workspaces.len(), 1);
    }

    #[test]
    fn import_uses_picker_and_reports_cancel() {
        let picker = ScriptedPicker::default();
        let dir = tempdir().unwrap();
        let file = dir.path().join("picked.code-workspace");
        fs::write(&file, r#"{"folders": []}"#).unwrap();
        *picker.workspace_file.lock().unwrap() = Some(file);
        let mut h = harness_with(picker, AuthorizationStatus::Authorized);

        assert!(h.ctx.workspace_import(None).ok);
        assert_eq!(h.ctx.workspace_import(None).cancelled, Some(true));
    }

    #[test]
    fn removing_outside_workspace_keeps_its_file() {
        let mut h = harness();
        let outside = h.dir.path().join("outside.code-workspace");
        fs::write(&outside, r#"{"folders": []}"#).unwrap();
        let id = h.ctx.workspace_import(Some(outside.clone())).workspace.unwrap().id;

        let response = h.ctx.workspace_remove(id);
        assert!(response.ok);
        assert_eq!(response.file_deleted, Some(false));
        assert!(outside.is_file());
        assert!(h.ctx.workspace_list().workspaces.is_empty());
    }

    #[test]
    fn removing_managed_workspace_deletes_its_file() {
        let mut h = harness();
        let workspace = h.ctx.workspace_create(None).workspace.unwrap();
        assert!(workspace.path().is_file());

        let response = h.ctx.workspace_remove(workspace.id);
        assert!(response.ok);
        assert_eq!(response.file_deleted, Some(true));
        assert!(!workspace.path().exists());
    }

    #[test]
    fn rename_updates_in_place() {
        let mut h = harness();
        let a = h.ctx.workspace_create(Some("a")).workspace.unwrap();
        let b = h.ctx.workspace_create(Some("b")).workspace.unwrap();

        let renamed = h.ctx.workspace_rename(a.id, "  Alpha  ");
        assert!(renamed.ok);
        let names = h
            .ctx
            .workspace_list()
            .workspaces
            .into_iter()
            .map(|workspace| workspace.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alpha".to_string(), b.name]);

        assert!(!h.ctx.workspace_rename(a.id, "   ").ok);
        assert!(!h.ctx.workspace_rename(Uuid::new_v4(), "x").ok);
    }

    #[test]
    fn folders_add_skips_duplicates_and_persists() {
        let mut h = harness();
        let id = h.ctx.workspace_create(None).workspace.unwrap().id;
        let repo = h.dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        let plain = h.dir.path().join("plain");

        let response = h
            .ctx
            .folders_add(id, Some(vec![repo.clone(), plain.clone(), repo.clone()]));
        assert!(response.ok, "{:?}", response.error);
        assert_eq!(response.folders.len(), 2);
        assert!(response.folders[0].is_git_repository);
        assert!(!response.folders[1].exists_on_disk);

        let loaded = h.ctx.folders_load(id);
        assert_eq!(loaded.folders, response.folders);

        fs::create_dir_all(&plain).unwrap();
        assert!(h.ctx.folders_load(id).folders[1].exists_on_disk);

        let removed = h.ctx.folders_remove(id, &repo.display().to_string());
        assert_eq!(removed.folders.len(), 1);
        assert_eq!(h.ctx.folders_load(id).folders.len(), 1);
    }

    #[test]
    fn folders_add_with_empty_picker_is_cancelled() {
        let mut h = harness();
        let id = h.ctx.workspace_create(None).workspace.unwrap().id;
        assert_eq!(h.ctx.folders_add(id, None).cancelled, Some(true));
    }

    #[test]
    fn folders_save_keeps_settings_of_the_file() {
        let mut h = harness();
        let path = h.dir.path().join("with-settings.code-workspace");
        fs::write(
            &path,
            r#"{"folders": [{"path": "/old"}], "settings": {"editor.tabSize": 2}}"#,
        )
        .unwrap();
        let id = h.ctx.workspace_import(Some(path.clone())).workspace.unwrap().id;

        let folders = vec![Folder::new("/new", Some("New".to_string()))];
        assert!(h.ctx.folders_save(id, &folders).ok);

        let saved = fs::read_to_string(&path).unwrap();
        let file = workspace_file::parse(saved.as_bytes()).unwrap();
        assert_eq!(file.folder_paths(), vec!["/new"]);
        assert_eq!(file.folders[0].name.as_deref(), Some("New"));
        assert!(saved.contains("\"editor.tabSize\": 2"));
    }

    #[test]
    fn unreadable_workspace_file_shows_no_folders() {
        let mut h = harness();
        let path = h.dir.path().join("gone.code-workspace");
        fs::write(&path, r#"{"folders": [{"path": "/a"}]}"#).unwrap();
        let id = h.ctx.workspace_import(Some(path.clone())).workspace.unwrap().id;
        fs::remove_file(&path).unwrap();

        let response = h.ctx.folders_load(id);
        assert!(response.ok);
        assert!(response.folders.is_empty());
    }

    #[test]
    fn refresh_picks_up_files_added_on_disk() {
        let mut h = harness();
        h.ctx.workspace_create(None);
        fs::write(
            h.space().join("dropped.code-workspace"),
            r#"{"folders": []}"#,
        )
        .unwrap();

        let response = h.ctx.workspace_refresh();
        assert!(response.ok);
        assert_eq!(response.workspaces.len(), 2);
        assert_eq!(h.ctx.workspace_refresh().workspaces, response.workspaces);
    }

    #[test]
    fn open_git_repositories_launches_git_gui() {
        let mut h = harness();
        let id = h.ctx.workspace_create(None).workspace.unwrap().id;
        let repo = h.dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();
        h.ctx.folders_add(id, Some(vec![repo.clone()]));

        let response = h.ctx.workspace_open_git_repositories(id);
        assert!(response.ok);
        assert_eq!(response.launched, vec![repo.display().to_string()]);
    }

    #[test]
    fn open_reports_missing_file() {
        let mut h = harness();
        let workspace = h.ctx.workspace_create(None).workspace.unwrap();
        assert!(h.ctx.workspace_open(workspace.id).ok);

        fs::remove_file(workspace.path()).unwrap();
        assert!(!h.ctx.workspace_open(workspace.id).ok);
    }

    #[test]
    fn updating_settings_folder_reconciles_against_it() {
        let mut h = harness();
        let other = h.dir.path().join("Other");
        fs::create_dir_all(&other).unwrap();
        fs::write(other.join("found.code-workspace"), r#"{"folders": []}"#).unwrap();

        let response = h.ctx.settings_update_folder(&other.display().to_string());
        assert!(response.ok, "{:?}", response.error);
        assert_eq!(response.settings_folder, other.display().to_string());
        assert!(h
            .ctx
            .workspace_list()
            .workspaces
            .iter()
            .any(|workspace| workspace.name == "found"));
    }

    #[test]
    fn bootstrap_merges_settings_folder_only_when_authorized() {
        let h = harness_with(ScriptedPicker::default(), AuthorizationStatus::NotDetermined);
        let mut ctx = h.ctx;
        fs::create_dir_all(h.dir.path().join("SharkSpace")).unwrap();
        fs::write(
            h.dir.path().join("SharkSpace").join("late.code-workspace"),
            r#"{"folders": []}"#,
        )
        .unwrap();

        ctx.bootstrap();
        assert!(ctx.workspace_list().workspaces.is_empty());

        ctx.gate().resolve(Capability::FileSystemAccess, true);
        ctx.bootstrap();
        assert_eq!(ctx.workspace_list().workspaces[0].name, "late");
    }

    #[test]
    fn init_scans_settings_folder_only_when_authorized() {
        let dir = tempdir().unwrap();
        let space = dir.path().join("SharkSpace");
        fs::create_dir_all(&space).unwrap();
        fs::write(space.join("early.code-workspace"), r#"{"folders": []}"#).unwrap();

        let build = |status| {
            let gate = Arc::new(PermissionGate::new());
            gate.set_status(Capability::FileSystemAccess, status);
            AppContext::init(AppServices {
                store: Arc::new(MemoryStore::new()),
                fs: Arc::new(LocalFs::new()),
                gate,
                picker: Box::new(ScriptedPicker::default()),
                launcher: Box::new(RecordingLauncher::default()),
                default_settings_folder: Some(space.clone()),
            })
        };

        assert!(build(AuthorizationStatus::Denied)
            .workspace_list()
            .workspaces
            .is_empty());
        let names = build(AuthorizationStatus::Authorized)
            .workspace_list()
            .workspaces
            .into_iter()
            .map(|workspace| workspace.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["early".to_string()]);
    }

    #[test]
    fn create_with_dialog_refuses_listed_path_without_touching_it() {
        let picker = ScriptedPicker::default();
        let dir = tempdir().unwrap();
        let team = dir.path().join("team.code-workspace");
        fs::write(&team, r#"{"folders": [{"path": "/src/app"}]}"#).unwrap();
        *picker.save_location.lock().unwrap() = Some(team.clone());
        let mut h = harness_with(picker, AuthorizationStatus::Authorized);
        assert!(h.ctx.workspace_import(Some(team.clone())).ok);

        let response = h.ctx.workspace_create_with_dialog(None);
        assert!(!response.ok);
        assert!(response.error.unwrap().contains("already exists"));
        let file = workspace_file::parse(&fs::read(&team).unwrap()).unwrap();
        assert_eq!(file.folder_paths(), vec!["/src/app"]);
        assert_eq!(h.ctx.workspace_list().workspaces.len(), 1);
    }

    #[test]
    fn invalid_input_is_not_reported_as_a_store_error() {
        let mut h = harness();
        let id = h.ctx.workspace_create(None).workspace.unwrap().id;
        let message = h.ctx.workspace_rename(id, "  ").error.unwrap();
        assert!(message.contains("Invalid input"), "{message}");
        assert!(!message.contains("Preference store"));

        let message = h.ctx.settings_update_folder("relative/dir").error.unwrap();
        assert!(message.contains("absolute path"), "{message}");
        assert!(!message.contains("Preference store"));
    }

    #[test]
    fn sanitizes_file_stems() {
        assert_eq!(sanitize_file_stem(" a/b:c "), "a-b-c");
        assert_eq!(sanitize_file_stem(".."), "");
    }
}
