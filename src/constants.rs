use std::time::Duration;

pub(crate) const APP_DIR_NAME: &str = "shark";
pub(crate) const DATA_DIR_ENV: &str = "SHARK_DATA_DIR";
pub(crate) const PREFERENCES_FILE: &str = "preferences.json";
pub(crate) const LOG_DIR_NAME: &str = "logs";
pub(crate) const LOG_FILE_NAME: &str = "shark.log";

pub(crate) const WORKSPACES_KEY: &str = "savedWorkspaces";
pub(crate) const SETTINGS_FOLDER_PATH_KEY: &str = "settingsFolderPath";
pub(crate) const DEFAULT_SETTINGS_FOLDER_NAME: &str = "SharkSpace";
pub(crate) const DEFAULT_WORKSPACE_BASE_NAME: &str = "workspace";

pub const WORKSPACE_FILE_EXTENSION: &str = "code-workspace";

pub(crate) const EDITOR_APPLICATION_ID: &str = "com.todesktop.230313mzl4w4u92";
pub(crate) const GIT_GUI_EXECUTABLE: &str = "fork";
pub(crate) const KNOWN_EXECUTABLE_DIRS: [&str; 2] = ["/usr/local/bin", "/opt/homebrew/bin"];

pub(crate) const AUTHORIZATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub(crate) const AUTHORIZATION_MAX_POLLS: u32 = 300;
pub(crate) const FULL_DISK_PROBE_PATHS: [&str; 3] = ["/Library", "/System", "/Users"];
pub(crate) const FILE_ACCESS_PROBE_FILE: &str = ".shark_test";
