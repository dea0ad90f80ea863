use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, SharkError};
use crate::fs_access::WorkspaceFs;
use crate::setting_value::SettingValue;

/// One entry of a workspace file's `folders` array.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FolderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path: String,
}

impl FolderEntry {
    pub fn new(path: impl Into<String>, name: Option<String>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }
}

/// The parsed contents of a `.code-workspace` file.
///
/// Top-level keys other than `folders` and `settings` are kept verbatim in
/// `other` so a save never drops them. Only `settings` values are limited to
/// [`SettingValue`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct WorkspaceFile {
    pub folders: Vec<FolderEntry>,
    #[serde(default)]
    pub settings: Option<BTreeMap<String, SettingValue>>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum TopLevelEntry<'a> {
    Folders(&'a [FolderEntry]),
    Settings(&'a BTreeMap<String, SettingValue>),
    Other(&'a Value),
}

impl Serialize for WorkspaceFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut entries = BTreeMap::<&str, TopLevelEntry<'_>>::new();
        for (key, value) in &self.other {
            entries.insert(key.as_str(), TopLevelEntry::Other(value));
        }
        entries.insert("folders", TopLevelEntry::Folders(&self.folders));
        if let Some(settings) = &self.settings {
            entries.insert("settings", TopLevelEntry::Settings(settings));
        }
        entries.serialize(serializer)
    }
}

impl WorkspaceFile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn folder_paths(&self) -> Vec<&str> {
        self.folders.iter().map(|entry| entry.path.as_str()).collect()
    }

    pub fn add_folder(&mut self, path: impl Into<String>, name: Option<String>) {
        self.folders.push(FolderEntry::new(path, name));
    }

    pub fn remove_folder(&mut self, path: &str) {
        self.folders.retain(|entry| entry.path != path);
    }
}

pub fn parse(bytes: &[u8]) -> Result<WorkspaceFile> {
    serde_json::from_slice::<WorkspaceFile>(bytes).map_err(SharkError::Decode)
}

/// Pretty JSON with sorted keys and a trailing newline, so identical content
/// always produces identical bytes.
pub fn serialize(file: &WorkspaceFile) -> Result<Vec<u8>> {
    let mut body =
        serde_json::to_vec_pretty(file).map_err(|error| SharkError::Encode(error.to_string()))?;
    body.push(b'\n');
    Ok(body)
}

pub fn load(fs: &dyn WorkspaceFs, path: &Path) -> Result<WorkspaceFile> {
    let raw = fs.read(path).map_err(|error| SharkError::io(path, error))?;
    parse(&raw)
}

pub fn save(fs: &dyn WorkspaceFs, path: &Path, file: &WorkspaceFile) -> Result<()> {
    let body = serialize(file)?;
    fs.write(path, &body)
        .map_err(|error| SharkError::io(path, error))
}
