use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::commands::AppContext;
use crate::models::Folder;
use crate::registry::WorkspaceRegistry;

#[derive(Debug, Parser)]
#[command(name = "shark", version, about = "Manage .code-workspace files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the workspace list.
    List,
    /// Merge the settings folder's contents into the list.
    Refresh,
    /// Create an empty workspace file in the settings folder.
    New {
        name: Option<String>,
        /// Ask for the save location instead.
        #[arg(long)]
        pick: bool,
    },
    /// Add an existing workspace file to the list.
    Import { path: Option<PathBuf> },
    Rename { workspace: String, name: String },
    /// Drop a workspace; files in the settings folder are deleted too.
    Remove { workspace: String },
    /// Open a workspace in the editor.
    Open { workspace: String },
    Reveal { workspace: String },
    /// Open the workspace's git repositories in the Git GUI.
    Fork { workspace: String },
    Folders { workspace: String },
    AddFolders {
        workspace: String,
        paths: Vec<PathBuf>,
    },
    RemoveFolder { workspace: String, path: String },
    /// Replace the folder list. Each entry is `path` or `path=display name`.
    SetFolders {
        workspace: String,
        folders: Vec<String>,
    },
    Settings,
    /// Change the settings folder. An empty value restores the default.
    SetFolder { path: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnknownWorkspaceResponse {
    request_id: String,
    ok: bool,
    error: String,
}

/// Accepts a workspace id, an exact name or a file path.
pub fn resolve_workspace(registry: &WorkspaceRegistry, selector: &str) -> Option<Uuid> {
    if let Ok(id) = Uuid::parse_str(selector) {
        if registry.find(id).is_some() {
            return Some(id);
        }
    }
    let workspaces = registry.workspaces();
    workspaces
        .iter()
        .find(|workspace| workspace.file_path == selector)
        .or_else(|| workspaces.iter().find(|workspace| workspace.name == selector))
        .map(|workspace| workspace.id)
}

/// The display name follows the last `=`, so paths may contain `=` too.
fn parse_folder_arg(value: &str) -> Folder {
    match value.rsplit_once('=') {
        Some((path, name)) if !name.trim().is_empty() => {
            Folder::new(path, Some(name.trim().to_string()))
        }
        Some((path, _)) => Folder::new(path, None),
        None => Folder::new(value, None),
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("{{\"ok\":false,\"error\":\"{error}\"}}"))
}

fn unknown_workspace(selector: &str) -> String {
    to_json(&UnknownWorkspaceResponse {
        request_id: Uuid::new_v4().to_string(),
        ok: false,
        error: format!("No workspace matches \"{selector}\"."),
    })
}

/// Runs one command against `ctx` and returns the JSON response text.
pub fn execute(ctx: &mut AppContext, command: CliCommand) -> String {
    macro_rules! with_workspace {
        ($selector:expr, |$id:ident| $body:expr) => {
            match resolve_workspace(ctx.registry(), &$selector) {
                Some($id) => to_json(&$body),
                None => unknown_workspace(&$selector),
            }
        };
    }

    match command {
        CliCommand::List => to_json(&ctx.workspace_list()),
        CliCommand::Refresh => to_json(&ctx.workspace_refresh()),
        CliCommand::New { name, pick } => {
            if pick {
                to_json(&ctx.workspace_create_with_dialog(name.as_deref()))
            } else {
                to_json(&ctx.workspace_create(name.as_deref()))
            }
        }
        CliCommand::Import { path } => to_json(&ctx.workspace_import(path)),
        CliCommand::Rename { workspace, name } => {
            with_workspace!(workspace, |id| ctx.workspace_rename(id, &name))
        }
        CliCommand::Remove { workspace } => {
            with_workspace!(workspace, |id| ctx.workspace_remove(id))
        }
        CliCommand::Open { workspace } => with_workspace!(workspace, |id| ctx.workspace_open(id)),
        CliCommand::Reveal { workspace } => {
            with_workspace!(workspace, |id| ctx.workspace_reveal(id))
        }
        CliCommand::Fork { workspace } => {
            with_workspace!(workspace, |id| ctx.workspace_open_git_repositories(id))
        }
        CliCommand::Folders { workspace } => {
            with_workspace!(workspace, |id| ctx.folders_load(id))
        }
        CliCommand::AddFolders { workspace, paths } => {
            let paths = if paths.is_empty() { None } else { Some(paths) };
            with_workspace!(workspace, |id| ctx.folders_add(id, paths))
        }
        CliCommand::RemoveFolder { workspace, path } => {
            with_workspace!(workspace, |id| ctx.folders_remove(id, &path))
        }
        CliCommand::SetFolders { workspace, folders } => {
            let folders = folders
                .iter()
                .map(|value| parse_folder_arg(value))
                .collect::<Vec<_>>();
            with_workspace!(workspace, |id| ctx.folders_save(id, &folders))
        }
        CliCommand::Settings => to_json(&ctx.settings_get()),
        CliCommand::SetFolder { path } => to_json(&ctx.settings_update_folder(&path)),
    }
}
