pub mod authorization;
pub mod cli;
pub mod commands;
mod constants;
pub mod derivation;
pub mod error;
pub mod file_dialog;
pub mod fs_access;
pub mod launcher;
pub mod logging;
pub mod models;
pub mod paths;
pub mod registry;
pub mod setting_value;
pub mod settings;
pub mod store;
pub mod workspace_file;

use clap::Parser;

pub use authorization::{AuthorizationStatus, Capability, PermissionGate};
pub use commands::{AppContext, AppServices};
pub use constants::WORKSPACE_FILE_EXTENSION;
pub use error::{Result, SharkError};
pub use models::{Folder, Workspace};
pub use setting_value::SettingValue;
pub use workspace_file::{FolderEntry, WorkspaceFile};

pub fn run() {
    let cli = cli::Cli::parse();
    let _logging = logging::init();

    let mut ctx = AppContext::init(AppServices::native());
    ctx.bootstrap();
    tracing::debug!(command = ?cli.command, "dispatching command");
    println!("{}", cli::execute(&mut ctx, cli.command));
}
