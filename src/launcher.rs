use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::constants::{EDITOR_APPLICATION_ID, GIT_GUI_EXECUTABLE, KNOWN_EXECUTABLE_DIRS};
use crate::models::{Folder, Workspace};

/// Fire-and-forget launching of external tools. Failures are logged, never
/// returned.
pub trait ProcessLauncher: Send + Sync {
    /// Opens `path` with the application identified by `application_id`,
    /// falling back to the OS default handler.
    fn open_with_application(&self, path: &Path, application_id: &str);
    /// Runs `executable` with `path` as its only argument.
    fn launch_executable(&self, executable: &str, path: &Path);
    fn reveal_in_file_manager(&self, path: &Path);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLauncher;

impl ProcessLauncher for NativeLauncher {
    fn open_with_application(&self, path: &Path, application_id: &str) {
        match open_with_application_command(path, application_id) {
            Ok(()) => {}
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    application_id,
                    %error,
                    "failed to open with application; using default handler"
                );
                if let Err(error) = open_with_default_handler(path) {
                    tracing::warn!(path = %path.display(), %error, "failed to open path");
                }
            }
        }
    }

    fn launch_executable(&self, executable: &str, path: &Path) {
        let (program, args) = resolve_executable_command(executable, path, |candidate| {
            candidate.is_file()
        });
        if let Err(error) = spawn_detached(&program, &args) {
            tracing::warn!(
                program = %program.display(),
                path = %path.display(),
                %error,
                "failed to launch executable"
            );
        }
    }

    fn reveal_in_file_manager(&self, path: &Path) {
        if let Err(error) = reveal_command(path) {
            tracing::warn!(path = %path.display(), %error, "failed to reveal path");
        }
    }
}

/// Opens a workspace file in the editor. Missing files are logged and skipped.
pub fn open_workspace(launcher: &dyn ProcessLauncher, workspace: &Workspace) -> bool {
    let path = workspace.path();
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "workspace file does not exist");
        return false;
    }
    launcher.open_with_application(path, EDITOR_APPLICATION_ID);
    true
}

/// Opens every folder that is a git repository in the Git GUI. Returns the
/// paths that were handed to it.
pub fn open_git_repositories(launcher: &dyn ProcessLauncher, folders: &[Folder]) -> Vec<String> {
    let mut opened = Vec::new();
    for folder in folders.iter().filter(|folder| folder.is_git_repository()) {
        launcher.launch_executable(GIT_GUI_EXECUTABLE, Path::new(&folder.path));
        opened.push(folder.path.clone());
    }
    opened
}

/// Picks the first known install location of `executable`, else runs it
/// through `/usr/bin/env` so PATH lookup applies.
pub(crate) fn resolve_executable_command(
    executable: &str,
    path: &Path,
    is_file: impl Fn(&Path) -> bool,
) -> (PathBuf, Vec<String>) {
    let target = path.display().to_string();
    for dir in KNOWN_EXECUTABLE_DIRS {
        let candidate = Path::new(dir).join(executable);
        if is_file(&candidate) {
            return (candidate, vec![target]);
        }
    }

    if cfg!(unix) {
        (
            PathBuf::from("/usr/bin/env"),
            vec![executable.to_string(), target],
        )
    } else {
        (PathBuf::from(executable), vec![target])
    }
}

fn spawn_detached(program: &Path, args: &[String]) -> std::io::Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

fn open_with_application_command(path: &Path, application_id: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        let status = Command::new("open")
            .arg("-b")
            .arg(application_id)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            return Ok(());
        }
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("application {application_id} is not available"),
        ));
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = path;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("opening with application {application_id} is unsupported on this platform"),
        ))
    }
}

fn open_with_default_handler(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        return spawn_detached(Path::new("open"), &[path.display().to_string()]);
    }

    #[cfg(target_os = "windows")]
    {
        return spawn_detached(
            Path::new("cmd"),
            &[
                "/C".to_string(),
                "start".to_string(),
                String::new(),
                path.display().to_string(),
            ],
        );
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        spawn_detached(Path::new("xdg-open"), &[path.display().to_string()])
    }
}

fn reveal_command(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        return spawn_detached(
            Path::new("open"),
            &["-R".to_string(), path.display().to_string()],
        );
    }

    #[cfg(not(target_os = "macos"))]
    {
        let target = if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent().unwrap_or(path).to_path_buf()
        };
        open_with_default_handler(&target)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records launches instead of spawning processes.
    #[derive(Default)]
    pub(crate) struct RecordingLauncher {
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl ProcessLauncher for RecordingLauncher {
        fn open_with_application(&self, path: &Path, application_id: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("open {application_id} {}", path.display()));
        }

        fn launch_executable(&self, executable: &str, path: &Path) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("exec {executable} {}", path.display()));
        }

        fn reveal_in_file_manager(&self, path: &Path) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("reveal {}", path.display()));
        }
    }

    #[test]
    fn prefers_known_install_locations() {
        let (program, args) = resolve_executable_command("fork", Path::new("/repo"), |candidate| {
            candidate == Path::new("/opt/homebrew/bin/fork")
        });
        assert_eq!(program, PathBuf::from("/opt/homebrew/bin/fork"));
        assert_eq!(args, vec!["/repo".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn falls_back_to_path_lookup() {
        let (program, args) = resolve_executable_command("fork", Path::new("/repo"), |_| false);
        assert_eq!(program, PathBuf::from("/usr/bin/env"));
        assert_eq!(args, vec!["fork".to_string(), "/repo".to_string()]);
    }

    #[test]
    fn opens_only_git_repositories() {
        let dir = tempdir().unwrap();
        let repo = dir.path().join("repo");
        let plain = dir.path().join("plain");
        fs::create_dir_all(repo.join(".git")).unwrap();
        fs::create_dir_all(&plain).unwrap();

        let folders = vec![
            Folder::new(repo.display().to_string(), None),
            Folder::new(plain.display().to_string(), None),
            Folder::new(dir.path().join("missing").display().to_string(), None),
        ];
        let launcher = RecordingLauncher::default();
        let opened = open_git_repositories(&launcher, &folders);

        assert_eq!(opened, vec![repo.display().to_string()]);
        assert_eq!(
            launcher.calls.lock().unwrap().as_slice(),
            &[format!("exec fork {}", repo.display())]
        );
    }

    #[test]
    fn missing_workspace_file_is_not_opened() {
        let dir = tempdir().unwrap();
        let launcher = RecordingLauncher::default();
        let missing = Workspace::new("x", dir.path().join("x.code-workspace").display().to_string());
        assert!(!open_workspace(&launcher, &missing));
        assert!(launcher.calls.lock().unwrap().is_empty());

        fs::write(dir.path().join("x.code-workspace"), "{\"folders\": []}").unwrap();
        assert!(open_workspace(&launcher, &missing));
        assert_eq!(launcher.calls.lock().unwrap().len(), 1);
    }
}
