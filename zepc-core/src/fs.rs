//! File-system access used by the compiler driver.
//!
//! Everything the driver touches on disk goes through [`FileSystem`] so the
//! cache logic can be exercised against an in-memory implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::CompilerOptions;
use crate::error::CoreError;

/// Which configured root a relative path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Input,
    Output,
    System,
}

/// Exit status of an external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        }
    }
}

pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;

    /// `None` when the file does not exist.
    fn modification_time(&self, path: &Path) -> Option<SystemTime>;

    fn read(&self, path: &Path) -> Result<String, CoreError>;

    /// Writes `contents`, creating missing parent directories.
    fn write(&mut self, path: &Path, contents: &str) -> Result<(), CoreError>;

    /// Deletes `path`. A missing file is not an error.
    fn remove(&mut self, path: &Path) -> Result<(), CoreError>;

    fn realpath(&self, path: &Path, root: RootKind) -> PathBuf;

    /// Visits every file under the input root in a stable order until the
    /// visitor returns `false`.
    fn enumerate_files(&self, visitor: &mut dyn FnMut(&Path) -> bool) -> Result<(), CoreError>;

    /// Runs `command` with `args`, sending its standard output to
    /// `stdout_target`. The target is written even when the command fails.
    fn system(
        &mut self,
        command: &Path,
        args: &[&Path],
        stdout_target: &Path,
    ) -> Result<CommandStatus, CoreError>;
}

/// The real disk.
#[derive(Debug, Clone)]
pub struct HardDisk {
    input_root: PathBuf,
    output_root: PathBuf,
    system_root: PathBuf,
}

impl HardDisk {
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        system_root: impl Into<PathBuf>,
    ) -> Self {
        HardDisk {
            input_root: input_root.into(),
            output_root: output_root.into(),
            system_root: system_root.into(),
        }
    }

    pub fn from_options(options: &CompilerOptions) -> Self {
        Self::new(
            &options.input_root,
            &options.output_root,
            &options.system_root,
        )
    }

    fn root(&self, kind: RootKind) -> &Path {
        match kind {
            RootKind::Input => &self.input_root,
            RootKind::Output => &self.output_root,
            RootKind::System => &self.system_root,
        }
    }
}

impl FileSystem for HardDisk {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn modification_time(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    fn read(&self, path: &Path) -> Result<String, CoreError> {
        Ok(fs::read_to_string(path)?)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<(), CoreError> {
        match fs::remove_file(path) {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }

    fn realpath(&self, path: &Path, root: RootKind) -> PathBuf {
        let joined = self.root(root).join(path);
        fs::canonicalize(&joined).unwrap_or_else(|_| absolute(&joined))
    }

    fn enumerate_files(&self, visitor: &mut dyn FnMut(&Path) -> bool) -> Result<(), CoreError> {
        let walker = WalkDir::new(&self.input_root).sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|err| CoreError::Io(err.into()))?;
            if entry.file_type().is_file() && !visitor(entry.path()) {
                break;
            }
        }
        Ok(())
    }

    fn system(
        &mut self,
        command: &Path,
        args: &[&Path],
        stdout_target: &Path,
    ) -> Result<CommandStatus, CoreError> {
        if let Some(parent) = stdout_target.parent() {
            fs::create_dir_all(parent)?;
        }
        let target = fs::File::create(stdout_target)?;
        let status = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(target)
            .status()?;
        Ok(CommandStatus {
            code: status.code(),
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
