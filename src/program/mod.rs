//! Device programming through `dfu-util`.
//!
//! The board's bootloader enumerates as `1d50:614b` and accepts the bitstream
//! on alternate setting 0.

use log::{info, warn};
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::BoardError;
use crate::products::BuildProducts;
use crate::trellis;

pub const DFU_UTIL: &str = "dfu-util";
pub const USB_DEVICE_ID: &str = "1d50:614b";
pub const DFU_ALT_SETTING: &str = "0";

/// Flashing tool named by `DFU_UTIL`, or `dfu-util`.
pub fn resolve_dfu_util() -> PathBuf {
    resolve_dfu_util_with(|var| std::env::var_os(var))
}

pub fn resolve_dfu_util_with<F>(lookup: F) -> PathBuf
where
    F: FnOnce(&str) -> Option<OsString>,
{
    trellis::resolve_tool(DFU_UTIL, lookup)
}

pub fn dfu_args(bitstream: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-d", USB_DEVICE_ID, "-a", DFU_ALT_SETTING, "-D"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(bitstream.as_os_str().to_owned());
    args
}

/// Runs an external tool to completion.
pub trait CommandRunner {
    fn run(&self, tool: &Path, args: &[OsString]) -> Result<(), BoardError>;
}

/// Spawns the tool as a child process and waits for it, without a timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, tool: &Path, args: &[OsString]) -> Result<(), BoardError> {
        spawn(tool, args, None)
    }
}

pub(crate) fn spawn<S: AsRef<OsStr>>(
    tool: &Path,
    args: &[S],
    cwd: Option<&Path>,
) -> Result<(), BoardError> {
    let mut command = Command::new(tool);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let status = command.status().map_err(|e| match e.kind() {
        ErrorKind::NotFound => BoardError::ToolNotFound(tool.to_path_buf()),
        _ => BoardError::Io(e),
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(BoardError::ToolFailed {
            tool: tool.to_path_buf(),
            code: status.code(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DfuProgrammer<R = SystemRunner> {
    tool: PathBuf,
    runner: R,
}

impl DfuProgrammer<SystemRunner> {
    pub fn from_env() -> Self {
        Self::with_tool(resolve_dfu_util())
    }

    pub fn with_tool(tool: impl Into<PathBuf>) -> Self {
        Self::with_runner(tool, SystemRunner)
    }
}

impl<R: CommandRunner> DfuProgrammer<R> {
    pub fn with_runner(tool: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            tool: tool.into(),
            runner,
        }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Flashes `<name>.bit` from `products`. The extracted copy is removed
    /// whether or not the tool succeeds.
    pub fn program(&self, products: &dyn BuildProducts, name: &str) -> Result<(), BoardError> {
        let file_name = format!("{name}.bit");
        let bitstream = products.extract(&file_name)?;
        info!(
            "programming {file_name} with {} ({})",
            self.tool.display(),
            USB_DEVICE_ID
        );
        let result = self.runner.run(&self.tool, &dfu_args(bitstream.path()));
        if let Err(e) = bitstream.close() {
            warn!("failed to remove extracted {file_name}: {e}");
        }
        result
    }
}
