//! Toolchain configuration file.
//!
//! ```toml
//! [prepare]
//! ecppack_opts = "--compress --freq 62.0"
//! nextpnr_opts = "--timing-allow-fail"
//!
//! [program]
//! dfu_util = "/opt/dfu-util/bin/dfu-util"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::BoardError;
use crate::program::{self, DfuProgrammer};
use crate::trellis::PrepareOverrides;

#[derive(Debug, Default, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub prepare: PrepareOverrides,
    #[serde(default)]
    pub program: ProgramSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgramSection {
    #[serde(default)]
    pub dfu_util: Option<PathBuf>,
}

impl ToolchainConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn from_file(path: &Path) -> Result<Self, BoardError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))
    }

    /// Flashing tool: the config file wins, then `DFU_UTIL`, then `dfu-util`.
    pub fn dfu_util(&self) -> PathBuf {
        self.program
            .dfu_util
            .clone()
            .unwrap_or_else(program::resolve_dfu_util)
    }

    pub fn programmer(&self) -> DfuProgrammer {
        DfuProgrammer::with_tool(self.dfu_util())
    }
}
