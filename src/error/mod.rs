use std::path::PathBuf;

use thiserror::Error;

/// Key of a resource declaration: `(name, number)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub name: String,
    pub number: u32,
}

impl ResourceKey {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.number)
    }
}

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("unsupported part: {device} / {package} / speed {speed}")]
    UnsupportedPart {
        device: String,
        package: String,
        speed: String,
    },
    #[error("duplicate resource declaration {0}")]
    DuplicateResource(ResourceKey),
    #[error("unknown resource {0}")]
    UnknownResource(ResourceKey),
    #[error("pad {pad} claimed by both {first} and {second}")]
    PadConflict {
        pad: String,
        first: String,
        second: String,
    },
    #[error("resource {resource} cannot share pads of {target}: {reason}")]
    InvalidShare {
        resource: ResourceKey,
        target: ResourceKey,
        reason: String,
    },
    #[error("connector {connector}: {reason}")]
    InvalidConnector { connector: String, reason: String },
    #[error("default clock {0:?} is not a clocked resource")]
    MissingDefaultClock(String),
    #[error("build product not found: {0}")]
    ArtifactMissing(String),
    #[error("executable not found: {}", .0.display())]
    ToolNotFound(PathBuf),
    #[error("{} exited with {}", .tool.display(), exit_description(.code))]
    ToolFailed { tool: PathBuf, code: Option<i32> },
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    }
}

impl BoardError {
    /// Exit code of a failed tool, when the failure was a non-zero exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BoardError::ToolFailed { code, .. } => *code,
            _ => None,
        }
    }
}
