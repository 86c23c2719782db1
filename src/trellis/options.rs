use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option keys the Trellis flow reads. Anything else is passed through.
pub const RECOGNIZED_OPTIONS: &[&str] = &[
    "ecppack_opts",
    "yosys_opts",
    "nextpnr_opts",
    "synth_opts",
    "add_preferences",
];

/// Caller-supplied option overrides for the prepare step.
///
/// `ecppack_opts` is the one option boards commonly tune; every other key
/// lands in `extra` and is forwarded to the toolchain without validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrepareOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecppack_opts: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PrepareOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ecppack_opts(mut self, opts: &str) -> Self {
        self.ecppack_opts = Some(opts.to_string());
        self
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        if key == "ecppack_opts" {
            self.ecppack_opts = Some(value.to_string());
        } else {
            self.extra.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ecppack_opts
            .as_deref()
            .map(|v| ("ecppack_opts", v))
            .into_iter()
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Fully merged option set handed to the toolchain backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolchainOptions(BTreeMap<String, String>);

impl ToolchainOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// `self` overlaid with `overrides`; override values win on collision.
    pub fn merged(&self, overrides: &PrepareOverrides) -> ToolchainOptions {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.0.insert(k.to_string(), v.to_string());
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whitespace-split value of `key`, empty when unset.
    pub fn split(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| !RECOGNIZED_OPTIONS.contains(k))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}
