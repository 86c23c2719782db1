//! The platform seam between a board descriptor and the ECP5 toolchain.
//!
//! A board implements `Platform` by exposing its identity and pin tables. The
//! toolchain hooks default to the stock Trellis flow; boards override them to
//! adjust packing options or to add a programming method.

mod validate;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{BoardError, ResourceKey};
use crate::products::BuildProducts;
use crate::resource::{Connector, Resource};
use crate::trellis::{self, BuildPlan, PrepareOverrides, ToolchainOptions};

pub use validate::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub device: String,
    pub package: String,
    pub speed: String,
    pub default_clk: String,
}

pub trait Platform {
    fn identity(&self) -> &DeviceIdentity;
    fn resources(&self) -> &[Resource];
    fn connectors(&self) -> &[Connector];

    fn lookup(&self, name: &str, number: u32) -> Option<&Resource> {
        self.resources()
            .iter()
            .find(|r| r.name == name && r.number == number)
    }

    fn connector(&self, name: &str, number: u32) -> Option<&Connector> {
        self.connectors()
            .iter()
            .find(|c| c.name == name && c.number == number)
    }

    fn default_clock(&self) -> Option<&Resource> {
        self.lookup(&self.identity().default_clk, 0)
    }

    /// Options the board applies before caller overrides.
    fn default_toolchain_options(&self) -> ToolchainOptions {
        ToolchainOptions::default()
    }

    fn toolchain_prepare(
        &self,
        fragment: &Fragment,
        name: &str,
        overrides: &PrepareOverrides,
    ) -> Result<BuildPlan, BoardError>
    where
        Self: Sized,
    {
        let options = self.default_toolchain_options().merged(overrides);
        trellis::prepare(self, fragment, name, &options)
    }

    fn toolchain_program(
        &self,
        _products: &dyn BuildProducts,
        name: &str,
    ) -> Result<(), BoardError> {
        Err(BoardError::Config(format!(
            "platform {} has no programming method (build {name})",
            self.identity().device
        )))
    }
}

/// Serializable snapshot of a platform's tables.
#[derive(Debug, Serialize)]
pub struct PlatformDescription<'a> {
    #[serde(flatten)]
    pub identity: &'a DeviceIdentity,
    pub resources: &'a [Resource],
    pub connectors: &'a [Connector],
}

impl<'a> PlatformDescription<'a> {
    pub fn of(platform: &'a impl Platform) -> Self {
        Self {
            identity: platform.identity(),
            resources: platform.resources(),
            connectors: platform.connectors(),
        }
    }
}

/// A design handed to the toolchain: HDL sources plus the board resources
/// its top-level ports are bound to.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    sources: BTreeMap<String, String>,
    requests: Vec<ResourceKey>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, file_name: &str, text: impl Into<String>) {
        self.sources.insert(file_name.to_string(), text.into());
    }

    /// Adds `name#number` to the top-level ports of the design.
    ///
    /// Ports are bound at raw pad polarity: for pins declared inverted the
    /// design itself must apply the inversion (see
    /// `BuildPlan::active_low_ports`).
    pub fn request<'p, P: Platform>(
        &mut self,
        platform: &'p P,
        name: &str,
        number: u32,
    ) -> Result<&'p Resource, BoardError> {
        let key = ResourceKey::new(name, number);
        let resource = platform
            .lookup(name, number)
            .ok_or_else(|| BoardError::UnknownResource(key.clone()))?;
        if self.requests.contains(&key) {
            return Err(BoardError::DuplicateResource(key));
        }
        self.requests.push(key);
        Ok(resource)
    }

    pub fn sources(&self) -> &BTreeMap<String, String> {
        &self.sources
    }

    pub fn requests(&self) -> &[ResourceKey] {
        &self.requests
    }
}
