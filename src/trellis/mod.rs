//! Lattice ECP5 open toolchain flow (Yosys, nextpnr-ecp5, ecppack).
//!
//! `prepare` turns a platform and a fragment into a `BuildPlan`: the files a
//! build directory needs (pin constraints, synthesis script, shell script) and
//! the ordered tool invocations. `BuildPlan::run` executes it in a build
//! directory.

mod options;

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::BoardError;
use crate::platform::{Fragment, Platform};
use crate::program;
use crate::resource::Resource;

pub use options::{PrepareOverrides, ToolchainOptions, RECOGNIZED_OPTIONS};

const DEVICES: &[(&str, &str)] = &[
    ("LFE5U-12F", "--12k"),
    ("LFE5U-25F", "--25k"),
    ("LFE5U-45F", "--45k"),
    ("LFE5U-85F", "--85k"),
    ("LFE5UM-25F", "--um-25k"),
    ("LFE5UM-45F", "--um-45k"),
    ("LFE5UM-85F", "--um-85k"),
    ("LFE5UM5G-25F", "--um5g-25k"),
    ("LFE5UM5G-45F", "--um5g-45k"),
    ("LFE5UM5G-85F", "--um5g-85k"),
];

const PACKAGES: &[(&str, &str)] = &[
    ("BG256", "CABGA256"),
    ("MG285", "CSFBGA285"),
    ("BG381", "CABGA381"),
    ("BG554", "CABGA554"),
    ("BG756", "CABGA756"),
];

const SPEEDS: &[&str] = &["6", "7", "8"];

/// nextpnr device and package options for a part, if the toolchain knows it.
pub fn part_options(
    device: &str,
    package: &str,
    speed: &str,
) -> Result<(&'static str, &'static str), BoardError> {
    let device_opt = DEVICES.iter().find(|(d, _)| *d == device).map(|(_, o)| *o);
    let package_opt = PACKAGES.iter().find(|(p, _)| *p == package).map(|(_, o)| *o);
    match (device_opt, package_opt, SPEEDS.contains(&speed)) {
        (Some(d), Some(p), true) => Ok((d, p)),
        _ => Err(BoardError::UnsupportedPart {
            device: device.to_string(),
            package: package.to_string(),
            speed: speed.to_string(),
        }),
    }
}

/// Environment variable that overrides the path of `tool`: `nextpnr-ecp5`
/// becomes `NEXTPNR_ECP5`.
pub fn tool_env_var(tool: &str) -> String {
    tool.chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Resolves `tool` through its environment variable, falling back to the bare
/// name. Empty values count as unset.
pub fn resolve_tool<F>(tool: &str, lookup: F) -> PathBuf
where
    F: FnOnce(&str) -> Option<OsString>,
{
    match lookup(&tool_env_var(tool)) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(tool),
    }
}

fn resolve_from_env(tool: &str) -> PathBuf {
    resolve_tool(tool, |var| std::env::var_os(var))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInvocation {
    pub tool: PathBuf,
    pub args: Vec<String>,
}

impl ToolInvocation {
    fn new(tool: &str, args: Vec<String>) -> Self {
        Self {
            tool: resolve_from_env(tool),
            args,
        }
    }

    pub fn command_line(&self) -> String {
        let mut line = self.tool.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub name: String,
    pub options: ToolchainOptions,
    pub files: BTreeMap<String, String>,
    pub commands: Vec<ToolInvocation>,
    /// Requested ports the design must drive or read inverted.
    pub active_low_ports: Vec<String>,
}

impl BuildPlan {
    pub fn script_name(&self) -> String {
        format!("build_{}.sh", self.name)
    }

    /// Writes every generated file into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<(), BoardError> {
        std::fs::create_dir_all(dir)?;
        for (file_name, text) in &self.files {
            std::fs::write(dir.join(file_name), text)?;
        }
        info!("wrote {} files for build {} to {}", self.files.len(), self.name, dir.display());
        Ok(())
    }

    /// Writes the plan into `dir` and runs every tool there in order,
    /// stopping at the first failure.
    pub fn run(&self, dir: &Path) -> Result<(), BoardError> {
        self.write_to(dir)?;
        for command in &self.commands {
            info!("running {}", command.command_line());
            program::spawn(&command.tool, command.args.as_slice(), Some(dir))?;
        }
        Ok(())
    }
}

/// Prepares the Trellis flow for `fragment` with already merged `options`.
pub fn prepare<P: Platform>(
    platform: &P,
    fragment: &Fragment,
    name: &str,
    options: &ToolchainOptions,
) -> Result<BuildPlan, BoardError> {
    let id = platform.identity();
    let (device_opt, package_opt) = part_options(&id.device, &id.package, &id.speed)?;

    for key in options.unrecognized() {
        debug!("passing through unrecognized toolchain option {key}");
    }

    let lpf = constraints(platform, fragment, options)?;
    let active_low_ports = active_low_ports(platform, fragment)?;
    if !active_low_ports.is_empty() {
        debug!("active-low ports: {}", active_low_ports.join(", "));
    }
    let ys = synthesis_script(fragment, name, options);

    let commands = vec![
        ToolInvocation::new(
            "yosys",
            concat_args(
                &["-q"],
                options.split("yosys_opts"),
                &["-l", &format!("{name}.rpt"), &format!("{name}.ys")],
            ),
        ),
        ToolInvocation::new(
            "nextpnr-ecp5",
            concat_args(
                &["--quiet"],
                options.split("nextpnr_opts"),
                &[
                    "--log",
                    &format!("{name}.tim"),
                    device_opt,
                    "--package",
                    package_opt,
                    "--speed",
                    &id.speed,
                    "--json",
                    &format!("{name}.json"),
                    "--lpf",
                    &format!("{name}.lpf"),
                    "--textcfg",
                    &format!("{name}.config"),
                ],
            ),
        ),
        ToolInvocation::new(
            "ecppack",
            concat_args(
                &[],
                options.split("ecppack_opts"),
                &[
                    "--input",
                    &format!("{name}.config"),
                    "--bit",
                    &format!("{name}.bit"),
                    "--svf",
                    &format!("{name}.svf"),
                ],
            ),
        ),
    ];

    let mut files = fragment.sources().clone();
    files.insert(format!("{name}.lpf"), lpf);
    files.insert(format!("{name}.ys"), ys);
    let mut plan = BuildPlan {
        name: name.to_string(),
        options: options.clone(),
        files,
        commands,
        active_low_ports,
    };
    let script = shell_script(&plan);
    let script_name = plan.script_name();
    plan.files.insert(script_name, script);

    info!(
        "prepared build {name} for {} ({} commands)",
        id.device,
        plan.commands.len()
    );
    Ok(plan)
}

fn concat_args(head: &[&str], middle: Vec<String>, tail: &[&str]) -> Vec<String> {
    head.iter()
        .map(|s| s.to_string())
        .chain(middle)
        .chain(tail.iter().map(|s| s.to_string()))
        .collect()
}

/// Top-level port name for one pin group, e.g. `spi_flash_1x_0__cs__io`.
pub fn port_name(resource: &str, number: u32, path: &[&str]) -> String {
    let mut name = format!("{resource}_{number}");
    for part in path {
        name.push_str("__");
        name.push_str(part);
    }
    name.push_str("__io");
    name
}

fn constraints<P: Platform>(
    platform: &P,
    fragment: &Fragment,
    options: &ToolchainOptions,
) -> Result<String, BoardError> {
    let mut lpf = String::from("# Automatically generated by ecp5_mini. Do not edit.\n");
    lpf.push_str("BLOCK ASYNCPATHS;\nBLOCK RESETPATHS;\n");

    let mut clocks = Vec::new();
    for resource in requested(platform, fragment)? {
        for group in resource.pin_groups() {
            let port = port_name(&resource.name, resource.number, &group.path);
            for (bit_port, pad) in bit_ports(&port, &group.pins.names) {
                lpf.push_str(&format!("LOCATE COMP \"{bit_port}\" SITE \"{pad}\";\n"));
                if !group.attrs.is_empty() {
                    let attrs: Vec<String> =
                        group.attrs.iter().map(|(k, v)| format!(" {k}={v}")).collect();
                    lpf.push_str(&format!("IOBUF PORT \"{bit_port}\"{};\n", attrs.concat()));
                }
            }
            if let Some(clock) = resource.clock {
                clocks.push((port, clock.frequency_hz));
            }
        }
    }
    for (port, hz) in clocks {
        lpf.push_str(&format!("FREQUENCY PORT \"{port}\" {hz} HZ;\n"));
    }
    if let Some(prefs) = options.get("add_preferences") {
        lpf.push_str(prefs);
        lpf.push('\n');
    }
    Ok(lpf)
}

/// Top-level ports whose pads are active-low. The constraints bind raw pad
/// polarity, so the design must invert these itself.
pub fn active_low_ports<P: Platform>(
    platform: &P,
    fragment: &Fragment,
) -> Result<Vec<String>, BoardError> {
    let mut ports = Vec::new();
    for resource in requested(platform, fragment)? {
        for group in resource.pin_groups().into_iter().filter(|g| g.pins.invert) {
            let port = port_name(&resource.name, resource.number, &group.path);
            ports.extend(bit_ports(&port, &group.pins.names).map(|(bit_port, _)| bit_port));
        }
    }
    Ok(ports)
}

fn requested<'p, P: Platform>(
    platform: &'p P,
    fragment: &Fragment,
) -> Result<Vec<&'p Resource>, BoardError> {
    fragment
        .requests()
        .iter()
        .map(|key| {
            platform
                .lookup(&key.name, key.number)
                .ok_or_else(|| BoardError::UnknownResource(key.clone()))
        })
        .collect()
}

/// `(port, pad)` per bit; multi-bit groups index the port as `port[n]`.
fn bit_ports<'a>(
    port: &'a str,
    pads: &'a [String],
) -> impl Iterator<Item = (String, &'a str)> + 'a {
    let width = pads.len();
    pads.iter().enumerate().map(move |(bit, pad)| {
        let bit_port = if width == 1 {
            port.to_string()
        } else {
            format!("{port}[{bit}]")
        };
        (bit_port, pad.as_str())
    })
}

fn synthesis_script(fragment: &Fragment, name: &str, options: &ToolchainOptions) -> String {
    let mut ys = String::new();
    for file_name in fragment.sources().keys() {
        ys.push_str(&format!("read_verilog {file_name}\n"));
    }
    let synth_opts = options.split("synth_opts").join(" ");
    if synth_opts.is_empty() {
        ys.push_str(&format!("synth_ecp5 -top {name}\n"));
    } else {
        ys.push_str(&format!("synth_ecp5 {synth_opts} -top {name}\n"));
    }
    ys.push_str(&format!("write_json {name}.json\n"));
    ys
}

fn shell_script(plan: &BuildPlan) -> String {
    let mut sh =
        String::from("#!/bin/sh\n# Automatically generated by ecp5_mini. Do not edit.\nset -e\n");
    for command in &plan.commands {
        sh.push_str(&command.command_line());
        sh.push('\n');
    }
    sh
}
