//! Pin resource declarations.
//!
//! A `Resource` names a board signal (or a bundle of subsignals) and binds it
//! to package pads together with its electrical attributes. A `Connector`
//! maps the labels printed on an expansion header to package pads.

pub mod bundles;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[serde(rename = "i")]
    Input,
    #[serde(rename = "o")]
    Output,
    #[serde(rename = "io")]
    InOut,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "i",
            Direction::Output => "o",
            Direction::InOut => "io",
        }
    }
}

/// Electrical attributes attached to a pin group, e.g. `IO_TYPE=LVCMOS33`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, String>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn io_type(io_type: &str) -> Self {
        Self::new().with("IO_TYPE", io_type)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attributes of `self` overlaid with those of `inner`.
    pub fn merged(&self, inner: &Attrs) -> Attrs {
        let mut out = self.clone();
        for (k, v) in &inner.0 {
            out.0.insert(k.clone(), v.clone());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Clock {
    pub frequency_hz: f64,
}

impl Clock {
    pub fn hz(frequency_hz: f64) -> Self {
        Self { frequency_hz }
    }
}

/// An ordered group of pads sharing direction and polarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pins {
    pub names: Vec<String>,
    pub dir: Direction,
    pub invert: bool,
}

impl Pins {
    /// Whitespace-separated pad names, active-high.
    pub fn new(names: &str, dir: Direction) -> Self {
        Self {
            names: names.split_whitespace().map(str::to_string).collect(),
            dir,
            invert: false,
        }
    }

    /// Same as `new`, active-low.
    pub fn inverted(names: &str, dir: Direction) -> Self {
        Self {
            invert: true,
            ..Self::new(names, dir)
        }
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subsignal {
    pub name: String,
    pub pins: Pins,
    #[serde(skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Subsignal {
    pub fn new(name: &str, pins: Pins) -> Self {
        Self {
            name: name.to_string(),
            pins,
            attrs: Attrs::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Pins(Pins),
    Subsignals(Vec<Subsignal>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub name: String,
    pub number: u32,
    pub signal: Signal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<Clock>,
    #[serde(skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    /// Exclusive resource whose pads this one reuses, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<(String, u32)>,
}

impl Resource {
    pub fn new(name: &str, number: u32, pins: Pins) -> Self {
        Self::with_signal(name, number, Signal::Pins(pins))
    }

    pub fn bundle(name: &str, number: u32, subsignals: Vec<Subsignal>) -> Self {
        Self::with_signal(name, number, Signal::Subsignals(subsignals))
    }

    fn with_signal(name: &str, number: u32, signal: Signal) -> Self {
        Self {
            name: name.to_string(),
            number,
            signal,
            clock: None,
            attrs: Attrs::new(),
            shares: None,
        }
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Marks this declaration as another view over the pads of `name#number`.
    pub fn sharing(mut self, name: &str, number: u32) -> Self {
        self.shares = Some((name.to_string(), number));
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.name.clone(), self.number)
    }

    pub fn shared_key(&self) -> Option<ResourceKey> {
        self.shares
            .as_ref()
            .map(|(name, number)| ResourceKey::new(name.clone(), *number))
    }

    pub fn is_exclusive(&self) -> bool {
        self.shares.is_none()
    }

    /// Every pad referenced by this resource, in declaration order.
    pub fn pads(&self) -> Vec<&str> {
        self.pin_groups()
            .into_iter()
            .flat_map(|group| group.pins.names.iter().map(String::as_str))
            .collect()
    }

    /// Flattened pin groups with their port name suffix and effective attributes.
    pub fn pin_groups(&self) -> Vec<PinGroup<'_>> {
        match &self.signal {
            Signal::Pins(pins) => vec![PinGroup {
                path: Vec::new(),
                pins,
                attrs: self.attrs.clone(),
            }],
            Signal::Subsignals(subsignals) => subsignals
                .iter()
                .map(|sub| PinGroup {
                    path: vec![sub.name.as_str()],
                    pins: &sub.pins,
                    attrs: self.attrs.merged(&sub.attrs),
                })
                .collect(),
        }
    }
}

/// One pin group of a resource, as seen by constraint generation.
#[derive(Debug, Clone)]
pub struct PinGroup<'a> {
    pub path: Vec<&'a str>,
    pub pins: &'a Pins,
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connector {
    pub name: String,
    pub number: u32,
    pub pins: BTreeMap<String, String>,
}

impl Connector {
    pub fn new<'a, I>(name: &str, number: u32, pins: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            name: name.to_string(),
            number,
            pins: pins
                .into_iter()
                .map(|(label, pad)| (label.to_string(), pad.to_string()))
                .collect(),
        }
    }

    /// Physical pad behind a header label.
    pub fn pad(&self, label: &str) -> Option<&str> {
        self.pins.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
