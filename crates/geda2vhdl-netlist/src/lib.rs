//! Connectivity model of a gEDA schematic sheet.
//!
//! A sheet is turned into a [`Netlist`] in three steps:
//!
//! * [`geda_schematic`] reads components, wires and text from the sheet;
//! * [`aggregate`] merges wire segments into named nets;
//! * [`connect`] places every component port on the sheet, using the
//!   [`catalog`] of the component's symbol, and connects it to the net it
//!   lands on.
//!
//! All types are plain data and serialisable with `serde`.

pub mod aggregate;
pub mod catalog;
pub mod connect;
pub mod geda_schematic;
pub mod geometry;

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

pub use aggregate::{aggregate, LabelledWire, Net, NetAggregator};
pub use catalog::{CatalogError, InMemoryCatalog, PortCatalog, ScratchCatalog};
pub use geda_schematic::{SchematicError, Sheet};
pub use geometry::{Point, Segment};

/// Net name of a port that is not connected.
pub const OPEN: &str = "open";

/// A component placed on a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Symbol file name without `.sym`.
    pub name: String,
    /// `refdes`, empty when absent.
    pub label: String,
    /// Sub-sheet implementing the component.
    pub source: Option<String>,
    /// `generic` attributes in file order, e.g. `width : positive := 8`.
    pub generics: Vec<String>,
    pub location: Point,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    #[default]
    In,
    Out,
    Inout,
    Buffer,
    Linkage,
}

impl PortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
            PortDirection::Inout => "inout",
            PortDirection::Buffer => "buffer",
            PortDirection::Linkage => "linkage",
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown port direction '{0}'")]
pub struct UnknownDirection(pub String);

impl FromStr for PortDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(PortDirection::In),
            "out" => Ok(PortDirection::Out),
            "inout" => Ok(PortDirection::Inout),
            "buffer" => Ok(PortDirection::Buffer),
            "linkage" => Ok(PortDirection::Linkage),
            _ => Err(UnknownDirection(s.to_string())),
        }
    }
}

/// A port of a symbol, positioned relative to the symbol origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    #[serde(rename = "type", default)]
    pub port_type: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub direction: PortDirection,
    pub offset: Point,
}

impl Port {
    /// VHDL subtype, e.g. `unsigned(7 downto 0)`.
    pub fn subtype(&self) -> String {
        subtype(&self.port_type, &self.range)
    }
}

/// VHDL declaration of one net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    #[serde(rename = "type", default)]
    pub signal_type: String,
    #[serde(default)]
    pub range: String,
}

impl Signal {
    /// An untyped signal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signal_type: String::new(),
            range: String::new(),
        }
    }

    pub fn subtype(&self) -> String {
        subtype(&self.signal_type, &self.range)
    }
}

fn subtype(ty: &str, range: &str) -> String {
    if range.is_empty() {
        ty.to_string()
    } else {
        format!("{ty}({range})")
    }
}

/// A port that landed on a net.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConnection {
    /// Index of the instance in [`Netlist::instances`].
    pub instance: usize,
    pub component: String,
    pub port: String,
    pub net: String,
}

/// A component together with the ports of its symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub component: Component,
    pub ports: Vec<Port>,
}

/// Connectivity of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    pub nets: Vec<Net>,
    pub signals: Vec<Signal>,
    pub instances: Vec<Instance>,
    pub connections: Vec<PortConnection>,
    pub text_blocks: Vec<String>,
}

impl Netlist {
    /// Net connected to `port` of instance `instance`, or [`OPEN`].
    pub fn net_for(&self, instance: usize, port: &str) -> &str {
        self.connections
            .iter()
            .find(|c| c.instance == instance && c.port == port)
            .map_or(OPEN, |c| c.net.as_str())
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// Lines after the header of every text block starting with `header`.
    pub fn text_blocks_with<'a>(&'a self, header: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.text_blocks
            .iter()
            .filter(move |block| block.starts_with(header))
            .map(|block| block.split_once('\n').map_or("", |(_, body)| body))
    }
}

/// Build the connectivity of a sheet.
///
/// Fails only when a placed component has no port catalog.
pub fn build_netlist(sheet: Sheet, catalog: &dyn PortCatalog) -> Result<Netlist, CatalogError> {
    let Sheet {
        components,
        labelled,
        fragments,
        mut signals,
        text_blocks,
    } = sheet;

    let nets = aggregate(&labelled, &fragments);
    signals.extend(
        nets.iter()
            .filter(|net| net.synthetic)
            .map(|net| Signal::new(net.name.as_str())),
    );
    debug!("{} nets, {} signals", nets.len(), signals.len());

    let connect::Connectivity {
        instances,
        connections,
    } = connect::resolve(&components, &nets, &mut signals, catalog)?;

    Ok(Netlist {
        nets,
        signals,
        instances,
        connections,
        text_blocks,
    })
}
