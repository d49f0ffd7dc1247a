use std::path::{Path, PathBuf};

use geda2vhdl_format::{Document, Object, ObjectKind, ParseError};
use geda2vhdl_netlist::{Point, Port, PortDirection};
use log::{debug, warn};
use serde::Serialize;

/// Port type of pins without a `porttype` attribute.
pub const DEFAULT_PORT_TYPE: &str = "std_ulogic";

#[derive(Debug, thiserror::Error)]
pub enum SymbolError {
    #[error("failed to read symbol {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid symbol {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

/// The interface a `.sym` file declares: generics and ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Symbol {
    /// File name without `.sym`, e.g. `lib-counter`.
    pub name: String,
    /// Generic declarations, e.g. `width : positive := 8`.
    pub generics: Vec<String>,
    pub ports: Vec<Port>,
}

impl Symbol {
    pub fn from_file(path: &Path) -> Result<Self, SymbolError> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = std::fs::read_to_string(path).map_err(|source| SymbolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Reading symbol {}", path.display());
        Self::from_string(&name, &text)
    }

    pub fn from_string(name: &str, contents: &str) -> Result<Self, SymbolError> {
        let doc = geda2vhdl_format::parse(contents).map_err(|source| SymbolError::Parse {
            name: name.to_string(),
            source,
        })?;
        Self::from_document(name, &doc).map_err(|source| SymbolError::Parse {
            name: name.to_string(),
            source,
        })
    }

    pub fn from_document(name: &str, doc: &Document) -> Result<Self, ParseError> {
        let generics = doc
            .floating_attributes()
            .filter(|(attr, _)| *attr == "generic")
            .map(|(_, value)| value.to_string())
            .collect();

        let mut ports = Vec::new();
        for pin in doc.objects_of(ObjectKind::Pin) {
            if let Some(port) = port_of(name, pin)? {
                ports.push(port);
            }
        }

        debug!("Symbol {name}: {} ports", ports.len());
        Ok(Symbol {
            name: name.to_string(),
            generics,
            ports,
        })
    }

    /// Library a symbol belongs to: the part of its name before the first `-`.
    pub fn library(&self) -> &str {
        library_of(&self.name)
    }
}

pub fn library_of(name: &str) -> &str {
    name.split_once('-').map_or(name, |(lib, _)| lib)
}

fn port_of(symbol: &str, pin: &Object) -> Result<Option<Port>, ParseError> {
    let offset = Point::from(pin.point(0)?);

    let Some(name) = pin.attribute("pinlabel") else {
        warn!(
            "{symbol}: pin at line {} has no pinlabel, skipping it",
            pin.line
        );
        return Ok(None);
    };

    let direction = match pin.attribute("portdirection") {
        None => PortDirection::In,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("{symbol}: pin {name}: {e}, using 'in'");
            PortDirection::In
        }),
    };

    let range = pin.attribute("portrange").unwrap_or_default().trim();
    let range = range
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(range);

    Ok(Some(Port {
        name: name.to_string(),
        port_type: pin
            .attribute("porttype")
            .unwrap_or(DEFAULT_PORT_TYPE)
            .to_string(),
        range: range.to_string(),
        direction,
        offset,
    }))
}
