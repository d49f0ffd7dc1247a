//! Port catalogs: where a sheet learns the ports of the symbols it places.
//!
//! Converting a symbol writes `<scratch>/<symbol>-port_locations.json`;
//! converting a sheet reads one such file per placed component.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::Port;

pub const CATALOG_SUFFIX: &str = "-port_locations.json";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no port catalog for component '{component}' (looked for {location})")]
    MissingPortCatalog { component: String, location: String },

    #[error("failed to access port catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("port catalog {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of port lists, keyed by component (symbol) name.
pub trait PortCatalog {
    fn lookup(&self, component: &str) -> Result<Vec<Port>, CatalogError>;
}

/// Catalog kept in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    ports: HashMap<String, Vec<Port>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: impl Into<String>, ports: Vec<Port>) {
        self.ports.insert(component.into(), ports);
    }

    pub fn with(mut self, component: impl Into<String>, ports: Vec<Port>) -> Self {
        self.insert(component, ports);
        self
    }
}

impl PortCatalog for InMemoryCatalog {
    fn lookup(&self, component: &str) -> Result<Vec<Port>, CatalogError> {
        self.ports
            .get(component)
            .cloned()
            .ok_or_else(|| CatalogError::MissingPortCatalog {
                component: component.to_string(),
                location: "in-memory catalog".to_string(),
            })
    }
}

/// Catalog backed by the side files in a scratch directory.
#[derive(Debug, Clone)]
pub struct ScratchCatalog {
    dir: PathBuf,
}

impl ScratchCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, component: &str) -> PathBuf {
        catalog_path(&self.dir, component)
    }
}

impl PortCatalog for ScratchCatalog {
    fn lookup(&self, component: &str) -> Result<Vec<Port>, CatalogError> {
        let path = self.path_for(component);
        if !path.is_file() {
            return Err(CatalogError::MissingPortCatalog {
                component: component.to_string(),
                location: path.display().to_string(),
            });
        }
        let text = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        parse_catalog(&text, &path)
    }
}

pub fn catalog_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}{CATALOG_SUFFIX}"))
}

#[derive(Serialize)]
struct CatalogFile<'a> {
    symbol: &'a str,
    ports: &'a [Port],
}

/// Write the catalog of `symbol` into `dir`, returning the file written.
///
/// A symbol without ports still gets a (empty) catalog so sheets placing it
/// can be converted.
pub fn write_catalog(dir: &Path, symbol: &str, ports: &[Port]) -> Result<PathBuf, CatalogError> {
    let path = catalog_path(dir, symbol);
    let json = serde_json::to_string_pretty(&CatalogFile { symbol, ports }).map_err(|source| {
        CatalogError::Json {
            path: path.clone(),
            source,
        }
    })?;
    fs::write(&path, json + "\n").map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    debug!("Wrote {} ports to {}", ports.len(), path.display());
    Ok(path)
}

/// Parse catalog text. Rows that do not describe a port are skipped.
pub fn parse_catalog(text: &str, path: &Path) -> Result<Vec<Port>, CatalogError> {
    let value: Value = serde_json::from_str(text).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(rows) = value.get("ports").and_then(Value::as_array) else {
        debug!("{}: no port list", path.display());
        return Ok(Vec::new());
    };

    let ports = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match serde_json::from_value::<Port>(row.clone()) {
            Ok(port) => Some(port),
            Err(e) => {
                debug!("{}: skipping port row {i}: {e}", path.display());
                None
            }
        })
        .collect();
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, PortDirection};

    fn clk() -> Port {
        Port {
            name: "clock".to_string(),
            port_type: "std_ulogic".to_string(),
            range: String::new(),
            direction: PortDirection::In,
            offset: Point::new(0, 200),
        }
    }

    #[test]
    fn scratch_catalog_reads_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let ports = vec![
            clk(),
            Port {
                name: "count".to_string(),
                port_type: "unsigned".to_string(),
                range: "width-1 downto 0".to_string(),
                direction: PortDirection::Out,
                offset: Point::new(1000, 200),
            },
        ];
        let path = write_catalog(dir.path(), "lib-counter", &ports).unwrap();
        assert_eq!(path, dir.path().join("lib-counter-port_locations.json"));

        let catalog = ScratchCatalog::new(dir.path());
        assert_eq!(catalog.lookup("lib-counter").unwrap(), ports);
    }

    #[test]
    fn empty_symbol_still_has_a_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_catalog(dir.path(), "lib-logo", &[]).unwrap();
        let catalog = ScratchCatalog::new(dir.path());
        assert!(catalog.lookup("lib-logo").unwrap().is_empty());
    }

    #[test]
    fn missing_catalog_names_component_and_location() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScratchCatalog::new(dir.path())
            .lookup("lib-adder")
            .unwrap_err();
        match err {
            CatalogError::MissingPortCatalog {
                component,
                location,
            } => {
                assert_eq!(component, "lib-adder");
                assert!(location.ends_with("lib-adder-port_locations.json"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let text = r#"{
            "symbol": "lib-mixed",
            "ports": [
                {"name": "a", "offset": [0, 0]},
                {"offset": [0, 100]},
                {"name": "c"},
                {"name": "d", "offset": "far away"},
                {"name": 5, "offset": [0, 300]},
                {"name": "f", "type": "signed", "range": "3 downto 0", "direction": "out", "offset": [0, 500]}
            ]
        }"#;
        let ports = parse_catalog(text, Path::new("mixed.json")).unwrap();
        let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "f"]);
        assert_eq!(ports[0].port_type, "");
        assert_eq!(ports[0].direction, PortDirection::In);
        assert_eq!(ports[1].direction, PortDirection::Out);
        assert_eq!(ports[1].range, "3 downto 0");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse_catalog("{ports: ", Path::new("broken.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Json { .. }));
    }

    #[test]
    fn in_memory_lookup() {
        let catalog = InMemoryCatalog::new().with("lib-reg", vec![clk()]);
        assert_eq!(catalog.lookup("lib-reg").unwrap(), vec![clk()]);
        assert!(matches!(
            catalog.lookup("lib-none"),
            Err(CatalogError::MissingPortCatalog { .. })
        ));
    }
}
