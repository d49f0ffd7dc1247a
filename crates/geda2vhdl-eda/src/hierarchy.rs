//! Walking a hierarchical design from its top sheet.

use std::collections::{HashSet, VecDeque};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use geda2vhdl_netlist::{SchematicError, Sheet};
use log::debug;

use crate::gafrc::LibraryPaths;

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("cannot derive a top symbol from sheet {}", sheet.display())]
    NoTopSymbol { sheet: PathBuf },

    #[error("symbol {symbol} used in {} not found in the symbol libraries", sheet.display())]
    MissingSymbol { symbol: String, sheet: PathBuf },

    #[error("sheet {schematic} used in {} not found in the source libraries", sheet.display())]
    MissingSchematic { schematic: String, sheet: PathBuf },

    #[error("cannot read sheet {}", path.display())]
    Sheet {
        path: PathBuf,
        #[source]
        source: SchematicError,
    },
}

/// Files to convert, in discovery order and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignFiles {
    pub symbols: Vec<PathBuf>,
    pub schematics: Vec<PathBuf>,
}

impl DesignFiles {
    fn push_symbol(&mut self, path: PathBuf) -> bool {
        push_unique(&mut self.symbols, path)
    }

    fn push_schematic(&mut self, path: PathBuf) -> bool {
        push_unique(&mut self.schematics, path)
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: PathBuf) -> bool {
    let path = std::fs::canonicalize(&path).unwrap_or(path);
    if list.contains(&path) {
        false
    } else {
        list.push(path);
        true
    }
}

/// Symbol drawn for a sheet: `.../Schematics/lib-name-arch.sch` is
/// implemented by `.../Symbols/lib-name.sym`.
pub fn top_symbol_for(sheet: &Path) -> Option<PathBuf> {
    let stem = sheet.file_stem()?.to_str()?;
    let (entity, _architecture) = stem.rsplit_once('-')?;
    let dir: PathBuf = sheet
        .parent()?
        .components()
        .map(|part| match part {
            Component::Normal(name) if name == "Schematics" => {
                Component::Normal(OsStr::new("Symbols"))
            }
            other => other,
        })
        .collect();
    Some(dir.join(format!("{entity}.sym")))
}

/// Collect every symbol and sheet reachable from `top_sheet`.
///
/// Sheets are visited breadth first. Every placed component contributes its
/// symbol, and components with a `source` sheet queue that sheet once.
pub fn discover(top_sheet: &Path, paths: &LibraryPaths) -> Result<DesignFiles, HierarchyError> {
    let top_symbol = top_symbol_for(top_sheet).ok_or_else(|| HierarchyError::NoTopSymbol {
        sheet: top_sheet.to_path_buf(),
    })?;

    let mut files = DesignFiles::default();
    files.push_symbol(top_symbol);
    files.push_schematic(top_sheet.to_path_buf());

    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([top_sheet.to_path_buf()]);

    while let Some(sheet_path) = queue.pop_front() {
        if !visited.insert(sheet_path.clone()) {
            continue;
        }
        debug!("Scanning {}", sheet_path.display());
        let sheet = Sheet::from_file(&sheet_path).map_err(|source| HierarchyError::Sheet {
            path: sheet_path.clone(),
            source,
        })?;

        for component in &sheet.components {
            let symbol = format!("{}.sym", component.name);
            let symbol_path =
                paths
                    .find_symbol(&symbol)
                    .ok_or_else(|| HierarchyError::MissingSymbol {
                        symbol: symbol.clone(),
                        sheet: sheet_path.clone(),
                    })?;
            if files.push_symbol(symbol_path) {
                debug!("  symbol {symbol}");
            }

            let Some(source) = &component.source else {
                continue;
            };
            let source_path =
                paths
                    .find_schematic(source)
                    .ok_or_else(|| HierarchyError::MissingSchematic {
                        schematic: source.clone(),
                        sheet: sheet_path.clone(),
                    })?;
            if files.push_schematic(source_path.clone()) {
                debug!("  sheet {source}");
                queue.push_back(source_path);
            }
        }
    }

    Ok(files)
}
