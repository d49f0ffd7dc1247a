//! File and identifier naming conventions.
//!
//! Symbols are named `<library>-<name>.sym`, sheets `<library>-<name>-<architecture>.sch`.
//! Generated files go to a `Description` directory next to the source
//! directory unless told otherwise.

use std::path::{Path, PathBuf};

use geda2vhdl_eda::library_of;

pub const DESCRIPTION_DIR: &str = "Description";

pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// `lib-counter` becomes `lib_counter`.
pub fn vhdl_identifier(name: &str) -> String {
    name.replace('-', "_")
}

/// Default output directory for files generated from `source`.
pub fn default_output_dir(source: &Path) -> PathBuf {
    match source.parent().and_then(Path::parent) {
        Some(grandparent) => grandparent.join(DESCRIPTION_DIR),
        None => PathBuf::from(DESCRIPTION_DIR),
    }
}

/// Names derived from a symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNames {
    /// `lib-counter`
    pub symbol: String,
    /// `lib`
    pub library: String,
    /// `lib_counter`
    pub entity: String,
}

impl SymbolNames {
    pub fn from_path(path: &Path) -> Option<Self> {
        let symbol = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            library: library_of(&symbol).to_string(),
            entity: vhdl_identifier(&symbol),
            symbol,
        })
    }

    pub fn vhdl_file(&self) -> String {
        format!("{}.vhd", self.symbol)
    }
}

/// Names derived from a sheet file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    /// `lib-counter-rtl`
    pub sheet: String,
    pub library: String,
    /// Entity implemented by the sheet, `lib_counter`.
    pub entity: String,
    /// `rtl`
    pub architecture: String,
}

impl SheetNames {
    /// `None` unless the stem has a library, a name and an architecture.
    pub fn from_path(path: &Path) -> Option<Self> {
        let sheet = path.file_stem()?.to_str()?.to_string();
        let (symbol, architecture) = sheet.rsplit_once('-')?;
        let (library, _) = symbol.split_once('-')?;
        Some(Self {
            library: library.to_string(),
            entity: vhdl_identifier(symbol),
            architecture: architecture.to_string(),
            sheet,
        })
    }

    pub fn vhdl_file(&self) -> String {
        format!("{}.vhd", self.sheet)
    }
}
