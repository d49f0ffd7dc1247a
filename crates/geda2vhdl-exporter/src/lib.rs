//! VHDL generation for gEDA designs.
//!
//! * [`process_symbol`] writes the entity of a `.sym` file and the port
//!   catalog sheets placing it will need;
//! * [`process_schematic`] writes the architecture of a `.sch` sheet;
//! * [`process_design`] does both for every file of a hierarchical design.

pub mod architecture;
pub mod entity;
pub mod naming;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use geda2vhdl_eda::{
    discover, GafrcError, HierarchyError, LibraryPaths, Symbol, SymbolError,
};
use geda2vhdl_netlist::catalog::write_catalog;
use geda2vhdl_netlist::{build_netlist, CatalogError, SchematicError, ScratchCatalog, Sheet};
use log::debug;
use thiserror::Error;

pub use architecture::render_architecture;
pub use entity::render_entity;
use naming::{default_output_dir, SheetNames, SymbolNames, DEFAULT_SCRATCH_DIR};

pub(crate) const INDENT: &str = "  ";

/// Settings shared by every conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// VHDL library; derived from each file name when unset.
    pub library: Option<String>,
    /// Output directory; the sibling `Description` directory when unset.
    pub output_dir: Option<PathBuf>,
    /// Where port catalogs are exchanged between symbols and sheets.
    pub scratch_dir: PathBuf,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            library: None,
            output_dir: None,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
        }
    }
}

impl ExportOptions {
    fn output_dir_for(&self, source: &Path) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(source))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Entity,
    Architecture,
}

/// Result of converting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub source_file: PathBuf,
    pub vhdl_file: PathBuf,
    /// Port catalog written for a symbol.
    pub catalog_file: Option<PathBuf>,
    pub kind: UnitKind,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("output directory not found: {}", .0.display())]
    MissingOutputDir(PathBuf),

    #[error("scratch directory not found: {}", .0.display())]
    MissingScratchDir(PathBuf),

    #[error("file name does not follow the library-name[-architecture] convention: {}", .0.display())]
    BadFileName(PathBuf),

    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error(transparent)]
    Schematic(#[from] SchematicError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Gafrc(#[from] GafrcError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn check_paths(source: &Path, output_dir: &Path, scratch_dir: &Path) -> Result<(), ExportError> {
    if !source.is_file() {
        return Err(ExportError::MissingSource(source.to_path_buf()));
    }
    if !output_dir.is_dir() {
        return Err(ExportError::MissingOutputDir(output_dir.to_path_buf()));
    }
    if !scratch_dir.is_dir() {
        return Err(ExportError::MissingScratchDir(scratch_dir.to_path_buf()));
    }
    Ok(())
}

/// Convert a symbol into its entity and port catalog.
pub fn process_symbol(path: &Path, options: &ExportOptions) -> Result<ExportResult, ExportError> {
    let names =
        SymbolNames::from_path(path).ok_or_else(|| ExportError::BadFileName(path.to_path_buf()))?;
    let output_dir = options.output_dir_for(path);
    check_paths(path, &output_dir, &options.scratch_dir)?;

    let symbol = Symbol::from_file(path)?;
    let library = options.library.as_deref().unwrap_or(&names.library);

    let vhdl_file = output_dir.join(names.vhdl_file());
    debug!("Writing entity {} to {}", names.entity, vhdl_file.display());
    fs::write(&vhdl_file, render_entity(&symbol, library))
        .with_context(|| format!("Failed to write entity: {}", vhdl_file.display()))?;

    let catalog_file = write_catalog(&options.scratch_dir, &symbol.name, &symbol.ports)?;

    Ok(ExportResult {
        source_file: path.to_path_buf(),
        vhdl_file,
        catalog_file: Some(catalog_file),
        kind: UnitKind::Entity,
    })
}

/// Convert a sheet into an architecture.
///
/// Every symbol placed on the sheet must have been converted first, with
/// the same scratch directory.
pub fn process_schematic(
    path: &Path,
    options: &ExportOptions,
) -> Result<ExportResult, ExportError> {
    let names =
        SheetNames::from_path(path).ok_or_else(|| ExportError::BadFileName(path.to_path_buf()))?;
    let output_dir = options.output_dir_for(path);
    check_paths(path, &output_dir, &options.scratch_dir)?;

    let sheet = Sheet::from_file(path)?;
    let catalog = ScratchCatalog::new(&options.scratch_dir);
    let netlist = build_netlist(sheet, &catalog)?;
    let library = options.library.as_deref().unwrap_or(&names.library);

    let vhdl_file = output_dir.join(names.vhdl_file());
    debug!(
        "Writing architecture {} of {} to {}",
        names.architecture,
        names.entity,
        vhdl_file.display()
    );
    let text = render_architecture(&netlist, library, &names.entity, &names.architecture);
    fs::write(&vhdl_file, text)
        .with_context(|| format!("Failed to write architecture: {}", vhdl_file.display()))?;

    Ok(ExportResult {
        source_file: path.to_path_buf(),
        vhdl_file,
        catalog_file: None,
        kind: UnitKind::Architecture,
    })
}

/// `gafrc` used when none is given: one level above the top sheet's directory.
pub fn default_gafrc(top_sheet: &Path) -> PathBuf {
    let dir = top_sheet.parent().unwrap_or(Path::new(""));
    dir.join("..").join("gafrc")
}

/// Convert every symbol, then every sheet, of the design rooted at `top_sheet`.
pub fn process_design(
    top_sheet: &Path,
    gafrc: Option<&Path>,
    options: &ExportOptions,
) -> Result<Vec<ExportResult>, ExportError> {
    if !top_sheet.is_file() {
        return Err(ExportError::MissingSource(top_sheet.to_path_buf()));
    }
    let gafrc = gafrc.map_or_else(|| default_gafrc(top_sheet), Path::to_path_buf);
    let paths = LibraryPaths::from_gafrc(&gafrc)?;
    let files = discover(top_sheet, &paths)?;
    debug!(
        "Design has {} symbols and {} sheets",
        files.symbols.len(),
        files.schematics.len()
    );

    let mut results = Vec::with_capacity(files.symbols.len() + files.schematics.len());
    for symbol in &files.symbols {
        results.push(process_symbol(symbol, options)?);
    }
    for sheet in &files.schematics {
        results.push(process_schematic(sheet, options)?);
    }
    Ok(results)
}
