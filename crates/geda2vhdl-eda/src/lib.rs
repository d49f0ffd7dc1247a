//! Project level knowledge of a gEDA design: what a symbol declares, where
//! the libraries are, and which files a hierarchical design is made of.

pub mod gafrc;
pub mod hierarchy;
pub mod symbol;

pub use gafrc::{GafrcError, LibraryPaths};
pub use hierarchy::{discover, top_symbol_for, DesignFiles, HierarchyError};
pub use symbol::{library_of, Symbol, SymbolError};
