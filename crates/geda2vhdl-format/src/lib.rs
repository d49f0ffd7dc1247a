//! Readers for the two text formats a gEDA/Lepton project is made of.
//!
//! * [`object`] reads schematic (`.sch`) and symbol (`.sym`) files into a flat
//!   list of [`Object`]s, each carrying its attribute block.
//! * [`scheme`] reads the S-expressions found in `gafrc` configuration files.
//!
//! Neither reader interprets what it reads: turning objects into components
//! and nets, or expressions into library paths, is left to the crates above.

pub mod object;
pub mod scheme;

pub use object::{parse, Attribute, Document, Object, ObjectKind};
pub use scheme::{parse_all as parse_scheme, Sexpr};

/// Errors produced by both readers.
///
/// Line numbers are 1-based and point at the line that opened the construct
/// in trouble.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: input ended inside {context}")]
    UnexpectedEof { line: usize, context: &'static str },

    #[error("line {line}: '{found}' has no object to attach to")]
    Orphan { line: usize, found: char },

    #[error("line {line}: '{kind}' object has no field {index}")]
    MissingField {
        line: usize,
        kind: char,
        index: usize,
    },

    #[error("line {line}: '{value}' is not an integer")]
    InvalidNumber { line: usize, value: String },

    #[error("unclosed list")]
    UnclosedList,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("unexpected ')' at byte {0}")]
    UnbalancedClose(usize),
}
