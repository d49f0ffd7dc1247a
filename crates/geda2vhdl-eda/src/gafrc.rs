//! Library directories declared in a `gafrc` file.
//!
//! A `gafrc` is Scheme code. Only the forms gEDA projects use to declare
//! libraries are evaluated:
//!
//! ```scheme
//! (define lib-dir "../Libraries")
//! (component-library-search (build-path lib-dir "Symbols"))
//! (source-library (build-path (getenv "HOME") "Schematics"))
//! ```
//!
//! Anything else is skipped.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use geda2vhdl_format::{ParseError, Sexpr};
use log::debug;
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum GafrcError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cannot evaluate {form}: {reason}")]
    Eval { form: String, reason: String },
}

/// Where symbols and sheets are looked up, in search order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPaths {
    pub symbol_dirs: Vec<PathBuf>,
    pub schematic_dirs: Vec<PathBuf>,
}

impl LibraryPaths {
    pub fn from_gafrc(path: &Path) -> Result<Self, GafrcError> {
        let text = fs::read_to_string(path).map_err(|source| GafrcError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        debug!("Reading library paths from {}", path.display());
        Self::parse(&text, base)
    }

    /// Evaluate gafrc text; relative directories resolve against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self, GafrcError> {
        let mut eval = Evaluator {
            base,
            defines: HashMap::new(),
            paths: LibraryPaths::default(),
        };
        for expr in geda2vhdl_format::parse_scheme(text)? {
            eval.statement(&expr)?;
        }
        Ok(eval.paths)
    }

    pub fn add_symbol_dir(&mut self, dir: PathBuf) {
        if !self.symbol_dirs.contains(&dir) {
            debug!("Symbol directory {}", dir.display());
            self.symbol_dirs.push(dir);
        }
    }

    pub fn add_schematic_dir(&mut self, dir: PathBuf) {
        if !self.schematic_dirs.contains(&dir) {
            debug!("Schematic directory {}", dir.display());
            self.schematic_dirs.push(dir);
        }
    }

    /// First symbol directory holding `file_name`.
    pub fn find_symbol(&self, file_name: &str) -> Option<PathBuf> {
        find_in(&self.symbol_dirs, file_name)
    }

    /// First schematic directory holding `file_name`.
    pub fn find_schematic(&self, file_name: &str) -> Option<PathBuf> {
        find_in(&self.schematic_dirs, file_name)
    }
}

fn find_in(dirs: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

struct Evaluator<'a> {
    base: &'a Path,
    defines: HashMap<String, String>,
    paths: LibraryPaths,
}

impl Evaluator<'_> {
    fn statement(&mut self, expr: &Sexpr) -> Result<(), GafrcError> {
        let Some((head, args)) = expr.as_form() else {
            debug!("gafrc: skipping {expr}");
            return Ok(());
        };

        match head {
            "define" => {
                let [name, value] = args else {
                    return Err(eval_error(expr, "expected (define name value)"));
                };
                let name = name
                    .as_symbol()
                    .ok_or_else(|| eval_error(expr, "name is not a symbol"))?;
                let value = self.value(value)?;
                self.defines.insert(name.to_string(), value);
            }
            "component-library" => {
                let dir = self.dir_argument(expr, args)?;
                self.paths.add_symbol_dir(dir);
            }
            "component-library-search" => {
                let dir = self.dir_argument(expr, args)?;
                for found in with_subdirs(&dir) {
                    self.paths.add_symbol_dir(found);
                }
            }
            "source-library" => {
                let dir = self.dir_argument(expr, args)?;
                self.paths.add_schematic_dir(dir);
            }
            _ => debug!("gafrc: skipping {expr}"),
        }
        Ok(())
    }

    fn dir_argument(&self, form: &Sexpr, args: &[Sexpr]) -> Result<PathBuf, GafrcError> {
        let first = args
            .first()
            .ok_or_else(|| eval_error(form, "missing directory"))?;
        let dir = PathBuf::from(self.value(first)?);
        Ok(if dir.is_absolute() {
            dir
        } else {
            self.base.join(dir)
        })
    }

    fn value(&self, expr: &Sexpr) -> Result<String, GafrcError> {
        match expr {
            Sexpr::String(s) => Ok(s.clone()),
            Sexpr::Symbol(name) => self
                .defines
                .get(name)
                .cloned()
                .ok_or_else(|| eval_error(expr, "undefined symbol")),
            Sexpr::List(_) => {
                let Some((head, args)) = expr.as_form() else {
                    return Err(eval_error(expr, "not a call"));
                };
                match head {
                    "build-path" => {
                        let mut path = PathBuf::new();
                        for arg in args {
                            path.push(self.value(arg)?);
                        }
                        Ok(path.to_string_lossy().into_owned())
                    }
                    "getenv" => {
                        let [var] = args else {
                            return Err(eval_error(expr, "expected (getenv name)"));
                        };
                        let var = self.value(var)?;
                        std::env::var(&var)
                            .map_err(|_| eval_error(expr, &format!("{var} is not set")))
                    }
                    "quote" => args
                        .first()
                        .and_then(Sexpr::as_symbol)
                        .map(str::to_string)
                        .ok_or_else(|| eval_error(expr, "cannot quote")),
                    _ => Err(eval_error(expr, "unsupported procedure")),
                }
            }
        }
    }
}

fn eval_error(form: &Sexpr, reason: &str) -> GafrcError {
    GafrcError::Eval {
        form: form.to_string(),
        reason: reason.to_string(),
    }
}

/// `dir` followed by every directory below it, depth first, sorted by name.
///
/// Symbolic links are not followed.
fn with_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut found = vec![dir.to_path_buf()];
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => found.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!("gafrc: cannot search {}: {e}", dir.display()),
        }
    }
    found
}
