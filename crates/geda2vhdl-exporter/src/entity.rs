//! Entity declarations.

use std::fmt;

use geda2vhdl_eda::Symbol;
use itertools::Itertools;

use crate::naming::vhdl_identifier;
use crate::INDENT;

/// `library` and `use` clauses of a design unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Libraries<'a> {
    library: &'a str,
    std_logic: bool,
    numeric: bool,
}

impl<'a> Libraries<'a> {
    /// Clauses needed by ports and signals of the given types.
    pub fn for_types<'t>(library: &'a str, types: impl IntoIterator<Item = &'t str>) -> Self {
        let mut clauses = Self {
            library,
            std_logic: false,
            numeric: false,
        };
        for ty in types {
            let ty = ty.to_ascii_lowercase();
            if ty.starts_with("std_logic") || ty.starts_with("std_ulogic") {
                clauses.std_logic = true;
            }
            if ty == "signed" || ty == "unsigned" {
                clauses.numeric = true;
            }
        }
        clauses
    }
}

impl fmt::Display for Libraries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "library {};", self.library)?;
        if self.std_logic || self.numeric {
            writeln!(f, "library ieee;")?;
        }
        if self.std_logic {
            writeln!(f, "{INDENT}use ieee.std_logic_1164.all;")?;
        }
        if self.numeric {
            writeln!(f, "{INDENT}use ieee.numeric_std.all;")?;
        }
        writeln!(f)
    }
}

/// The entity declared by a symbol.
pub struct EntityDecl<'a> {
    pub symbol: &'a Symbol,
    pub library: &'a str,
}

impl fmt::Display for EntityDecl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.symbol;
        let entity = vhdl_identifier(&symbol.name);

        let types = symbol.ports.iter().map(|p| p.port_type.as_str());
        write!(f, "{}", Libraries::for_types(self.library, types))?;

        writeln!(f, "entity {entity} is")?;
        if !symbol.generics.is_empty() {
            writeln!(f, "{INDENT}generic (")?;
            let generics = symbol
                .generics
                .iter()
                .map(|g| format!("{INDENT}{INDENT}{g}"))
                .join(";\n");
            writeln!(f, "{generics}")?;
            writeln!(f, "{INDENT});")?;
        }
        if !symbol.ports.is_empty() {
            writeln!(f, "{INDENT}port (")?;
            let ports = symbol
                .ports
                .iter()
                .map(|p| {
                    format!(
                        "{INDENT}{INDENT}{} : {} {}",
                        p.name,
                        p.direction,
                        p.subtype()
                    )
                })
                .join(";\n");
            writeln!(f, "{ports}")?;
            writeln!(f, "{INDENT});")?;
        }
        writeln!(f, "end {entity};")
    }
}

pub fn render_entity(symbol: &Symbol, library: &str) -> String {
    EntityDecl { symbol, library }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geda2vhdl_netlist::{Point, Port, PortDirection};

    fn port(name: &str, ty: &str, range: &str, direction: PortDirection) -> Port {
        Port {
            name: name.to_string(),
            port_type: ty.to_string(),
            range: range.to_string(),
            direction,
            offset: Point::new(0, 0),
        }
    }

    #[test]
    fn counter_entity() {
        let symbol = Symbol {
            name: "lib-counter".to_string(),
            generics: vec!["width : positive := 8".to_string()],
            ports: vec![
                port("clock", "std_ulogic", "", PortDirection::In),
                port("count", "unsigned", "width-1 downto 0", PortDirection::Out),
            ],
        };
        insta::assert_snapshot!(render_entity(&symbol, "lib"), @r###"
        library lib;
        library ieee;
          use ieee.std_logic_1164.all;
          use ieee.numeric_std.all;

        entity lib_counter is
          generic (
            width : positive := 8
          );
          port (
            clock : in std_ulogic;
            count : out unsigned(width-1 downto 0)
          );
        end lib_counter;
        "###);
    }

    #[test]
    fn entity_without_interface() {
        let symbol = Symbol {
            name: "lib-logo".to_string(),
            ..Symbol::default()
        };
        assert_eq!(
            render_entity(&symbol, "work"),
            "library work;\n\nentity lib_logo is\nend lib_logo;\n"
        );
    }

    #[test]
    fn ieee_only_when_needed() {
        let symbol = Symbol {
            name: "lib-b".to_string(),
            generics: Vec::new(),
            ports: vec![port("a", "bit", "", PortDirection::Inout)],
        };
        let text = render_entity(&symbol, "lib");
        assert!(!text.contains("ieee"));
        assert!(text.contains("    a : inout bit\n"));
    }
}
