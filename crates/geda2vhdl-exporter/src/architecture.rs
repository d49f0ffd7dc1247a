//! Architecture bodies of schematic sheets.

use std::collections::{HashMap, HashSet};
use std::fmt;

use geda2vhdl_netlist::{Instance, Netlist};
use itertools::Itertools;
use log::warn;

use crate::entity::Libraries;
use crate::naming::vhdl_identifier;
use crate::INDENT;

/// Text block whose body goes before the signal declarations.
pub const ARCHITECTURE_START: &str = "architecture start";
/// Text block whose body goes after the instances.
pub const EMBEDDED_CODE: &str = "embedded code";

/// The architecture of `entity` described by a sheet.
pub struct ArchitectureBody<'a> {
    pub netlist: &'a Netlist,
    pub library: &'a str,
    pub entity: &'a str,
    pub architecture: &'a str,
}

impl fmt::Display for ArchitectureBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let netlist = self.netlist;
        let signals: Vec<_> = netlist
            .signals
            .iter()
            .filter(|signal| {
                if signal.signal_type.is_empty() {
                    warn!("signal {} has no type, not declaring it", signal.name);
                    false
                } else {
                    true
                }
            })
            .collect();

        let types = signals
            .iter()
            .map(|s| s.signal_type.as_str())
            .chain(
                netlist
                    .instances
                    .iter()
                    .flat_map(|i| i.ports.iter().map(|p| p.port_type.as_str())),
            );
        write!(f, "{}", Libraries::for_types(self.library, types))?;

        writeln!(f, "architecture {} of {} is", self.architecture, self.entity)?;

        for body in netlist.text_blocks_with(ARCHITECTURE_START) {
            writeln!(f)?;
            write_code(f, body)?;
        }

        if !signals.is_empty() {
            writeln!(f)?;
            for signal in &signals {
                writeln!(f, "{INDENT}signal {} : {};", signal.name, signal.subtype())?;
            }
        }

        if !netlist.instances.is_empty() {
            writeln!(f)?;
            let mut declared = HashSet::new();
            for instance in &netlist.instances {
                if declared.insert(instance.component.name.as_str()) {
                    write_declaration(f, instance)?;
                }
            }
        }

        writeln!(f, "begin")?;

        if !netlist.instances.is_empty() {
            writeln!(f)?;
            let mut unnamed: HashMap<&str, usize> = HashMap::new();
            for (index, instance) in netlist.instances.iter().enumerate() {
                let component = vhdl_identifier(&instance.component.name);
                let label = if instance.component.label.is_empty() {
                    let n = unnamed.entry(instance.component.name.as_str()).or_insert(0);
                    *n += 1;
                    format!("{component}_{n}")
                } else {
                    instance.component.label.clone()
                };
                write_instance(f, netlist, index, &label, &component)?;
                writeln!(f)?;
            }
        }

        for body in netlist.text_blocks_with(EMBEDDED_CODE) {
            write_code(f, body)?;
            writeln!(f)?;
        }

        writeln!(f, "end {};", self.architecture)
    }
}

fn write_code(f: &mut fmt::Formatter<'_>, body: &str) -> fmt::Result {
    for line in body.lines() {
        writeln!(f, "{INDENT}{line}")?;
    }
    Ok(())
}

fn write_declaration(f: &mut fmt::Formatter<'_>, instance: &Instance) -> fmt::Result {
    let component = vhdl_identifier(&instance.component.name);
    writeln!(f, "{INDENT}component {component}")?;

    let generics = &instance.component.generics;
    if !generics.is_empty() {
        writeln!(f, "{INDENT}{INDENT}generic(")?;
        let lines = generics
            .iter()
            .map(|g| format!("{INDENT}{INDENT}{INDENT}{g}"))
            .join(";\n");
        writeln!(f, "{lines}")?;
        writeln!(f, "{INDENT}{INDENT});")?;
    }

    if !instance.ports.is_empty() {
        writeln!(f, "{INDENT}{INDENT}port(")?;
        let lines = instance
            .ports
            .iter()
            .map(|p| {
                format!(
                    "{INDENT}{INDENT}{INDENT}{} : {} {}",
                    p.name,
                    p.direction,
                    p.subtype()
                )
            })
            .join(";\n");
        writeln!(f, "{lines}")?;
        writeln!(f, "{INDENT}{INDENT});")?;
    }

    writeln!(f, "{INDENT}end component {component};")?;
    writeln!(f)
}

fn write_instance(
    f: &mut fmt::Formatter<'_>,
    netlist: &Netlist,
    index: usize,
    label: &str,
    component: &str,
) -> fmt::Result {
    let instance = &netlist.instances[index];
    write!(f, "{INDENT}{label} : {component}")?;

    let generics = &instance.component.generics;
    if !generics.is_empty() {
        writeln!(f)?;
        writeln!(f, "{INDENT}{INDENT}generic map(")?;
        let lines = generics
            .iter()
            .map(|g| {
                let (name, value) = generic_mapping(g);
                format!("{INDENT}{INDENT}{INDENT}{name} => {value}")
            })
            .join(",\n");
        writeln!(f, "{lines}")?;
        write!(f, "{INDENT}{INDENT})")?;
    }

    if !instance.ports.is_empty() {
        writeln!(f)?;
        writeln!(f, "{INDENT}{INDENT}port map(")?;
        let lines = instance
            .ports
            .iter()
            .map(|p| {
                format!(
                    "{INDENT}{INDENT}{INDENT}{} => {}",
                    p.name,
                    netlist.net_for(index, &p.name)
                )
            })
            .join(",\n");
        writeln!(f, "{lines}")?;
        write!(f, "{INDENT}{INDENT})")?;
    }

    writeln!(f, ";")
}

/// `width : positive := 8` maps as `width => 8`.
pub fn generic_mapping(generic: &str) -> (&str, &str) {
    let name = generic.split(':').next().unwrap_or(generic).trim();
    let value = generic
        .rsplit(':')
        .next()
        .unwrap_or(generic)
        .trim_start_matches(['=', ' '])
        .trim_end();
    (name, value)
}

pub fn render_architecture(
    netlist: &Netlist,
    library: &str,
    entity: &str,
    architecture: &str,
) -> String {
    ArchitectureBody {
        netlist,
        library,
        entity,
        architecture,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geda2vhdl_netlist::{build_netlist, InMemoryCatalog, Point, Port, PortDirection, Sheet};

    fn port(name: &str, ty: &str, range: &str, direction: PortDirection, at: (i64, i64)) -> Port {
        Port {
            name: name.to_string(),
            port_type: ty.to_string(),
            range: range.to_string(),
            direction,
            offset: Point::from(at),
        }
    }

    const SHEET: &str = "v 20130925 2
C 1000 1000 1 0 0 lib-reg.sym
{
T 0 0 5 10 1 1 0 0 1
refdes=U1
T 0 0 5 10 0 0 0 0 1
generic=width : positive := 4
}
C 3000 1000 1 0 0 lib-reg.sym
{
T 0 0 5 10 0 0 0 0 1
generic=width : positive := 4
}
N 1000 1200 1000 2000 4
{
T 0 0 5 10 1 1 0 0 1
netname=clock
}
N 1000 1500 3000 1500 4
N 3000 1500 3000 1200 4
N 1800 1200 2400 1200 4
N 2400 1200 2400 1400 4
{
T 0 0 5 10 1 1 0 0 1
netname=stray
}
T 500 500 9 10 1 0 0 0 2
architecture start
constant zero : natural := 0;
T 600 500 9 10 1 0 0 0 2
embedded code
done <= '1';
";

    fn netlist() -> Netlist {
        let catalog = InMemoryCatalog::new().with(
            "lib-reg",
            vec![
                port("clk", "std_ulogic", "", PortDirection::In, (0, 200)),
                port("q", "unsigned", "width-1 downto 0", PortDirection::Out, (800, 200)),
                port("en", "std_ulogic", "", PortDirection::In, (0, 400)),
            ],
        );
        let sheet: Sheet = SHEET.parse().unwrap();
        build_netlist(sheet, &catalog).unwrap()
    }

    #[test]
    fn register_pair_architecture() {
        let text = render_architecture(&netlist(), "lib", "lib_pair", "struct");
        insta::assert_snapshot!(text, @r###"
        library lib;
        library ieee;
          use ieee.std_logic_1164.all;
          use ieee.numeric_std.all;

        architecture struct of lib_pair is

          constant zero : natural := 0;

          signal clock : std_ulogic;
          signal stray : unsigned(width-1 downto 0);

          component lib_reg
            generic(
              width : positive := 4
            );
            port(
              clk : in std_ulogic;
              q : out unsigned(width-1 downto 0);
              en : in std_ulogic
            );
          end component lib_reg;

        begin

          U1 : lib_reg
            generic map(
              width => 4
            )
            port map(
              clk => clock,
              q => stray,
              en => open
            );

          lib_reg_1 : lib_reg
            generic map(
              width => 4
            )
            port map(
              clk => clock,
              q => open,
              en => open
            );

          done <= '1';

        end struct;
        "###);
    }

    #[test]
    fn untyped_signals_are_not_declared() {
        let mut netlist = netlist();
        netlist.signals.push(geda2vhdl_netlist::Signal::new("floating"));
        let text = render_architecture(&netlist, "lib", "lib_pair", "struct");
        assert!(!text.contains("floating"));
    }

    #[test]
    fn instance_without_generics_or_ports() {
        let catalog = InMemoryCatalog::new().with("lib-logo", Vec::new());
        let sheet: Sheet = "C 0 0 1 0 0 lib-logo.sym\n".parse().unwrap();
        let netlist = build_netlist(sheet, &catalog).unwrap();
        assert_eq!(
            render_architecture(&netlist, "work", "lib_top", "empty"),
            "library work;

architecture empty of lib_top is

  component lib_logo
  end component lib_logo;

begin

  lib_logo_1 : lib_logo;

end empty;
"
        );
    }

    #[test]
    fn generic_mapping_takes_name_and_default() {
        assert_eq!(generic_mapping("width : positive := 8"), ("width", "8"));
        assert_eq!(generic_mapping("delay:time:=5 ns"), ("delay", "5 ns"));
        assert_eq!(generic_mapping("n"), ("n", "n"));
    }
}
