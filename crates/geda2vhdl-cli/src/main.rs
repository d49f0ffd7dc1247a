use clap::{Parser, Subcommand};
use env_logger::Env;

mod design;
mod output;
mod schematic;
mod symbol;

#[derive(Parser)]
#[command(name = "geda2vhdl")]
#[command(about = "Generate VHDL from gEDA symbols and schematics", long_about = None)]
struct Cli {
    /// Log progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the entity and port catalog of .sym files
    #[command(alias = "sym")]
    Symbol(symbol::SymbolArgs),

    /// Write the architecture of .sch sheets
    #[command(alias = "sch")]
    Schematic(schematic::SchematicArgs),

    /// Convert every symbol and sheet reachable from a top-level sheet
    #[command(alias = "d")]
    Design(design::DesignArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Symbol(args) => symbol::execute(args),
        Commands::Schematic(args) => schematic::execute(args),
        Commands::Design(args) => design::execute(args),
    }
}
