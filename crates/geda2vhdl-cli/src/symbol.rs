use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use geda2vhdl_exporter::process_symbol;

use crate::output::{convert_each, OutputArgs};

#[derive(Args, Debug, Clone)]
#[command(about = "Generate VHDL entities from gEDA symbols")]
pub struct SymbolArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// One or more .sym files
    #[arg(value_name = "SYMBOLS", required = true, value_hint = clap::ValueHint::FilePath)]
    pub paths: Vec<PathBuf>,
}

pub fn execute(args: SymbolArgs) -> Result<()> {
    convert_each(&args.paths, &args.output.into(), process_symbol)
}
