use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use geda2vhdl_exporter::process_schematic;

use crate::output::{convert_each, OutputArgs};

#[derive(Args, Debug, Clone)]
#[command(about = "Generate VHDL architectures from gEDA schematics")]
pub struct SchematicArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// One or more .sch files; every symbol they place must already be converted
    #[arg(value_name = "SHEETS", required = true, value_hint = clap::ValueHint::FilePath)]
    pub paths: Vec<PathBuf>,
}

pub fn execute(args: SchematicArgs) -> Result<()> {
    convert_each(&args.paths, &args.output.into(), process_schematic)
}
