use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use geda2vhdl_exporter::{default_gafrc, process_design, ExportOptions};
use log::info;

use crate::output::{report_success, OutputArgs};

#[derive(Args, Debug, Clone)]
#[command(about = "Convert a whole hierarchical design to VHDL")]
pub struct DesignArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// gafrc listing the library directories (default: ../gafrc from the top sheet)
    #[arg(short, long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub gafrc: Option<PathBuf>,

    /// Top-level sheet of the design
    #[arg(value_name = "TOP_SHEET", value_hint = clap::ValueHint::FilePath)]
    pub top: PathBuf,
}

pub fn execute(args: DesignArgs) -> Result<()> {
    let gafrc = args.gafrc.unwrap_or_else(|| default_gafrc(&args.top));
    info!("Using library paths from {}", gafrc.display());

    let options: ExportOptions = args.output.into();
    let results = process_design(&args.top, Some(&gafrc), &options)
        .with_context(|| format!("Failed to convert design {}", args.top.display()))?;

    for result in &results {
        report_success(result);
    }
    println!("{} files converted", results.len());
    Ok(())
}
