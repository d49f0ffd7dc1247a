use std::path::{Path, PathBuf};

use clap::Args;
use colored::Colorize;
use geda2vhdl_exporter::{ExportError, ExportOptions, ExportResult};

/// Where generated files go, shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// VHDL library name (default: taken from each file name)
    #[arg(short, long)]
    pub library: Option<String>,

    /// Output directory (default: the Description directory next to the source directory)
    #[arg(short, long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub directory: Option<PathBuf>,

    /// Directory where port catalogs are exchanged between symbols and sheets
    #[arg(short, long, value_name = "DIR", default_value = "/tmp")]
    pub scratch: PathBuf,
}

impl From<OutputArgs> for ExportOptions {
    fn from(args: OutputArgs) -> Self {
        ExportOptions {
            library: args.library,
            output_dir: args.directory,
            scratch_dir: args.scratch,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn report_success(result: &ExportResult) {
    println!(
        "{} {} ({})",
        "✓".green(),
        file_name(&result.source_file).green().bold(),
        result.vhdl_file.display()
    );
}

pub fn report_failure(path: &Path, error: &ExportError) {
    println!("{} {}: conversion failed", "✗".red(), file_name(path).red().bold());
    eprintln!("  Error: {error}");
}

/// Convert each file in turn, reporting as we go.
pub fn convert_each(
    paths: &[PathBuf],
    options: &ExportOptions,
    convert: fn(&Path, &ExportOptions) -> Result<ExportResult, ExportError>,
) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in paths {
        match convert(path, options) {
            Ok(result) => report_success(&result),
            Err(e) => {
                report_failure(path, &e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} files failed to convert", paths.len());
    }
    Ok(())
}
