use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use xlsxstack::{run_global, ExportOptions, ExportSummary, HostContext, ResultsTable};

#[derive(Parser)]
#[command(about = "Append a results table (CSV) to an XLSX workbook, side by side or stacked.")]
struct Args {
    /// Results table as CSV (first row = headings, optional `Label` column).
    results: PathBuf,

    /// Option string, e.g. `file=[/tmp/out.xlsx] sheet=[Nuclei] stack_results`.
    #[arg(long, default_value = "")]
    options: String,

    /// Title used as the dataset label when `dataset_label=` is not given.
    #[arg(long)]
    image_title: Option<String>,

    /// Print the export summary as JSON.
    #[arg(long)]
    json: bool,
}

struct CliHost {
    image_title: Option<String>,
}

impl HostContext for CliHost {
    fn active_image_title(&self) -> Option<String> {
        self.image_title.clone()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("xlsxstack: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let table = ResultsTable::from_csv_reader(File::open(&args.results)?)?;
    let options = ExportOptions::parse(&args.options)?;
    let host = CliHost {
        image_title: args.image_title.clone(),
    };

    let summary = run_global(&options, &table, &host)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", describe(&summary));
    }
    Ok(())
}

fn describe(summary: &ExportSummary) -> String {
    match (&summary.sheet, &summary.plan) {
        (Some(sheet), Some(plan)) => format!(
            "{} rows -> {} [{}] at column {}, row {}{}",
            summary.rows_written,
            summary.file.display(),
            sheet,
            plan.col_origin,
            plan.data_row_origin,
            if summary.flushed { "" } else { " (queued)" }
        ),
        _ => format!("{:?} {}", summary.mode, summary.file.display()),
    }
}
