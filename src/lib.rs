//! xlsxstack - Append measurement results tables to an Excel workbook
//!
//! This crate writes results tables (headers plus rows of string cells, as
//! produced by image-analysis measurements) into an XLSX workbook on disk, so
//! that the results of many independent runs accumulate in a single document
//! without ever overwriting each other.
//!
//! Each run writes one *block*: a bold dataset label in row 0, bold column
//! headers in row 1 and the data from row 2 downwards, optionally preceded by a
//! 1-based `Count` column. Blocks are placed either side by side with one empty
//! gutter column ([`LayoutMode::Adjacent`]) or appended below the previous block
//! in the same column band ([`LayoutMode::Stack`]).
//!
//! Existing workbooks are edited in place: everything outside the new block
//! (other sheets, formulas, number formats, column widths, merged cells) is
//! written back unchanged.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxstack::{run_global, ExportOptions, NullHost, ResultsTable};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut table = ResultsTable::new(vec!["Area".to_string(), "Mean".to_string()]);
//!     table.add_row(None, vec!["433".to_string(), "255".to_string()]);
//!     table.add_row(None, vec!["185".to_string(), "254.5".to_string()]);
//!
//!     let options = ExportOptions::parse("file=[/tmp/results.xlsx] dataset_label=[plate 1]")?;
//!     let summary = run_global(&options, &table, &NullHost)?;
//!     println!("wrote {} rows to sheet {:?}", summary.rows_written, summary.sheet);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Stacking Runs
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxstack::{ExportOptionsBuilder, LayoutMode, NullHost, ResultsTable, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = ResultsTable::from_csv_reader(File::open("Results.csv")?)?;
//!
//!     let options = ExportOptionsBuilder::new()
//!         .with_file_path("/tmp/results.xlsx")
//!         .with_sheet_name("Nuclei")
//!         .with_layout(LayoutMode::Stack)
//!         .build()?;
//!
//!     let mut session = Session::new();
//!     session.run(&options, &table, &NullHost)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Batching Many Tables
//!
//! `file_mode=read_and_open` keeps the workbook in memory, `file_mode=queue_write`
//! appends to it without saving and `file_mode=write_and_close` saves it once.
//! See [`Session`] for the slot state machine.

mod api;
mod error;
mod holder;
mod host;
mod options;
mod parser;
mod placement;
mod results;
mod security;
mod session;
mod sheet;
mod types;
mod writer;

/// 新しく作成するシートのデフォルト名
pub const DEFAULT_SHEET_NAME: &str = "A";

// 公開API
pub use api::{FileMode, LayoutMode, SheetSelector};
pub use error::{ErrorKind, XlsxStackError};
pub use holder::WorkbookHolder;
pub use host::{HostContext, NullHost};
pub use options::{
    default_file_path, sanitize_sheet_name, ExportOptions, ExportOptionsBuilder,
    MAX_SHEET_NAME_LEN,
};
pub use placement::{
    plan_placement, PlacementPlan, FIRST_DATA_ROW, HEADER_ROW, LABEL_ROW, MAX_COL_INDEX,
    MAX_ROW_INDEX,
};
pub use results::{ResultsMatrix, ResultsSource, ResultsTable, LABEL_HEADING, MISSING_LABEL};
pub use session::{global_session, run_global, ExportSummary, Session, FILE_HOLDER_KEY};
pub use sheet::{resolve_sheet, sheet_index, sheet_names};
pub use types::{Cell, CellCoord, CellValue, SheetGrid, Worksheet};
pub use writer::{classify_datum, write_block, WriteStats, COUNT_HEADING};

pub use umya_spreadsheet::Spreadsheet;
