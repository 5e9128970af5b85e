//! Session Dispatcher
//!
//! ファイルハンドリングモードに応じて、ワークブックの読み込み・書き込み・保存を
//! 振り分けるモジュール。
//!
//! `ReadOpen` で開いたワークブックはセッションのスロットに保持され、`Queue` で
//! 書き込み、`WriteClose` で保存されます。スロットの状態遷移は次のとおりです。
//!
//! ```text
//! [empty] --ReadOpen--> [held] --Queue--> [held]
//! [held]  --WriteClose--> [empty]
//! [*]     --OpenClose--> [*]   (スロットは変化しない)
//! ```
//!
//! ホストのプラグイン実行モデルのように呼び出し間で状態を共有する場合は、
//! プロセス全体で1つの [`global_session`] を使用します。

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use umya_spreadsheet::Spreadsheet;

use crate::api::FileMode;
use crate::error::XlsxStackError;
use crate::holder::WorkbookHolder;
use crate::host::HostContext;
use crate::options::ExportOptions;
use crate::placement::{plan_placement, PlacementPlan};
use crate::results::{ResultsMatrix, ResultsSource};
use crate::sheet::resolve_sheet;
use crate::writer::write_block;

/// プロセス全体で共有するスロットの名前
pub const FILE_HOLDER_KEY: &str = "___EXCEL_FILE_HOLDER___";

static GLOBAL_SESSION: Mutex<Session> = Mutex::new(Session::new());

/// 1回の呼び出しの結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    /// 対象のワークブック
    pub file: PathBuf,

    /// 実行したモード
    pub mode: FileMode,

    /// 書き込んだシート（書き込みを行わないモードでは `None`）
    pub sheet: Option<String>,

    /// 使用した配置計画（書き込みを行わないモードでは `None`）
    pub plan: Option<PlacementPlan>,

    /// 書き込んだデータ行数
    pub rows_written: usize,

    /// ファイルに保存したか
    pub flushed: bool,
}

/// 書き込みセッション
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxstack::{ExportOptions, NullHost, ResultsTable, Session};
///
/// # fn main() -> Result<(), xlsxstack::XlsxStackError> {
/// let mut table = ResultsTable::new(vec!["Area".to_string()]);
/// table.add_row(None, vec!["42".to_string()]);
///
/// let mut session = Session::new();
/// session.run(
///     &ExportOptions::parse("file=[/tmp/out.xlsx] file_mode=read_and_open")?,
///     &table,
///     &NullHost,
/// )?;
/// for _ in 0..3 {
///     session.run(
///         &ExportOptions::parse("file=[/tmp/out.xlsx] file_mode=queue_write")?,
///         &table,
///         &NullHost,
///     )?;
/// }
/// session.run(
///     &ExportOptions::parse("file=[/tmp/out.xlsx] file_mode=write_and_close")?,
///     &table,
///     &NullHost,
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct Session {
    slot: Option<WorkbookHolder>,
}

impl Session {
    /// スロットが空のセッションを生成
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// スロットにワークブックを保持しているか
    pub fn is_holding(&self) -> bool {
        self.slot.is_some()
    }

    /// スロットに保持しているワークブック
    pub fn held(&self) -> Option<&WorkbookHolder> {
        self.slot.as_ref()
    }

    /// 1回の呼び出しを実行する
    ///
    /// エラーは `log::error!` で報告したうえで呼び出し元に返します。
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxStackError::IllegalState` - 保持中に `ReadOpen`、空のときに `WriteClose` した場合
    /// * そのほか読み込み・書き込み・保存の各段階のエラー
    pub fn run(
        &mut self,
        options: &ExportOptions,
        results: &dyn ResultsSource,
        host: &dyn HostContext,
    ) -> Result<ExportSummary, XlsxStackError> {
        self.dispatch(options, results, host).map_err(|err| {
            log::error!(
                "export to {} failed ({:?}): {}",
                options.file_path.display(),
                err.kind(),
                err
            );
            err
        })
    }

    fn dispatch(
        &mut self,
        options: &ExportOptions,
        results: &dyn ResultsSource,
        host: &dyn HostContext,
    ) -> Result<ExportSummary, XlsxStackError> {
        match options.file_mode {
            FileMode::WriteClose => self.write_close(),
            FileMode::ReadOpen => self.read_open(options),
            FileMode::Queue => match self.slot.as_mut() {
                Some(holder) => {
                    if holder.path() != options.file_path.as_path() {
                        log::warn!(
                            "queued results go to the open workbook {}, not {}",
                            holder.path().display(),
                            options.file_path.display()
                        );
                    }
                    let written = write_results(holder.spreadsheet_mut(), options, results, host)?;
                    Ok(written.into_summary(holder.path().to_path_buf(), FileMode::Queue, false))
                }
                None => {
                    log::debug!("no workbook in {}, writing immediately", FILE_HOLDER_KEY);
                    open_close(options, results, host, FileMode::Queue)
                }
            },
            FileMode::OpenClose => open_close(options, results, host, FileMode::OpenClose),
        }
    }

    fn read_open(&mut self, options: &ExportOptions) -> Result<ExportSummary, XlsxStackError> {
        if self.slot.is_some() {
            return Err(XlsxStackError::IllegalState(
                "There's already an excel file open.".to_string(),
            ));
        }

        let holder = WorkbookHolder::open(&options.file_path, options.sheet.name_for_new_sheet())?;
        log::debug!("{} <- {}", FILE_HOLDER_KEY, holder.path().display());
        let file = holder.path().to_path_buf();
        self.slot = Some(holder);

        Ok(ExportSummary {
            file,
            mode: FileMode::ReadOpen,
            sheet: None,
            plan: None,
            rows_written: 0,
            flushed: false,
        })
    }

    fn write_close(&mut self) -> Result<ExportSummary, XlsxStackError> {
        let holder = self.slot.as_mut().ok_or_else(|| {
            XlsxStackError::IllegalState("No excel file open to close.".to_string())
        })?;

        // 失敗した場合はスロットに残し、再試行できるようにする
        holder.flush_and_close()?;
        let file = holder.path().to_path_buf();
        self.slot = None;
        log::debug!("{} cleared", FILE_HOLDER_KEY);

        Ok(ExportSummary {
            file,
            mode: FileMode::WriteClose,
            sheet: None,
            plan: None,
            rows_written: 0,
            flushed: true,
        })
    }
}

/// プロセス全体で共有するセッション
pub fn global_session() -> &'static Mutex<Session> {
    &GLOBAL_SESSION
}

/// プロセス全体で共有するセッションで1回の呼び出しを実行する
pub fn run_global(
    options: &ExportOptions,
    results: &dyn ResultsSource,
    host: &dyn HostContext,
) -> Result<ExportSummary, XlsxStackError> {
    // 前回の呼び出しがパニックしても、スロットの中身は整合している
    let mut session = global_session()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    session.run(options, results, host)
}

/// 書き込みの結果
struct Written {
    sheet: String,
    plan: PlacementPlan,
    rows: usize,
}

impl Written {
    fn into_summary(self, file: PathBuf, mode: FileMode, flushed: bool) -> ExportSummary {
        ExportSummary {
            file,
            mode,
            sheet: Some(self.sheet),
            plan: Some(self.plan),
            rows_written: self.rows,
            flushed,
        }
    }
}

/// 開く → 書き込む → 保存して閉じる
fn open_close(
    options: &ExportOptions,
    results: &dyn ResultsSource,
    host: &dyn HostContext,
    mode: FileMode,
) -> Result<ExportSummary, XlsxStackError> {
    let mut holder = WorkbookHolder::open(&options.file_path, options.sheet.name_for_new_sheet())?;
    let written = write_results(holder.spreadsheet_mut(), options, results, host)?;
    holder.flush_and_close()?;
    Ok(written.into_summary(holder.path().to_path_buf(), mode, true))
}

/// 結果テーブルを読み取り、シートを決めて1ブロック書き込む
fn write_results(
    book: &mut Spreadsheet,
    options: &ExportOptions,
    results: &dyn ResultsSource,
    host: &dyn HostContext,
) -> Result<Written, XlsxStackError> {
    let matrix = ResultsMatrix::snapshot(results);
    let label = options.resolve_dataset_label(host.active_image_title());

    let index = resolve_sheet(book, &options.sheet)?;
    let sheet = book.get_sheet_collection_mut().get_mut(index).ok_or_else(|| {
        XlsxStackError::IllegalState(format!("Sheet index {} is out of range", index))
    })?;

    let plan = plan_placement(
        sheet,
        matrix.width(),
        matrix.row_count(),
        options.no_count_column,
        options.layout,
    )?;
    write_block(sheet, &plan, &matrix, &label, host)?;

    Ok(Written {
        sheet: sheet.get_name().to_string(),
        plan,
        rows: matrix.row_count(),
    })
}
