//! Workbook Holder
//!
//! 開いたワークブックとそのファイルパスを保持し、読み込み・保存・クローズの
//! ライフサイクルを管理するモジュール。
//!
//! 読み込みと保存はumya-spreadsheetで行い、書き込んだブロック以外の内容
//! （数式、書式、列幅、結合セル、ほかのシートなど）はそのまま残ります。
//! 保存は対象と同じディレクトリの一時ファイルに書き出してから置き換えるため、
//! 失敗しても既存のファイルは壊れません。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use umya_spreadsheet::Spreadsheet;

use crate::error::XlsxStackError;
use crate::parser::WorkbookParser;
use crate::sheet;

/// 開いたワークブックのハンドル
///
/// 読み込み後、[`WorkbookHolder::flush_and_close`] が成功するまで有効です。
pub struct WorkbookHolder {
    path: PathBuf,
    book: Spreadsheet,
    valid: bool,
}

impl WorkbookHolder {
    /// ファイルがなければ、`default_sheet` という空のシートを1つ持つワークブックを作成する
    ///
    /// 既存のファイルは変更しません。作成した場合は `true` を返します。
    pub fn ensure_exists(path: &Path, default_sheet: &str) -> Result<bool, XlsxStackError> {
        if path.exists() {
            return Ok(false);
        }

        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        book.new_sheet(default_sheet).map_err(|e| {
            XlsxStackError::Config(format!("Cannot create sheet '{}': {}", default_sheet, e))
        })?;
        save_spreadsheet(&book, path)?;
        log::debug!("created workbook {} with sheet '{}'", path.display(), default_sheet);
        Ok(true)
    }

    /// ワークブックを開く（なければ作成してから開く）
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxStackError::Io` - ファイルの作成・読み込みに失敗した場合
    /// * `XlsxStackError::Format` など - XLSXとして解析できない場合
    pub fn open(path: impl Into<PathBuf>, default_sheet: &str) -> Result<Self, XlsxStackError> {
        let path = path.into();
        Self::ensure_exists(&path, default_sheet)?;

        let buffer = fs::read(&path)?;
        let book = WorkbookParser::open(buffer)?.into_spreadsheet()?;
        log::debug!(
            "opened workbook {} ({} sheets)",
            path.display(),
            book.get_sheet_collection_no_check().len()
        );

        Ok(Self {
            path,
            book,
            valid: true,
        })
    }

    /// 書き込み先のファイルパス
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 読み込み済みで、まだ保存されていないか
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// メモリ上のワークブック
    pub fn spreadsheet(&self) -> &Spreadsheet {
        &self.book
    }

    /// メモリ上のワークブック（可変）
    pub fn spreadsheet_mut(&mut self) -> &mut Spreadsheet {
        &mut self.book
    }

    /// すべてのシート名（ファイル内の並び順）
    pub fn sheet_names(&self) -> Vec<String> {
        sheet::sheet_names(&self.book)
    }

    /// ワークブックを保存して閉じる
    ///
    /// 失敗した場合ハンドルは有効なままなので、再試行できます。
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxStackError::IllegalState` - 既に閉じたハンドルに対して呼んだ場合
    /// * `XlsxStackError::Io` / `Write` - 保存に失敗した場合
    pub fn flush_and_close(&mut self) -> Result<(), XlsxStackError> {
        if !self.valid {
            return Err(XlsxStackError::IllegalState(format!(
                "Workbook {} has already been written out",
                self.path.display()
            )));
        }

        save_spreadsheet(&self.book, &self.path)?;
        self.valid = false;
        log::info!("wrote workbook {}", self.path.display());
        Ok(())
    }
}

impl fmt::Debug for WorkbookHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkbookHolder")
            .field("path", &self.path)
            .field("sheets", &self.sheet_names())
            .field("valid", &self.valid)
            .finish()
    }
}

/// ワークブックをXLSXとして保存する（一時ファイル経由で置き換え）
fn save_spreadsheet(book: &Spreadsheet, path: &Path) -> Result<(), XlsxStackError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    umya_spreadsheet::writer::xlsx::write_writer(book, tmp.as_file_mut())
        .map_err(XlsxStackError::Write)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| XlsxStackError::Io(e.error))?;
    Ok(())
}
