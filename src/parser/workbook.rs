//! Workbook Loader
//!
//! 既存のワークブックをumya-spreadsheetで読み込みます。セル値だけでなく数式、
//! 書式、列幅、結合セルなども保持したまま編集し、そのまま書き戻せます。

use std::io::{Cursor, Read, Seek};

use umya_spreadsheet::Spreadsheet;
use zip::ZipArchive;

use crate::error::XlsxStackError;
use crate::security::SecurityConfig;

/// XLSXとして読み込むために最低限必要なパート
const REQUIRED_PARTS: [&str; 2] = ["[Content_Types].xml", "xl/workbook.xml"];

/// ワークブックパーサー
///
/// セキュリティ検証を通過したバイト列だけをumya-spreadsheetに渡します。
pub(crate) struct WorkbookParser {
    buffer: Vec<u8>,
}

impl WorkbookParser {
    /// バイト列を検証する
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkbookParser)` - 安全なXLSXアーカイブの場合
    /// * `Err(XlsxStackError::SecurityViolation)` - サイズ制限などに違反した場合
    /// * `Err(XlsxStackError::Zip)` - ZIPとして開けない、または必要なパートがない場合
    pub fn open(buffer: Vec<u8>) -> Result<Self, XlsxStackError> {
        let security_config = SecurityConfig::default();
        security_config.check_input_size(buffer.len() as u64)?;

        {
            let mut archive = ZipArchive::new(Cursor::new(buffer.as_slice()))
                .map_err(|e| XlsxStackError::Zip(e.to_string()))?;
            security_config.check_archive(&mut archive)?;
            check_required_parts(&mut archive)?;
        }

        Ok(Self { buffer })
    }

    /// すべてのシートを読み込んだワークブックを返す
    pub fn into_spreadsheet(self) -> Result<Spreadsheet, XlsxStackError> {
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(self.buffer), true)
            .map_err(XlsxStackError::Format)?;
        log::debug!(
            "loaded {} sheets",
            book.get_sheet_collection_no_check().len()
        );
        Ok(book)
    }
}

fn check_required_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<(), XlsxStackError> {
    for part in REQUIRED_PARTS {
        if archive.by_name(part).is_err() {
            return Err(XlsxStackError::Zip(format!(
                "'{}' is missing, not an XLSX workbook",
                part
            )));
        }
    }
    Ok(())
}
