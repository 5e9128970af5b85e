//! Parser Module
//!
//! umya-spreadsheetを使用した既存ワークブックの読み込み。
//! 読み込む前に、ZIPアーカイブとしての安全性とXLSXとしての最低限の構成を確認します。

mod workbook;

pub(crate) use workbook::WorkbookParser;
