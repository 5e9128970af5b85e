//! Sheet Resolver
//!
//! 書き込み先のシートを決定し、umya-spreadsheetのシートを [`SheetGrid`] として
//! 扱えるようにするモジュール。
//!
//! umya-spreadsheetの座標は `(列, 行)` の1始まりなので、ここで0始まりの
//! `(行, 列)` に変換します。

use umya_spreadsheet::{Spreadsheet, Worksheet as XlsxSheet};

use crate::api::SheetSelector;
use crate::error::XlsxStackError;
use crate::types::{Cell, CellValue, SheetGrid};

/// 書き込み先のシートを返す（必要なら作成する）
///
/// 1. シートが1つもなければ、要求された名前で作成する
/// 2. [`SheetSelector::Last`] なら最後のシート
/// 3. 同名（大文字小文字を区別しない）のシートがあればそれ、なければ作成する
///
/// 戻り値はワークブック内のシートインデックスです。
pub fn resolve_sheet(
    book: &mut Spreadsheet,
    selector: &SheetSelector,
) -> Result<usize, XlsxStackError> {
    let sheet_count = book.get_sheet_collection_no_check().len();
    if sheet_count == 0 {
        return push_new_sheet(book, selector.name_for_new_sheet());
    }

    match selector {
        SheetSelector::Last => Ok(sheet_count - 1),
        SheetSelector::Name(name) => match sheet_index(book, name) {
            Some(index) => Ok(index),
            None => push_new_sheet(book, name),
        },
    }
}

/// シート名からインデックスを検索（Excelと同様に大文字小文字を区別しない）
pub fn sheet_index(book: &Spreadsheet, name: &str) -> Option<usize> {
    let wanted = name.to_lowercase();
    book.get_sheet_collection_no_check()
        .iter()
        .position(|sheet| sheet.get_name().to_lowercase() == wanted)
}

/// ワークブック内のすべてのシート名（ファイル内の並び順）
pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection_no_check()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect()
}

fn push_new_sheet(book: &mut Spreadsheet, name: &str) -> Result<usize, XlsxStackError> {
    log::debug!("creating sheet '{}'", name);
    book.new_sheet(name)
        .map_err(|e| XlsxStackError::Config(format!("Cannot create sheet '{}': {}", name, e)))?;
    Ok(book.get_sheet_collection_no_check().len() - 1)
}

impl SheetGrid for XlsxSheet {
    fn row_end(&self, row: u32) -> Option<u32> {
        let wanted = row + 1;
        self.get_cell_collection()
            .iter()
            .filter(|cell| *cell.get_coordinate().get_row_num() == wanted)
            .map(|cell| *cell.get_coordinate().get_col_num())
            .max()
    }

    fn is_occupied(&self, row: u32, col: u32) -> bool {
        self.get_cell((col + 1, row + 1)).is_some()
    }

    fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        let target = self.get_cell_mut((col + 1, row + 1));
        match cell.value {
            CellValue::Number(n) => {
                target.set_value_number(n);
            }
            CellValue::Text(s) => {
                target.set_value_string(s);
            }
            CellValue::Bool(b) => {
                target.set_value_bool(b);
            }
        }
        if cell.bold {
            target.get_style_mut().get_font_mut().set_bold(true);
        }
    }
}
