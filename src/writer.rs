//! Block Writer
//!
//! 配置計画に従って、データセットラベル・列見出し・データをシートに書き込むモジュール。
//!
//! 書き込み順序はラベル → 見出し → データ（行優先）です。データはすべて
//! 書き込み前に検証するため、数値の解析に失敗した場合シートは変更されません。

use crate::error::XlsxStackError;
use crate::host::HostContext;
use crate::placement::PlacementPlan;
use crate::results::ResultsMatrix;
use crate::types::{Cell, CellValue, SheetGrid};

/// Count列の見出し
pub const COUNT_HEADING: &str = "Count";

/// 1ブロックの書き込み結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStats {
    /// 書き込んだ見出しセル数
    pub header_cells: usize,
    /// 書き込んだデータセル数（Count列を含む）
    pub data_cells: usize,
}

/// データ文字列を数値または文字列に分類する
///
/// 英字（`A-Z` / `a-z`）を1文字でも含めば文字列、そうでなければ
/// 前後の空白を除いて10進数として解析します。解析できない場合は `None` を返します。
///
/// ```rust
/// use xlsxstack::{classify_datum, CellValue};
///
/// assert_eq!(classify_datum("1.5"), Some(CellValue::Number(1.5)));
/// assert_eq!(classify_datum("foo"), Some(CellValue::Text("foo".to_string())));
/// assert_eq!(classify_datum("1e3"), Some(CellValue::Text("1e3".to_string())));
/// assert_eq!(classify_datum("1.2.3"), None);
/// ```
pub fn classify_datum(value: &str) -> Option<CellValue> {
    if value.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some(CellValue::Text(value.to_string()));
    }
    value.trim().parse::<f64>().ok().map(CellValue::Number)
}

/// 1ブロックを書き込む
///
/// # 引数
///
/// * `sheet` - 書き込み先のシート
/// * `plan` - [`crate::plan_placement`] で求めた配置計画
/// * `matrix` - 結果テーブルのスナップショット
/// * `label` - データセットラベル
/// * `host` - 進捗の通知先
///
/// # 発生し得るエラー
///
/// * `XlsxStackError::Data` - 英字を含まないデータが数値として解析できない場合
pub fn write_block<G: SheetGrid + ?Sized>(
    sheet: &mut G,
    plan: &PlacementPlan,
    matrix: &ResultsMatrix,
    label: &str,
    host: &dyn HostContext,
) -> Result<WriteStats, XlsxStackError> {
    let values = classify_rows(matrix)?;
    let mut stats = WriteStats::default();

    sheet.set_cell(
        plan.label_row,
        plan.col_origin,
        Cell::bold(CellValue::Text(label.to_string())),
    );

    if plan.write_headers {
        let headings = plan
            .write_count_column
            .then_some(COUNT_HEADING)
            .into_iter()
            .chain(matrix.headers.iter().map(String::as_str));
        for (offset, heading) in headings.enumerate() {
            sheet.set_cell(
                plan.header_row,
                plan.col_origin + offset as u32,
                Cell::bold(CellValue::Text(heading.to_string())),
            );
            stats.header_cells += 1;
        }
    }

    let row_count = values.len();
    let progress_total = row_count + row_count / 100;
    for (r, row_values) in values.into_iter().enumerate() {
        let row = plan.data_row_origin + r as u32;

        if plan.write_count_column {
            sheet.set_cell(
                row,
                plan.col_origin,
                Cell::new(CellValue::Number((r + 1) as f64)),
            );
            stats.data_cells += 1;
        }

        for (c, value) in row_values.into_iter().enumerate() {
            sheet.set_cell(row, plan.value_column(c as u32), Cell::new(value));
            stats.data_cells += 1;
        }

        host.show_progress(r, progress_total);
    }
    host.show_progress(1, 1);

    Ok(stats)
}

/// すべてのデータを書き込み前に分類する
fn classify_rows(matrix: &ResultsMatrix) -> Result<Vec<Vec<CellValue>>, XlsxStackError> {
    matrix
        .rows
        .iter()
        .enumerate()
        .map(|(row, values)| {
            values
                .iter()
                .enumerate()
                .map(|(col, value)| {
                    classify_datum(value).ok_or_else(|| XlsxStackError::Data {
                        row,
                        col,
                        value: value.clone(),
                    })
                })
                .collect()
        })
        .collect()
}
