//! Placement Planner
//!
//! 新しい結果ブロックをシート上のどこに書き込むかを決定するモジュール。
//!
//! シートの固定行:
//!
//! | 行 | 内容 |
//! |---|---|
//! | 0 | データセットラベル（ブロックごとに1セル、太字） |
//! | 1 | 列見出し（太字） |
//! | 2以降 | データ |
//!
//! 右側に追加するモードでは、既存ブロックの右に空列を1列はさんで配置します。
//! 下に追記するモードでは、前回のブロックと同じ列帯の最初の空行から配置します。

use serde::Serialize;

use crate::api::LayoutMode;
use crate::error::XlsxStackError;
use crate::types::SheetGrid;

/// データセットラベル行
pub const LABEL_ROW: u32 = 0;

/// 列見出し行
pub const HEADER_ROW: u32 = 1;

/// 最初のデータ行
pub const FIRST_DATA_ROW: u32 = 2;

/// Excelの最大行インデックス（0始まり）
pub const MAX_ROW_INDEX: u64 = 1_048_575;

/// Excelの最大列インデックス（0始まり）
pub const MAX_COL_INDEX: u64 = 16_383;

/// 1ブロック分の配置計画
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementPlan {
    /// ブロックの左端の列
    pub col_origin: u32,

    /// データセットラベルを書き込む行（常に0）
    pub label_row: u32,

    /// 列見出しを書き込む行（常に1）
    pub header_row: u32,

    /// 最初のデータを書き込む行
    pub data_row_origin: u32,

    /// 列見出しを書き込むか
    pub write_headers: bool,

    /// 先頭にCount列を書き込むか
    pub write_count_column: bool,

    /// 書き込む列数（K + Count列）
    pub width: u32,
}

impl PlacementPlan {
    /// 結果テーブルの列cに対応するシート上の列
    pub fn value_column(&self, col: u32) -> u32 {
        self.col_origin + col + u32::from(self.write_count_column)
    }
}

/// 配置計画を立てる
///
/// # 引数
///
/// * `sheet` - 書き込み先のシート
/// * `header_count` - 結果テーブルの列数K
/// * `row_count` - 結果テーブルの行数N
/// * `no_count_column` - Count列を付けない
/// * `layout` - 配置方式
///
/// # 発生し得るエラー
///
/// * `XlsxStackError::OutOfBounds` - ブロックがExcelのシート範囲を超える場合
///
/// # 使用例
///
/// ```rust
/// use xlsxstack::{plan_placement, LayoutMode, Worksheet};
///
/// let sheet = Worksheet::new("A");
/// let plan = plan_placement(&sheet, 2, 2, false, LayoutMode::Adjacent).unwrap();
/// assert_eq!(plan.col_origin, 0);
/// assert_eq!(plan.data_row_origin, 2);
/// assert_eq!(plan.width, 3);
/// ```
pub fn plan_placement<G: SheetGrid + ?Sized>(
    sheet: &G,
    header_count: usize,
    row_count: usize,
    no_count_column: bool,
    layout: LayoutMode,
) -> Result<PlacementPlan, XlsxStackError> {
    let count_adj = u64::from(!no_count_column);
    let width = header_count as u64 + count_adj;

    let plan = match layout {
        LayoutMode::Adjacent => adjacent_origin(sheet),
        LayoutMode::Stack => match sheet.row_end(FIRST_DATA_ROW) {
            // 最初のデータ行が空なら、下に積むブロックがまだない
            None => {
                let (col_origin, data_row_origin, _) = adjacent_origin(sheet);
                (col_origin, data_row_origin, !sheet.is_occupied(HEADER_ROW, 0))
            }
            Some(end) => stack_origin(sheet, end - 1, header_count as u64, no_count_column),
        },
    };
    let (col_origin, data_row_origin, write_headers) = plan;

    check_bounds(col_origin, data_row_origin, width, row_count as u64)?;

    let plan = PlacementPlan {
        col_origin: col_origin as u32,
        label_row: LABEL_ROW,
        header_row: HEADER_ROW,
        data_row_origin: data_row_origin as u32,
        write_headers,
        write_count_column: !no_count_column,
        width: width as u32,
    };
    log::debug!("placement plan ({:?}): {:?}", layout, plan);
    Ok(plan)
}

/// 右側に追加する場合の（列, データ開始行, 見出しを書くか）
///
/// 最初のデータ行の最終列の1つ右に空列を1列はさみます。
fn adjacent_origin<G: SheetGrid + ?Sized>(sheet: &G) -> (u64, u64, bool) {
    let col_origin = sheet
        .row_end(FIRST_DATA_ROW)
        .map(|end| u64::from(end) + 1)
        .unwrap_or(0);
    (col_origin, u64::from(FIRST_DATA_ROW), true)
}

/// 下に追記する場合の（列, データ開始行, 見出しを書くか）
///
/// `last_col` は最初のデータ行の最終列（この列が前回のブロックの右端）。
fn stack_origin<G: SheetGrid + ?Sized>(
    sheet: &G,
    last_col: u32,
    header_count: u64,
    no_count_column: bool,
) -> (u64, u64, bool) {
    // Count列を付ける場合は前回のCount列を再利用する
    let band_start = i64::from(last_col) - header_count as i64 + i64::from(no_count_column);
    let col_origin = if band_start < 0 {
        log::warn!(
            "stacked block wider than the previous band (last column {}), clamping to column 0",
            last_col
        );
        0
    } else {
        band_start as u64
    };

    let mut row = FIRST_DATA_ROW;
    while sheet.is_occupied(row, last_col) {
        row += 1;
    }

    let write_headers = !sheet.is_occupied(HEADER_ROW, 0);
    (col_origin, u64::from(row), write_headers)
}

fn check_bounds(
    col_origin: u64,
    data_row_origin: u64,
    width: u64,
    row_count: u64,
) -> Result<(), XlsxStackError> {
    let last_col = col_origin + width.saturating_sub(1);
    if last_col > MAX_COL_INDEX {
        return Err(XlsxStackError::OutOfBounds {
            row: u64::from(LABEL_ROW),
            col: last_col,
        });
    }

    let last_row = data_row_origin + row_count.saturating_sub(1);
    if row_count > 0 && last_row > MAX_ROW_INDEX {
        return Err(XlsxStackError::OutOfBounds {
            row: last_row,
            col: col_origin,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, CellValue, Worksheet};
    use proptest::prelude::*;

    /// 計画どおりにセルを埋める（値は区別できれば何でもよい）
    fn fill(sheet: &mut Worksheet, plan: &PlacementPlan, row_count: u32) {
        let text = |s: &str| Cell::bold(CellValue::Text(s.to_string()));
        sheet.set_cell(plan.label_row, plan.col_origin, text("label"));
        if plan.write_headers {
            for c in 0..plan.width {
                sheet.set_cell(plan.header_row, plan.col_origin + c, text("h"));
            }
        }
        for r in 0..row_count {
            for c in 0..plan.width {
                sheet.set_cell(
                    plan.data_row_origin + r,
                    plan.col_origin + c,
                    Cell::new(CellValue::Number(f64::from(r + 1))),
                );
            }
        }
    }

    #[test]
    fn test_adjacent_on_empty_sheet() {
        let sheet = Worksheet::new("A");
        let plan = plan_placement(&sheet, 2, 2, false, LayoutMode::Adjacent).unwrap();
        assert_eq!(
            plan,
            PlacementPlan {
                col_origin: 0,
                label_row: 0,
                header_row: 1,
                data_row_origin: 2,
                write_headers: true,
                write_count_column: true,
                width: 3,
            }
        );
    }

    #[test]
    fn test_adjacent_leaves_one_column_gutter() {
        let mut sheet = Worksheet::new("A");
        let first = plan_placement(&sheet, 2, 2, false, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &first, 2);

        let second = plan_placement(&sheet, 2, 1, false, LayoutMode::Adjacent).unwrap();
        assert_eq!(second.col_origin, 4);
        assert!(!sheet.is_occupied(2, 3));
    }

    #[test]
    fn test_stack_below_previous_block() {
        let mut sheet = Worksheet::new("A");
        let first = plan_placement(&sheet, 2, 2, false, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &first, 2);

        let plan = plan_placement(&sheet, 2, 1, false, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, 0);
        assert_eq!(plan.data_row_origin, 4);
        assert!(!plan.write_headers);
        assert!(plan.write_count_column);
    }

    #[test]
    fn test_stack_without_count_column_keeps_band() {
        let mut sheet = Worksheet::new("A");
        let first = plan_placement(&sheet, 2, 3, true, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &first, 3);

        let plan = plan_placement(&sheet, 2, 1, true, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, 0);
        assert_eq!(plan.width, 2);
        assert_eq!(plan.data_row_origin, 5);
    }

    #[test]
    fn test_stack_targets_rightmost_band() {
        let mut sheet = Worksheet::new("A");
        let first = plan_placement(&sheet, 2, 3, false, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &first, 3);
        let second = plan_placement(&sheet, 2, 1, false, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &second, 1);

        let plan = plan_placement(&sheet, 2, 2, false, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, 4);
        assert_eq!(plan.data_row_origin, 3);
        assert!(!plan.write_headers);
    }

    #[test]
    fn test_stack_under_single_row_block_stays_in_band() {
        let mut sheet = Worksheet::new("A");
        let first = plan_placement(&sheet, 2, 1, false, LayoutMode::Adjacent).unwrap();
        fill(&mut sheet, &first, 1);

        // 最終使用行が3行目でも、右側ではなく同じ列帯の下に積む
        let plan = plan_placement(&sheet, 2, 1, false, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, first.col_origin);
        assert_eq!(plan.data_row_origin, 3);
        assert!(!plan.write_headers);

        fill(&mut sheet, &plan, 1);
        let third = plan_placement(&sheet, 2, 1, false, LayoutMode::Stack).unwrap();
        assert_eq!(third.col_origin, first.col_origin);
        assert_eq!(third.data_row_origin, 4);
    }

    #[test]
    fn test_stack_on_empty_sheet_falls_back_to_adjacent() {
        let sheet = Worksheet::new("A");
        let plan = plan_placement(&sheet, 3, 5, false, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, 0);
        assert_eq!(plan.data_row_origin, 2);
        assert!(plan.write_headers);
    }

    #[test]
    fn test_stack_writes_headers_when_header_row_is_empty() {
        let mut sheet = Worksheet::new("A");
        sheet.set_cell(2, 0, Cell::new(CellValue::Number(1.0)));
        sheet.set_cell(2, 1, Cell::new(CellValue::Number(2.0)));

        let plan = plan_placement(&sheet, 1, 1, false, LayoutMode::Stack).unwrap();
        assert!(plan.write_headers);
        assert_eq!(plan.data_row_origin, 3);
    }

    #[test]
    fn test_stack_wider_block_clamps_to_first_column() {
        let mut sheet = Worksheet::new("A");
        sheet.set_cell(2, 0, Cell::new(CellValue::Number(1.0)));
        sheet.set_cell(2, 1, Cell::new(CellValue::Number(2.0)));

        let plan = plan_placement(&sheet, 5, 1, false, LayoutMode::Stack).unwrap();
        assert_eq!(plan.col_origin, 0);
        assert_eq!(plan.data_row_origin, 3);
    }

    #[test]
    fn test_value_column() {
        let sheet = Worksheet::new("A");
        let plan = plan_placement(&sheet, 2, 1, false, LayoutMode::Adjacent).unwrap();
        assert_eq!(plan.value_column(0), 1);
        let plan = plan_placement(&sheet, 2, 1, true, LayoutMode::Adjacent).unwrap();
        assert_eq!(plan.value_column(0), 0);
    }

    #[test]
    fn test_out_of_bounds_columns() {
        let mut sheet = Worksheet::new("A");
        sheet.set_cell(2, 16_380, Cell::new(CellValue::Number(1.0)));

        let result = plan_placement(&sheet, 2, 1, false, LayoutMode::Adjacent);
        assert!(matches!(
            result,
            Err(XlsxStackError::OutOfBounds { col, .. }) if col > MAX_COL_INDEX
        ));
    }

    #[test]
    fn test_out_of_bounds_rows() {
        let sheet = Worksheet::new("A");
        let result = plan_placement(&sheet, 1, 1_048_575, false, LayoutMode::Adjacent);
        assert!(matches!(result, Err(XlsxStackError::OutOfBounds { .. })));
    }

    proptest! {
        #[test]
        fn prop_adjacent_runs_never_overwrite(
            runs in prop::collection::vec((1usize..6, 0u32..6, any::<bool>()), 1..8)
        ) {
            let mut sheet = Worksheet::new("A");
            for (k, n, no_count) in runs {
                let plan = plan_placement(&sheet, k, n as usize, no_count, LayoutMode::Adjacent).unwrap();
                for r in 0..n {
                    for c in 0..plan.width {
                        prop_assert!(!sheet.is_occupied(plan.data_row_origin + r, plan.col_origin + c));
                    }
                }
                // ギャップ列（左隣）は空
                if plan.col_origin > 0 {
                    prop_assert!(!sheet.is_occupied(FIRST_DATA_ROW, plan.col_origin - 1));
                }
                fill(&mut sheet, &plan, n);
            }
        }

        #[test]
        fn prop_stacked_runs_share_first_band(
            k in 1usize..6,
            first_rows in 1u32..5,
            no_count in any::<bool>(),
            stacked in prop::collection::vec(1u32..5, 1..6)
        ) {
            let mut sheet = Worksheet::new("A");
            let first = plan_placement(&sheet, k, first_rows as usize, no_count, LayoutMode::Adjacent).unwrap();
            fill(&mut sheet, &first, first_rows);

            for n in stacked {
                let plan = plan_placement(&sheet, k, n as usize, no_count, LayoutMode::Stack).unwrap();
                prop_assert_eq!(plan.col_origin, first.col_origin);
                prop_assert_eq!(plan.width, first.width);
                prop_assert!(!plan.write_headers);
                for r in 0..n {
                    for c in 0..plan.width {
                        prop_assert!(!sheet.is_occupied(plan.data_row_origin + r, plan.col_origin + c));
                    }
                }
                fill(&mut sheet, &plan, n);
            }
        }
    }
}
