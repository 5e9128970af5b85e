//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! 配置計算と書き込みは [`SheetGrid`] トレイトだけを通してシートにアクセスします。
//! ファイル上のシート（umya-spreadsheet）と、メモリ上の疎なグリッド（[`Worksheet`]）の
//! どちらにも同じ処理を適用できます。

use std::collections::BTreeMap;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    Text(String),

    /// 論理値
    Bool(bool),
}

/// セル座標（0始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub row: u32,
    pub col: u32,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// シート上の1セル
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// セルの値
    pub value: CellValue,

    /// 太字で表示するか
    pub bold: bool,
}

impl Cell {
    /// 書式なしのセルを生成
    pub fn new(value: CellValue) -> Self {
        Self { value, bold: false }
    }

    /// 太字のセルを生成
    pub fn bold(value: CellValue) -> Self {
        Self { value, bold: true }
    }
}

/// 配置計算と書き込みがシートに要求する操作
///
/// 行・列はすべて0始まりで、セルが存在しない位置は空として扱います。
pub trait SheetGrid {
    /// 指定行で最後に使われている列の1つ右（セルがない行なら `None`）
    fn row_end(&self, row: u32) -> Option<u32>;

    /// 指定位置にセルが存在するか
    fn is_occupied(&self, row: u32, col: u32) -> bool;

    /// 指定位置にセルを書き込む（既存セルは上書き）
    fn set_cell(&mut self, row: u32, col: u32, cell: Cell);
}

/// メモリ上のワークシート（疎なグリッド）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
}

impl Worksheet {
    /// 空のワークシートを生成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// シート名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 指定位置のセルを取得
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    /// 指定位置の値を取得
    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|cell| &cell.value)
    }

    /// すべてのセルを行優先順で列挙
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &Cell)> + '_ {
        self.rows.iter().flat_map(|(&row, cells)| {
            cells
                .iter()
                .map(move |(&col, cell)| (CellCoord::new(row, col), cell))
        })
    }

    /// セル数
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// セルが1つもないか
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

impl SheetGrid for Worksheet {
    fn row_end(&self, row: u32) -> Option<u32> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.keys().next_back())
            .map(|&col| col + 1)
    }

    fn is_occupied(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).is_some()
    }

    fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.rows.entry(row).or_default().insert(col, cell);
    }
}
