//! Results Module
//!
//! 書き出し対象の測定結果テーブルを扱うモジュール。
//!
//! ホストの結果テーブルは [`ResultsSource`] トレイトで抽象化し、呼び出し開始時に
//! [`ResultsMatrix::snapshot`] で文字列の行列として読み取ります。以降の配置計算と
//! 書き込みはスナップショットだけを参照します。

use std::io::Read;

use crate::error::XlsxStackError;

/// 行ラベル列の見出し
pub const LABEL_HEADING: &str = "Label";

/// ラベルが設定されていない行の代わりに書き込む値
pub const MISSING_LABEL: &str = "null";

/// 値が存在しないセルの文字列表現
const MISSING_VALUE: &str = "NaN";

/// 測定結果テーブルの読み取り専用ビュー
pub trait ResultsSource {
    /// 列見出し（ラベル列は含まない）
    fn headings(&self) -> Vec<String>;

    /// データ行数
    fn row_count(&self) -> usize;

    /// ラベル列を持つか
    fn has_labels(&self) -> bool {
        false
    }

    /// 指定行のラベル
    fn label(&self, _row: usize) -> Option<String> {
        None
    }

    /// 指定列・指定行の値を文字列で返す
    fn string_value(&self, heading: &str, row: usize) -> String;
}

/// メモリ上の結果テーブル
///
/// # 使用例
///
/// ```rust
/// use xlsxstack::{ResultsSource, ResultsTable};
///
/// let mut table = ResultsTable::new(vec!["Area".to_string(), "Mean".to_string()]);
/// table.add_row(Some("cell-1".to_string()), vec!["12".to_string(), "0.5".to_string()]);
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.string_value("Mean", 0), "0.5");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsTable {
    headings: Vec<String>,
    labels: Vec<Option<String>>,
    rows: Vec<Vec<String>>,
    has_labels: bool,
}

impl ResultsTable {
    /// 空のテーブルを生成
    pub fn new(headings: Vec<String>) -> Self {
        Self {
            headings,
            ..Self::default()
        }
    }

    /// 行を追加する
    ///
    /// `values` が列数より短い場合、足りない値は欠損として扱います。
    /// ラベルを1つでも指定するとテーブルはラベル列を持ちます。
    pub fn add_row(&mut self, label: Option<String>, values: Vec<String>) {
        if label.is_some() {
            self.has_labels = true;
        }
        self.labels.push(label);
        self.rows.push(values);
    }

    /// CSVから結果テーブルを読み込む
    ///
    /// 1行目を見出しとして扱います。`Label` 列は行ラベルに、見出しが空の列
    /// （行番号列）は読み飛ばします。空のラベルは欠損として扱います。
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxStackError::Csv` - CSVとして読み込めない場合
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, XlsxStackError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header_record = csv_reader.headers()?.clone();

        let mut label_index = None;
        let mut value_indices = Vec::new();
        let mut headings = Vec::new();
        for (idx, heading) in header_record.iter().enumerate() {
            if heading.is_empty() {
                continue;
            }
            if heading == LABEL_HEADING && label_index.is_none() {
                label_index = Some(idx);
                continue;
            }
            value_indices.push(idx);
            headings.push(heading.to_string());
        }

        let mut table = Self::new(headings);
        table.has_labels = label_index.is_some();

        for record in csv_reader.records() {
            let record = record?;
            let label = label_index
                .and_then(|idx| record.get(idx))
                .filter(|label| !label.is_empty())
                .map(str::to_string);
            let values = value_indices
                .iter()
                .map(|&idx| record.get(idx).unwrap_or_default().to_string())
                .collect();
            table.labels.push(label);
            table.rows.push(values);
        }

        log::debug!(
            "loaded results table: {} columns, {} rows",
            table.headings.len(),
            table.rows.len()
        );
        Ok(table)
    }
}

impl ResultsSource for ResultsTable {
    fn headings(&self) -> Vec<String> {
        self.headings.clone()
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn has_labels(&self) -> bool {
        self.has_labels
    }

    fn label(&self, row: usize) -> Option<String> {
        self.labels.get(row).cloned().flatten()
    }

    fn string_value(&self, heading: &str, row: usize) -> String {
        self.headings
            .iter()
            .position(|h| h == heading)
            .and_then(|col| self.rows.get(row).and_then(|values| values.get(col)))
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| MISSING_VALUE.to_string())
    }
}

/// 呼び出し開始時点の結果テーブルのスナップショット
///
/// `headers` の長さをK、`rows` の長さをNとすると、各行は必ずK個の値を持ちます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsMatrix {
    /// 列見出し（ラベル列があれば先頭が `Label`）
    pub headers: Vec<String>,

    /// データ（N行 × K列）
    pub rows: Vec<Vec<String>>,
}

impl ResultsMatrix {
    /// 結果テーブルを読み取る
    ///
    /// ラベル列を持つテーブルでは先頭列を `Label` とし、
    /// ラベルが未設定の行には `null` を入れます。
    pub fn snapshot(source: &dyn ResultsSource) -> Self {
        let value_headings = source.headings();
        let has_labels = source.has_labels();

        let mut headers = Vec::with_capacity(value_headings.len() + 1);
        if has_labels {
            headers.push(LABEL_HEADING.to_string());
        }
        headers.extend(value_headings.iter().cloned());

        let rows = (0..source.row_count())
            .map(|row| {
                let mut values = Vec::with_capacity(headers.len());
                if has_labels {
                    values.push(
                        source
                            .label(row)
                            .unwrap_or_else(|| MISSING_LABEL.to_string()),
                    );
                }
                values.extend(
                    value_headings
                        .iter()
                        .map(|heading| source.string_value(heading, row)),
                );
                values
            })
            .collect();

        Self { headers, rows }
    }

    /// 列数K
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// 行数N
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
