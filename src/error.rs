//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// xlsxstackクレート全体で使用するエラー型
///
/// ワークブックの読み込み、配置計算、セル書き込み、保存、ハンドル管理の
/// すべての段階で発生するエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Io`: ファイルの読み書きに失敗した
/// - `Format` / `Zip`: ファイルは存在するがワークブックとして解釈できない
/// - `Write`: ワークブックのシリアライズに失敗した
/// - `IllegalState`: ハンドルスロットに対する不正な遷移
/// - `Data`: 数値に見えるデータが数値として解釈できない
/// - `Config`: オプション文字列が不正
/// - `OutOfBounds`: 書き込みブロックがシートの最大範囲を超える
/// - `SecurityViolation`: 入力ファイルがセキュリティ制限を超える
/// - `Csv`: 結果テーブルのCSVを読み込めない
///
/// 各バリアントがどの分類に属するかは [`XlsxStackError::kind`] で取得できます。
#[derive(Error, Debug)]
pub enum XlsxStackError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// umya-spreadsheetがワークブックを解析できなかったエラー
    #[error("Failed to parse Excel file: {0}")]
    Format(#[source] umya_spreadsheet::XlsxError),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// umya-spreadsheetによるシリアライズ中のエラー
    #[error("Failed to write Excel file: {0}")]
    Write(#[source] umya_spreadsheet::XlsxError),

    /// ハンドルスロットに対する不正な操作
    ///
    /// 既に開いているのに `read_and_open` した場合や、
    /// 何も開いていないのに `write_and_close` した場合に発生します。
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// 数値として書き込もうとしたデータの解析エラー
    ///
    /// 英字を含まないデータは数値として扱われるため、`"1.2.3"` や空文字列のような
    /// 値はこのエラーになります。`row` と `col` は結果テーブル内の0始まりの位置です。
    #[error("Data error at result row {row}, column {col}: '{value}' is not a number")]
    Data {
        /// 結果テーブル内の行インデックス
        row: usize,
        /// 結果テーブル内の列インデックス
        col: usize,
        /// 解析に失敗した値
        value: String,
    },

    /// オプションの検証に失敗したエラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// 書き込み先がExcelのシート範囲（1,048,576行 × 16,384列）を超える
    #[error("Cell ({row}, {col}) is outside the worksheet limits")]
    OutOfBounds {
        /// 0始まりの行インデックス
        row: u64,
        /// 0始まりの列インデックス
        col: u64,
    },

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 結果テーブル（CSV）の読み込みエラー
    #[error("Failed to read results table: {0}")]
    Csv(#[from] csv::Error),
}

/// エラーの大分類
///
/// ホスト側の例外報告チャネルへ渡す際に、バリアントの詳細ではなく
/// この分類で振り分けます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// ファイルシステム上の読み書き失敗
    Io,
    /// ファイルは存在するがワークブックとして解析できない
    Format,
    /// ハンドルスロットの不正遷移
    IllegalState,
    /// 数値データの解析失敗
    Data,
    /// オプションの不正
    Config,
}

impl XlsxStackError {
    /// エラーの大分類を返す
    pub fn kind(&self) -> ErrorKind {
        match self {
            XlsxStackError::Io(_) | XlsxStackError::Write(_) => ErrorKind::Io,
            XlsxStackError::Csv(e) if e.is_io_error() => ErrorKind::Io,
            XlsxStackError::Format(_)
            | XlsxStackError::Zip(_)
            | XlsxStackError::SecurityViolation(_)
            | XlsxStackError::Csv(_) => ErrorKind::Format,
            XlsxStackError::IllegalState(_) => ErrorKind::IllegalState,
            XlsxStackError::Data { .. } | XlsxStackError::OutOfBounds { .. } => ErrorKind::Data,
            XlsxStackError::Config(_) => ErrorKind::Config,
        }
    }
}
