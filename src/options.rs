//! Options Module
//!
//! 1回の呼び出しで使用するオプションを保持するモジュール。
//! Fluent Builder APIと、ホストのマクロ呼び出しで使われるオプション文字列
//! （`key=value`、`key=[空白を含む値]`、フラグ）のパーサーを提供します。

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::api::{FileMode, LayoutMode, SheetSelector};
use crate::error::XlsxStackError;

/// シート名の最大長
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// シート名に使用できない文字
const ILLEGAL_SHEET_NAME_CHARS: [char; 9] = ['\\', '/', '?', '*', '[', ']', ':', '\u{0}', '\u{3}'];

/// デフォルトのファイル名（ホームディレクトリのDesktop直下に作成）
const DEFAULT_FILE_NAME: &str = "Rename me after writing is done.xlsx";

/// 1回の呼び出しのオプション
///
/// 構築後は変更されません。[`ExportOptionsBuilder`] または
/// [`ExportOptions::parse`] で生成します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOptions {
    /// 書き込み先のワークブック
    pub file_path: PathBuf,

    /// 書き込み先のシート
    pub sheet: SheetSelector,

    /// データセットラベル（空の場合はホストのアクティブ画像タイトルを使用）
    pub dataset_label: String,

    /// 1始まりの行番号列（Count）を付けない
    pub no_count_column: bool,

    /// 配置方式
    pub layout: LayoutMode,

    /// ファイルハンドリングモード
    pub file_mode: FileMode,
}

impl ExportOptions {
    /// ホストのオプション文字列を解析する
    ///
    /// | トークン | 効果 |
    /// |---|---|
    /// | `file=[path]` | 書き込み先ファイル |
    /// | `sheet=[name]` | シート名（サニタイズされる） |
    /// | `dataset_label=[text]` | データセットラベル |
    /// | `no_count_column` | Count列を付けない |
    /// | `stack_results` | 前回のブロックの下に追記 |
    /// | `file_mode=read_and_open` など | ファイルハンドリングモード |
    ///
    /// 未知のキーは無視し、未知の `file_mode` は `OpenClose` として扱います。
    /// 閉じられていない `[` のみ `XlsxStackError::Config` になります。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use xlsxstack::{ExportOptions, FileMode, LayoutMode, SheetSelector};
    ///
    /// let options = ExportOptions::parse(
    ///     "file=[/tmp/out.xlsx] sheet=[Cell counts] stack_results file_mode=queue_write",
    /// )
    /// .unwrap();
    /// assert_eq!(options.sheet, SheetSelector::Name("Cell counts".to_string()));
    /// assert_eq!(options.layout, LayoutMode::Stack);
    /// assert_eq!(options.file_mode, FileMode::Queue);
    /// ```
    pub fn parse(options: &str) -> Result<Self, XlsxStackError> {
        let macro_options = MacroOptions::parse(options)?;
        let mut builder = ExportOptionsBuilder::new();

        if let Some(file) = macro_options.value("file") {
            builder = builder.with_file_path(file);
        }

        if let Some(mode) = macro_options.value("file_mode") {
            let file_mode = FileMode::from_token(mode).unwrap_or_else(|| {
                log::warn!("unknown file_mode '{}', using open-and-close", mode);
                FileMode::OpenClose
            });
            builder = builder.with_file_mode(file_mode);
        }

        if let Some(sheet) = macro_options.value("sheet") {
            builder = builder.with_sheet_selector(SheetSelector::Name(sheet.to_string()));
        }

        if let Some(label) = macro_options.value("dataset_label") {
            builder = builder.with_dataset_label(label);
        }

        if macro_options.has_flag("no_count_column") {
            builder = builder.no_count_column(true);
        }

        if macro_options.has_flag("stack_results") {
            builder = builder.with_layout(LayoutMode::Stack);
        }

        builder.build()
    }

    /// データセットラベルを決定する
    ///
    /// 明示的なラベルがあればそれを、なければ `fallback`（アクティブ画像タイトル）を、
    /// どちらもなければ空文字列を返します。
    pub fn resolve_dataset_label(&self, fallback: Option<String>) -> String {
        if self.dataset_label.is_empty() {
            fallback.unwrap_or_default()
        } else {
            self.dataset_label.clone()
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
            sheet: SheetSelector::Last,
            dataset_label: String::new(),
            no_count_column: false,
            layout: LayoutMode::Adjacent,
            file_mode: FileMode::OpenClose,
        }
    }
}

/// Fluent Builder API
///
/// # 使用例
///
/// ```rust
/// use xlsxstack::{ExportOptionsBuilder, LayoutMode};
///
/// # fn main() -> Result<(), xlsxstack::XlsxStackError> {
/// let options = ExportOptionsBuilder::new()
///     .with_file_path("/tmp/results.xlsx")
///     .with_sheet_name("Nuclei")
///     .with_dataset_label("plate 3")
///     .with_layout(LayoutMode::Stack)
///     .build()?;
/// assert_eq!(options.dataset_label, "plate 3");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExportOptionsBuilder {
    options: ExportOptions,
}

impl Default for ExportOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptionsBuilder {
    /// デフォルト設定を持つビルダーを生成する
    ///
    /// # デフォルト設定
    ///
    /// - ファイル: `<home>/Desktop/Rename me after writing is done.xlsx`
    /// - シート: 最後のシート
    /// - データセットラベル: 空（ホストから取得）
    /// - Count列: あり
    /// - 配置: 右側に追加
    /// - モード: 開く → 書き込む → 閉じる
    pub fn new() -> Self {
        Self {
            options: ExportOptions::default(),
        }
    }

    /// 書き込み先のファイルを指定する
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.file_path = path.into();
        self
    }

    /// 書き込み先のシート名を指定する（`build()` 時にサニタイズ）
    pub fn with_sheet_name(self, name: impl Into<String>) -> Self {
        self.with_sheet_selector(SheetSelector::Name(name.into()))
    }

    /// 書き込み先のシート選択方式を指定する
    pub fn with_sheet_selector(mut self, selector: SheetSelector) -> Self {
        self.options.sheet = selector;
        self
    }

    /// データセットラベルを指定する
    pub fn with_dataset_label(mut self, label: impl Into<String>) -> Self {
        self.options.dataset_label = label.into();
        self
    }

    /// Count列を付けないかどうかを指定する
    pub fn no_count_column(mut self, no_count_column: bool) -> Self {
        self.options.no_count_column = no_count_column;
        self
    }

    /// 配置方式を指定する
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.options.layout = layout;
        self
    }

    /// ファイルハンドリングモードを指定する
    pub fn with_file_mode(mut self, mode: FileMode) -> Self {
        self.options.file_mode = mode;
        self
    }

    /// 設定を検証し、`ExportOptions` を生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `XlsxStackError::Config` - ファイルパスが空の場合
    pub fn build(mut self) -> Result<ExportOptions, XlsxStackError> {
        if self.options.file_path.as_os_str().is_empty() {
            return Err(XlsxStackError::Config("File path is empty".to_string()));
        }

        if let SheetSelector::Name(ref name) = self.options.sheet {
            self.options.sheet = SheetSelector::Name(sanitize_sheet_name(name));
        }

        Ok(self.options)
    }
}

/// シート名をExcelで使用可能な形に整える
///
/// 1. 31文字に切り詰める
/// 2. `\ / ? * [ ] :` を空白に置き換え、連続する空白を1つにまとめる
/// 3. 先頭と末尾の `'` を取り除く
///
/// 結果が空になった場合は `"empty"` を返します。
///
/// ```rust
/// use xlsxstack::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("A/B*C:D"), "A B C D");
/// assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
/// ```
pub fn sanitize_sheet_name(name: &str) -> String {
    let truncated: String = name.chars().take(MAX_SHEET_NAME_LEN).collect();

    let mut result = String::with_capacity(truncated.len());
    for ch in truncated.chars() {
        let ch = if ILLEGAL_SHEET_NAME_CHARS.contains(&ch) {
            ' '
        } else {
            ch
        };
        if ch == ' ' && result.ends_with(' ') {
            continue;
        }
        result.push(ch);
    }

    let result = result.trim_matches('\'');
    if result.is_empty() {
        "empty".to_string()
    } else {
        result.to_string()
    }
}

/// デフォルトの書き込み先: `<home>/Desktop/Rename me after writing is done.xlsx`
pub fn default_file_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    home.join("Desktop").join(DEFAULT_FILE_NAME)
}

/// オプション文字列の字句解析結果
#[derive(Debug, Default, PartialEq, Eq)]
struct MacroOptions {
    values: HashMap<String, String>,
    flags: HashSet<String>,
}

impl MacroOptions {
    /// `key=value` / `key=[value]` / `flag` の並びを解析する
    ///
    /// フラグはブラケット外の独立したトークンとしてのみ認識します。
    fn parse(input: &str) -> Result<Self, XlsxStackError> {
        let mut options = MacroOptions::default();
        let mut chars = input.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
                key.push(c);
            }

            if chars.next_if_eq(&'=').is_none() {
                options.flags.insert(key);
                continue;
            }

            let mut value = String::new();
            if chars.next_if_eq(&'[').is_some() {
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if !closed {
                    return Err(XlsxStackError::Config(format!(
                        "Unterminated '[' in value of option '{}'",
                        key
                    )));
                }
            } else {
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
            }
            options.values.insert(key, value);
        }

        Ok(options)
    }

    fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_sheet_name_replaces_forbidden_chars() {
        assert_eq!(sanitize_sheet_name("A/B*C:D"), "A B C D");
        assert_eq!(sanitize_sheet_name("a\\b?c[d]e"), "a b c d e");
        assert_eq!(sanitize_sheet_name("x//y"), "x y");
    }

    #[test]
    fn test_sanitize_sheet_name_truncates_and_strips_quotes() {
        let long = "Sheet Name Longer Than 31 Characters";
        let sanitized = sanitize_sheet_name(long);
        assert_eq!(sanitized, "Sheet Name Longer Than 31 Chara");
        assert_eq!(sanitized.chars().count(), 31);

        assert_eq!(sanitize_sheet_name("'Results'"), "Results");
        assert_eq!(sanitize_sheet_name("it's"), "it's");
        assert_eq!(sanitize_sheet_name("''"), "empty");
        assert_eq!(sanitize_sheet_name(""), "empty");
    }

    #[test]
    fn test_parse_defaults() {
        let options = ExportOptions::parse("").unwrap();
        assert_eq!(options.sheet, SheetSelector::Last);
        assert_eq!(options.dataset_label, "");
        assert!(!options.no_count_column);
        assert_eq!(options.layout, LayoutMode::Adjacent);
        assert_eq!(options.file_mode, FileMode::OpenClose);
        assert!(options
            .file_path
            .ends_with("Desktop/Rename me after writing is done.xlsx"));
    }

    #[test]
    fn test_parse_all_options() {
        let options = ExportOptions::parse(
            "no_count_column dataset_label=[Test dataset label] sheet=[Sheet Name] \
             file=[/tmp/Results File.xlsx] stack_results file_mode=read_and_open",
        )
        .unwrap();

        assert_eq!(options.file_path, PathBuf::from("/tmp/Results File.xlsx"));
        assert_eq!(options.sheet, SheetSelector::Name("Sheet Name".to_string()));
        assert_eq!(options.dataset_label, "Test dataset label");
        assert!(options.no_count_column);
        assert_eq!(options.layout, LayoutMode::Stack);
        assert_eq!(options.file_mode, FileMode::ReadOpen);
    }

    #[test]
    fn test_parse_unbracketed_values() {
        let options = ExportOptions::parse("sheet=Counts file_mode=write_and_close").unwrap();
        assert_eq!(options.sheet, SheetSelector::Name("Counts".to_string()));
        assert_eq!(options.file_mode, FileMode::WriteClose);
    }

    #[test]
    fn test_parse_sanitizes_sheet_name() {
        let options = ExportOptions::parse("sheet=[A/B*C:D]").unwrap();
        assert_eq!(options.sheet, SheetSelector::Name("A B C D".to_string()));
    }

    #[test]
    fn test_parse_flag_inside_brackets_is_not_a_flag() {
        let options = ExportOptions::parse("dataset_label=[no_count_column stack_results]").unwrap();
        assert!(!options.no_count_column);
        assert_eq!(options.layout, LayoutMode::Adjacent);
        assert_eq!(options.dataset_label, "no_count_column stack_results");
    }

    #[test]
    fn test_parse_unknown_file_mode_falls_back() {
        let options = ExportOptions::parse("file_mode=sometimes").unwrap();
        assert_eq!(options.file_mode, FileMode::OpenClose);
    }

    #[test]
    fn test_parse_unterminated_bracket() {
        let result = ExportOptions::parse("dataset_label=[oops");
        match result {
            Err(XlsxStackError::Config(msg)) => assert!(msg.contains("dataset_label")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_rejects_empty_path() {
        let result = ExportOptionsBuilder::new().with_file_path("").build();
        assert!(matches!(result, Err(XlsxStackError::Config(_))));
    }

    #[test]
    fn test_resolve_dataset_label() {
        let options = ExportOptionsBuilder::new().build().unwrap();
        assert_eq!(
            options.resolve_dataset_label(Some("blobs.gif".to_string())),
            "blobs.gif"
        );
        assert_eq!(options.resolve_dataset_label(None), "");

        let options = ExportOptionsBuilder::new()
            .with_dataset_label("DS1")
            .build()
            .unwrap();
        assert_eq!(
            options.resolve_dataset_label(Some("blobs.gif".to_string())),
            "DS1"
        );
    }

    proptest! {
        #[test]
        fn prop_sanitized_name_is_excel_safe(name in any::<String>()) {
            let sanitized = sanitize_sheet_name(&name);

            prop_assert!(!sanitized.is_empty());
            prop_assert!(sanitized.chars().count() <= MAX_SHEET_NAME_LEN);
            prop_assert!(!sanitized.contains(['\\', '/', '?', '*', '[', ']', ':']));
            prop_assert!(!sanitized.starts_with('\''));
            prop_assert!(!sanitized.ends_with('\''));
            prop_assert!(!sanitized.contains("  "));
        }

        #[test]
        fn prop_sanitize_is_idempotent(name in "[ -~]{0,40}") {
            let once = sanitize_sheet_name(&name);
            prop_assert_eq!(sanitize_sheet_name(&once), once.clone());
        }
    }
}
