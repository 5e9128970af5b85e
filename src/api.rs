//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::Serialize;

/// 書き込み先シートの選択方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum SheetSelector {
    /// ワークブックの最後のシート（デフォルト）
    ///
    /// シートが1つもない場合は [`crate::DEFAULT_SHEET_NAME`] という名前で作成します。
    Last,

    /// シート名指定
    ///
    /// 同名のシートがなければ作成します。名前はサニタイズ済みであることが前提です。
    Name(String),
}

impl SheetSelector {
    /// 新規シートを作成する場合に使用する名前
    pub fn name_for_new_sheet(&self) -> &str {
        match self {
            SheetSelector::Last => crate::DEFAULT_SHEET_NAME,
            SheetSelector::Name(name) => name,
        }
    }
}

/// ファイルハンドリングモード
///
/// ワークブックの読み込み・書き出しのタイミングを指定します。
/// `ReadOpen` → `Queue` × n → `WriteClose` の順で使うと、
/// 多数の結果テーブルを1回の読み書きで出力できます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileMode {
    /// 開く → 書き込む → 保存して閉じる（デフォルト）
    OpenClose,

    /// 開いてスロットに保持するだけ（`file_mode=read_and_open`）
    ReadOpen,

    /// スロットのワークブックを保存して閉じる（`file_mode=write_and_close`）
    WriteClose,

    /// スロットのワークブックに書き込むが保存しない（`file_mode=queue_write`）
    Queue,
}

impl FileMode {
    /// `file_mode=` の値からモードを決定する
    ///
    /// 未知の値は `None` を返します。
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "read_and_open" => Some(FileMode::ReadOpen),
            "write_and_close" => Some(FileMode::WriteClose),
            "queue_write" => Some(FileMode::Queue),
            "" | "open_and_close" => Some(FileMode::OpenClose),
            _ => None,
        }
    }
}

/// 結果ブロックの配置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutMode {
    /// 既存ブロックの右側に、空列を1列はさんで配置（デフォルト）
    Adjacent,

    /// 前回のブロックと同じ列帯の下に追記（`stack_results`）
    Stack,
}
