//! Host Collaborators
//!
//! 結果テーブルを書き出すホストアプリケーション側の機能を抽象化するモジュール。
//! アクティブな画像のタイトル取得と、進捗表示のみを要求します。

/// ホストアプリケーションとの接点
///
/// すべてのメソッドにデフォルト実装があるため、必要なものだけを実装できます。
///
/// # 使用例
///
/// ```rust
/// use xlsxstack::HostContext;
///
/// struct Viewer {
///     title: String,
/// }
///
/// impl HostContext for Viewer {
///     fn active_image_title(&self) -> Option<String> {
///         Some(self.title.clone())
///     }
/// }
///
/// let viewer = Viewer { title: "blobs.gif".to_string() };
/// assert_eq!(viewer.active_image_title().as_deref(), Some("blobs.gif"));
/// ```
pub trait HostContext {
    /// 現在アクティブな画像のタイトル（画像が開かれていなければ `None`）
    fn active_image_title(&self) -> Option<String> {
        None
    }

    /// 進捗を表示する
    ///
    /// `current` は単調増加し、最後に `show_progress(1, 1)` が呼ばれます。
    fn show_progress(&self, _current: usize, _total: usize) {}
}

/// 何もしないホスト
///
/// コマンドラインやテストなど、画像ビューアを持たない環境で使用します。
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl HostContext for NullHost {}
