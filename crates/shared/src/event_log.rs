//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で効率的に調査できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! fire-and-forget 経路の送信失敗は呼び出し元に返らないため、
//! `notification.failed` イベントが唯一の観測手段になる。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `notification.recipient`: 宛先メールアドレス
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        pub const NOTIFICATION_QUEUED: &str = "notification.queued";
        pub const NOTIFICATION_REJECTED: &str = "notification.rejected";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const EMAIL: &str = "email";
        pub const DISPATCH_JOB: &str = "dispatch_job";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（ディスパッチキュー、通知ログ）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（SMTP リレー）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const SMTP: &str = "smtp";
        pub const TEMPLATE: &str = "template";
        pub const DISPATCH_QUEUE: &str = "dispatch_queue";
        pub const NOTIFICATION_LOG: &str = "notification_log";
    }
}
