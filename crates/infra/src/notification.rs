//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（STARTTLS リレー / Mailpit）、Noop（ログ出力のみ）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択

mod noop;
mod smtp;

use academix_domain::notification::{EmailMessage, NotificationError};
use async_trait::async_trait;
pub use noop::NoopNotificationSender;
pub use smtp::{SmtpConfig, SmtpNotificationSender};

/// メール送信トレイト
///
/// 1 回の呼び出しで宛先 1 件に 1 通だけ送る。リトライはしない。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
