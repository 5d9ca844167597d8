//! # Academix インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **メール送信**: SMTP リレーへの接続と送信（[`notification`]）
//! - **通知ログ**: アプリ内通知の記録フック（[`notification_log`]）
//!
//! ## 依存関係
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信（SMTP / Noop）
//! - [`notification_log`] - 通知ログリポジトリ

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod notification_log;

pub use error::InfraError;
