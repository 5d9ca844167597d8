//! # Academix ドメイン層
//!
//! 通知サービスのドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: メールアドレスは生成時に検証し、不正な値を持ち込まない
//! - **通知イベント**: API が受け付けるイベントを enum で表現する
//! - **配信計画**: イベントから「誰に何を送り、何を記録するか」を純粋関数で導出する
//!
//! ## 依存関係の方向
//!
//! ```text
//! notification-service → infra → domain
//! ```
//!
//! ドメイン層は SMTP やテンプレートエンジンに一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`clock`] - 現在時刻の抽象化
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`notification`] - 通知イベント、メッセージ、配信結果
//! - [`value_objects`] - メールアドレス等の値オブジェクト

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod notification;
pub mod value_objects;

pub use error::DomainError;
