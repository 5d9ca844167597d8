//! # Academix 共有ユーティリティ
//!
//! 通知サービス全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - notification-service から依存される。domain・infra はこのクレートに依存しない
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存は持たない（`IntoResponse` 変換はサービス側の責務）

pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use error_response::{ErrorResponse, ProblemType};
pub use health::{HealthResponse, ServiceStatusResponse};
