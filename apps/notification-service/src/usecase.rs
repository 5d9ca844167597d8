//! # ユースケース層
//!
//! Notification Service のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 送信・ログ記録は `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは DTO の変換のみを行い、配信の組み立てはユースケースに集約

pub mod notification;
