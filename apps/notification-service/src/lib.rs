//! # Notification Service ライブラリ
//!
//! 通知サービスのユースケースとハンドラを公開する。
//! 結合テストからルーターを組み立てられるよう、内部モジュールへのアクセスを提供する。

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
