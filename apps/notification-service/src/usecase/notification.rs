//! # 通知ユースケース
//!
//! 学務イベント・仕入先イベントに伴うメール通知の生成・送信・ログ記録を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - tera テンプレートエンジンによるメール生成
//! - [`dispatcher`] - 有界キューと配信ワーカー（fire-and-forget 経路）
//! - [`service`] - 配信計画の展開、レンダリング、キュー投入・同期送信の統合サービス

pub mod dispatcher;
pub mod service;
pub mod template_renderer;

pub use dispatcher::{DispatchContext, DispatchQueue, DispatchWorker};
pub use service::NotificationService;
pub use template_renderer::TemplateRenderer;
