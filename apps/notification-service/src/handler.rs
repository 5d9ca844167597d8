//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは DTO をドメインのイベントに変換するだけに留め、配信はユースケースに委譲

pub mod academic;
pub mod health;
pub mod supplier;

use std::time::Instant;

pub use academic::{
    QueuedResponse,
    notify_course_creation,
    notify_credit_shortage,
    notify_event_update,
    notify_faculty_assignment,
    notify_result_release,
    notify_student_detention,
    notify_student_enrollment,
};
pub use health::{health_check, service_status};
pub use supplier::{SentResponse, notify_delivery_failed, notify_stock_dispatched};

use crate::usecase::notification::NotificationService;

/// 全ハンドラで共有する状態
pub struct NotifyState {
    pub service:    NotificationService,
    /// 稼働時間の起点
    pub started_at: Instant,
}

impl NotifyState {
    pub fn new(service: NotificationService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}
