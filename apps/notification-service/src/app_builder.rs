//! # Notification Service ルーター構築
//!
//! ハンドラとミドルウェアを組み合わせてルーターを構築する。
//! `main.rs` は依存の初期化とサーバー起動に集中する。

use std::sync::Arc;

use academix_shared::observability::{MakeRequestUuidV7, make_request_span};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handler::{
    NotifyState,
    health_check,
    notify_course_creation,
    notify_credit_shortage,
    notify_delivery_failed,
    notify_event_update,
    notify_faculty_assignment,
    notify_result_release,
    notify_stock_dispatched,
    notify_student_detention,
    notify_student_enrollment,
    service_status,
};

/// ルーターを構築する
pub fn build_app(state: Arc<NotifyState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/status", get(service_status))
        // 学務通知（fire-and-forget）
        .route(
            "/api/v1/notify/course-creation",
            post(notify_course_creation),
        )
        .route(
            "/api/v1/notify/faculty-assignment",
            post(notify_faculty_assignment),
        )
        .route(
            "/api/v1/notify/student-enrollment",
            post(notify_student_enrollment),
        )
        .route(
            "/api/v1/notify/results-release",
            post(notify_result_release),
        )
        .route(
            "/api/v1/notify/student-detention",
            post(notify_student_detention),
        )
        .route(
            "/api/v1/notify/student-credit-shortage",
            post(notify_credit_shortage),
        )
        .route("/api/v1/notify/event-update", post(notify_event_update))
        // 仕入先通知（同期送信）
        .route("/email/supplier-to-store", post(notify_stock_dispatched))
        .route(
            "/email/supplier-delivery-failed",
            post(notify_delivery_failed),
        )
        .with_state(state)
        // Request ID レイヤー（下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: スパンに request_id を含める
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
