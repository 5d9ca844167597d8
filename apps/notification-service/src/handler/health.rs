//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health         → {"status": "ok"}
//! GET /api/v1/status  → {"status": "success", "uptime": "0h 01m 05s", "service": "Notification Engine"}
//! ```

use std::sync::Arc;

use academix_shared::{HealthResponse, ServiceStatusResponse};
use axum::{Json, extract::State};

use super::NotifyState;

/// `/api/v1/status` で返すサービス名
const SERVICE_NAME: &str = "Notification Engine";

/// ヘルスチェックエンドポイント
///
/// ロードバランサーやコンテナオーケストレーターの liveness probe 用。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// サービス状態エンドポイント
pub async fn service_status(State(state): State<Arc<NotifyState>>) -> Json<ServiceStatusResponse> {
    Json(ServiceStatusResponse::new(
        SERVICE_NAME,
        state.started_at.elapsed(),
    ))
}
