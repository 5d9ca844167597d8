//! # Request ID レイヤーのテスト
//!
//! `build_app` のレイヤー構成で `X-Request-Id` が付与・伝播されることを検証する。

use std::sync::Arc;

use academix_domain::clock::SystemClock;
use academix_infra::mock::MockNotificationSender;
use academix_notification_service::{
    app_builder::build_app,
    handler::NotifyState,
    usecase::notification::{DispatchQueue, NotificationService, TemplateRenderer},
};
use axum::{Router, body::Body};
use http::{Request, StatusCode};
use tower::ServiceExt;

fn test_app() -> Router {
    let (queue, _rx) = DispatchQueue::bounded(1);
    let service = NotificationService::new(
        Arc::new(MockNotificationSender::new()),
        Arc::new(TemplateRenderer::new().unwrap()),
        queue,
        Arc::new(SystemClock),
    );
    build_app(Arc::new(NotifyState::new(service)))
}

fn header(response: &http::Response<Body>) -> &str {
    response
        .headers()
        .get("x-request-id")
        .expect("レスポンスに x-request-id ヘッダーが含まれること")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn 自動生成のx_request_idがuuid_v7形式である() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let id = uuid_version(header(&response));
    assert_eq!(id, Some('7'), "UUID v7 であること");
}

#[tokio::test]
async fn クライアント提供のx_request_idがそのまま返される() {
    let custom_id = "client-provided-request-id-123";

    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .header("x-request-id", custom_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response), custom_id);
}

/// `xxxxxxxx-xxxx-Vxxx-...` の V を取り出す
fn uuid_version(id: &str) -> Option<char> {
    let parts: Vec<&str> = id.split('-').collect();
    if parts.len() != 5 || parts.iter().map(|p| p.len()).ne([8, 4, 4, 4, 12]) {
        return None;
    }
    parts[2].chars().next()
}
