//! # Notification Service エラー定義
//!
//! 通知サービス固有のエラーと、HTTP レスポンスへの変換を定義する。

use academix_domain::{DomainError, notification::NotificationError};
use academix_shared::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Notification Service で発生するエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 入力値の検証エラー（メールアドレス構文、update_type 等）
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// 同期送信での配信失敗
    #[error("配信に失敗しました: {0}")]
    Delivery(#[source] NotificationError),

    /// 配信キューが満杯、またはワーカーが停止している
    #[error("配信キューが利用できません: {0}")]
    QueueUnavailable(String),

    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<NotificationError> for ServiceError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::TemplateFailed(msg) => {
                Self::Internal(format!("テンプレートレンダリングに失敗: {msg}"))
            }
            other => Self::Delivery(other),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServiceError::Validation(e) => ErrorResponse::validation_error(e.to_string()),
            ServiceError::Delivery(e) => {
                tracing::error!(error = %e, "同期送信に失敗");
                ErrorResponse::delivery_failed(e.to_string())
            }
            ServiceError::QueueUnavailable(msg) => {
                tracing::warn!("配信キューが利用できません: {}", msg);
                ErrorResponse::service_unavailable(msg.clone())
            }
            ServiceError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn into_parts(error: ServiceError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn バリデーションエラーは400になる() {
        let error: ServiceError = DomainError::Validation("メールアドレスの形式が不正です".into()).into();

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.status, 400);
        assert!(body.error_type.ends_with("/validation-error"));
        assert!(body.detail.contains("メールアドレスの形式が不正です"));
    }

    #[tokio::test]
    async fn 配信失敗は500で元のエラー文言を返す() {
        let error: ServiceError = NotificationError::AuthenticationFailed(
            "535 5.7.8 Username and Password not accepted".to_string(),
        )
        .into();

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error_type.ends_with("/delivery-failed"));
        assert!(body.detail.contains("Username and Password not accepted"));
    }

    #[tokio::test]
    async fn テンプレート失敗は内部エラーとして詳細を隠す() {
        let error: ServiceError =
            NotificationError::TemplateFailed("Variable `x` not found".to_string()).into();

        let (status, body) = into_parts(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, ErrorResponse::internal_error());
    }

    #[tokio::test]
    async fn キュー利用不可は503になる() {
        let (status, body) =
            into_parts(ServiceError::QueueUnavailable("配信キューが満杯です".to_string())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.detail, "配信キューが満杯です");
    }
}
