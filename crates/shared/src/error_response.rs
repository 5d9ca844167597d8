//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! 通知 API のエラー応答の形を定義する。
//!
//! 問題の種類は [`ProblemType`] で列挙し、`type` URI・`title`・`status` はそこから導出する。
//! axum の `IntoResponse` 変換は notification-service 側で行う（shared に axum 依存を入れない）。

use serde::{Deserialize, Serialize};

/// `type` URI のベースパス
const PROBLEM_TYPE_BASE: &str = "https://academix.example.com/errors";

/// 通知 API が返す問題の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    /// メールアドレスの構文や `update_type` が不正
    ValidationError,
    /// 同期送信で SMTP 送信に失敗した
    DeliveryFailed,
    /// 配信キューが満杯、またはワーカーが停止している
    ServiceUnavailable,
    /// テンプレートの不備など、呼び出し元に原因のないエラー
    InternalError,
}

impl ProblemType {
    fn slug(self) -> &'static str {
        match self {
            Self::ValidationError => "validation-error",
            Self::DeliveryFailed => "delivery-failed",
            Self::ServiceUnavailable => "service-unavailable",
            Self::InternalError => "internal-error",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::ValidationError => "Validation Error",
            Self::DeliveryFailed => "Delivery Failed",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::InternalError => "Internal Server Error",
        }
    }

    /// HTTP ステータスコード
    pub fn status(self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::DeliveryFailed | Self::InternalError => 500,
            Self::ServiceUnavailable => 503,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    pub fn new(problem: ProblemType, detail: impl Into<String>) -> Self {
        Self {
            error_type: format!("{PROBLEM_TYPE_BASE}/{}", problem.slug()),
            title:      problem.title().to_string(),
            status:     problem.status(),
            detail:     detail.into(),
        }
    }

    pub fn validation_error(detail: impl Into<String>) -> Self {
        Self::new(ProblemType::ValidationError, detail)
    }

    /// 同期送信の失敗
    ///
    /// detail には送信エラーの原文（SMTP 応答など）を載せる。
    pub fn delivery_failed(detail: impl Into<String>) -> Self {
        Self::new(ProblemType::DeliveryFailed, detail)
    }

    pub fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(ProblemType::ServiceUnavailable, detail)
    }

    /// detail は固定文言で、内部の詳細は含めない
    pub fn internal_error() -> Self {
        Self::new(ProblemType::InternalError, "内部エラーが発生しました")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn 配信失敗はsmtp応答の原文をdetailに保持する() {
        let error = ErrorResponse::delivery_failed("535 5.7.8 Username and Password not accepted");

        assert_eq!(
            error.error_type,
            "https://academix.example.com/errors/delivery-failed"
        );
        assert_eq!(error.title, "Delivery Failed");
        assert_eq!(error.status, 500);
        assert_eq!(error.detail, "535 5.7.8 Username and Password not accepted");
    }

    #[test]
    fn 内部エラーは固定のdetailを返す() {
        let error = ErrorResponse::internal_error();

        assert_eq!(error.status, 500);
        assert_eq!(error.detail, "内部エラーが発生しました");
    }

    #[test]
    fn jsonではtypeフィールドとして出力される() {
        let error = ErrorResponse::validation_error("メールアドレスの形式が不正です");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(
            json["type"],
            "https://academix.example.com/errors/validation-error"
        );
        assert_eq!(json["status"], 400);
        assert!(json.get("error_type").is_none());
    }

    #[test]
    fn キュー利用不可は503になる() {
        let error = ErrorResponse::service_unavailable("配信キューが満杯です");

        assert_eq!(error.status, 503);
        assert_eq!(error.title, "Service Unavailable");
    }
}
