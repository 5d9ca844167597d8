//! # ヘルスチェック共通型
//!
//! `/health`（liveness）と `/api/v1/status`（サービス状態）で使用される
//! レスポンス型を提供する。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// ヘルスチェックレスポンス
///
/// ## 使用例
///
/// ```
/// use academix_shared::HealthResponse;
///
/// let response = HealthResponse::ok();
/// assert_eq!(response.status, "ok");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 稼働状態（常に `"ok"`）
    pub status: String,
}

impl HealthResponse {
    /// 稼働中を表すレスポンスを作成する
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// サービス状態レスポンス
///
/// 稼働時間とサービス名を含む。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatusResponse {
    /// 稼働状態（常に `"success"`）
    pub status:  String,
    /// 起動からの経過時間（例: `"1h 02m 03s"`）
    pub uptime:  String,
    /// サービス名
    pub service: String,
}

impl ServiceStatusResponse {
    /// 経過時間からレスポンスを作成する
    pub fn new(service: impl Into<String>, uptime: Duration) -> Self {
        Self {
            status:  "success".to_string(),
            uptime:  format_uptime(uptime),
            service: service.into(),
        }
    }
}

/// 経過時間を `"{h}h {mm}m {ss}s"` 形式に整形する
fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}h {minutes:02}m {seconds:02}s")
}
