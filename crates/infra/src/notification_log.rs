//! # NotificationLogRepository
//!
//! アプリ内通知（ダッシュボード）用の通知ログを記録するリポジトリ。
//!
//! ## 設計方針
//!
//! - **fire-and-forget ログ**: 呼び出し側は結果を伝播しない（失敗はログ出力のみ）
//! - **永続化なし**: 既定実装は tracing に出力するだけで、ストレージには書き込まない
//! - **差し替え可能**: trait object として `NotificationService` に注入する

use academix_domain::notification::NotificationLog;
use async_trait::async_trait;

use crate::error::InfraError;

/// 通知ログリポジトリトレイト
#[async_trait]
pub trait NotificationLogRepository: Send + Sync {
    /// 通知ログを記録する
    async fn record(&self, log: &NotificationLog) -> Result<(), InfraError>;
}

/// tracing 出力のみの NotificationLogRepository
#[derive(Debug, Clone, Default)]
pub struct TracingNotificationLogRepository;

impl TracingNotificationLogRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationLogRepository for TracingNotificationLogRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(notification_log.id = %log.id))]
    async fn record(&self, log: &NotificationLog) -> Result<(), InfraError> {
        tracing::info!(
            notification_log.recipient_user_id = %log.recipient_user_id,
            notification_log.title = %log.title,
            notification_log.category = %log.category,
            notification_log.is_read = log.is_read,
            "通知ログを記録"
        );
        Ok(())
    }
}
