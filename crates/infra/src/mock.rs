//! # テスト用モック
//!
//! ユースケース・ハンドラのテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! academix-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use academix_domain::notification::{EmailMessage, NotificationError, NotificationLog};
use async_trait::async_trait;

use crate::{
    error::InfraError,
    notification::NotificationSender,
    notification_log::NotificationLogRepository,
};

// ===== MockNotificationSender =====

/// 送信内容を記録するモック送信
///
/// `failing()` で作成すると、すべての送信が指定したエラーで失敗する。
/// 失敗した送信も `attempts()` には記録される。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    attempts: Arc<Mutex<Vec<EmailMessage>>>,
    sent:     Arc<Mutex<Vec<EmailMessage>>>,
    failure:  Option<NotificationError>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に `error` で失敗するモックを作成する
    pub fn failing(error: NotificationError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 成否に関わらず send_email に渡されたメール
    pub fn attempts(&self) -> Vec<EmailMessage> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        self.attempts.lock().unwrap().push(email.clone());
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockNotificationLogRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationLogRepository {
    logs:    Arc<Mutex<Vec<NotificationLog>>>,
    failing: bool,
}

impl MockNotificationLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に記録に失敗するモックを作成する
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn logs(&self) -> Vec<NotificationLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationLogRepository for MockNotificationLogRepository {
    async fn record(&self, log: &NotificationLog) -> Result<(), InfraError> {
        if self.failing {
            return Err(InfraError::unavailable("mock notification log is failing"));
        }
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
}
