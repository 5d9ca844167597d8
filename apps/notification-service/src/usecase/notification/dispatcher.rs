//! # 配信キュー
//!
//! fire-and-forget 経路のメール送信をリクエスト処理から切り離す。
//!
//! ## 設計方針
//!
//! - **有界キュー**: `tokio::sync::mpsc` の有界チャネル。満杯ならリクエストを 503 で拒否する
//! - **ジョブ単位の受け付け**: 1 リクエスト分の配信を 1 ジョブにまとめ、`try_send` で一括投入する
//!   （一部だけ積まれることはない）
//! - **並行度の制限**: ワーカーは Semaphore で同時処理ジョブ数を制限する。ジョブ内の配信は順番に行う
//! - **Graceful shutdown**: 全ての [`DispatchQueue`] が drop されるとワーカーは残りのジョブを処理して終了する

use std::sync::Arc;

use academix_domain::{
    clock::Clock,
    notification::{
        DispatchResult,
        EmailMessage,
        LogIntent,
        NotificationEventType,
        NotificationLog,
    },
};
use academix_infra::{
    notification::NotificationSender,
    notification_log::NotificationLogRepository,
};
use academix_shared::{
    event_log::{error, event},
    log_business_event,
};
use thiserror::Error;
use tokio::{
    sync::{Semaphore, mpsc},
    task::{JoinHandle, JoinSet},
};

/// 1 受信者分の配信
#[derive(Debug, Clone)]
pub struct Delivery {
    pub email: EmailMessage,
    /// 送信後に記録する通知ログ（記録しない配信は `None`）
    pub log:   Option<LogIntent>,
}

/// 1 リクエスト分の配信ジョブ
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub event_type: NotificationEventType,
    pub deliveries: Vec<Delivery>,
}

/// ジョブ投入エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("配信キューが満杯です")]
    Full,

    #[error("配信ワーカーが停止しています")]
    Closed,
}

/// 配信キューの送信側ハンドル
///
/// Clone して各リクエストで共有する。
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::Sender<DispatchJob>,
}

impl DispatchQueue {
    /// 有界キューを作成する
    ///
    /// 返される受信側は [`DispatchWorker::spawn`] に渡す。
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<DispatchJob>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// ジョブをキューに投入する（待たない）
    pub fn try_enqueue(&self, job: DispatchJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// 配信に必要な依存
#[derive(Clone)]
pub struct DispatchContext {
    pub sender:   Arc<dyn NotificationSender>,
    pub log_repo: Arc<dyn NotificationLogRepository>,
    pub clock:    Arc<dyn Clock>,
}

/// 配信ワーカー
///
/// キューからジョブを取り出し、並行度の上限内で送信する。
pub struct DispatchWorker {
    handle: JoinHandle<()>,
}

impl DispatchWorker {
    /// ワーカーを起動する
    pub fn spawn(
        mut rx: mpsc::Receiver<DispatchJob>,
        context: DispatchContext,
        concurrency: usize,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
            let mut tasks = JoinSet::new();

            while let Some(job) = rx.recv().await {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let context = context.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    run_job(&context, job).await;
                });

                // 完了済みタスクを回収する
                while tasks.try_join_next().is_some() {}
            }

            while tasks.join_next().await.is_some() {}
            tracing::info!("配信ワーカーを停止しました");
        });

        Self { handle }
    }

    /// キューが閉じられた後、残りのジョブが全て終わるまで待つ
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "配信ワーカーが異常終了しました");
        }
    }
}

/// ジョブ内の配信を順番に実行する
///
/// 送信失敗は呼び出し元に返さず、業務イベントとしてログに残す。
pub async fn run_job(context: &DispatchContext, job: DispatchJob) -> Vec<DispatchResult> {
    let event_type_str: &str = job.event_type.into();
    let mut results = Vec::with_capacity(job.deliveries.len());

    for Delivery { email, log } in job.deliveries {
        let outcome = context.sender.send_email(&email).await;

        match &outcome {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::EMAIL,
                    event.result = event::result::SUCCESS,
                    notification.event_type = event_type_str,
                    notification.recipient = %email.to,
                    "通知メール送信成功"
                );
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::EMAIL,
                    event.result = event::result::FAILURE,
                    notification.event_type = event_type_str,
                    notification.recipient = %email.to,
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::SMTP,
                    error.message = %e,
                    "通知メール送信失敗"
                );
            }
        }
        results.push(DispatchResult::from(&outcome));

        if let Some(intent) = log {
            let message = intent
                .message
                .clone()
                .unwrap_or_else(|| email.text_body.clone());
            let record = NotificationLog::new(intent, message, context.clock.now());
            if let Err(e) = context.log_repo.record(&record).await {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::NOTIFICATION_LOG,
                    error.message = %e,
                    notification_log.id = %record.id,
                    "通知ログの記録に失敗"
                );
            }
        }
    }

    results
}
