//! # 通知サービス
//!
//! 配信計画の展開 → テンプレートレンダリング → キュー投入（または同期送信）を統合するサービス。
//!
//! ## 設計方針
//!
//! - **学務通知は fire-and-forget**: `enqueue()` はジョブを積んだ時点で受信者数を返す。
//!   送信の成否は呼び出し元に返らない
//! - **仕入先通知は同期送信**: `send_now()` は送信失敗をエラーとして返す
//! - **レンダリングはキュー投入前**: テンプレートの不備は 500 として即座に返る
//! - **依存性注入**: `NotificationSender` と `Clock` は trait で抽象化

use std::sync::Arc;

use academix_domain::{
    clock::Clock,
    notification::{AcademicNotification, EmailMessage, SupplierNotification},
};
use academix_infra::notification::NotificationSender;
use academix_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{
    TemplateRenderer,
    dispatcher::{Delivery, DispatchJob, DispatchQueue},
};
use crate::error::ServiceError;

/// 通知サービス
pub struct NotificationService {
    sender:            Arc<dyn NotificationSender>,
    template_renderer: Arc<TemplateRenderer>,
    queue:             DispatchQueue,
    clock:             Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        template_renderer: Arc<TemplateRenderer>,
        queue: DispatchQueue,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sender,
            template_renderer,
            queue,
            clock,
        }
    }

    /// 学務通知を配信キューに積む
    ///
    /// 戻り値はキューに積んだ配信（受信者）の数。受信者が 0 人なら何も積まずに 0 を返す。
    /// 同じ内容のメッセージは 1 回だけレンダリングする。
    pub fn enqueue(&self, notification: AcademicNotification) -> Result<usize, ServiceError> {
        let event_type = notification.event_type();
        let event_type_str: &str = event_type.into();

        let mut deliveries = Vec::new();
        for planned in notification.plan() {
            let rendered = self.template_renderer.render(&planned.message).inspect_err(|e| {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::TEMPLATE,
                    error.message = %e,
                    notification.event_type = event_type_str,
                    "通知テンプレートのレンダリングに失敗"
                );
            })?;
            deliveries.extend(planned.recipients.into_iter().map(|recipient| Delivery {
                email: EmailMessage::new(recipient.email, rendered.clone()),
                log:   recipient.log,
            }));
        }

        let count = deliveries.len();
        if count == 0 {
            tracing::info!(notification.event_type = event_type_str, "受信者がいないため配信をスキップ");
            return Ok(0);
        }

        match self.queue.try_enqueue(DispatchJob {
            event_type,
            deliveries,
        }) {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_QUEUED,
                    event.entity_type = event::entity_type::DISPATCH_JOB,
                    event.result = event::result::SUCCESS,
                    notification.event_type = event_type_str,
                    notification.recipient_count = count,
                    "通知を配信キューに投入"
                );
                Ok(count)
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_REJECTED,
                    event.entity_type = event::entity_type::DISPATCH_JOB,
                    event.result = event::result::FAILURE,
                    notification.event_type = event_type_str,
                    notification.recipient_count = count,
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::DISPATCH_QUEUE,
                    error.message = %e,
                    "通知の配信キュー投入を拒否"
                );
                Err(ServiceError::QueueUnavailable(e.to_string()))
            }
        }
    }

    /// 仕入先通知を同期送信する
    ///
    /// 送信失敗は [`ServiceError::Delivery`] として返す。
    pub async fn send_now(&self, notification: SupplierNotification) -> Result<(), ServiceError> {
        let event_type_str: &str = notification.event_type().into();
        let (to, message) = notification.into_message(self.clock.now());

        let rendered = self.template_renderer.render(&message).inspect_err(|e| {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::TEMPLATE,
                error.message = %e,
                notification.event_type = event_type_str,
                "通知テンプレートのレンダリングに失敗"
            );
        })?;
        let email = EmailMessage::new(to, rendered);

        match self.sender.send_email(&email).await {
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
                Ok(())
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
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use academix_domain::{
        clock::FixedClock,
        notification::{NotificationError, ResultRecipient, StudentRef},
        value_objects::Email,
    };
    use academix_infra::mock::MockNotificationSender;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    fn make_service(
        sender: MockNotificationSender,
        capacity: usize,
    ) -> (NotificationService, mpsc::Receiver<DispatchJob>) {
        let (queue, rx) = DispatchQueue::bounded(capacity);
        let service = NotificationService::new(
            Arc::new(sender),
            Arc::new(TemplateRenderer::new().unwrap()),
            queue,
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2026, 1, 15, 9, 5, 0).unwrap(),
            )),
        );
        (service, rx)
    }

    fn email(s: &str) -> Email {
        Email::new(s).unwrap()
    }

    fn result_release(ids: &[&str]) -> AcademicNotification {
        AcademicNotification::ResultRelease {
            exam_name: "Midterm 2026".to_string(),
            students:  ids
                .iter()
                .map(|id| ResultRecipient {
                    email: email(&format!("{}@example.com", id.to_lowercase())),
                    id:    id.to_string(),
                })
                .collect(),
        }
    }

    fn stock_dispatched() -> SupplierNotification {
        SupplierNotification::StockDispatched {
            to_email:          email("store@example.com"),
            store_name:        "Central Pharmacy".to_string(),
            supplier_name:     "MedSupply".to_string(),
            invoice_id:        "INV-42".to_string(),
            items:             BTreeMap::from([("Paracetamol".to_string(), 20)]),
            expected_delivery: "2026-01-20".to_string(),
        }
    }

    #[tokio::test]
    async fn 受信者ごとの配信を1ジョブとして積む() {
        let sender = MockNotificationSender::new();
        let (service, mut rx) = make_service(sender.clone(), 8);

        let count = service.enqueue(result_release(&["S-1", "S-2"])).unwrap();

        assert_eq!(count, 2);
        let job = rx.try_recv().unwrap();
        assert_eq!(job.deliveries.len(), 2);
        assert_eq!(job.deliveries[0].email.to.as_str(), "s-1@example.com");
        assert_eq!(job.deliveries[0].email.subject, "Results Released – Midterm 2026");
        assert_eq!(
            job.deliveries[1].log.as_ref().unwrap().recipient_user_id,
            "S-2"
        );
        // キュー投入時点では送信しない
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test]
    async fn 受信者が0人ならジョブを積まない() {
        let (service, mut rx) = make_service(MockNotificationSender::new(), 8);

        let count = service.enqueue(result_release(&[])).unwrap();

        assert_eq!(count, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn メールアドレスのない学生には送らず名簿には載せる() {
        let (service, mut rx) = make_service(MockNotificationSender::new(), 8);

        let count = service
            .enqueue(AcademicNotification::FacultyAssignment {
                faculty_id:    "F-1".to_string(),
                faculty_email: email("faculty@example.com"),
                faculty_name:  "Dr. Rao".to_string(),
                subject_name:  "Compilers".to_string(),
                students:      vec![
                    StudentRef {
                        name:        "Asha".to_string(),
                        email:       Some(email("asha@example.com")),
                        roll_number: Some("R-01".to_string()),
                    },
                    StudentRef {
                        name:        "Vikram".to_string(),
                        email:       None,
                        roll_number: None,
                    },
                ],
            })
            .unwrap();

        assert_eq!(count, 2);
        let job = rx.try_recv().unwrap();
        let roster = &job.deliveries[0].email.text_body;
        assert!(roster.contains("Asha (R-01)"));
        assert!(roster.contains("Vikram (N/A)"));
        assert_eq!(job.deliveries[1].email.to.as_str(), "asha@example.com");
        assert!(job.deliveries[1].log.is_none());
    }

    #[tokio::test]
    async fn キューが満杯ならqueue_unavailableを返す() {
        let (service, _rx) = make_service(MockNotificationSender::new(), 1);
        service.enqueue(result_release(&["S-1"])).unwrap();

        let result = service.enqueue(result_release(&["S-2"]));

        assert!(matches!(result, Err(ServiceError::QueueUnavailable(_))));
    }

    #[tokio::test]
    async fn ワーカー停止後はqueue_unavailableを返す() {
        let (service, rx) = make_service(MockNotificationSender::new(), 8);
        drop(rx);

        let result = service.enqueue(result_release(&["S-1"]));

        assert!(matches!(result, Err(ServiceError::QueueUnavailable(_))));
    }

    #[tokio::test]
    async fn 仕入先通知は即座に送信する() {
        let sender = MockNotificationSender::new();
        let (service, _rx) = make_service(sender.clone(), 8);

        service.send_now(stock_dispatched()).await.unwrap();

        let sent = sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.as_str(), "store@example.com");
        assert_eq!(
            sent[0].subject,
            "Stock Dispatched to Central Pharmacy | Invoice #INV-42"
        );
        assert!(sent[0].html_body.is_some());
    }

    #[tokio::test]
    async fn 配信失敗通知には現在時刻が記載される() {
        let sender = MockNotificationSender::new();
        let (service, _rx) = make_service(sender.clone(), 8);

        service
            .send_now(SupplierNotification::DeliveryFailed {
                to_email:       email("supplier@example.com"),
                store_name:     "Central Pharmacy".to_string(),
                store_email:    email("store@example.com"),
                supplier_name:  "MedSupply".to_string(),
                invoice_id:     "INV-42".to_string(),
                failure_reason: "Mailbox full".to_string(),
            })
            .await
            .unwrap();

        assert!(
            sender.sent_emails()[0]
                .text_body
                .contains("15 Jan 2026, 09:05 UTC")
        );
    }

    #[tokio::test]
    async fn 同期送信の失敗はdeliveryエラーとして返す() {
        let sender = MockNotificationSender::failing(NotificationError::AuthenticationFailed(
            "535 5.7.8 Username and Password not accepted".to_string(),
        ));
        let (service, _rx) = make_service(sender.clone(), 8);

        let result = service.send_now(stock_dispatched()).await;

        assert!(matches!(
            result,
            Err(ServiceError::Delivery(NotificationError::AuthenticationFailed(_)))
        ));
        assert_eq!(sender.attempts().len(), 1);
    }
}
