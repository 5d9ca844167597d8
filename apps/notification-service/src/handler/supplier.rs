//! # 仕入先通知ハンドラ
//!
//! 仕入先から店舗への通知を同期送信する。送信に失敗すると 500 を返し、
//! `detail` に送信エラーの内容を含める。
//!
//! ## エンドポイント
//!
//! - `POST /email/supplier-to-store` - 出荷通知
//! - `POST /email/supplier-delivery-failed` - 配信失敗の報告

use std::{collections::BTreeMap, sync::Arc};

use academix_domain::{DomainError, notification::SupplierNotification, value_objects::Email};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::NotifyState;
use crate::error::ServiceError;

/// 送信完了レスポンス
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SentResponse {
    pub status: String,
}

impl SentResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StockDispatchedRequest {
    pub to_email:          String,
    pub store_name:        String,
    pub supplier_name:     String,
    pub invoice_id:        String,
    /// 品名 → 数量
    pub items:             BTreeMap<String, u32>,
    pub expected_delivery: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryFailedRequest {
    pub to_email:       String,
    pub store_name:     String,
    pub store_email:    String,
    pub supplier_name:  String,
    pub invoice_id:     String,
    pub failure_reason: String,
}

impl TryFrom<StockDispatchedRequest> for SupplierNotification {
    type Error = DomainError;

    fn try_from(req: StockDispatchedRequest) -> Result<Self, Self::Error> {
        Ok(Self::StockDispatched {
            to_email:          Email::new(req.to_email)?,
            store_name:        req.store_name,
            supplier_name:     req.supplier_name,
            invoice_id:        req.invoice_id,
            items:             req.items,
            expected_delivery: req.expected_delivery,
        })
    }
}

impl TryFrom<DeliveryFailedRequest> for SupplierNotification {
    type Error = DomainError;

    fn try_from(req: DeliveryFailedRequest) -> Result<Self, Self::Error> {
        Ok(Self::DeliveryFailed {
            to_email:       Email::new(req.to_email)?,
            store_name:     req.store_name,
            store_email:    Email::new(req.store_email)?,
            supplier_name:  req.supplier_name,
            invoice_id:     req.invoice_id,
            failure_reason: req.failure_reason,
        })
    }
}

/// POST /email/supplier-to-store
pub async fn notify_stock_dispatched(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<StockDispatchedRequest>,
) -> Result<Json<SentResponse>, ServiceError> {
    state.service.send_now(req.try_into()?).await?;
    Ok(Json(SentResponse::success()))
}

/// POST /email/supplier-delivery-failed
///
/// 店舗への通知が届かなかったことを仕入先に知らせる。
pub async fn notify_delivery_failed(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<DeliveryFailedRequest>,
) -> Result<Json<SentResponse>, ServiceError> {
    state.service.send_now(req.try_into()?).await?;
    Ok(Json(SentResponse::success()))
}
