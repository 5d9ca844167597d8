//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|------------|------|
//! | [`AcademicNotification`] | 学務通知イベント | fire-and-forget で配信する 7 種類 |
//! | [`SupplierNotification`] | 仕入先通知イベント | 同期送信する 2 種類 |
//! | [`NotificationMessage`] | 通知メッセージ | 受信者 1 人分のメール内容の意図 |
//! | [`RenderedMessage`] | レンダリング済みメッセージ | 件名・プレーン本文・HTML 本文 |
//! | [`EmailMessage`] | メールメッセージ | 宛先付きのレンダリング済みメッセージ |
//! | [`DispatchResult`] | 配信結果 | 受信者ごとの送信成否 |
//! | [`NotificationLog`] | 通知ログ | アプリ内通知として記録するレコード |
//!
//! ## 設計方針
//!
//! - **イベントとメッセージの分離**: 1 イベントから受信者ごとのメッセージを導出する
//!   （履修登録なら教員向けと学生向けの 2 通）
//! - **テンプレート分離**: メール生成は TemplateRenderer（notification-service）が担当
//! - **fire-and-forget**: 学務通知の送信失敗は API 呼び出し元に返さない

mod event;
mod message;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

pub use self::{
    event::{
        AcademicNotification,
        DEFAULT_DETENTION_REASON,
        DispatchPlan,
        EventUpdateType,
        LogIntent,
        PlannedMessage,
        PlannedRecipient,
        ResultRecipient,
        StudentRef,
        SupplierNotification,
    },
    message::{NotificationMessage, format_credits},
};
use crate::value_objects::Email;

define_uuid_id! {
    /// 通知ログ ID（一意識別子）
    ///
    /// UUID v7 を使用する。
    pub struct NotificationLogId;
}

/// 通知送信エラー
///
/// SMTP の失敗は原因ごとに区別するが、fire-and-forget 経路では
/// いずれも失敗した [`DispatchResult`] として一律に扱われる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// SMTP 認証に失敗（資格情報の誤り）
    #[error("SMTP 認証に失敗: {0}")]
    AuthenticationFailed(String),

    /// SMTP リレーへの接続・TLS 確立・タイムアウト
    #[error("SMTP 接続に失敗: {0}")]
    ConnectionFailed(String),

    /// 送信元・宛先アドレスが SMTP で扱えない
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),

    /// その他の送信エラー
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

/// 通知イベント種別
///
/// ログの `notification.event_type` フィールドに出力される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationEventType {
    CourseCreation,
    FacultyAssignment,
    StudentEnrollment,
    ResultRelease,
    StudentDetention,
    CreditShortage,
    EventUpdate,
    StockDispatched,
    DeliveryFailed,
}

/// 通知カテゴリ
///
/// アプリ内通知（ダッシュボード）での分類。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    /// 開講案内
    Academic,
    /// 担当教員の割当
    Faculty,
    /// 履修登録
    Enrollment,
    /// 成績公開
    Exam,
    /// 留年（管理者からの警告）
    AdminAlert,
    /// 単位不足の警告
    AcademicAlert,
}

/// レンダリング済みメッセージ
///
/// TemplateRenderer の出力。同じ [`NotificationMessage`] からは常に同じ値が得られる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// 件名
    pub subject:   String,
    /// プレーンテキスト本文（常に存在する）
    pub text_body: String,
    /// HTML 本文（装飾用。情報はプレーン本文にもすべて含まれる）
    pub html_body: Option<String>,
}

/// メールメッセージ
///
/// 宛先 1 件に対するレンダリング済みメッセージ。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        Email,
    /// 件名
    pub subject:   String,
    /// プレーンテキスト本文
    pub text_body: String,
    /// HTML 本文（ある場合は multipart/alternative で送信する）
    pub html_body: Option<String>,
}

impl EmailMessage {
    /// レンダリング済みメッセージに宛先を付ける
    pub fn new(to: Email, rendered: RenderedMessage) -> Self {
        Self {
            to,
            subject: rendered.subject,
            text_body: rendered.text_body,
            html_body: rendered.html_body,
        }
    }
}

/// 配信結果
///
/// 受信者 1 件ごとの送信結果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub success:      bool,
    pub error_detail: Option<String>,
}

impl DispatchResult {
    pub fn succeeded() -> Self {
        Self {
            success:      true,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success:      false,
            error_detail: Some(detail.into()),
        }
    }
}

impl From<&Result<(), NotificationError>> for DispatchResult {
    fn from(result: &Result<(), NotificationError>) -> Self {
        match result {
            Ok(()) => Self::succeeded(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// 通知ログ
///
/// アプリ内通知として記録するレコード。NotificationLogRepository に渡される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationLog {
    pub id:                NotificationLogId,
    /// 通知対象ユーザーの識別子（学籍番号・教員 ID・メールアドレス）
    pub recipient_user_id: String,
    pub title:             String,
    pub message:           String,
    pub category:          NotificationCategory,
    pub created_at:        DateTime<Utc>,
    pub is_read:           bool,
}

impl NotificationLog {
    /// ログ記録の意図と本文から未読の通知ログを作成する
    pub fn new(intent: LogIntent, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: NotificationLogId::new(),
            recipient_user_id: intent.recipient_user_id,
            title: intent.title,
            message: message.into(),
            category: intent.category,
            created_at,
            is_read: false,
        }
    }
}
