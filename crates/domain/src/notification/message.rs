//! 受信者 1 人分の通知メッセージ

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{NotificationEventType, event::EventUpdateType, event::StudentRef};
use crate::value_objects::Email;

/// 通知メッセージ
///
/// 受信者 1 人分のメール内容の意図を表す。TemplateRenderer はこの値だけから
/// 件名と本文を決定的に生成する。
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationMessage {
    /// 開講案内（学生向け）
    CourseCreation { course_name: String, semester: String },
    /// 担当教員の割当（教員向け）
    FacultyAssignmentToFaculty {
        faculty_name: String,
        subject_name: String,
        students:     Vec<StudentRef>,
    },
    /// 担当教員の割当（学生向け）
    FacultyAssignmentToStudent {
        student_name: String,
        faculty_name: String,
        subject_name: String,
    },
    /// 履修登録（教員向け）
    EnrollmentToFaculty {
        student_id:   String,
        student_name: String,
        subject_name: String,
    },
    /// 履修登録（学生向け）
    EnrollmentToStudent {
        student_name: String,
        subject_name: String,
    },
    /// 成績公開
    ResultRelease { exam_name: String },
    /// 留年通知
    StudentDetention { student_name: String, reason: String },
    /// 単位不足の警告
    CreditShortage {
        student_name:     String,
        current_credits:  f64,
        required_credits: f64,
    },
    /// イベントの中止・日程変更
    EventUpdate {
        event_name:  String,
        update_type: EventUpdateType,
        details:     String,
    },
    /// 仕入先からの出荷通知（店舗向け）
    StockDispatched {
        store_name:        String,
        supplier_name:     String,
        invoice_id:        String,
        items:             BTreeMap<String, u32>,
        expected_delivery: String,
    },
    /// 出荷通知の配信失敗（仕入先向け）
    DeliveryFailed {
        store_name:     String,
        store_email:    Email,
        supplier_name:  String,
        invoice_id:     String,
        failure_reason: String,
        failed_at:      DateTime<Utc>,
    },
}

impl NotificationMessage {
    /// メッセージの元になったイベント種別
    pub fn event_type(&self) -> NotificationEventType {
        match self {
            Self::CourseCreation { .. } => NotificationEventType::CourseCreation,
            Self::FacultyAssignmentToFaculty { .. } | Self::FacultyAssignmentToStudent { .. } => {
                NotificationEventType::FacultyAssignment
            }
            Self::EnrollmentToFaculty { .. } | Self::EnrollmentToStudent { .. } => {
                NotificationEventType::StudentEnrollment
            }
            Self::ResultRelease { .. } => NotificationEventType::ResultRelease,
            Self::StudentDetention { .. } => NotificationEventType::StudentDetention,
            Self::CreditShortage { .. } => NotificationEventType::CreditShortage,
            Self::EventUpdate { .. } => NotificationEventType::EventUpdate,
            Self::StockDispatched { .. } => NotificationEventType::StockDispatched,
            Self::DeliveryFailed { .. } => NotificationEventType::DeliveryFailed,
        }
    }
}

/// 単位数を表示用に整形する
///
/// 整数値でも小数点以下 1 桁を残す（`5` ではなく `5.0`）。
pub fn format_credits(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
