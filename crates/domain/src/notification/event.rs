//! 通知イベントと配信計画
//!
//! HTTP で受け取ったイベントを、受信者ごとのメッセージと通知ログの意図に展開する。

use std::{collections::BTreeMap, str::FromStr};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{NotificationCategory, NotificationEventType, message::NotificationMessage};
use crate::{DomainError, notification::message::format_credits, value_objects::Email};

/// 留年理由が省略されたときの既定値
pub const DEFAULT_DETENTION_REASON: &str = "Academic Performance / Attendance Shortage";

/// イベントの更新種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventUpdateType {
    Cancelled,
    Rescheduled,
}

impl FromStr for EventUpdateType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANCELLED" => Ok(Self::Cancelled),
            "RESCHEDULED" => Ok(Self::Rescheduled),
            other => Err(DomainError::Validation(format!(
                "update_type は CANCELLED または RESCHEDULED である必要があります: {other}"
            ))),
        }
    }
}

/// 学生の参照（担当教員の割当で使う名簿の 1 行）
///
/// メールアドレスのない学生にはメールを送らないが、教員向けの名簿には載る。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRef {
    pub name:        String,
    pub email:       Option<Email>,
    pub roll_number: Option<String>,
}

/// 成績公開の受信者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecipient {
    pub email: Email,
    pub id:    String,
}

/// 通知ログ記録の意図
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIntent {
    pub recipient_user_id: String,
    pub title:             String,
    pub category:          NotificationCategory,
    /// ログ本文。`None` のときはレンダリング済みのプレーン本文を使う
    pub message:           Option<String>,
}

impl LogIntent {
    pub fn new(
        recipient_user_id: impl Into<String>,
        title: impl Into<String>,
        category: NotificationCategory,
    ) -> Self {
        Self {
            recipient_user_id: recipient_user_id.into(),
            title: title.into(),
            category,
            message: None,
        }
    }

    /// プレーン本文の代わりに使うログ本文を指定する
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// 配信先 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRecipient {
    pub email: Email,
    pub log:   Option<LogIntent>,
}

impl PlannedRecipient {
    fn mail_only(email: Email) -> Self {
        Self { email, log: None }
    }

    fn logged(email: Email, log: LogIntent) -> Self {
        Self {
            email,
            log: Some(log),
        }
    }
}

/// 同じ内容を送る受信者のまとまり
///
/// メッセージは 1 回だけレンダリングされ、全受信者で共有される。
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMessage {
    pub message:    NotificationMessage,
    pub recipients: Vec<PlannedRecipient>,
}

/// イベントから展開した配信計画
pub type DispatchPlan = Vec<PlannedMessage>;

/// 学務通知イベント
///
/// fire-and-forget で配信される。
#[derive(Debug, Clone, PartialEq)]
pub enum AcademicNotification {
    CourseCreation {
        course_name:    String,
        semester:       String,
        student_emails: Vec<Email>,
    },
    FacultyAssignment {
        faculty_id:    String,
        faculty_email: Email,
        faculty_name:  String,
        subject_name:  String,
        students:      Vec<StudentRef>,
    },
    StudentEnrollment {
        student_id:    String,
        student_name:  String,
        student_email: Email,
        subject_name:  String,
        faculty_id:    String,
        faculty_email: Email,
    },
    ResultRelease {
        exam_name: String,
        students:  Vec<ResultRecipient>,
    },
    StudentDetention {
        student_id:    String,
        student_name:  String,
        student_email: Email,
        reason:        String,
    },
    CreditShortage {
        student_id:       String,
        student_name:     String,
        student_email:    Email,
        current_credits:  f64,
        required_credits: f64,
    },
    EventUpdate {
        event_name:  String,
        update_type: EventUpdateType,
        details:     String,
        recipients:  Vec<Email>,
    },
}

impl AcademicNotification {
    pub fn event_type(&self) -> NotificationEventType {
        match self {
            Self::CourseCreation { .. } => NotificationEventType::CourseCreation,
            Self::FacultyAssignment { .. } => NotificationEventType::FacultyAssignment,
            Self::StudentEnrollment { .. } => NotificationEventType::StudentEnrollment,
            Self::ResultRelease { .. } => NotificationEventType::ResultRelease,
            Self::StudentDetention { .. } => NotificationEventType::StudentDetention,
            Self::CreditShortage { .. } => NotificationEventType::CreditShortage,
            Self::EventUpdate { .. } => NotificationEventType::EventUpdate,
        }
    }

    /// 受信者ごとのメッセージと通知ログの意図に展開する
    ///
    /// 受信者が 0 人のメッセージは計画に含めない。
    pub fn plan(&self) -> DispatchPlan {
        let plan = match self {
            Self::CourseCreation {
                course_name,
                semester,
                student_emails,
            } => vec![PlannedMessage {
                message:    NotificationMessage::CourseCreation {
                    course_name: course_name.clone(),
                    semester:    semester.clone(),
                },
                recipients: student_emails
                    .iter()
                    .map(|email| {
                        PlannedRecipient::logged(
                            email.clone(),
                            LogIntent::new(
                                email.as_str(),
                                "Course Registration Open",
                                NotificationCategory::Academic,
                            ),
                        )
                    })
                    .collect(),
            }],
            Self::FacultyAssignment {
                faculty_id,
                faculty_email,
                faculty_name,
                subject_name,
                students,
            } => {
                let mut plan = vec![PlannedMessage {
                    message:    NotificationMessage::FacultyAssignmentToFaculty {
                        faculty_name: faculty_name.clone(),
                        subject_name: subject_name.clone(),
                        students:     students.clone(),
                    },
                    recipients: vec![PlannedRecipient::logged(
                        faculty_email.clone(),
                        LogIntent::new(
                            faculty_id.as_str(),
                            "New Teaching Assignment",
                            NotificationCategory::Faculty,
                        ),
                    )],
                }];
                plan.extend(students.iter().filter_map(|student| {
                    let email = student.email.clone()?;
                    Some(PlannedMessage {
                        message:    NotificationMessage::FacultyAssignmentToStudent {
                            student_name: student.name.clone(),
                            faculty_name: faculty_name.clone(),
                            subject_name: subject_name.clone(),
                        },
                        recipients: vec![PlannedRecipient::mail_only(email)],
                    })
                }));
                plan
            }
            Self::StudentEnrollment {
                student_id,
                student_name,
                student_email,
                subject_name,
                faculty_id,
                faculty_email,
            } => vec![
                PlannedMessage {
                    message:    NotificationMessage::EnrollmentToFaculty {
                        student_id:   student_id.clone(),
                        student_name: student_name.clone(),
                        subject_name: subject_name.clone(),
                    },
                    recipients: vec![PlannedRecipient::logged(
                        faculty_email.clone(),
                        LogIntent::new(
                            faculty_id.as_str(),
                            "New Student Enrollment",
                            NotificationCategory::Enrollment,
                        ),
                    )],
                },
                PlannedMessage {
                    message:    NotificationMessage::EnrollmentToStudent {
                        student_name: student_name.clone(),
                        subject_name: subject_name.clone(),
                    },
                    recipients: vec![PlannedRecipient::logged(
                        student_email.clone(),
                        LogIntent::new(
                            student_id.as_str(),
                            "Course Enrollment Confirmation",
                            NotificationCategory::Enrollment,
                        ),
                    )],
                },
            ],
            Self::ResultRelease {
                exam_name,
                students,
            } => vec![PlannedMessage {
                message:    NotificationMessage::ResultRelease {
                    exam_name: exam_name.clone(),
                },
                recipients: students
                    .iter()
                    .map(|student| {
                        PlannedRecipient::logged(
                            student.email.clone(),
                            LogIntent::new(
                                student.id.as_str(),
                                "Results Published",
                                NotificationCategory::Exam,
                            ),
                        )
                    })
                    .collect(),
            }],
            Self::StudentDetention {
                student_id,
                student_name,
                student_email,
                reason,
            } => vec![PlannedMessage {
                message:    NotificationMessage::StudentDetention {
                    student_name: student_name.clone(),
                    reason:       reason.clone(),
                },
                recipients: vec![PlannedRecipient::logged(
                    student_email.clone(),
                    LogIntent::new(
                        student_id.as_str(),
                        "Status Update: DETAINED",
                        NotificationCategory::AdminAlert,
                    )
                    .with_message(format!(
                        "Academic status changed to DETAINED. Reason: {reason}"
                    )),
                )],
            }],
            Self::CreditShortage {
                student_id,
                student_name,
                student_email,
                current_credits,
                required_credits,
            } => vec![PlannedMessage {
                message:    NotificationMessage::CreditShortage {
                    student_name:     student_name.clone(),
                    current_credits:  *current_credits,
                    required_credits: *required_credits,
                },
                recipients: vec![PlannedRecipient::logged(
                    student_email.clone(),
                    LogIntent::new(
                        student_id.as_str(),
                        "Status Warning: Credit Shortage",
                        NotificationCategory::AcademicAlert,
                    )
                    .with_message(format!(
                        "Credit Shortage detected ({}/{}). Risk of detention.",
                        format_credits(*current_credits),
                        format_credits(*required_credits)
                    )),
                )],
            }],
            Self::EventUpdate {
                event_name,
                update_type,
                details,
                recipients,
            } => vec![PlannedMessage {
                message:    NotificationMessage::EventUpdate {
                    event_name:  event_name.clone(),
                    update_type: *update_type,
                    details:     details.clone(),
                },
                recipients: recipients
                    .iter()
                    .cloned()
                    .map(PlannedRecipient::mail_only)
                    .collect(),
            }],
        };

        plan.into_iter()
            .filter(|planned| !planned.recipients.is_empty())
            .collect()
    }
}

/// 仕入先通知イベント
///
/// 同期送信され、送信失敗は呼び出し元に返される。
#[derive(Debug, Clone, PartialEq)]
pub enum SupplierNotification {
    StockDispatched {
        to_email:          Email,
        store_name:        String,
        supplier_name:     String,
        invoice_id:        String,
        items:             BTreeMap<String, u32>,
        expected_delivery: String,
    },
    DeliveryFailed {
        to_email:       Email,
        store_name:     String,
        store_email:    Email,
        supplier_name:  String,
        invoice_id:     String,
        failure_reason: String,
    },
}

impl SupplierNotification {
    pub fn event_type(&self) -> NotificationEventType {
        match self {
            Self::StockDispatched { .. } => NotificationEventType::StockDispatched,
            Self::DeliveryFailed { .. } => NotificationEventType::DeliveryFailed,
        }
    }

    /// 送信先と送信するメッセージに分解する
    ///
    /// `now` は配信失敗通知に記載する時刻として使う。
    pub fn into_message(self, now: DateTime<Utc>) -> (Email, NotificationMessage) {
        match self {
            Self::StockDispatched {
                to_email,
                store_name,
                supplier_name,
                invoice_id,
                items,
                expected_delivery,
            } => (
                to_email,
                NotificationMessage::StockDispatched {
                    store_name,
                    supplier_name,
                    invoice_id,
                    items,
                    expected_delivery,
                },
            ),
            Self::DeliveryFailed {
                to_email,
                store_name,
                store_email,
                supplier_name,
                invoice_id,
                failure_reason,
            } => (
                to_email,
                NotificationMessage::DeliveryFailed {
                    store_name,
                    store_email,
                    supplier_name,
                    invoice_id,
                    failure_reason,
                    failed_at: now,
                },
            ),
        }
    }
}
