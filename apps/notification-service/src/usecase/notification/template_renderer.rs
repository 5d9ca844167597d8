//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールの件名・プレーン本文・HTML 本文を生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **プレーン本文は必須**: HTML は装飾で、同じ情報をプレーン本文にも必ず含める
//! - **共通レイアウト**: HTML は `layout.html` を継承し、アクセント色・バッジ・見出しだけを差し替える
//! - **純粋関数**: 同じ [`NotificationMessage`] からは常に同じ結果を返す（I/O なし）

use academix_domain::notification::{
    EventUpdateType,
    NotificationError,
    NotificationMessage,
    RenderedMessage,
    StudentRef,
    format_credits,
};
use serde::Serialize;
use tera::{Context, Tera};

/// 配信失敗通知に記載する時刻の書式
const FAILURE_TIMESTAMP_FORMAT: &str = "%d %b %Y, %H:%M UTC";

const ACADEMIC_BADGE: &str = "ACADEMIX AI";
const SUPPLIER_BADGE: &str = "SynapStore";

/// HTML レイアウトのパラメータ
struct Layout {
    accent_color:     &'static str,
    accent_secondary: &'static str,
    badge:            &'static str,
    title:            String,
    footer:           &'static str,
}

/// テンプレート名、件名、コンテキスト、HTML レイアウト
struct TemplateParams {
    template_name: &'static str,
    subject:       String,
    context:       Context,
    layout:        Option<Layout>,
}

/// 出荷明細の 1 行
#[derive(Serialize)]
struct ItemRow<'a> {
    name:     &'a str,
    quantity: u32,
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、`NotificationMessage` から
/// `RenderedMessage` を生成する。
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new() -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "layout.html",
                    include_str!("../../../templates/notifications/layout.html"),
                ),
                (
                    "course_creation.txt",
                    include_str!("../../../templates/notifications/course_creation.txt"),
                ),
                (
                    "faculty_assignment_faculty.txt",
                    include_str!("../../../templates/notifications/faculty_assignment_faculty.txt"),
                ),
                (
                    "faculty_assignment_student.txt",
                    include_str!("../../../templates/notifications/faculty_assignment_student.txt"),
                ),
                (
                    "enrollment_faculty.txt",
                    include_str!("../../../templates/notifications/enrollment_faculty.txt"),
                ),
                (
                    "enrollment_student.txt",
                    include_str!("../../../templates/notifications/enrollment_student.txt"),
                ),
                (
                    "result_release.txt",
                    include_str!("../../../templates/notifications/result_release.txt"),
                ),
                (
                    "student_detention.txt",
                    include_str!("../../../templates/notifications/student_detention.txt"),
                ),
                (
                    "student_detention.html",
                    include_str!("../../../templates/notifications/student_detention.html"),
                ),
                (
                    "credit_shortage.txt",
                    include_str!("../../../templates/notifications/credit_shortage.txt"),
                ),
                (
                    "credit_shortage.html",
                    include_str!("../../../templates/notifications/credit_shortage.html"),
                ),
                (
                    "event_update.txt",
                    include_str!("../../../templates/notifications/event_update.txt"),
                ),
                (
                    "event_update.html",
                    include_str!("../../../templates/notifications/event_update.html"),
                ),
                (
                    "stock_dispatched.txt",
                    include_str!("../../../templates/notifications/stock_dispatched.txt"),
                ),
                (
                    "stock_dispatched.html",
                    include_str!("../../../templates/notifications/stock_dispatched.html"),
                ),
                (
                    "delivery_failed.txt",
                    include_str!("../../../templates/notifications/delivery_failed.txt"),
                ),
                (
                    "delivery_failed.html",
                    include_str!("../../../templates/notifications/delivery_failed.html"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 通知メッセージから件名と本文を生成する
    #[tracing::instrument(
        skip_all,
        level = "debug",
        fields(notification.event_type = %message.event_type())
    )]
    pub fn render(&self, message: &NotificationMessage) -> Result<RenderedMessage, NotificationError> {
        let TemplateParams {
            template_name,
            subject,
            mut context,
            layout,
        } = build_template_params(message);

        let text_body = self
            .engine
            .render(&format!("{template_name}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let html_body = match layout {
            Some(layout) => {
                context.insert("accent_color", layout.accent_color);
                context.insert("accent_secondary", layout.accent_secondary);
                context.insert("badge", layout.badge);
                context.insert("title", &layout.title);
                context.insert("footer", layout.footer);
                let html = self
                    .engine
                    .render(&format!("{template_name}.html"), &context)
                    .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
                Some(html)
            }
            None => None,
        };

        Ok(RenderedMessage {
            subject,
            text_body,
            html_body,
        })
    }
}

/// テンプレート名、件名、コンテキストを構築する
fn build_template_params(message: &NotificationMessage) -> TemplateParams {
    let mut context = Context::new();

    let (template_name, subject, layout) = match message {
        NotificationMessage::CourseCreation {
            course_name,
            semester,
        } => {
            context.insert("course_name", course_name);
            context.insert("semester", semester);
            (
                "course_creation",
                format!("New Courses Available – {semester}"),
                None,
            )
        }
        NotificationMessage::FacultyAssignmentToFaculty {
            faculty_name,
            subject_name,
            students,
        } => {
            context.insert("faculty_name", faculty_name);
            context.insert("subject_name", subject_name);
            context.insert("roster", &roster_lines(students));
            (
                "faculty_assignment_faculty",
                "New Teaching Assignment".to_string(),
                None,
            )
        }
        NotificationMessage::FacultyAssignmentToStudent {
            student_name,
            faculty_name,
            subject_name,
        } => {
            context.insert("student_name", student_name);
            context.insert("faculty_name", faculty_name);
            context.insert("subject_name", subject_name);
            (
                "faculty_assignment_student",
                format!("Faculty Assigned for {subject_name}"),
                None,
            )
        }
        NotificationMessage::EnrollmentToFaculty {
            student_id,
            student_name,
            subject_name,
        } => {
            context.insert("student_id", student_id);
            context.insert("student_name", student_name);
            context.insert("subject_name", subject_name);
            (
                "enrollment_faculty",
                format!("New Enrollment – {subject_name}"),
                None,
            )
        }
        NotificationMessage::EnrollmentToStudent {
            student_name,
            subject_name,
        } => {
            context.insert("student_name", student_name);
            context.insert("subject_name", subject_name);
            (
                "enrollment_student",
                format!("Enrolled Successfully: {subject_name}"),
                None,
            )
        }
        NotificationMessage::ResultRelease { exam_name } => {
            context.insert("exam_name", exam_name);
            (
                "result_release",
                format!("Results Released – {exam_name}"),
                None,
            )
        }
        NotificationMessage::StudentDetention {
            student_name,
            reason,
        } => {
            context.insert("student_name", student_name);
            context.insert("reason", reason);
            (
                "student_detention",
                "URGENT: Academic Status Update - DETAINED".to_string(),
                Some(Layout {
                    accent_color:     "#ef4444",
                    accent_secondary: "#b91c1c",
                    badge:            ACADEMIC_BADGE,
                    title:            "Status Update".to_string(),
                    footer:           "© AcademixAI Unified Systems • Administration Module",
                }),
            )
        }
        NotificationMessage::CreditShortage {
            student_name,
            current_credits,
            required_credits,
        } => {
            context.insert("student_name", student_name);
            context.insert("current_credits", &format_credits(*current_credits));
            context.insert("required_credits", &format_credits(*required_credits));
            (
                "credit_shortage",
                "Academic Warning: Credit Shortage Detected".to_string(),
                Some(Layout {
                    accent_color:     "#f59e0b",
                    accent_secondary: "#d97706",
                    badge:            ACADEMIC_BADGE,
                    title:            "Credit Alert".to_string(),
                    footer:           "© AcademixAI Unified Systems • Academic Surveillance",
                }),
            )
        }
        NotificationMessage::EventUpdate {
            event_name,
            update_type,
            details,
        } => {
            context.insert("event_name", event_name);
            context.insert("update_type", &update_type.to_string());
            context.insert("details", details);
            let (accent_color, accent_secondary) = match update_type {
                EventUpdateType::Cancelled => ("#ef4444", "#991b1b"),
                EventUpdateType::Rescheduled => ("#6366f1", "#4338ca"),
            };
            (
                "event_update",
                format!("URGENT: {event_name} {update_type}"),
                Some(Layout {
                    accent_color,
                    accent_secondary,
                    badge: ACADEMIC_BADGE,
                    title: event_name.clone(),
                    footer: "© Unified Academic Systems. This is an automated priority dispatch. Do not reply.",
                }),
            )
        }
        NotificationMessage::StockDispatched {
            store_name,
            supplier_name,
            invoice_id,
            items,
            expected_delivery,
        } => {
            let rows: Vec<ItemRow<'_>> = items
                .iter()
                .map(|(name, quantity)| ItemRow {
                    name,
                    quantity: *quantity,
                })
                .collect();
            context.insert("store_name", store_name);
            context.insert("supplier_name", supplier_name);
            context.insert("invoice_id", invoice_id);
            context.insert("items", &rows);
            context.insert("expected_delivery", expected_delivery);
            (
                "stock_dispatched",
                format!("Stock Dispatched to {store_name} | Invoice #{invoice_id}"),
                Some(Layout {
                    accent_color:     "#0ea5e9",
                    accent_secondary: "#0369a1",
                    badge:            SUPPLIER_BADGE,
                    title:            "Stock Dispatch Notification".to_string(),
                    footer:           "SynapStore transactional email",
                }),
            )
        }
        NotificationMessage::DeliveryFailed {
            store_name,
            store_email,
            supplier_name,
            invoice_id,
            failure_reason,
            failed_at,
        } => {
            context.insert("store_name", store_name);
            context.insert("store_email", store_email.as_str());
            context.insert("supplier_name", supplier_name);
            context.insert("invoice_id", invoice_id);
            context.insert("failure_reason", failure_reason);
            context.insert(
                "failed_at",
                &failed_at.format(FAILURE_TIMESTAMP_FORMAT).to_string(),
            );
            (
                "delivery_failed",
                format!("Delivery Notification Failed | Invoice #{invoice_id}"),
                Some(Layout {
                    accent_color:     "#d9534f",
                    accent_secondary: "#b52b27",
                    badge:            SUPPLIER_BADGE,
                    title:            "Email Delivery Failed".to_string(),
                    footer:           "SynapStore transactional email",
                }),
            )
        }
    };

    TemplateParams {
        template_name,
        subject,
        context,
        layout,
    }
}

/// 教員向け名簿の各行（`名前 (学籍番号)`）
fn roster_lines(students: &[StudentRef]) -> Vec<String> {
    students
        .iter()
        .map(|student| {
            format!(
                "{} ({})",
                student.name,
                student.roll_number.as_deref().unwrap_or("N/A")
            )
        })
        .collect()
}
