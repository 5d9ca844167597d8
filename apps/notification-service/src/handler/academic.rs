//! # 学務通知ハンドラ
//!
//! 学務イベントを受け取り、配信キューに積んで即座に応答する（fire-and-forget）。
//!
//! ## エンドポイント
//!
//! - `POST /api/v1/notify/course-creation` - 履修登録開始
//! - `POST /api/v1/notify/faculty-assignment` - 担当教員の割当
//! - `POST /api/v1/notify/student-enrollment` - 履修登録完了
//! - `POST /api/v1/notify/results-release` - 成績公開
//! - `POST /api/v1/notify/student-detention` - 留年通知
//! - `POST /api/v1/notify/student-credit-shortage` - 単位不足の警告
//! - `POST /api/v1/notify/event-update` - イベントの中止・日程変更
//!
//! 送信の成否は応答に含まれない。メールアドレスの構文エラーや未知の `update_type` は
//! キュー投入前に 400 で拒否する。

use std::sync::Arc;

use academix_domain::{
    DomainError,
    notification::{
        AcademicNotification,
        DEFAULT_DETENTION_REASON,
        ResultRecipient,
        StudentRef,
    },
    value_objects::Email,
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::NotifyState;
use crate::error::ServiceError;

// --- リクエスト/レスポンス型 ---

/// キュー投入レスポンス
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueuedResponse {
    pub status:  String,
    pub message: String,
}

impl QueuedResponse {
    fn queued(count: usize) -> Self {
        Self {
            status:  "success".to_string(),
            message: format!("{count} notifications queued"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CourseCreationRequest {
    pub course_name:    String,
    pub semester:       String,
    pub student_emails: Vec<String>,
}

/// 担当教員割当の名簿 1 行
#[derive(Debug, Deserialize)]
pub struct StudentEntry {
    #[serde(default)]
    pub name:        String,
    pub email:       Option<String>,
    pub roll_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FacultyAssignmentRequest {
    pub faculty_id:    String,
    pub faculty_email: String,
    pub faculty_name:  String,
    pub subject_name:  String,
    #[serde(default)]
    pub students:      Vec<StudentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StudentEnrollmentRequest {
    pub student_id:    String,
    pub student_name:  String,
    pub student_email: String,
    pub subject_name:  String,
    pub faculty_id:    String,
    pub faculty_email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultRecipientEntry {
    pub email: String,
    pub id:    String,
}

#[derive(Debug, Deserialize)]
pub struct ResultReleaseRequest {
    pub exam_name:    String,
    pub student_list: Vec<ResultRecipientEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StudentDetentionRequest {
    pub student_id:    String,
    pub student_name:  String,
    pub student_email: String,
    #[serde(default = "default_detention_reason")]
    pub reason:        String,
}

fn default_detention_reason() -> String {
    DEFAULT_DETENTION_REASON.to_string()
}

#[derive(Debug, Deserialize)]
pub struct CreditShortageRequest {
    pub student_id:       String,
    pub student_name:     String,
    pub student_email:    String,
    #[serde(default)]
    pub current_credits:  f64,
    #[serde(default)]
    pub required_credits: f64,
}

#[derive(Debug, Deserialize)]
pub struct EventUpdateRequest {
    pub event_name:     String,
    /// `CANCELLED` または `RESCHEDULED`
    pub update_type:    String,
    pub details:        String,
    pub recipient_list: Vec<String>,
}

// --- DTO → ドメイン変換 ---

fn parse_emails(values: Vec<String>) -> Result<Vec<Email>, DomainError> {
    values.into_iter().map(Email::new).collect()
}

impl TryFrom<CourseCreationRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: CourseCreationRequest) -> Result<Self, Self::Error> {
        Ok(Self::CourseCreation {
            course_name:    req.course_name,
            semester:       req.semester,
            student_emails: parse_emails(req.student_emails)?,
        })
    }
}

impl TryFrom<FacultyAssignmentRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: FacultyAssignmentRequest) -> Result<Self, Self::Error> {
        let students = req
            .students
            .into_iter()
            .map(|student| -> Result<StudentRef, DomainError> {
                Ok(StudentRef {
                    name:        student.name,
                    email:       student
                        .email
                        .filter(|email| !email.trim().is_empty())
                        .map(Email::new)
                        .transpose()?,
                    roll_number: student.roll_number,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::FacultyAssignment {
            faculty_id: req.faculty_id,
            faculty_email: Email::new(req.faculty_email)?,
            faculty_name: req.faculty_name,
            subject_name: req.subject_name,
            students,
        })
    }
}

impl TryFrom<StudentEnrollmentRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: StudentEnrollmentRequest) -> Result<Self, Self::Error> {
        Ok(Self::StudentEnrollment {
            student_id:    req.student_id,
            student_name:  req.student_name,
            student_email: Email::new(req.student_email)?,
            subject_name:  req.subject_name,
            faculty_id:    req.faculty_id,
            faculty_email: Email::new(req.faculty_email)?,
        })
    }
}

impl TryFrom<ResultReleaseRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: ResultReleaseRequest) -> Result<Self, Self::Error> {
        let students = req
            .student_list
            .into_iter()
            .map(|entry| -> Result<ResultRecipient, DomainError> {
                Ok(ResultRecipient {
                    email: Email::new(entry.email)?,
                    id:    entry.id,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::ResultRelease {
            exam_name: req.exam_name,
            students,
        })
    }
}

impl TryFrom<StudentDetentionRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: StudentDetentionRequest) -> Result<Self, Self::Error> {
        Ok(Self::StudentDetention {
            student_id:    req.student_id,
            student_name:  req.student_name,
            student_email: Email::new(req.student_email)?,
            reason:        req.reason,
        })
    }
}

impl TryFrom<CreditShortageRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: CreditShortageRequest) -> Result<Self, Self::Error> {
        Ok(Self::CreditShortage {
            student_id:       req.student_id,
            student_name:     req.student_name,
            student_email:    Email::new(req.student_email)?,
            current_credits:  req.current_credits,
            required_credits: req.required_credits,
        })
    }
}

impl TryFrom<EventUpdateRequest> for AcademicNotification {
    type Error = DomainError;

    fn try_from(req: EventUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self::EventUpdate {
            event_name:  req.event_name,
            update_type: req.update_type.parse()?,
            details:     req.details,
            recipients:  parse_emails(req.recipient_list)?,
        })
    }
}

// --- ハンドラ ---

fn enqueue(
    state: &NotifyState,
    notification: AcademicNotification,
) -> Result<Json<QueuedResponse>, ServiceError> {
    let count = state.service.enqueue(notification)?;
    Ok(Json(QueuedResponse::queued(count)))
}

/// POST /api/v1/notify/course-creation
pub async fn notify_course_creation(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<CourseCreationRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/faculty-assignment
///
/// 教員には名簿付きのメールを、メールアドレスのある学生には割当の通知を送る。
pub async fn notify_faculty_assignment(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<FacultyAssignmentRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/student-enrollment
pub async fn notify_student_enrollment(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<StudentEnrollmentRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/results-release
pub async fn notify_result_release(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<ResultReleaseRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/student-detention
pub async fn notify_student_detention(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<StudentDetentionRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/student-credit-shortage
pub async fn notify_credit_shortage(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<CreditShortageRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

/// POST /api/v1/notify/event-update
pub async fn notify_event_update(
    State(state): State<Arc<NotifyState>>,
    Json(req): Json<EventUpdateRequest>,
) -> Result<Json<QueuedResponse>, ServiceError> {
    enqueue(&state, req.try_into()?)
}

#[cfg(test)]
mod tests {
    use academix_domain::notification::EventUpdateType;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn 留年理由を省略すると既定の理由になる() {
        let req: StudentDetentionRequest = serde_json::from_value(json!({
            "student_id": "S-1",
            "student_name": "Asha",
            "student_email": "asha@example.com"
        }))
        .unwrap();

        assert_eq!(req.reason, "Academic Performance / Attendance Shortage");
    }

    #[test]
    fn 単位数を省略すると0になる() {
        let req: CreditShortageRequest = serde_json::from_value(json!({
            "student_id": "S-1",
            "student_name": "Asha",
            "student_email": "asha@example.com"
        }))
        .unwrap();

        assert_eq!(req.current_credits, 0.0);
        assert_eq!(req.required_credits, 0.0);
    }

    #[test]
    fn 名簿を省略すると空になりメールなしの学生も受け付ける() {
        let empty: FacultyAssignmentRequest = serde_json::from_value(json!({
            "faculty_id": "F-1",
            "faculty_email": "rao@example.com",
            "faculty_name": "Dr. Rao",
            "subject_name": "Compilers"
        }))
        .unwrap();
        assert!(empty.students.is_empty());

        let req: FacultyAssignmentRequest = serde_json::from_value(json!({
            "faculty_id": "F-1",
            "faculty_email": "rao@example.com",
            "faculty_name": "Dr. Rao",
            "subject_name": "Compilers",
            "students": [{ "name": "Vikram" }]
        }))
        .unwrap();
        let AcademicNotification::FacultyAssignment { students, .. } =
            AcademicNotification::try_from(req).unwrap()
        else {
            panic!("FacultyAssignment に変換されること");
        };
        assert_eq!(
            students,
            vec![StudentRef {
                name:        "Vikram".to_string(),
                email:       None,
                roll_number: None,
            }]
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn 空のメールアドレスの学生はメールなしとして名簿に残る(#[case] email: &str) {
        let req: FacultyAssignmentRequest = serde_json::from_value(json!({
            "faculty_id": "F-1",
            "faculty_email": "rao@example.com",
            "faculty_name": "Dr. Rao",
            "subject_name": "Compilers",
            "students": [
                { "name": "Vikram", "email": email, "roll_number": "CS-07" },
                { "name": "Asha", "email": "asha@example.com" }
            ]
        }))
        .unwrap();

        let AcademicNotification::FacultyAssignment { students, .. } =
            AcademicNotification::try_from(req).unwrap()
        else {
            panic!("FacultyAssignment に変換されること");
        };
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Vikram");
        assert_eq!(students[0].email, None);
        assert_eq!(students[0].roll_number.as_deref(), Some("CS-07"));
        assert_eq!(students[1].email, Some(Email::new("asha@example.com").unwrap()));
    }

    #[rstest]
    #[case("CANCELLED", EventUpdateType::Cancelled)]
    #[case("RESCHEDULED", EventUpdateType::Rescheduled)]
    fn 更新種別を変換できる(#[case] input: &str, #[case] expected: EventUpdateType) {
        let req = EventUpdateRequest {
            event_name:     "Hackathon".to_string(),
            update_type:    input.to_string(),
            details:        "Moved to Friday".to_string(),
            recipient_list: vec![],
        };

        let AcademicNotification::EventUpdate { update_type, .. } =
            AcademicNotification::try_from(req).unwrap()
        else {
            panic!("EventUpdate に変換されること");
        };
        assert_eq!(update_type, expected);
    }

    #[rstest]
    #[case("cancelled")]
    #[case("POSTPONED")]
    fn 未知の更新種別はバリデーションエラーになる(#[case] input: &str) {
        let req = EventUpdateRequest {
            event_name:     "Hackathon".to_string(),
            update_type:    input.to_string(),
            details:        "TBD".to_string(),
            recipient_list: vec![],
        };

        assert!(matches!(
            AcademicNotification::try_from(req),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn 受信者に不正なメールアドレスが1件でもあれば拒否する() {
        let req = CourseCreationRequest {
            course_name:    "Compilers".to_string(),
            semester:       "Fall 2026".to_string(),
            student_emails: vec!["a@example.com".to_string(), "not-an-email".to_string()],
        };

        assert!(AcademicNotification::try_from(req).is_err());
    }

    #[test]
    fn キュー投入件数をメッセージに含める() {
        assert_eq!(
            QueuedResponse::queued(3),
            QueuedResponse {
                status:  "success".to_string(),
                message: "3 notifications queued".to_string(),
            }
        );
    }
}
