//! # 値オブジェクト
//!
//! 生成時に検証を行い、不正な値がディスパッチまで到達しないことを型で保証する。

use serde::Serialize;
use validator::ValidateEmail;

use crate::DomainError;

/// メールアドレスの最大長（RFC 5321 のパス長上限）
const EMAIL_MAX_LENGTH: usize = 254;

/// メールアドレス（値オブジェクト）
///
/// HTML5 仕様のメールアドレス構文（`validator` クレート）に準拠することを要求する。
/// 前後の空白は除去する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の構文に従う
    /// - 最大 254 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        if value.len() > EMAIL_MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "メールアドレスは{EMAIL_MAX_LENGTH}文字以内である必要があります: {value}"
            )));
        }

        if !value.validate_email() {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {value}"
            )));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("student@example.com")]
    #[case("prof.rao+cs101@univ.ac.in")]
    #[case("a@b.co")]
    fn 正しい形式のメールアドレスを受け付ける(#[case] input: &str) {
        let email = Email::new(input).unwrap();
        assert_eq!(email.as_str(), input);
    }

    #[test]
    fn 前後の空白を除去する() {
        let email = Email::new("  student@example.com \n").unwrap();
        assert_eq!(email.as_str(), "student@example.com");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-an-email")]
    #[case("@example.com")]
    #[case("student@")]
    #[case("student@@example.com")]
    #[case("stu dent@example.com")]
    fn 不正な形式のメールアドレスを拒否する(#[case] input: &str) {
        let result = Email::new(input);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn 長すぎるメールアドレスを拒否する() {
        let input = format!("{}@example.com", "a".repeat(250));
        assert!(Email::new(input).is_err());
    }

    #[test]
    fn エラーメッセージに入力値が含まれる() {
        let err = Email::new("not-an-email").unwrap_err();
        assert!(err.to_string().contains("not-an-email"));
    }

    #[test]
    fn serializeで文字列になる() {
        let email = Email::new("student@example.com").unwrap();
        let json = serde_json::to_value(&email).unwrap();
        assert_eq!(json, serde_json::json!("student@example.com"));
    }
}
