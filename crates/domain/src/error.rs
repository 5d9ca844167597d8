//! # ドメイン層エラー定義
//!
//! 入力値がビジネスルールに違反した場合のエラー型。
//!
//! API 層では `Validation` を 400 Bad Request（validation-error）に変換する。
//! 検証はディスパッチより前に行われるため、このエラーが返った時点で
//! SMTP への接続は一度も発生していない。
//!
//! ## 使用例
//!
//! ```rust
//! use academix_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!     if name.is_empty() {
//!         return Err(DomainError::Validation("名前は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// # 例
    ///
    /// - メールアドレスの形式が不正
    /// - 未知のイベント更新種別
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
