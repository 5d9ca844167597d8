//! # インフラ層エラー定義
//!
//! 通知ログの記録先など、送信以外の外部リソースで発生するエラー。
//! メール送信の失敗はドメインの `NotificationError` で表現する。
//!
//! [`InfraError`] は種別（[`InfraErrorKind`]）と生成時点の [`SpanTrace`] を持つ。
//! `tracing_error::ErrorLayer` が登録されていれば、どのリクエスト・ジョブで
//! 失敗したかをスパンの連なりとして辿れる。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// 記録先に書き込めない
    #[error("記録先が利用できません: {0}")]
    Unavailable(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 記録先が利用できないエラーを現在のスパンで生成する
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unavailable(detail.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    #[test]
    fn 生成時のスパンがspan_traceに残る() {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        let span = tracing::info_span!("dispatch_job");
        let _enter = span.enter();

        let err = InfraError::unavailable("connection refused");

        assert!(matches!(
            err.kind(),
            InfraErrorKind::Unavailable(detail) if detail == "connection refused"
        ));
        let trace = err.span_trace().to_string();
        assert!(trace.contains("dispatch_job"), "span_trace: {trace}");
    }

    #[test]
    fn 表示は種別のメッセージになる() {
        let err = InfraError::unavailable("connection refused");

        assert_eq!(err.to_string(), "記録先が利用できません: connection refused");
        assert!(format!("{err:?}").contains("span_trace"));
    }
}
