//! # Observability 基盤
//!
//! トレーシングの初期化とリクエストスパンの生成を提供する。
//!
//! - `LOG_FORMAT=json` で 1 行 1 JSON の構造化ログ、それ以外は人間向けの pretty 出力
//! - `RUST_LOG` が未設定なら `info,academix=debug`
//! - `tracing_error::ErrorLayer` を登録し、`InfraError` の `SpanTrace` を有効にする

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// 大文字小文字を区別せずにパースする
    ///
    /// 不明な値は stderr に警告を出して [`Pretty`](LogFormat::Pretty) にする
    /// （subscriber の初期化前なので tracing には出せない）。
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// 全ログに付くルートスパン `app` の `service` フィールド
    pub service_name: String,
    pub log_format:   LogFormat,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
        }
    }

    /// `LOG_FORMAT` 環境変数から出力形式を読み取る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::new(service_name, LogFormat::from_env())
    }
}

/// グローバル subscriber を登録し、ルートスパン `app` に入る
///
/// 返り値のガードを `main` の終わりまで保持すること。JSON 出力では
/// `span.service` としてサービス名が全行に含まれる。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) -> tracing::span::EnteredSpan {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,academix=debug".into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    tracing::info_span!("app", service = %config.service_name).entered()
}

/// UUID v7 の Request ID を生成する `SetRequestIdLayer` 用のジェネレーター
///
/// 時刻順に並ぶため、ログを ID でソートすると受信順になる。
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

#[cfg(feature = "observability")]
impl tower_http::request_id::MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(
        &mut self,
        _request: &http::Request<B>,
    ) -> Option<tower_http::request_id::RequestId> {
        http::HeaderValue::from_str(&uuid::Uuid::now_v7().to_string())
            .ok()
            .map(tower_http::request_id::RequestId::new)
    }
}

/// `TraceLayer::make_span_with` 用のリクエストスパン
///
/// `x-request-id` ヘッダーを `request_id` として記録する。
#[cfg(feature = "observability")]
pub fn make_request_span<B>(request: &http::Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}
