//! # Notification Service サーバー
//!
//! 学務システムと仕入先システムから通知イベントを受け取り、メールで配信する。
//!
//! ## 配信経路
//!
//! ```text
//! 学務イベント ──→ 配信計画 ──→ レンダリング ──→ DispatchQueue ──→ DispatchWorker ──→ SMTP
//!                                                   │                      │
//!                                           即座に 200 を返す         通知ログ記録
//!
//! 仕入先イベント ──→ レンダリング ──→ SMTP（同期。失敗時は 500）
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFY_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFY_PORT` | No | ポート番号（デフォルト: `7860`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）または `noop` |
//! | `SMTP_USER` / `SMTP_PASS` | **Yes**（smtp） | SMTP 認証情報 |
//! | `DISPATCH_QUEUE_CAPACITY` | No | 配信キューの上限（デフォルト: `1024`） |
//! | `DISPATCH_CONCURRENCY` | No | 同時配信ジョブ数（デフォルト: `4`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（送信しない）
//! NOTIFICATION_BACKEND=noop cargo run -p academix-notification-service
//!
//! # Mailpit 経由
//! SMTP_HOST=localhost SMTP_PORT=1025 SMTP_STARTTLS=false \
//!   SMTP_USER=noreply@academix.example.com SMTP_PASS=unused \
//!   cargo run -p academix-notification-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use academix_domain::clock::SystemClock;
use academix_infra::{
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    notification_log::TracingNotificationLogRepository,
};
use academix_notification_service::{
    app_builder::build_app,
    config::{NotificationConfig, NotifyConfig},
    handler::NotifyState,
    usecase::notification::{
        DispatchContext,
        DispatchQueue,
        DispatchWorker,
        NotificationService,
        TemplateRenderer,
    },
};
use academix_shared::observability::{TracingConfig, init_tracing};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let _tracing_guard = init_tracing(TracingConfig::from_env("notification-service"));

    // 設定読み込み
    let config = NotifyConfig::from_env().expect("設定の読み込みに失敗しました");

    tracing::info!(
        backend = config.notification.backend_name(),
        queue_capacity = config.dispatch.queue_capacity,
        concurrency = config.dispatch.concurrency,
        "Notification Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 依存コンポーネントを初期化
    let sender: Arc<dyn NotificationSender> = match &config.notification {
        NotificationConfig::Smtp(smtp) => Arc::new(SmtpNotificationSender::new(smtp)?),
        NotificationConfig::Noop => Arc::new(NoopNotificationSender),
    };
    let template_renderer = Arc::new(TemplateRenderer::new()?);
    let clock = Arc::new(SystemClock);

    let (queue, rx) = DispatchQueue::bounded(config.dispatch.queue_capacity);
    let worker = DispatchWorker::spawn(
        rx,
        DispatchContext {
            sender:   sender.clone(),
            log_repo: Arc::new(TracingNotificationLogRepository::new()),
            clock:    clock.clone(),
        },
        config.dispatch.concurrency,
    );

    let service = NotificationService::new(sender, template_renderer, queue, clock);
    let app = build_app(Arc::new(NotifyState::new(service)));

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("アドレスのパースに失敗しました");

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notification Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ルーター（と配信キューの送信側）は serve の終了時に drop 済み。
    // 積まれている配信を全て処理してから終了する
    tracing::info!("配信キューの残りのジョブを処理しています");
    worker.join().await;

    Ok(())
}

/// SIGINT / SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Ctrl+C ハンドラの登録に失敗しました");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("シグナルハンドラの登録に失敗しました")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
