//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 本番は STARTTLS + 認証付きで SMTP リレー（Gmail 等）に接続し、
//! 開発環境では TLS なしで Mailpit（ローカル SMTP サーバー）に接続する。
//!
//! lettre は `pool` feature なしでビルドしているため、送信ごとに接続を開いて閉じる。

use std::time::Duration;

use academix_domain::notification::{EmailMessage, NotificationError};
use async_trait::async_trait;
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
};

use super::NotificationSender;

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP サーバーのホスト名（例: "smtp.gmail.com"）
    pub host:      String,
    /// SMTP サーバーのポート番号（例: 587、Mailpit は 1025）
    pub port:      u16,
    /// 認証ユーザー名。送信元アドレスとしても使う
    pub username:  String,
    pub password:  String,
    /// 送信元の表示名
    pub from_name: String,
    /// STARTTLS で TLS に昇格するか（false は Mailpit 等のローカル向け）
    pub starttls:  bool,
    /// 接続・応答待ちのタイムアウト
    pub timeout:   Duration,
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Mailbox,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続はここでは行わない。送信元アドレスが不正な場合や
    /// TLS 設定を組み立てられない場合はエラーを返す。
    pub fn new(config: &SmtpConfig) -> Result<Self, NotificationError> {
        let address: Address = config.username.parse().map_err(|e| {
            NotificationError::InvalidAddress(format!("送信元アドレス不正: {e}"))
        })?;
        let from = Mailbox::new(Some(config.from_name.clone()), address);

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::ConnectionFailed(format!("TLS 設定失敗: {e}")))?
                .credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
        } else {
            // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let transport = builder
            .port(config.port)
            .timeout(Some(config.timeout))
            .build();

        Ok(Self { transport, from })
    }

    /// MIME メッセージを組み立てる
    ///
    /// HTML 本文があれば multipart/alternative、なければ text/plain の単一パートにする。
    fn build_message(&self, email: &EmailMessage) -> Result<Message, NotificationError> {
        let to: Address = email
            .to
            .as_str()
            .parse()
            .map_err(|e| NotificationError::InvalidAddress(format!("宛先アドレス不正: {e}")))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(None, to))
            .subject(&email.subject);

        let message = match &email.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                email.text_body.clone(),
                html.clone(),
            )),
            None => builder.singlepart(SinglePart::plain(email.text_body.clone())),
        };

        message.map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = self.build_message(email)?;

        tracing::debug!(to = %email.to, "SMTP 送信開始");

        self.transport.send(message).await.map_err(|e| {
            let code = e.status().map(|code| code.to_string());
            classify_failure(
                code.as_deref(),
                e.is_timeout() || e.is_tls(),
                e.to_string(),
            )
        })?;

        Ok(())
    }
}

/// SMTP エラーを送信エラーの種別に振り分ける
///
/// - 53x 応答（535 等）: 認証失敗
/// - 応答コードなし、タイムアウト、TLS 失敗: 接続失敗
/// - それ以外の応答: 送信失敗
fn classify_failure(code: Option<&str>, connection_level: bool, detail: String) -> NotificationError {
    match code {
        Some(code) if code.starts_with("53") => NotificationError::AuthenticationFailed(detail),
        Some(_) if !connection_level => NotificationError::SendFailed(detail),
        _ => NotificationError::ConnectionFailed(detail),
    }
}

#[cfg(test)]
mod tests {
    use academix_domain::value_objects::Email;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn mailpit_config() -> SmtpConfig {
        SmtpConfig {
            host:      "localhost".to_string(),
            port:      1025,
            username:  "noreply@academix.example.com".to_string(),
            password:  String::new(),
            from_name: "Academix".to_string(),
            starttls:  false,
            timeout:   Duration::from_secs(20),
        }
    }

    fn email(html_body: Option<&str>) -> EmailMessage {
        EmailMessage {
            to:        Email::new("student@example.com").unwrap(),
            subject:   "Results Released – Midterm".to_string(),
            text_body: "Dear Student".to_string(),
            html_body: html_body.map(str::to_string),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[tokio::test]
    async fn 送信元アドレスが不正なら作成に失敗する() {
        let config = SmtpConfig {
            username: "not-an-address".to_string(),
            ..mailpit_config()
        };

        let result = SmtpNotificationSender::new(&config);

        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn html本文がなければ単一パートのプレーンテキストになる() {
        let sender = SmtpNotificationSender::new(&mailpit_config()).unwrap();

        let message = sender.build_message(&email(None)).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Content-Type: text/plain"));
        assert!(!raw.contains("multipart/alternative"));
        assert!(raw.contains("From: Academix <noreply@academix.example.com>"));
    }

    #[tokio::test]
    async fn html本文があればmultipart_alternativeになる() {
        let sender = SmtpNotificationSender::new(&mailpit_config()).unwrap();

        let message = sender
            .build_message(&email(Some("<p>Dear Student</p>")))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[rstest]
    #[case(Some("535"), false, "auth")]
    #[case(Some("530"), false, "auth")]
    #[case(Some("550"), false, "send")]
    #[case(Some("421"), true, "connection")]
    #[case(None, false, "connection")]
    #[case(None, true, "connection")]
    fn smtpエラーを種別に振り分ける(
        #[case] code: Option<&str>,
        #[case] connection_level: bool,
        #[case] expected: &str,
    ) {
        let error = classify_failure(code, connection_level, "detail".to_string());

        let kind = match error {
            NotificationError::AuthenticationFailed(_) => "auth",
            NotificationError::ConnectionFailed(_) => "connection",
            NotificationError::SendFailed(_) => "send",
            other => panic!("unexpected error: {other:?}"),
        };
        assert_eq!(kind, expected);
    }

    #[test]
    fn 振り分け後も元のエラー文言を保持する() {
        let error = classify_failure(
            Some("535"),
            false,
            "permanent error (535): 5.7.8 Username and Password not accepted".to_string(),
        );

        assert!(error.to_string().contains("Username and Password not accepted"));
    }
}
