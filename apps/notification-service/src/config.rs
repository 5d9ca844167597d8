//! # Notification Service 設定
//!
//! 環境変数から通知サービスの設定を読み込む。
//!
//! 設定は起動時に 1 度だけ構築し、以降は不変。SMTP の資格情報が欠けている場合や
//! 数値をパースできない場合は起動に失敗する。

use std::{env, time::Duration};

use academix_infra::notification::SmtpConfig;
use thiserror::Error;

/// 設定の読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値をパースできない、または範囲外
    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Notification Service サーバーの設定
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// 通知送信の設定
    pub notification: NotificationConfig,
    /// 配信キューの設定
    pub dispatch:     DispatchConfig,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: SMTP リレー経由で送信（`SMTP_USER` / `SMTP_PASS` 必須）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub enum NotificationConfig {
    Smtp(SmtpConfig),
    Noop,
}

/// 配信キュー（fire-and-forget 経路）の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// キューに積めるジョブ数の上限
    pub queue_capacity: usize,
    /// 同時に処理するジョブ数
    pub concurrency:    usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            concurrency:    4,
        }
    }
}

impl NotifyConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// テストでプロセスの環境変数を書き換えずに済むよう、参照元を差し替えられる。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);
        let defaults = DispatchConfig::default();

        Ok(Self {
            host:         vars.get_or("NOTIFY_HOST", "0.0.0.0"),
            port:         vars.parse_or("NOTIFY_PORT", 7860)?,
            notification: NotificationConfig::from_vars(&vars)?,
            dispatch:     DispatchConfig {
                queue_capacity: vars.positive_or("DISPATCH_QUEUE_CAPACITY", defaults.queue_capacity)?,
                concurrency:    vars.positive_or("DISPATCH_CONCURRENCY", defaults.concurrency)?,
            },
        })
    }
}

impl NotificationConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        match vars.get_or("NOTIFICATION_BACKEND", "smtp").as_str() {
            "smtp" => Ok(Self::Smtp(SmtpConfig {
                host:      vars.get_or("SMTP_HOST", "smtp.gmail.com"),
                port:      vars.parse_or("SMTP_PORT", 587)?,
                username:  vars.required("SMTP_USER")?,
                password:  vars.required("SMTP_PASS")?,
                from_name: vars.get_or("SMTP_FROM_NAME", "Academix"),
                starttls:  vars.parse_or("SMTP_STARTTLS", true)?,
                timeout:   Duration::from_secs(vars.parse_or("SMTP_TIMEOUT_SECS", 20)?),
            })),
            "noop" => Ok(Self::Noop),
            other => Err(ConfigError::Invalid {
                name:  "NOTIFICATION_BACKEND",
                value: other.to_string(),
            }),
        }
    }

    /// ログ出力用のバックエンド名
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Noop => "noop",
        }
    }
}

/// 環境変数の参照ヘルパー
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }

    fn positive_or(&self, name: &'static str, default: usize) -> Result<usize, ConfigError> {
        let value = self.parse_or(name, default)?;
        if value == 0 {
            return Err(ConfigError::Invalid {
                name,
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<NotifyConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotifyConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn 資格情報だけ指定すると既定値で読み込まれる() {
        let config = load(&[("SMTP_USER", "noreply@example.com"), ("SMTP_PASS", "secret")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7860);
        assert_eq!(config.dispatch, DispatchConfig::default());
        let NotificationConfig::Smtp(smtp) = config.notification else {
            panic!("smtp バックエンドであること");
        };
        assert_eq!(smtp.host, "smtp.gmail.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_name, "Academix");
        assert!(smtp.starttls);
        assert_eq!(smtp.timeout, Duration::from_secs(20));
    }

    #[rstest]
    #[case(&[("SMTP_PASS", "secret")], "SMTP_USER")]
    #[case(&[("SMTP_USER", "noreply@example.com")], "SMTP_PASS")]
    #[case(&[("SMTP_USER", "noreply@example.com"), ("SMTP_PASS", "  ")], "SMTP_PASS")]
    fn smtpバックエンドは資格情報がなければ失敗する(
        #[case] pairs: &[(&str, &str)],
        #[case] missing: &'static str,
    ) {
        let error = load(pairs).unwrap_err();

        assert_eq!(error, ConfigError::Missing(missing));
    }

    #[test]
    fn noopバックエンドは資格情報なしで起動できる() {
        let config = load(&[("NOTIFICATION_BACKEND", "noop")]).unwrap();

        assert_eq!(config.notification.backend_name(), "noop");
    }

    #[rstest]
    #[case("NOTIFY_PORT", "not-a-port")]
    #[case("SMTP_PORT", "70000")]
    #[case("SMTP_STARTTLS", "yes")]
    #[case("DISPATCH_CONCURRENCY", "0")]
    #[case("NOTIFICATION_BACKEND", "ses")]
    fn 不正な値は起動失敗になる(#[case] name: &str, #[case] value: &str) {
        let result = load(&[
            ("SMTP_USER", "noreply@example.com"),
            ("SMTP_PASS", "secret"),
            (name, value),
        ]);

        assert!(
            matches!(result, Err(ConfigError::Invalid { name: n, .. }) if n == name),
            "{name}={value} は Invalid になること"
        );
    }

    #[test]
    fn mailpit向けにstarttlsを無効化できる() {
        let config = load(&[
            ("SMTP_HOST", "localhost"),
            ("SMTP_PORT", "1025"),
            ("SMTP_USER", "noreply@academix.example.com"),
            ("SMTP_PASS", "unused"),
            ("SMTP_STARTTLS", "false"),
        ])
        .unwrap();

        let NotificationConfig::Smtp(smtp) = config.notification else {
            panic!("smtp バックエンドであること");
        };
        assert_eq!(smtp.host, "localhost");
        assert_eq!(smtp.port, 1025);
        assert!(!smtp.starttls);
    }
}
