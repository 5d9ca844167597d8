/// UUID v7 ベースの ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: UUID v7 を生成
/// - `as_uuid()`: 内部 UUID への参照
/// - `Default` impl（`new()` に委譲）
///
/// # 使用例
///
/// ```rust
/// use academix_domain::notification::NotificationLogId;
///
/// let id = NotificationLogId::new();
/// assert_eq!(id.as_uuid().get_version_num(), 7);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
