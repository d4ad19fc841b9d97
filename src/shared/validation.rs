use serde::{Deserialize, Serialize};
use std::fmt;

/// アプリケーションレベルのバリデーション失敗理由。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValidationFailureKind {
    /// 汎用的なバリデーションエラー。
    Generic,
    /// 自分自身を対象にした関係・スコア操作。
    SelfReference,
    /// 解析できないページネーションカーソル。
    MalformedCursor,
    /// サポート外のソート指定。
    UnsupportedSort,
    /// 空の識別子。
    EmptyIdentifier,
}

impl ValidationFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFailureKind::Generic => "generic",
            ValidationFailureKind::SelfReference => "self_reference",
            ValidationFailureKind::MalformedCursor => "malformed_cursor",
            ValidationFailureKind::UnsupportedSort => "unsupported_sort",
            ValidationFailureKind::EmptyIdentifier => "empty_identifier",
        }
    }
}

impl fmt::Display for ValidationFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
