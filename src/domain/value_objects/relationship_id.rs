use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship レコードの識別子。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipId(String);

impl RelationshipId {
    /// 既存の識別子文字列から `RelationshipId` を生成する。
    pub fn new(value: String) -> Result<Self, String> {
        if value.is_empty() {
            return Err("RelationshipId cannot be empty".to_string());
        }
        uuid::Uuid::parse_str(&value)
            .map_err(|err| format!("Invalid RelationshipId format: {err}"))?;
        Ok(Self(value))
    }

    /// 新規 RelationshipId を生成する。
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RelationshipId> for String {
    fn from(value: RelationshipId) -> Self {
        value.0
    }
}
