use crate::domain::entities::{Relationship, RelationshipKind};
use serde::{Deserialize, Serialize};

/// 関係レコードの作成・更新リクエスト。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UpsertRelationshipRequest {
    pub kind: RelationshipKind,
    pub target_id: String,
    pub remark: Option<String>,
    #[serde(default)]
    pub notify: bool,
}

/// 関係レコード 1 件の DTO。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelationshipDto {
    pub id: String,
    pub kind: RelationshipKind,
    pub target_id: String,
    pub remark: Option<String>,
    pub notify: bool,
    pub created_at: i64,
}

impl From<Relationship> for RelationshipDto {
    fn from(relationship: Relationship) -> Self {
        Self {
            id: relationship.id().as_str().to_string(),
            kind: relationship.kind(),
            target_id: relationship.target_id().as_str().to_string(),
            remark: relationship.payload().remark.clone(),
            notify: relationship.payload().notify,
            created_at: relationship.created_at().timestamp_millis(),
        }
    }
}
