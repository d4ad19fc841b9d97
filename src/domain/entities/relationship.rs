use crate::domain::value_objects::{RelationshipId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ユーザー間の明示的な関係の種別。4 種とも同じレコード形状を共有する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Bookmark,
    Friend,
    Block,
    Hidden,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Bookmark => "bookmark",
            RelationshipKind::Friend => "friend",
            RelationshipKind::Block => "block",
            RelationshipKind::Hidden => "hidden",
        }
    }

    pub fn try_from_str(value: &str) -> Option<Self> {
        match value {
            "bookmark" => Some(RelationshipKind::Bookmark),
            "friend" => Some(RelationshipKind::Friend),
            "block" => Some(RelationshipKind::Block),
            "hidden" => Some(RelationshipKind::Hidden),
            _ => None,
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 関係レコードに付随する任意ペイロード。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    pub remark: Option<String>,
    pub notify: bool,
}

/// ユーザーの明示操作で作られる関係レコード。`(kind, owner, target)` で一意。
/// 再計算エンジンはこのレコードに触れない。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    id: RelationshipId,
    kind: RelationshipKind,
    owner_id: UserId,
    target_id: UserId,
    payload: RelationshipPayload,
    created_at: DateTime<Utc>,
}

impl Relationship {
    /// 現在時刻で新しい関係レコードを作成する。
    pub fn new(
        kind: RelationshipKind,
        owner_id: UserId,
        target_id: UserId,
        payload: RelationshipPayload,
    ) -> Self {
        Self {
            id: RelationshipId::random(),
            kind,
            owner_id,
            target_id,
            payload,
            created_at: Utc::now(),
        }
    }

    /// 既存レコードから関係を復元する。
    pub fn from_parts(
        id: RelationshipId,
        kind: RelationshipKind,
        owner_id: UserId,
        target_id: UserId,
        payload: RelationshipPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            owner_id,
            target_id,
            payload,
            created_at,
        }
    }

    pub fn id(&self) -> &RelationshipId {
        &self.id
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn target_id(&self) -> &UserId {
        &self.target_id
    }

    pub fn payload(&self) -> &RelationshipPayload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
