use crate::domain::affinity::TagOverlap;
use crate::domain::value_objects::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `(owner, target)` の有向ペアごとに 1 行だけ存在する親和度スコア。
/// 再計算エンジン以外が書き換えることはない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchScore {
    pub owner_id: UserId,
    pub target_id: UserId,
    pub score: i64,
    pub shared_tag_count: i64,
    pub computed_at: DateTime<Utc>,
}

impl MatchScore {
    /// 現在時刻を計算時刻として新しいスコア行を組み立てる。
    pub fn new(owner_id: UserId, target_id: UserId, overlap: TagOverlap) -> Self {
        Self {
            owner_id,
            target_id,
            score: overlap.score,
            shared_tag_count: overlap.shared_count,
            computed_at: Utc::now(),
        }
    }

    pub fn from_parts(
        owner_id: UserId,
        target_id: UserId,
        score: i64,
        shared_tag_count: i64,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id,
            target_id,
            score,
            shared_tag_count,
            computed_at,
        }
    }
}
