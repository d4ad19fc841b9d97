use crate::domain::entities::MatchScore;
use serde::{Deserialize, Serialize};

/// カーソル付きマッチ一覧リクエスト。
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ListMatchesRequest {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
}

/// マッチ 1 件の DTO。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchScoreDto {
    pub target_id: String,
    pub score: i64,
    pub shared_tag_count: i64,
    pub computed_at: i64,
}

impl From<MatchScore> for MatchScoreDto {
    fn from(score: MatchScore) -> Self {
        Self {
            target_id: score.target_id.into(),
            score: score.score,
            shared_tag_count: score.shared_tag_count,
            computed_at: score.computed_at.timestamp_millis(),
        }
    }
}
