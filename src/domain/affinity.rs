use crate::domain::value_objects::TagId;
use std::collections::HashSet;

/// 共有タグ 1 件あたりの加点。既存の保存データと互換であること。
pub const SCORE_PER_SHARED_TAG: i64 = 10;
/// スコア上限。
pub const MAX_SCORE: i64 = 100;

/// 2 ユーザーのタグ集合から導出した親和度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOverlap {
    pub score: i64,
    pub shared_count: i64,
}

/// タグ集合の共通部分からスコアを算出する。純粋関数で、失敗しない。
pub fn tag_overlap(owner_tags: &HashSet<TagId>, target_tags: &HashSet<TagId>) -> TagOverlap {
    let shared_count = owner_tags.intersection(target_tags).count() as i64;
    TagOverlap {
        score: (shared_count * SCORE_PER_SHARED_TAG).min(MAX_SCORE),
        shared_count,
    }
}
