mod match_dto;
mod relationship_dto;

pub use match_dto::{ListMatchesRequest, MatchScoreDto};
pub use relationship_dto::{RelationshipDto, UpsertRelationshipRequest};

use crate::shared::pagination::Page;
use serde::{Deserialize, Serialize};

/// すべての一覧エンドポイントが返すカーソルページの封筒。
/// `has_more` は UI のロード制御用。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> PagedResponse<T> {
    pub fn from_page<S>(page: Page<S>, map: impl Fn(S) -> T) -> Self {
        Self {
            items: page.items.into_iter().map(map).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        }
    }
}
