use crate::domain::entities::{MatchScore, Relationship, RelationshipKind};
use crate::domain::value_objects::{TagId, UserId};
use crate::shared::error::AppError;
use crate::shared::pagination::{KeyKind, KeyValue, Page, PageCursor, SortColumn, SortDirection};
use crate::shared::validation::ValidationFailureKind;
use async_trait::async_trait;
use std::collections::HashSet;

/// マッチ一覧のソートモード。どのモードも格納済み列に対するキーセット
/// ページネーションで、最後の列は必ず一意な `target_id`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSort {
    Score,
    SharedTags,
}

const SCORE_COLUMNS: &[SortColumn] = &[
    SortColumn {
        column: "score",
        direction: SortDirection::Desc,
    },
    SortColumn {
        column: "target_id",
        direction: SortDirection::Asc,
    },
];

const SHARED_TAGS_COLUMNS: &[SortColumn] = &[
    SortColumn {
        column: "shared_tag_count",
        direction: SortDirection::Desc,
    },
    SortColumn {
        column: "score",
        direction: SortDirection::Desc,
    },
    SortColumn {
        column: "target_id",
        direction: SortDirection::Asc,
    },
];

const SCORE_KINDS: &[KeyKind] = &[KeyKind::Int, KeyKind::Text];
const SHARED_TAGS_KINDS: &[KeyKind] = &[KeyKind::Int, KeyKind::Int, KeyKind::Text];

impl MatchSort {
    pub fn try_from_str(value: Option<&str>) -> Result<Self, AppError> {
        match value.unwrap_or("score").to_lowercase().as_str() {
            "score" => Ok(MatchSort::Score),
            "shared_tags" => Ok(MatchSort::SharedTags),
            other => Err(AppError::validation(
                ValidationFailureKind::UnsupportedSort,
                format!("Unsupported match sort: {other}"),
            )),
        }
    }

    pub fn columns(&self) -> &'static [SortColumn] {
        match self {
            MatchSort::Score => SCORE_COLUMNS,
            MatchSort::SharedTags => SHARED_TAGS_COLUMNS,
        }
    }

    pub fn key_kinds(&self) -> &'static [KeyKind] {
        match self {
            MatchSort::Score => SCORE_KINDS,
            MatchSort::SharedTags => SHARED_TAGS_KINDS,
        }
    }

    /// 行からカーソルキー列を取り出す。`columns()` と同じ並び。
    pub fn cursor_for(&self, row: &MatchScore) -> PageCursor {
        let values = match self {
            MatchSort::Score => vec![
                KeyValue::Int(row.score),
                KeyValue::Text(row.target_id.as_str().to_string()),
            ],
            MatchSort::SharedTags => vec![
                KeyValue::Int(row.shared_tag_count),
                KeyValue::Int(row.score),
                KeyValue::Text(row.target_id.as_str().to_string()),
            ],
        };
        PageCursor::new(values)
    }
}

/// 関係一覧のソート。新しい順、`id` でタイブレーク。
pub const RELATIONSHIP_SORT_COLUMNS: &[SortColumn] = &[
    SortColumn {
        column: "created_at",
        direction: SortDirection::Desc,
    },
    SortColumn {
        column: "id",
        direction: SortDirection::Asc,
    },
];

pub const RELATIONSHIP_CURSOR_KINDS: &[KeyKind] = &[KeyKind::Int, KeyKind::Text];

pub fn relationship_cursor_for(row: &Relationship) -> PageCursor {
    PageCursor::new(vec![
        KeyValue::Int(row.created_at().timestamp_millis()),
        KeyValue::Text(row.id().as_str().to_string()),
    ])
}

#[async_trait]
pub trait MatchScoreRepository: Send + Sync {
    /// `(owner, target)` キーでの原子的な作成・置換。後勝ちで常に有効な値。
    async fn upsert_score(&self, score: &MatchScore) -> Result<(), AppError>;

    /// 行が存在して削除されたときだけ `true`。
    async fn delete_score(&self, owner_id: &UserId, target_id: &UserId)
        -> Result<bool, AppError>;

    async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, AppError>;

    /// 再計算の差分検出用。呼び出し側 API には公開しない。
    async fn find_for_owner(&self, owner_id: &UserId) -> Result<Vec<MatchScore>, AppError>;

    async fn list_for_owner(
        &self,
        owner_id: &UserId,
        sort: MatchSort,
        cursor: Option<PageCursor>,
        limit: usize,
    ) -> Result<Page<MatchScore>, AppError>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// `(kind, owner, target)` キーでの冪等な作成・更新。保存済みの行を返す。
    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
    ) -> Result<Relationship, AppError>;

    /// 行が存在して削除されたときだけ `true`。
    async fn delete_relationship(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<bool, AppError>;

    async fn find_relationship(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<Option<Relationship>, AppError>;

    async fn count_for_owner(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
    ) -> Result<u64, AppError>;

    async fn list_for_owner(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        cursor: Option<PageCursor>,
        limit: usize,
    ) -> Result<Page<Relationship>, AppError>;
}

/// タグ付きユーザー 1 件。タグインデックスの読み取り結果。
#[derive(Debug, Clone)]
pub struct TaggedUser {
    pub user_id: UserId,
    pub tag_ids: HashSet<TagId>,
}

#[derive(Debug, Clone)]
pub struct TaggedUserPage {
    pub items: Vec<TaggedUser>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// プロフィール側コラボレーターが提供するタグインデックスの読み取り口。
#[async_trait]
pub trait UserTagIndex: Send + Sync {
    /// ユーザーが存在しなければ `None`、存在すれば（空かもしれない）タグ集合。
    async fn get_user_tags(&self, user_id: &UserId)
        -> Result<Option<HashSet<TagId>>, AppError>;

    /// `tag_ids` と 1 つ以上共有する他ユーザー。共有ゼロのユーザーは返らない。
    async fn candidates_sharing_any_tag(
        &self,
        owner_id: &UserId,
        tag_ids: &HashSet<TagId>,
    ) -> Result<Vec<TaggedUser>, AppError>;

    /// タグを 1 つ以上持つ全ユーザーを `user_id` 昇順で列挙する。
    async fn all_users_with_tags(
        &self,
        cursor: Option<String>,
        batch_size: usize,
    ) -> Result<TaggedUserPage, AppError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: &UserId) -> Result<bool, AppError>;
}
