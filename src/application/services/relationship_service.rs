use crate::application::ports::repositories::{
    RelationshipRepository, UserDirectory, RELATIONSHIP_CURSOR_KINDS,
};
use crate::domain::entities::{Relationship, RelationshipKind, RelationshipPayload};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageCursor};
use crate::shared::validation::ValidationFailureKind;
use std::sync::Arc;

use super::match_service::{DEFAULT_LIMIT, MAX_LIMIT};

/// ブックマーク・フレンド・ブロック・非表示の CRUD と一覧。
/// 関係の変更は再計算を起動しない（タグ編集だけが起動する）。
pub struct RelationshipService {
    relationships: Arc<dyn RelationshipRepository>,
    users: Arc<dyn UserDirectory>,
}

impl RelationshipService {
    pub fn new(
        relationships: Arc<dyn RelationshipRepository>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            relationships,
            users,
        }
    }

    /// `(kind, owner, target)` で冪等な作成・更新。自分自身と存在しない相手は
    /// 種別の異なるエラーで拒否する。
    pub async fn upsert(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
        payload: RelationshipPayload,
    ) -> Result<Relationship, AppError> {
        if owner_id == target_id {
            return Err(AppError::validation(
                ValidationFailureKind::SelfReference,
                format!("cannot create {kind} relationship with yourself"),
            ));
        }
        if !self.users.user_exists(target_id).await? {
            return Err(AppError::TargetNotFound(format!(
                "user {target_id} does not exist"
            )));
        }

        let relationship =
            Relationship::new(kind, owner_id.clone(), target_id.clone(), payload);
        self.relationships.upsert_relationship(&relationship).await
    }

    /// 存在しないレコードの削除は「見つからない」として呼び出し側へ返す。
    /// 消えていたことと最初から無かったことを区別できるようにするため。
    pub async fn delete(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<(), AppError> {
        let deleted = self
            .relationships
            .delete_relationship(kind, owner_id, target_id)
            .await?;
        if !deleted {
            return Err(AppError::NotFound(format!(
                "{kind} relationship for {target_id} not found"
            )));
        }
        Ok(())
    }

    pub async fn exists(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<bool, AppError> {
        Ok(self
            .relationships
            .find_relationship(kind, owner_id, target_id)
            .await?
            .is_some())
    }

    pub async fn count(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
    ) -> Result<u64, AppError> {
        self.relationships.count_for_owner(kind, owner_id).await
    }

    /// 新着順の一覧。空振りはエラーではなく空ページ。
    pub async fn list(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Page<Relationship>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let cursor = parse_cursor(cursor)?;
        self.relationships
            .list_for_owner(kind, owner_id, cursor, limit)
            .await
    }
}

fn parse_cursor(cursor: Option<&str>) -> Result<Option<PageCursor>, AppError> {
    match cursor {
        None => Ok(None),
        Some(raw) => Ok(Some(
            PageCursor::parse(raw, RELATIONSHIP_CURSOR_KINDS).ok_or_else(|| {
                AppError::validation(
                    ValidationFailureKind::MalformedCursor,
                    format!("Invalid cursor format: {raw}"),
                )
            })?,
        )),
    }
}
