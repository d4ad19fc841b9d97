use super::queries::{SELECT_TAGS_BY_USER, SELECT_USER_BY_ID};
use super::SqliteRepository;
use crate::application::ports::repositories::{
    TaggedUser, TaggedUserPage, UserDirectory, UserTagIndex,
};
use crate::domain::value_objects::{TagId, UserId};
use crate::shared::error::AppError;
use crate::shared::validation::ValidationFailureKind;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashSet;

fn tag_id(value: String) -> Result<TagId, AppError> {
    TagId::new(value).map_err(|err| {
        AppError::validation(ValidationFailureKind::Generic, format!("Invalid tag id: {err}"))
    })
}

/// `(user_id, tag_id)` の行列を `user_id` ごとにまとめる。入力は user_id 順。
fn group_tag_rows(rows: Vec<(String, String)>) -> Result<Vec<TaggedUser>, AppError> {
    let mut users: Vec<TaggedUser> = Vec::new();
    for (user, tag) in rows {
        let tag = tag_id(tag)?;
        match users.last_mut() {
            Some(last) if last.user_id.as_str() == user => {
                last.tag_ids.insert(tag);
            }
            _ => {
                let user_id = UserId::new(user).map_err(|err| {
                    AppError::validation(
                        ValidationFailureKind::Generic,
                        format!("Invalid user id: {err}"),
                    )
                })?;
                let mut tag_ids = HashSet::new();
                tag_ids.insert(tag);
                users.push(TaggedUser { user_id, tag_ids });
            }
        }
    }
    Ok(users)
}

#[async_trait]
impl UserTagIndex for SqliteRepository {
    async fn get_user_tags(
        &self,
        user_id: &UserId,
    ) -> Result<Option<HashSet<TagId>>, AppError> {
        let user = sqlx::query(SELECT_USER_BY_ID)
            .bind(user_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        if user.is_none() {
            return Ok(None);
        }

        let rows: Vec<String> = sqlx::query_scalar(SELECT_TAGS_BY_USER)
            .bind(user_id.as_str())
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut tags = HashSet::with_capacity(rows.len());
        for row in rows {
            tags.insert(tag_id(row)?);
        }
        Ok(Some(tags))
    }

    async fn candidates_sharing_any_tag(
        &self,
        owner_id: &UserId,
        tag_ids: &HashSet<TagId>,
    ) -> Result<Vec<TaggedUser>, AppError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT ut.user_id, ut.tag_id
             FROM user_tags ut
             WHERE ut.user_id IN (
                 SELECT DISTINCT user_id FROM user_tags WHERE tag_id IN (",
        );
        let mut separated = builder.separated(", ");
        for tag in tag_ids {
            separated.push_bind(tag.as_str().to_string());
        }
        builder.push(") AND user_id != ");
        builder.push_bind(owner_id.as_str());
        builder.push(") ORDER BY ut.user_id, ut.tag_id");

        let rows: Vec<(String, String)> = builder
            .build_query_as()
            .fetch_all(self.pool.get_pool())
            .await?;

        group_tag_rows(rows)
    }

    async fn all_users_with_tags(
        &self,
        cursor: Option<String>,
        batch_size: usize,
    ) -> Result<TaggedUserPage, AppError> {
        let batch_size = batch_size.max(1);
        let fetch_limit = batch_size.saturating_add(1);

        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT DISTINCT user_id FROM user_tags");
        if let Some(after) = cursor.as_ref() {
            builder.push(" WHERE user_id > ");
            builder.push_bind(after.clone());
        }
        builder.push(" ORDER BY user_id LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut ids: Vec<String> = builder
            .build_query_scalar()
            .fetch_all(self.pool.get_pool())
            .await?;

        let has_more = ids.len() > batch_size;
        if has_more {
            ids.truncate(batch_size);
        }
        if ids.is_empty() {
            return Ok(TaggedUserPage {
                items: Vec::new(),
                next_cursor: None,
                has_more: false,
            });
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT user_id, tag_id FROM user_tags WHERE user_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in &ids {
            separated.push_bind(id.clone());
        }
        builder.push(") ORDER BY user_id, tag_id");

        let rows: Vec<(String, String)> = builder
            .build_query_as()
            .fetch_all(self.pool.get_pool())
            .await?;

        let next_cursor = if has_more { ids.last().cloned() } else { None };

        Ok(TaggedUserPage {
            items: group_tag_rows(rows)?,
            next_cursor,
            has_more,
        })
    }
}

#[async_trait]
impl UserDirectory for SqliteRepository {
    async fn user_exists(&self, user_id: &UserId) -> Result<bool, AppError> {
        let row = sqlx::query(SELECT_USER_BY_ID)
            .bind(user_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;
        Ok(row.is_some())
    }
}
