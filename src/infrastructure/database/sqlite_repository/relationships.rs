use super::queries::{
    COUNT_RELATIONSHIPS_BY_OWNER, DELETE_RELATIONSHIP, SELECT_RELATIONSHIP_BY_PAIR,
    UPSERT_RELATIONSHIP,
};
use super::SqliteRepository;
use crate::application::ports::repositories::{
    relationship_cursor_for, RelationshipRepository, RELATIONSHIP_SORT_COLUMNS,
};
use crate::domain::entities::{Relationship, RelationshipKind, RelationshipPayload};
use crate::domain::value_objects::{RelationshipId, UserId};
use crate::infrastructure::database::keyset;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageCursor};
use crate::shared::validation::ValidationFailureKind;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

#[derive(Debug, Clone, FromRow)]
struct RelationshipRow {
    id: String,
    kind: String,
    owner_id: String,
    target_id: String,
    remark: Option<String>,
    notify: i64,
    created_at: i64,
}

impl RelationshipRow {
    fn into_domain(self) -> Result<Relationship, AppError> {
        let id = RelationshipId::new(self.id).map_err(|err| {
            AppError::validation(
                ValidationFailureKind::Generic,
                format!("Invalid RelationshipId: {err}"),
            )
        })?;
        let kind = RelationshipKind::try_from_str(&self.kind).ok_or_else(|| {
            AppError::SerializationError(format!("Unknown relationship kind: {}", self.kind))
        })?;
        let owner_id = UserId::new(self.owner_id).map_err(|err| {
            AppError::validation(
                ValidationFailureKind::Generic,
                format!("Invalid owner id: {err}"),
            )
        })?;
        let target_id = UserId::new(self.target_id).map_err(|err| {
            AppError::validation(
                ValidationFailureKind::Generic,
                format!("Invalid target id: {err}"),
            )
        })?;
        let created_at = Utc
            .timestamp_millis_opt(self.created_at)
            .single()
            .ok_or_else(|| AppError::SerializationError("Invalid timestamp".to_string()))?;

        Ok(Relationship::from_parts(
            id,
            kind,
            owner_id,
            target_id,
            RelationshipPayload {
                remark: self.remark,
                notify: self.notify != 0,
            },
            created_at,
        ))
    }
}

#[async_trait]
impl RelationshipRepository for SqliteRepository {
    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
    ) -> Result<Relationship, AppError> {
        sqlx::query(UPSERT_RELATIONSHIP)
            .bind(relationship.id().as_str())
            .bind(relationship.kind().as_str())
            .bind(relationship.owner_id().as_str())
            .bind(relationship.target_id().as_str())
            .bind(relationship.payload().remark.as_deref())
            .bind(relationship.payload().notify as i64)
            .bind(relationship.created_at().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        // 競合時は既存行の id と created_at が残るので、保存済みの行を返す。
        self.find_relationship(
            relationship.kind(),
            relationship.owner_id(),
            relationship.target_id(),
        )
        .await?
        .ok_or_else(|| AppError::Internal("relationship upsert did not persist".to_string()))
    }

    async fn delete_relationship(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_RELATIONSHIP)
            .bind(kind.as_str())
            .bind(owner_id.as_str())
            .bind(target_id.as_str())
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_relationship(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<Option<Relationship>, AppError> {
        let row = sqlx::query_as::<_, RelationshipRow>(SELECT_RELATIONSHIP_BY_PAIR)
            .bind(kind.as_str())
            .bind(owner_id.as_str())
            .bind(target_id.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row.into_domain()?)),
            None => Ok(None),
        }
    }

    async fn count_for_owner(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
    ) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(COUNT_RELATIONSHIPS_BY_OWNER)
            .bind(kind.as_str())
            .bind(owner_id.as_str())
            .fetch_one(self.pool.get_pool())
            .await?;

        Ok(count as u64)
    }

    async fn list_for_owner(
        &self,
        kind: RelationshipKind,
        owner_id: &UserId,
        cursor: Option<PageCursor>,
        limit: usize,
    ) -> Result<Page<Relationship>, AppError> {
        let fetch_limit = limit.saturating_add(1);

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, kind, owner_id, target_id, remark, notify, created_at
             FROM relationships
             WHERE kind = ",
        );
        builder.push_bind(kind.as_str());
        builder.push(" AND owner_id = ");
        builder.push_bind(owner_id.as_str());

        if let Some(cur) = cursor.as_ref() {
            keyset::push_cursor_predicate(&mut builder, RELATIONSHIP_SORT_COLUMNS, cur.values());
        }
        keyset::push_order_by(&mut builder, RELATIONSHIP_SORT_COLUMNS);
        builder.push(" LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut rows = builder
            .build_query_as::<RelationshipRow>()
            .fetch_all(self.pool.get_pool())
            .await?;

        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }

        let items = rows
            .into_iter()
            .map(RelationshipRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = if has_more {
            items.last().map(|row| relationship_cursor_for(row).to_string())
        } else {
            None
        };

        Ok(Page {
            items,
            next_cursor,
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_repository;
    use super::*;
    use crate::application::ports::repositories::RELATIONSHIP_CURSOR_KINDS;

    fn uid(value: &str) -> UserId {
        UserId::new(value).expect("valid id")
    }

    fn bookmark(owner: &str, target: &str, remark: Option<&str>) -> Relationship {
        Relationship::new(
            RelationshipKind::Bookmark,
            uid(owner),
            uid(target),
            RelationshipPayload {
                remark: remark.map(str::to_string),
                notify: false,
            },
        )
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_pair() {
        let repo = setup_repository().await;

        let first = repo
            .upsert_relationship(&bookmark("a", "b", None))
            .await
            .expect("created");
        let second = repo
            .upsert_relationship(&bookmark("a", "b", Some("climbing")))
            .await
            .expect("updated");

        // 行は 1 件のまま。id と作成時刻は最初の作成が生き残り、
        // ペイロードだけ更新される。
        assert_eq!(first.id().as_str(), second.id().as_str());
        assert_eq!(
            first.created_at().timestamp_millis(),
            second.created_at().timestamp_millis()
        );
        assert_eq!(second.payload().remark.as_deref(), Some("climbing"));
        assert_eq!(
            repo.count_for_owner(RelationshipKind::Bookmark, &uid("a"))
                .await
                .expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn same_pair_under_different_kinds_is_two_records() {
        let repo = setup_repository().await;

        repo.upsert_relationship(&bookmark("a", "b", None))
            .await
            .expect("bookmark");
        repo.upsert_relationship(&Relationship::new(
            RelationshipKind::Block,
            uid("a"),
            uid("b"),
            RelationshipPayload::default(),
        ))
        .await
        .expect("block");

        assert_eq!(
            repo.count_for_owner(RelationshipKind::Bookmark, &uid("a"))
                .await
                .expect("count"),
            1
        );
        assert_eq!(
            repo.count_for_owner(RelationshipKind::Block, &uid("a"))
                .await
                .expect("count"),
            1
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let repo = setup_repository().await;
        repo.upsert_relationship(&bookmark("a", "b", None))
            .await
            .expect("created");

        assert!(repo
            .delete_relationship(RelationshipKind::Bookmark, &uid("a"), &uid("b"))
            .await
            .expect("delete"));
        assert!(!repo
            .delete_relationship(RelationshipKind::Bookmark, &uid("a"), &uid("b"))
            .await
            .expect("second delete"));
    }

    #[tokio::test]
    async fn count_is_number_of_distinct_targets() {
        let repo = setup_repository().await;
        for target in ["b", "c", "d"] {
            repo.upsert_relationship(&bookmark("a", target, None))
                .await
                .expect("created");
        }
        repo.upsert_relationship(&bookmark("a", "c", Some("again")))
            .await
            .expect("updated");

        assert_eq!(
            repo.count_for_owner(RelationshipKind::Bookmark, &uid("a"))
                .await
                .expect("count"),
            3
        );
    }

    #[tokio::test]
    async fn listing_pages_newest_first_without_duplicates() {
        let repo = setup_repository().await;
        let mut stored: Vec<Relationship> = Vec::new();
        for target in ["b", "c", "d", "e", "f"] {
            stored.push(
                repo.upsert_relationship(&bookmark("a", target, None))
                    .await
                    .expect("created"),
            );
        }

        let mut expected: Vec<(i64, String)> = stored
            .iter()
            .map(|rel| {
                (
                    rel.created_at().timestamp_millis(),
                    rel.id().as_str().to_string(),
                )
            })
            .collect();
        expected.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut collected: Vec<(i64, String)> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let parsed = cursor.as_deref().map(|raw| {
                PageCursor::parse(raw, RELATIONSHIP_CURSOR_KINDS).expect("valid cursor")
            });
            let page = repo
                .list_for_owner(RelationshipKind::Bookmark, &uid("a"), parsed, 2)
                .await
                .expect("page");
            for item in &page.items {
                collected.push((
                    item.created_at().timestamp_millis(),
                    item.id().as_str().to_string(),
                ));
            }
            if !page.has_more {
                break;
            }
            cursor = page.next_cursor;
        }

        assert_eq!(collected, expected);
    }
}
