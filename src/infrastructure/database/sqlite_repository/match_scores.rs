use super::queries::{
    DELETE_MATCH_SCORE, DELETE_MATCH_SCORES_BY_OWNER, SELECT_MATCH_SCORES_BY_OWNER,
    UPSERT_MATCH_SCORE,
};
use super::SqliteRepository;
use crate::application::ports::repositories::{MatchScoreRepository, MatchSort};
use crate::domain::entities::MatchScore;
use crate::domain::value_objects::UserId;
use crate::infrastructure::database::keyset;
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageCursor};
use crate::shared::validation::ValidationFailureKind;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite};

#[derive(Debug, Clone, FromRow)]
struct MatchScoreRow {
    owner_id: String,
    target_id: String,
    score: i64,
    shared_tag_count: i64,
    computed_at: i64,
}

impl MatchScoreRow {
    fn into_domain(self) -> Result<MatchScore, AppError> {
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
        let computed_at = Utc
            .timestamp_millis_opt(self.computed_at)
            .single()
            .ok_or_else(|| AppError::SerializationError("Invalid timestamp".to_string()))?;

        Ok(MatchScore::from_parts(
            owner_id,
            target_id,
            self.score,
            self.shared_tag_count,
            computed_at,
        ))
    }
}

#[async_trait]
impl MatchScoreRepository for SqliteRepository {
    async fn upsert_score(&self, score: &MatchScore) -> Result<(), AppError> {
        sqlx::query(UPSERT_MATCH_SCORE)
            .bind(score.owner_id.as_str())
            .bind(score.target_id.as_str())
            .bind(score.score)
            .bind(score.shared_tag_count)
            .bind(score.computed_at.timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        Ok(())
    }

    async fn delete_score(
        &self,
        owner_id: &UserId,
        target_id: &UserId,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_MATCH_SCORE)
            .bind(owner_id.as_str())
            .bind(target_id.as_str())
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, AppError> {
        let result = sqlx::query(DELETE_MATCH_SCORES_BY_OWNER)
            .bind(owner_id.as_str())
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_for_owner(&self, owner_id: &UserId) -> Result<Vec<MatchScore>, AppError> {
        let rows = sqlx::query_as::<_, MatchScoreRow>(SELECT_MATCH_SCORES_BY_OWNER)
            .bind(owner_id.as_str())
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.into_iter().map(MatchScoreRow::into_domain).collect()
    }

    async fn list_for_owner(
        &self,
        owner_id: &UserId,
        sort: MatchSort,
        cursor: Option<PageCursor>,
        limit: usize,
    ) -> Result<Page<MatchScore>, AppError> {
        let fetch_limit = limit.saturating_add(1);

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT owner_id, target_id, score, shared_tag_count, computed_at
             FROM match_scores
             WHERE owner_id = ",
        );
        builder.push_bind(owner_id.as_str());

        if let Some(cur) = cursor.as_ref() {
            keyset::push_cursor_predicate(&mut builder, sort.columns(), cur.values());
        }
        keyset::push_order_by(&mut builder, sort.columns());
        builder.push(" LIMIT ");
        builder.push_bind(fetch_limit as i64);

        let mut rows = builder
            .build_query_as::<MatchScoreRow>()
            .fetch_all(self.pool.get_pool())
            .await?;

        let has_more = rows.len() > limit;
        if has_more {
            rows.truncate(limit);
        }

        let items = rows
            .into_iter()
            .map(MatchScoreRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = if has_more {
            items.last().map(|row| sort.cursor_for(row).to_string())
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
