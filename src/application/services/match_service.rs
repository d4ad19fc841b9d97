use crate::application::ports::repositories::{
    MatchScoreRepository, MatchSort, TaggedUser, UserTagIndex,
};
use crate::domain::affinity::tag_overlap;
use crate::domain::entities::MatchScore;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use crate::shared::pagination::{KeyKind, Page, PageCursor};
use crate::shared::validation::ValidationFailureKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) const DEFAULT_LIMIT: usize = 20;
pub(crate) const MAX_LIMIT: usize = 100;

/// 差分再計算 1 回分の統計。`examined` と成功件数の差で取りこぼしが見える。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalUpdateStats {
    pub examined: u64,
    pub created: u64,
    pub updated: u64,
    pub removed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct RebuildProgress {
    pub processed: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildStats {
    pub total: u64,
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub removed: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct OwnerPassStats {
    created: u64,
    updated: u64,
    removed: u64,
    failed: u64,
}

/// 親和度スコアの維持と一覧取得。ロックは持たず、正しさは行単位の原子的
/// upsert とスコア関数の純粋性だけに依存する。
pub struct MatchService {
    scores: Arc<dyn MatchScoreRepository>,
    tags: Arc<dyn UserTagIndex>,
}

impl MatchService {
    pub fn new(scores: Arc<dyn MatchScoreRepository>, tags: Arc<dyn UserTagIndex>) -> Self {
        Self { scores, tags }
    }

    /// タグ編集後の差分再計算。候補はタグを 1 つ以上共有するユーザーに
    /// 限定され、候補から消えた既存行はその場で削除する。
    pub async fn incremental_update(
        &self,
        owner_id: &UserId,
    ) -> Result<IncrementalUpdateStats, AppError> {
        let mut stats = IncrementalUpdateStats::default();

        let owner_tags = match self.tags.get_user_tags(owner_id).await? {
            Some(tags) if !tags.is_empty() => tags,
            _ => {
                stats.removed = self.scores.delete_all_for_owner(owner_id).await?;
                tracing::info!(
                    owner = %owner_id,
                    removed = stats.removed,
                    "cleared match scores for untagged owner"
                );
                return Ok(stats);
            }
        };

        let candidates = self
            .tags
            .candidates_sharing_any_tag(owner_id, &owner_tags)
            .await?;
        let existing: HashMap<UserId, MatchScore> = self
            .scores
            .find_for_owner(owner_id)
            .await?
            .into_iter()
            .map(|row| (row.target_id.clone(), row))
            .collect();

        let mut kept: HashSet<UserId> = HashSet::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.user_id == *owner_id {
                continue;
            }
            stats.examined += 1;

            let overlap = tag_overlap(&owner_tags, &candidate.tag_ids);
            if overlap.shared_count == 0 {
                continue;
            }

            let row = MatchScore::new(owner_id.clone(), candidate.user_id.clone(), overlap);
            match self.scores.upsert_score(&row).await {
                Ok(()) => {
                    if existing.contains_key(&candidate.user_id) {
                        stats.updated += 1;
                    } else {
                        stats.created += 1;
                    }
                    kept.insert(candidate.user_id);
                }
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(
                        owner = %owner_id,
                        target = %candidate.user_id,
                        error = %err,
                        "match score upsert failed"
                    );
                }
            }
        }

        for target_id in existing.keys() {
            if kept.contains(target_id) {
                continue;
            }
            match self.scores.delete_score(owner_id, target_id).await {
                Ok(true) => stats.removed += 1,
                Ok(false) => {}
                Err(err) => {
                    stats.failed += 1;
                    tracing::warn!(
                        owner = %owner_id,
                        target = %target_id,
                        error = %err,
                        "stale match score delete failed"
                    );
                }
            }
        }

        tracing::debug!(
            owner = %owner_id,
            examined = stats.examined,
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            failed = stats.failed,
            "incremental match update finished"
        );

        Ok(stats)
    }

    /// 権威的な全件再計算。候補フィルタを使わない全ペア走査なので、重複ゼロに
    /// 落ちた行や消えたユーザーの行もここで掃除される。クラッシュ後は
    /// 最初からやり直してよい（すべて冪等）。
    pub async fn full_rebuild<F>(
        &self,
        batch_size: usize,
        mut on_progress: F,
    ) -> Result<RebuildStats, AppError>
    where
        F: FnMut(RebuildProgress),
    {
        let batch_size = batch_size.max(1);

        let mut users: Vec<TaggedUser> = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.tags.all_users_with_tags(cursor.take(), batch_size).await?;
            users.extend(page.items);
            if !page.has_more || page.next_cursor.is_none() {
                break;
            }
            cursor = page.next_cursor;
        }

        let mut stats = RebuildStats {
            total: users.len() as u64,
            ..Default::default()
        };

        for chunk in users.chunks(batch_size) {
            for owner in chunk {
                match self.rebuild_owner(owner, &users).await {
                    Ok(pass) => {
                        stats.created += pass.created;
                        stats.updated += pass.updated;
                        stats.removed += pass.removed;
                        stats.failed += pass.failed;
                    }
                    Err(err) => {
                        stats.failed += 1;
                        tracing::warn!(
                            owner = %owner.user_id,
                            error = %err,
                            "owner rebuild pass failed"
                        );
                    }
                }
                stats.processed += 1;
            }
            on_progress(RebuildProgress {
                processed: stats.processed,
                total: stats.total,
            });
        }

        tracing::info!(
            total = stats.total,
            processed = stats.processed,
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            failed = stats.failed,
            "full match rebuild completed"
        );

        Ok(stats)
    }

    async fn rebuild_owner(
        &self,
        owner: &TaggedUser,
        users: &[TaggedUser],
    ) -> Result<OwnerPassStats, AppError> {
        let existing: HashMap<UserId, MatchScore> = self
            .scores
            .find_for_owner(&owner.user_id)
            .await?
            .into_iter()
            .map(|row| (row.target_id.clone(), row))
            .collect();

        let mut pass = OwnerPassStats::default();
        let mut kept: HashSet<&UserId> = HashSet::new();

        for other in users {
            if other.user_id == owner.user_id {
                continue;
            }
            let overlap = tag_overlap(&owner.tag_ids, &other.tag_ids);
            if overlap.shared_count == 0 {
                continue;
            }

            let row = MatchScore::new(owner.user_id.clone(), other.user_id.clone(), overlap);
            match self.scores.upsert_score(&row).await {
                Ok(()) => {
                    if existing.contains_key(&other.user_id) {
                        pass.updated += 1;
                    } else {
                        pass.created += 1;
                    }
                    kept.insert(&other.user_id);
                }
                Err(err) => {
                    pass.failed += 1;
                    tracing::warn!(
                        owner = %owner.user_id,
                        target = %other.user_id,
                        error = %err,
                        "match score upsert failed"
                    );
                }
            }
        }

        for target_id in existing.keys() {
            if kept.contains(target_id) {
                continue;
            }
            match self.scores.delete_score(&owner.user_id, target_id).await {
                Ok(true) => pass.removed += 1,
                Ok(false) => {}
                Err(err) => {
                    pass.failed += 1;
                    tracing::warn!(
                        owner = %owner.user_id,
                        target = %target_id,
                        error = %err,
                        "stale match score delete failed"
                    );
                }
            }
        }

        Ok(pass)
    }

    /// マッチ一覧。ソートとカーソルはここで検証してからリポジトリへ渡す。
    pub async fn list_matches(
        &self,
        owner_id: &UserId,
        sort: Option<&str>,
        cursor: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Page<MatchScore>, AppError> {
        let sort = MatchSort::try_from_str(sort)?;
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let cursor = parse_cursor(cursor, sort.key_kinds())?;
        self.scores
            .list_for_owner(owner_id, sort, cursor, limit)
            .await
    }
}

fn parse_cursor(cursor: Option<&str>, kinds: &[KeyKind]) -> Result<Option<PageCursor>, AppError> {
    match cursor {
        None => Ok(None),
        Some(raw) => Ok(Some(PageCursor::parse(raw, kinds).ok_or_else(|| {
            AppError::validation(
                ValidationFailureKind::MalformedCursor,
                format!("Invalid cursor format: {raw}"),
            )
        })?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::repositories::TaggedUserPage;
    use crate::domain::value_objects::TagId;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub ScoreRepo {}

        #[async_trait]
        impl MatchScoreRepository for ScoreRepo {
            async fn upsert_score(&self, score: &MatchScore) -> Result<(), AppError>;
            async fn delete_score(
                &self,
                owner_id: &UserId,
                target_id: &UserId,
            ) -> Result<bool, AppError>;
            async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, AppError>;
            async fn find_for_owner(&self, owner_id: &UserId) -> Result<Vec<MatchScore>, AppError>;
            async fn list_for_owner(
                &self,
                owner_id: &UserId,
                sort: MatchSort,
                cursor: Option<PageCursor>,
                limit: usize,
            ) -> Result<Page<MatchScore>, AppError>;
        }
    }

    mock! {
        pub TagIndex {}

        #[async_trait]
        impl UserTagIndex for TagIndex {
            async fn get_user_tags(
                &self,
                user_id: &UserId,
            ) -> Result<Option<std::collections::HashSet<TagId>>, AppError>;
            async fn candidates_sharing_any_tag(
                &self,
                owner_id: &UserId,
                tag_ids: &std::collections::HashSet<TagId>,
            ) -> Result<Vec<TaggedUser>, AppError>;
            async fn all_users_with_tags(
                &self,
                cursor: Option<String>,
                batch_size: usize,
            ) -> Result<TaggedUserPage, AppError>;
        }
    }

    fn uid(value: &str) -> UserId {
        UserId::new(value).expect("valid id")
    }

    fn tags(values: &[&str]) -> HashSet<TagId> {
        values
            .iter()
            .map(|v| TagId::new(*v).expect("valid tag"))
            .collect()
    }

    fn existing_row(owner: &str, target: &str, shared: i64) -> MatchScore {
        MatchScore::new(
            uid(owner),
            uid(target),
            crate::domain::affinity::TagOverlap {
                score: (shared * 10).min(100),
                shared_count: shared,
            },
        )
    }

    #[tokio::test]
    async fn untagged_owner_clears_all_scores() {
        let mut tag_index = MockTagIndex::new();
        tag_index
            .expect_get_user_tags()
            .returning(|_| Ok(Some(HashSet::new())));

        let mut scores = MockScoreRepo::new();
        scores
            .expect_delete_all_for_owner()
            .withf(|owner| owner.as_str() == "a")
            .times(1)
            .returning(|_| Ok(3));

        let service = MatchService::new(Arc::new(scores), Arc::new(tag_index));
        let stats = service.incremental_update(&uid("a")).await.expect("stats");

        assert_eq!(stats.examined, 0);
        assert_eq!(stats.removed, 3);
    }

    #[tokio::test]
    async fn missing_owner_clears_all_scores() {
        let mut tag_index = MockTagIndex::new();
        tag_index.expect_get_user_tags().returning(|_| Ok(None));

        let mut scores = MockScoreRepo::new();
        scores
            .expect_delete_all_for_owner()
            .times(1)
            .returning(|_| Ok(0));

        let service = MatchService::new(Arc::new(scores), Arc::new(tag_index));
        let stats = service.incremental_update(&uid("gone")).await.expect("stats");
        assert_eq!(stats, IncrementalUpdateStats::default());
    }

    #[tokio::test]
    async fn incremental_update_upserts_and_prunes() {
        let mut tag_index = MockTagIndex::new();
        tag_index
            .expect_get_user_tags()
            .returning(|_| Ok(Some(tags(&["x", "y"]))));
        tag_index
            .expect_candidates_sharing_any_tag()
            .returning(|_, _| {
                Ok(vec![
                    TaggedUser {
                        user_id: uid("b"),
                        tag_ids: tags(&["y"]),
                    },
                    TaggedUser {
                        user_id: uid("c"),
                        tag_ids: tags(&["x", "y"]),
                    },
                ])
            });

        let mut scores = MockScoreRepo::new();
        scores.expect_find_for_owner().returning(|_| {
            Ok(vec![
                existing_row("a", "c", 1),
                existing_row("a", "d", 2),
            ])
        });
        scores
            .expect_upsert_score()
            .withf(|row| row.target_id.as_str() == "b" && row.score == 10)
            .times(1)
            .returning(|_| Ok(()));
        scores
            .expect_upsert_score()
            .withf(|row| row.target_id.as_str() == "c" && row.score == 20)
            .times(1)
            .returning(|_| Ok(()));
        scores
            .expect_delete_score()
            .withf(|_, target| target.as_str() == "d")
            .times(1)
            .returning(|_, _| Ok(true));

        let service = MatchService::new(Arc::new(scores), Arc::new(tag_index));
        let stats = service.incremental_update(&uid("a")).await.expect("stats");

        assert_eq!(stats.examined, 2);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn incremental_update_survives_single_candidate_failure() {
        let mut tag_index = MockTagIndex::new();
        tag_index
            .expect_get_user_tags()
            .returning(|_| Ok(Some(tags(&["x"]))));
        tag_index
            .expect_candidates_sharing_any_tag()
            .returning(|_, _| {
                Ok(vec![
                    TaggedUser {
                        user_id: uid("b"),
                        tag_ids: tags(&["x"]),
                    },
                    TaggedUser {
                        user_id: uid("c"),
                        tag_ids: tags(&["x"]),
                    },
                ])
            });

        let mut scores = MockScoreRepo::new();
        scores.expect_find_for_owner().returning(|_| Ok(vec![]));
        scores
            .expect_upsert_score()
            .withf(|row| row.target_id.as_str() == "b")
            .returning(|_| Err(AppError::Database("store unavailable".to_string())));
        scores
            .expect_upsert_score()
            .withf(|row| row.target_id.as_str() == "c")
            .returning(|_| Ok(()));

        let service = MatchService::new(Arc::new(scores), Arc::new(tag_index));
        let stats = service.incremental_update(&uid("a")).await.expect("stats");

        assert_eq!(stats.examined, 2);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn full_rebuild_reports_progress_per_batch() {
        let mut tag_index = MockTagIndex::new();
        tag_index
            .expect_all_users_with_tags()
            .withf(|cursor, _| cursor.is_none())
            .returning(|_, _| {
                Ok(TaggedUserPage {
                    items: vec![
                        TaggedUser {
                            user_id: uid("a"),
                            tag_ids: tags(&["x"]),
                        },
                        TaggedUser {
                            user_id: uid("b"),
                            tag_ids: tags(&["x"]),
                        },
                    ],
                    next_cursor: Some("b".to_string()),
                    has_more: true,
                })
            });
        tag_index
            .expect_all_users_with_tags()
            .withf(|cursor, _| cursor.as_deref() == Some("b"))
            .returning(|_, _| {
                Ok(TaggedUserPage {
                    items: vec![TaggedUser {
                        user_id: uid("c"),
                        tag_ids: tags(&["y"]),
                    }],
                    next_cursor: None,
                    has_more: false,
                })
            });

        let mut scores = MockScoreRepo::new();
        scores.expect_find_for_owner().returning(|_| Ok(vec![]));
        scores.expect_upsert_score().returning(|_| Ok(()));

        let service = MatchService::new(Arc::new(scores), Arc::new(tag_index));
        let mut progress: Vec<(u64, u64)> = Vec::new();
        let stats = service
            .full_rebuild(2, |p| progress.push((p.processed, p.total)))
            .await
            .expect("stats");

        assert_eq!(stats.total, 3);
        assert_eq!(stats.processed, 3);
        // a<->b share "x"; c overlaps nobody
        assert_eq!(stats.created, 2);
        assert_eq!(progress, vec![(2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn list_matches_rejects_unknown_sort() {
        let service = MatchService::new(
            Arc::new(MockScoreRepo::new()),
            Arc::new(MockTagIndex::new()),
        );
        let err = service
            .list_matches(&uid("a"), Some("online"), None, None)
            .await
            .expect_err("unsupported sort");
        assert!(matches!(
            err,
            AppError::Validation {
                kind: ValidationFailureKind::UnsupportedSort,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn list_matches_rejects_malformed_cursor() {
        let service = MatchService::new(
            Arc::new(MockScoreRepo::new()),
            Arc::new(MockTagIndex::new()),
        );
        let err = service
            .list_matches(&uid("a"), None, Some("not-a-cursor"), None)
            .await
            .expect_err("malformed cursor");
        assert!(matches!(
            err,
            AppError::Validation {
                kind: ValidationFailureKind::MalformedCursor,
                ..
            }
        ));
    }
}
