pub(super) const UPSERT_MATCH_SCORE: &str = r#"
    INSERT INTO match_scores (owner_id, target_id, score, shared_tag_count, computed_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(owner_id, target_id) DO UPDATE SET
        score = excluded.score,
        shared_tag_count = excluded.shared_tag_count,
        computed_at = excluded.computed_at
"#;

pub(super) const DELETE_MATCH_SCORE: &str = r#"
    DELETE FROM match_scores
    WHERE owner_id = ?1 AND target_id = ?2
"#;

pub(super) const DELETE_MATCH_SCORES_BY_OWNER: &str = r#"
    DELETE FROM match_scores
    WHERE owner_id = ?1
"#;

pub(super) const SELECT_MATCH_SCORES_BY_OWNER: &str = r#"
    SELECT owner_id, target_id, score, shared_tag_count, computed_at
    FROM match_scores
    WHERE owner_id = ?1
    ORDER BY target_id
"#;

pub(super) const UPSERT_RELATIONSHIP: &str = r#"
    INSERT INTO relationships (id, kind, owner_id, target_id, remark, notify, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(kind, owner_id, target_id) DO UPDATE SET
        remark = excluded.remark,
        notify = excluded.notify
"#;

pub(super) const DELETE_RELATIONSHIP: &str = r#"
    DELETE FROM relationships
    WHERE kind = ?1 AND owner_id = ?2 AND target_id = ?3
"#;

pub(super) const SELECT_RELATIONSHIP_BY_PAIR: &str = r#"
    SELECT id, kind, owner_id, target_id, remark, notify, created_at
    FROM relationships
    WHERE kind = ?1 AND owner_id = ?2 AND target_id = ?3
"#;

pub(super) const COUNT_RELATIONSHIPS_BY_OWNER: &str = r#"
    SELECT COUNT(*)
    FROM relationships
    WHERE kind = ?1 AND owner_id = ?2
"#;

pub(super) const SELECT_USER_BY_ID: &str = r#"
    SELECT id
    FROM users
    WHERE id = ?1
"#;

pub(super) const SELECT_TAGS_BY_USER: &str = r#"
    SELECT tag_id
    FROM user_tags
    WHERE user_id = ?1
"#;
