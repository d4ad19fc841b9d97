use crate::shared::pagination::{KeyValue, SortColumn, SortDirection};
use sqlx::{QueryBuilder, Sqlite};

/// 前ページ最終行のキー値から次ページの範囲述語を組み立てて追記する。
///
/// 2 列 `(a desc, b asc)` とカーソル `(a0, b0)` なら
/// ` AND (a < a0 OR (a = a0 AND b > b0))` になり、N 列へは同じ形の
/// 入れ子で一般化する。列リストの最後は一意キーなので全順序が保証され、
/// 走査済み範囲の外で行が増減してもページ境界はずれない。
pub fn push_cursor_predicate(
    builder: &mut QueryBuilder<'_, Sqlite>,
    columns: &[SortColumn],
    values: &[KeyValue],
) {
    debug_assert_eq!(columns.len(), values.len());
    debug_assert!(!columns.is_empty());

    builder.push(" AND (");
    for boundary in 0..columns.len() {
        if boundary > 0 {
            builder.push(" OR ");
        }
        let grouped = boundary > 0;
        if grouped {
            builder.push("(");
        }
        for (column, value) in columns.iter().zip(values).take(boundary) {
            builder.push(column.column);
            builder.push(" = ");
            push_key_value(builder, value);
            builder.push(" AND ");
        }
        let column = &columns[boundary];
        builder.push(column.column);
        match column.direction {
            SortDirection::Asc => builder.push(" > "),
            SortDirection::Desc => builder.push(" < "),
        };
        push_key_value(builder, &values[boundary]);
        if grouped {
            builder.push(")");
        }
    }
    builder.push(")");
}

pub fn push_order_by(builder: &mut QueryBuilder<'_, Sqlite>, columns: &[SortColumn]) {
    builder.push(" ORDER BY ");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(column.column);
        match column.direction {
            SortDirection::Asc => builder.push(" ASC"),
            SortDirection::Desc => builder.push(" DESC"),
        };
    }
}

fn push_key_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &KeyValue) {
    match value {
        KeyValue::Int(v) => builder.push_bind(*v),
        KeyValue::Text(v) => builder.push_bind(v.clone()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_COLUMNS: &[SortColumn] = &[
        SortColumn {
            column: "score",
            direction: SortDirection::Desc,
        },
        SortColumn {
            column: "target_id",
            direction: SortDirection::Asc,
        },
    ];

    const THREE_COLUMNS: &[SortColumn] = &[
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

    #[test]
    fn two_column_predicate_matches_lexicographic_order() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM match_scores WHERE owner_id = 'a'");
        push_cursor_predicate(
            &mut builder,
            TWO_COLUMNS,
            &[KeyValue::Int(70), KeyValue::Text("user-b".to_string())],
        );
        assert_eq!(
            builder.sql(),
            "SELECT * FROM match_scores WHERE owner_id = 'a' \
             AND (score < ? OR (score = ? AND target_id > ?))"
        );
    }

    #[test]
    fn three_column_predicate_nests_equality_prefixes() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT 1");
        push_cursor_predicate(
            &mut builder,
            THREE_COLUMNS,
            &[
                KeyValue::Int(3),
                KeyValue::Int(30),
                KeyValue::Text("user-c".to_string()),
            ],
        );
        assert_eq!(
            builder.sql(),
            "SELECT 1 AND (shared_tag_count < ? \
             OR (shared_tag_count = ? AND score < ?) \
             OR (shared_tag_count = ? AND score = ? AND target_id > ?))"
        );
    }

    #[test]
    fn order_by_follows_column_directions() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT 1");
        push_order_by(&mut builder, TWO_COLUMNS);
        assert_eq!(builder.sql(), "SELECT 1 ORDER BY score DESC, target_id ASC");
    }
}
