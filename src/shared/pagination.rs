use std::fmt;

/// キーセットページネーションのソート方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// ソートキー 1 列分の記述。`column` は格納済みでインデックス可能な列に限る。
#[derive(Debug, Clone, Copy)]
pub struct SortColumn {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// カーソル内の各キーの型。最後のキーは一意な識別子（タイブレーク）でなければ
/// ならない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

/// 前ページ最終行のソートキー値を順番どおりに保持する不透明カーソル。
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    values: Vec<KeyValue>,
}

impl PageCursor {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self { values }
    }

    /// `kinds` に従ってカーソル文字列を解析する。欠損・型不一致は `None`。
    ///
    /// 最後のキーだけが `Text` を許されるので、`splitn` の余りをそのまま
    /// 最終フィールドに渡す。識別子に `:` が含まれていても壊れない。
    pub fn parse(raw: &str, kinds: &[KeyKind]) -> Option<Self> {
        if kinds.is_empty() {
            return None;
        }
        let mut parts = raw.splitn(kinds.len(), ':');
        let mut values = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let part = parts.next()?;
            match kind {
                KeyKind::Int => values.push(KeyValue::Int(part.parse().ok()?)),
                KeyKind::Text => {
                    if part.is_empty() {
                        return None;
                    }
                    values.push(KeyValue::Text(part.to_string()));
                }
            }
        }
        Some(Self { values })
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.values
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            match value {
                KeyValue::Int(v) => write!(f, "{v}")?,
                KeyValue::Text(v) => write!(f, "{v}")?,
            }
        }
        Ok(())
    }
}

/// 1 ページ分の結果。全リスト API が同じ 3 フィールドの封筒を返す。
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORE_KINDS: &[KeyKind] = &[KeyKind::Int, KeyKind::Text];

    #[test]
    fn parse_roundtrip() {
        let cursor = PageCursor::parse("70:user-b", SCORE_KINDS).expect("valid cursor");
        assert_eq!(
            cursor.values(),
            &[KeyValue::Int(70), KeyValue::Text("user-b".to_string())]
        );
        assert_eq!(cursor.to_string(), "70:user-b");
    }

    #[test]
    fn parse_keeps_colons_in_trailing_id() {
        let cursor = PageCursor::parse("70:npub:abc:def", SCORE_KINDS).expect("valid cursor");
        assert_eq!(
            cursor.values()[1],
            KeyValue::Text("npub:abc:def".to_string())
        );
        assert_eq!(cursor.to_string(), "70:npub:abc:def");
    }

    #[test]
    fn parse_rejects_missing_fields() {
        assert!(PageCursor::parse("70", SCORE_KINDS).is_none());
        assert!(PageCursor::parse("70:", SCORE_KINDS).is_none());
    }

    #[test]
    fn parse_rejects_non_integer_key() {
        assert!(PageCursor::parse("abc:user-b", SCORE_KINDS).is_none());
    }

    #[test]
    fn parse_three_field_cursor() {
        let kinds = &[KeyKind::Int, KeyKind::Int, KeyKind::Text];
        let cursor = PageCursor::parse("3:30:user-c", kinds).expect("valid cursor");
        assert_eq!(
            cursor.values(),
            &[
                KeyValue::Int(3),
                KeyValue::Int(30),
                KeyValue::Text("user-c".to_string())
            ]
        );
    }

    #[test]
    fn empty_page_has_no_cursor() {
        let page: Page<i32> = Page::empty();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
        assert!(!page.has_more);
    }
}
