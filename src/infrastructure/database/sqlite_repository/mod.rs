mod match_scores;
mod queries;
mod relationships;
mod user_tags;

use super::connection_pool::ConnectionPool;

/// SQLite 実装のリポジトリ。各ポートの impl は分割ファイルにある。
pub struct SqliteRepository {
    pool: ConnectionPool,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}
