use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub recompute: RecomputeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeConfig {
    /// 全件再計算ジョブのバッチサイズ。
    pub batch_size: usize,
    /// TagsChanged イベントチャネルの容量。
    pub event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            recompute: RecomputeConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://kizuna.db".to_string(),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            event_buffer: 64,
        }
    }
}
