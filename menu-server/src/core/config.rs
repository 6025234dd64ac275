use crate::db::repository::Layout;
use crate::migration::{MigrationConfig, MigrationMode};
use std::path::PathBuf;
use std::str::FromStr;

/// Storage backend selected by `STORE_BACKEND`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// redb file under `DATA_DIR`
    Redb,
    /// Process memory, lost on exit
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(StoreBackend::Redb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{other}' (expected redb or memory)")),
        }
    }
}

/// 服务配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | STORE_BACKEND | redb | `redb` 或 `memory` |
/// | DATA_DIR | ./data | redb 文件和上传图片目录 |
/// | MENU_LAYOUT | flat | 菜品 API 使用的存储布局 (`nested` / `flat`) |
/// | MIGRATION_CONCURRENCY | 4 | 同时迁移的餐厅数 |
/// | MIGRATION_MODE | append | `append` (重跑会重复) 或 `upsert` |
/// | VERIFY_SAMPLE_SIZE | 5 | 校验默认样本数 |
/// | PUBLIC_BASE_URL | http://localhost:3000/files | 对象存储公开 URL 前缀 |
/// | LOG_LEVEL | info | 默认日志级别 |
/// | LOG_DIR | (未设置) | 日志文件目录 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// Unparseable values fall back to the default with a warning.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub menu_layout: Layout,
    pub migration_concurrency: usize,
    pub migration_mode: MigrationMode,
    pub verify_sample_size: usize,
    pub public_base_url: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self {
            http_port: parsed("HTTP_PORT", 3000),
            store_backend: parsed("STORE_BACKEND", StoreBackend::Redb),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            menu_layout: parsed("MENU_LAYOUT", Layout::Flat),
            migration_concurrency: parsed("MIGRATION_CONCURRENCY", 4),
            migration_mode: parsed("MIGRATION_MODE", MigrationMode::Append),
            verify_sample_size: parsed("VERIFY_SAMPLE_SIZE", 5),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/files".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// In-memory stores with the given layout (tests)
    pub fn in_memory(menu_layout: Layout) -> Self {
        Self {
            http_port: 0,
            store_backend: StoreBackend::Memory,
            data_dir: PathBuf::from("./data"),
            menu_layout,
            migration_concurrency: 4,
            migration_mode: MigrationMode::Append,
            verify_sample_size: 5,
            public_base_url: "http://localhost:3000/files".into(),
            log_level: "info".into(),
            log_dir: None,
            environment: "test".into(),
        }
    }

    pub fn migration(&self) -> MigrationConfig {
        MigrationConfig {
            concurrency: self.migration_concurrency,
            mode: self.migration_mode,
            verify_sample_size: self.verify_sample_size,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("menu.redb")
    }

    /// Root directory of the local object store
    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir.join("objects")
    }
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid config value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("redb".parse::<StoreBackend>().unwrap(), StoreBackend::Redb);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let mut config = Config::in_memory(Layout::Flat);
        config.data_dir = PathBuf::from("/srv/menu");
        assert_eq!(config.database_path(), PathBuf::from("/srv/menu/menu.redb"));
        assert_eq!(config.objects_dir(), PathBuf::from("/srv/menu/objects"));
    }
}
