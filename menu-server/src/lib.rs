//! Menu Server - 餐厅菜品数据层与迁移工具
//!
//! # 架构概述
//!
//! - **文档存储** (`db`): 文档存储 trait，内存与 redb 两种后端，对象存储
//! - **仓储** (`db::repository`): 餐厅与菜品 CRUD，菜品支持嵌套/扁平两种布局
//! - **迁移** (`migration`): 嵌套子集合 → 扁平 `menuItems` 的一次性批处理
//! - **服务** (`services`): 图片上传
//! - **HTTP API** (`api`): 管理工具和后台接口
//!
//! # 模块结构
//!
//! ```text
//! menu-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 文档存储、对象存储、仓储
//! ├── migration/     # 菜品布局迁移
//! ├── services/      # 图片上传
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod migration;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 设置运行环境: 加载 .env 并初始化日志
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
