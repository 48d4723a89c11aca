//! 持久化模块
//!
//! # 设计思路
//!
//! 核心只依赖一个极简的键值接口 [`KeyValueStore`]：`get` / `set` / `clear`，
//! 值统一为 `serde_json::Value`。历史、固定条目、合并标签、设置分别存放在
//! 四个固定键下，每次变更后立即整体写回，不做批量或延迟写入。
//!
//! # 实现
//!
//! | 实现 | 用途 |
//! |------|------|
//! | [`SqliteStore`] | 默认后端，`rusqlite` 单表 `kv`，WAL 模式 |
//! | [`MemoryStore`] | 临时会话与测试 |
//!
//! 数据库文件位置由 `config` 子模块解析（`config.json` + 默认数据目录）。

use serde_json::Value;

use crate::error::AppError;

mod config;
mod memory;
mod schema;
mod sqlite;

pub use config::{default_data_dir, load_app_config, resolve_db_path, save_app_config, AppConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const HISTORY_KEY: &str = "clipboardHistory";
pub const PINNED_KEY: &str = "pinnedHistory";
pub const MERGE_TAGS_KEY: &str = "mergeTags";
pub const SETTINGS_KEY: &str = "settings";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

    fn set(&self, key: &str, value: &Value) -> Result<(), AppError>;

    fn clear(&self) -> Result<(), AppError>;

    fn get_or(&self, key: &str, default: Value) -> Result<Value, AppError> {
        Ok(self.get(key)?.unwrap_or(default))
    }
}
