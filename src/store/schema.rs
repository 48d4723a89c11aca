//! Schema 初始化子模块
//!
//! ## 职责
//! - 创建键值表
//! - 设置 SQLite 运行参数（WAL）
//! - 通过 `PRAGMA user_version` 记录结构版本
//!
//! ## 错误语义
//! - DDL 失败统一映射为 `AppError::Storage`

use rusqlite::Connection;

use crate::error::AppError;

const SCHEMA_VERSION: i64 = 1;

fn get_user_version(conn: &Connection) -> Result<i64, AppError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| AppError::Storage(format!("读取数据库版本失败: {}", e)))
}

fn set_user_version(conn: &Connection, version: i64) -> Result<(), AppError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| AppError::Storage(format!("写入数据库版本失败: {}", e)))
}

fn create_kv_table(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );",
    )
    .map_err(|e| AppError::Storage(format!("创建键值表失败: {}", e)))
}

pub(crate) fn initialize_schema(conn: &Connection) -> Result<(), AppError> {
    // 内存库不支持 WAL，忽略返回值
    conn.execute_batch("PRAGMA journal_mode=WAL;").ok();

    let version = get_user_version(conn)?;
    if version > SCHEMA_VERSION {
        log::warn!(
            "数据库版本 {} 高于当前支持的 {}，按兼容模式继续",
            version,
            SCHEMA_VERSION
        );
    }

    create_kv_table(conn)?;

    if version < SCHEMA_VERSION {
        set_user_version(conn, SCHEMA_VERSION)?;
        log::info!("数据库结构已升级到版本 {}", SCHEMA_VERSION);
    }
    Ok(())
}
