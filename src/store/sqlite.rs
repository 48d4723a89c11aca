//! SQLite 键值存储子模块
//!
//! ## 职责
//! - 打开 / 初始化数据库文件
//! - 以 JSON 文本形式读写 `kv` 表
//!
//! ## 错误语义
//! - 连接、SQL、JSON 失败统一映射为 `AppError::Storage`

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::AppError;

use super::{schema, KeyValueStore};

/// 连接封装，所有访问经同一把锁串行化
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("创建数据库目录失败: {}", e)))?;
        }
        log::info!("数据库路径: {}", path.display());

        let conn = Connection::open(path)
            .map_err(|e| AppError::Storage(format!("打开数据库失败: {}", e)))?;
        schema::initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Storage(format!("打开内存数据库失败: {}", e)))?;
        schema::initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn with_conn<T>(&self, op: impl FnOnce(&Connection) -> Result<T, AppError>) -> Result<T, AppError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AppError::Storage(format!("获取数据库锁失败: {}", e)))?;
        op(&conn)
    }
}

fn get_value(conn: &Connection, key: &str) -> Result<Option<Value>, AppError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(|e| AppError::Storage(format!("读取键 {} 失败: {}", key, e)))?;

    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| AppError::Storage(format!("解析键 {} 的内容失败: {}", key, e)))
    })
    .transpose()
}

fn set_value(conn: &Connection, key: &str, value: &Value) -> Result<(), AppError> {
    let text = serde_json::to_string(value)?;
    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, text, now],
    )
    .map_err(|e| AppError::Storage(format!("写入键 {} 失败: {}", key, e)))?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        self.with_conn(|conn| get_value(conn, key))
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), AppError> {
        self.with_conn(|conn| set_value(conn, key, value))
    }

    fn clear(&self) -> Result<(), AppError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv", [])
                .map_err(|e| AppError::Storage(format!("清空存储失败: {}", e)))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use serde_json::json;

    use super::SqliteStore;
    use crate::store::KeyValueStore;

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("clip-ledger-sqlite-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn set_then_get_overwrites_previous_value() {
        let store = SqliteStore::open_in_memory().expect("open store");
        store.set("settings", &json!({"maxHistorySize": 10})).expect("first set");
        store.set("settings", &json!({"maxHistorySize": 20})).expect("second set");

        assert_eq!(
            store.get("settings").expect("get"),
            Some(json!({"maxHistorySize": 20}))
        );
        assert_eq!(store.get("missing").expect("get missing"), None);
        assert_eq!(store.get_or("missing", json!([])).expect("get_or"), json!([]));
    }

    #[test]
    fn clear_removes_every_key() {
        let store = SqliteStore::open_in_memory().expect("open store");
        store.set("a", &json!(1)).expect("set a");
        store.set("b", &json!("two")).expect("set b");
        store.clear().expect("clear");
        assert_eq!(store.get("a").expect("get a"), None);
        assert_eq!(store.get("b").expect("get b"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = unique_temp_dir();
        let path = dir.join("nested").join("clipboard.db");
        {
            let store = SqliteStore::open(&path).expect("open file store");
            store.set("mergeTags", &json!({"greet": "Hello there"})).expect("set");
        }
        let reopened = SqliteStore::open(&path).expect("reopen store");
        assert_eq!(
            reopened.get("mergeTags").expect("get"),
            Some(json!({"greet": "Hello there"}))
        );

        drop(reopened);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_json_is_a_storage_error() {
        let store = SqliteStore::open_in_memory().expect("open store");
        store
            .with_conn(|conn| {
                conn.execute("INSERT INTO kv (key, value) VALUES ('bad', '{not json')", [])?;
                Ok(())
            })
            .expect("insert corrupt row");
        assert!(store.get("bad").is_err());
    }
}
