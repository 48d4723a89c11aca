use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::AppError;

use super::KeyValueStore;

/// 进程内键值存储，进程退出即丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, AppError> {
        self.values
            .lock()
            .map_err(|e| AppError::Storage(format!("获取内存存储锁失败: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), AppError> {
        self.lock()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        self.lock()?.clear();
        Ok(())
    }
}
