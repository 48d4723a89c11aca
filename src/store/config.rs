use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const APP_DIR_NAME: &str = "clip-ledger";
const DB_FILE_NAME: &str = "clipboard.db";
const CONFIG_FILE_NAME: &str = "config.json";
const DATA_DIR_ENV: &str = "CLIP_LEDGER_DATA_DIR";

/// 启动配置：只决定数据库放在哪里，运行期设置存放在数据库内
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: Option<String>,
}

/// 环境变量 `CLIP_LEDGER_DATA_DIR` 优先，其次系统数据目录下的 `clip-ledger`
pub fn default_data_dir() -> Result<PathBuf, AppError> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::Storage("获取应用数据目录失败".to_string()))
}

fn config_path(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join(CONFIG_FILE_NAME)
}

fn load_config_from_path(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("配置文件 {} 无法解析，使用默认配置: {}", path.display(), e);
            AppConfig::default()
        }),
        Err(e) => {
            log::warn!("读取配置文件 {} 失败，使用默认配置: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

fn save_config_to_path(path: &Path, config: &AppConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::Storage(format!("创建配置目录失败: {}", e)))?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)
        .map_err(|e| AppError::Storage(format!("写入配置文件失败: {}", e)))?;
    Ok(())
}

fn resolve_db_path_from_config(app_data_dir: &Path, config: &AppConfig) -> Result<PathBuf, AppError> {
    let dir = match config.data_dir.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => app_data_dir.to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .map_err(|e| AppError::Storage(format!("创建数据库目录失败: {}", e)))?;
    Ok(dir.join(DB_FILE_NAME))
}

pub fn load_app_config(app_data_dir: &Path) -> AppConfig {
    load_config_from_path(&config_path(app_data_dir))
}

pub fn save_app_config(app_data_dir: &Path, config: &AppConfig) -> Result<(), AppError> {
    save_config_to_path(&config_path(app_data_dir), config)
}

/// 解析数据库文件路径，必要时创建目录
pub fn resolve_db_path(app_data_dir: &Path) -> Result<PathBuf, AppError> {
    let config = load_app_config(app_data_dir);
    resolve_db_path_from_config(app_data_dir, &config)
}
