use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::DEFAULT_MAX_HISTORY_SIZE;

pub const MAX_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_PASTE_MENU_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
const MIN_POLL_INTERVAL_MS: u64 = 50;
const MAX_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// 运行期设置，存放在 `settings` 键下；缺失字段取默认值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub max_history_size: usize,
    /// 粘贴菜单自动隐藏时间，0 表示不自动隐藏
    pub paste_menu_timeout_ms: u64,
    pub theme: Theme,
    pub show_tray_icon: bool,
    pub auto_start: bool,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            paste_menu_timeout_ms: DEFAULT_PASTE_MENU_TIMEOUT_MS,
            theme: Theme::System,
            show_tray_icon: true,
            auto_start: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// 把数值字段收敛到允许范围内
    pub fn normalized(mut self) -> Self {
        self.max_history_size = self.max_history_size.clamp(1, MAX_HISTORY_LIMIT);
        self.poll_interval_ms = self
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn paste_menu_timeout(&self) -> Option<Duration> {
        (self.paste_menu_timeout_ms > 0).then(|| Duration::from_millis(self.paste_menu_timeout_ms))
    }

    /// 宽松解析：整体无法识别时回退默认值
    pub fn from_stored(value: Option<Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match serde_json::from_value::<Settings>(value) {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                log::warn!("设置数据无法解析，使用默认设置: {}", e);
                Self::default()
            }
        }
    }
}
