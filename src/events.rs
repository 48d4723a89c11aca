//! 核心事件
//!
//! 状态变化通过 `tokio::sync::broadcast` 广播给界面层。没有订阅者时发送
//! 失败是正常情况，直接忽略。

use serde::Serialize;
use tokio::sync::broadcast;

use crate::menu::MenuState;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum CoreEvent {
    HistoryChanged,
    PinnedChanged,
    SettingsChanged,
    /// 请求宿主层显示历史面板
    ShowHistory,
    PasteMenu(MenuState),
    Notification(String),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: CoreEvent) {
        log::trace!("事件: {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn notify(&self, message: impl Into<String>) {
        self.emit(CoreEvent::Notification(message.into()));
    }
}
