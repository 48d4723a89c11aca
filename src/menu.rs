//! 粘贴菜单可见性状态机
//!
//! ```text
//! Hidden --show (历史非空)--> Visible
//! Visible --close / 失焦 / 选中条目 / 超时--> Hidden
//! ```
//!
//! 自动隐藏计时器由核心层调度；每次显示都会递增 `generation`，过期计时器
//! 携带的旧代号不会隐藏重新显示的菜单。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuState {
    #[default]
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HideReason {
    Closed,
    FocusLost,
    ItemSelected,
    Timeout,
}

#[derive(Debug, Default)]
pub struct PasteMenu {
    state: MenuState,
    generation: u64,
}

impl PasteMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == MenuState::Visible
    }

    /// 历史为空时保持隐藏并返回 `None`；否则返回本次显示的代号
    pub fn show(&mut self, history_is_empty: bool) -> Option<u64> {
        if history_is_empty {
            log::debug!("历史为空，不显示粘贴菜单");
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.state = MenuState::Visible;
        Some(self.generation)
    }

    /// 返回状态是否发生变化
    pub fn hide(&mut self, reason: HideReason) -> bool {
        if self.state == MenuState::Hidden {
            return false;
        }
        log::debug!("粘贴菜单隐藏: {:?}", reason);
        self.state = MenuState::Hidden;
        true
    }

    /// 自动隐藏计时器到期；代号过期则忽略
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.hide(HideReason::Timeout)
    }
}
