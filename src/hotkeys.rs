//! 快捷键动作与默认绑定
//!
//! 全局快捷键的注册属于宿主层，这里只定义“名字 → 动作”的映射和默认
//! 加速键表，宿主层拿到按键事件后调用 `ClipboardCore::trigger`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

pub const QUICK_SLOTS: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    ShowHistory,
    ShowPasteMenu,
    MergeTag,
    AddPinned,
    /// 粘贴第 N 新的历史条目（1..=9）
    QuickPaste(u8),
    /// 粘贴第 N 个固定条目（1..=9）
    PinnedPaste(u8),
}

impl HotkeyAction {
    /// 全部动作，按默认绑定表顺序
    pub fn all() -> Vec<HotkeyAction> {
        let mut actions = vec![
            HotkeyAction::ShowHistory,
            HotkeyAction::ShowPasteMenu,
            HotkeyAction::MergeTag,
            HotkeyAction::AddPinned,
        ];
        actions.extend((1..=QUICK_SLOTS).map(HotkeyAction::QuickPaste));
        actions.extend((1..=QUICK_SLOTS).map(HotkeyAction::PinnedPaste));
        actions
    }

    pub fn name(&self) -> String {
        match self {
            HotkeyAction::ShowHistory => "showHistory".to_string(),
            HotkeyAction::ShowPasteMenu => "showPasteMenu".to_string(),
            HotkeyAction::MergeTag => "mergeTag".to_string(),
            HotkeyAction::AddPinned => "addPinned".to_string(),
            HotkeyAction::QuickPaste(n) => format!("quickPaste{n}"),
            HotkeyAction::PinnedPaste(n) => format!("pinnedPaste{n}"),
        }
    }

    pub fn default_accelerator(&self) -> String {
        match self {
            HotkeyAction::ShowHistory => "CommandOrControl+Shift+V".to_string(),
            HotkeyAction::ShowPasteMenu => "CommandOrControl+Alt+V".to_string(),
            HotkeyAction::MergeTag => "CommandOrControl+Alt+M".to_string(),
            HotkeyAction::AddPinned => "CommandOrControl+Alt+P".to_string(),
            HotkeyAction::QuickPaste(n) => format!("CommandOrControl+Alt+{n}"),
            HotkeyAction::PinnedPaste(n) => format!("CommandOrControl+Shift+{n}"),
        }
    }
}

fn parse_slot(raw: &str) -> Option<u8> {
    let n: u8 = raw.parse().ok()?;
    (1..=QUICK_SLOTS).contains(&n).then_some(n)
}

impl FromStr for HotkeyAction {
    type Err = AppError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let action = match name {
            "showHistory" => Some(HotkeyAction::ShowHistory),
            "showPasteMenu" => Some(HotkeyAction::ShowPasteMenu),
            "mergeTag" => Some(HotkeyAction::MergeTag),
            "addPinned" => Some(HotkeyAction::AddPinned),
            _ => {
                if let Some(slot) = name.strip_prefix("quickPaste") {
                    parse_slot(slot).map(HotkeyAction::QuickPaste)
                } else if let Some(slot) = name.strip_prefix("pinnedPaste") {
                    parse_slot(slot).map(HotkeyAction::PinnedPaste)
                } else {
                    None
                }
            }
        };
        action.ok_or_else(|| AppError::Validation(format!("未知的快捷键动作: {}", name)))
    }
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for HotkeyAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for HotkeyAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyBinding {
    pub action: HotkeyAction,
    pub accelerator: String,
}

pub fn default_bindings() -> Vec<HotkeyBinding> {
    HotkeyAction::all()
        .into_iter()
        .map(|action| HotkeyBinding {
            accelerator: action.default_accelerator(),
            action,
        })
        .collect()
}
