//! 按名字分发的命令层
//!
//! 界面层用 kebab-case 命令名加 JSON 参数调用核心，返回 JSON。
//! 参数缺失或类型不符统一返回 `AppError::Command`。

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::engine::{ClipboardCore, PinMeta};
use crate::error::AppError;
use crate::hotkeys::{self, HotkeyAction};
use crate::menu::HideReason;
use crate::model::ClipId;
use crate::pinned::{PinRequest, PinnedUpdate};
use crate::settings::Settings;

/// 可分发的命令名
pub const COMMAND_NAMES: &[&str] = &[
    "get-clipboard-history",
    "get-pinned-items",
    "get-merge-tags",
    "search-history",
    "search-pinned",
    "remove-history-item",
    "remove-item",
    "clear-history",
    "pin-item",
    "pin-history-item",
    "pin-current-clipboard",
    "update-pinned-item",
    "unpin-item",
    "copy-item",
    "copy-pinned-item",
    "paste-item",
    "paste-pinned-item",
    "quick-paste",
    "quick-paste-pinned",
    "replace-merge-tag",
    "show-paste-menu",
    "hide-paste-menu",
    "get-paste-menu-state",
    "get-settings",
    "save-settings",
    "clear-all-data",
    "get-hotkey-bindings",
    "trigger-hotkey",
];

#[derive(Deserialize)]
struct IdArgs {
    id: ClipId,
}

#[derive(Deserialize)]
struct IndexArgs {
    index: usize,
}

#[derive(Deserialize)]
struct SlotArgs {
    #[serde(alias = "index")]
    n: usize,
}

#[derive(Deserialize)]
struct SearchArgs {
    #[serde(default)]
    term: String,
}

#[derive(Deserialize)]
struct PinHistoryArgs {
    id: ClipId,
    #[serde(flatten)]
    meta: PinMeta,
}

#[derive(Deserialize)]
struct UpdatePinnedArgs {
    id: ClipId,
    #[serde(flatten)]
    update: PinnedUpdate,
}

#[derive(Deserialize)]
struct HideArgs {
    #[serde(default = "default_hide_reason")]
    reason: HideReason,
}

fn default_hide_reason() -> HideReason {
    HideReason::Closed
}

#[derive(Deserialize)]
struct TriggerArgs {
    action: HotkeyAction,
}

fn parse<T: DeserializeOwned>(name: &str, args: Value) -> Result<T, AppError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| AppError::Command(format!("{} 参数无效: {}", name, e)))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value)?)
}

/// 粘贴类命令在异步上下文中执行；其余命令会读写剪贴板或同步写 SQLite，
/// 放到阻塞线程池中执行
pub async fn dispatch(core: &Arc<ClipboardCore>, name: &str, args: Value) -> Result<Value, AppError> {
    log::debug!("命令: {}", name);
    match name {
        "paste-item" => {
            let IdArgs { id } = parse(name, args)?;
            to_json(core.paste_item(&id).await?)
        }
        "paste-pinned-item" => {
            let IdArgs { id } = parse(name, args)?;
            to_json(core.paste_pinned_item(&id).await?)
        }
        "quick-paste" => {
            let SlotArgs { n } = parse(name, args)?;
            to_json(core.quick_paste(n).await?)
        }
        "quick-paste-pinned" => {
            let SlotArgs { n } = parse(name, args)?;
            to_json(core.quick_paste_pinned(n).await?)
        }
        "replace-merge-tag" => to_json(core.replace_merge_tag().await?),
        "show-paste-menu" => to_json(core.show_paste_menu()),
        "trigger-hotkey" => {
            let TriggerArgs { action } = parse(name, args)?;
            core.trigger(action).await?;
            Ok(json!(true))
        }
        _ => {
            let core = Arc::clone(core);
            let name = name.to_string();
            tokio::task::spawn_blocking(move || dispatch_blocking(&core, &name, args)).await?
        }
    }
}

fn dispatch_blocking(core: &ClipboardCore, name: &str, args: Value) -> Result<Value, AppError> {
    match name {
        "get-clipboard-history" => to_json(core.history()),
        "get-pinned-items" => to_json(core.pinned()),
        "get-merge-tags" => to_json(core.merge_tags()),
        "search-history" => {
            let SearchArgs { term } = parse(name, args)?;
            to_json(core.search_history(&term))
        }
        "search-pinned" => {
            let SearchArgs { term } = parse(name, args)?;
            to_json(core.search_pinned(&term))
        }
        "remove-history-item" => {
            let IdArgs { id } = parse(name, args)?;
            to_json(core.remove_history_item(&id))
        }
        "remove-item" => {
            let IndexArgs { index } = parse(name, args)?;
            to_json(core.remove_history_at(index))
        }
        "clear-history" => {
            core.clear_history();
            to_json(core.history())
        }
        "pin-item" => {
            let request: PinRequest = parse(name, args)?;
            to_json(core.pin_item(request)?)
        }
        "pin-history-item" => {
            let PinHistoryArgs { id, meta } = parse(name, args)?;
            to_json(core.pin_history_item(&id, meta)?)
        }
        "pin-current-clipboard" => {
            let meta: PinMeta = parse(name, args)?;
            to_json(core.pin_current_clipboard(meta)?)
        }
        "update-pinned-item" => {
            let UpdatePinnedArgs { id, update } = parse(name, args)?;
            to_json(core.update_pinned_item(&id, update)?)
        }
        "unpin-item" => {
            let IdArgs { id } = parse(name, args)?;
            to_json(core.unpin_item(&id))
        }
        "copy-item" => {
            let IdArgs { id } = parse(name, args)?;
            core.copy_item(&id)?;
            Ok(json!(true))
        }
        "copy-pinned-item" => {
            let IdArgs { id } = parse(name, args)?;
            core.copy_pinned_item(&id)?;
            Ok(json!(true))
        }
        "hide-paste-menu" => {
            let HideArgs { reason } = parse(name, args)?;
            to_json(core.hide_paste_menu(reason))
        }
        "get-paste-menu-state" => to_json(core.paste_menu_state()),
        "get-settings" => to_json(core.settings()),
        "save-settings" => {
            let settings: Settings = parse(name, args)?;
            to_json(core.save_settings(settings))
        }
        "clear-all-data" => {
            core.clear_all_data()?;
            Ok(json!(true))
        }
        "get-hotkey-bindings" => to_json(hotkeys::default_bindings()),
        _ => Err(AppError::Command(format!("未知命令: {}", name))),
    }
}
