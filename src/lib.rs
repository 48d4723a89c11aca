//! # clip-ledger 库入口
//!
//! 剪贴板历史、固定条目与合并标签的状态引擎。
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │          宿主层（界面 / 全局快捷键 / 托盘 / stdio）         │
//! │                commands::dispatch(name, json)            │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<Value, AppError>      ↑ CoreEvent (broadcast)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕        engine::ClipboardCore                     │
//! │                                                          │
//! │  ┌─ history ──── 有界去重列表                              │
//! │  ├─ pinned ───── 固定条目 + merge_tags 注册表（同步维护）    │
//! │  ├─ watcher ──── 轮询 + 上次捕获指纹                        │
//! │  ├─ paste ────── 写入 → 模拟粘贴 → 延迟恢复                 │
//! │  │   └─ replace  合并标签替换                              │
//! │  ├─ menu ─────── 粘贴菜单状态机                            │
//! │  └─ settings                                             │
//! └───────┬───────────────────────┬──────────────────────────┘
//!         ↕ ports                 ↕ store
//!   platform (arboard / enigo)   SQLite kv / 内存
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`model`] | `ClipContent` / `ClipEntry` / `PinnedEntry` / `MergeTagValue` |
//! | [`history`] | 历史列表：去重、裁剪、序号、检索 |
//! | [`merge_tags`] | slug 校验与注册表 |
//! | [`pinned`] | 固定条目与注册表的一致性维护 |
//! | [`watcher`] | 剪贴板轮询与捕获判定 |
//! | [`paste`] / [`replace`] | 粘贴恢复序列与合并标签替换 |
//! | [`guard`] | 捕获暂停与重入保护的 RAII 守卫 |
//! | [`menu`] | 粘贴菜单可见性 |
//! | [`hotkeys`] | 快捷键动作与默认绑定 |
//! | [`engine`] | 核心门面，串行化所有状态变更 |
//! | [`commands`] | 按名字分发的 JSON 命令 |
//! | [`store`] / [`codec`] | 键值存储与存储边界编解码 |
//! | [`ports`] / [`platform`] | 剪贴板与按键模拟端口及其系统实现 |

pub mod codec;
pub mod commands;
pub mod engine;
pub mod error;
pub mod events;
pub mod guard;
pub mod history;
pub mod hotkeys;
pub mod image_codec;
pub mod menu;
pub mod merge_tags;
pub mod model;
pub mod paste;
pub mod pinned;
pub mod platform;
pub mod ports;
pub mod replace;
pub mod settings;
pub mod store;
pub mod watcher;

pub use engine::ClipboardCore;
pub use error::AppError;
