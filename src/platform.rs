//! 平台适配层（分层门面）
//!
//! - `clipboard`：基于 `arboard` 的剪贴板端口
//! - `input`：基于 `enigo` 的按键模拟端口

#[path = "platform/clipboard.rs"]
mod clipboard;
#[path = "platform/input.rs"]
mod input;

pub use clipboard::ArboardClipboard;
pub use input::EnigoInput;
