//! 外部协作端口
//!
//! 核心只通过这两个 trait 接触操作系统：
//! - [`ClipboardPort`]：读写系统剪贴板（文本 / 图片）
//! - [`InputPort`]：模拟复制 / 粘贴按键
//!
//! 真实实现见 [`crate::platform`]，测试使用内存替身。

use crate::error::AppError;
use crate::image_codec::RawImage;

pub trait ClipboardPort: Send + Sync {
    /// 读取文本；剪贴板上没有文本时返回 `Ok(None)`
    fn read_text(&self) -> Result<Option<String>, AppError>;

    /// 读取图片；没有图片时返回 `Ok(None)`
    fn read_image(&self) -> Result<Option<RawImage>, AppError>;

    fn write_text(&self, text: &str) -> Result<(), AppError>;

    fn write_image(&self, image: &RawImage) -> Result<(), AppError>;
}

pub trait InputPort: Send + Sync {
    fn press_paste_keystroke(&self) -> Result<(), AppError>;

    fn press_copy_keystroke(&self) -> Result<(), AppError>;
}
