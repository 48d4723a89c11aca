use std::borrow::Cow;

use crate::error::AppError;
use crate::image_codec::RawImage;
use crate::ports::ClipboardPort;

/// 系统剪贴板端口
///
/// 每次调用都新建 `arboard::Clipboard`，不跨调用持有剪贴板句柄。
#[derive(Debug, Default, Clone, Copy)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }
}

fn open() -> Result<arboard::Clipboard, AppError> {
    arboard::Clipboard::new().map_err(|e| AppError::Clipboard(format!("打开剪贴板失败: {}", e)))
}

impl ClipboardPort for ArboardClipboard {
    fn read_text(&self) -> Result<Option<String>, AppError> {
        match open()?.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(AppError::Clipboard(format!("读取文本失败: {}", e))),
        }
    }

    fn read_image(&self) -> Result<Option<RawImage>, AppError> {
        match open()?.get_image() {
            Ok(data) => {
                let raw = RawImage {
                    width: data.width,
                    height: data.height,
                    bytes: data.bytes.into_owned(),
                };
                Ok((!raw.is_empty()).then_some(raw))
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(AppError::Clipboard(format!("读取图片失败: {}", e))),
        }
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        open()?
            .set_text(text.to_string())
            .map_err(|e| AppError::Clipboard(format!("写入文本失败: {}", e)))
    }

    fn write_image(&self, image: &RawImage) -> Result<(), AppError> {
        let data = arboard::ImageData {
            width: image.width,
            height: image.height,
            bytes: Cow::Borrowed(&image.bytes),
        };
        open()?
            .set_image(data)
            .map_err(|e| AppError::Clipboard(format!("写入图片失败: {}", e)))
    }
}
