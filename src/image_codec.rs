//! # 图片存储编码模块
//!
//! ## 设计思路
//!
//! 剪贴板端口交换的是原始 RGBA 像素（[`RawImage`]），历史与固定条目里
//! 保存的是 PNG data URL（`data:image/png;base64,...`），可以直接作为前端
//! `<img src>` 使用。两者之间的转换只在这里发生。
//!
//! ## 实现思路
//!
//! - 编码：`image::RgbaImage::from_raw` → PNG → base64。
//! - 解码：接受 data URL 或裸 base64，解码后统一转为 RGBA8。
//! - 摘要：[`ImageDigest`] 是原始像素的 xxh3 哈希，监控器用它判断剪贴板上的
//!   图片是否变化，不必每个 tick 都重新编码 PNG。

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use twox_hash::xxh3::hash64;

use crate::error::AppError;
use crate::model::{ClipContent, ImageSize};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// 剪贴板上的原始图片（RGBA8，行优先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

impl RawImage {
    /// 零尺寸或零字节的图片按“没有图片”处理
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.bytes.is_empty()
    }

    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width as u32,
            height: self.height as u32,
        }
    }

    pub fn digest(&self) -> ImageDigest {
        ImageDigest {
            width: self.width,
            height: self.height,
            hash: hash64(&self.bytes),
        }
    }
}

/// 原始像素摘要，只用于判断“和上次读到的是不是同一张图”
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDigest {
    width: usize,
    height: usize,
    hash: u64,
}

/// RGBA 像素 → PNG data URL
pub fn encode_data_url(raw: &RawImage) -> Result<String, AppError> {
    let image = image::RgbaImage::from_raw(raw.width as u32, raw.height as u32, raw.bytes.clone())
        .ok_or_else(|| AppError::Image("创建图像缓冲区失败".to_string()))?;

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Image(format!("PNG 编码失败: {}", e)))?;

    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&png)))
}

/// 原始图片 → 可入库的图片内容
pub fn to_clip_content(raw: &RawImage) -> Result<ClipContent, AppError> {
    Ok(ClipContent::image(encode_data_url(raw)?, raw.size()))
}

/// data URL 或裸 base64 → RGBA 像素
pub fn decode_data_url(encoded: &str) -> Result<RawImage, AppError> {
    let payload = match encoded.split_once(";base64,") {
        Some((header, body)) if header.starts_with("data:") => body,
        _ => encoded,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Image(format!("base64 解码失败: {}", e)))?;
    let rgba = image::load_from_memory(&bytes)
        .map_err(|e| AppError::Image(format!("图片解码失败: {}", e)))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(RawImage {
        width: width as usize,
        height: height as usize,
        bytes: rgba.into_raw(),
    })
}
