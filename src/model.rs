//! 数据模型
//!
//! 剪贴板内容只有两种形态：文本与图片。历史条目、固定条目、合并标签的值
//! 都围绕同一个带标签的 [`ClipContent`] 展开，旧版“纯字符串”条目只在存储
//! 边界（[`crate::codec`]）被转换一次，业务代码里不再按值的形状分支。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Text,
    Image,
}

impl fmt::Display for ClipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipKind::Text => f.write_str("text"),
            ClipKind::Image => f.write_str("image"),
        }
    }
}

/// 图片尺寸（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// 剪贴板内容
///
/// 图片内容为存储编码（PNG data URL），尺寸仅在图片分支上存在。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipContent {
    Text { content: String },
    Image { content: String, size: ImageSize },
}

impl ClipContent {
    pub fn text(content: impl Into<String>) -> Self {
        ClipContent::Text { content: content.into() }
    }

    pub fn image(content: impl Into<String>, size: ImageSize) -> Self {
        ClipContent::Image { content: content.into(), size }
    }

    pub fn kind(&self) -> ClipKind {
        match self {
            ClipContent::Text { .. } => ClipKind::Text,
            ClipContent::Image { .. } => ClipKind::Image,
        }
    }

    /// 原始内容：文本本身，或图片的存储编码
    pub fn raw(&self) -> &str {
        match self {
            ClipContent::Text { content } | ClipContent::Image { content, .. } => content,
        }
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        match self {
            ClipContent::Image { size, .. } => Some(*size),
            ClipContent::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClipContent::Text { content } => Some(content),
            ClipContent::Image { .. } => None,
        }
    }

    /// 空白文本或空图片视为“没有内容”
    pub fn is_blank(&self) -> bool {
        match self {
            ClipContent::Text { content } => content.trim().is_empty(),
            ClipContent::Image { content, .. } => content.is_empty(),
        }
    }

    /// 去重判等：只比较类型与内容，图片尺寸不参与
    pub fn same_as(&self, other: &ClipContent) -> bool {
        self.kind() == other.kind() && self.raw() == other.raw()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            kind: self.kind(),
            content: self.raw().to_string(),
        }
    }
}

/// 内容指纹 `(kind, content)`，监控器用它记住“上一次成功捕获”
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    kind: ClipKind,
    content: String,
}

impl Fingerprint {
    pub fn matches(&self, content: &ClipContent) -> bool {
        self.kind == content.kind() && self.content == content.raw()
    }
}

/// 条目标识：毫秒时间戳 + 随机后缀
///
/// 只用于会话内的身份比较，不保证跨进程重启唯一。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        ClipId(format!("{}-{:08x}", millis, rand::random::<u32>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClipId {
    fn from(value: &str) -> Self {
        ClipId(value.to_string())
    }
}

impl From<String> for ClipId {
    fn from(value: String) -> Self {
        ClipId(value)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 剪贴板历史条目，创建后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipEntry {
    pub id: ClipId,
    /// 捕获时间（Unix 毫秒）
    #[serde(rename = "timestamp")]
    pub captured_at: i64,
    #[serde(flatten)]
    pub content: ClipContent,
}

impl ClipEntry {
    pub fn new(content: ClipContent) -> Self {
        Self {
            id: ClipId::generate(),
            captured_at: chrono::Utc::now().timestamp_millis(),
            content,
        }
    }

    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }
}

pub const DEFAULT_PINNED_TITLE: &str = "Pinned Item";

/// 固定条目：内容 + 用户整理的元数据
///
/// 身份以 `id` 为准，内容可被编辑。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedEntry {
    pub id: ClipId,
    pub timestamp: i64,
    #[serde(flatten)]
    pub content: ClipContent,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merge_tag_slug: Option<String>,
}

impl PinnedEntry {
    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }
}

/// 合并标签的值：文本，或与固定图片同形的 `{content, size}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MergeTagValue {
    Text(String),
    Image { content: String, size: ImageSize },
}

impl MergeTagValue {
    pub fn from_content(content: &ClipContent) -> Self {
        match content {
            ClipContent::Text { content } => MergeTagValue::Text(content.clone()),
            ClipContent::Image { content, size } => MergeTagValue::Image {
                content: content.clone(),
                size: *size,
            },
        }
    }

    pub fn to_content(&self) -> ClipContent {
        match self {
            MergeTagValue::Text(text) => ClipContent::text(text.clone()),
            MergeTagValue::Image { content, size } => ClipContent::image(content.clone(), *size),
        }
    }
}
