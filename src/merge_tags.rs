//! 合并标签注册表
//!
//! slug → 文本 / 图片值的映射。slug 只允许 `[a-z0-9_]+`，且全局唯一。
//!
//! 注册表本身不对外暴露写操作：所有增删都经由 [`crate::pinned::PinBoard`]，
//! 与固定条目同步变更，保证两边的 slug 集合始终一致。

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::model::MergeTagValue;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_]+$").expect("合并标签正则必须可编译")
});

/// 校验 slug 格式（调用方负责先 `trim`）
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "合并标签 \"{}\" 只能包含小写字母、数字和下划线",
            slug
        )))
    }
}

/// 规范化用户输入的 slug：去除首尾空白，空字符串视为“未设置”
pub fn normalize_slug_input(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeTagRegistry {
    tags: BTreeMap<String, MergeTagValue>,
}

impl MergeTagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.tags.contains_key(slug)
    }

    pub fn get(&self, slug: &str) -> Option<&MergeTagValue> {
        self.tags.get(slug)
    }

    /// 按选中文本精确查找（仅去除首尾空白，不做模糊匹配）
    pub fn lookup(&self, selection: &str) -> Option<&MergeTagValue> {
        self.tags.get(selection.trim())
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MergeTagValue)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, slug: String, value: MergeTagValue) {
        self.tags.insert(slug, value);
    }

    pub(crate) fn remove(&mut self, slug: &str) -> Option<MergeTagValue> {
        self.tags.remove(slug)
    }

    pub(crate) fn clear(&mut self) {
        self.tags.clear();
    }
}
