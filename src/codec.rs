//! 存储边界的编解码
//!
//! 持久化数据可能来自旧版本：历史条目可能是纯字符串，也可能缺少 `id` /
//! `timestamp`。这里统一转换成 [`ClipEntry`] / [`PinnedEntry`]，无法识别的
//! 记录记一条警告后跳过，不让一条坏数据拖垮整个列表。

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::merge_tags::MergeTagRegistry;
use crate::model::{ClipContent, ClipEntry, ClipId, MergeTagValue, PinnedEntry, DEFAULT_PINNED_TITLE};

#[derive(Deserialize)]
struct StoredEntry {
    #[serde(default)]
    id: Option<ClipId>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(flatten)]
    content: ClipContent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPinned {
    #[serde(default)]
    id: Option<ClipId>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(flatten)]
    content: ClipContent,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    merge_tag_slug: Option<String>,
}

fn as_array(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            log::warn!("存储键 {} 的内容不是数组，已忽略: {}", key, other);
            Vec::new()
        }
    }
}

fn decode_entry(item: Value) -> Result<Option<ClipEntry>, AppError> {
    if let Value::String(text) = item {
        if text.trim().is_empty() {
            return Ok(None);
        }
        return Ok(Some(ClipEntry::new(ClipContent::text(text))));
    }

    let stored: StoredEntry = serde_json::from_value(item)?;
    if stored.content.is_blank() {
        return Ok(None);
    }
    let mut entry = ClipEntry::new(stored.content);
    if let Some(id) = stored.id {
        entry.id = id;
    }
    if let Some(timestamp) = stored.timestamp {
        entry.captured_at = timestamp;
    }
    Ok(Some(entry))
}

/// 解码历史列表；旧版纯字符串条目转换为文本条目并分配新 id
pub fn decode_history(value: Value) -> Vec<ClipEntry> {
    as_array(value, "clipboardHistory")
        .into_iter()
        .filter_map(|item| match decode_entry(item) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("跳过无法解析的历史条目: {}", e);
                None
            }
        })
        .collect()
}

fn decode_pinned_item(item: Value) -> Result<PinnedEntry, AppError> {
    let stored: StoredPinned = serde_json::from_value(item)?;
    let title = if stored.title.trim().is_empty() {
        DEFAULT_PINNED_TITLE.to_string()
    } else {
        stored.title
    };
    Ok(PinnedEntry {
        id: stored.id.unwrap_or_else(ClipId::generate),
        timestamp: stored
            .timestamp
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        content: stored.content,
        title,
        description: stored.description,
        merge_tag_slug: stored
            .merge_tag_slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

pub fn decode_pinned(value: Value) -> Vec<PinnedEntry> {
    as_array(value, "pinnedHistory")
        .into_iter()
        .filter_map(|item| match decode_pinned_item(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("跳过无法解析的固定条目: {}", e);
                None
            }
        })
        .collect()
}

/// 解码合并标签；单个值无法识别时只丢弃该项
pub fn decode_merge_tags(value: Value) -> MergeTagRegistry {
    let mut registry = MergeTagRegistry::new();
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return registry,
        other => {
            log::warn!("合并标签数据不是对象，已忽略: {}", other);
            return registry;
        }
    };

    for (slug, raw) in map {
        match serde_json::from_value::<MergeTagValue>(raw) {
            Ok(tag) => registry.insert(slug, tag),
            Err(e) => log::warn!("跳过无法解析的合并标签 \"{}\": {}", slug, e),
        }
    }
    registry
}

pub fn encode_history(entries: &[ClipEntry]) -> Result<Value, AppError> {
    Ok(serde_json::to_value(entries)?)
}

pub fn encode_pinned(items: &[PinnedEntry]) -> Result<Value, AppError> {
    Ok(serde_json::to_value(items)?)
}

pub fn encode_merge_tags(tags: &MergeTagRegistry) -> Result<Value, AppError> {
    Ok(serde_json::to_value(tags)?)
}
