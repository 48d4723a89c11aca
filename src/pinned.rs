//! 固定条目子模块
//!
//! ## 职责
//! - 维护用户整理的固定条目列表（最新在前）
//! - 固定 / 编辑 / 取消固定时同步维护合并标签注册表
//!
//! ## 不变量
//! - 每个非空 `merge_tag_slug` 至多被一个固定条目占用
//! - 任意公开操作返回后，固定条目上的 slug 集合与注册表键集合完全一致
//!
//! ## 错误语义
//! - slug 格式非法 / 冲突 / 内容为空 → `AppError::Validation`，状态不做任何修改
//! - 编辑不存在的条目 → `AppError::NotFound`
//! - 取消固定不存在的条目 → 静默忽略（幂等删除）

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Deserializer};

use crate::error::AppError;
use crate::history::content_matches;
use crate::merge_tags::{normalize_slug_input, validate_slug, MergeTagRegistry};
use crate::model::{ClipContent, ClipId, MergeTagValue, PinnedEntry, DEFAULT_PINNED_TITLE};

/// 新建固定条目的参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRequest {
    #[serde(flatten)]
    pub content: ClipContent,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merge_tag_slug: Option<String>,
}

impl PinRequest {
    pub fn new(content: ClipContent) -> Self {
        Self {
            content,
            title: String::new(),
            description: String::new(),
            merge_tag_slug: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.merge_tag_slug = Some(slug.into());
        self
    }
}

/// 编辑表单提交的字段
///
/// 未提交的字段保留原值。`mergeTagSlug` 显式给出 `null` 或空串时移除合并标签；
/// 标题或描述给出空串时回到与新建时相同的默认值。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedUpdate {
    #[serde(default)]
    pub content: Option<ClipContent>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// 外层 `None`：未提交；`Some(None)`：移除
    #[serde(default, deserialize_with = "submitted")]
    pub merge_tag_slug: Option<Option<String>>,
}

/// 区分“字段缺省”与“字段为 null”
fn submitted<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        DEFAULT_PINNED_TITLE.to_string()
    } else {
        title.to_string()
    }
}

fn default_description(description: &str, content: &ClipContent) -> String {
    let description = description.trim();
    if !description.is_empty() {
        return description.to_string();
    }
    content.as_text().map(str::to_string).unwrap_or_default()
}

fn ensure_content(content: &ClipContent) -> Result<(), AppError> {
    if content.is_blank() {
        return Err(AppError::Validation("内容不能为空".to_string()));
    }
    Ok(())
}

/// 固定条目列表与合并标签注册表的组合
///
/// 两者只能通过本类型一起修改。
#[derive(Debug, Clone, Default)]
pub struct PinBoard {
    items: Vec<PinnedEntry>,
    tags: MergeTagRegistry,
}

impl PinBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从持久化数据恢复，并修复两边不一致的部分
    ///
    /// - 重复占用同一 slug 的后续条目被摘除 slug
    /// - 有 slug 但注册表缺失的条目，按条目内容补写注册表
    /// - 没有归属条目的注册表项被丢弃
    pub fn from_parts(items: Vec<PinnedEntry>, tags: MergeTagRegistry) -> Self {
        let mut board = Self { items, tags };
        let mut claimed = HashSet::new();

        for item in board.items.iter_mut() {
            let Some(slug) = item.merge_tag_slug.clone() else {
                continue;
            };
            if validate_slug(&slug).is_err() || !claimed.insert(slug.clone()) {
                log::warn!("固定条目 {} 的合并标签 \"{}\" 无效或重复，已移除", item.id, slug);
                item.merge_tag_slug = None;
                continue;
            }
            if !board.tags.contains(&slug) {
                log::warn!("合并标签 \"{}\" 缺失，按固定条目内容补写", slug);
                board.tags.insert(slug, MergeTagValue::from_content(&item.content));
            }
        }

        let orphans: Vec<String> = board
            .tags
            .slugs()
            .filter(|slug| !claimed.contains(*slug))
            .map(str::to_string)
            .collect();
        for slug in orphans {
            log::warn!("合并标签 \"{}\" 没有对应的固定条目，已丢弃", slug);
            board.tags.remove(&slug);
        }

        board
    }

    pub fn items(&self) -> &[PinnedEntry] {
        &self.items
    }

    pub fn tags(&self) -> &MergeTagRegistry {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ClipId) -> Option<&PinnedEntry> {
        self.items.iter().find(|p| &p.id == id)
    }

    /// 快速粘贴序号（1 起）
    pub fn nth_recent(&self, n: usize) -> Option<&PinnedEntry> {
        n.checked_sub(1).and_then(|i| self.items.get(i))
    }

    fn check_slug_available(&self, slug: &str, owner: Option<&ClipId>) -> Result<(), AppError> {
        validate_slug(slug)?;
        let taken_by_other = self
            .items
            .iter()
            .any(|p| p.merge_tag_slug.as_deref() == Some(slug) && Some(&p.id) != owner);
        if taken_by_other || (owner.is_none() && self.tags.contains(slug)) {
            return Err(AppError::Validation(format!("合并标签 \"{}\" 已存在", slug)));
        }
        Ok(())
    }

    /// 新建固定条目并插入到列表头部
    pub fn pin(&mut self, request: PinRequest) -> Result<&PinnedEntry, AppError> {
        ensure_content(&request.content)?;
        let slug = normalize_slug_input(request.merge_tag_slug.as_deref());
        if let Some(slug) = slug.as_deref() {
            self.check_slug_available(slug, None)?;
        }

        let entry = PinnedEntry {
            id: ClipId::generate(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            title: default_title(&request.title),
            description: default_description(&request.description, &request.content),
            merge_tag_slug: slug.clone(),
            content: request.content,
        };

        if let Some(slug) = slug {
            self.tags.insert(slug, MergeTagValue::from_content(&entry.content));
        }
        self.items.insert(0, entry);
        Ok(&self.items[0])
    }

    /// 编辑固定条目；新旧 slug 不同时旧标签删除、新标签写入，与条目更新一起生效
    pub fn update(&mut self, id: &ClipId, update: PinnedUpdate) -> Result<&PinnedEntry, AppError> {
        let index = self
            .items
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("固定条目 {}", id)))?;

        let content = update
            .content
            .unwrap_or_else(|| self.items[index].content.clone());
        ensure_content(&content)?;

        let old_slug = self.items[index].merge_tag_slug.clone();
        let new_slug = match update.merge_tag_slug {
            Some(submitted) => normalize_slug_input(submitted.as_deref()),
            None => old_slug.clone(),
        };
        if let Some(slug) = new_slug.as_deref() {
            self.check_slug_available(slug, Some(id))?;
        }

        if let Some(old) = old_slug.as_deref() {
            if new_slug.as_deref() != Some(old) {
                self.tags.remove(old);
            }
        }
        if let Some(slug) = new_slug.clone() {
            self.tags.insert(slug, MergeTagValue::from_content(&content));
        }

        let item = &mut self.items[index];
        if let Some(title) = update.title {
            item.title = default_title(&title);
        }
        if let Some(description) = update.description {
            item.description = default_description(&description, &content);
        }
        item.merge_tag_slug = new_slug;
        item.content = content;
        Ok(&self.items[index])
    }

    /// 取消固定；条目不存在时返回 `None` 且不改动注册表
    pub fn unpin(&mut self, id: &ClipId) -> Option<PinnedEntry> {
        let index = self.items.iter().position(|p| &p.id == id)?;
        let removed = self.items.remove(index);
        if let Some(slug) = removed.merge_tag_slug.as_deref() {
            self.tags.remove(slug);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.tags.clear();
    }

    /// 检索标题、描述、slug 与文本内容；图片额外匹配类型关键字
    pub fn search(&self, term: &str) -> Vec<PinnedEntry> {
        let term = term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|p| {
                if term.is_empty() {
                    return true;
                }
                let meta_hit = p.title.to_lowercase().contains(&term)
                    || p.description.to_lowercase().contains(&term)
                    || p
                        .merge_tag_slug
                        .as_deref()
                        .is_some_and(|s| s.contains(&term));
                meta_hit || content_matches(&p.content, &term)
            })
            .cloned()
            .collect()
    }

    /// 固定条目上的 slug 集合与注册表键集合是否一致
    pub fn is_consistent(&self) -> bool {
        let claimed: BTreeSet<&str> = self
            .items
            .iter()
            .filter_map(|p| p.merge_tag_slug.as_deref())
            .collect();
        let registered: BTreeSet<&str> = self.tags.slugs().collect();
        let unique = claimed.len()
            == self
                .items
                .iter()
                .filter(|p| p.merge_tag_slug.is_some())
                .count();
        unique && claimed == registered
    }
}
