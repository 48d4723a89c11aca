//! 历史记录子模块
//!
//! ## 职责
//! - 维护有界、去重、按捕获顺序排列（最新在前）的 `ClipEntry` 列表
//! - 提供按 id / 序号删除、清空、快速粘贴序号解析与搜索
//!
//! ## 不变量
//! - 列表内任意两条目按 `(kind, content)` 均不相等
//! - 插入后超出上限时从尾部（最旧）裁剪
//! - 除删除外不重新排序

use crate::model::{ClipContent, ClipEntry, ClipId, ClipKind};

pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;

/// 图片条目可被这些关键字检索到
pub(crate) const IMAGE_KEYWORDS: [&str; 3] = ["image", "picture", "photo"];

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { trimmed: usize },
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct HistoryList {
    entries: Vec<ClipEntry>,
    max_size: usize,
}

impl Default for HistoryList {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_SIZE)
    }
}

impl HistoryList {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// 从持久化数据恢复：重新执行去重与裁剪，保持原有顺序
    pub fn from_entries(entries: Vec<ClipEntry>, max_size: usize) -> Self {
        let mut list = Self::new(max_size);
        for entry in entries {
            if list.contains_content(&entry.content) {
                log::debug!("恢复历史时跳过重复条目: {}", entry.id);
                continue;
            }
            list.entries.push(entry);
        }
        list.trim();
        list
    }

    pub fn entries(&self) -> &[ClipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 调整上限，返回被裁剪掉的条目数
    pub fn set_max_size(&mut self, max_size: usize) -> usize {
        self.max_size = max_size.max(1);
        self.trim()
    }

    pub fn contains_content(&self, content: &ClipContent) -> bool {
        self.entries.iter().any(|e| e.content.same_as(content))
    }

    /// 插入到头部；内容已存在时不插入
    pub fn insert(&mut self, entry: ClipEntry) -> InsertOutcome {
        if self.contains_content(&entry.content) {
            return InsertOutcome::Duplicate;
        }
        self.entries.insert(0, entry);
        let trimmed = self.trim();
        InsertOutcome::Inserted { trimmed }
    }

    fn trim(&mut self) -> usize {
        if self.entries.len() <= self.max_size {
            return 0;
        }
        let removed = self.entries.len() - self.max_size;
        self.entries.truncate(self.max_size);
        removed
    }

    pub fn get(&self, id: &ClipId) -> Option<&ClipEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&ClipEntry> {
        self.entries.get(index)
    }

    /// 快速粘贴序号（1 起）映射到第 N 新的条目
    pub fn nth_recent(&self, n: usize) -> Option<&ClipEntry> {
        n.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// 按序号删除；越界时静默忽略
    pub fn remove_at(&mut self, index: usize) -> Option<ClipEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// 按 id 删除；不存在时静默忽略
    pub fn remove(&mut self, id: &ClipId) -> Option<ClipEntry> {
        let index = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 大小写不敏感的子串检索；空关键字返回全部
    pub fn search(&self, term: &str) -> Vec<ClipEntry> {
        let term = term.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| term.is_empty() || content_matches(&e.content, &term))
            .cloned()
            .collect()
    }
}

/// `term` 需已转为小写
pub(crate) fn content_matches(content: &ClipContent, term: &str) -> bool {
    match content.kind() {
        ClipKind::Text => content.raw().to_lowercase().contains(term),
        ClipKind::Image => IMAGE_KEYWORDS.iter().any(|k| k.contains(term)),
    }
}
