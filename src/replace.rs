//! 合并标签替换
//!
//! 用户在任意程序里选中一段文字并按下快捷键：
//! 1. 快照原剪贴板，模拟复制拿到选区
//! 2. 等待剪贴板稳定后读取选区文本；为空则恢复并结束
//! 3. 以去掉首尾空白的选区精确查找合并标签
//! 4. 命中则写入标签值（文本或图片）并模拟粘贴，延迟后恢复原剪贴板；
//!    未命中则立即恢复
//!
//! 恢复是尽力而为：进程退出或按键模拟中途失败时原内容可能丢失。

use serde::Serialize;

use crate::error::AppError;
use crate::model::MergeTagValue;
use crate::paste::{PasteEngine, Ports};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReplaceOutcome {
    /// 已写入标签值；`pasted` 为 false 表示粘贴按键失败
    Replaced { slug: String, pasted: bool },
    NotFound { selection: String },
    NoSelection,
    Busy,
}

impl PasteEngine {
    /// `lookup` 只在查找时短暂调用，调用方不必在整个序列期间持有状态锁
    pub async fn replace_merge_tag<F>(&self, lookup: F) -> Result<ReplaceOutcome, AppError>
    where
        F: FnOnce(&str) -> Option<MergeTagValue> + Send,
    {
        let Some(_busy) = self.replace_busy.try_acquire() else {
            log::info!("合并标签替换进行中，忽略本次触发");
            return Ok(ReplaceOutcome::Busy);
        };
        let _suspend = self.suspension.suspend();

        let (original, copied) = self
            .blocking(|ports| (ports.snapshot(), press_copy(ports)))
            .await?;
        if !copied {
            self.blocking(move |ports| ports.restore(&original)).await?;
            return Ok(ReplaceOutcome::NoSelection);
        }
        tokio::time::sleep(self.timings.settle).await;
        let selection = match self.blocking(read_selection).await? {
            Some(selection) => selection,
            None => {
                self.blocking(move |ports| ports.restore(&original)).await?;
                return Ok(ReplaceOutcome::NoSelection);
            }
        };

        let slug = selection.trim().to_string();
        let Some(value) = lookup(&slug) else {
            log::info!("未找到合并标签: {}", slug);
            self.blocking(move |ports| ports.restore(&original)).await?;
            return Ok(ReplaceOutcome::NotFound { selection: slug });
        };

        let content = value.to_content();
        let written = self
            .blocking(move |ports| -> Result<bool, AppError> {
                ports.write_content(&content)?;
                Ok(match ports.input.press_paste_keystroke() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("模拟粘贴合并标签失败: {}", e);
                        false
                    }
                })
            })
            .await?;
        let pasted = match written {
            Ok(pasted) => pasted,
            Err(e) => {
                self.blocking(move |ports| ports.restore(&original)).await?;
                return Err(e);
            }
        };

        tokio::time::sleep(self.timings.restore).await;
        self.blocking(move |ports| ports.restore(&original)).await?;
        log::info!("合并标签 \"{}\" 已替换", slug);
        Ok(ReplaceOutcome::Replaced { slug, pasted })
    }
}

/// 模拟复制；失败按“没有选区”处理
fn press_copy(ports: &Ports) -> bool {
    match ports.input.press_copy_keystroke() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("模拟复制失败，无法获取选区: {}", e);
            false
        }
    }
}

fn read_selection(ports: &Ports) -> Option<String> {
    match ports.clipboard.read_text() {
        Ok(text) => text.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            log::warn!("读取选区失败: {}", e);
            None
        }
    }
}
