//! 粘贴引擎
//!
//! # 流程
//!
//! `paste_and_restore`：
//! 1. 快照当前剪贴板的文本与图片
//! 2. 把目标内容写入剪贴板
//! 3. 模拟粘贴按键；失败时记录日志，内容留在剪贴板上供用户手动粘贴，
//!    此时不再恢复
//! 4. 延迟后恢复快照（两者都有时优先文本）
//!
//! 整个序列持有捕获暂停守卫，监控器不会把临时写入的内容记进历史。
//! 延迟使用 `tokio::time::sleep`，等待期间进程仍可响应其它事件；同一序列
//! 的重复触发由 [`BusyFlag`] 直接丢弃。剪贴板与按键端口都是同步调用，
//! 统一放到 `spawn_blocking` 中执行。
//!
//! 合并标签替换流程见 `replace` 子模块。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::AppError;
use crate::guard::{BusyFlag, CaptureSuspension};
use crate::image_codec::{self, RawImage};
use crate::model::ClipContent;
use crate::ports::{ClipboardPort, InputPort};

/// 剪贴板稳定等待与恢复延迟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteTimings {
    /// 模拟复制后等待系统剪贴板更新
    pub settle: Duration,
    /// 模拟粘贴后等待目标程序读取剪贴板
    pub restore: Duration,
}

impl Default for PasteTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(100),
            restore: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PasteOutcome {
    /// 已粘贴并恢复原剪贴板
    Pasted,
    /// 按键模拟失败，内容留在剪贴板上
    ClipboardOnly,
    /// 上一次粘贴尚未完成，本次被丢弃
    Busy,
    /// 序号或 id 没有对应条目
    NothingToPaste,
}

/// 剪贴板快照；读取失败按“没有内容”处理
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ClipboardSnapshot {
    pub(crate) text: Option<String>,
    pub(crate) image: Option<RawImage>,
}

/// 同步的剪贴板与按键端口；arboard / enigo 的调用都可能阻塞，
/// 异步序列经由 [`PasteEngine::blocking`] 在阻塞线程池上使用它们
pub(crate) struct Ports {
    pub(crate) clipboard: Arc<dyn ClipboardPort>,
    pub(crate) input: Arc<dyn InputPort>,
}

impl Ports {
    pub(crate) fn snapshot(&self) -> ClipboardSnapshot {
        let text = match self.clipboard.read_text() {
            Ok(text) => text.filter(|t| !t.is_empty()),
            Err(e) => {
                log::warn!("快照剪贴板文本失败: {}", e);
                None
            }
        };
        let image = match self.clipboard.read_image() {
            Ok(image) => image.filter(|img| !img.is_empty()),
            Err(e) => {
                log::warn!("快照剪贴板图片失败: {}", e);
                None
            }
        };
        ClipboardSnapshot { text, image }
    }

    /// 尽力恢复，失败只记录日志
    pub(crate) fn restore(&self, snapshot: &ClipboardSnapshot) {
        let result = if let Some(text) = snapshot.text.as_deref() {
            self.clipboard.write_text(text)
        } else if let Some(image) = snapshot.image.as_ref() {
            self.clipboard.write_image(image)
        } else {
            log::debug!("原剪贴板为空，无需恢复");
            return;
        };
        match result {
            Ok(()) => log::debug!("已恢复原剪贴板内容"),
            Err(e) => log::warn!("恢复原剪贴板失败: {}", e),
        }
    }

    /// 按类型写入剪贴板：文本直接写，图片先从存储编码解码
    pub(crate) fn write_content(&self, content: &ClipContent) -> Result<(), AppError> {
        match content {
            ClipContent::Text { content } => self.clipboard.write_text(content),
            ClipContent::Image { content, .. } => {
                let raw = image_codec::decode_data_url(content)?;
                self.clipboard.write_image(&raw)
            }
        }
    }
}

pub struct PasteEngine {
    ports: Arc<Ports>,
    pub(crate) suspension: CaptureSuspension,
    pub(crate) timings: PasteTimings,
    paste_busy: BusyFlag,
    pub(crate) replace_busy: BusyFlag,
}

impl PasteEngine {
    pub fn new(
        clipboard: Arc<dyn ClipboardPort>,
        input: Arc<dyn InputPort>,
        suspension: CaptureSuspension,
        timings: PasteTimings,
    ) -> Self {
        Self {
            ports: Arc::new(Ports { clipboard, input }),
            suspension,
            timings,
            paste_busy: BusyFlag::new(),
            replace_busy: BusyFlag::new(),
        }
    }

    pub fn timings(&self) -> PasteTimings {
        self.timings
    }

    /// 在阻塞线程池上执行一段端口调用，异步序列不占用运行时工作线程
    pub(crate) async fn blocking<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Ports) -> T + Send + 'static,
        T: Send + 'static,
    {
        let ports = Arc::clone(&self.ports);
        Ok(tokio::task::spawn_blocking(move || f(&ports)).await?)
    }

    /// 同步写入剪贴板，供已在阻塞上下文中的调用方使用
    pub fn write_content(&self, content: &ClipContent) -> Result<(), AppError> {
        self.ports.write_content(content)
    }

    pub fn is_pasting(&self) -> bool {
        self.paste_busy.is_busy()
    }

    pub async fn paste_and_restore(&self, content: &ClipContent) -> Result<PasteOutcome, AppError> {
        let Some(_busy) = self.paste_busy.try_acquire() else {
            log::info!("上一次粘贴尚未完成，忽略本次触发");
            return Ok(PasteOutcome::Busy);
        };
        let _suspend = self.suspension.suspend();

        let target = content.clone();
        let (original, pressed) = self
            .blocking(move |ports| -> Result<_, AppError> {
                let original = ports.snapshot();
                ports.write_content(&target)?;
                Ok((original, ports.input.press_paste_keystroke()))
            })
            .await??;

        if let Err(e) = pressed {
            log::warn!("模拟粘贴失败，内容已留在剪贴板供手动粘贴: {}", e);
            return Ok(PasteOutcome::ClipboardOnly);
        }

        tokio::time::sleep(self.timings.restore).await;
        self.blocking(move |ports| ports.restore(&original)).await?;
        log::info!("已粘贴 {} 内容并恢复剪贴板", content.kind());
        Ok(PasteOutcome::Pasted)
    }
}
