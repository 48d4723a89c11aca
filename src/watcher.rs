//! 剪贴板监控
//!
//! # 设计思路
//!
//! 轮询而非系统通知：每个 tick 读一次剪贴板，先文本后图片。
//! 为避免把“读剪贴板做比较”当成新的复制事件，记录上一次成功捕获的指纹：
//!
//! | 情况 | 处理 |
//! |------|------|
//! | 与上次捕获指纹相同 | 跳过 |
//! | 历史中已有相同内容 | 跳过插入，但更新指纹 |
//! | 新内容 | 插入历史头部并裁剪，更新指纹 |
//!
//! 图片先比较原始像素摘要，与上次捕获相同就直接跳过，PNG 编码只在图片
//! 变化时进行。读取前后比较捕获暂停的纪元号，读取期间开始过粘贴序列则
//! 丢弃本次读到的内容。
//!
//! # 调度
//!
//! [`spawn`] 启动单个 tokio 任务，`interval` + `MissedTickBehavior::Skip`，
//! 每次轮询在 `spawn_blocking` 中执行并等待完成后才进入下一个 tick，
//! 因此轮询之间不会重叠。读剪贴板失败只记录日志，下一个 tick 照常进行。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::ClipboardCore;
use crate::error::AppError;
use crate::history::{HistoryList, InsertOutcome};
use crate::image_codec::{self, ImageDigest, RawImage};
use crate::model::{ClipContent, ClipEntry, Fingerprint};
use crate::ports::ClipboardPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PollOutcome {
    /// 剪贴板为空或只有空白文本
    Idle,
    /// 粘贴序列占用剪贴板中
    Suspended,
    /// 与上次捕获相同
    Unchanged,
    /// 历史中已存在
    Duplicate,
    Captured { trimmed: usize },
    /// 读剪贴板失败
    Failed,
}

/// 一次读取得到的原始内容，图片尚未编码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardSample {
    Text(String),
    Image(RawImage),
}

impl ClipboardSample {
    pub fn into_content(self) -> Result<ClipContent, AppError> {
        match self {
            ClipboardSample::Text(text) => Ok(ClipContent::text(text)),
            ClipboardSample::Image(image) => image_codec::to_clip_content(&image),
        }
    }
}

/// 读取当前剪贴板：非空白文本优先，其次非空图片
pub fn read_clipboard_sample(port: &dyn ClipboardPort) -> Result<Option<ClipboardSample>, AppError> {
    if let Some(text) = port.read_text()? {
        if !text.trim().is_empty() {
            return Ok(Some(ClipboardSample::Text(text)));
        }
    }
    match port.read_image()? {
        Some(image) if !image.is_empty() => Ok(Some(ClipboardSample::Image(image))),
        _ => Ok(None),
    }
}

/// 读取当前剪贴板并转换为存储编码
pub fn read_clipboard_content(port: &dyn ClipboardPort) -> Result<Option<ClipContent>, AppError> {
    read_clipboard_sample(port)?
        .map(ClipboardSample::into_content)
        .transpose()
}

/// 捕获判定，只保存“上一次成功捕获”的指纹
///
/// 上次捕获的是图片时，同时记下原始像素摘要，图片没变就不必重新编码。
#[derive(Debug, Default)]
pub struct CaptureTracker {
    last_capture: Option<Fingerprint>,
    last_image: Option<ImageDigest>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 剪贴板上的图片与上次捕获的是同一张
    pub fn image_unchanged(&self, digest: &ImageDigest) -> bool {
        self.last_image.as_ref() == Some(digest)
    }

    pub fn observe(&mut self, content: ClipContent, history: &mut HistoryList) -> PollOutcome {
        self.record(content, None, history)
    }

    /// 图片内容连同其原始像素摘要一起判定
    pub fn observe_image(
        &mut self,
        content: ClipContent,
        digest: ImageDigest,
        history: &mut HistoryList,
    ) -> PollOutcome {
        self.record(content, Some(digest), history)
    }

    fn record(
        &mut self,
        content: ClipContent,
        digest: Option<ImageDigest>,
        history: &mut HistoryList,
    ) -> PollOutcome {
        self.last_image = digest;
        if self
            .last_capture
            .as_ref()
            .is_some_and(|marker| marker.matches(&content))
        {
            return PollOutcome::Unchanged;
        }

        self.last_capture = Some(content.fingerprint());
        if history.contains_content(&content) {
            log::debug!("剪贴板内容已在历史中，跳过插入");
            return PollOutcome::Duplicate;
        }

        match history.insert(ClipEntry::new(content)) {
            InsertOutcome::Inserted { trimmed } => PollOutcome::Captured { trimmed },
            InsertOutcome::Duplicate => PollOutcome::Duplicate,
        }
    }

    pub fn reset(&mut self) {
        self.last_capture = None;
        self.last_image = None;
    }
}

pub struct WatcherHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// 通知监控任务退出并等待其结束
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            log::warn!("剪贴板监控任务异常退出: {}", e);
        }
    }
}

pub fn spawn(core: Arc<ClipboardCore>) -> WatcherHandle {
    let (stop, mut stopped) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut period = core.settings().poll_interval();
        let mut ticker = new_ticker(period);
        log::info!("剪贴板监控已启动，轮询间隔 {:?}", period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped.changed() => break,
            }

            let polling = Arc::clone(&core);
            match tokio::task::spawn_blocking(move || polling.poll_once()).await {
                Ok(PollOutcome::Captured { .. }) => log::debug!("捕获到新的剪贴板内容"),
                Ok(_) => {}
                Err(e) => log::error!("剪贴板轮询任务失败: {}", e),
            }

            let configured = core.settings().poll_interval();
            if configured != period {
                log::info!("轮询间隔调整为 {:?}", configured);
                period = configured;
                ticker = new_ticker(period);
            }
        }
        log::info!("剪贴板监控已停止");
    });
    WatcherHandle { stop, task }
}

fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_content_is_unchanged_after_capture() {
        let mut tracker = CaptureTracker::new();
        let mut history = HistoryList::new(10);

        assert_eq!(
            tracker.observe(ClipContent::text("a"), &mut history),
            PollOutcome::Captured { trimmed: 0 }
        );
        assert_eq!(tracker.observe(ClipContent::text("a"), &mut history), PollOutcome::Unchanged);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn content_already_in_history_updates_marker_only() {
        let mut tracker = CaptureTracker::new();
        let mut history = HistoryList::new(10);
        tracker.observe(ClipContent::text("a"), &mut history);
        tracker.observe(ClipContent::text("b"), &mut history);

        assert_eq!(tracker.observe(ClipContent::text("a"), &mut history), PollOutcome::Duplicate);
        assert_eq!(tracker.observe(ClipContent::text("a"), &mut history), PollOutcome::Unchanged);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].content.as_text(), Some("b"));
    }

    #[test]
    fn cleared_history_does_not_recapture_marker() {
        let mut tracker = CaptureTracker::new();
        let mut history = HistoryList::new(10);
        tracker.observe(ClipContent::text("a"), &mut history);
        history.clear();

        assert_eq!(tracker.observe(ClipContent::text("a"), &mut history), PollOutcome::Unchanged);
        assert!(history.is_empty());

        tracker.reset();
        assert_eq!(
            tracker.observe(ClipContent::text("a"), &mut history),
            PollOutcome::Captured { trimmed: 0 }
        );
    }

    #[test]
    fn image_digest_follows_last_capture() {
        let mut tracker = CaptureTracker::new();
        let mut history = HistoryList::new(10);
        let image = RawImage { width: 1, height: 1, bytes: vec![1, 2, 3, 255] };
        let digest = image.digest();
        assert!(!tracker.image_unchanged(&digest));

        let content = image_codec::to_clip_content(&image).expect("encode");
        assert_eq!(
            tracker.observe_image(content.clone(), digest, &mut history),
            PollOutcome::Captured { trimmed: 0 }
        );
        assert!(tracker.image_unchanged(&digest));

        tracker.observe(ClipContent::text("text in between"), &mut history);
        assert!(!tracker.image_unchanged(&digest));

        assert_eq!(
            tracker.observe_image(content, digest, &mut history),
            PollOutcome::Duplicate
        );
        assert!(tracker.image_unchanged(&digest));

        tracker.reset();
        assert!(!tracker.image_unchanged(&digest));
    }

    #[test]
    fn capture_reports_trimmed_tail() {
        let mut tracker = CaptureTracker::new();
        let mut history = HistoryList::new(2);
        tracker.observe(ClipContent::text("1"), &mut history);
        tracker.observe(ClipContent::text("2"), &mut history);
        assert_eq!(
            tracker.observe(ClipContent::text("3"), &mut history),
            PollOutcome::Captured { trimmed: 1 }
        );
    }
}
