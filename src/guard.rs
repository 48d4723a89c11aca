//! RAII 守卫
//!
//! - [`CaptureSuspension`]：粘贴 / 替换序列占用剪贴板期间，监控器跳过轮询，
//!   避免把临时写入的内容或为查找合并标签而复制的选区记进历史。
//!   计数实现，允许多个序列叠加持有。另有单调递增的纪元号，轮询读剪贴板
//!   前后比较纪元号，就能发现读取期间开始过（哪怕已经结束）的序列。
//! - [`BusyFlag`]：单个操作的重入保护。第二次触发在第一次完成（含延迟恢复）
//!   之前直接被丢弃。

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CaptureSuspension {
    depth: Arc<AtomicUsize>,
    epoch: Arc<AtomicU64>,
}

impl CaptureSuspension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suspend(&self) -> SuspendGuard {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.depth.fetch_add(1, Ordering::SeqCst);
        log::debug!("剪贴板捕获已暂停");
        SuspendGuard { depth: Arc::clone(&self.depth) }
    }

    pub fn is_suspended(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    /// 到目前为止开始过的暂停次数
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// 当前处于暂停中，或自 `epoch` 之后开始过新的暂停
    pub fn interrupted_since(&self, epoch: u64) -> bool {
        self.is_suspended() || self.epoch() != epoch
    }
}

/// 离开作用域时恢复捕获（包括 panic 展开路径）
#[must_use = "捕获只在守卫存活期间暂停"]
pub struct SuspendGuard {
    depth: Arc<AtomicUsize>,
}

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
        log::debug!("剪贴板捕获已恢复");
    }
}

#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: AtomicBool,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已被占用时返回 `None`
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

#[must_use = "占用只在守卫存活期间有效"]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
