//! 核心门面
//!
//! # 设计思路
//!
//! 历史、固定条目（含合并标签注册表）、设置、监控指纹、粘贴菜单状态放在
//! 同一把 `Mutex<CoreState>` 之后，所有变更都走这里的方法，变更后在锁内
//! 立即写回存储，保证写入顺序与内存一致。
//!
//! - 锁从不跨 `.await` 持有；粘贴与替换序列只在开始时短暂取出所需内容
//! - 存储失败只记录日志，内存状态在本次会话内仍然有效
//! - 端口失败由粘贴引擎 / 监控器在边界处理，不会留下跨存储的不一致状态

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::AppError;
use crate::events::{CoreEvent, EventBus};
use crate::guard::CaptureSuspension;
use crate::history::HistoryList;
use crate::hotkeys::HotkeyAction;
use crate::image_codec;
use crate::menu::{HideReason, MenuState, PasteMenu};
use crate::merge_tags::MergeTagRegistry;
use crate::model::{ClipContent, ClipEntry, ClipId, PinnedEntry};
use crate::paste::{PasteEngine, PasteOutcome, PasteTimings};
use crate::pinned::{PinBoard, PinRequest, PinnedUpdate};
use crate::ports::{ClipboardPort, InputPort};
use crate::replace::ReplaceOutcome;
use crate::settings::Settings;
use crate::store::{KeyValueStore, HISTORY_KEY, MERGE_TAGS_KEY, PINNED_KEY, SETTINGS_KEY};
use crate::watcher::{self, CaptureTracker, ClipboardSample, PollOutcome};

/// 固定条目相关操作的返回值：固定列表与注册表的一致快照
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedSnapshot {
    pub pinned: Vec<PinnedEntry>,
    pub merge_tags: MergeTagRegistry,
}

/// 从历史或当前剪贴板固定时附带的元数据
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub merge_tag_slug: Option<String>,
}

impl PinMeta {
    fn into_request(self, content: ClipContent) -> PinRequest {
        PinRequest {
            content,
            title: self.title,
            description: self.description,
            merge_tag_slug: self.merge_tag_slug,
        }
    }
}

struct CoreState {
    history: HistoryList,
    board: PinBoard,
    settings: Settings,
    tracker: CaptureTracker,
    menu: PasteMenu,
}

pub struct ClipboardCore {
    state: Mutex<CoreState>,
    store: Arc<dyn KeyValueStore>,
    clipboard: Arc<dyn ClipboardPort>,
    paste: PasteEngine,
    suspension: CaptureSuspension,
    events: EventBus,
}

fn load_value(store: &dyn KeyValueStore, key: &str) -> Option<serde_json::Value> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("读取 {} 失败，使用空数据: {}", key, e);
            None
        }
    }
}

impl ClipboardCore {
    /// 从存储恢复状态；读取失败的部分以空数据开始
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        clipboard: Arc<dyn ClipboardPort>,
        input: Arc<dyn InputPort>,
        timings: PasteTimings,
    ) -> Self {
        let settings = Settings::from_stored(load_value(store.as_ref(), SETTINGS_KEY));
        let history = HistoryList::from_entries(
            codec::decode_history(load_value(store.as_ref(), HISTORY_KEY).unwrap_or_default()),
            settings.max_history_size,
        );
        let board = PinBoard::from_parts(
            codec::decode_pinned(load_value(store.as_ref(), PINNED_KEY).unwrap_or_default()),
            codec::decode_merge_tags(load_value(store.as_ref(), MERGE_TAGS_KEY).unwrap_or_default()),
        );
        log::info!(
            "已加载 {} 条历史、{} 个固定条目、{} 个合并标签",
            history.len(),
            board.len(),
            board.tags().len()
        );

        let suspension = CaptureSuspension::new();
        let paste = PasteEngine::new(Arc::clone(&clipboard), input, suspension.clone(), timings);
        Self {
            state: Mutex::new(CoreState {
                history,
                board,
                settings,
                tracker: CaptureTracker::new(),
                menu: PasteMenu::new(),
            }),
            store,
            clipboard,
            paste,
            suspension,
            events: EventBus::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            log::error!("核心状态锁已中毒，继续使用现有状态");
            poisoned.into_inner()
        })
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CoreEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn suspension(&self) -> &CaptureSuspension {
        &self.suspension
    }

    // ------------------------------------------------------------------
    // 持久化
    // ------------------------------------------------------------------

    fn save(&self, key: &str, value: Result<serde_json::Value, AppError>) {
        let result = value.and_then(|value| self.store.set(key, &value));
        if let Err(e) = result {
            log::error!("持久化 {} 失败，本次会话内存数据仍然有效: {}", key, e);
        }
    }

    fn persist_history(&self, state: &CoreState) {
        self.save(HISTORY_KEY, codec::encode_history(state.history.entries()));
    }

    fn persist_pinned(&self, state: &CoreState) {
        self.save(PINNED_KEY, codec::encode_pinned(state.board.items()));
        self.save(MERGE_TAGS_KEY, codec::encode_merge_tags(state.board.tags()));
    }

    fn persist_settings(&self, state: &CoreState) {
        self.save(
            SETTINGS_KEY,
            serde_json::to_value(&state.settings).map_err(AppError::from),
        );
    }

    fn pinned_snapshot(state: &CoreState) -> PinnedSnapshot {
        PinnedSnapshot {
            pinned: state.board.items().to_vec(),
            merge_tags: state.board.tags().clone(),
        }
    }

    // ------------------------------------------------------------------
    // 查询
    // ------------------------------------------------------------------

    pub fn history(&self) -> Vec<ClipEntry> {
        self.lock().history.entries().to_vec()
    }

    pub fn pinned(&self) -> Vec<PinnedEntry> {
        self.lock().board.items().to_vec()
    }

    pub fn merge_tags(&self) -> MergeTagRegistry {
        self.lock().board.tags().clone()
    }

    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    pub fn search_history(&self, term: &str) -> Vec<ClipEntry> {
        self.lock().history.search(term)
    }

    pub fn search_pinned(&self, term: &str) -> Vec<PinnedEntry> {
        self.lock().board.search(term)
    }

    // ------------------------------------------------------------------
    // 监控
    // ------------------------------------------------------------------

    /// 单次轮询：读剪贴板与图片编码在锁外进行，判定与写入在锁内完成
    ///
    /// 读取期间若有粘贴 / 替换序列开始，读到的可能是序列写入的临时内容，
    /// 本次结果按 `Suspended` 丢弃。
    pub fn poll_once(&self) -> PollOutcome {
        if self.suspension.is_suspended() {
            log::trace!("粘贴序列进行中，跳过本次轮询");
            return PollOutcome::Suspended;
        }
        let epoch = self.suspension.epoch();

        let sample = match watcher::read_clipboard_sample(self.clipboard.as_ref()) {
            Ok(Some(sample)) => sample,
            Ok(None) => return PollOutcome::Idle,
            Err(e) => {
                log::warn!("读取剪贴板失败，跳过本次轮询: {}", e);
                return PollOutcome::Failed;
            }
        };

        let (content, digest) = match sample {
            ClipboardSample::Text(text) => (ClipContent::text(text), None),
            ClipboardSample::Image(image) => {
                let digest = image.digest();
                if self.lock().tracker.image_unchanged(&digest) {
                    return PollOutcome::Unchanged;
                }
                match image_codec::to_clip_content(&image) {
                    Ok(content) => (content, Some(digest)),
                    Err(e) => {
                        log::warn!("剪贴板图片编码失败，跳过本次轮询: {}", e);
                        return PollOutcome::Failed;
                    }
                }
            }
        };

        let mut state = self.lock();
        if self.suspension.interrupted_since(epoch) {
            log::debug!("读取剪贴板期间粘贴序列已开始，丢弃本次读取");
            return PollOutcome::Suspended;
        }
        let state = &mut *state;
        let outcome = match digest {
            Some(digest) => state.tracker.observe_image(content, digest, &mut state.history),
            None => state.tracker.observe(content, &mut state.history),
        };
        if let PollOutcome::Captured { trimmed } = outcome {
            log::info!(
                "新增历史条目，当前 {} 条{}",
                state.history.len(),
                if trimmed > 0 { "（已裁剪最旧条目）" } else { "" }
            );
            self.persist_history(state);
            self.events.emit(CoreEvent::HistoryChanged);
        }
        outcome
    }

    // ------------------------------------------------------------------
    // 历史
    // ------------------------------------------------------------------

    /// 按 id 删除；不存在时静默忽略
    pub fn remove_history_item(&self, id: &ClipId) -> Vec<ClipEntry> {
        let mut state = self.lock();
        if state.history.remove(id).is_some() {
            self.persist_history(&state);
            self.events.emit(CoreEvent::HistoryChanged);
        }
        state.history.entries().to_vec()
    }

    /// 按序号删除；越界时静默忽略
    pub fn remove_history_at(&self, index: usize) -> Vec<ClipEntry> {
        let mut state = self.lock();
        if state.history.remove_at(index).is_some() {
            self.persist_history(&state);
            self.events.emit(CoreEvent::HistoryChanged);
        }
        state.history.entries().to_vec()
    }

    /// 只清空历史，固定条目与合并标签不受影响
    pub fn clear_history(&self) {
        let mut state = self.lock();
        state.history.clear();
        self.persist_history(&state);
        self.events.emit(CoreEvent::HistoryChanged);
        log::info!("历史记录已清空");
    }

    fn history_content(&self, id: &ClipId) -> Option<ClipContent> {
        self.lock().history.get(id).map(|e| e.content.clone())
    }

    fn pinned_content(&self, id: &ClipId) -> Option<ClipContent> {
        self.lock().board.get(id).map(|p| p.content.clone())
    }

    pub fn copy_item(&self, id: &ClipId) -> Result<(), AppError> {
        let content = self
            .history_content(id)
            .ok_or_else(|| AppError::NotFound(format!("历史条目 {}", id)))?;
        self.paste.write_content(&content)
    }

    pub fn copy_pinned_item(&self, id: &ClipId) -> Result<(), AppError> {
        let content = self
            .pinned_content(id)
            .ok_or_else(|| AppError::NotFound(format!("固定条目 {}", id)))?;
        self.paste.write_content(&content)
    }

    // ------------------------------------------------------------------
    // 固定条目
    // ------------------------------------------------------------------

    fn pin_with(&self, request: PinRequest) -> Result<PinnedSnapshot, AppError> {
        let mut state = self.lock();
        let id = state.board.pin(request)?.id.clone();
        log::info!("已固定条目 {}", id);
        self.persist_pinned(&state);
        self.events.emit(CoreEvent::PinnedChanged);
        Ok(Self::pinned_snapshot(&state))
    }

    pub fn pin_item(&self, request: PinRequest) -> Result<PinnedSnapshot, AppError> {
        self.pin_with(request)
    }

    /// 把历史条目复制为固定条目，历史本身不变
    pub fn pin_history_item(&self, id: &ClipId, meta: PinMeta) -> Result<PinnedSnapshot, AppError> {
        let content = self
            .history_content(id)
            .ok_or_else(|| AppError::NotFound(format!("历史条目 {}", id)))?;
        self.pin_with(meta.into_request(content))
    }

    pub fn pin_current_clipboard(&self, meta: PinMeta) -> Result<PinnedSnapshot, AppError> {
        let content = watcher::read_clipboard_content(self.clipboard.as_ref())?
            .ok_or_else(|| AppError::Validation("剪贴板为空，无法固定".to_string()))?;
        self.pin_with(meta.into_request(content))
    }

    /// 快捷键路径：读剪贴板与写存储放到阻塞线程池
    async fn pin_clipboard_off_thread(self: &Arc<Self>) -> Result<PinnedSnapshot, AppError> {
        let core = Arc::clone(self);
        tokio::task::spawn_blocking(move || core.pin_current_clipboard(PinMeta::default())).await?
    }

    pub fn update_pinned_item(&self, id: &ClipId, update: PinnedUpdate) -> Result<PinnedSnapshot, AppError> {
        let mut state = self.lock();
        state.board.update(id, update)?;
        log::info!("已更新固定条目 {}", id);
        self.persist_pinned(&state);
        self.events.emit(CoreEvent::PinnedChanged);
        Ok(Self::pinned_snapshot(&state))
    }

    /// 取消固定；id 不存在时静默返回当前状态
    pub fn unpin_item(&self, id: &ClipId) -> PinnedSnapshot {
        let mut state = self.lock();
        if state.board.unpin(id).is_some() {
            log::info!("已取消固定 {}", id);
            self.persist_pinned(&state);
            self.events.emit(CoreEvent::PinnedChanged);
        }
        Self::pinned_snapshot(&state)
    }

    // ------------------------------------------------------------------
    // 粘贴
    // ------------------------------------------------------------------

    async fn paste_content(&self, content: Option<ClipContent>) -> Result<PasteOutcome, AppError> {
        let Some(content) = content else {
            return Ok(PasteOutcome::NothingToPaste);
        };
        self.hide_paste_menu(HideReason::ItemSelected);
        self.paste.paste_and_restore(&content).await
    }

    pub async fn paste_item(&self, id: &ClipId) -> Result<PasteOutcome, AppError> {
        let content = self.history_content(id);
        self.paste_content(content).await
    }

    pub async fn paste_pinned_item(&self, id: &ClipId) -> Result<PasteOutcome, AppError> {
        let content = self.pinned_content(id);
        self.paste_content(content).await
    }

    /// 第 N 新的历史条目（1 起）；超出长度时不做任何事
    pub async fn quick_paste(&self, n: usize) -> Result<PasteOutcome, AppError> {
        let content = self.lock().history.nth_recent(n).map(|e| e.content.clone());
        self.paste_content(content).await
    }

    pub async fn quick_paste_pinned(&self, n: usize) -> Result<PasteOutcome, AppError> {
        let content = self.lock().board.nth_recent(n).map(|p| p.content.clone());
        self.paste_content(content).await
    }

    pub async fn replace_merge_tag(&self) -> Result<ReplaceOutcome, AppError> {
        let outcome = self
            .paste
            .replace_merge_tag(|slug| self.lock().board.tags().lookup(slug).cloned())
            .await?;
        match &outcome {
            ReplaceOutcome::Replaced { slug, .. } => {
                self.events.notify(format!("Merge tag \"{}\" replaced", slug));
            }
            ReplaceOutcome::NotFound { selection } => {
                self.events
                    .notify(format!("No merge tag found for \"{}\"", selection));
            }
            ReplaceOutcome::NoSelection | ReplaceOutcome::Busy => {}
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // 粘贴菜单
    // ------------------------------------------------------------------

    /// 历史为空时保持隐藏；配置了超时则在 tokio 运行时中调度自动隐藏
    pub fn show_paste_menu(self: &Arc<Self>) -> MenuState {
        let (generation, timeout) = {
            let mut state = self.lock();
            let empty = state.history.is_empty();
            match state.menu.show(empty) {
                Some(generation) => (generation, state.settings.paste_menu_timeout()),
                None => return state.menu.state(),
            }
        };
        self.events.emit(CoreEvent::PasteMenu(MenuState::Visible));

        if let Some(timeout) = timeout {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let core = Arc::clone(self);
                    handle.spawn(async move {
                        tokio::time::sleep(timeout).await;
                        let expired = core.lock().menu.expire(generation);
                        if expired {
                            core.events.emit(CoreEvent::PasteMenu(MenuState::Hidden));
                        }
                    });
                }
                Err(_) => log::debug!("没有 tokio 运行时，粘贴菜单不会自动隐藏"),
            }
        }
        MenuState::Visible
    }

    pub fn hide_paste_menu(&self, reason: HideReason) -> MenuState {
        let changed = self.lock().menu.hide(reason);
        if changed {
            self.events.emit(CoreEvent::PasteMenu(MenuState::Hidden));
        }
        MenuState::Hidden
    }

    pub fn paste_menu_state(&self) -> MenuState {
        self.lock().menu.state()
    }

    // ------------------------------------------------------------------
    // 设置与数据
    // ------------------------------------------------------------------

    /// 保存设置；上限变小时立即裁剪历史并写回
    pub fn save_settings(&self, settings: Settings) -> Settings {
        let settings = settings.normalized();
        let mut state = self.lock();
        let trimmed = state.history.set_max_size(settings.max_history_size);
        state.settings = settings;
        self.persist_settings(&state);
        self.events.emit(CoreEvent::SettingsChanged);

        if trimmed > 0 {
            log::info!("历史上限调整，已裁剪 {} 条", trimmed);
            self.persist_history(&state);
            self.events.emit(CoreEvent::HistoryChanged);
        }
        state.settings.clone()
    }

    /// 清空存储与全部内存状态，设置恢复默认
    pub fn clear_all_data(&self) -> Result<(), AppError> {
        let mut state = self.lock();
        let cleared = self.store.clear();

        let settings = Settings::default();
        state.history.clear();
        state.history.set_max_size(settings.max_history_size);
        state.board.clear();
        state.settings = settings;
        state.menu.hide(HideReason::Closed);

        self.events.emit(CoreEvent::HistoryChanged);
        self.events.emit(CoreEvent::PinnedChanged);
        self.events.emit(CoreEvent::SettingsChanged);
        log::info!("已清除全部数据");
        cleared
    }

    // ------------------------------------------------------------------
    // 快捷键
    // ------------------------------------------------------------------

    pub async fn trigger(self: &Arc<Self>, action: HotkeyAction) -> Result<(), AppError> {
        log::debug!("快捷键触发: {}", action);
        match action {
            HotkeyAction::ShowHistory => {
                self.events.emit(CoreEvent::ShowHistory);
            }
            HotkeyAction::ShowPasteMenu => {
                self.show_paste_menu();
            }
            HotkeyAction::MergeTag => {
                self.replace_merge_tag().await?;
            }
            HotkeyAction::AddPinned => match self.pin_clipboard_off_thread().await {
                Ok(_) => self.events.notify("Added to pinned items"),
                Err(e) => {
                    self.events.notify(e.to_string());
                    return Err(e);
                }
            },
            HotkeyAction::QuickPaste(n) => {
                self.quick_paste(n as usize).await?;
            }
            HotkeyAction::PinnedPaste(n) => {
                self.quick_paste_pinned(n as usize).await?;
            }
        }
        Ok(())
    }
}
