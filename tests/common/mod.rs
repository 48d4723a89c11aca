#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clip_ledger::guard::{CaptureSuspension, SuspendGuard};
use clip_ledger::image_codec::RawImage;
use clip_ledger::paste::PasteTimings;
use clip_ledger::ports::{ClipboardPort, InputPort};
use clip_ledger::store::{KeyValueStore, MemoryStore};
use clip_ledger::{AppError, ClipboardCore};
use serde_json::Value;

pub const FAST_TIMINGS: PasteTimings = PasteTimings {
    settle: Duration::from_millis(5),
    restore: Duration::from_millis(20),
};

pub fn unique_temp_dir() -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock error")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("clip-ledger-it-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn tiny_image(rgba: [u8; 4]) -> RawImage {
    RawImage {
        width: 2,
        height: 1,
        bytes: [rgba, rgba].concat(),
    }
}

#[derive(Default)]
struct ClipState {
    text: Option<String>,
    image: Option<RawImage>,
    fail_reads: bool,
    fail_writes: bool,
}

/// 内存剪贴板：写文本会清掉图片，反之亦然
#[derive(Default)]
pub struct FakeClipboard {
    state: Mutex<ClipState>,
}

impl FakeClipboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_text(&self, text: &str) {
        let mut state = self.state.lock().expect("clipboard lock");
        state.text = Some(text.to_string());
        state.image = None;
    }

    pub fn set_image(&self, image: RawImage) {
        let mut state = self.state.lock().expect("clipboard lock");
        state.image = Some(image);
        state.text = None;
    }

    pub fn empty(&self) {
        let mut state = self.state.lock().expect("clipboard lock");
        state.text = None;
        state.image = None;
    }

    pub fn text(&self) -> Option<String> {
        self.state.lock().expect("clipboard lock").text.clone()
    }

    pub fn image(&self) -> Option<RawImage> {
        self.state.lock().expect("clipboard lock").image.clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().expect("clipboard lock").fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().expect("clipboard lock").fail_writes = fail;
    }
}

impl ClipboardPort for FakeClipboard {
    fn read_text(&self) -> Result<Option<String>, AppError> {
        let state = self.state.lock().expect("clipboard lock");
        if state.fail_reads {
            return Err(AppError::Clipboard("read refused".into()));
        }
        Ok(state.text.clone())
    }

    fn read_image(&self) -> Result<Option<RawImage>, AppError> {
        let state = self.state.lock().expect("clipboard lock");
        if state.fail_reads {
            return Err(AppError::Clipboard("read refused".into()));
        }
        Ok(state.image.clone())
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        if self.state.lock().expect("clipboard lock").fail_writes {
            return Err(AppError::Clipboard("write refused".into()));
        }
        self.set_text(text);
        Ok(())
    }

    fn write_image(&self, image: &RawImage) -> Result<(), AppError> {
        if self.state.lock().expect("clipboard lock").fail_writes {
            return Err(AppError::Clipboard("write refused".into()));
        }
        self.set_image(image.clone());
        Ok(())
    }
}

/// 粘贴时剪贴板上的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pasted {
    Text(String),
    Image(RawImage),
    Nothing,
}

#[derive(Default)]
struct InputState {
    selection: Option<String>,
    pasted: Vec<Pasted>,
    copies: usize,
    fail_paste: bool,
}

/// 模拟按键：复制时把预设选区写进剪贴板，粘贴时记录剪贴板内容
pub struct FakeInput {
    clipboard: Arc<FakeClipboard>,
    state: Mutex<InputState>,
}

impl FakeInput {
    pub fn new(clipboard: Arc<FakeClipboard>) -> Arc<Self> {
        Arc::new(Self {
            clipboard,
            state: Mutex::new(InputState::default()),
        })
    }

    pub fn select(&self, selection: &str) {
        self.state.lock().expect("input lock").selection = Some(selection.to_string());
    }

    pub fn fail_paste(&self, fail: bool) {
        self.state.lock().expect("input lock").fail_paste = fail;
    }

    pub fn pasted(&self) -> Vec<Pasted> {
        self.state.lock().expect("input lock").pasted.clone()
    }

    pub fn copies(&self) -> usize {
        self.state.lock().expect("input lock").copies
    }
}

impl InputPort for FakeInput {
    fn press_paste_keystroke(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().expect("input lock");
        if state.fail_paste {
            return Err(AppError::Input("no input backend".into()));
        }
        let pasted = match (self.clipboard.text(), self.clipboard.image()) {
            (Some(text), _) => Pasted::Text(text),
            (None, Some(image)) => Pasted::Image(image),
            (None, None) => Pasted::Nothing,
        };
        state.pasted.push(pasted);
        Ok(())
    }

    fn press_copy_keystroke(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().expect("input lock");
        state.copies += 1;
        if let Some(selection) = state.selection.clone() {
            self.clipboard.set_text(&selection);
        }
        Ok(())
    }
}

/// 读取文本的同时开始一次捕获暂停，模拟轮询读剪贴板期间粘贴序列恰好启动
pub struct InterruptingClipboard {
    inner: Arc<FakeClipboard>,
    suspension: OnceLock<CaptureSuspension>,
    held: Mutex<Option<SuspendGuard>>,
    interrupt: Mutex<Option<Interrupt>>,
}

#[derive(Debug, Clone, Copy)]
pub enum Interrupt {
    /// 暂停在读取返回后仍然持有
    Hold,
    /// 暂停在读取返回前已经结束
    Pulse,
}

impl InterruptingClipboard {
    pub fn new(inner: Arc<FakeClipboard>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            suspension: OnceLock::new(),
            held: Mutex::new(None),
            interrupt: Mutex::new(None),
        })
    }

    pub fn attach(&self, suspension: &CaptureSuspension) {
        let _ = self.suspension.set(suspension.clone());
    }

    /// 下一次读取文本时触发一次
    pub fn arm(&self, interrupt: Interrupt) {
        *self.interrupt.lock().expect("interrupt lock") = Some(interrupt);
    }

    pub fn release(&self) {
        self.held.lock().expect("held lock").take();
    }
}

impl ClipboardPort for InterruptingClipboard {
    fn read_text(&self) -> Result<Option<String>, AppError> {
        let interrupt = self.interrupt.lock().expect("interrupt lock").take();
        if let (Some(interrupt), Some(suspension)) = (interrupt, self.suspension.get()) {
            let guard = suspension.suspend();
            match interrupt {
                Interrupt::Hold => *self.held.lock().expect("held lock") = Some(guard),
                Interrupt::Pulse => drop(guard),
            }
        }
        self.inner.read_text()
    }

    fn read_image(&self) -> Result<Option<RawImage>, AppError> {
        self.inner.read_image()
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        self.inner.write_text(text)
    }

    fn write_image(&self, image: &RawImage) -> Result<(), AppError> {
        self.inner.write_image(image)
    }
}

/// 读取文本时阻塞，直到另一个任务放行或超时；记录每次读取时是否已被放行
///
/// 在单线程运行时里，只有把读取放到阻塞线程池上，放行的任务才有机会运行。
pub struct GatedClipboard {
    inner: Arc<FakeClipboard>,
    open: AtomicBool,
    reads: Mutex<Vec<bool>>,
}

impl GatedClipboard {
    pub fn new(inner: Arc<FakeClipboard>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            open: AtomicBool::new(false),
            reads: Mutex::new(Vec::new()),
        })
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> Vec<bool> {
        self.reads.lock().expect("reads lock").clone()
    }
}

impl ClipboardPort for GatedClipboard {
    fn read_text(&self) -> Result<Option<String>, AppError> {
        let deadline = Instant::now() + Duration::from_millis(500);
        while !self.open.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        self.reads
            .lock()
            .expect("reads lock")
            .push(self.open.load(Ordering::SeqCst));
        self.inner.read_text()
    }

    fn read_image(&self) -> Result<Option<RawImage>, AppError> {
        self.inner.read_image()
    }

    fn write_text(&self, text: &str) -> Result<(), AppError> {
        self.inner.write_text(text)
    }

    fn write_image(&self, image: &RawImage) -> Result<(), AppError> {
        self.inner.write_image(image)
    }
}

/// 写入总是失败的存储，读取为空
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, AppError> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &Value) -> Result<(), AppError> {
        Err(AppError::Storage(format!("disk full while writing {key}")))
    }

    fn clear(&self) -> Result<(), AppError> {
        Err(AppError::Storage("disk full".into()))
    }
}

pub struct Harness {
    pub core: Arc<ClipboardCore>,
    pub clipboard: Arc<FakeClipboard>,
    pub input: Arc<FakeInput>,
    pub store: Arc<dyn KeyValueStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self::build(store, |clipboard| clipboard as Arc<dyn ClipboardPort>)
    }

    /// 核心看到的剪贴板端口包在内存剪贴板外面；按键替身仍直接操作内存剪贴板
    pub fn wrapping<P>(wrap: impl FnOnce(Arc<FakeClipboard>) -> Arc<P>) -> (Self, Arc<P>)
    where
        P: ClipboardPort + 'static,
    {
        let mut port = None;
        let harness = Self::build(Arc::new(MemoryStore::new()), |clipboard| {
            let wrapped = wrap(clipboard);
            port = Some(Arc::clone(&wrapped));
            wrapped as Arc<dyn ClipboardPort>
        });
        (harness, port.expect("wrapped port"))
    }

    fn build(
        store: Arc<dyn KeyValueStore>,
        port: impl FnOnce(Arc<FakeClipboard>) -> Arc<dyn ClipboardPort>,
    ) -> Self {
        let clipboard = FakeClipboard::new();
        let input = FakeInput::new(Arc::clone(&clipboard));
        let core = Arc::new(ClipboardCore::load(
            Arc::clone(&store),
            port(Arc::clone(&clipboard)),
            input.clone(),
            FAST_TIMINGS,
        ));
        Self { core, clipboard, input, store }
    }

    /// 依次“复制”并轮询，最后一个成为最新条目
    pub fn capture_texts(&self, texts: &[&str]) {
        for text in texts {
            self.clipboard.set_text(text);
            self.core.poll_once();
        }
    }

    pub fn history_texts(&self) -> Vec<String> {
        self.core
            .history()
            .iter()
            .filter_map(|e| e.content.as_text().map(str::to_string))
            .collect()
    }
}
