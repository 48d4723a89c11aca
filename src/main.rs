//! # clip-ledger 进程入口
//!
//! 初始化日志、存储与系统端口，启动剪贴板监控，然后在 stdin/stdout 上
//! 提供 JSON-lines 命令协议，直到 EOF 或 Ctrl-C：
//!
//! ```text
//! → {"id": 1, "command": "get-clipboard-history", "args": {}}
//! ← {"id": 1, "ok": true, "result": [...]}
//! ← {"event": "history-changed"}
//! ```

use std::sync::Arc;

use clip_ledger::commands;
use clip_ledger::paste::PasteTimings;
use clip_ledger::platform::{ArboardClipboard, EnigoInput};
use clip_ledger::store::{self, KeyValueStore, SqliteStore};
use clip_ledger::watcher;
use clip_ledger::{AppError, ClipboardCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc};

#[derive(Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    command: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize)]
struct Response {
    id: Value,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<AppError>,
}

impl Response {
    fn from_result(id: Value, result: Result<Value, AppError>) -> Self {
        match result {
            Ok(value) => Self { id, ok: true, result: Some(value), error: None },
            Err(e) => Self { id, ok: false, result: None, error: Some(e) },
        }
    }
}

fn encode_line<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            log::error!("序列化输出失败: {}", e);
            None
        }
    }
}

fn open_core() -> Result<Arc<ClipboardCore>, AppError> {
    let data_dir = store::default_data_dir()?;
    let db_path = store::resolve_db_path(&data_dir)?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&db_path)?);

    Ok(Arc::new(ClipboardCore::load(
        store,
        Arc::new(ArboardClipboard::new()),
        Arc::new(EnigoInput::new()),
        PasteTimings::default(),
    )))
}

async fn handle_line(core: Arc<ClipboardCore>, line: String, out: mpsc::UnboundedSender<String>) {
    let response = match serde_json::from_str::<Request>(&line) {
        Ok(request) => {
            let result = commands::dispatch(&core, &request.command, request.args).await;
            if let Err(e) = &result {
                log::warn!("命令 {} 失败: {}", request.command, e);
            }
            Response::from_result(request.id, result)
        }
        Err(e) => Response::from_result(
            Value::Null,
            Err(AppError::Command(format!("请求格式无效: {}", e))),
        ),
    };
    if let Some(line) = encode_line(&response) {
        let _ = out.send(line);
    }
}

async fn run() -> Result<(), AppError> {
    let core = open_core()?;
    let watcher = watcher::spawn(Arc::clone(&core));

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut events = core.subscribe();
    let event_out = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = encode_line(&event) {
                        let _ = event_out.send(line);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("事件输出落后，丢弃 {} 条", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    log::info!("clip-ledger 已就绪，等待命令");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    tokio::spawn(handle_line(Arc::clone(&core), line, out_tx.clone()));
                }
                Ok(None) => {
                    log::info!("输入已结束");
                    break;
                }
                Err(e) => {
                    log::error!("读取输入失败: {}", e);
                    break;
                }
            },
            _ = &mut ctrl_c => {
                log::info!("收到 Ctrl-C");
                break;
            }
        }
    }

    watcher.stop().await;
    forwarder.abort();
    drop(out_tx);
    let _ = writer.await;
    log::info!("clip-ledger 已退出");
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("启动失败: {}", e);
        std::process::exit(1);
    }
}
