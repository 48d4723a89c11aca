//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，核心操作、存储层、平台端口与命令分发
//! 共用同一套错误语义，不再各自拼接字符串。
//!
//! 错误分四类：
//! - **校验错误**（`Validation`）：合并标签格式非法、标签冲突、内容为空，操作整体放弃；
//! - **未找到**（`NotFound`）：引用了不存在的 id / 序号；
//! - **端口错误**（`Clipboard` / `Input`）：剪贴板或按键模拟失败，调用方负责降级；
//! - **存储错误**（`Storage`）：持久化失败，内存状态在本次会话内仍然有效。
//!
//! 另有 `Task`：放到阻塞线程池上的端口 / 存储调用异常结束。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 实现 `Serialize` 将错误序列化为字符串，命令分发层直接透传给调用方。

use serde::Serialize;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 输入校验失败（合并标签格式 / 冲突 / 空内容）
    #[error("校验失败: {0}")]
    Validation(String),

    /// 目标条目不存在
    #[error("未找到: {0}")]
    NotFound(String),

    /// 剪贴板读写操作失败
    #[error("剪贴板操作失败: {0}")]
    Clipboard(String),

    /// 输入模拟失败
    #[error("输入模拟失败: {0}")]
    Input(String),

    /// 持久化存储失败
    #[error("存储失败: {0}")]
    Storage(String),

    /// 图片编码 / 解码失败
    #[error("图片处理失败: {0}")]
    Image(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 命令名或参数无法识别
    #[error("命令错误: {0}")]
    Command(String),

    /// 阻塞线程池上的任务 panic 或被取消
    #[error("后台任务失败: {0}")]
    Task(String),
}

impl AppError {
    /// 是否属于外部端口（剪贴板 / 输入模拟）故障
    pub fn is_port_error(&self) -> bool {
        matches!(self, AppError::Clipboard(_) | AppError::Input(_))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(format!("序列化失败: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Task(err.to_string())
    }
}

/// 调用方需要结构化错误时，统一序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
