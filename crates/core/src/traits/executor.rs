//! 远程命令执行接口定义
//!
//! 验证引擎本身不建立任何连接，所有远程交互都通过本模块的接口完成：
//!
//! - [`CommandExecutor`]: 在已建立的会话上执行单条命令
//! - [`RemoteSession`]: 可关闭的远程会话
//! - [`SessionConnector`]: 获取新的远程会话
//! - [`LifecycleAction`]: 改变节点生命周期的操作（重启、关机、启动）
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use validator_core::{traits::CommandExecutor, ValidatorResult};
//!
//! struct EchoExecutor;
//!
//! #[async_trait]
//! impl CommandExecutor for EchoExecutor {
//!     async fn execute(&self, command: &str) -> ValidatorResult<String> {
//!         Ok(command.to_string())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::{models::FailoverScenario, ValidatorResult};

/// 命令执行器
///
/// 返回命令的标准输出。非零退出码或传输失败返回错误，
/// 连接中断必须以 `ValidatorError::SessionLost` 单独报告。
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> ValidatorResult<String>;
}

/// 远程会话
pub trait RemoteSession: CommandExecutor {
    /// 会话目标地址
    fn target(&self) -> &str;

    /// 释放会话占用的资源，由 `SessionGuard` 保证只调用一次
    fn close(&mut self) -> ValidatorResult<()>;
}

/// 会话获取器
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, target: &str) -> ValidatorResult<Box<dyn RemoteSession>>;
}

/// 节点生命周期操作
#[async_trait]
pub trait LifecycleAction: Send + Sync {
    /// 在给定会话上对节点执行重启或关机
    ///
    /// 会话断开是预期结果，实现应原样返回 `SessionLost` 由调用方判断。
    async fn stop(
        &self,
        session: &dyn CommandExecutor,
        node: &str,
        scenario: FailoverScenario,
    ) -> ValidatorResult<String>;

    /// 从控制端启动一个已关闭的节点
    async fn start(&self, node: &str) -> ValidatorResult<()>;
}

#[async_trait]
impl<T: CommandExecutor + ?Sized> CommandExecutor for Box<T> {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        (**self).execute(command).await
    }
}

#[async_trait]
impl<T: CommandExecutor + ?Sized> CommandExecutor for Arc<T> {
    async fn execute(&self, command: &str) -> ValidatorResult<String> {
        (**self).execute(command).await
    }
}
